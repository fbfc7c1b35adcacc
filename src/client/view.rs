//! Which screen the site shows and the content it renders from.

use super::dashboard::{Dashboard, Overview};
use super::{ApiClient, ClientError, PostPayload, ProjectPayload};
use crate::db::models::{BlogPost, Message, Project, Role};
use crate::media::ImageUpload;
use crate::routes::auth::UserInfo;
use crate::routes::messages::MessageRequest;
use crate::stats::VisitStats;

/// Route fragment that opens the login screen directly.
pub const ADMIN_ROUTE: &str = "#admin";

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Public,
    Login,
    Admin(UserInfo),
}

/// Collections fetched from the API. Every screen reads from here.
#[derive(Debug, Clone, Default)]
pub struct ContentCache {
    projects: Vec<Project>,
    posts: Vec<BlogPost>,
    messages: Vec<Message>,
}

impl ContentCache {
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn posts(&self) -> &[BlogPost] {
        &self.posts
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Replaces the row with the same id, or puts a new row first.
    pub fn upsert_project(&mut self, project: Project) {
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(slot) => *slot = project,
            None => self.projects.insert(0, project),
        }
    }

    pub fn remove_project(&mut self, id: i64) {
        self.projects.retain(|p| p.id != id);
    }

    pub fn upsert_post(&mut self, post: BlogPost) {
        match self.posts.iter_mut().find(|p| p.id == post.id) {
            Some(slot) => *slot = post,
            None => self.posts.insert(0, post),
        }
    }

    pub fn remove_post(&mut self, id: i64) {
        self.posts.retain(|p| p.id != id);
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.retain(|m| m.id != message.id);
        self.messages.insert(0, message);
    }

    fn clear_messages(&mut self) {
        self.messages.clear();
    }
}

pub struct ViewController {
    api: ApiClient,
    view: View,
    cache: ContentCache,
    dashboard: Option<Dashboard>,
    stats: Option<VisitStats>,
    visit_recorded: bool,
}

impl ViewController {
    /// Starts on the login screen when `entry_route` carries [`ADMIN_ROUTE`].
    pub fn new(api: ApiClient, entry_route: &str) -> Self {
        let view = if entry_route.contains(ADMIN_ROUTE) {
            View::Login
        } else {
            View::Public
        };
        Self {
            api,
            view,
            cache: ContentCache::default(),
            dashboard: None,
            stats: None,
            visit_recorded: false,
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn stats(&self) -> Option<&VisitStats> {
        self.stats.as_ref()
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        self.dashboard.as_mut()
    }

    /// Overview tab numbers; `None` outside the admin view.
    pub fn overview(&self) -> Option<Overview> {
        self.dashboard
            .as_ref()
            .map(|dashboard| dashboard.overview(&self.cache, self.stats.as_ref()))
    }

    /// public → login. No effect from any other view.
    pub fn enter_admin(&mut self) {
        if self.view == View::Public {
            self.view = View::Login;
        }
    }

    /// login → public.
    pub fn back(&mut self) {
        if self.view == View::Login {
            self.view = View::Public;
        }
    }

    fn become_admin(&mut self, user: UserInfo, token: String) {
        self.api.set_token(Some(token));
        self.dashboard = Some(Dashboard::new(user.role));
        self.view = View::Admin(user);
    }

    /// login → admin on success. Only valid on the login screen: any other
    /// view gets [`ClientError::LoginClosed`] without a request. A failure
    /// leaves the login screen up and returns the server's message.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<&UserInfo, ClientError> {
        if self.view != View::Login {
            return Err(ClientError::LoginClosed);
        }
        let response = self.api.login(username, password).await?;
        self.become_admin(response.user, response.token);
        match &self.view {
            View::Admin(user) => Ok(user),
            _ => Err(ClientError::NotAuthenticated),
        }
    }

    /// Re-enters the admin view with a stored token if it is still valid.
    /// The token is only kept once the server accepts it.
    pub async fn restore(&mut self, token: String) -> Result<bool, ClientError> {
        self.api.set_token(Some(token.clone()));
        let verified = match self.api.verify().await {
            Ok(verified) => verified,
            Err(e) => {
                self.api.set_token(None);
                return Err(e);
            }
        };
        match verified.user {
            Some(user) if verified.valid => {
                self.become_admin(user, token);
                Ok(true)
            }
            _ => {
                self.api.set_token(None);
                Ok(false)
            }
        }
    }

    /// admin → public. Drops the identity, the token and the inbox.
    pub fn logout(&mut self) {
        self.api.set_token(None);
        self.dashboard = None;
        self.stats = None;
        self.cache.clear_messages();
        self.view = View::Public;
    }

    /// First load: fetches everything and records one visit per controller.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        if !self.visit_recorded {
            self.visit_recorded = true;
            if let Err(e) = self.api.record_visit().await {
                tracing::debug!("visit not recorded: {}", e);
            }
        }
        self.refresh().await
    }

    /// Re-fetches all collections. The inbox stays empty unless the caller
    /// is an admin; stats are only fetched in the admin view.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.cache.projects = self.api.list_projects().await?;
        self.cache.posts = self.api.list_posts().await?;

        self.cache.messages = match self.api.list_messages().await {
            Ok(messages) => messages,
            Err(e) if e.is_auth_failure() => Vec::new(),
            Err(e) => return Err(e),
        };

        if matches!(self.view, View::Admin(_)) {
            self.stats = match self.api.stats().await {
                Ok(stats) => Some(stats),
                Err(e) if e.is_auth_failure() => None,
                Err(e) => return Err(e),
            };
        }
        Ok(())
    }

    /// Contact form; available from any view.
    pub async fn send_message(&mut self, message: &MessageRequest) -> Result<Message, ClientError> {
        let created = self.api.send_message(message).await?;
        if self.can_mutate() {
            self.cache.push_message(created.clone());
        }
        Ok(created)
    }

    pub fn can_mutate(&self) -> bool {
        self.dashboard.as_ref().is_some_and(Dashboard::can_mutate)
    }

    fn require_admin(&self) -> Result<(), ClientError> {
        match &self.view {
            View::Admin(user) if user.role == Role::Admin => Ok(()),
            View::Admin(_) => Err(ClientError::ReadOnly),
            _ => Err(ClientError::NotAuthenticated),
        }
    }

    /// Creates when `id` is `None`, otherwise updates.
    pub async fn save_project(
        &mut self,
        id: Option<i64>,
        payload: &ProjectPayload,
        image: Option<ImageUpload>,
    ) -> Result<Project, ClientError> {
        self.require_admin()?;
        let project = match id {
            Some(id) => self.api.update_project(id, payload, image).await?,
            None => self.api.create_project(payload, image).await?,
        };
        self.cache.upsert_project(project.clone());
        Ok(project)
    }

    pub async fn delete_project(&mut self, id: i64) -> Result<(), ClientError> {
        self.require_admin()?;
        self.api.delete_project(id).await?;
        self.cache.remove_project(id);
        Ok(())
    }

    pub async fn save_post(
        &mut self,
        id: Option<i64>,
        payload: &PostPayload,
        image: Option<ImageUpload>,
    ) -> Result<BlogPost, ClientError> {
        self.require_admin()?;
        let post = match id {
            Some(id) => self.api.update_post(id, payload, image).await?,
            None => self.api.create_post(payload, image).await?,
        };
        self.cache.upsert_post(post.clone());
        Ok(post)
    }

    pub async fn delete_post(&mut self, id: i64) -> Result<(), ClientError> {
        self.require_admin()?;
        self.api.delete_post(id).await?;
        self.cache.remove_post(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    // Nothing listens here; any request that is actually sent fails.
    const DEAD_SERVER: &str = "http://127.0.0.1:9";

    fn controller(route: &str) -> ViewController {
        ViewController::new(ApiClient::new(DEAD_SERVER).unwrap(), route)
    }

    fn project(id: i64, title: &str) -> Project {
        Project {
            id,
            title: title.to_string(),
            category: None,
            year: None,
            image: None,
            kind: None,
            tags: vec![],
            client: None,
            role: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    fn user(role: Role) -> UserInfo {
        UserInfo {
            username: "someone".to_string(),
            role,
        }
    }

    #[test]
    fn test_entry_route_selects_initial_view() {
        assert_eq!(controller("/").view(), &View::Public);
        assert_eq!(controller("/#admin").view(), &View::Login);
    }

    #[test]
    fn test_enter_admin_and_back() {
        let mut vc = controller("/");
        vc.enter_admin();
        assert_eq!(vc.view(), &View::Login);
        vc.back();
        assert_eq!(vc.view(), &View::Public);
        vc.back();
        assert_eq!(vc.view(), &View::Public);
    }

    #[test]
    fn test_logout_clears_identity_and_token() {
        let mut vc = controller("#admin");
        vc.become_admin(user(Role::Admin), "tok".to_string());
        assert!(matches!(vc.view(), View::Admin(_)));
        assert_eq!(vc.api().token(), Some("tok"));

        vc.logout();
        assert_eq!(vc.view(), &View::Public);
        assert_eq!(vc.api().token(), None);
        assert!(vc.dashboard().is_none());
    }

    #[tokio::test]
    async fn test_viewer_mutations_refuse_without_a_request() {
        let mut vc = controller("#admin");
        vc.become_admin(user(Role::Viewer), "tok".to_string());
        assert!(!vc.can_mutate());

        let err = vc.delete_project(1).await.unwrap_err();
        assert!(matches!(err, ClientError::ReadOnly));
        let err = vc
            .save_post(None, &PostPayload::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ReadOnly));
    }

    #[tokio::test]
    async fn test_public_view_cannot_mutate() {
        let mut vc = controller("/");
        let err = vc
            .save_project(None, &ProjectPayload::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_failed_login_stays_on_login_view() {
        let mut vc = controller("#admin");
        assert!(vc.login("admin", "admin123").await.is_err());
        assert_eq!(vc.view(), &View::Login);
        assert_eq!(vc.api().token(), None);
    }

    #[tokio::test]
    async fn test_login_outside_the_login_screen_is_refused() {
        let mut vc = controller("/");
        let err = vc.login("admin", "admin123").await.unwrap_err();
        assert!(matches!(err, ClientError::LoginClosed));
        assert_eq!(vc.view(), &View::Public);

        vc.become_admin(user(Role::Admin), "tok".to_string());
        let err = vc.login("admin", "admin123").await.unwrap_err();
        assert!(matches!(err, ClientError::LoginClosed));
        assert!(matches!(vc.view(), View::Admin(_)));
        assert_eq!(vc.api().token(), Some("tok"));
    }

    #[tokio::test]
    async fn test_restore_drops_token_when_server_is_unreachable() {
        let mut vc = controller("/");
        assert!(vc.restore("stored-token".to_string()).await.is_err());
        assert_eq!(vc.api().token(), None);
        assert_eq!(vc.view(), &View::Public);
        assert!(vc.dashboard().is_none());
    }

    #[test]
    fn test_cache_upsert_replaces_or_prepends() {
        let mut cache = ContentCache::default();
        cache.upsert_project(project(1, "One"));
        cache.upsert_project(project(2, "Two"));
        cache.upsert_project(project(1, "One v2"));

        let titles: Vec<&str> = cache.projects().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Two", "One v2"]);

        cache.remove_project(2);
        cache.remove_project(2);
        assert_eq!(cache.projects().len(), 1);
    }
}
