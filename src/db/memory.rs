//! In-memory stores, used when no `DATABASE_URL` is configured and by the tests.
//! Contents live until the process exits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::RwLock;

use super::models::{
    AdminAccount, BlogPost, BlogPostDraft, Message, NewMessage, Project, ProjectDraft, Role,
};
use super::store::{ContentStore, CredentialStore, StoreResult};
use crate::stats::{self, MonthBucket};

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    accounts: Vec<AdminAccount>,
    projects: Vec<Project>,
    posts: Vec<BlogPost>,
    messages: Vec<Message>,
    visits: Vec<DateTime<Utc>>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Rows are kept newest first so listing is a clone.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_account(&self, username: &str) -> StoreResult<Option<AdminAccount>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn upsert_account(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> StoreResult<AdminAccount> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.accounts.iter_mut().find(|a| a.username == username) {
            existing.password_hash = password_hash.to_string();
            existing.role = role.as_str().to_string();
            return Ok(existing.clone());
        }
        let account = AdminAccount {
            id: tables.next_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role: role.as_str().to_string(),
        };
        tables.accounts.push(account.clone());
        Ok(account)
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        Ok(self.tables.read().await.projects.clone())
    }

    async fn get_project(&self, id: i64) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_project(&self, draft: ProjectDraft) -> StoreResult<Project> {
        let mut tables = self.tables.write().await;
        let project = Project {
            id: tables.next_id(),
            title: draft.title,
            category: draft.category,
            year: draft.year,
            image: draft.image,
            kind: draft.kind,
            tags: draft.tags,
            client: draft.client,
            role: draft.role,
            description: draft.description,
            created_at: Utc::now(),
        };
        tables.projects.insert(0, project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: i64, draft: ProjectDraft) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.write().await;
        let Some(project) = tables.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        project.title = draft.title;
        project.category = draft.category;
        project.year = draft.year;
        project.image = draft.image;
        project.kind = draft.kind;
        project.tags = draft.tags;
        project.client = draft.client;
        project.role = draft.role;
        project.description = draft.description;
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        Ok(tables.projects.len() != before)
    }

    async fn list_posts(&self) -> StoreResult<Vec<BlogPost>> {
        Ok(self.tables.read().await.posts.clone())
    }

    async fn get_post(&self, id: i64) -> StoreResult<Option<BlogPost>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_post(&self, draft: BlogPostDraft) -> StoreResult<BlogPost> {
        let mut tables = self.tables.write().await;
        let post = BlogPost {
            id: tables.next_id(),
            title: draft.title,
            excerpt: draft.excerpt,
            content: draft.content,
            date: draft.date,
            read_time: draft.read_time,
            image: draft.image,
            category: draft.category,
            tags: draft.tags,
            views: 0,
            author: draft.author.filter(|a| !a.is_empty()),
            created_at: Utc::now(),
        };
        tables.posts.insert(0, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: i64, draft: BlogPostDraft) -> StoreResult<Option<BlogPost>> {
        let mut tables = self.tables.write().await;
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.title = draft.title;
        post.excerpt = draft.excerpt;
        post.content = draft.content;
        post.date = draft.date;
        post.read_time = draft.read_time;
        post.image = draft.image;
        post.category = draft.category;
        post.tags = draft.tags;
        post.author = draft.author.filter(|a| !a.is_empty());
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        Ok(tables.posts.len() != before)
    }

    async fn list_messages(&self) -> StoreResult<Vec<Message>> {
        Ok(self.tables.read().await.messages.clone())
    }

    async fn insert_message(&self, message: NewMessage) -> StoreResult<Message> {
        let mut tables = self.tables.write().await;
        let message = Message {
            id: tables.next_id(),
            name: message.name,
            email: message.email,
            service: message.service,
            budget: message.budget,
            message: message.message,
            created_at: Utc::now(),
        };
        tables.messages.insert(0, message.clone());
        Ok(message)
    }

    async fn record_visit(&self, at: DateTime<Utc>) -> StoreResult<()> {
        self.tables.write().await.visits.push(at);
        Ok(())
    }

    async fn monthly_visits(&self, since: DateTime<Utc>) -> StoreResult<Vec<MonthBucket>> {
        let tables = self.tables.read().await;
        Ok(stats::bucket_visits(tables.visits.iter().copied(), since))
    }

    async fn total_visits(&self) -> StoreResult<i64> {
        Ok(self.tables.read().await.visits.len() as i64)
    }

    async fn ping(&self) -> StoreResult<Duration> {
        Ok(Duration::ZERO)
    }
}
