//! Typed client for the portfolio API plus the browser-side state models.
//!
//! [`ApiClient`] wraps every endpoint. [`view::ViewController`] drives the
//! public/login/admin views on top of it, and [`dashboard::Dashboard`] holds
//! the admin screen's tab, filter and permission state.

pub mod dashboard;
pub mod view;

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::db::models::{BlogPost, Message, Project};
use crate::media::ImageUpload;
use crate::routes::auth::{LoginRequest, LoginResponse, VerifyResponse};
use crate::routes::messages::MessageRequest;
use crate::routes::{ErrorResponse, SuccessResponse};
use crate::stats::VisitStats;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response, carrying the server's message when it sent one.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("not signed in as an administrator")]
    NotAuthenticated,

    #[error("read-only account: changes are disabled")]
    ReadOnly,

    /// `login` was called while the login screen was not showing.
    #[error("the login screen is not open")]
    LoginClosed,

    #[error("invalid request payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// 401 or 403 from the server.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

/// Project fields sent on create or update. `None` fields are left out.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Existing image URL; an uploaded file takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Blog post fields sent on create or update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "readTime", skip_serializing_if = "Option::is_none")]
    pub read_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Flattens a payload into multipart parts: lists become one JSON-array
/// part, objects are skipped.
fn multipart_form(payload: &impl Serialize, image: ImageUpload) -> Result<Form, ClientError> {
    let mut form = Form::new();
    if let Value::Object(fields) = serde_json::to_value(payload)? {
        for (name, value) in fields {
            match value {
                Value::String(text) => form = form.text(name, text),
                // One JSON part keeps empty and single-element lists intact.
                Value::Array(items) => {
                    form = form.text(name, Value::Array(items).to_string());
                }
                Value::Number(n) => form = form.text(name, n.to_string()),
                Value::Bool(b) => form = form.text(name, b.to_string()),
                Value::Null | Value::Object(_) => {}
            }
        }
    }

    let filename = image.filename.unwrap_or_else(|| "upload".to_string());
    Ok(form.part("image", Part::bytes(image.bytes).file_name(filename)))
}

/// HTTP client for the `/api` surface.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        let message = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| fallback_message(status));
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.authorized(self.http.get(self.url(path))).send().await?;
        Self::decode(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &impl Serialize,
    ) -> Result<T, ClientError> {
        let response = self.authorized(request).json(body).send().await?;
        Self::decode(response).await
    }

    async fn send_form<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &impl Serialize,
        image: ImageUpload,
    ) -> Result<T, ClientError> {
        let form = multipart_form(body, image)?;
        let response = self.authorized(request).multipart(form).send().await?;
        Self::decode(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.authorized(self.http.delete(self.url(path))).send().await?;
        Self::decode::<SuccessResponse>(response).await.map(|_| ())
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.send_json(self.http.post(self.url("/login")), &body).await
    }

    pub async fn verify(&self) -> Result<VerifyResponse, ClientError> {
        let response = self
            .authorized(self.http.post(self.url("/auth/verify")))
            .send()
            .await?;
        Self::decode(response).await
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    pub async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        self.get("/projects").await
    }

    pub async fn get_project(&self, id: i64) -> Result<Project, ClientError> {
        self.get(&format!("/projects/{}", id)).await
    }

    pub async fn create_project(
        &self,
        payload: &ProjectPayload,
        image: Option<ImageUpload>,
    ) -> Result<Project, ClientError> {
        let request = self.http.post(self.url("/projects"));
        match image {
            Some(image) => self.send_form(request, payload, image).await,
            None => self.send_json(request, payload).await,
        }
    }

    pub async fn update_project(
        &self,
        id: i64,
        payload: &ProjectPayload,
        image: Option<ImageUpload>,
    ) -> Result<Project, ClientError> {
        let request = self.http.put(self.url(&format!("/projects/{}", id)));
        match image {
            Some(image) => self.send_form(request, payload, image).await,
            None => self.send_json(request, payload).await,
        }
    }

    pub async fn delete_project(&self, id: i64) -> Result<(), ClientError> {
        self.delete(&format!("/projects/{}", id)).await
    }

    // ------------------------------------------------------------------
    // Posts
    // ------------------------------------------------------------------

    pub async fn list_posts(&self) -> Result<Vec<BlogPost>, ClientError> {
        self.get("/posts").await
    }

    pub async fn get_post(&self, id: i64) -> Result<BlogPost, ClientError> {
        self.get(&format!("/posts/{}", id)).await
    }

    pub async fn create_post(
        &self,
        payload: &PostPayload,
        image: Option<ImageUpload>,
    ) -> Result<BlogPost, ClientError> {
        let request = self.http.post(self.url("/posts"));
        match image {
            Some(image) => self.send_form(request, payload, image).await,
            None => self.send_json(request, payload).await,
        }
    }

    pub async fn update_post(
        &self,
        id: i64,
        payload: &PostPayload,
        image: Option<ImageUpload>,
    ) -> Result<BlogPost, ClientError> {
        let request = self.http.put(self.url(&format!("/posts/{}", id)));
        match image {
            Some(image) => self.send_form(request, payload, image).await,
            None => self.send_json(request, payload).await,
        }
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        self.delete(&format!("/posts/{}", id)).await
    }

    // ------------------------------------------------------------------
    // Messages and analytics
    // ------------------------------------------------------------------

    pub async fn send_message(&self, message: &MessageRequest) -> Result<Message, ClientError> {
        self.send_json(self.http.post(self.url("/messages")), message)
            .await
    }

    pub async fn list_messages(&self) -> Result<Vec<Message>, ClientError> {
        self.get("/messages").await
    }

    pub async fn record_visit(&self) -> Result<(), ClientError> {
        let response = self.http.post(self.url("/visit")).send().await?;
        Self::decode::<SuccessResponse>(response).await.map(|_| ())
    }

    pub async fn stats(&self) -> Result<VisitStats, ClientError> {
        self.get("/stats").await
    }
}

fn fallback_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.url("/projects"), "http://localhost:5000/api/projects");
    }

    #[test]
    fn test_payload_omits_unset_fields() {
        let payload = ProjectPayload {
            title: Some("Site".to_string()),
            kind: Some("Web".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, serde_json::json!({"title": "Site", "type": "Web"}));

        let post = PostPayload {
            read_time: Some("3 min".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value, serde_json::json!({"readTime": "3 min"}));
    }

    #[test]
    fn test_auth_failure_detection() {
        let err = ClientError::Api {
            status: 403,
            message: "Admin role required".to_string(),
        };
        assert!(err.is_auth_failure());
        assert_eq!(err.to_string(), "Admin role required");
        assert!(!ClientError::ReadOnly.is_auth_failure());
    }

    #[test]
    fn test_multipart_form_accepts_payload() {
        let payload = ProjectPayload {
            title: Some("Site".to_string()),
            tags: Some(vec!["a".to_string(), "b".to_string()]),
            ..Default::default()
        };
        let form = multipart_form(
            &payload,
            ImageUpload {
                bytes: vec![0x89, 0x50, 0x4E, 0x47],
                filename: None,
            },
        )
        .unwrap();
        assert!(!form.boundary().is_empty());
    }
}
