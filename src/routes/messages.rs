/**
 * Message Routes
 * Public contact-form submission and the admin inbox
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::db::limits;
use crate::db::models::{Message, NewMessage};
use crate::error::ApiError;
use crate::routes::auth::AdminUser;
use crate::routes::form::clean;
use crate::state::AppState;

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .expect("email pattern is valid");
}

const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MessageRequest {
    fn validate(self) -> Result<NewMessage, ApiError> {
        let name = self
            .name
            .and_then(clean)
            .ok_or_else(|| ApiError::Validation("name is required".to_string()))?;
        let email = self
            .email
            .and_then(clean)
            .ok_or_else(|| ApiError::Validation("email is required".to_string()))?;
        let message = self
            .message
            .and_then(clean)
            .ok_or_else(|| ApiError::Validation("message is required".to_string()))?;

        if !EMAIL_REGEX.is_match(&email) {
            return Err(ApiError::Validation("Invalid email format".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(ApiError::Validation("message is too long".to_string()));
        }

        let new_message = NewMessage {
            name,
            email,
            service: self.service.and_then(clean),
            budget: self.budget.and_then(clean),
            message,
        };
        limits::check_message(&new_message).map_err(ApiError::Validation)?;
        Ok(new_message)
    }
}

/// POST /api/messages
pub async fn create_message(
    State(state): State<AppState>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<Message>, ApiError> {
    let Json(payload) = payload?;
    let new_message = payload.validate()?;
    let message = state.content.insert_message(new_message).await?;
    tracing::info!(id = message.id, service = ?message.service, "message received");
    Ok(Json(message))
}

/// GET /api/messages
pub async fn list_messages(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.content.list_messages().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn alice() -> serde_json::Value {
        json!({
            "name": "Alice",
            "email": "a@x.com",
            "service": "Backend Architecture",
            "budget": "$1k - $5k",
            "message": "Hi"
        })
    }

    #[test]
    fn test_email_regex() {
        assert!(EMAIL_REGEX.is_match("a@x.com"));
        assert!(!EMAIL_REGEX.is_match("a@x"));
        assert!(!EMAIL_REGEX.is_match("a b@x.com"));
    }

    #[tokio::test]
    async fn test_contact_form_adds_one_row_at_the_front() {
        let state = test_state().await;
        let (status, _) = send_json(
            api_app(state.clone()),
            "POST",
            "/api/messages",
            &json!({"name": "Bob", "email": "b@y.org", "message": "Earlier"}),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, created) =
            send_json(api_app(state.clone()), "POST", "/api/messages", &alice(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["service"], "Backend Architecture");
        assert_eq!(created["budget"], "$1k - $5k");

        let token = admin_token(&state);
        let (status, list) = get_json(api_app(state), "/api/messages", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["name"], "Alice");
        assert_eq!(list[0]["id"], created["id"]);
        assert_eq!(list[1]["name"], "Bob");
    }

    #[tokio::test]
    async fn test_invalid_submissions_are_rejected() {
        let state = test_state().await;
        for body in [
            json!({"name": "", "email": "a@x.com", "message": "Hi"}),
            json!({"name": "A", "email": "not-an-email", "message": "Hi"}),
            json!({"name": "A", "email": "a@x.com"}),
            json!({"name": "n".repeat(150), "email": "a@x.com", "message": "Hi"}),
            json!({"name": "A", "email": "a@x.com", "budget": "b".repeat(51), "message": "Hi"}),
        ] {
            let (status, body) =
                send_json(api_app(state.clone()), "POST", "/api/messages", &body, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
        }

        let token = admin_token(&state);
        let (_, list) = get_json(api_app(state), "/api/messages", Some(&token)).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_inbox_requires_admin() {
        let state = test_state().await;
        let (status, _) = get_json(api_app(state.clone()), "/api/messages", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let viewer = viewer_token(&state);
        let (status, _) = get_json(api_app(state), "/api/messages", Some(&viewer)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
