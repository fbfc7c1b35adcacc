/**
 * Routes Module
 * API route handlers
 */
pub mod analytics;
pub mod auth;
pub mod form;
pub mod health;
pub mod messages;
pub mod posts;
pub mod projects;

use axum::{
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Error body shared by every handler.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Every `/api` route, relative to the API root.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/auth/verify", post(auth::verify_token))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/messages",
            get(messages::list_messages).post(messages::create_message),
        )
        .route("/visit", post(analytics::record_visit))
        .route("/stats", get(analytics::get_stats))
        .fallback(api_not_found)
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("Route")
}
