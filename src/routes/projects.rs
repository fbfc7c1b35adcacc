/**
 * Project Routes
 * Public listing plus admin-only create, update and delete
 */
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::db::limits;
use crate::db::models::{Project, ProjectDraft};
use crate::error::ApiError;
use crate::routes::auth::AdminUser;
use crate::routes::form::{clean, string_or_number, ContentForm, TagsInput};
use crate::routes::SuccessResponse;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Writable project fields. Absent fields leave the stored value alone.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectInput {
    pub title: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub tags: Option<TagsInput>,
    pub client: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
}

impl ProjectInput {
    fn apply(self, mut draft: ProjectDraft) -> Result<ProjectDraft, ApiError> {
        if let Some(title) = self.title {
            draft.title = clean(title)
                .ok_or_else(|| ApiError::Validation("title must not be empty".to_string()))?;
        }
        if let Some(category) = self.category {
            draft.category = clean(category);
        }
        if let Some(year) = self.year {
            draft.year = clean(year);
        }
        if let Some(kind) = self.kind {
            draft.kind = clean(kind);
        }
        if let Some(tags) = self.tags {
            draft.tags = tags.normalize();
        }
        if let Some(client) = self.client {
            draft.client = clean(client);
        }
        if let Some(role) = self.role {
            draft.role = clean(role);
        }
        if let Some(description) = self.description {
            draft.description = clean(description);
        }
        limits::check_project(&draft).map_err(ApiError::Validation)?;
        Ok(draft)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/projects
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.content.list_projects().await?))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ApiError> {
    state
        .content
        .get_project(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Project"))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    form: ContentForm<ProjectInput>,
) -> Result<Json<Project>, ApiError> {
    if form.fields.title.is_none() {
        return Err(ApiError::Validation("title is required".to_string()));
    }
    let mut draft = form.fields.apply(ProjectDraft::default())?;
    draft.image = state.media.resolve(form.image).await?;

    let project = state.content.insert_project(draft).await?;
    tracing::info!(id = project.id, user = %admin.sub, "project created");
    Ok(Json(project))
}

/// PUT /api/projects/{id}
/// Keeps the stored image unless a new file or URL is supplied.
pub async fn update_project(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    form: ContentForm<ProjectInput>,
) -> Result<Json<Project>, ApiError> {
    let existing = state
        .content
        .get_project(id)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;

    let mut draft = form.fields.apply(existing.to_draft())?;
    if let Some(url) = state.media.resolve(form.image).await? {
        draft.image = Some(url);
    }

    let project = state
        .content
        .update_project(id, draft)
        .await?
        .ok_or(ApiError::NotFound("Project"))?;
    tracing::info!(id, user = %admin.sub, "project updated");
    Ok(Json(project))
}

/// DELETE /api/projects/{id}
/// Succeeds whether or not the row existed.
pub async fn delete_project(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let existed = state.content.delete_project(id).await?;
    tracing::info!(id, existed, user = %admin.sub, "project deleted");
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::tests::{RecordingStore, PNG_BYTES};
    use crate::media::MediaIngest;
    use crate::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    async fn create(state: &AppState, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let token = admin_token(state);
        send_json(api_app(state.clone()), "POST", "/api/projects", &body, Some(&token)).await
    }

    #[tokio::test]
    async fn test_created_project_is_listed_with_fresh_id() {
        let state = test_state().await;
        let (_, first) = create(&state, json!({"title": "First"})).await;
        let (status, second) = create(&state, json!({"title": "Second", "year": 2024})).await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(first["id"], second["id"]);
        assert_eq!(second["year"], "2024");

        let (status, list) = get_json(api_app(state), "/api/projects", None).await;
        assert_eq!(status, StatusCode::OK);
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["title"], "Second");
        assert!(list.iter().any(|p| p["id"] == first["id"]));
    }

    #[tokio::test]
    async fn test_update_title_keeps_untouched_fields() {
        let state = test_state().await;
        let (_, created) = create(
            &state,
            json!({
                "title": "Old",
                "category": "Web",
                "tags": ["Rust"],
                "image": "https://img.test/keep.png"
            }),
        )
        .await;
        let id = created["id"].as_i64().unwrap();
        let token = admin_token(&state);

        let (status, _) = send_json(
            api_app(state.clone()),
            "PUT",
            &format!("/api/projects/{}", id),
            &json!({"title": "New"}),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, fetched) = get_json(api_app(state), &format!("/api/projects/{}", id), None).await;
        assert_eq!(fetched["title"], "New");
        assert_eq!(fetched["category"], "Web");
        assert_eq!(fetched["tags"], json!(["Rust"]));
        assert_eq!(fetched["image"], "https://img.test/keep.png");
        assert_eq!(fetched["createdAt"], created["createdAt"]);
    }

    #[tokio::test]
    async fn test_over_wide_fields_are_rejected_before_storage() {
        let state = test_state().await;
        let (status, body) = create(&state, json!({"title": "Range", "year": "2023 - 2024"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "year must be at most 10 characters");

        let (status, _) = create(&state, json!({"title": "t".repeat(256)})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, created) = create(&state, json!({"title": "Ok", "year": "2023-2024"})).await;
        let token = admin_token(&state);
        let (status, _) = send_json(
            api_app(state.clone()),
            "PUT",
            &format!("/api/projects/{}", created["id"]),
            &json!({"type": "x".repeat(51)}),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = get_json(api_app(state), "/api/projects", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["type"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_update_unknown_project_is_not_found() {
        let state = test_state().await;
        let token = admin_token(&state);
        let (status, body) = send_json(
            api_app(state),
            "PUT",
            "/api/projects/999",
            &json!({"title": "Ghost"}),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Project not found");
    }

    #[tokio::test]
    async fn test_delete_twice_succeeds_both_times() {
        let state = test_state().await;
        let (_, created) = create(&state, json!({"title": "Temp"})).await;
        let uri = format!("/api/projects/{}", created["id"]);
        let token = admin_token(&state);

        for _ in 0..2 {
            let (status, body) = delete(api_app(state.clone()), &uri, Some(&token)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
        }
        let (status, _) = get_json(api_app(state), &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_comma_tags_are_stored_as_list() {
        let state = test_state().await;
        let (_, created) = create(&state, json!({"title": "T", "tags": "React, AI, Design"})).await;
        assert_eq!(created["tags"], json!(["React", "AI", "Design"]));
    }

    #[tokio::test]
    async fn test_missing_or_blank_title_is_rejected() {
        let state = test_state().await;
        let (status, _) = create(&state, json!({"category": "Web"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = create(&state, json!({"title": "   "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mutations_require_admin_token() {
        let state = test_state().await;
        let (status, _) =
            send_json(api_app(state.clone()), "POST", "/api/projects", &json!({"title": "x"}), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let viewer = viewer_token(&state);
        let (status, _) = send_json(
            api_app(state.clone()),
            "POST",
            "/api/projects",
            &json!({"title": "x"}),
            Some(&viewer),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = delete(api_app(state.clone()), "/api/projects/1", Some(&viewer)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = delete(api_app(state), "/api/projects/1", Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_multipart_upload_stores_provider_url() {
        let state = test_state().await;
        let token = admin_token(&state);
        let (status, body) = send_multipart(
            api_app(state),
            "POST",
            "/api/projects",
            &[("title", "Shot"), ("tags", "UI, UX")],
            &[("image", "shot.png", PNG_BYTES)],
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["image"], "https://cdn.test/portfolio/1.png");
        assert_eq!(body["tags"], json!(["UI", "UX"]));
    }

    #[tokio::test]
    async fn test_non_image_upload_is_rejected() {
        let state = test_state().await;
        let token = admin_token(&state);
        let (status, _) = send_multipart(
            api_app(state.clone()),
            "POST",
            "/api/projects",
            &[("title", "Doc")],
            &[("image", "doc.pdf", b"%PDF-1.7 not an image")],
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = get_json(api_app(state), "/api/projects", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway() {
        let failing = RecordingStore {
            fail: true,
            ..Default::default()
        };
        let state = AppState::in_memory(
            MediaIngest::new(Arc::new(failing), 1024),
            &test_auth_config(),
        );
        let token = admin_token(&state);
        let (status, body) = send_multipart(
            api_app(state),
            "POST",
            "/api/projects",
            &[("title", "Shot")],
            &[("image", "shot.png", PNG_BYTES)],
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["message"], "Image upload failed");
    }
}
