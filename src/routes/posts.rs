/**
 * Blog Routes
 * Public listing and detail plus admin-only create, update and delete
 */
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::limits;
use crate::db::models::{Author, BlogPost, BlogPostDraft};
use crate::error::ApiError;
use crate::markup;
use crate::routes::auth::AdminUser;
use crate::routes::form::{clean, string_or_number, ContentForm, TagsInput};
use crate::routes::SuccessResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Writable post fields. Accepts snake_case and camelCase names, and the
/// author either nested or as flat `author_*` fields (flat fields win).
#[derive(Debug, Default, Deserialize)]
pub struct PostInput {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
    #[serde(default, alias = "readTime", deserialize_with = "string_or_number")]
    pub read_time: Option<String>,
    pub category: Option<String>,
    pub tags: Option<TagsInput>,
    pub author: Option<Author>,
    #[serde(alias = "authorName")]
    pub author_name: Option<String>,
    #[serde(alias = "authorRole")]
    pub author_role: Option<String>,
    #[serde(alias = "authorAvatar")]
    pub author_avatar: Option<String>,
}

impl PostInput {
    fn apply(self, mut draft: BlogPostDraft) -> Result<BlogPostDraft, ApiError> {
        if let Some(title) = self.title {
            draft.title = clean(title)
                .ok_or_else(|| ApiError::Validation("title must not be empty".to_string()))?;
        }
        if let Some(excerpt) = self.excerpt {
            draft.excerpt = clean(excerpt);
        }
        if let Some(content) = self.content {
            // Stored verbatim; line structure drives rendering.
            draft.content = (!content.trim().is_empty()).then_some(content);
        }
        if let Some(date) = self.date {
            draft.date = clean(date);
        }
        if let Some(read_time) = self.read_time {
            draft.read_time = clean(read_time);
        }
        if let Some(category) = self.category {
            draft.category = clean(category);
        }
        if let Some(tags) = self.tags {
            draft.tags = tags.normalize();
        }

        let mut author = draft.author.take().unwrap_or_default();
        let nested = self.author.unwrap_or_default();
        for (slot, value) in [
            (&mut author.name, self.author_name.or(nested.name)),
            (&mut author.role, self.author_role.or(nested.role)),
            (&mut author.avatar, self.author_avatar.or(nested.avatar)),
        ] {
            if let Some(value) = value {
                *slot = clean(value);
            }
        }
        draft.author = Author::from_parts(author.name, author.role, author.avatar);

        limits::check_post(&draft).map_err(ApiError::Validation)?;
        Ok(draft)
    }
}

/// Single post with its body pre-rendered to HTML.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: BlogPost,
    pub content_html: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/posts
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>, ApiError> {
    Ok(Json(state.content.list_posts().await?))
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostDetail>, ApiError> {
    let post = state
        .content
        .get_post(id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    let content_html = markup::render_html(post.content.as_deref().unwrap_or_default());
    Ok(Json(PostDetail { post, content_html }))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    form: ContentForm<PostInput>,
) -> Result<Json<BlogPost>, ApiError> {
    if form.fields.title.is_none() {
        return Err(ApiError::Validation("title is required".to_string()));
    }
    let mut draft = form.fields.apply(BlogPostDraft::default())?;
    draft.image = state.media.resolve(form.image).await?;

    let post = state.content.insert_post(draft).await?;
    tracing::info!(id = post.id, user = %admin.sub, "post created");
    Ok(Json(post))
}

/// PUT /api/posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    form: ContentForm<PostInput>,
) -> Result<Json<BlogPost>, ApiError> {
    let existing = state
        .content
        .get_post(id)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;

    let mut draft = form.fields.apply(existing.to_draft())?;
    if let Some(url) = state.media.resolve(form.image).await? {
        draft.image = Some(url);
    }

    let post = state
        .content
        .update_post(id, draft)
        .await?
        .ok_or(ApiError::NotFound("Post"))?;
    tracing::info!(id, user = %admin.sub, "post updated");
    Ok(Json(post))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let existed = state.content.delete_post(id).await?;
    tracing::info!(id, existed, user = %admin.sub, "post deleted");
    Ok(Json(SuccessResponse::ok()))
}
