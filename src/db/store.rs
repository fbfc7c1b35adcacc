//! Storage contracts shared by the PostgreSQL and in-memory backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{
    AdminAccount, BlogPost, BlogPostDraft, Message, NewMessage, Project, ProjectDraft, Role,
};
use crate::stats::MonthBucket;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Holds the administrator identities.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_account(&self, username: &str) -> StoreResult<Option<AdminAccount>>;

    /// Creates the account or replaces its hash and role.
    async fn upsert_account(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> StoreResult<AdminAccount>;
}

/// Durable portfolio content and visit log.
///
/// Lists are newest first. `update_*` returns `None` for an unknown id;
/// `delete_*` reports whether a row was removed.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn list_projects(&self) -> StoreResult<Vec<Project>>;
    async fn get_project(&self, id: i64) -> StoreResult<Option<Project>>;
    async fn insert_project(&self, draft: ProjectDraft) -> StoreResult<Project>;
    async fn update_project(&self, id: i64, draft: ProjectDraft) -> StoreResult<Option<Project>>;
    async fn delete_project(&self, id: i64) -> StoreResult<bool>;

    async fn list_posts(&self) -> StoreResult<Vec<BlogPost>>;
    async fn get_post(&self, id: i64) -> StoreResult<Option<BlogPost>>;
    async fn insert_post(&self, draft: BlogPostDraft) -> StoreResult<BlogPost>;
    async fn update_post(&self, id: i64, draft: BlogPostDraft) -> StoreResult<Option<BlogPost>>;
    async fn delete_post(&self, id: i64) -> StoreResult<bool>;

    async fn list_messages(&self) -> StoreResult<Vec<Message>>;
    async fn insert_message(&self, message: NewMessage) -> StoreResult<Message>;

    async fn record_visit(&self, at: DateTime<Utc>) -> StoreResult<()>;
    /// Visits since `since`, grouped by UTC calendar month, ascending.
    async fn monthly_visits(&self, since: DateTime<Utc>) -> StoreResult<Vec<MonthBucket>>;
    async fn total_visits(&self) -> StoreResult<i64>;

    /// Round-trip latency probe.
    async fn ping(&self) -> StoreResult<std::time::Duration>;
}
