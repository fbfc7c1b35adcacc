//! PostgreSQL-backed stores.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::PgPool;
use std::time::{Duration, Instant};

use super::models::{
    AdminAccount, BlogPost, BlogPostDraft, BlogPostRow, Message, NewMessage, Project,
    ProjectDraft, Role,
};
use super::store::{ContentStore, CredentialStore, StoreResult};
use crate::stats::MonthBucket;

const PROJECT_COLUMNS: &str =
    "id, title, category, year, image, type, tags, client, role, description, created_at";

const POST_COLUMNS: &str = "id, title, excerpt, content, date, read_time, image, category, tags, \
     views, author_name, author_role, author_avatar, created_at";

const MESSAGE_COLUMNS: &str = "id, name, email, service, budget, message, created_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_account(&self, username: &str) -> StoreResult<Option<AdminAccount>> {
        let account = sqlx::query_as::<_, AdminAccount>(
            "SELECT id, username, password AS password_hash, role FROM admin_users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn upsert_account(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> StoreResult<AdminAccount> {
        let account = sqlx::query_as::<_, AdminAccount>(
            r#"
            INSERT INTO admin_users (username, password, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO UPDATE SET
                password = EXCLUDED.password,
                role = EXCLUDED.role
            RETURNING id, username, password AS password_hash, role
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(account)
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects ORDER BY created_at DESC, id DESC",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_project(&self, id: i64) -> StoreResult<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_project(&self, draft: ProjectDraft) -> StoreResult<Project> {
        let sql = format!(
            r#"
            INSERT INTO projects (title, category, year, image, type, tags, client, role, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(&draft.title)
            .bind(&draft.category)
            .bind(&draft.year)
            .bind(&draft.image)
            .bind(&draft.kind)
            .bind(&draft.tags)
            .bind(&draft.client)
            .bind(&draft.role)
            .bind(&draft.description)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_project(&self, id: i64, draft: ProjectDraft) -> StoreResult<Option<Project>> {
        let sql = format!(
            r#"
            UPDATE projects
            SET title = $1, category = $2, year = $3, image = $4, type = $5,
                tags = $6, client = $7, role = $8, description = $9
            WHERE id = $10
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(&draft.title)
            .bind(&draft.category)
            .bind(&draft.year)
            .bind(&draft.image)
            .bind(&draft.kind)
            .bind(&draft.tags)
            .bind(&draft.client)
            .bind(&draft.role)
            .bind(&draft.description)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_project(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(&self) -> StoreResult<Vec<BlogPost>> {
        let sql = format!(
            "SELECT {} FROM blog_posts ORDER BY created_at DESC, id DESC",
            POST_COLUMNS
        );
        let rows = sqlx::query_as::<_, BlogPostRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(BlogPost::from).collect())
    }

    async fn get_post(&self, id: i64) -> StoreResult<Option<BlogPost>> {
        let sql = format!("SELECT {} FROM blog_posts WHERE id = $1", POST_COLUMNS);
        let row = sqlx::query_as::<_, BlogPostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(BlogPost::from))
    }

    async fn insert_post(&self, draft: BlogPostDraft) -> StoreResult<BlogPost> {
        let sql = format!(
            r#"
            INSERT INTO blog_posts (title, excerpt, content, date, read_time, image, category,
                                    tags, author_name, author_role, author_avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        let author = draft.author.unwrap_or_default();
        let row = sqlx::query_as::<_, BlogPostRow>(&sql)
            .bind(&draft.title)
            .bind(&draft.excerpt)
            .bind(&draft.content)
            .bind(&draft.date)
            .bind(&draft.read_time)
            .bind(&draft.image)
            .bind(&draft.category)
            .bind(&draft.tags)
            .bind(&author.name)
            .bind(&author.role)
            .bind(&author.avatar)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn update_post(&self, id: i64, draft: BlogPostDraft) -> StoreResult<Option<BlogPost>> {
        let sql = format!(
            r#"
            UPDATE blog_posts
            SET title = $1, excerpt = $2, content = $3, date = $4, read_time = $5, image = $6,
                category = $7, tags = $8, author_name = $9, author_role = $10, author_avatar = $11
            WHERE id = $12
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        let author = draft.author.unwrap_or_default();
        let row = sqlx::query_as::<_, BlogPostRow>(&sql)
            .bind(&draft.title)
            .bind(&draft.excerpt)
            .bind(&draft.content)
            .bind(&draft.date)
            .bind(&draft.read_time)
            .bind(&draft.image)
            .bind(&draft.category)
            .bind(&draft.tags)
            .bind(&author.name)
            .bind(&author.role)
            .bind(&author.avatar)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(BlogPost::from))
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_messages(&self) -> StoreResult<Vec<Message>> {
        let sql = format!(
            "SELECT {} FROM proposals ORDER BY created_at DESC, id DESC",
            MESSAGE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Message>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_message(&self, message: NewMessage) -> StoreResult<Message> {
        let sql = format!(
            r#"
            INSERT INTO proposals (name, email, service, budget, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Message>(&sql)
            .bind(&message.name)
            .bind(&message.email)
            .bind(&message.service)
            .bind(&message.budget)
            .bind(&message.message)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn record_visit(&self, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("INSERT INTO visits (visited_at) VALUES ($1)")
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn monthly_visits(&self, since: DateTime<Utc>) -> StoreResult<Vec<MonthBucket>> {
        let rows: Vec<(NaiveDateTime, i64)> = sqlx::query_as(
            r#"
            SELECT date_trunc('month', visited_at AT TIME ZONE 'UTC') AS bucket,
                   COUNT(*) AS count
            FROM visits
            WHERE visited_at >= $1
            GROUP BY bucket
            ORDER BY bucket ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(bucket, count)| MonthBucket {
                start: bucket.date(),
                count,
            })
            .collect())
    }

    async fn total_visits(&self) -> StoreResult<i64> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM visits")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.0)
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }
}
