pub mod limits;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{ContentStore, CredentialStore, StoreError, StoreResult};

use bcrypt::{hash, DEFAULT_COST};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::{AuthConfig, DbConfig};
use models::{AdminAccount, Role};

/// Fallback password when neither `ADMIN_HASH_PASSWORD` nor `ADMIN_PASSWORD` is set.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!(
        "Database URL: {}",
        config.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*"
        )
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(std::time::Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS admin_users (
            id BIGSERIAL PRIMARY KEY,
            username VARCHAR({username}) UNIQUE NOT NULL,
            password VARCHAR(255) NOT NULL,
            role TEXT NOT NULL DEFAULT 'admin'
        )
    "#,
        username = limits::USERNAME,
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id BIGSERIAL PRIMARY KEY,
            title VARCHAR({title}) NOT NULL,
            category VARCHAR({category}),
            year VARCHAR({year}),
            image TEXT,
            type VARCHAR({kind}),
            tags TEXT[] NOT NULL DEFAULT '{{}}',
            client VARCHAR({client}),
            role VARCHAR({role}),
            description TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
        title = limits::TITLE,
        category = limits::CATEGORY,
        year = limits::YEAR,
        kind = limits::PROJECT_TYPE,
        client = limits::CLIENT,
        role = limits::PROJECT_ROLE,
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS blog_posts (
            id BIGSERIAL PRIMARY KEY,
            title VARCHAR({title}) NOT NULL,
            excerpt TEXT,
            content TEXT,
            date VARCHAR({date}),
            read_time VARCHAR({read_time}),
            image TEXT,
            category VARCHAR({category}),
            tags TEXT[] NOT NULL DEFAULT '{{}}',
            views INTEGER NOT NULL DEFAULT 0,
            author_name VARCHAR({author_name}),
            author_role VARCHAR({author_role}),
            author_avatar TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
        title = limits::TITLE,
        date = limits::POST_DATE,
        read_time = limits::READ_TIME,
        category = limits::CATEGORY,
        author_name = limits::AUTHOR_NAME,
        author_role = limits::AUTHOR_ROLE,
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS proposals (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR({name}) NOT NULL,
            email VARCHAR({email}) NOT NULL,
            service VARCHAR({service}),
            budget VARCHAR({budget}),
            message TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
        name = limits::SENDER_NAME,
        email = limits::SENDER_EMAIL,
        service = limits::SERVICE,
        budget = limits::BUDGET,
    ))
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS visits (
            id BIGSERIAL PRIMARY KEY,
            visited_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
    "#,
    )
    .execute(pool)
    .await?;

    upgrade_legacy_tables(pool).await?;

    sqlx::raw_sql(
        r#"
        CREATE INDEX IF NOT EXISTS idx_projects_created_at ON projects(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_blog_posts_created_at ON blog_posts(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_proposals_created_at ON proposals(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_visits_visited_at ON visits(visited_at)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}

const CONTENT_TABLES: [&str; 5] = ["admin_users", "projects", "blog_posts", "proposals", "visits"];

async fn column_type(pool: &PgPool, table: &str, column: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT data_type FROM information_schema.columns
        WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2
        "#,
    )
    .bind(table)
    .bind(column)
    .fetch_optional(pool)
    .await
}

/// Brings tables created by the earlier Node server up to the current shape:
/// a `role` column on accounts, `BIGINT` ids, `TIMESTAMPTZ` timestamps (old
/// values read as UTC) and non-null tags, counters and message fields.
/// Every step is a no-op on a table that already matches.
async fn upgrade_legacy_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("ALTER TABLE admin_users ADD COLUMN IF NOT EXISTS role TEXT NOT NULL DEFAULT 'admin'")
        .execute(pool)
        .await?;

    for table in CONTENT_TABLES {
        if column_type(pool, table, "id").await?.as_deref() == Some("integer") {
            tracing::info!(table, "widening id column to BIGINT");
            sqlx::raw_sql(&format!(
                "ALTER TABLE {table} ALTER COLUMN id TYPE BIGINT; \
                 ALTER SEQUENCE IF EXISTS {table}_id_seq AS BIGINT"
            ))
            .execute(pool)
            .await?;
        }
    }

    for (table, column) in [
        ("projects", "created_at"),
        ("blog_posts", "created_at"),
        ("proposals", "created_at"),
        ("visits", "visited_at"),
    ] {
        if column_type(pool, table, column).await?.as_deref() == Some("timestamp without time zone") {
            tracing::info!(table, column, "converting timestamp column to TIMESTAMPTZ");
            sqlx::raw_sql(&format!(
                "ALTER TABLE {table} ALTER COLUMN {column} TYPE TIMESTAMPTZ \
                 USING {column} AT TIME ZONE 'UTC'"
            ))
            .execute(pool)
            .await?;
        }
    }

    sqlx::raw_sql(
        r#"
        UPDATE projects SET tags = '{}' WHERE tags IS NULL;
        UPDATE projects SET created_at = now() WHERE created_at IS NULL;
        ALTER TABLE projects
            ALTER COLUMN tags SET DEFAULT '{}', ALTER COLUMN tags SET NOT NULL,
            ALTER COLUMN created_at SET DEFAULT now(), ALTER COLUMN created_at SET NOT NULL;

        UPDATE blog_posts SET tags = '{}' WHERE tags IS NULL;
        UPDATE blog_posts SET views = 0 WHERE views IS NULL;
        UPDATE blog_posts SET created_at = now() WHERE created_at IS NULL;
        ALTER TABLE blog_posts
            ALTER COLUMN tags SET DEFAULT '{}', ALTER COLUMN tags SET NOT NULL,
            ALTER COLUMN views SET DEFAULT 0, ALTER COLUMN views SET NOT NULL,
            ALTER COLUMN created_at SET DEFAULT now(), ALTER COLUMN created_at SET NOT NULL;

        UPDATE proposals SET name = '' WHERE name IS NULL;
        UPDATE proposals SET email = '' WHERE email IS NULL;
        UPDATE proposals SET message = '' WHERE message IS NULL;
        UPDATE proposals SET created_at = now() WHERE created_at IS NULL;
        ALTER TABLE proposals
            ALTER COLUMN name SET NOT NULL, ALTER COLUMN email SET NOT NULL,
            ALTER COLUMN message SET NOT NULL,
            ALTER COLUMN created_at SET DEFAULT now(), ALTER COLUMN created_at SET NOT NULL;

        UPDATE visits SET visited_at = now() WHERE visited_at IS NULL;
        ALTER TABLE visits
            ALTER COLUMN visited_at SET DEFAULT now(), ALTER COLUMN visited_at SET NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Creates the configured admin account, or resets its password if it exists.
pub async fn bootstrap_admin(
    credentials: &dyn CredentialStore,
    auth: &AuthConfig,
) -> Result<AdminAccount, BootstrapError> {
    let password_hash = match (&auth.admin_password_hash, &auth.admin_password) {
        (Some(hash), _) => hash.clone(),
        (None, plain) => {
            let plain = plain
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());
            tokio::task::spawn_blocking(move || hash(plain, DEFAULT_COST))
                .await
                .map_err(|e| BootstrapError::Hash(e.to_string()))?
                .map_err(|e| BootstrapError::Hash(e.to_string()))?
        }
    };

    let existed = credentials.find_account(&auth.admin_username).await?.is_some();
    let account = credentials
        .upsert_account(&auth.admin_username, &password_hash, Role::Admin)
        .await?;

    if existed {
        tracing::info!(username = %account.username, "admin password refreshed");
    } else {
        tracing::info!(username = %account.username, "admin account created");
    }

    Ok(account)
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to hash admin password: {0}")]
    Hash(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_config(password: Option<&str>, hash: Option<String>) -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_minutes: 60,
            admin_username: "owner".to_string(),
            admin_password: password.map(str::to_string),
            admin_password_hash: hash,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_creates_admin_with_verifiable_hash() {
        let store = MemoryStore::new();
        let account = bootstrap_admin(&store, &auth_config(Some("s3cret-pass"), None))
            .await
            .unwrap();
        assert_eq!(account.username, "owner");
        assert_eq!(account.role(), Role::Admin);
        assert!(bcrypt::verify("s3cret-pass", &account.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_bootstrap_twice_keeps_single_account_and_updates_hash() {
        let store = MemoryStore::new();
        bootstrap_admin(&store, &auth_config(Some("first-pass"), None))
            .await
            .unwrap();
        let precomputed = bcrypt::hash("second-pass", 4).unwrap();
        let account = bootstrap_admin(&store, &auth_config(None, Some(precomputed)))
            .await
            .unwrap();

        let found = store.find_account("owner").await.unwrap().unwrap();
        assert_eq!(found.id, account.id);
        assert!(bcrypt::verify("second-pass", &found.password_hash).unwrap());
        assert!(!bcrypt::verify("first-pass", &found.password_hash).unwrap());
    }
}
