#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use portfolio_cms::client::ApiClient;
use portfolio_cms::config::AppConfig;
use portfolio_cms::db::{self, models::Role};
use portfolio_cms::media::{local::LocalStore, MediaIngest};
use portfolio_cms::state::AppState;
use portfolio_cms::{create_app, routes::health};

pub const ADMIN_PASSWORD: &str = "admin123";
pub const VIEWER_PASSWORD: &str = "viewer123";

/// 1x1 PNG header; enough for content sniffing.
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

pub struct TestServer {
    pub base_url: String,
    pub upload_dir: PathBuf,
}

impl TestServer {
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url).expect("client builds")
    }

    pub async fn admin_client(&self) -> Result<ApiClient> {
        self.signed_in("admin", ADMIN_PASSWORD).await
    }

    pub async fn viewer_client(&self) -> Result<ApiClient> {
        self.signed_in("viewer", VIEWER_PASSWORD).await
    }

    async fn signed_in(&self, username: &str, password: &str) -> Result<ApiClient> {
        let mut client = self.client();
        let session = client.login(username, password).await?;
        client.set_token(Some(session.token));
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.upload_dir).ok();
    }
}

/// Serves a fresh in-memory app on an ephemeral port. Each call gets its own
/// store and upload directory.
pub async fn spawn_app() -> Result<TestServer> {
    let upload_dir = std::env::temp_dir().join(format!("portfolio-cms-it-{}", uuid::Uuid::new_v4()));

    let mut config = AppConfig::from_env();
    config.database = None;
    config.static_dir = None;
    config.media.upload_dir = upload_dir.to_string_lossy().into_owned();
    config.auth.jwt_secret = "integration-secret".to_string();
    config.auth.admin_username = "admin".to_string();
    config.auth.admin_password = None;
    config.auth.admin_password_hash = Some(bcrypt::hash(ADMIN_PASSWORD, 4)?);

    let media = MediaIngest::new(
        Arc::new(LocalStore::new(&upload_dir, &config.media.folder)),
        config.media.max_upload_bytes,
    );
    let state = AppState::in_memory(media, &config.auth);
    db::bootstrap_admin(state.credentials.as_ref(), &config.auth).await?;
    state
        .credentials
        .upsert_account("viewer", &bcrypt::hash(VIEWER_PASSWORD, 4)?, Role::Viewer)
        .await?;

    health::init_start_time();
    let app = create_app(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        upload_dir,
    })
}
