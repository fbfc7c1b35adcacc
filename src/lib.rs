//! Portfolio CMS - REST backend and headless client for a portfolio site

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod markup;
pub mod media;
pub mod routes;
pub mod state;
pub mod stats;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::{AppConfig, DEFAULT_JWT_SECRET};
use crate::db::PgStore;
use crate::media::MediaIngest;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("JWT_SECRET must be set to a secure, unique value in production")]
    InsecureJwtSecret,
    #[error("invalid HOST/PORT configuration: {0}")]
    Address(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("admin bootstrap failed: {0}")]
    Bootstrap(#[from] db::BootstrapError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN, else the local dev servers.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .map(|s| {
            s.split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect::<Vec<HeaderValue>>()
        })
        .filter(|origins| !origins.is_empty())
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("http://127.0.0.1:5173"),
                HeaderValue::from_static("http://localhost:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState, config: &AppConfig) -> Router {
    let uploads = ServeDir::new(&config.media.upload_dir);

    let mut app = Router::new()
        .nest("/api", routes::api_router())
        .route("/health", get(routes::health::health_ping))
        .route("/health/database", get(routes::health::health_database))
        .nest_service(media::local::PUBLIC_PREFIX, uploads);

    // Single-page app: unknown paths fall back to index.html for client-side routing.
    if let Some(static_dir) = &config.static_dir {
        let index = Path::new(static_dir).join("index.html");
        app = app.fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)));
        tracing::info!(dir = %static_dir, "serving static site");
    }

    app.with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        // Multipart extraction has its own default cap; both follow MAX_BODY_BYTES.
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(configure_cors())
}

/// Connects storage, seeds the admin account and builds the shared state.
pub async fn build_state(config: &AppConfig) -> Result<AppState, ServerError> {
    let state = match &config.database {
        Some(db_config) => {
            let pool = db::init_pool(db_config).await?;
            db::run_migrations(&pool).await?;
            AppState::postgres(PgStore::new(pool), config)
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set. Running on the in-memory store; content is lost on restart."
            );
            AppState::in_memory(MediaIngest::from_config(&config.media), &config.auth)
        }
    };

    db::bootstrap_admin(state.credentials.as_ref(), &config.auth).await?;
    Ok(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Run the server (used by main).
pub async fn run() -> Result<(), ServerError> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env();

    let _log_guards = logging::init(&config);
    routes::health::init_start_time();

    if config.is_production() {
        if config.auth.jwt_secret.is_empty() || config.auth.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ServerError::InsecureJwtSecret);
        }
        if config.auth.admin_password.is_none() && config.auth.admin_password_hash.is_none() {
            tracing::warn!(
                "SECURITY: Neither ADMIN_HASH_PASSWORD nor ADMIN_PASSWORD is set. \
                 The fallback default password '{}' is insecure.",
                db::DEFAULT_ADMIN_PASSWORD
            );
        }
    }

    let state = build_state(&config).await?;
    let app = create_app(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e: std::net::AddrParseError| ServerError::Address(e.to_string()))?;
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
