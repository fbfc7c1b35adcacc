//! Application configuration, read once from the environment at startup.

use std::env;
use std::str::FromStr;

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/portfolio".to_string()),
            max_connections: parse_var("DB_POOL_MAX", 10),
            min_connections: parse_var("DB_POOL_MIN", 2),
            connect_timeout_secs: parse_var("DB_CONNECT_TIMEOUT", 10),
            idle_timeout_secs: parse_var("DB_IDLE_TIMEOUT", 300),
        }
    }
}

/// Credentials for the Cloudinary upload API.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryConfig {
    /// Returns `None` unless all three variables are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let cloud_name = non_empty_var("CLOUDINARY_CLOUD_NAME")?;
        let api_key = non_empty_var("CLOUDINARY_API_KEY")?;
        let api_secret = non_empty_var("CLOUDINARY_API_SECRET")?;
        Some(Self {
            cloud_name,
            api_key,
            api_secret,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub folder: String,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            folder: env::var("MEDIA_FOLDER").unwrap_or_else(|_| "portfolio".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", 5 * 1024 * 1024),
            cloudinary: CloudinaryConfig::from_env(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub admin_username: String,
    /// Plain password from `ADMIN_PASSWORD`; hashed during bootstrap.
    pub admin_password: Option<String>,
    /// Pre-computed bcrypt hash from `ADMIN_HASH_PASSWORD`; wins over the plain password.
    pub admin_password_hash: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            token_ttl_minutes: parse_var("TOKEN_TTL_MINUTES", 480),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
            admin_password_hash: non_empty_var("ADMIN_HASH_PASSWORD"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    /// `None` means run on the in-memory store.
    pub database: Option<DbConfig>,
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub static_dir: Option<String>,
    pub max_body_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 5000),
            database: env::var("DATABASE_URL").ok().map(|_| DbConfig::default()),
            auth: AuthConfig::default(),
            media: MediaConfig::default(),
            static_dir: non_empty_var("STATIC_DIR"),
            max_body_bytes: parse_var("MAX_BODY_BYTES", 10 * 1024 * 1024),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
