/**
 * Authentication Routes
 * Password login against the credential store and stateless JWT access tokens
 */
use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{request::Parts, HeaderMap},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::models::Role;
use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Tokens
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String, // Username
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

/// Signing and verification keys derived once from `JWT_SECRET`.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn issue(&self, username: &str, role: Role) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            role,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Extractors
// ============================================================================

/// Any caller holding a valid token. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            ApiError::Unauthorized
        })?;
        Ok(AuthUser(claims))
    }
}

/// A caller whose token carries the `admin` role. Viewers get 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            tracing::warn!(user = %claims.sub, role = %claims.role, "non-admin attempted a protected operation");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(claims))
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// User info returned to frontend
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserInfo {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserInfo,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

// ============================================================================
// Handlers
// ============================================================================

lazy_static::lazy_static! {
    /// Checked when the username is unknown, so both failures cost one bcrypt verify.
    static ref ABSENT_ACCOUNT_HASH: String =
        bcrypt::hash("absent-account", bcrypt::DEFAULT_COST).unwrap_or_default();
}

/// Runs bcrypt off the async runtime. `None` verifies against
/// [`ABSENT_ACCOUNT_HASH`] and always reports a mismatch.
async fn password_matches(password: String, hash: Option<String>) -> Result<bool, ApiError> {
    let known = hash.is_some();
    let outcome = tokio::task::spawn_blocking(move || {
        let hash = hash.unwrap_or_else(|| ABSENT_ACCOUNT_HASH.clone());
        bcrypt::verify(&password, &hash)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("password check panicked: {}", e)))?;

    match outcome {
        Ok(matches) => Ok(known && matches),
        Err(e) => {
            if known {
                tracing::error!("stored password hash is unusable: {}", e);
            }
            Ok(false)
        }
    }
}

/// POST /api/login
/// Unknown usernames and wrong passwords share one response.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    let username = payload.username.trim().to_string();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let account = state.credentials.find_account(&username).await?;
    let hash = account.as_ref().map(|a| a.password_hash.clone());
    let matches = password_matches(payload.password, hash).await?;

    let account = match account {
        Some(account) if matches => account,
        Some(_) => {
            tracing::warn!(username = %username, "login failed: wrong password");
            return Err(ApiError::InvalidCredentials);
        }
        None => {
            tracing::warn!(username = %username, "login failed: unknown user");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let role = account.role();
    let token = state
        .tokens
        .issue(&account.username, role)
        .map_err(|e| ApiError::Internal(format!("failed to sign token: {}", e)))?;

    tracing::info!(username = %account.username, role = %role, "login succeeded");

    Ok(Json(LoginResponse {
        success: true,
        user: UserInfo {
            username: account.username,
            role,
        },
        token,
    }))
}

/// POST /api/auth/verify
/// Reports whether the bearer token is still valid; always 200.
pub async fn verify_token(State(state): State<AppState>, headers: HeaderMap) -> Json<VerifyResponse> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Json(VerifyResponse {
            valid: false,
            user: None,
        });
    };

    match state.tokens.verify(token) {
        Ok(claims) => Json(VerifyResponse {
            valid: true,
            user: Some(UserInfo {
                username: claims.sub,
                role: claims.role,
            }),
        }),
        Err(e) => {
            tracing::debug!("Token verification failed: {}", e);
            Json(VerifyResponse {
                valid: false,
                user: None,
            })
        }
    }
}
