use std::sync::Arc;

use crate::config::{AppConfig, AuthConfig};
use crate::db::{ContentStore, CredentialStore, MemoryStore, PgStore};
use crate::media::MediaIngest;
use crate::routes::auth::TokenKeys;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<dyn ContentStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub media: MediaIngest,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    pub fn new(
        content: Arc<dyn ContentStore>,
        credentials: Arc<dyn CredentialStore>,
        media: MediaIngest,
        auth: &AuthConfig,
    ) -> Self {
        Self {
            content,
            credentials,
            media,
            tokens: Arc::new(TokenKeys::new(&auth.jwt_secret, auth.token_ttl_minutes)),
        }
    }

    pub fn postgres(store: PgStore, config: &AppConfig) -> Self {
        let store = Arc::new(store);
        Self::new(
            store.clone(),
            store,
            MediaIngest::from_config(&config.media),
            &config.auth,
        )
    }

    pub fn in_memory(media: MediaIngest, auth: &AuthConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store, media, auth)
    }
}
