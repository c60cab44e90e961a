//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;
use reflab_auth::{AuthService, AuthState, DocumentUserStore, TokenService};
use reflab_storage::DocumentStore;

use crate::config::AppConfig;

/// Everything the handlers need, cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// Immutable startup configuration.
    pub config: Arc<AppConfig>,
    /// The document store backing every collection.
    pub store: Arc<dyn DocumentStore>,
    /// Token validation and user re-fetch state for the `BearerAuth` extractor.
    pub auth: AuthState,
    /// Register / login / seed-admin operations.
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    /// Wires the full state graph over the given store.
    #[must_use]
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let token_service = Arc::new(TokenService::new(
            &config.auth.secret,
            config.auth.token_ttl_minutes,
        ));
        let user_storage = Arc::new(DocumentUserStore::new(store.clone()));
        let auth = AuthState::new(token_service.clone(), user_storage.clone());
        let auth_service = Arc::new(AuthService::new(
            user_storage,
            token_service,
            config.auth.bootstrap.clone(),
        ));
        Self {
            config: Arc::new(config),
            store,
            auth,
            auth_service,
        }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
