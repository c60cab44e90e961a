//! Router assembly and the server run loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use reflab_db_memory::MemoryDocumentStore;
use reflab_storage::DocumentStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{handlers, resources};

/// Builds the full application router over the given state.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        // Health and probe
        .route("/", get(handlers::root))
        .route("/test", get(handlers::probe))
        // Auth surface
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::me))
        .route("/auth/seed-admin", post(handlers::seed_admin))
        // Patients
        .route(
            "/patients",
            post(resources::patients::create).get(resources::patients::list),
        )
        .route(
            "/patients/{id}",
            get(resources::patients::get)
                .put(resources::patients::update)
                .delete(resources::patients::delete),
        )
        // Test catalog
        .route(
            "/tests",
            post(resources::catalog::create).get(resources::catalog::list),
        )
        .route(
            "/tests/{id}",
            get(resources::catalog::get)
                .put(resources::catalog::update)
                .delete(resources::catalog::delete),
        )
        // Referrals
        .route(
            "/referrals",
            post(resources::referrals::create).get(resources::referrals::list),
        )
        .route(
            "/referrals/{id}",
            get(resources::referrals::get).put(resources::referrals::update),
        )
        // Results
        .route(
            "/results",
            post(resources::results::create).get(resources::results::list),
        )
        .route(
            "/results/{id}",
            get(resources::results::get).put(resources::results::update),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The assembled server, ready to bind and serve.
pub struct ReflabServer {
    addr: SocketAddr,
    app: Router,
}

impl ReflabServer {
    /// Builds the server from configuration with the in-memory store.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        Self::with_store(config, store)
    }

    /// Builds the server over an explicit store backend.
    #[must_use]
    pub fn with_store(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        if !config.secret_from_env {
            tracing::warn!(
                "REFLAB_SECRET is not set; using the development fallback secret. \
                 Do not run this in production."
            );
        }
        if config.auth.bootstrap.secret.is_none() {
            tracing::info!("REFLAB_BOOTSTRAP_SECRET is not set; seed-admin is disabled");
        }
        if config.allow_freeform_status {
            tracing::warn!("Free-form status mode enabled; transition validation is off");
        }

        let addr = config.addr();
        let state = AppState::new(config, store);
        let app = build_app(state);
        Self { addr, app }
    }

    /// Binds and serves until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if binding or serving fails.
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(addr = %self.addr, "Reflab server listening");
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}
