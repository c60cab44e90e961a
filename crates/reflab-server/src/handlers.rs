//! Health, probe, and auth endpoint handlers.

use axum::{Form, Json, extract::State};
use reflab_auth::service::{RegisterRequest, SeedAdminRequest, SeedAdminResponse, TokenResponse};
use reflab_auth::{AuthError, BearerAuth, PublicUser, policy};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::state::AppState;

/// Liveness: the process is up.
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Clinical Referral Lab Management API running" }))
}

/// Store connectivity probe.
///
/// Never fails the request: a backend failure is captured into the payload
/// so the endpoint stays useful for diagnosing a broken deployment.
pub async fn probe(State(state): State<AppState>) -> Json<Value> {
    let mut response = json!({
        "backend": "running",
        "store": state.store.backend_name(),
        "database_url": if state.config.database_url.is_some() { "set" } else { "not_set" },
        "database_name": if state.config.database_name.is_some() { "set" } else { "not_set" },
        "connection_status": "not_connected",
        "collections": [],
    });

    match state.store.ping().await {
        Ok(()) => {
            response["connection_status"] = json!("connected");
            match state.store.collection_names().await {
                Ok(mut names) => {
                    names.truncate(10);
                    response["collections"] = json!(names);
                }
                Err(e) => {
                    response["collections_error"] = json!(e.to_string());
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Store probe failed");
            response["connection_status"] = json!(format!("error: {e}"));
        }
    }

    Json(response)
}

/// `POST /auth/register` — admin only.
pub async fn register(
    State(state): State<AppState>,
    BearerAuth(ctx): BearerAuth,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, AuthError> {
    ctx.require_any(policy::REGISTER_USER)?;
    let user = state.auth_service.register(request).await?;
    Ok(Json(user))
}

/// OAuth2-style password form: the `username` field carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// `POST /auth/login` — public.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, AuthError> {
    let token = state
        .auth_service
        .login(&form.username, &form.password)
        .await?;
    Ok(Json(token))
}

/// `GET /auth/me` — any authenticated user.
pub async fn me(BearerAuth(ctx): BearerAuth) -> Json<PublicUser> {
    Json(ctx.user.public())
}

/// `POST /auth/seed-admin` — public, gated by the bootstrap secret.
pub async fn seed_admin(
    State(state): State<AppState>,
    Json(request): Json<SeedAdminRequest>,
) -> Result<Json<SeedAdminResponse>, AuthError> {
    let response = state.auth_service.seed_admin(request).await?;
    Ok(Json(response))
}
