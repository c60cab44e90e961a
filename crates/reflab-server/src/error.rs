//! HTTP-boundary error type for resource handlers.
//!
//! Handlers return `ApiError`, which converts from the domain and storage
//! error types and renders the flat `{error, message}` JSON body. Auth errors
//! keep their own `IntoResponse` (with the `WWW-Authenticate` challenge) and
//! pass through unchanged.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reflab_auth::AuthError;
use reflab_core::CoreError;
use reflab_storage::StorageError;
use serde_json::json;

/// Errors surfaced by the resource handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A domain-level error (bad id, bad transition, not found, conflict).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An authentication or authorization failure.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // AuthError knows its own status codes and 401 challenge header.
            Self::Auth(err) => err.into_response(),
            Self::Core(err) => {
                let (status, code) = match &err {
                    CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                    CoreError::Conflict { .. } => (StatusCode::BAD_REQUEST, "conflict"),
                    CoreError::InvalidId(_)
                    | CoreError::InvalidRole(_)
                    | CoreError::InvalidTransition { .. }
                    | CoreError::InvalidDocument { .. }
                    | CoreError::JsonError(_) => (StatusCode::BAD_REQUEST, "invalid"),
                };
                (status, Json(json!({ "error": code, "message": err.to_string() })))
                    .into_response()
            }
            Self::Storage(err) => {
                if err.is_not_found() {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "error": "not_found", "message": err.to_string() })),
                    )
                        .into_response()
                } else {
                    tracing::error!(error = %err, "Storage operation failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "error": "server_error",
                            "message": "Internal server error",
                        })),
                    )
                        .into_response()
                }
            }
        }
    }
}
