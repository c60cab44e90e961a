//! Error response handling for the authentication middleware.
//!
//! Implements `IntoResponse` for `AuthError` so extractors and handlers can
//! return it directly. Bodies are a flat JSON object; 401 responses carry a
//! `WWW-Authenticate` challenge.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = error_details(&self);

        let body = json!({
            "error": code,
            "message": message,
        });

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(code, &message);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        if status.is_server_error() {
            tracing::error!(error = %self, "Auth operation failed");
        }

        (status, headers, Json(body)).into_response()
    }
}

/// Extracts response details from an `AuthError`.
///
/// Returns (HTTP status, stable error code, message).
fn error_details(error: &AuthError) -> (StatusCode, &'static str, String) {
    match error {
        AuthError::InvalidToken { message } => {
            (StatusCode::UNAUTHORIZED, "invalid_token", message.clone())
        }
        AuthError::TokenExpired => (
            StatusCode::UNAUTHORIZED,
            "invalid_token",
            "Token has expired".to_string(),
        ),
        AuthError::Unauthorized { message } => {
            (StatusCode::UNAUTHORIZED, "unauthorized", message.clone())
        }
        AuthError::Forbidden { message } => (StatusCode::FORBIDDEN, "forbidden", message.clone()),
        AuthError::Conflict { message } => (StatusCode::BAD_REQUEST, "conflict", message.clone()),
        AuthError::Storage { .. } | AuthError::Configuration { .. } | AuthError::Internal { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "server_error",
            "Internal server error".to_string(),
        ),
    }
}

/// Builds the `WWW-Authenticate` header value for 401 responses.
///
/// Format: `Bearer realm="reflab", error="invalid_token", error_description="..."`
fn build_www_authenticate_header(error: &str, description: &str) -> String {
    let escaped_desc = description.replace('\"', "\\\"");
    format!(
        "Bearer realm=\"reflab\", error=\"{}\", error_description=\"{}\"",
        error, escaped_desc
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_unauthorized_response() {
        let response = AuthError::unauthorized("Missing Authorization header").into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let www_auth = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(www_auth.contains("Bearer"));
        assert!(www_auth.contains("realm=\"reflab\""));
        assert!(www_auth.contains("error=\"unauthorized\""));
    }

    #[tokio::test]
    async fn test_forbidden_response_has_no_challenge() {
        let response = AuthError::forbidden("Insufficient permissions").into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_token_expired_response() {
        let response = AuthError::TokenExpired.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let www_auth = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(www_auth.contains("error=\"invalid_token\""));
    }

    #[tokio::test]
    async fn test_conflict_is_a_client_error() {
        let response = AuthError::conflict("Email already registered").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_internal_errors_are_opaque() {
        let response = AuthError::storage("connection refused to db host").into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "server_error");
        assert_eq!(json["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        let response = AuthError::invalid_token("Malformed JWT").into_response();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "invalid_token");
        assert_eq!(json["message"], "Malformed JWT");
    }

    #[test]
    fn test_www_authenticate_header_escaping() {
        let header = build_www_authenticate_header("invalid_token", "Token contains \"quotes\"");
        assert!(header.contains("\\\"quotes\\\""));
    }
}
