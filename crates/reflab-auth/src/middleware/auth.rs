//! Bearer token authentication extractor.
//!
//! The extractor validates the `Authorization: Bearer <token>` header, then
//! re-fetches the user from storage on every request. A role change or a
//! deactivation therefore takes effect immediately, even for tokens issued
//! before the change; the role claim inside the token is never trusted for
//! authorization decisions.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use reflab_core::{DocumentId, Role};

use crate::error::AuthError;
use crate::token::{AccessTokenClaims, TokenService};
use crate::user::{User, UserStorage};

// =============================================================================
// Auth State
// =============================================================================

/// State required for bearer token authentication.
///
/// Include this in the application state and expose it to the `BearerAuth`
/// extractor via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// Token service for signature and expiry validation.
    pub token_service: Arc<TokenService>,

    /// User storage for the per-request user re-fetch.
    pub user_storage: Arc<dyn UserStorage>,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(token_service: Arc<TokenService>, user_storage: Arc<dyn UserStorage>) -> Self {
        Self {
            token_service,
            user_storage,
        }
    }
}

// =============================================================================
// Auth Context
// =============================================================================

/// The authenticated caller of a request.
///
/// Holds the freshly fetched user record, so `role()` reflects current
/// storage state rather than the token claim.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The user as currently stored.
    pub user: User,
    /// The validated token claims.
    pub claims: AccessTokenClaims,
}

impl AuthContext {
    /// Returns the caller's current role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.user.role
    }

    /// Returns the caller's user id.
    #[must_use]
    pub fn user_id(&self) -> DocumentId {
        self.user.id
    }

    /// Checks that the caller's role is in the allowed set.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` when it is not.
    pub fn require_any(&self, allowed: &[Role]) -> Result<(), AuthError> {
        if allowed.contains(&self.user.role) {
            Ok(())
        } else {
            tracing::debug!(
                user_id = %self.user.id,
                role = %self.user.role,
                "Role check failed"
            );
            Err(AuthError::forbidden("Insufficient permissions"))
        }
    }
}

// =============================================================================
// Bearer Auth Extractor
// =============================================================================

/// Axum extractor that validates bearer tokens and builds the auth context.
///
/// This extractor:
/// 1. Extracts the `Authorization: Bearer <token>` header
/// 2. Verifies the token signature and expiry
/// 3. Re-fetches the user named in the subject claim
/// 4. Rejects if the user is missing or inactive
///
/// # Errors
///
/// Returns `AuthError` (which implements `IntoResponse`) for a missing or
/// malformed header, an invalid or expired token, or an unknown or inactive
/// user.
#[derive(Debug)]
pub struct BearerAuth(pub AuthContext);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::unauthorized("Missing Authorization header"))?;

        let claims = auth_state.token_service.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Token validation failed");
            e
        })?;

        let user_id = DocumentId::parse(&claims.sub)
            .map_err(|_| AuthError::unauthorized("Invalid authentication credentials"))?;

        // Per-request re-fetch: tokens carry the subject, storage decides.
        let user = auth_state
            .user_storage
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(user_id = %user_id, "Token subject not found in storage");
                AuthError::unauthorized("Invalid authentication credentials")
            })?;

        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Inactive user presented a valid token");
            return Err(AuthError::unauthorized(
                "Invalid authentication credentials",
            ));
        }

        tracing::debug!(user_id = %user.id, role = %user.role, "Token validated");

        Ok(BearerAuth(AuthContext { user, claims }))
    }
}

// =============================================================================
// Tests
// =============================================================================
