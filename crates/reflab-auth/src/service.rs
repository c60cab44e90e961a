//! The auth service: registration, login, and first-admin bootstrap.

use std::sync::Arc;

use reflab_core::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AuthResult;
use crate::config::BootstrapConfig;
use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::token::TokenService;
use crate::user::{PublicUser, UserStorage};

/// Login failures never reveal whether the email or the password was wrong.
const BAD_CREDENTIALS: &str = "incorrect email or password";

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Seed-admin request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdminRequest {
    /// The out-of-band bootstrap secret.
    pub secret: String,
    /// Optional admin password; generated when absent.
    #[serde(default)]
    pub password: Option<String>,
}

/// Seed-admin outcome. Credentials are reported exactly once, on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAdminResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Registers users, authenticates logins, and seeds the first admin.
pub struct AuthService {
    users: Arc<dyn UserStorage>,
    tokens: Arc<TokenService>,
    bootstrap: BootstrapConfig,
}

impl AuthService {
    /// Creates an auth service over the given user storage and token service.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStorage>,
        tokens: Arc<TokenService>,
        bootstrap: BootstrapConfig,
    ) -> Self {
        Self {
            users,
            tokens,
            bootstrap,
        }
    }

    /// Registers a new user.
    ///
    /// The admin gate is applied by the caller (the HTTP layer checks the
    /// allowed-role set before invoking this).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Conflict` if the email is already registered.
    /// The check is find-then-insert: two concurrent registrations with the
    /// same email can both pass it, which is the accepted weak-consistency
    /// behavior of the single-document store.
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<PublicUser> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::conflict("Email already registered"));
        }
        let password_hash = hash_password(&request.password)?;
        let user = self
            .users
            .create(&request.name, &request.email, &password_hash, request.role)
            .await?;
        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user.public())
    }

    /// Authenticates a login and issues a bearer token.
    ///
    /// # Errors
    ///
    /// Returns the same generic `AuthError::Unauthorized` for an unknown
    /// email and for a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<TokenResponse> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Err(AuthError::unauthorized(BAD_CREDENTIALS));
        };
        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::unauthorized(BAD_CREDENTIALS));
        }
        let access_token = self.tokens.issue(&user.id, user.role)?;
        tracing::debug!(user_id = %user.id, "Login succeeded");
        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    /// Seeds the first admin user. Idempotent: if any admin exists this is a
    /// no-op reporting existence.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` if bootstrap is not configured and
    /// `AuthError::Unauthorized` if the presented secret does not match.
    pub async fn seed_admin(&self, request: SeedAdminRequest) -> AuthResult<SeedAdminResponse> {
        let Some(expected) = self.bootstrap.secret.as_deref() else {
            return Err(AuthError::forbidden("admin bootstrap is disabled"));
        };
        if request.secret != expected {
            tracing::warn!("Admin bootstrap attempted with a bad secret");
            return Err(AuthError::unauthorized("invalid bootstrap secret"));
        }

        if self.users.count_by_role(Role::Admin).await? > 0 {
            return Ok(SeedAdminResponse {
                message: "Admin exists".to_string(),
                email: None,
                password: None,
            });
        }

        let password = request
            .password
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let password_hash = hash_password(&password)?;
        let user = self
            .users
            .create(
                &self.bootstrap.admin_name,
                &self.bootstrap.admin_email,
                &password_hash,
                Role::Admin,
            )
            .await?;
        tracing::info!(user_id = %user.id, "Bootstrap admin seeded");

        Ok(SeedAdminResponse {
            message: "Admin seeded".to_string(),
            email: Some(user.email),
            password: Some(password),
        })
    }
}
