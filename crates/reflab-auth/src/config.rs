//! Authentication configuration.
//!
//! Built once at process start from the environment and passed by reference
//! into the token service and auth service; nothing reads configuration ad
//! hoc after startup.

use serde::{Deserialize, Serialize};

/// Default token validity window: 12 hours.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 720;

/// Authentication and authorization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Process-wide signing secret for bearer tokens.
    pub secret: String,
    /// Token validity window in minutes.
    pub token_ttl_minutes: i64,
    /// First-admin bootstrap settings.
    pub bootstrap: BootstrapConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.secret.is_empty() {
            return Err("auth secret must not be empty".into());
        }
        if self.token_ttl_minutes <= 0 {
            return Err("token_ttl_minutes must be > 0".into());
        }
        if self.bootstrap.admin_email.is_empty() {
            return Err("bootstrap admin email must not be empty".into());
        }
        Ok(())
    }
}

/// Settings for the one-time first-admin bootstrap.
///
/// The seed-admin operation only works when an out-of-band secret is
/// configured; with no secret the operation refuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Single-use secret the caller must present to seed the first admin.
    pub secret: Option<String>,
    /// Display name of the bootstrap admin.
    pub admin_name: String,
    /// Login email of the bootstrap admin.
    pub admin_email: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            secret: None,
            admin_name: "Super Admin".to_string(),
            admin_email: "admin@lab.local".to_string(),
        }
    }
}
