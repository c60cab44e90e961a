//! Server configuration, built once at startup from the process environment.
//!
//! Nothing reads environment variables after startup; the resulting
//! [`AppConfig`] is immutable and threaded through the application state.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use reflab_auth::config::{AuthConfig, BootstrapConfig, DEFAULT_TOKEN_TTL_MINUTES};

/// Default bind port.
pub const DEFAULT_PORT: u16 = 8000;

/// List cap for patients, referrals, and results.
pub const DEFAULT_LIST_CAP: usize = 200;

/// List cap for the test catalog.
pub const CATALOG_LIST_CAP: usize = 500;

/// The fallback signing secret for local development only.
const DEV_SECRET: &str = "supersecretkey";

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Authentication settings.
    pub auth: AuthConfig,
    /// When true, status transition rules are not enforced on update.
    pub allow_freeform_status: bool,
    /// Whether the signing secret came from the environment or the
    /// development fallback.
    pub secret_from_env: bool,
    /// `DATABASE_URL`, captured for the connectivity probe. The in-memory
    /// backend ignores it.
    pub database_url: Option<String>,
    /// `DATABASE_NAME`, captured for the connectivity probe.
    pub database_name: Option<String>,
}

impl AppConfig {
    /// Builds the configuration from the process environment.
    ///
    /// Recognized variables:
    /// - `HOST` (default `0.0.0.0`)
    /// - `PORT` (default `8000`)
    /// - `REFLAB_SECRET` — token signing secret (development fallback when
    ///   unset)
    /// - `REFLAB_TOKEN_TTL_MINUTES` (default `720`)
    /// - `REFLAB_BOOTSTRAP_SECRET` — enables the seed-admin endpoint
    /// - `REFLAB_ALLOW_FREEFORM_STATUS` — disables transition validation
    ///
    /// # Errors
    ///
    /// Returns a description of the first malformed variable.
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("PORT is not a valid port number: {raw}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let (secret, secret_from_env) = match env::var("REFLAB_SECRET") {
            Ok(s) if !s.is_empty() => (s, true),
            _ => (DEV_SECRET.to_string(), false),
        };

        let token_ttl_minutes = match env::var("REFLAB_TOKEN_TTL_MINUTES") {
            Ok(raw) => raw
                .parse::<i64>()
                .map_err(|_| format!("REFLAB_TOKEN_TTL_MINUTES is not a number: {raw}"))?,
            Err(_) => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let bootstrap = BootstrapConfig {
            secret: env::var("REFLAB_BOOTSTRAP_SECRET").ok().filter(|s| !s.is_empty()),
            ..BootstrapConfig::default()
        };

        let allow_freeform_status = env::var("REFLAB_ALLOW_FREEFORM_STATUS")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let cfg = Self {
            host,
            port,
            auth: AuthConfig {
                secret,
                token_ttl_minutes,
                bootstrap,
            },
            allow_freeform_status,
            secret_from_env,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            database_name: env::var("DATABASE_NAME").ok().filter(|s| !s.is_empty()),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be > 0".into());
        }
        self.auth.validate()
    }

    /// Returns the socket address to bind.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        let host: IpAddr = self
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.port))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            auth: AuthConfig {
                secret: DEV_SECRET.to_string(),
                token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
                bootstrap: BootstrapConfig::default(),
            },
            allow_freeform_status: false,
            secret_from_env: false,
            database_url: None,
            database_name: None,
        }
    }
}
