use std::time::Duration;

use firewatch_core::audit::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Audit write retry settings.
    pub audit: AuditConfig,
    /// JSON file with the region/location catalog. Built-in catalog when unset.
    pub region_catalog_path: Option<String>,
    /// Admin account created at startup if missing.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Retry settings for audit writes.
#[derive(Debug, Clone, Copy)]
pub struct AuditConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: 1000,
        }
    }
}

impl AuditConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Credentials for the startup admin account.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `3000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                       |
    /// | `AUDIT_MAX_ATTEMPTS`       | `3`                        |
    /// | `AUDIT_RETRY_DELAY_MS`     | `1000`                     |
    /// | `REGION_CATALOG_PATH`      | unset (built-in catalog)   |
    /// | `BOOTSTRAP_ADMIN_USERNAME` | unset (no bootstrap)       |
    /// | `BOOTSTRAP_ADMIN_PASSWORD` | unset (no bootstrap)       |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let defaults = AuditConfig::default();
        let max_attempts: u32 = std::env::var("AUDIT_MAX_ATTEMPTS")
            .unwrap_or_else(|_| defaults.max_attempts.to_string())
            .parse()
            .expect("AUDIT_MAX_ATTEMPTS must be a valid u32");
        assert!(max_attempts > 0, "AUDIT_MAX_ATTEMPTS must be at least 1");

        let retry_delay_ms: u64 = std::env::var("AUDIT_RETRY_DELAY_MS")
            .unwrap_or_else(|_| defaults.retry_delay_ms.to_string())
            .parse()
            .expect("AUDIT_RETRY_DELAY_MS must be a valid u64");

        let region_catalog_path = std::env::var("REGION_CATALOG_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let bootstrap_admin = match (
            std::env::var("BOOTSTRAP_ADMIN_USERNAME"),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.trim().is_empty() => Some(BootstrapAdmin {
                username: username.trim().to_string(),
                password,
            }),
            _ => None,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            audit: AuditConfig {
                max_attempts,
                retry_delay_ms,
            },
            region_catalog_path,
            bootstrap_admin,
        }
    }
}
