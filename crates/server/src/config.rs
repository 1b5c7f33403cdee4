//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (TLS required), unless
//!   `DEV_DATABASE_URL` is set
//!
//! ## Optional
//! - `DEV_DATABASE_URL` - Local `PostgreSQL` connection string, takes precedence
//!   over `DATABASE_URL` and is used without forcing TLS
//! - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 20)
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 5000)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated browser origins allowed to call the API
//! - `SMTP_HOST` - Enables order notification emails when set
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM` - Relay credentials and sender
//! - `ORDER_NOTIFICATION_TO` - Recipient of order notifications
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `text` (default) or `json`

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_ALLOWED_ORIGINS: &str =
    "http://localhost:3000,https://gum-comic-claim-client.herokuapp.com";

/// Prefixes of unfilled template values (case-insensitive)
const PLACEHOLDER_PREFIXES: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
    "<",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Database connection settings
    pub database: DatabaseConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Browser origins allowed by CORS
    pub cors_allowed_origins: Vec<String>,
    /// SMTP settings for order notifications; `None` disables them
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL (contains password)
    pub url: SecretString,
    /// Whether to require TLS (production databases)
    pub require_tls: bool,
    /// Maximum pooled connections
    pub max_connections: u32,
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
    /// Where order notifications are delivered
    pub notify_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("notify_address", &self.notify_address)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (unfilled placeholder).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database = DatabaseConfig::from_lookup(env)?;
        let host = get_env_or_default(env, "HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default(env, "PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let cors_allowed_origins = parse_origins(&get_env_or_default(
            env,
            "CORS_ALLOWED_ORIGINS",
            DEFAULT_ALLOWED_ORIGINS,
        ))?;
        let email = EmailConfig::from_lookup(env)?;
        let log_format = match get_env_or_default(env, "LOG_FORMAT", "text").as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "LOG_FORMAT".to_string(),
                    format!("expected 'text' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            database,
            host,
            port,
            cors_allowed_origins,
            email,
            sentry_dsn: get_optional_env(env, "SENTRY_DSN"),
            sentry_environment: get_optional_env(env, "SENTRY_ENVIRONMENT"),
            log_format,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DatabaseConfig {
    fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let (url, require_tls) = if let Some(url) = get_optional_env(env, "DEV_DATABASE_URL") {
            (url, false)
        } else {
            (get_required_env(env, "DATABASE_URL")?, true)
        };

        let max_connections = get_env_or_default(env, "DATABASE_MAX_CONNECTIONS", "20")
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "DATABASE_MAX_CONNECTIONS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        Ok(Self {
            url: SecretString::from(url),
            require_tls,
            max_connections,
        })
    }
}

impl EmailConfig {
    fn from_lookup(env: &dyn Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env(env, "SMTP_HOST") else {
            return Ok(None);
        };

        let smtp_port = get_env_or_default(env, "SMTP_PORT", "587")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?;

        Ok(Some(Self {
            smtp_host,
            smtp_port,
            smtp_username: get_required_env(env, "SMTP_USERNAME")?,
            smtp_password: get_secret(env, "SMTP_PASSWORD")?,
            from_address: get_required_env(env, "SMTP_FROM")?,
            notify_address: get_required_env(env, "ORDER_NOTIFICATION_TO")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).filter(|v| !v.trim().is_empty())
}

/// Get a required environment variable.
fn get_required_env(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    get_optional_env(env, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: &dyn Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional_env(env, key).unwrap_or_else(|| default.to_string())
}

/// Split and validate a comma-separated origin list.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            let is_http = origin.starts_with("http://") || origin.starts_with("https://");
            if !is_http || HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::InvalidEnvVar(
                    "CORS_ALLOWED_ORIGINS".to_string(),
                    format!("'{origin}' is not an http(s) origin"),
                ));
            }
            Ok(origin.trim_end_matches('/').to_string())
        })
        .collect()
}

/// Reject a secret that is still an unfilled template value.
///
/// Only the start of the value is checked; provider-issued passwords may
/// contain any substring.
fn validate_not_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.trim().to_lowercase();

    match PLACEHOLDER_PREFIXES
        .iter()
        .find(|prefix| lower.starts_with(*prefix))
    {
        Some(prefix) => Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (starts with '{prefix}')"),
        )),
        None => Ok(()),
    }
}

/// Load a required secret, rejecting unfilled placeholders.
fn get_secret(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(env, key)?;
    validate_not_placeholder(&value, key)?;
    Ok(SecretString::from(value))
}
