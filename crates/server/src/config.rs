//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - none: the server boots with defaults and an empty menu file
//!
//! ## Optional
//! - `MESA_HOST` - Bind address (default: 127.0.0.1)
//! - `MESA_PORT` - Listen port (default: 3000)
//! - `MESA_MENU_PATH` - Menu catalog JSON file (default: static/menu.json)
//! - `OPENAI_API_KEY` - Key for realtime session negotiation; requests to
//!   `/api/realtime/session` fail without it
//! - `MESA_REALTIME_URL` - Session negotiation endpoint
//! - `MESA_REALTIME_MODEL` - Default realtime model (gpt-4o-realtime-preview)
//! - `MESA_REALTIME_VOICE` - Default realtime voice (verse)
//! - `MESA_REALTIME_TIMEOUT_SECS` - Negotiation timeout (default: 20)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Mesa server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Path of the persisted menu catalog JSON
    pub menu_path: PathBuf,
    /// API key for the realtime session endpoint, if configured
    pub openai_api_key: Option<SecretString>,
    /// Realtime session negotiation endpoint
    pub realtime_url: String,
    /// Default realtime model, overridable per request
    pub realtime_model: String,
    /// Default realtime voice, overridable per request
    pub realtime_voice: String,
    /// Bound on the negotiation round trip
    pub realtime_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("MESA_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("MESA_PORT", "3000")?;
        let timeout_secs: u64 = parse_env_or_default("MESA_REALTIME_TIMEOUT_SECS", "20")?;

        Ok(Self {
            host,
            port,
            menu_path: PathBuf::from(get_env_or_default("MESA_MENU_PATH", "static/menu.json")),
            openai_api_key: get_optional_env("OPENAI_API_KEY").map(SecretString::from),
            realtime_url: get_env_or_default(
                "MESA_REALTIME_URL",
                "https://api.openai.com/v1/realtime/sessions",
            ),
            realtime_model: get_env_or_default("MESA_REALTIME_MODEL", "gpt-4o-realtime-preview"),
            realtime_voice: get_env_or_default("MESA_REALTIME_VOICE", "verse"),
            realtime_timeout: Duration::from_secs(timeout_secs),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an environment variable, falling back to a default.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
