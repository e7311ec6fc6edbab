//! Configuration management
//!
//! All configuration is sourced from environment variables (a `.env` file,
//! when present, is loaded by `main` before this runs).
//!
//! The Google client id and secret are the only required values; everything
//! else falls back to a sensible default. A missing credential is a fatal
//! startup error — the process must refuse to bind a listener without it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Google OAuth configuration
    pub google: GoogleConfig,
    /// Session configuration
    pub session: SessionConfig,
    /// Protected dashboard document
    pub dashboard: DashboardConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Google OAuth configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client id (required)
    pub client_id: String,
    /// OAuth client secret (required)
    pub client_secret: String,
    /// Redirect URI registered with Google
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
    /// Email domain allowed through the gate
    #[serde(default = "default_allowed_domain")]
    pub allowed_domain: String,
}

fn default_callback_url() -> String {
    "http://localhost:8080/auth/google/callback".to_string()
}

fn default_allowed_domain() -> String {
    "ultrahuman.com".to_string()
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie-signing secret. Generated per process when unset, which means
    /// sessions do not survive a restart without a persistent value.
    pub secret: String,
    /// Session time-to-live in days (fixed, not extended on activity)
    #[serde(default = "default_ttl_days")]
    pub ttl_days: i64,
}

fn default_ttl_days() -> i64 {
    7
}

/// Dashboard document configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Path to the generated dashboard HTML (rewritten out-of-band by the
    /// refresh script)
    #[serde(default = "default_dashboard_file")]
    pub file: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            file: default_dashboard_file(),
        }
    }
}

fn default_dashboard_file() -> String {
    "powerplugs_dashboard.html".to_string()
}

impl Config {
    /// Build the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when `GOOGLE_CLIENT_ID` or `GOOGLE_CLIENT_SECRET` is unset or
    /// empty, or when a numeric override does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        let client_id = require_env("GOOGLE_CLIENT_ID")?;
        let client_secret = require_env("GOOGLE_CLIENT_SECRET")?;

        let mut server = ServerConfig::default();
        if let Ok(host) = std::env::var("DASHGATE_HOST") {
            server.host = host;
        }
        if let Ok(port) = std::env::var("DASHGATE_PORT") {
            server.port = port
                .parse()
                .map_err(|_| anyhow::anyhow!("DASHGATE_PORT is not a valid port: {}", port))?;
        }

        let google = GoogleConfig {
            client_id,
            client_secret,
            callback_url: std::env::var("GOOGLE_CALLBACK_URL")
                .unwrap_or_else(|_| default_callback_url()),
            allowed_domain: std::env::var("ALLOWED_EMAIL_DOMAIN")
                .unwrap_or_else(|_| default_allowed_domain()),
        };

        let secret = match std::env::var("SESSION_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                tracing::warn!(
                    "SESSION_SECRET not set; generating a per-process secret \
                     (sessions will not survive a restart)"
                );
                Uuid::new_v4().to_string()
            }
        };
        let mut session = SessionConfig {
            secret,
            ttl_days: default_ttl_days(),
        };
        if let Ok(days) = std::env::var("SESSION_TTL_DAYS") {
            session.ttl_days = days
                .parse()
                .map_err(|_| anyhow::anyhow!("SESSION_TTL_DAYS is not a number: {}", days))?;
        }

        let mut dashboard = DashboardConfig::default();
        if let Ok(file) = std::env::var("DASHBOARD_FILE") {
            dashboard.file = file;
        }

        Ok(Self {
            server,
            google,
            session,
            dashboard,
        })
    }
}

/// Read a required environment variable, rejecting empty values.
fn require_env(name: &str) -> anyhow::Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => anyhow::bail!("{} must be set", name),
    }
}
