use config::{Config, ConfigError, Environment, File};
use directories_next::ProjectDirs;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/common";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Delegated permissions requested for every submission.
pub const DEFAULT_SCOPES: [&str; 3] = [
    "User.Read",
    "OnlineMeetings.ReadWrite",
    "Calendars.ReadWrite",
];

// App registration and token cache settings for the Microsoft identity platform
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub client_id: String,
    // Only confidential registrations have one; kept out of Debug output
    #[serde(default)]
    pub client_secret: Option<SecretString>,
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub token_cache: Option<PathBuf>,
    #[serde(default = "default_identity_timeout")]
    pub timeout_secs: u64,
}

// Calendar API endpoint settings
#[derive(Debug, Deserialize, Clone)]
pub struct GraphConfig {
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,
    #[serde(default = "default_graph_timeout")]
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: default_graph_base_url(),
            timeout_secs: default_graph_timeout(),
        }
    }
}

// Top-level application configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

impl AppConfig {
    /// Loads configuration from files and environment variables.
    ///
    /// Reads configuration from:
    /// 1. `config.toml` in the working directory (optional)
    /// 2. Environment variables prefixed with `SCHEDULER_`
    ///    (e.g., `SCHEDULER_IDENTITY__CLIENT_ID`)
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            // `__` separates struct levels
            .add_source(
                Environment::with_prefix("SCHEDULER")
                    .prefix_separator("_")
                    .separator("__"),
            );

        builder.build()?.try_deserialize()
    }
}

impl IdentityConfig {
    /// OAuth authorize endpoint derived from the authority URL.
    pub fn auth_uri(&self) -> String {
        format!("{}/oauth2/v2.0/authorize", self.authority.trim_end_matches('/'))
    }

    /// OAuth token endpoint derived from the authority URL.
    pub fn token_uri(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority.trim_end_matches('/'))
    }

    pub fn client_secret(&self) -> &str {
        self.client_secret
            .as_ref()
            .map(|s| s.expose_secret())
            .unwrap_or_default()
    }

    /// Where cached tokens live; falls back to the platform data directory.
    pub fn token_cache_path(&self) -> PathBuf {
        if let Some(path) = &self.token_cache {
            return path.clone();
        }
        ProjectDirs::from("com", "teams-scheduler", "teams_scheduler")
            .map(|dirs| dirs.data_dir().join("tokencache.json"))
            .unwrap_or_else(|| PathBuf::from("tokencache.json"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GraphConfig {
    pub fn events_url(&self) -> String {
        format!("{}/me/events", self.base_url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

fn default_redirect_port() -> u16 {
    3000
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

fn default_identity_timeout() -> u64 {
    120
}

fn default_graph_base_url() -> String {
    DEFAULT_GRAPH_BASE_URL.to_string()
}

fn default_graph_timeout() -> u64 {
    30
}
