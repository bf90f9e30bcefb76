use crate::models::account::Gender;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Rest,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
    #[serde(default = "default_lookup_retries")]
    pub lookup_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: i64,
    #[serde(default = "default_purge_interval_seconds")]
    pub purge_interval_seconds: u64,
}

/// Optional first administrator, created at startup if its username is free
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapConfig {
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub admin_gender: Option<Gender>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            purge_interval_seconds: default_purge_interval_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_lookup_timeout_ms() -> u64 {
    5000
}

fn default_lookup_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    100
}

fn default_ttl_seconds() -> i64 {
    28800 // 8 hours
}

fn default_purge_interval_seconds() -> u64 {
    300 // 5 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl BootstrapConfig {
    /// True when any bootstrap field is set
    pub fn is_configured(&self) -> bool {
        self.admin_username.is_some()
            || self.admin_password.is_some()
            || self.admin_name.is_some()
            || self.admin_email.is_some()
            || self.admin_gender.is_some()
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.backend.kind == BackendKind::Rest {
            if self.backend.url.is_empty() {
                bail!("backend.url must not be empty for the rest backend");
            }

            if !self.backend.url.starts_with("http://") && !self.backend.url.starts_with("https://") {
                bail!("backend.url must start with http:// or https://");
            }

            if self.backend.api_key.is_empty() {
                bail!("backend.api_key must not be empty for the rest backend");
            }
        }

        if self.backend.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than 0");
        }

        if self.backend.lookup_timeout_ms == 0 {
            bail!("lookup_timeout_ms must be greater than 0");
        }

        if self.session.ttl_seconds <= 0 {
            bail!("session ttl_seconds must be greater than 0");
        }

        if self.session.purge_interval_seconds == 0 {
            bail!("purge_interval_seconds must be greater than 0");
        }

        if self.bootstrap.is_configured() {
            let b = &self.bootstrap;
            let missing = [
                ("admin_username", &b.admin_username),
                ("admin_password", &b.admin_password),
                ("admin_name", &b.admin_name),
                ("admin_email", &b.admin_email),
            ]
            .into_iter()
            .find(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()));

            if let Some((field, _)) = missing {
                bail!("bootstrap.{} is required when any bootstrap field is set", field);
            }
            if b.admin_gender.is_none() {
                bail!("bootstrap.admin_gender is required when any bootstrap field is set");
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
