//! Configuration for grain-dash.
//!
//! Supports loading from TOML file with environment variable and CLI
//! overrides. The two service connection parameters (base URL and access
//! key) are the application's primary operating requirement: validation
//! fails fast when either is missing instead of letting every downstream
//! request fail.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use grain_common::StoreConfig;
use serde::Deserialize;

/// Environment variable overriding the service base URL.
pub const ENV_SERVICE_URL: &str = "GRAIN_SERVICE_URL";
/// Environment variable overriding the service access key.
pub const ENV_SERVICE_KEY: &str = "GRAIN_SERVICE_KEY";

/// Top-level configuration for grain-dash.
#[derive(Debug, Clone)]
pub struct DashConfig {
    /// HTTP listen port for the dashboard page.
    pub listen_port: u16,

    /// How many recent price entries to load and display.
    pub recent_limit: u32,

    /// Logging level.
    pub log_level: String,

    /// Data service connection parameters.
    pub store: StoreConfig,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            listen_port: 8080,
            recent_limit: 50,
            log_level: "info".to_string(),
            store: StoreConfig::default(),
        }
    }
}

impl DashConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlConfig = toml::from_str(content).context("Failed to parse TOML config")?;
        Ok(Self::from(file))
    }

    /// Apply environment variable overrides for the service connection.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_SERVICE_URL) {
            if !url.is_empty() {
                self.store.url = url;
            }
        }
        if let Ok(key) = std::env::var(ENV_SERVICE_KEY) {
            if !key.is_empty() {
                self.store.key = key;
            }
        }
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_cli_overrides(&mut self, service_url: Option<String>, port: Option<u16>) {
        if let Some(url) = service_url {
            self.store.url = url;
        }
        if let Some(port) = port {
            self.listen_port = port;
        }
    }

    /// Validate the configuration.
    ///
    /// Nothing downstream works without a reachable service URL and an
    /// access key, so both are hard requirements here.
    pub fn validate(&self) -> Result<()> {
        if self.store.url.is_empty() {
            bail!(
                "service URL is not configured (set [service] url or {})",
                ENV_SERVICE_URL
            );
        }
        if !self.store.url.starts_with("http://") && !self.store.url.starts_with("https://") {
            bail!("service URL must start with http:// or https://: {}", self.store.url);
        }
        if self.store.key.is_empty() {
            bail!(
                "service access key is not configured (set [service] key or {})",
                ENV_SERVICE_KEY
            );
        }
        if self.recent_limit == 0 {
            bail!("recent_limit must be at least 1");
        }
        Ok(())
    }
}

/// TOML file structure for deserialization.
#[derive(Debug, Deserialize)]
struct TomlConfig {
    #[serde(default)]
    service: ServiceToml,
    #[serde(default)]
    dashboard: DashboardToml,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ServiceToml {
    url: String,
    key: String,
    timeout_secs: u64,
}

impl Default for ServiceToml {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DashboardToml {
    listen_port: u16,
    recent_limit: u32,
    log_level: String,
}

impl Default for DashboardToml {
    fn default() -> Self {
        Self {
            listen_port: 8080,
            recent_limit: 50,
            log_level: "info".to_string(),
        }
    }
}

impl From<TomlConfig> for DashConfig {
    fn from(toml: TomlConfig) -> Self {
        Self {
            listen_port: toml.dashboard.listen_port,
            recent_limit: toml.dashboard.recent_limit,
            log_level: toml.dashboard.log_level,
            store: StoreConfig {
                url: toml.service.url,
                key: toml.service.key,
                timeout: Duration::from_secs(toml.service.timeout_secs),
            },
        }
    }
}
