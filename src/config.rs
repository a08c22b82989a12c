//! Configuration management for linode-ddns.

use crate::error::{DdnsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bundled configuration template, written out on first run.
const CONFIG_TEMPLATE: &str = include_str!("../config.template.toml");

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Check interval in seconds (default: 300 = 5 minutes).
    #[serde(default = "default_interval")]
    pub check_interval_secs: u64,

    /// Linode API credentials and record identifiers.
    #[serde(default)]
    pub linode: LinodeConfig,

    /// DNS record settings.
    #[serde(default)]
    pub dns: DnsConfig,
}

fn default_interval() -> u64 {
    300
}

/// Linode API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinodeConfig {
    /// Personal access token with Domains read/write scope.
    #[serde(default)]
    pub api_key: String,

    /// API version path segment (default: "v4").
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Id of the domain (zone) that owns the record.
    #[serde(default)]
    pub domain_id: String,

    /// Id of the record to keep updated.
    #[serde(default)]
    pub record_id: String,
}

fn default_api_version() -> String {
    "v4".to_string()
}

/// DNS record settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    /// Fully qualified name the record serves.
    #[serde(default = "default_fqdn")]
    pub fqdn: String,
}

fn default_fqdn() -> String {
    "unknown".to_string()
}

impl Default for LinodeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_version: default_api_version(),
            domain_id: String::new(),
            record_id: String::new(),
        }
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            fqdn: default_fqdn(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            check_interval_secs: default_interval(),
            linode: LinodeConfig::default(),
            dns: DnsConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DdnsError::Config("Could not find config directory".to_string()))?;

        Ok(config_dir.join("linode-ddns").join("config.toml"))
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration, seeding the file from the bundled template if
    /// it does not exist yet.
    pub fn load_or_seed(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, CONFIG_TEMPLATE)?;
            tracing::info!("Seeded new config file at {}", path.display());
        }

        Self::load_from(path)
    }

    /// The bundled configuration template.
    pub fn template() -> &'static str {
        CONFIG_TEMPLATE
    }

    /// Check that every value an update request needs is present.
    ///
    /// Missing credentials would otherwise surface as an endless stream of
    /// rejected updates, so the daemon refuses to start instead.
    pub fn validate(&self) -> Result<()> {
        if self.linode.api_key.is_empty() {
            return Err(DdnsError::Config(
                "linode.api_key is not set (edit the config file)".to_string(),
            ));
        }
        if self.linode.domain_id.is_empty() {
            return Err(DdnsError::Config(
                "linode.domain_id is not set (edit the config file)".to_string(),
            ));
        }
        if self.linode.record_id.is_empty() {
            return Err(DdnsError::Config(
                "linode.record_id is not set (edit the config file)".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`].
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}
