//! Static manager configuration.
//!
//! Read once per invocation from `$CONDUIT_HOME/manager.toml`. Every field
//! has a default, so a missing file simply yields [`ManagerConfig::default`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const HOME_ENV: &str = "CONDUIT_HOME";
pub const DEFAULT_HOME: &str = "/opt/conduit";
pub const CONFIG_FILE_NAME: &str = "manager.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// Name of the container instance.
    pub container_name: String,
    /// Named volume holding the node identity; survives recreation.
    pub volume_name: String,
    pub image: String,
    /// Where the volume is mounted inside the container.
    pub data_mount: String,
    /// Settings file name, relative to the manager home.
    pub settings_file: String,
    pub readiness_interval_secs: u64,
    pub readiness_attempts: u32,
    pub pull_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    /// Log lines scanned per dashboard refresh.
    pub log_tail: usize,
    pub log_max_size: String,
    pub log_max_files: u32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            container_name: "conduit".to_string(),
            volume_name: "conduit-data".to_string(),
            image: "ghcr.io/ssmirr/conduit/conduit:latest".to_string(),
            data_mount: "/home/conduit/data".to_string(),
            settings_file: "settings.conf".to_string(),
            readiness_interval_secs: 1,
            readiness_attempts: 30,
            pull_timeout_secs: 300,
            refresh_interval_secs: 10,
            log_tail: 200,
            log_max_size: "15m".to_string(),
            log_max_files: 3,
        }
    }
}

impl ManagerConfig {
    /// Load `manager.toml` from `home`, falling back to defaults when absent.
    pub fn load(home: &Path) -> Result<Self> {
        let path = home.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.container_name.trim().is_empty() {
            anyhow::bail!("container_name must not be empty");
        }
        if self.volume_name.trim().is_empty() {
            anyhow::bail!("volume_name must not be empty");
        }
        if self.readiness_attempts == 0 {
            anyhow::bail!("readiness_attempts must be at least 1");
        }
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be at least 1");
        }
        Ok(())
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_secs(self.readiness_interval_secs)
    }

    pub fn pull_timeout(&self) -> Duration {
        Duration::from_secs(self.pull_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Manager home directory: `$CONDUIT_HOME` or `/opt/conduit`.
pub fn resolve_home() -> PathBuf {
    std::env::var_os(HOME_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME))
}
