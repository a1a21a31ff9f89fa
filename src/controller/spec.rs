//! Static description of the workload and how to create it.

use std::time::Duration;

use crate::config::ManagerConfig;
use crate::engine::{CreateSpec, Mount};
use crate::models::SettingsRecord;

pub const NETWORK_MODE: &str = "host";
pub const RESTART_POLICY: &str = "unless-stopped";

/// Flag asking the workload for verbose output; `[STATS]` lines are only
/// printed at this level.
pub const VERBOSITY_FLAG: &str = "-v";

/// Fixed-interval, fixed-budget readiness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            attempts: 30,
        }
    }
}

/// Identity and creation parameters of the supervised instance.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSpec {
    pub name: String,
    pub image: String,
    pub volume: String,
    pub data_mount: String,
    pub log_max_size: String,
    pub log_max_files: u32,
    pub pull_timeout: Duration,
    pub readiness: ReadinessPolicy,
}

impl WorkloadSpec {
    pub fn from_config(config: &ManagerConfig) -> Self {
        Self {
            name: config.container_name.clone(),
            image: config.image.clone(),
            volume: config.volume_name.clone(),
            data_mount: config.data_mount.clone(),
            log_max_size: config.log_max_size.clone(),
            log_max_files: config.log_max_files,
            pull_timeout: config.pull_timeout(),
            readiness: ReadinessPolicy {
                interval: config.readiness_interval(),
                attempts: config.readiness_attempts,
            },
        }
    }

    /// Arguments for the workload binary.
    pub fn workload_command(settings: &SettingsRecord) -> Vec<String> {
        vec![
            "start".to_string(),
            "--max-clients".to_string(),
            settings.max_clients.to_string(),
            "--bandwidth".to_string(),
            settings.bandwidth.as_flag(),
            VERBOSITY_FLAG.to_string(),
        ]
    }

    pub fn create_spec(&self, settings: &SettingsRecord) -> CreateSpec {
        CreateSpec {
            name: self.name.clone(),
            image: self.image.clone(),
            mounts: vec![Mount {
                source: self.volume.clone(),
                target: self.data_mount.clone(),
            }],
            network: NETWORK_MODE.to_string(),
            restart_policy: RESTART_POLICY.to_string(),
            cpus: settings.cpu_limit,
            memory: settings.memory_limit,
            log_options: vec![
                ("max-size".to_string(), self.log_max_size.clone()),
                ("max-file".to_string(), self.log_max_files.to_string()),
            ],
            command: Self::workload_command(settings),
        }
    }
}

impl Default for WorkloadSpec {
    fn default() -> Self {
        Self::from_config(&ManagerConfig::default())
    }
}
