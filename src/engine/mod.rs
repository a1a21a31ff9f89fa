//! Typed boundary to the container engine.
//!
//! [`ContainerEngine`] is what the lifecycle controller talks to;
//! [`DockerEngine`] implements it by shelling out to the docker CLI through a
//! [`ProcessRunner`](crate::process::ProcessRunner).

mod classify;
mod docker;

pub use classify::{classify_failure, is_missing_object, EngineFailure};
pub use docker::DockerEngine;

use std::time::Duration;

use crate::error::ConduitResult;
use crate::models::ResourceUsage;

/// A named volume mounted into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub source: String,
    pub target: String,
}

/// Everything needed to create the workload container.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSpec {
    pub name: String,
    pub image: String,
    pub mounts: Vec<Mount>,
    pub network: String,
    pub restart_policy: String,
    pub cpus: Option<f64>,
    pub memory: Option<u64>,
    pub log_options: Vec<(String, String)>,
    /// Arguments passed to the image entrypoint.
    pub command: Vec<String>,
}

pub trait ContainerEngine {
    /// Fail with `EngineUnavailable` unless the CLI is installed and the
    /// daemon answers.
    fn ensure_available(&self) -> ConduitResult<()>;

    /// Create (but do not start) a container; returns its id.
    fn create(&self, spec: &CreateSpec) -> ConduitResult<String>;

    fn start(&self, name: &str) -> ConduitResult<()>;

    fn stop(&self, name: &str) -> ConduitResult<()>;

    fn restart(&self, name: &str) -> ConduitResult<()>;

    /// Force-remove the container. Returns `false` when it did not exist.
    fn remove(&self, name: &str) -> ConduitResult<bool>;

    /// Engine status string (`created`, `running`, `exited`, ...), or `None`
    /// when no such container exists.
    fn inspect_status(&self, name: &str) -> ConduitResult<Option<String>>;

    fn stats(&self, name: &str) -> ConduitResult<ResourceUsage>;

    /// The last `tail` lines of combined output, oldest first.
    fn logs(&self, name: &str, tail: usize) -> ConduitResult<Vec<String>>;

    /// Stream logs to the operator's terminal until the stream ends.
    fn follow_logs(&self, name: &str, tail: usize) -> ConduitResult<()>;

    /// Pull `image`, giving up after `timeout`.
    fn pull(&self, image: &str, timeout: Duration) -> ConduitResult<()>;

    fn volume_exists(&self, name: &str) -> ConduitResult<bool>;

    /// Remove a named volume; absence is not an error.
    fn remove_volume(&self, name: &str) -> ConduitResult<()>;
}
