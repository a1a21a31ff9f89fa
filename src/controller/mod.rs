//! Lifecycle controller for the single supervised workload.
//!
//! Reconciles the desired [`SettingsRecord`] against the instance the engine
//! actually has. Every engine call is blocking; the only retry anywhere is
//! the readiness poll, which runs on a fixed budget.

mod spec;

pub use spec::{ReadinessPolicy, WorkloadSpec, NETWORK_MODE, RESTART_POLICY, VERBOSITY_FLAG};

use std::thread;

use tracing::{debug, info, warn};

use crate::engine::ContainerEngine;
use crate::error::{stderr_tail, ConduitError, ConduitResult, DIAGNOSTIC_TAIL_LINES};
use crate::fs::SettingsStore;
use crate::models::{ResourceUsage, SettingsRecord, WorkloadState};

/// The only engine status that counts as ready.
const READY_STATUS: &str = "running";

/// What a recreate did beyond the mandatory remove/create/start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecreateReport {
    /// A previous instance existed and was removed.
    pub replaced: bool,
    /// Set when the best-effort image refresh failed.
    pub pull_warning: Option<String>,
}

/// Whether recreate refreshes the image and how hard it tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageRefresh {
    BestEffort,
    Skip,
}

pub struct WorkloadController<E: ContainerEngine> {
    engine: E,
    spec: WorkloadSpec,
    removed: bool,
}

impl<E: ContainerEngine> WorkloadController<E> {
    pub fn new(engine: E, spec: WorkloadSpec) -> Self {
        Self {
            engine,
            spec,
            removed: false,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn spec(&self) -> &WorkloadSpec {
        &self.spec
    }

    /// Fail fast with remediation text when docker is not usable.
    pub fn ensure_engine(&self) -> ConduitResult<()> {
        self.engine.ensure_available()
    }

    pub fn status(&self) -> ConduitResult<WorkloadState> {
        self.observe().map(|(state, _)| state)
    }

    /// Lifecycle state together with the raw engine status it came from.
    fn observe(&self) -> ConduitResult<(WorkloadState, Option<String>)> {
        if self.removed {
            return Ok((WorkloadState::Removed, None));
        }
        let status = self.engine.inspect_status(&self.spec.name)?;
        let state = match status.as_deref() {
            Some(s) => WorkloadState::from_engine_status(s),
            None => WorkloadState::Absent,
        };
        Ok((state, status))
    }

    /// Reject a move the lifecycle does not allow.
    fn transition(&self, from: WorkloadState, to: WorkloadState) -> ConduitResult<()> {
        if from.can_transition_to(to) {
            return Ok(());
        }
        let what = format!("workload '{}'", self.spec.name);
        match from {
            WorkloadState::Removed => Err(ConduitError::not_found(
                what,
                "It was uninstalled; run 'conduit install' to set it up again.",
            )),
            WorkloadState::Absent => Err(ConduitError::not_found(
                what,
                "Use 'conduit start' to create it.",
            )),
            _ => Err(ConduitError::EngineOperationFailed {
                operation: format!("moving {what} from {from} to {to}"),
                diagnostics: "transition not allowed".to_string(),
            }),
        }
    }

    /// CPU and memory figures, or `Unavailable` when the instance is not
    /// running or the engine cannot report.
    pub fn resource_usage(&self) -> ResourceUsage {
        match self.status() {
            Ok(WorkloadState::Running) => {}
            Ok(_) => return ResourceUsage::Unavailable,
            Err(e) => {
                debug!("status unavailable for resource usage: {e}");
                return ResourceUsage::Unavailable;
            }
        }
        match self.engine.stats(&self.spec.name) {
            Ok(usage) => usage,
            Err(e) => {
                debug!("engine stats unavailable: {e}");
                ResourceUsage::Unavailable
            }
        }
    }

    /// Bring the instance to `Running`, creating it when absent.
    ///
    /// Only an engine status of exactly `running` returns immediately. A
    /// `restarting` or `paused` instance goes through the readiness poll, so
    /// a crash loop is reported instead of passing as healthy.
    pub fn ensure_running(&self, settings: &SettingsRecord) -> ConduitResult<WorkloadState> {
        let (state, engine_status) = self.observe()?;
        match state {
            WorkloadState::Running if engine_status.as_deref() == Some(READY_STATUS) => {
                debug!(name = %self.spec.name, "already running");
                return Ok(WorkloadState::Running);
            }
            WorkloadState::Running => {
                debug!(name = %self.spec.name, status = ?engine_status, "waiting for engine to settle");
            }
            WorkloadState::Absent => {
                self.transition(state, WorkloadState::Created)?;
                self.engine.create(&self.spec.create_spec(settings))?;
                self.engine.start(&self.spec.name)?;
            }
            _ => {
                self.transition(state, WorkloadState::Running)?;
                self.engine.start(&self.spec.name)?;
            }
        }
        self.wait_ready()?;
        info!(name = %self.spec.name, "workload running");
        Ok(WorkloadState::Running)
    }

    /// Stop a running instance. Returns `false` when there was nothing to stop.
    pub fn stop(&self) -> ConduitResult<bool> {
        match self.status()? {
            WorkloadState::Running => {
                self.transition(WorkloadState::Running, WorkloadState::Stopped)?;
                self.engine.stop(&self.spec.name)?;
                info!(name = %self.spec.name, "workload stopped");
                Ok(true)
            }
            state => {
                debug!(name = %self.spec.name, %state, "stop is a no-op");
                Ok(false)
            }
        }
    }

    pub fn restart(&self) -> ConduitResult<()> {
        self.transition(self.status()?, WorkloadState::Running)?;
        self.engine.restart(&self.spec.name)?;
        self.wait_ready()?;
        info!(name = %self.spec.name, "workload restarted");
        Ok(())
    }

    /// Persist `settings`, then replace the instance so it runs with them.
    ///
    /// Nothing is touched when the save fails. After the save the sequence is
    /// exactly one remove, a best-effort pull, exactly one create, start and
    /// the readiness poll. A failure after the remove leaves the workload
    /// absent; it is not rolled back.
    pub fn apply_settings(
        &self,
        store: &SettingsStore,
        settings: &SettingsRecord,
    ) -> ConduitResult<RecreateReport> {
        self.ensure_not_removed()?;
        store.save(settings)?;
        self.recreate(settings, ImageRefresh::BestEffort)
    }

    /// Pull the configured image, then recreate with the current settings.
    ///
    /// Unlike [`apply_settings`](Self::apply_settings) a failed pull aborts
    /// before the running instance is removed.
    pub fn update(&self, settings: &SettingsRecord) -> ConduitResult<RecreateReport> {
        self.ensure_not_removed()?;
        self.refresh_image()?;
        self.recreate(settings, ImageRefresh::Skip)
    }

    /// Pull the configured image within the pull timeout.
    pub fn refresh_image(&self) -> ConduitResult<()> {
        self.engine.pull(&self.spec.image, self.spec.pull_timeout)
    }

    /// A recreate passes through `Absent`, which `Removed` never leaves.
    fn ensure_not_removed(&self) -> ConduitResult<()> {
        if self.removed {
            return self.transition(WorkloadState::Removed, WorkloadState::Absent);
        }
        Ok(())
    }

    fn recreate(
        &self,
        settings: &SettingsRecord,
        refresh: ImageRefresh,
    ) -> ConduitResult<RecreateReport> {
        let mut report = RecreateReport {
            replaced: self.engine.remove(&self.spec.name)?,
            pull_warning: None,
        };

        if refresh == ImageRefresh::BestEffort {
            if let Err(e) = self.refresh_image() {
                warn!(image = %self.spec.image, "image refresh failed, using local copy: {e}");
                report.pull_warning = Some(e.to_string());
            }
        }

        self.engine.create(&self.spec.create_spec(settings))?;
        self.engine.start(&self.spec.name)?;
        self.wait_ready()?;
        info!(
            name = %self.spec.name,
            max_clients = settings.max_clients,
            bandwidth = %settings.bandwidth,
            "workload recreated"
        );
        Ok(report)
    }

    /// Stop and remove the instance; drop the data volume only with `purge`.
    pub fn uninstall(&mut self, purge: bool) -> ConduitResult<()> {
        if self.removed {
            return Ok(());
        }
        let state = self.status()?;
        self.transition(state, WorkloadState::Removed)?;
        if state == WorkloadState::Running {
            self.engine.stop(&self.spec.name)?;
        }
        self.engine.remove(&self.spec.name)?;
        if purge {
            self.engine.remove_volume(&self.spec.volume)?;
        }
        self.removed = true;
        info!(name = %self.spec.name, purge, "workload uninstalled");
        Ok(())
    }

    pub fn data_volume_present(&self) -> ConduitResult<bool> {
        self.engine.volume_exists(&self.spec.volume)
    }

    /// The last `tail` log lines; empty when there is no instance.
    pub fn recent_logs(&self, tail: usize) -> ConduitResult<Vec<String>> {
        if !self.status()?.exists() {
            return Ok(Vec::new());
        }
        self.engine.logs(&self.spec.name, tail)
    }

    pub fn follow_logs(&self, tail: usize) -> ConduitResult<()> {
        if !self.status()?.exists() {
            return Err(ConduitError::not_found(
                format!("workload '{}'", self.spec.name),
                "Run 'conduit install' first.",
            ));
        }
        self.engine.follow_logs(&self.spec.name, tail)
    }

    /// Poll until the engine reports `running`, within the policy budget.
    fn wait_ready(&self) -> ConduitResult<()> {
        let policy = self.spec.readiness;
        let mut last = None;
        for attempt in 1..=policy.attempts {
            let status = self.engine.inspect_status(&self.spec.name)?;
            if status.as_deref() == Some(READY_STATUS) {
                debug!(attempt, "workload ready");
                return Ok(());
            }
            last = status;
            if attempt < policy.attempts {
                thread::sleep(policy.interval);
            }
        }

        let logs = self
            .engine
            .logs(&self.spec.name, DIAGNOSTIC_TAIL_LINES)
            .map(|lines| lines.join("\n"))
            .unwrap_or_default();
        Err(ConduitError::EngineOperationFailed {
            operation: format!("waiting for '{}' to run", self.spec.name),
            diagnostics: format!(
                "not running after {} attempts (last state: {})\n{}",
                policy.attempts,
                last.as_deref().unwrap_or("absent"),
                stderr_tail(&logs)
            ),
        })
    }
}
