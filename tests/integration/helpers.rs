//! Test doubles shared by the integration tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::time::Duration;

use conduit::controller::{ReadinessPolicy, WorkloadController, WorkloadSpec};
use conduit::dashboard::CancelToken;
use conduit::engine::{ContainerEngine, CreateSpec};
use conduit::error::{ConduitError, ConduitResult};
use conduit::models::ResourceUsage;
use conduit::process::{CommandOutput, ProcessRunner, RunOptions};

/// Engine double holding one container and one volume.
#[derive(Default)]
pub struct ScriptedEngine {
    pub status: RefCell<Option<String>>,
    pub volume_data: RefCell<Option<Vec<u8>>>,
    pub logs: RefCell<Vec<String>>,
    pub calls: RefCell<Vec<String>>,
    pub status_after_start: RefCell<Option<String>>,
    pub fail_pull: Cell<bool>,
    /// Cancelled from inside `stats`, i.e. in the middle of building a frame.
    pub cancel_during_stats: RefCell<Option<CancelToken>>,
}

impl ScriptedEngine {
    pub fn running() -> Self {
        let engine = Self::default();
        *engine.status.borrow_mut() = Some("running".to_string());
        *engine.volume_data.borrow_mut() = Some(b"node-identity-key".to_vec());
        engine
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: &str) {
        self.calls.borrow_mut().push(call.to_string());
    }
}

impl ContainerEngine for ScriptedEngine {
    fn ensure_available(&self) -> ConduitResult<()> {
        Ok(())
    }

    fn create(&self, _spec: &CreateSpec) -> ConduitResult<String> {
        self.record("create");
        *self.status.borrow_mut() = Some("created".to_string());
        self.volume_data
            .borrow_mut()
            .get_or_insert_with(|| b"fresh".to_vec());
        Ok("c0ffee".to_string())
    }

    fn start(&self, _name: &str) -> ConduitResult<()> {
        self.record("start");
        let next = self
            .status_after_start
            .borrow()
            .clone()
            .unwrap_or_else(|| "running".to_string());
        *self.status.borrow_mut() = Some(next);
        Ok(())
    }

    fn stop(&self, _name: &str) -> ConduitResult<()> {
        self.record("stop");
        *self.status.borrow_mut() = Some("exited".to_string());
        Ok(())
    }

    fn restart(&self, name: &str) -> ConduitResult<()> {
        self.record("restart");
        self.start(name)
    }

    fn remove(&self, _name: &str) -> ConduitResult<bool> {
        self.record("remove");
        Ok(self.status.borrow_mut().take().is_some())
    }

    fn inspect_status(&self, _name: &str) -> ConduitResult<Option<String>> {
        Ok(self.status.borrow().clone())
    }

    fn stats(&self, _name: &str) -> ConduitResult<ResourceUsage> {
        if let Some(token) = self.cancel_during_stats.borrow().as_ref() {
            token.cancel();
        }
        Ok(ResourceUsage::Available {
            cpu_percent: "0.50%".to_string(),
            memory: "18MiB / 2GiB".to_string(),
        })
    }

    fn logs(&self, _name: &str, tail: usize) -> ConduitResult<Vec<String>> {
        let logs = self.logs.borrow();
        let start = logs.len().saturating_sub(tail);
        Ok(logs[start..].to_vec())
    }

    fn follow_logs(&self, _name: &str, _tail: usize) -> ConduitResult<()> {
        Ok(())
    }

    fn pull(&self, _image: &str, _timeout: Duration) -> ConduitResult<()> {
        self.record("pull");
        if self.fail_pull.get() {
            return Err(ConduitError::engine_failed("docker pull", "pull access denied"));
        }
        Ok(())
    }

    fn volume_exists(&self, _name: &str) -> ConduitResult<bool> {
        Ok(self.volume_data.borrow().is_some())
    }

    fn remove_volume(&self, _name: &str) -> ConduitResult<()> {
        self.record("remove_volume");
        self.volume_data.borrow_mut().take();
        Ok(())
    }
}

pub fn fast_spec(attempts: u32) -> WorkloadSpec {
    WorkloadSpec {
        readiness: ReadinessPolicy {
            interval: Duration::ZERO,
            attempts,
        },
        ..WorkloadSpec::default()
    }
}

pub fn controller(engine: ScriptedEngine) -> WorkloadController<ScriptedEngine> {
    WorkloadController::new(engine, fast_spec(5))
}

/// Process runner answering by program name and first argument.
#[derive(Default)]
pub struct CannedRunner {
    pub answers: HashMap<String, CommandOutput>,
    pub missing: Vec<String>,
}

impl CannedRunner {
    pub fn answer(mut self, key: &str, output: CommandOutput) -> Self {
        self.answers.insert(key.to_string(), output);
        self
    }

    pub fn missing(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }
}

impl ProcessRunner for CannedRunner {
    fn run(&self, program: &str, args: &[String], _options: RunOptions) -> io::Result<CommandOutput> {
        if self.missing.iter().any(|m| m == program) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not found"));
        }
        let key = match args.first() {
            Some(first) => format!("{program} {first}"),
            None => program.to_string(),
        };
        Ok(self
            .answers
            .get(&key)
            .cloned()
            .unwrap_or_else(|| CommandOutput::ok("")))
    }

    fn run_attached(&self, program: &str, _args: &[String]) -> io::Result<i32> {
        if self.missing.iter().any(|m| m == program) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "not found"));
        }
        Ok(0)
    }

    fn is_available(&self, program: &str) -> bool {
        !self.missing.iter().any(|m| m == program)
    }
}
