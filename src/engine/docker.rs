use std::io;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use super::classify::{classify_failure, missing_binary_error, unreachable_error, EngineFailure};
use super::{ContainerEngine, CreateSpec};
use crate::error::{ConduitError, ConduitResult};
use crate::models::settings::format_memory;
use crate::models::ResourceUsage;
use crate::process::{display_command, CommandOutput, ProcessRunner, RunOptions};

const DOCKER: &str = "docker";

/// Bound on the daemon reachability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerState {
    status: String,
}

/// Docker CLI implementation of [`ContainerEngine`].
pub struct DockerEngine<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> DockerEngine<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run a docker subcommand; only spawn failures are errors here.
    fn docker(&self, args: Vec<String>, options: RunOptions) -> ConduitResult<CommandOutput> {
        match self.runner.run(DOCKER, &args, options) {
            Ok(output) => Ok(output),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(missing_binary_error()),
            Err(e) => Err(ConduitError::Io(e)),
        }
    }

    /// Turn a non-zero exit into the right error kind.
    fn check(
        &self,
        operation: &str,
        args: &[String],
        output: CommandOutput,
    ) -> ConduitResult<CommandOutput> {
        if output.success() {
            return Ok(output);
        }
        if output.timed_out {
            return Err(ConduitError::EngineOperationFailed {
                operation: display_command(DOCKER, args),
                diagnostics: format!("{operation} did not finish within its time limit"),
            });
        }
        match classify_failure(&output.stderr) {
            EngineFailure::DaemonUnreachable => Err(unreachable_error(&output.stderr)),
            _ => Err(ConduitError::engine_failed(
                display_command(DOCKER, args),
                &output.stderr,
            )),
        }
    }

    fn run_checked(
        &self,
        operation: &str,
        args: Vec<String>,
        options: RunOptions,
    ) -> ConduitResult<CommandOutput> {
        let output = self.docker(args.clone(), options)?;
        self.check(operation, &args, output)
    }
}

/// Build the `docker create` argument list for `spec`.
pub fn create_args(spec: &CreateSpec) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        "--name".to_string(),
        spec.name.clone(),
        "--restart".to_string(),
        spec.restart_policy.clone(),
        "--network".to_string(),
        spec.network.clone(),
    ];
    for mount in &spec.mounts {
        args.push("-v".to_string());
        args.push(format!("{}:{}", mount.source, mount.target));
    }
    if let Some(cpus) = spec.cpus {
        args.push("--cpus".to_string());
        args.push(format!("{cpus}"));
    }
    if let Some(memory) = spec.memory {
        args.push("--memory".to_string());
        args.push(format_memory(memory));
    }
    for (key, value) in &spec.log_options {
        args.push("--log-opt".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl<R: ProcessRunner> ContainerEngine for DockerEngine<R> {
    fn ensure_available(&self) -> ConduitResult<()> {
        if !self.runner.is_available(DOCKER) {
            return Err(missing_binary_error());
        }
        let args = strings(&["info", "--format", "{{.ServerVersion}}"]);
        let output = self.docker(args.clone(), RunOptions::bounded(PROBE_TIMEOUT))?;
        if output.success() {
            debug!(server_version = output.stdout.trim(), "docker daemon reachable");
            return Ok(());
        }
        // Any failure of `docker info` means the daemon is not usable.
        Err(unreachable_error(if output.stderr.trim().is_empty() {
            "docker info failed"
        } else {
            &output.stderr
        }))
    }

    fn create(&self, spec: &CreateSpec) -> ConduitResult<String> {
        info!(name = %spec.name, image = %spec.image, "creating container");
        let output = self.run_checked("create", create_args(spec), RunOptions::default())?;
        Ok(output.stdout.trim().to_string())
    }

    fn start(&self, name: &str) -> ConduitResult<()> {
        info!(name, "starting container");
        self.run_checked("start", strings(&["start", name]), RunOptions::default())?;
        Ok(())
    }

    fn stop(&self, name: &str) -> ConduitResult<()> {
        info!(name, "stopping container");
        self.run_checked("stop", strings(&["stop", name]), RunOptions::default())?;
        Ok(())
    }

    fn restart(&self, name: &str) -> ConduitResult<()> {
        info!(name, "restarting container");
        self.run_checked("restart", strings(&["restart", name]), RunOptions::default())?;
        Ok(())
    }

    fn remove(&self, name: &str) -> ConduitResult<bool> {
        let args = strings(&["rm", "-f", name]);
        let output = self.docker(args.clone(), RunOptions::default())?;
        if !output.success() && classify_failure(&output.stderr) == EngineFailure::MissingObject {
            debug!(name, "nothing to remove");
            return Ok(false);
        }
        self.check("remove", &args, output)?;
        info!(name, "container removed");
        Ok(true)
    }

    fn inspect_status(&self, name: &str) -> ConduitResult<Option<String>> {
        let args = strings(&[
            "inspect",
            "--type",
            "container",
            "--format",
            "{{json .State}}",
            name,
        ]);
        let output = self.docker(args.clone(), RunOptions::bounded(PROBE_TIMEOUT))?;
        if !output.success() && classify_failure(&output.stderr) == EngineFailure::MissingObject {
            return Ok(None);
        }
        let output = self.check("inspect", &args, output)?;
        let state: ContainerState = serde_json::from_str(output.stdout.trim()).map_err(|e| {
            ConduitError::EngineOperationFailed {
                operation: display_command(DOCKER, &args),
                diagnostics: format!("unexpected inspect output: {e}"),
            }
        })?;
        Ok(Some(state.status))
    }

    fn stats(&self, name: &str) -> ConduitResult<ResourceUsage> {
        let args = strings(&[
            "stats",
            "--no-stream",
            "--format",
            "{{.CPUPerc}}|{{.MemUsage}}",
            name,
        ]);
        let output = self.docker(args.clone(), RunOptions::bounded(PROBE_TIMEOUT))?;
        if !output.success() {
            if classify_failure(&output.stderr) == EngineFailure::DaemonUnreachable {
                return Err(unreachable_error(&output.stderr));
            }
            return Ok(ResourceUsage::Unavailable);
        }
        Ok(output
            .stdout
            .lines()
            .next()
            .map(ResourceUsage::from_stats_line)
            .unwrap_or(ResourceUsage::Unavailable))
    }

    fn logs(&self, name: &str, tail: usize) -> ConduitResult<Vec<String>> {
        let args = vec![
            "logs".to_string(),
            "--tail".to_string(),
            tail.to_string(),
            name.to_string(),
        ];
        let options = RunOptions {
            timeout: Some(PROBE_TIMEOUT),
            ..RunOptions::merged()
        };
        let output = self.docker(args.clone(), options)?;
        if !output.success() {
            if classify_failure(&output.stdout) == EngineFailure::MissingObject {
                return Ok(Vec::new());
            }
            // Merged output means the diagnostics landed on stdout.
            let failed = CommandOutput {
                stderr: output.stdout.clone(),
                ..output
            };
            return self.check("logs", &args, failed).map(|_| Vec::new());
        }
        Ok(output.stdout.lines().map(str::to_string).collect())
    }

    fn follow_logs(&self, name: &str, tail: usize) -> ConduitResult<()> {
        let args = vec![
            "logs".to_string(),
            "-f".to_string(),
            "--tail".to_string(),
            tail.to_string(),
            name.to_string(),
        ];
        let code = match self.runner.run_attached(DOCKER, &args) {
            Ok(code) => code,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(missing_binary_error()),
            Err(e) => return Err(ConduitError::Io(e)),
        };
        // 130 is the shell convention for an interrupted stream.
        if code != 0 && code != 130 {
            return Err(ConduitError::EngineOperationFailed {
                operation: display_command(DOCKER, &args),
                diagnostics: format!("exited with status {code}"),
            });
        }
        Ok(())
    }

    fn pull(&self, image: &str, timeout: Duration) -> ConduitResult<()> {
        info!(image, timeout_secs = timeout.as_secs(), "pulling image");
        self.run_checked("pull", strings(&["pull", image]), RunOptions::bounded(timeout))?;
        Ok(())
    }

    fn volume_exists(&self, name: &str) -> ConduitResult<bool> {
        let args = strings(&["volume", "inspect", name]);
        let output = self.docker(args.clone(), RunOptions::default())?;
        if output.success() {
            return Ok(true);
        }
        if classify_failure(&output.stderr) == EngineFailure::MissingObject {
            return Ok(false);
        }
        self.check("volume inspect", &args, output)?;
        Ok(false)
    }

    fn remove_volume(&self, name: &str) -> ConduitResult<()> {
        let args = strings(&["volume", "rm", name]);
        let output = self.docker(args.clone(), RunOptions::default())?;
        if !output.success() && classify_failure(&output.stderr) == EngineFailure::MissingObject {
            return Ok(());
        }
        self.check("volume rm", &args, output)?;
        info!(name, "volume removed");
        Ok(())
    }
}
