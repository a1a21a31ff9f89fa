//! Shared setup and output helpers for the commands.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use colored::Colorize;

use crate::config::{resolve_home, ManagerConfig};
use crate::controller::{WorkloadController, WorkloadSpec};
use crate::engine::DockerEngine;
use crate::error::ConduitError;
use crate::fs::SettingsStore;
use crate::models::SettingsRecord;
use crate::process::SystemRunner;
use crate::service::{ServiceManager, UnitCommands};

/// Used in service artifacts when `docker` is not on PATH at install time.
pub const FALLBACK_DOCKER_PATH: &str = "/usr/bin/docker";

pub type Engine = DockerEngine<SystemRunner>;

/// Everything a command needs, built once per invocation.
pub struct Context {
    pub home: PathBuf,
    pub config: ManagerConfig,
    pub store: SettingsStore,
    pub controller: WorkloadController<Engine>,
}

impl Context {
    pub fn load() -> Result<Self> {
        let home = resolve_home();
        let config = ManagerConfig::load(&home)?;
        let store = SettingsStore::new(home.join(&config.settings_file));
        let controller = WorkloadController::new(
            DockerEngine::new(SystemRunner::new()),
            WorkloadSpec::from_config(&config),
        );
        Ok(Self {
            home,
            config,
            store,
            controller,
        })
    }

    pub fn settings(&self) -> Result<SettingsRecord> {
        self.store
            .load()
            .with_context(|| format!("Failed to read {}", self.store.path().display()))
    }

    /// Fail with the engine's remediation text when docker is unusable.
    pub fn ensure_engine(&self) -> Result<()> {
        self.controller.ensure_engine()?;
        Ok(())
    }

    /// Service registration for the host this process runs on.
    pub fn services(&self) -> ServiceManager<SystemRunner> {
        ServiceManager::detect("/", SystemRunner::new())
    }

    pub fn unit_commands(&self) -> UnitCommands {
        let docker = which::which("docker").unwrap_or_else(|_| PathBuf::from(FALLBACK_DOCKER_PATH));
        UnitCommands::docker(&docker, &self.config.container_name)
    }

    pub fn settings_path(&self) -> &Path {
        self.store.path()
    }
}

/// Refuse to continue unless running as root.
pub fn require_root(command: &str) -> Result<()> {
    if !nix::unistd::geteuid().is_root() {
        bail!("'{command}' changes the host and must run as root (try: sudo conduit {command})");
    }
    Ok(())
}

pub fn print_step(message: &str) {
    println!("{} {message}", "→".cyan().bold());
}

pub fn print_ok(message: &str) {
    println!("{} {message}", "✓".green().bold());
}

pub fn print_warn(message: &str) {
    println!("{} {message}", "⚠".yellow().bold());
}

pub fn print_fail(message: &str) {
    println!("{} {message}", "✗".red().bold());
}

/// Whether `err` should fail the command.
///
/// `ConfigInvalid` and `NotFound` are recoverable: they are reported as
/// warnings and do not change the exit status.
pub fn is_fatal(err: &anyhow::Error) -> bool {
    !matches!(err.downcast_ref::<ConduitError>(), Some(inner) if inner.is_recoverable())
}

/// Print a command error on stderr; returns [`is_fatal`] for it.
pub fn report_error(err: &anyhow::Error) -> bool {
    let fatal = is_fatal(err);
    if fatal {
        eprintln!("{} {err:#}", "✗".red().bold());
    } else {
        eprintln!("{} {err:#}", "⚠".yellow().bold());
    }
    fatal
}

/// Print each rejected settings value as a warning.
pub fn report_warnings(warnings: &[ConduitError]) {
    for warning in warnings {
        print_warn(&format!("{warning}; keeping the previous value"));
    }
}

pub fn print_settings(settings: &SettingsRecord) {
    println!("  Max clients:  {}", settings.max_clients);
    println!("  Bandwidth:    {}", settings.bandwidth);
    if let Some(cpus) = settings.cpu_limit {
        println!("  CPU limit:    {cpus} cores");
    }
    if let Some(memory) = settings.memory_limit {
        println!(
            "  Memory limit: {}",
            crate::models::settings::format_memory(memory)
        );
    }
}

pub fn stdin_is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Show `label [current]: ` and read one line. `None` when the operator just
/// pressed enter or stdin is closed.
pub fn prompt(label: &str, current: &str) -> Result<Option<String>> {
    print!("  {label} [{}]: ", current.dimmed());
    io::stdout().flush()?;
    read_answer(&mut io::stdin().lock())
}

fn read_answer<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line).context("Failed to read input")? == 0 {
        return Ok(None);
    }
    let answer = line.trim();
    if answer.is_empty() {
        Ok(None)
    } else {
        Ok(Some(answer.to_string()))
    }
}

/// Ask a yes/no question; anything but `y`/`yes` is no.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{} {question} [y/N]: ", "?".yellow().bold());
    io::stdout().flush()?;
    let answer = read_answer(&mut io::stdin().lock())?;
    Ok(is_yes(answer.as_deref()))
}

fn is_yes(answer: Option<&str>) -> bool {
    matches!(
        answer.map(|a| a.to_ascii_lowercase()).as_deref(),
        Some("y") | Some("yes")
    )
}
