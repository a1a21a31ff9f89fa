//! Host auto-start registration across init systems.
//!
//! The init system is probed once ([`detect`]) and stored in the
//! [`ServiceManager`]; every operation dispatches with a single `match` on
//! that variant.

pub mod templates;

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{stderr_tail, ConduitError, ConduitResult};
use crate::process::{display_command, ProcessRunner, RunOptions};

pub const SERVICE_NAME: &str = "conduit";

const SYSTEMD_UNIT_PATH: &str = "etc/systemd/system/conduit.service";
const INIT_SCRIPT_PATH: &str = "etc/init.d/conduit";
const OPENRC_RUNLEVEL_LINK: &str = "etc/runlevels/default/conduit";
const SYSV_RC_DIRS: &[&str] = &["etc/rc2.d", "etc/rc3.d", "etc/rc5.d"];

/// Host auto-start mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitKind {
    Systemd,
    OpenRc,
    SysVinit,
    None,
}

impl fmt::Display for InitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitKind::Systemd => write!(f, "systemd"),
            InitKind::OpenRc => write!(f, "OpenRC"),
            InitKind::SysVinit => write!(f, "SysVinit"),
            InitKind::None => write!(f, "none"),
        }
    }
}

/// Probe the host for a known init system.
///
/// `root` is the filesystem root (`/` in production).
pub fn detect<R: ProcessRunner>(root: &Path, runner: &R) -> InitKind {
    let kind = if root.join("run/systemd/system").is_dir() && runner.is_available("systemctl") {
        InitKind::Systemd
    } else if runner.is_available("openrc-run") || runner.is_available("rc-update") {
        InitKind::OpenRc
    } else if root.join("etc/init.d").is_dir() {
        InitKind::SysVinit
    } else {
        InitKind::None
    };
    debug!(%kind, "detected init system");
    kind
}

/// Start/stop command lines embedded in the registration artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCommands {
    pub start: String,
    pub stop: String,
}

impl UnitCommands {
    /// `docker start|stop <container>`, shell-quoted for the init script.
    pub fn docker(docker: &Path, container: &str) -> Self {
        let docker = shell_escape::escape(docker.to_string_lossy());
        let name = shell_escape::escape(Cow::from(container));
        Self {
            start: format!("{docker} start {name}"),
            stop: format!("{docker} stop {name}"),
        }
    }
}

/// Registration artifact for one init system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceUnit {
    Systemd { content: String },
    OpenRc { content: String },
    SysVinit { content: String },
    None,
}

impl ServiceUnit {
    pub fn for_kind(kind: InitKind, commands: &UnitCommands) -> Self {
        match kind {
            InitKind::Systemd => ServiceUnit::Systemd {
                content: templates::systemd_unit(&commands.start, &commands.stop),
            },
            InitKind::OpenRc => ServiceUnit::OpenRc {
                content: templates::openrc_script(&commands.start, &commands.stop),
            },
            InitKind::SysVinit => ServiceUnit::SysVinit {
                content: templates::sysvinit_script(&commands.start, &commands.stop),
            },
            InitKind::None => ServiceUnit::None,
        }
    }

    pub fn kind(&self) -> InitKind {
        match self {
            ServiceUnit::Systemd { .. } => InitKind::Systemd,
            ServiceUnit::OpenRc { .. } => InitKind::OpenRc,
            ServiceUnit::SysVinit { .. } => InitKind::SysVinit,
            ServiceUnit::None => InitKind::None,
        }
    }
}

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Artifact written and registration enabled.
    Installed,
    /// Already registered with identical content; nothing was done.
    Unchanged,
    /// No init system was found. The container's restart policy is the only
    /// auto-start mechanism.
    Skipped { reason: String },
}

pub struct ServiceManager<R: ProcessRunner> {
    kind: InitKind,
    root: PathBuf,
    runner: R,
}

impl<R: ProcessRunner> ServiceManager<R> {
    pub fn new(kind: InitKind, root: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            kind,
            root: root.into(),
            runner,
        }
    }

    /// Detect the init system under `root` and build a manager for it.
    pub fn detect(root: impl Into<PathBuf>, runner: R) -> Self {
        let root = root.into();
        let kind = detect(&root, &runner);
        Self::new(kind, root, runner)
    }

    pub fn kind(&self) -> InitKind {
        self.kind
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn unit(&self, commands: &UnitCommands) -> ServiceUnit {
        ServiceUnit::for_kind(self.kind, commands)
    }

    /// Register the workload for auto-start. Idempotent.
    pub fn install(&self, unit: &ServiceUnit) -> ConduitResult<InstallOutcome> {
        if unit.kind() != self.kind {
            warn!(
                expected = %self.kind,
                got = %unit.kind(),
                "service unit does not match detected init system"
            );
        }

        let outcome = match unit {
            ServiceUnit::Systemd { content } => self.install_systemd(content)?,
            ServiceUnit::OpenRc { content } => self.install_openrc(content)?,
            ServiceUnit::SysVinit { content } => self.install_sysvinit(content)?,
            ServiceUnit::None => {
                let reason = "no supported init system detected; relying on the container \
                              restart policy (unless-stopped) for auto-start"
                    .to_string();
                warn!("{reason}");
                InstallOutcome::Skipped { reason }
            }
        };
        info!(kind = %self.kind, ?outcome, "service registration");
        Ok(outcome)
    }

    /// Remove the registration. Succeeds when nothing is registered.
    pub fn remove(&self) -> ConduitResult<()> {
        match self.kind {
            InitKind::Systemd => self.remove_systemd(),
            InitKind::OpenRc => self.remove_openrc(),
            InitKind::SysVinit => self.remove_sysvinit(),
            InitKind::None => Ok(()),
        }
    }

    /// Whether a registration artifact is present.
    pub fn is_installed(&self) -> bool {
        match self.kind {
            InitKind::Systemd => self.root.join(SYSTEMD_UNIT_PATH).exists(),
            InitKind::OpenRc | InitKind::SysVinit => self.root.join(INIT_SCRIPT_PATH).exists(),
            InitKind::None => false,
        }
    }

    fn install_systemd(&self, content: &str) -> ConduitResult<InstallOutcome> {
        let changed = write_if_changed(&self.root.join(SYSTEMD_UNIT_PATH), content, 0o644)?;
        let unit = format!("{SERVICE_NAME}.service");
        let enabled = self.probe("systemctl", &["is-enabled", "--quiet", &unit]);

        if !changed && enabled {
            return Ok(InstallOutcome::Unchanged);
        }
        self.tool("systemctl", &["daemon-reload"])?;
        self.tool("systemctl", &["enable", &unit])?;
        Ok(InstallOutcome::Installed)
    }

    fn install_openrc(&self, content: &str) -> ConduitResult<InstallOutcome> {
        let changed = write_if_changed(&self.root.join(INIT_SCRIPT_PATH), content, 0o755)?;
        let registered = self.root.join(OPENRC_RUNLEVEL_LINK).exists();

        if !changed && registered {
            return Ok(InstallOutcome::Unchanged);
        }
        if !registered {
            self.tool("rc-update", &["add", SERVICE_NAME, "default"])?;
        }
        Ok(InstallOutcome::Installed)
    }

    fn install_sysvinit(&self, content: &str) -> ConduitResult<InstallOutcome> {
        let changed = write_if_changed(&self.root.join(INIT_SCRIPT_PATH), content, 0o755)?;
        let registered = self.sysv_links_present();

        if !changed && registered {
            return Ok(InstallOutcome::Unchanged);
        }
        if !registered {
            if self.runner.is_available("update-rc.d") {
                self.tool("update-rc.d", &[SERVICE_NAME, "defaults"])?;
            } else if self.runner.is_available("chkconfig") {
                self.tool("chkconfig", &["--add", SERVICE_NAME])?;
            } else {
                warn!("neither update-rc.d nor chkconfig found; init script written but not linked");
            }
        }
        Ok(InstallOutcome::Installed)
    }

    fn remove_systemd(&self) -> ConduitResult<()> {
        let path = self.root.join(SYSTEMD_UNIT_PATH);
        let unit = format!("{SERVICE_NAME}.service");
        if !path.exists() && !self.probe("systemctl", &["is-enabled", "--quiet", &unit]) {
            debug!("systemd unit not present");
            return Ok(());
        }
        self.tolerant_tool("systemctl", &["disable", &unit])?;
        remove_file_if_present(&path)?;
        self.tool("systemctl", &["daemon-reload"])?;
        Ok(())
    }

    fn remove_openrc(&self) -> ConduitResult<()> {
        let path = self.root.join(INIT_SCRIPT_PATH);
        let registered = self.root.join(OPENRC_RUNLEVEL_LINK).exists();
        if registered {
            self.tolerant_tool("rc-update", &["del", SERVICE_NAME, "default"])?;
        }
        remove_file_if_present(&path)
    }

    fn remove_sysvinit(&self) -> ConduitResult<()> {
        let path = self.root.join(INIT_SCRIPT_PATH);
        if self.sysv_links_present() {
            if self.runner.is_available("update-rc.d") {
                self.tolerant_tool("update-rc.d", &["-f", SERVICE_NAME, "remove"])?;
            } else if self.runner.is_available("chkconfig") {
                self.tolerant_tool("chkconfig", &["--del", SERVICE_NAME])?;
            }
        }
        remove_file_if_present(&path)
    }

    fn sysv_links_present(&self) -> bool {
        SYSV_RC_DIRS.iter().any(|dir| {
            fs::read_dir(self.root.join(dir))
                .map(|entries| {
                    entries.flatten().any(|entry| {
                        let name = entry.file_name();
                        let name = name.to_string_lossy();
                        name.starts_with('S') && name.ends_with(SERVICE_NAME)
                    })
                })
                .unwrap_or(false)
        })
    }

    /// Run an init-system tool; a non-zero exit is an error.
    fn tool(&self, program: &str, args: &[&str]) -> ConduitResult<()> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let output = self
            .runner
            .run(program, &args, RunOptions::default())
            .map_err(|e| ConduitError::ServiceCommandFailed {
                command: display_command(program, &args),
                diagnostics: e.to_string(),
            })?;
        if !output.success() {
            return Err(ConduitError::ServiceCommandFailed {
                command: display_command(program, &args),
                diagnostics: stderr_tail(&output.stderr),
            });
        }
        Ok(())
    }

    /// Like [`Self::tool`] but a report that the service is already gone
    /// counts as success.
    fn tolerant_tool(&self, program: &str, args: &[&str]) -> ConduitResult<()> {
        match self.tool(program, args) {
            Err(ConduitError::ServiceCommandFailed { diagnostics, .. })
                if is_already_absent(&diagnostics) =>
            {
                debug!(program, "service already unregistered");
                Ok(())
            }
            other => other,
        }
    }

    /// Run a query command and report whether it exited zero.
    fn probe(&self, program: &str, args: &[&str]) -> bool {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.runner
            .run(program, &args, RunOptions::default())
            .map(|output| output.success())
            .unwrap_or(false)
    }
}

fn is_already_absent(diagnostics: &str) -> bool {
    let lower = diagnostics.to_lowercase();
    ["does not exist", "not loaded", "not found", "no such file", "not in runlevel"]
        .iter()
        .any(|m| lower.contains(m))
}

/// Write `content` to `path` unless it already holds exactly that.
///
/// Returns true if the file was written.
fn write_if_changed(path: &Path, content: &str, mode: u32) -> ConduitResult<bool> {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing == content {
            return Ok(false);
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    debug!(path = %path.display(), "wrote service artifact");
    Ok(true)
}

fn remove_file_if_present(path: &Path) -> ConduitResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ConduitError::Io(e)),
    }
}
