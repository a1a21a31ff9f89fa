//! Persistence for the desired-configuration record.
//!
//! The file is a flat `KEY=value` list:
//!
//! ```text
//! MAX_CLIENTS=200
//! BANDWIDTH=5
//! ```
//!
//! `CPUS` and `MEMORY` are written only when a limit is set. Writes go to a
//! temp file in the same directory and are committed with a rename while an
//! exclusive advisory lock is held, so a failed write never damages the
//! previous file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{ConduitError, ConduitResult};
use crate::models::settings::{
    format_memory, parse_bandwidth, parse_cpus, parse_max_clients, parse_memory,
};
use crate::models::SettingsRecord;

pub const KEY_MAX_CLIENTS: &str = "MAX_CLIENTS";
pub const KEY_BANDWIDTH: &str = "BANDWIDTH";
pub const KEY_CPUS: &str = "CPUS";
pub const KEY_MEMORY: &str = "MEMORY";

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the record, substituting defaults for absent or invalid keys.
    ///
    /// A missing file yields the defaults. Only an unreadable existing file
    /// is an error.
    pub fn load(&self) -> ConduitResult<SettingsRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file, using defaults");
                return Ok(SettingsRecord::default());
            }
            Err(e) => return Err(ConduitError::Io(e)),
        };
        Ok(parse_settings(&content))
    }

    /// Replace the settings file wholesale with `record`.
    pub fn save(&self, record: &SettingsRecord) -> ConduitResult<()> {
        self.write_atomically(&render_settings(record))
            .map_err(|source| ConduitError::PersistenceFailure {
                path: self.path.display().to_string(),
                source,
            })?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    /// Delete the settings file; absence is not an error.
    pub fn remove(&self) -> ConduitResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ConduitError::Io(e)),
        }
        match fs::remove_file(self.lock_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConduitError::Io(e)),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn write_atomically(&self, content: &str) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;
        lock_file.lock_exclusive()?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        lock_file.unlock()?;
        Ok(())
    }
}

/// Parse settings text. Unknown keys, comments and blank lines are ignored.
pub fn parse_settings(content: &str) -> SettingsRecord {
    let mut record = SettingsRecord::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().trim_start_matches("export ").trim();
        let value = unquote(value.trim());

        let outcome = match key {
            KEY_MAX_CLIENTS => parse_max_clients(value).map(|v| record.max_clients = v),
            KEY_BANDWIDTH => parse_bandwidth(value).map(|v| record.bandwidth = v),
            KEY_CPUS => parse_cpus(value).map(|v| record.cpu_limit = v),
            KEY_MEMORY => parse_memory(value).map(|v| record.memory_limit = v),
            _ => Ok(()),
        };
        if let Err(e) = outcome {
            warn!("ignoring stored setting, using default: {e}");
        }
    }

    record
}

pub fn render_settings(record: &SettingsRecord) -> String {
    let mut out = format!(
        "{KEY_MAX_CLIENTS}={}\n{KEY_BANDWIDTH}={}\n",
        record.max_clients,
        record.bandwidth.as_flag()
    );
    if let Some(cpus) = record.cpu_limit {
        out.push_str(&format!("{KEY_CPUS}={cpus}\n"));
    }
    if let Some(memory) = record.memory_limit {
        out.push_str(&format!("{KEY_MEMORY}={}\n", format_memory(memory)));
    }
    out
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
