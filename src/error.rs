//! Error taxonomy shared by the core modules.
//!
//! Commands wrap these in `anyhow` at the boundary; inside the crate every
//! wrapper around an external call returns one of these variants so callers
//! can decide deliberately whether to recover or propagate.

use thiserror::Error;

/// Result alias used across the core modules.
pub type ConduitResult<T> = Result<T, ConduitError>;

/// Number of trailing stderr lines kept when an external tool fails.
pub const DIAGNOSTIC_TAIL_LINES: usize = 10;

#[derive(Debug, Error)]
pub enum ConduitError {
    /// A settings value was out of range or not a number.
    #[error("invalid {field} value '{value}': {reason}")]
    ConfigInvalid {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// The container engine binary is missing or its daemon is unreachable.
    #[error("container engine unavailable: {reason}\n{remediation}")]
    EngineUnavailable { reason: String, remediation: String },

    /// An engine call failed, or the readiness poll ran out of attempts.
    #[error("{operation} failed: {diagnostics}")]
    EngineOperationFailed {
        operation: String,
        diagnostics: String,
    },

    /// The operation needs an existing instance but there is none.
    #[error("{what} does not exist. {hint}")]
    NotFound { what: String, hint: String },

    /// The settings file could not be written; the previous file is intact.
    #[error("failed to persist settings to {path}: {source}")]
    PersistenceFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// An init-system tool (systemctl, rc-update, ...) reported failure.
    #[error("service command '{command}' failed: {diagnostics}")]
    ServiceCommandFailed {
        command: String,
        diagnostics: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConduitError {
    pub fn engine_failed(operation: impl Into<String>, stderr: &str) -> Self {
        ConduitError::EngineOperationFailed {
            operation: operation.into(),
            diagnostics: stderr_tail(stderr),
        }
    }

    pub fn not_found(what: impl Into<String>, hint: impl Into<String>) -> Self {
        ConduitError::NotFound {
            what: what.into(),
            hint: hint.into(),
        }
    }

    /// Errors that are absorbed and reported as warnings rather than failing
    /// the surrounding command.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConduitError::ConfigInvalid { .. } | ConduitError::NotFound { .. }
        )
    }
}

/// Keep the last few non-empty lines of a tool's diagnostic output.
pub fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        return "no diagnostic output".to_string();
    }
    let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    lines[start..].join("\n")
}
