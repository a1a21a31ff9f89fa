//! Classification of docker CLI failures from their stderr.

use crate::error::ConduitError;

/// What went wrong with an engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineFailure {
    /// The daemon cannot be reached or we lack permission to talk to it.
    DaemonUnreachable,
    /// The named container, image or volume does not exist.
    MissingObject,
    /// Anything else; the caller decides how fatal it is.
    Operation,
}

const UNREACHABLE_MARKERS: &[&str] = &[
    "cannot connect to the docker daemon",
    "is the docker daemon running",
    "error during connect",
    "failed to connect to the docker api",
];

const MISSING_MARKERS: &[&str] = &["no such container", "no such object", "no such volume"];

pub fn classify_failure(stderr: &str) -> EngineFailure {
    let lower = stderr.to_lowercase();

    if UNREACHABLE_MARKERS.iter().any(|m| lower.contains(m))
        || (lower.contains("permission denied") && lower.contains("docker.sock"))
    {
        return EngineFailure::DaemonUnreachable;
    }

    if is_missing_object(&lower) {
        return EngineFailure::MissingObject;
    }

    EngineFailure::Operation
}

pub fn is_missing_object(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    MISSING_MARKERS.iter().any(|m| lower.contains(m))
}

pub(crate) fn unreachable_error(stderr: &str) -> ConduitError {
    let remediation = if stderr.to_lowercase().contains("permission denied") {
        "Run as root or add your user to the 'docker' group."
    } else {
        "Start the Docker daemon (for example: systemctl start docker) and retry."
    };
    ConduitError::EngineUnavailable {
        reason: crate::error::stderr_tail(stderr),
        remediation: remediation.to_string(),
    }
}

pub(crate) fn missing_binary_error() -> ConduitError {
    ConduitError::EngineUnavailable {
        reason: "the 'docker' command was not found on PATH".to_string(),
        remediation: "Install Docker (https://docs.docker.com/engine/install/) and retry."
            .to_string(),
    }
}
