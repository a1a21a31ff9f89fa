//! Docker CLI failure classification through the public engine API.

use conduit::engine::{ContainerEngine, DockerEngine};
use conduit::error::ConduitError;
use conduit::process::CommandOutput;

use super::helpers::CannedRunner;

const DAEMON_DOWN: &str = "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. \
                           Is the docker daemon running?";

#[test]
fn unreachable_daemon_is_engine_unavailable() {
    let engine = DockerEngine::new(
        CannedRunner::default().answer("docker info", CommandOutput::failed(1, DAEMON_DOWN)),
    );
    match engine.ensure_available() {
        Err(ConduitError::EngineUnavailable { remediation, .. }) => {
            assert!(remediation.contains("Start the Docker daemon"));
        }
        other => panic!("expected EngineUnavailable, got {other:?}"),
    }
}

#[test]
fn missing_docker_binary_is_engine_unavailable() {
    let engine = DockerEngine::new(CannedRunner::default().missing("docker"));
    let err = engine.ensure_available().unwrap_err();
    assert!(matches!(err, ConduitError::EngineUnavailable { .. }));
    assert!(err.to_string().contains("Install Docker"));
}

#[test]
fn daemon_down_during_start_is_engine_unavailable() {
    let engine = DockerEngine::new(
        CannedRunner::default().answer("docker start", CommandOutput::failed(1, DAEMON_DOWN)),
    );
    assert!(matches!(
        engine.start("conduit"),
        Err(ConduitError::EngineUnavailable { .. })
    ));
}

#[test]
fn operation_failure_keeps_stderr_tail() {
    let stderr = (1..=15)
        .map(|i| format!("line {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    let engine = DockerEngine::new(
        CannedRunner::default().answer("docker create", CommandOutput::failed(125, &stderr)),
    );
    let spec = conduit::controller::WorkloadSpec::default()
        .create_spec(&conduit::models::SettingsRecord::default());

    match engine.create(&spec) {
        Err(ConduitError::EngineOperationFailed { diagnostics, .. }) => {
            assert!(diagnostics.contains("line 15"));
            assert!(diagnostics.contains("line 6"));
            assert!(!diagnostics.contains("line 5\n"));
        }
        other => panic!("expected EngineOperationFailed, got {other:?}"),
    }
}

#[test]
fn missing_container_inspects_as_absent() {
    let missing = CommandOutput::failed(1, "Error: No such container: conduit");
    let engine = DockerEngine::new(
        CannedRunner::default()
            .answer("docker inspect", missing.clone())
            .answer("docker rm", missing),
    );
    assert_eq!(engine.inspect_status("conduit").unwrap(), None);
    assert!(!engine.remove("conduit").unwrap());
}
