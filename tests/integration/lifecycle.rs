//! Controller behaviour against a scripted engine.

use conduit::error::ConduitError;
use conduit::fs::SettingsStore;
use conduit::models::{SettingsRecord, SettingsUpdate, WorkloadState};
use tempfile::TempDir;

use super::helpers::{controller, fast_spec, ScriptedEngine};
use conduit::controller::WorkloadController;

#[test]
fn apply_settings_round_trips_every_max_clients_value() {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.conf"));
    let ctl = controller(ScriptedEngine::running());

    for m in 1..=1000u32 {
        let (next, warnings) = SettingsUpdate {
            max_clients: Some(m.to_string()),
            ..SettingsUpdate::default()
        }
        .apply_to(&store.load().unwrap());
        assert!(warnings.is_empty());
        ctl.apply_settings(&store, &next).unwrap();
        assert_eq!(store.load().unwrap().max_clients, m);
    }
}

#[test]
fn invalid_max_clients_keeps_previous_value_with_warning() {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.conf"));
    let previous = SettingsRecord {
        max_clients: 321,
        ..SettingsRecord::default()
    };
    store.save(&previous).unwrap();

    for input in ["0", "1001", "-5", "lots", "", "12.5"] {
        let (next, warnings) = SettingsUpdate {
            max_clients: Some(input.to_string()),
            ..SettingsUpdate::default()
        }
        .apply_to(&store.load().unwrap());
        assert_eq!(next, previous, "input {input:?}");
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], ConduitError::ConfigInvalid { .. }));
    }
    assert_eq!(store.load().unwrap(), previous);
}

#[test]
fn apply_settings_issues_one_remove_and_one_create() {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.conf"));

    for engine in [ScriptedEngine::default(), ScriptedEngine::running()] {
        let ctl = controller(engine);
        ctl.apply_settings(&store, &SettingsRecord::default()).unwrap();
        assert_eq!(ctl.engine().count("remove"), 1);
        assert_eq!(ctl.engine().count("create"), 1);
    }
}

#[test]
fn apply_settings_never_touches_the_data_volume() {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.conf"));
    let ctl = controller(ScriptedEngine::running());
    let before = ctl.engine().volume_data.borrow().clone();

    ctl.apply_settings(
        &store,
        &SettingsRecord {
            max_clients: 10,
            ..SettingsRecord::default()
        },
    )
    .unwrap();

    assert_eq!(*ctl.engine().volume_data.borrow(), before);
    assert_eq!(ctl.engine().count("remove_volume"), 0);
}

#[test]
fn pull_failure_during_apply_does_not_prevent_creation() {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.conf"));
    let engine = ScriptedEngine::running();
    engine.fail_pull.set(true);
    let ctl = controller(engine);

    let report = ctl.apply_settings(&store, &SettingsRecord::default()).unwrap();
    assert!(report.pull_warning.is_some());
    assert_eq!(ctl.engine().count("create"), 1);
    assert_eq!(ctl.status().unwrap(), WorkloadState::Running);
}

#[test]
fn ensure_running_gives_up_within_the_poll_budget() {
    let engine = ScriptedEngine::default();
    *engine.status_after_start.borrow_mut() = Some("restarting-loop".to_string());
    let ctl = WorkloadController::new(engine, fast_spec(30));

    match ctl.ensure_running(&SettingsRecord::default()) {
        Err(ConduitError::EngineOperationFailed { diagnostics, .. }) => {
            assert!(diagnostics.contains("30 attempts"));
        }
        other => panic!("expected EngineOperationFailed, got {other:?}"),
    }
}

#[test]
fn ensure_running_reaches_running_from_absent() {
    let ctl = controller(ScriptedEngine::default());
    assert_eq!(
        ctl.ensure_running(&SettingsRecord::default()).unwrap(),
        WorkloadState::Running
    );
    assert_eq!(ctl.engine().count("create"), 1);
    assert_eq!(ctl.engine().count("start"), 1);
}

#[test]
fn uninstall_then_purge_lifecycle() {
    let mut ctl = controller(ScriptedEngine::running());
    assert!(ctl.stop().unwrap());
    assert_eq!(ctl.status().unwrap(), WorkloadState::Stopped);

    ctl.uninstall(true).unwrap();
    assert_eq!(ctl.status().unwrap(), WorkloadState::Removed);
    assert!(!ctl.data_volume_present().unwrap());
    assert!(ctl.restart().is_err());
}
