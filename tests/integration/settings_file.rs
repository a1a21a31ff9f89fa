//! Settings file compatibility.

use std::fs;

use conduit::fs::SettingsStore;
use conduit::models::{Bandwidth, SettingsRecord};
use tempfile::TempDir;

#[test]
fn optional_limits_survive_save_and_load() {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.conf"));
    let record = SettingsRecord {
        max_clients: 750,
        bandwidth: Bandwidth::Limited(12.5),
        cpu_limit: Some(2.0),
        memory_limit: Some(1024 * 1024 * 1024),
    };

    store.save(&record).unwrap();
    assert_eq!(store.load().unwrap(), record);

    let text = fs::read_to_string(store.path()).unwrap();
    assert!(text.contains("MAX_CLIENTS=750\n"));
    assert!(text.contains("BANDWIDTH=12.5\n"));
}

#[test]
fn hand_edited_file_with_garbage_loads_defaults_per_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.conf");
    fs::write(
        &path,
        "# edited by hand\nMAX_CLIENTS=\"350\"\nBANDWIDTH=fast\nCPUS=-3\n\nMEMORY=1g\n",
    )
    .unwrap();

    let loaded = SettingsStore::new(&path).load().unwrap();
    assert_eq!(loaded.max_clients, 350);
    assert_eq!(loaded.bandwidth, Bandwidth::Limited(5.0));
    assert_eq!(loaded.cpu_limit, None);
    assert_eq!(loaded.memory_limit, Some(1024 * 1024 * 1024));
}

#[test]
fn unlimited_bandwidth_is_stored_as_sentinel() {
    let dir = TempDir::new().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.conf"));
    store
        .save(&SettingsRecord {
            bandwidth: Bandwidth::Unlimited,
            ..SettingsRecord::default()
        })
        .unwrap();

    assert!(fs::read_to_string(store.path())
        .unwrap()
        .contains("BANDWIDTH=-1\n"));
    assert_eq!(store.load().unwrap().bandwidth, Bandwidth::Unlimited);
}
