//! Integration tests for the file store: layout convention, provisioning
//! idempotence, and the tolerant-read policy.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use auftragsverwaltung::store::{CollectionKind, FileStore, ScopedFile};

fn store() -> (TempDir, FileStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = FileStore::new(dir.path().join("data"));
    (dir, store)
}

#[test]
fn missing_collection_reads_as_empty() {
    let (_dir, store) = store();
    assert!(store.read_collection(CollectionKind::Customers).is_empty());
    assert!(store.read_order_scoped("2025-0001", ScopedFile::Invoices).is_empty());
}

#[test]
fn corrupt_collection_reads_as_empty() {
    let (_dir, store) = store();
    fs::create_dir_all(store.data_root()).unwrap();
    fs::write(store.data_root().join("orders.json"), "{ not json []").unwrap();
    assert!(store.read_collection(CollectionKind::Orders).is_empty());
}

#[test]
fn write_collection_is_pretty_and_keeps_non_ascii() {
    let (_dir, store) = store();
    store
        .write_collection(
            CollectionKind::Customers,
            &[json!({ "id": "K1", "name": "Müller", "ort": "Köln" })],
        )
        .unwrap();

    let raw = fs::read_to_string(store.data_root().join("customers.json")).unwrap();
    assert!(raw.contains('\n'), "expected pretty-printed output");
    assert!(raw.contains("Müller"), "non-ASCII must stay literal: {raw}");
    assert!(!raw.contains("\\u"), "no unicode escapes expected: {raw}");
}

#[test]
fn provision_order_layout_creates_year_folder_and_scoped_files() {
    let (_dir, store) = store();
    let folder = store.provision_order_layout("2025-0007").unwrap();

    assert_eq!(folder, store.data_root().join("2025").join("2025-0007"));
    for name in ["stundennachweise.json", "stuecklisten.json", "rechnungen.json"] {
        let file = folder.join(name);
        assert!(file.is_file(), "missing {name}");
        assert_eq!(fs::read_to_string(file).unwrap(), "[]");
    }
}

#[test]
fn provisioning_twice_does_not_reset_populated_files() {
    let (_dir, store) = store();
    store.provision_order_layout("2025-0001").unwrap();
    store
        .write_order_scoped("2025-0001", ScopedFile::Boms, &[json!({ "id": "SL1" })])
        .unwrap();

    store.provision_order_layout("2025-0001").unwrap();

    let items = store.read_order_scoped("2025-0001", ScopedFile::Boms);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], json!("SL1"));
}

#[test]
fn position_layout_uses_two_digit_index_and_sanitized_label() {
    let (_dir, store) = store();
    store.provision_order_layout("2025-0002").unwrap();
    let folder = store
        .provision_position_layout("2025-0002", 3, "A/B: C?")
        .unwrap();

    assert!(folder.ends_with("03_A_B_ C_"));
    for sub in [
        "Dokumentation/Fotos",
        "Dokumentation/Skizzen",
        "Dokumentation/Berechnungen",
        "Rechnungen/Belege",
        "Rechnungen/Kundenrechnungen",
    ] {
        assert!(folder.join(sub).is_dir(), "missing {sub}");
    }

    // Idempotent: a second call succeeds and changes nothing.
    store
        .provision_position_layout("2025-0002", 3, "A/B: C?")
        .unwrap();
}

#[test]
fn locate_order_folder_never_creates() {
    let (_dir, store) = store();
    assert!(store.locate_order_folder("2025-0009").is_none());
    assert!(!store.data_root().join("2025").exists());

    store.provision_order_layout("2025-0009").unwrap();
    assert!(store.locate_order_folder("2025-0009").is_some());
}

#[test]
fn order_number_without_dash_falls_back_to_current_year() {
    let (_dir, store) = store();
    let folder = store.provision_order_layout("altbestand").unwrap();
    let year = folder
        .parent()
        .and_then(|p| p.file_name())
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(year.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(year.len(), 4);
}

#[test]
fn list_all_order_folders_only_matches_the_convention() {
    let (_dir, store) = store();
    store.provision_order_layout("2024-0001").unwrap();
    store.provision_order_layout("2025-0001").unwrap();
    store.provision_order_layout("2025-0002").unwrap();
    // Noise that must be ignored.
    fs::create_dir_all(store.data_root().join("backup").join("2025-0001")).unwrap();
    fs::create_dir_all(store.data_root().join("2025").join("notizen")).unwrap();

    let folders = store.list_all_order_folders();
    let names: Vec<String> = folders
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["2024-0001", "2025-0001", "2025-0002"]);
}

#[test]
fn scoped_writes_are_isolated_per_order() {
    let (_dir, store) = store();
    store.provision_order_layout("2025-0001").unwrap();
    store.provision_order_layout("2025-0002").unwrap();

    store
        .write_order_scoped("2025-0001", ScopedFile::Timesheets, &[json!({ "id": "SN1" })])
        .unwrap();

    assert_eq!(store.read_order_scoped("2025-0001", ScopedFile::Timesheets).len(), 1);
    assert!(store.read_order_scoped("2025-0002", ScopedFile::Timesheets).is_empty());
}

#[test]
fn set_data_root_creates_directory_but_moves_nothing() {
    let (dir, mut store) = store();
    store
        .write_collection(CollectionKind::Customers, &[json!({ "id": "K1", "name": "Alt" })])
        .unwrap();

    let new_root = dir.path().join("elsewhere");
    store.set_data_root(new_root.clone()).unwrap();

    assert!(new_root.is_dir());
    assert!(store.read_collection(CollectionKind::Customers).is_empty());
    assert!(dir.path().join("data").join("customers.json").is_file());
}
