use nettopo::graph::{GraphBackend, MemoryGraph};
use nettopo::model::{CdpNeighborRecord, DeviceType, FactBundle, InterfaceRecord, NetworkSnapshot};
use nettopo::snapshot::{SnapshotRegistry, SnapshotSelector};
use std::path::Path;

fn iface(name: &str, ip: &str) -> InterfaceRecord {
    InterfaceRecord {
        interface: name.to_string(),
        ip_address: ip.to_string(),
        ok: "YES".to_string(),
        method: "NVRAM".to_string(),
        status: "up".to_string(),
        protocol: "up".to_string(),
    }
}

fn linked_pair(snapshot_id: &str) -> NetworkSnapshot {
    let mut r1 = FactBundle::new("R1", DeviceType::Router, "10.0.0.1");
    r1.interfaces.push(iface("Gi0/0", "10.0.0.1"));
    r1.cdp_neighbors.push(CdpNeighborRecord {
        neighbor_device: "SW1".to_string(),
        neighbor_ip: "10.0.0.2".to_string(),
        platform: String::new(),
        capabilities: String::new(),
        local_interface: "Gi0/0".to_string(),
        neighbor_interface: "Gi0/1".to_string(),
    });

    let mut sw1 = FactBundle::new("SW1", DeviceType::Switch, "10.0.0.2");
    sw1.interfaces.push(iface("Gi0/1", "10.0.0.2"));

    NetworkSnapshot {
        snapshot_id: snapshot_id.to_string(),
        devices: vec![r1, sw1],
    }
}

fn write_document(dir: &Path, document: &NetworkSnapshot) {
    let path = dir.join(document.file_name());
    std::fs::write(&path, serde_json::to_string_pretty(document).unwrap()).unwrap();
}

#[test]
fn capturable_listing_is_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), &linked_pair("2024-01-01T00:00:00"));
    write_document(dir.path(), &linked_pair("2024-03-01T00:00:00"));
    write_document(dir.path(), &linked_pair("2024-02-01T00:00:00"));

    let registry = SnapshotRegistry::new(dir.path());
    let listing = registry.list_capturable().unwrap();

    assert_eq!(listing.len(), 3);
    assert_eq!(listing[0].snapshot_id, "2024-03-01T00:00:00");
    assert_eq!(listing[1].snapshot_id, "2024-02-01T00:00:00");
    assert_eq!(listing[2].snapshot_id, "2024-01-01T00:00:00");
    assert_eq!(listing[0].index, 1);
    assert_eq!(listing[0].devices, 2);
    assert_eq!(listing[0].timestamp.as_deref(), Some("2024-03-01 00:00:00"));
    assert!(listing[0].size_kb > 0.0);
}

#[test]
fn load_by_index_ingests_and_sets_active() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), &linked_pair("2024-01-01T00:00:00"));

    let mut store = MemoryGraph::new();
    let mut registry = SnapshotRegistry::new(dir.path());

    let outcome = registry
        .load(&mut store, &SnapshotSelector::Index(1), true)
        .unwrap();

    assert!(!outcome.already_loaded);
    let summary = outcome.summary.unwrap();
    assert_eq!(summary.devices, 2);
    assert_eq!(summary.interfaces, 2);
    assert_eq!(summary.cdp_links, 1);

    assert!(registry.is_loaded(&store, "2024-01-01T00:00:00"));
    assert_eq!(registry.get_active(), Some("2024-01-01T00:00:00"));
}

#[test]
fn loading_twice_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), &linked_pair("2024-01-01T00:00:00"));

    let mut store = MemoryGraph::new();
    let mut registry = SnapshotRegistry::new(dir.path());

    registry
        .load(&mut store, &SnapshotSelector::Index(1), true)
        .unwrap();
    let nodes = store.node_count();
    let edges = store.edge_count();

    let outcome = registry
        .load(&mut store, &SnapshotSelector::Index(1), true)
        .unwrap();

    assert!(outcome.already_loaded);
    assert!(outcome.summary.is_none());
    // no additional writes happened
    assert_eq!(store.node_count(), nodes);
    assert_eq!(store.edge_count(), edges);
}

#[test]
fn load_without_set_active_keeps_focus() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), &linked_pair("2024-01-01T00:00:00"));
    write_document(dir.path(), &linked_pair("2024-02-01T00:00:00"));

    let mut store = MemoryGraph::new();
    let mut registry = SnapshotRegistry::new(dir.path());

    registry
        .load(&mut store, &SnapshotSelector::Index(2), true)
        .unwrap();
    registry
        .load(&mut store, &SnapshotSelector::Index(1), false)
        .unwrap();

    assert_eq!(registry.get_active(), Some("2024-01-01T00:00:00"));
    assert_eq!(registry.list_loaded(&store).len(), 2);
}

#[test]
fn load_by_path_works() {
    let dir = tempfile::tempdir().unwrap();
    let document = linked_pair("2024-01-01T00:00:00");
    write_document(dir.path(), &document);

    let mut store = MemoryGraph::new();
    let mut registry = SnapshotRegistry::new(dir.path());

    let outcome = registry
        .load(
            &mut store,
            &SnapshotSelector::Path(dir.path().join(document.file_name())),
            true,
        )
        .unwrap();
    assert_eq!(outcome.snapshot_id, "2024-01-01T00:00:00");
}

#[test]
fn delete_removes_only_the_target_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), &linked_pair("2024-01-01T00:00:00"));
    write_document(dir.path(), &linked_pair("2024-02-01T00:00:00"));

    let mut store = MemoryGraph::new();
    let mut registry = SnapshotRegistry::new(dir.path());

    registry
        .load(&mut store, &SnapshotSelector::Index(2), true)
        .unwrap();
    registry
        .load(&mut store, &SnapshotSelector::Index(1), true)
        .unwrap();
    assert_eq!(registry.get_active(), Some("2024-02-01T00:00:00"));

    // delete the non-active snapshot: focus is untouched
    let deleted = registry.delete(&mut store, "2024-01-01T00:00:00").unwrap();
    assert!(deleted);
    assert_eq!(registry.get_active(), Some("2024-02-01T00:00:00"));
    assert!(!registry.is_loaded(&store, "2024-01-01T00:00:00"));
    assert!(registry.is_loaded(&store, "2024-02-01T00:00:00"));

    // devices survive snapshot deletion
    assert!(store.get_node("Device", "R1").is_some());
    assert!(store.get_node("Device", "SW1").is_some());

    // everything tagged with the surviving snapshot is intact: interfaces
    // were last seen by it and the link edge carries its tag
    assert!(store.get_node("Interface", "R1:Gi0/0").is_some());
    assert!(store.get_node("Interface", "SW1:Gi0/1").is_some());
}

#[test]
fn deleting_the_active_snapshot_clears_focus() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), &linked_pair("2024-01-01T00:00:00"));

    let mut store = MemoryGraph::new();
    let mut registry = SnapshotRegistry::new(dir.path());

    registry
        .load(&mut store, &SnapshotSelector::Index(1), true)
        .unwrap();
    let deleted = registry.delete(&mut store, "2024-01-01T00:00:00").unwrap();

    assert!(deleted);
    assert_eq!(registry.get_active(), None);
    assert!(store.get_node("Snapshot", "2024-01-01T00:00:00").is_none());
    // the snapshot's interfaces and links are gone, devices remain
    assert!(store.get_node("Interface", "R1:Gi0/0").is_none());
    assert_eq!(store.nodes_by_label("Device").len(), 2);
    assert_eq!(store.edge_count(), 0);
}

#[test]
fn deleting_an_unloaded_snapshot_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = MemoryGraph::new();
    let mut registry = SnapshotRegistry::new(dir.path());

    let deleted = registry.delete(&mut store, "2024-01-01T00:00:00").unwrap();
    assert!(!deleted);
}

#[test]
fn list_loaded_reports_active_flag() {
    let dir = tempfile::tempdir().unwrap();
    write_document(dir.path(), &linked_pair("2024-01-01T00:00:00"));
    write_document(dir.path(), &linked_pair("2024-02-01T00:00:00"));

    let mut store = MemoryGraph::new();
    let mut registry = SnapshotRegistry::new(dir.path());

    registry
        .load(&mut store, &SnapshotSelector::Index(1), true)
        .unwrap();
    registry
        .load(&mut store, &SnapshotSelector::Index(2), false)
        .unwrap();

    let loaded = registry.list_loaded(&store);
    assert_eq!(loaded.len(), 2);
    // newest first
    assert_eq!(loaded[0].snapshot_id, "2024-02-01T00:00:00");
    assert!(loaded[0].is_active);
    assert!(!loaded[1].is_active);
    assert_eq!(loaded[0].device_count, 2);
}
