use async_trait::async_trait;
use nettopo::catalog::{QueryCatalog, TEMPLATES};
use nettopo::classify::{ClassifyResult, Intent, IntentClassifier, StaticClassifier};
use nettopo::graph::MemoryGraph;
use nettopo::ingest::TopologyIngestionEngine;
use nettopo::model::{CdpNeighborRecord, DeviceType, FactBundle, InterfaceRecord};
use nettopo::QueryTemplate;
use std::collections::HashMap;

fn iface(name: &str, ip: &str, status: &str) -> InterfaceRecord {
    InterfaceRecord {
        interface: name.to_string(),
        ip_address: ip.to_string(),
        ok: "YES".to_string(),
        method: "NVRAM".to_string(),
        status: status.to_string(),
        protocol: status.to_string(),
    }
}

fn cdp(neighbor: &str, local_if: &str, neighbor_if: &str) -> CdpNeighborRecord {
    CdpNeighborRecord {
        neighbor_device: neighbor.to_string(),
        neighbor_ip: String::new(),
        platform: String::new(),
        capabilities: String::new(),
        local_interface: local_if.to_string(),
        neighbor_interface: neighbor_if.to_string(),
    }
}

/// A 3-hop chain R1 - SW1 - SW2 with reciprocal CDP reports.
fn chain_store() -> MemoryGraph {
    let mut r1 = FactBundle::new("R1", DeviceType::Router, "10.0.0.1");
    r1.interfaces.push(iface("Gi0/0", "10.0.0.1", "up"));
    r1.cdp_neighbors.push(cdp("SW1", "Gi0/0", "Gi0/1"));

    let mut sw1 = FactBundle::new("SW1", DeviceType::Switch, "10.0.0.2");
    sw1.interfaces.push(iface("Gi0/1", "10.0.0.2", "up"));
    sw1.interfaces.push(iface("Gi0/2", "unassigned", "up"));
    sw1.cdp_neighbors.push(cdp("R1", "Gi0/1", "Gi0/0"));
    sw1.cdp_neighbors.push(cdp("SW2", "Gi0/2", "Gi0/3"));

    let mut sw2 = FactBundle::new("SW2", DeviceType::Switch, "10.0.0.3");
    sw2.interfaces.push(iface("Gi0/3", "unassigned", "down"));
    sw2.cdp_neighbors.push(cdp("SW1", "Gi0/3", "Gi0/2"));

    let mut store = MemoryGraph::new();
    TopologyIngestionEngine::new()
        .ingest(&mut store, "2024-01-01T00:00:00", &[r1, sw1, sw2])
        .unwrap();
    store
}

fn static_catalog() -> QueryCatalog<StaticClassifier> {
    QueryCatalog::new(StaticClassifier::new(vec![
        "R1".to_string(),
        "SW1".to_string(),
        "SW2".to_string(),
    ]))
}

struct FixedClassifier(Intent);

#[async_trait]
impl IntentClassifier for FixedClassifier {
    async fn classify(
        &self,
        _question: &str,
        _templates: &[QueryTemplate],
    ) -> ClassifyResult<Intent> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn list_devices_returns_all_rows() {
    let store = chain_store();
    let catalog = static_catalog();

    let response = catalog.ask(&store, "list devices", None).await;
    assert!(response.success);
    assert_eq!(response.template.as_deref(), Some("list_devices"));
    assert_eq!(response.count, 3);
    assert_eq!(response.results[0]["host"], "R1");
    assert_eq!(response.results[0]["type"], "router");
    assert_eq!(response.results[0]["ip"], "10.0.0.1");
}

#[tokio::test]
async fn all_shortest_paths_serializes_alternating_summaries() {
    let store = chain_store();
    let catalog = static_catalog();

    let response = catalog
        .ask(&store, "show all shortest paths between R1 and SW2", None)
        .await;
    assert!(response.success, "error: {:?}", response.error);
    assert_eq!(response.template.as_deref(), Some("show_all_paths"));
    // exactly the one discovered path
    assert_eq!(response.count, 1);

    let path = response.results[0]["path_nodes"].as_array().unwrap();
    let rendered: Vec<&str> = path.iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(
        rendered,
        vec![
            "R1 (10.0.0.1)",
            "IF:Gi0/0",
            "IF:Gi0/1",
            "SW1 (10.0.0.2)",
            "IF:Gi0/2",
            "IF:Gi0/3",
            "SW2 (10.0.0.3)",
        ]
    );
}

#[tokio::test]
async fn shortest_path_returns_one_row() {
    let store = chain_store();
    let catalog = static_catalog();

    let response = catalog
        .ask(&store, "route between R1 and SW1", None)
        .await;
    assert!(response.success, "error: {:?}", response.error);
    assert_eq!(response.template.as_deref(), Some("show_shortest_path"));
    assert_eq!(response.count, 1);
    let path = response.results[0]["path_nodes"].as_array().unwrap();
    assert_eq!(path.len(), 4); // device, both interfaces, device
}

#[tokio::test]
async fn down_interfaces_are_found() {
    let store = chain_store();
    let catalog = static_catalog();

    let response = catalog.ask(&store, "show down interfaces", None).await;
    assert!(response.success);
    assert_eq!(response.template.as_deref(), Some("find_down_interfaces"));
    assert_eq!(response.count, 1);
    assert_eq!(response.results[0]["host"], "SW2");
    assert_eq!(response.results[0]["iface"], "Gi0/3");
}

#[tokio::test]
async fn cdp_neighbors_for_device() {
    let store = chain_store();
    let catalog = static_catalog();

    let response = catalog
        .ask(&store, "cdp neighbors for SW1", None)
        .await;
    assert!(response.success, "error: {:?}", response.error);
    assert_eq!(
        response.template.as_deref(),
        Some("show_cdp_neighbors_device")
    );
    assert_eq!(response.count, 2);
    assert_eq!(response.results[0]["neighbor_device"], "R1");
    assert_eq!(response.results[1]["neighbor_device"], "SW2");
}

#[tokio::test]
async fn unknown_template_is_a_validation_error() {
    let store = chain_store();
    let catalog = QueryCatalog::new(FixedClassifier(Intent::Selection {
        template: "drop_all_tables".to_string(),
        params: HashMap::new(),
        reasoning: None,
    }));

    let response = catalog.ask(&store, "whatever", None).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("unknown template"));
    assert_eq!(response.count, 0);
}

#[tokio::test]
async fn missing_parameter_is_a_validation_error() {
    let store = chain_store();
    let catalog = QueryCatalog::new(FixedClassifier(Intent::Selection {
        template: "show_cdp_neighbors_device".to_string(),
        params: HashMap::new(),
        reasoning: None,
    }));

    let response = catalog.ask(&store, "whatever", None).await;
    assert!(!response.success);
    assert!(response.error.unwrap().contains("missing required parameter"));
}

#[tokio::test]
async fn clarification_is_surfaced_unchanged() {
    let store = chain_store();
    let catalog = QueryCatalog::new(FixedClassifier(Intent::Clarify {
        question: "Which device do you mean?".to_string(),
    }));

    let response = catalog.ask(&store, "neighbors?", None).await;
    assert!(response.success);
    assert_eq!(
        response.clarification.as_deref(),
        Some("Which device do you mean?")
    );
    assert_eq!(response.count, 0);
}

#[tokio::test]
async fn active_snapshot_scopes_results() {
    let mut store = chain_store();

    // a later snapshot where only SW2's side is re-observed, with its
    // interface back up
    let mut sw2 = FactBundle::new("SW2", DeviceType::Switch, "10.0.0.3");
    sw2.interfaces.push(iface("Gi0/3", "unassigned", "up"));
    TopologyIngestionEngine::new()
        .ingest(&mut store, "2024-02-01T00:00:00", &[sw2])
        .unwrap();

    let catalog = static_catalog();

    // scoped to the later snapshot, only the re-observed interface matches
    let response = catalog
        .ask(&store, "show up interfaces", Some("2024-02-01T00:00:00"))
        .await;
    assert!(response.success);
    assert_eq!(response.count, 1);
    assert_eq!(response.results[0]["host"], "SW2");
    assert_eq!(response.results[0]["iface"], "Gi0/3");

    // unscoped, every interface is visible
    let unscoped = catalog.ask(&store, "show up interfaces", None).await;
    assert_eq!(unscoped.count, 4);
}

#[tokio::test]
async fn path_query_respects_snapshot_scope() {
    let mut store = chain_store();

    // the second snapshot re-observes only R1, so under its scope the
    // chain to SW2 is broken
    let mut r1 = FactBundle::new("R1", DeviceType::Router, "10.0.0.1");
    r1.interfaces.push(iface("Gi0/0", "10.0.0.1", "up"));
    TopologyIngestionEngine::new()
        .ingest(&mut store, "2024-02-01T00:00:00", &[r1])
        .unwrap();

    let catalog = static_catalog();
    let response = catalog
        .ask(
            &store,
            "show all shortest paths between R1 and SW2",
            Some("2024-02-01T00:00:00"),
        )
        .await;
    assert!(response.success);
    assert_eq!(response.count, 0);
}

#[tokio::test]
async fn interface_counts_order_by_count() {
    let store = chain_store();
    let catalog = static_catalog();

    let response = catalog.ask(&store, "count interfaces", None).await;
    assert!(response.success);
    assert_eq!(response.count, 3);
    assert_eq!(response.results[0]["host"], "SW1");
    assert_eq!(response.results[0]["interface_count"], 2);
}

#[test]
fn catalog_exposes_all_thirteen_templates() {
    assert_eq!(TEMPLATES.len(), 13);
}
