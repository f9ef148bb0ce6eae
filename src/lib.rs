//! Nettopo
//!
//! A network topology snapshot engine. Per-device facts (interface
//! tables, CDP neighbors, OSPF neighbors, VLAN/trunk/MAC/STP state) are
//! collected over a device transport, correlated into one consistent
//! property graph, and queried through a fixed catalog of parameterized
//! templates selected from natural-language questions.
//!
//! # Architecture
//!
//! - [`parse`] — tolerant parsers turning raw command output into records
//! - [`collector`] — per-device command plans producing fact bundles
//! - [`ingest`] — batch correlation of fact bundles into the graph,
//!   idempotent under re-ingestion
//! - [`snapshot`] — snapshot lifecycle: discovery, load, focus, delete
//! - [`catalog`] — the template catalog with snapshot scoping and
//!   JSON-safe, deduplicated results
//! - [`classify`] — natural-language template selection behind a trait
//! - [`graph`] — the minimal graph-store contract and memory backend
//!
//! Multiple snapshots coexist in one store, isolated by snapshot id;
//! devices and interface identities are shared across snapshots while all
//! discovered links are tagged per snapshot.
//!
//! # Example
//!
//! ```rust
//! use nettopo::graph::{GraphBackend, GraphQuery, MemoryGraph};
//! use nettopo::ingest::TopologyIngestionEngine;
//! use nettopo::model::{DeviceType, FactBundle, InterfaceRecord};
//!
//! let mut store = MemoryGraph::new();
//! let engine = TopologyIngestionEngine::new();
//!
//! let mut r1 = FactBundle::new("EDGE-R1", DeviceType::Router, "10.0.0.1");
//! r1.interfaces.push(InterfaceRecord {
//!     interface: "GigabitEthernet0/0".to_string(),
//!     ip_address: "10.0.0.1".to_string(),
//!     ok: "YES".to_string(),
//!     method: "NVRAM".to_string(),
//!     status: "up".to_string(),
//!     protocol: "up".to_string(),
//! });
//!
//! let summary = engine
//!     .ingest(&mut store, "2024-01-01T00:00:00", &[r1])
//!     .unwrap();
//! assert_eq!(summary.devices, 1);
//! assert_eq!(summary.interfaces, 1);
//!
//! let rows = store.run(&GraphQuery::Devices, None).unwrap();
//! assert_eq!(rows.len(), 1);
//! ```

#![warn(clippy::all)]

pub mod catalog;
pub mod classify;
pub mod collector;
pub mod config;
pub mod graph;
pub mod ingest;
pub mod model;
pub mod parse;
pub mod snapshot;
pub mod transport;

// Re-export main types for convenience
pub use catalog::{AskResponse, CatalogError, QueryCatalog, QueryTemplate};
pub use classify::{ClassifierConfig, ClassifyError, Intent, IntentClassifier, LlmClassifier, StaticClassifier};
pub use collector::{
    collect_fleet, write_snapshot, CollectorError, CollectorSettings, DeviceDescriptor,
    DeviceFactCollector, FleetCapture,
};
pub use config::{AppConfig, ConfigError, DeviceConfig};
pub use graph::{
    GraphBackend, GraphError, GraphQuery, GraphResult, MemoryGraph, PropertyMap, PropertyValue,
    SnapshotScope,
};
pub use ingest::{IngestError, IngestionSummary, TopologyIngestionEngine};
pub use model::{DeviceType, FactBundle, NetworkSnapshot};
pub use snapshot::{
    CapturableSnapshot, LoadOutcome, LoadedSnapshot, RegistryError, SnapshotRegistry,
    SnapshotSelector,
};
pub use transport::{DeviceTransport, TransportError, TransportResult};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert_eq!(version(), "0.4.0");
    }
}
