//! Structured query forms for the graph-store contract
//!
//! The catalog layer builds one of these shapes and hands it to the store
//! together with an optional snapshot scope. Scoping is a first-class
//! parameter applied uniformly to every matched node and relationship
//! (and to every node a path visits), rather than being rewritten into
//! each query body.

use super::edge::Edge;
use super::node::Node;
use super::property::{PropertyMap, PropertyValue};
use indexmap::IndexMap;
use std::fmt;

/// A parameterized, structured query against the topology graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphQuery {
    /// All devices with hostname, type, and management address.
    Devices,
    /// Interface count per device, largest first.
    InterfaceCounts,
    /// The full physical topology over discovered links.
    Topology,
    /// Interfaces filtered by operational state, optionally for one device.
    InterfacesByStatus { device: Option<String>, up: bool },
    /// Discovered links from one device's interfaces outward.
    ConnectedInterfaces { device: String, cdp_only: bool },
    /// OSPF adjacencies, fleet-wide or for one device.
    OspfAdjacencies { device: Option<String> },
    /// One-hop device neighbors over direct device-to-device relationships.
    DeviceNeighbors { device: String },
    /// Shortest path(s) between two devices over ownership and link edges.
    ShortestPaths { from: String, to: String, all: bool },
}

impl fmt::Display for GraphQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphQuery::Devices => write!(f, "devices()"),
            GraphQuery::InterfaceCounts => write!(f, "interface_counts()"),
            GraphQuery::Topology => write!(f, "topology()"),
            GraphQuery::InterfacesByStatus { device, up } => match device {
                Some(d) => write!(f, "interfaces_by_status(device={}, up={})", d, up),
                None => write!(f, "interfaces_by_status(up={})", up),
            },
            GraphQuery::ConnectedInterfaces { device, cdp_only } => {
                write!(f, "connected_interfaces(device={}, cdp_only={})", device, cdp_only)
            }
            GraphQuery::OspfAdjacencies { device } => match device {
                Some(d) => write!(f, "ospf_adjacencies(device={})", d),
                None => write!(f, "ospf_adjacencies()"),
            },
            GraphQuery::DeviceNeighbors { device } => {
                write!(f, "device_neighbors(device={})", device)
            }
            GraphQuery::ShortestPaths { from, to, all } => {
                write!(f, "shortest_paths(from={}, to={}, all={})", from, to, all)
            }
        }
    }
}

/// Snapshot scope predicate.
///
/// An entity is in scope when its `snapshot_id` property equals the scoped
/// snapshot, or when it carries no `snapshot_id` at all (devices and
/// structural ownership edges are snapshot-free by design).
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotScope {
    snapshot_id: String,
}

impl SnapshotScope {
    pub fn new(snapshot_id: impl Into<String>) -> Self {
        SnapshotScope {
            snapshot_id: snapshot_id.into(),
        }
    }

    pub fn snapshot_id(&self) -> &str {
        &self.snapshot_id
    }

    pub fn allows(&self, props: &PropertyMap) -> bool {
        match props.get("snapshot_id") {
            Some(PropertyValue::String(s)) => s == &self.snapshot_id,
            Some(_) => false,
            None => true,
        }
    }
}

/// One value in a query result row.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Scalar(serde_json::Value),
    Node(Node),
    Relationship(Edge),
    /// An ordered walk of nodes, endpoints included.
    Path(Vec<Node>),
}

impl QueryValue {
    pub fn string(s: impl Into<String>) -> Self {
        QueryValue::Scalar(serde_json::Value::String(s.into()))
    }

    pub fn integer(i: i64) -> Self {
        QueryValue::Scalar(serde_json::Value::from(i))
    }
}

/// A result row: named columns in projection order.
pub type QueryRow = IndexMap<String, QueryValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_allows_untagged() {
        let scope = SnapshotScope::new("2024-01-01T00:00:00");
        let empty = PropertyMap::new();
        assert!(scope.allows(&empty));
    }

    #[test]
    fn test_scope_matches_tag() {
        let scope = SnapshotScope::new("2024-01-01T00:00:00");

        let mut tagged = PropertyMap::new();
        tagged.insert("snapshot_id".to_string(), "2024-01-01T00:00:00".into());
        assert!(scope.allows(&tagged));

        tagged.insert("snapshot_id".to_string(), "2024-02-02T00:00:00".into());
        assert!(!scope.allows(&tagged));
    }

    #[test]
    fn test_query_display() {
        let q = GraphQuery::ShortestPaths {
            from: "R1".to_string(),
            to: "SW2".to_string(),
            all: true,
        };
        assert_eq!(format!("{}", q), "shortest_paths(from=R1, to=SW2, all=true)");
    }
}
