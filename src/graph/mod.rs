//! Topology property graph: primitives, store contract, memory backend
//!
//! The ingestion engine, snapshot registry, and query catalog are written
//! against the minimal [`GraphBackend`] contract rather than a specific
//! storage engine or query language. [`MemoryGraph`] is the in-process
//! implementation.

pub mod edge;
pub mod memory;
pub mod node;
pub mod property;
pub mod query;
pub mod types;

pub use edge::Edge;
pub use memory::MemoryGraph;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use query::{GraphQuery, QueryRow, QueryValue, SnapshotScope};
pub use types::{EdgeId, EdgeType, Label, NodeId};

use thiserror::Error;

/// Errors surfaced by a graph backend
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("relationship endpoint not found: {label} \"{key}\"")]
    EndpointNotFound { label: String, key: String },

    #[error("graph backend error: {0}")]
    Backend(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Counts returned by a tag-scoped deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagDeletion {
    pub relationships: usize,
    pub nodes: usize,
}

/// Minimal graph-store contract the topology engine is written against.
///
/// Nodes are addressed by (label, natural key); relationships by
/// (type, source, target). Upserts merge properties into the existing
/// entity rather than appending duplicates, which is what makes repeated
/// ingestion of the same snapshot idempotent.
pub trait GraphBackend: Send {
    fn upsert_node(&mut self, label: &str, key: &str, props: PropertyMap) -> NodeId;

    fn get_node(&self, label: &str, key: &str) -> Option<&Node>;

    fn nodes_by_label(&self, label: &str) -> Vec<&Node>;

    fn upsert_relationship(
        &mut self,
        edge_type: &str,
        from: (&str, &str),
        to: (&str, &str),
        props: PropertyMap,
    ) -> GraphResult<EdgeId>;

    /// Delete one node and every relationship attached to it.
    fn delete_node(&mut self, label: &str, key: &str) -> bool;

    /// Delete every relationship carrying `tag == value`, then every node
    /// carrying it. Relationships go first so no dangling edge is ever
    /// observable mid-deletion.
    fn delete_by_tag(&mut self, tag: &str, value: &str) -> TagDeletion;

    /// Execute a structured query, optionally constrained to one snapshot.
    fn run(&self, query: &GraphQuery, scope: Option<&SnapshotScope>) -> GraphResult<Vec<QueryRow>>;

    fn node_count(&self) -> usize;

    fn edge_count(&self) -> usize;
}
