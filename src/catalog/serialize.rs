//! Query result serialization and deduplication
//!
//! Every row becomes a JSON-safe object. Graph entities serialize with
//! their internal ids and properties; paths serialize as ordered
//! human-readable summaries built for display, not round-tripping.

use crate::graph::{Node, QueryRow, QueryValue};
use rustc_hash::FxHashSet;
use serde_json::{json, Value};

/// Render one node for path display: devices as "hostname (ip)",
/// interfaces as "IF:name".
fn node_summary(node: &Node) -> String {
    if node.has_label("Device") {
        format!(
            "{} ({})",
            node.key,
            node.property_str("ip_address").unwrap_or_default()
        )
    } else if node.has_label("Interface") {
        format!(
            "IF:{}",
            node.property_str("name").unwrap_or(node.key.as_str())
        )
    } else {
        "unknown".to_string()
    }
}

pub fn serialize_value(value: &QueryValue) -> Value {
    match value {
        QueryValue::Scalar(v) => v.clone(),
        QueryValue::Node(node) => {
            let props: serde_json::Map<String, Value> = node
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect();
            json!({
                "_id": node.id.as_u64(),
                "_labels": [node.label.as_str()],
                "properties": props,
            })
        }
        QueryValue::Relationship(edge) => {
            let props: serde_json::Map<String, Value> = edge
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect();
            json!({
                "_id": edge.id.as_u64(),
                "_type": edge.edge_type.as_str(),
                "_start": edge.source.as_u64(),
                "_end": edge.target.as_u64(),
                "properties": props,
            })
        }
        QueryValue::Path(nodes) => {
            Value::Array(nodes.iter().map(|n| Value::String(node_summary(n))).collect())
        }
    }
}

pub fn serialize_row(row: &QueryRow) -> Value {
    let map: serde_json::Map<String, Value> = row
        .iter()
        .map(|(k, v)| (k.clone(), serialize_value(v)))
        .collect();
    Value::Object(map)
}

/// Collapse duplicate rows by their canonical serialization.
///
/// Serialized rows are JSON objects with ordered keys, so the rendered
/// string is a canonical form; the first occurrence wins.
pub fn dedup_rows(rows: Vec<Value>) -> Vec<Value> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut unique = Vec::with_capacity(rows.len());
    for row in rows {
        let canonical = row.to_string();
        if seen.insert(canonical) {
            unique.push(row);
        }
    }
    unique
}
