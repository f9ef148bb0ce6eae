//! Graph node representation

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId};
use serde::{Deserialize, Serialize};

/// A node in the topology graph
///
/// Every node carries exactly one label and a natural key unique within
/// that label (`Device` → hostname, `Interface` → "hostname:name",
/// `Snapshot` → snapshot id). Upserts resolve through the (label, key)
/// pair, never through the internal id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: Label,
    pub key: String,
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(id: NodeId, label: Label, key: impl Into<String>) -> Self {
        Node {
            id,
            label,
            key: key.into(),
            properties: PropertyMap::new(),
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Merge the given properties into this node, overwriting existing keys.
    pub fn merge_properties(&mut self, props: PropertyMap) {
        self.properties.extend(props);
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.label.as_str() == label
    }

    /// Convenience accessor for string properties.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}
