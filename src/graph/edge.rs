//! Graph relationship representation

use super::property::{PropertyMap, PropertyValue};
use super::types::{EdgeId, EdgeType, NodeId};
use serde::{Deserialize, Serialize};

/// A directed relationship between two nodes
///
/// Relationships are upserted by the (type, source, target) triple, so a
/// repeated observation of the same link updates properties in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub edge_type: EdgeType,
    pub source: NodeId,
    pub target: NodeId,
    pub properties: PropertyMap,
}

impl Edge {
    pub fn new(id: EdgeId, edge_type: EdgeType, source: NodeId, target: NodeId) -> Self {
        Edge {
            id,
            edge_type,
            source,
            target,
            properties: PropertyMap::new(),
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn merge_properties(&mut self, props: PropertyMap) {
        self.properties.extend(props);
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint at all.
    pub fn other_endpoint(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}
