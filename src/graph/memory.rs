//! In-memory graph backend
//!
//! Hash-map storage with adjacency lists and a label index, plus a
//! natural-key index so every write is an upsert. Query execution walks
//! the adjacency lists directly; path queries run a breadth-first search
//! over ownership and discovered-link edges with the snapshot scope
//! applied to every node and relationship visited.

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyMap;
use super::query::{GraphQuery, QueryRow, QueryValue, SnapshotScope};
use super::types::{EdgeId, EdgeType, Label, NodeId};
use super::{GraphBackend, GraphError, GraphResult, TagDeletion};
use rustc_hash::FxHashMap;
use std::collections::{HashMap, HashSet, VecDeque};

const HAS_INTERFACE: &str = "HAS_INTERFACE";
const CONNECTED_TO: &str = "CONNECTED_TO";

/// In-memory topology graph
#[derive(Debug, Default)]
pub struct MemoryGraph {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeId, Edge>,
    outgoing: HashMap<NodeId, Vec<EdgeId>>,
    incoming: HashMap<NodeId, Vec<EdgeId>>,
    label_index: HashMap<Label, HashSet<NodeId>>,
    key_index: FxHashMap<(String, String), NodeId>,
    edge_index: FxHashMap<(String, NodeId, NodeId), EdgeId>,
    next_node_id: u64,
    next_edge_id: u64,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    fn device(&self, hostname: &str) -> Option<&Node> {
        self.get_node("Device", hostname)
    }

    fn allows_node(scope: Option<&SnapshotScope>, node: &Node) -> bool {
        scope.map_or(true, |s| s.allows(&node.properties))
    }

    fn allows_edge(scope: Option<&SnapshotScope>, edge: &Edge) -> bool {
        scope.map_or(true, |s| s.allows(&edge.properties))
    }

    fn remove_edge(&mut self, id: EdgeId) {
        if let Some(edge) = self.edges.remove(&id) {
            if let Some(out) = self.outgoing.get_mut(&edge.source) {
                out.retain(|e| *e != id);
            }
            if let Some(inc) = self.incoming.get_mut(&edge.target) {
                inc.retain(|e| *e != id);
            }
            self.edge_index
                .remove(&(edge.edge_type.as_str().to_string(), edge.source, edge.target));
        }
    }

    fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.remove(&id) else {
            return false;
        };

        let mut incident: Vec<EdgeId> = Vec::new();
        incident.extend(self.outgoing.remove(&id).unwrap_or_default());
        incident.extend(self.incoming.remove(&id).unwrap_or_default());
        for edge_id in incident {
            self.remove_edge(edge_id);
        }

        if let Some(ids) = self.label_index.get_mut(&node.label) {
            ids.remove(&id);
        }
        self.key_index
            .remove(&(node.label.as_str().to_string(), node.key.clone()));
        true
    }

    /// Interfaces owned by a device, in scope, sorted by key.
    fn interfaces_of(&self, device: NodeId, scope: Option<&SnapshotScope>) -> Vec<&Node> {
        let mut out: Vec<&Node> = self
            .outgoing
            .get(&device)
            .into_iter()
            .flatten()
            .filter_map(|e| self.edges.get(e))
            .filter(|e| e.edge_type.as_str() == HAS_INTERFACE)
            .filter_map(|e| self.node(e.target))
            .filter(|n| Self::allows_node(scope, n))
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    /// The device owning an interface, if any.
    fn owner_of(&self, iface: NodeId) -> Option<&Node> {
        self.incoming
            .get(&iface)
            .into_iter()
            .flatten()
            .filter_map(|e| self.edges.get(e))
            .find(|e| e.edge_type.as_str() == HAS_INTERFACE)
            .and_then(|e| self.node(e.source))
    }

    /// Devices sorted by hostname, optionally restricted to one.
    fn devices_sorted(&self, only: Option<&str>) -> Vec<&Node> {
        match only {
            Some(hostname) => self.device(hostname).into_iter().collect(),
            None => self.nodes_by_label("Device"),
        }
    }

    fn prop(node: &Node, key: &str) -> QueryValue {
        QueryValue::string(node.property_str(key).unwrap_or_default())
    }

    // ------------------------------------------------------------------
    // Query execution
    // ------------------------------------------------------------------

    fn run_devices(&self, scope: Option<&SnapshotScope>) -> Vec<QueryRow> {
        self.devices_sorted(None)
            .into_iter()
            .filter(|d| Self::allows_node(scope, d))
            .map(|d| {
                QueryRow::from_iter([
                    ("host".to_string(), QueryValue::string(d.key.clone())),
                    ("type".to_string(), Self::prop(d, "type")),
                    ("ip".to_string(), Self::prop(d, "ip_address")),
                ])
            })
            .collect()
    }

    fn run_interface_counts(&self, scope: Option<&SnapshotScope>) -> Vec<QueryRow> {
        let mut counts: Vec<(String, i64)> = self
            .devices_sorted(None)
            .into_iter()
            .map(|d| (d.key.clone(), self.interfaces_of(d.id, scope).len() as i64))
            .filter(|(_, n)| *n > 0)
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
            .into_iter()
            .map(|(host, n)| {
                QueryRow::from_iter([
                    ("host".to_string(), QueryValue::string(host)),
                    ("interface_count".to_string(), QueryValue::integer(n)),
                ])
            })
            .collect()
    }

    fn run_topology(&self, scope: Option<&SnapshotScope>) -> Vec<QueryRow> {
        let mut rows = Vec::new();
        for d1 in self.devices_sorted(None) {
            for i1 in self.interfaces_of(d1.id, scope) {
                for edge in self
                    .outgoing
                    .get(&i1.id)
                    .into_iter()
                    .flatten()
                    .filter_map(|e| self.edges.get(e))
                    .filter(|e| e.edge_type.as_str() == CONNECTED_TO)
                    .filter(|e| Self::allows_edge(scope, e))
                {
                    let Some(i2) = self.node(edge.target).filter(|n| Self::allows_node(scope, n))
                    else {
                        continue;
                    };
                    let Some(d2) = self.owner_of(i2.id) else {
                        continue;
                    };
                    rows.push(QueryRow::from_iter([
                        ("from".to_string(), QueryValue::string(d1.key.clone())),
                        ("from_if".to_string(), Self::prop(i1, "name")),
                        ("to".to_string(), QueryValue::string(d2.key.clone())),
                        ("to_if".to_string(), Self::prop(i2, "name")),
                        ("protocol".to_string(), {
                            QueryValue::string(edge.property_str("protocol").unwrap_or_default())
                        }),
                    ]));
                }
            }
        }
        rows.sort_by(|a, b| {
            (row_str(a, "from"), row_str(a, "to"), row_str(a, "from_if"))
                .cmp(&(row_str(b, "from"), row_str(b, "to"), row_str(b, "from_if")))
        });
        rows
    }

    fn run_interfaces_by_status(
        &self,
        device: Option<&str>,
        up: bool,
        scope: Option<&SnapshotScope>,
    ) -> Vec<QueryRow> {
        let mut rows = Vec::new();
        for d in self.devices_sorted(device) {
            for iface in self.interfaces_of(d.id, scope) {
                let status = iface.property_str("status").unwrap_or_default();
                let protocol = iface.property_str("protocol").unwrap_or_default();
                let is_up = status == "up" && protocol == "up";
                if is_up != up {
                    continue;
                }
                let row = if up {
                    if device.is_some() {
                        QueryRow::from_iter([
                            ("iface".to_string(), Self::prop(iface, "name")),
                            ("ip".to_string(), Self::prop(iface, "ip_address")),
                        ])
                    } else {
                        QueryRow::from_iter([
                            ("host".to_string(), QueryValue::string(d.key.clone())),
                            ("iface".to_string(), Self::prop(iface, "name")),
                            ("ip".to_string(), Self::prop(iface, "ip_address")),
                        ])
                    }
                } else {
                    QueryRow::from_iter([
                        ("host".to_string(), QueryValue::string(d.key.clone())),
                        ("iface".to_string(), Self::prop(iface, "name")),
                        ("status".to_string(), QueryValue::string(status)),
                        ("protocol".to_string(), QueryValue::string(protocol)),
                    ])
                };
                rows.push(row);
            }
        }
        rows
    }

    fn run_connected_interfaces(
        &self,
        device: &str,
        cdp_only: bool,
        scope: Option<&SnapshotScope>,
    ) -> Vec<QueryRow> {
        let Some(d) = self.device(device) else {
            return Vec::new();
        };
        let mut rows = Vec::new();
        for iface in self.interfaces_of(d.id, scope) {
            // Discovered links are undirected; walk both edge directions.
            let incident = self
                .outgoing
                .get(&iface.id)
                .into_iter()
                .flatten()
                .chain(self.incoming.get(&iface.id).into_iter().flatten());
            for edge in incident
                .filter_map(|e| self.edges.get(e))
                .filter(|e| e.edge_type.as_str() == CONNECTED_TO)
                .filter(|e| Self::allows_edge(scope, e))
            {
                if cdp_only && edge.property_str("protocol") != Some("CDP") {
                    continue;
                }
                let Some(remote) = edge
                    .other_endpoint(iface.id)
                    .and_then(|id| self.node(id))
                    .filter(|n| Self::allows_node(scope, n))
                else {
                    continue;
                };
                let Some(remote_dev) = self.owner_of(remote.id) else {
                    continue;
                };
                let row = if cdp_only {
                    QueryRow::from_iter([
                        ("local_iface".to_string(), Self::prop(iface, "name")),
                        (
                            "neighbor_device".to_string(),
                            QueryValue::string(remote_dev.key.clone()),
                        ),
                        ("neighbor_iface".to_string(), Self::prop(remote, "name")),
                        ("neighbor_ip".to_string(), {
                            QueryValue::string(edge.property_str("neighbor_ip").unwrap_or_default())
                        }),
                    ])
                } else {
                    QueryRow::from_iter([
                        ("local_iface".to_string(), Self::prop(iface, "name")),
                        (
                            "remote_device".to_string(),
                            QueryValue::string(remote_dev.key.clone()),
                        ),
                        ("remote_iface".to_string(), Self::prop(remote, "name")),
                        ("protocol".to_string(), {
                            QueryValue::string(edge.property_str("protocol").unwrap_or_default())
                        }),
                    ])
                };
                rows.push(row);
            }
        }
        let (dev_key, if_key) = if cdp_only {
            ("neighbor_device", "neighbor_iface")
        } else {
            ("remote_device", "remote_iface")
        };
        rows.sort_by(|a, b| {
            (row_str(a, dev_key), row_str(a, if_key)).cmp(&(row_str(b, dev_key), row_str(b, if_key)))
        });
        rows
    }

    fn run_ospf_adjacencies(
        &self,
        device: Option<&str>,
        scope: Option<&SnapshotScope>,
    ) -> Vec<QueryRow> {
        let mut rows = Vec::new();
        for d in self.devices_sorted(device) {
            let mut neighbors: Vec<(&Edge, &Node)> = self
                .outgoing
                .get(&d.id)
                .into_iter()
                .flatten()
                .filter_map(|e| self.edges.get(e))
                .filter(|e| e.edge_type.as_str() == "OSPF_NEIGHBOR")
                .filter(|e| Self::allows_edge(scope, e))
                .filter_map(|e| self.node(e.target).map(|n| (e, n)))
                .filter(|(_, n)| Self::allows_node(scope, n))
                .collect();
            neighbors.sort_by(|a, b| a.1.key.cmp(&b.1.key));

            for (edge, neighbor) in neighbors {
                let state = edge.property_str("state").unwrap_or_default();
                let addr = edge.property_str("neighbor_address").unwrap_or_default();
                let local_if = edge.property_str("local_interface").unwrap_or_default();
                let row = if device.is_some() {
                    QueryRow::from_iter([
                        ("neighbor".to_string(), QueryValue::string(neighbor.key.clone())),
                        ("state".to_string(), QueryValue::string(state)),
                        ("neighbor_ip".to_string(), QueryValue::string(addr)),
                        ("local_iface".to_string(), QueryValue::string(local_if)),
                    ])
                } else {
                    QueryRow::from_iter([
                        ("local".to_string(), QueryValue::string(d.key.clone())),
                        ("neighbor".to_string(), QueryValue::string(neighbor.key.clone())),
                        ("state".to_string(), QueryValue::string(state)),
                        ("neighbor_ip".to_string(), QueryValue::string(addr)),
                        ("local_if".to_string(), QueryValue::string(local_if)),
                    ])
                };
                rows.push(row);
            }
        }
        rows
    }

    fn run_device_neighbors(&self, device: &str, scope: Option<&SnapshotScope>) -> Vec<QueryRow> {
        let Some(d) = self.device(device) else {
            return Vec::new();
        };
        let mut rows: Vec<(String, String)> = Vec::new();
        let incident = self
            .outgoing
            .get(&d.id)
            .into_iter()
            .flatten()
            .chain(self.incoming.get(&d.id).into_iter().flatten());
        for edge in incident.filter_map(|e| self.edges.get(e)) {
            if !Self::allows_edge(scope, edge) {
                continue;
            }
            let Some(other) = edge.other_endpoint(d.id).and_then(|id| self.node(id)) else {
                continue;
            };
            if !other.has_label("Device") || !Self::allows_node(scope, other) {
                continue;
            }
            rows.push((other.key.clone(), edge.edge_type.as_str().to_string()));
        }
        rows.sort();
        rows.into_iter()
            .map(|(neighbor, rel)| {
                QueryRow::from_iter([
                    ("neighbor".to_string(), QueryValue::string(neighbor)),
                    ("rel".to_string(), QueryValue::string(rel)),
                ])
            })
            .collect()
    }

    /// Nodes reachable in one traversal step over ownership or link edges,
    /// both directions, scope applied to the edge and the far node.
    fn traversal_neighbors(&self, node: NodeId, scope: Option<&SnapshotScope>) -> Vec<NodeId> {
        let incident = self
            .outgoing
            .get(&node)
            .into_iter()
            .flatten()
            .chain(self.incoming.get(&node).into_iter().flatten());
        let mut out: Vec<NodeId> = incident
            .filter_map(|e| self.edges.get(e))
            .filter(|e| matches!(e.edge_type.as_str(), HAS_INTERFACE | CONNECTED_TO))
            .filter(|e| Self::allows_edge(scope, e))
            .filter_map(|e| e.other_endpoint(node))
            .filter(|id| {
                self.node(*id)
                    .map_or(false, |n| Self::allows_node(scope, n))
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    fn run_shortest_paths(
        &self,
        from: &str,
        to: &str,
        all: bool,
        scope: Option<&SnapshotScope>,
    ) -> Vec<QueryRow> {
        let (Some(src), Some(dst)) = (self.device(from), self.device(to)) else {
            return Vec::new();
        };
        if !Self::allows_node(scope, src) || !Self::allows_node(scope, dst) {
            return Vec::new();
        }
        let (src, dst) = (src.id, dst.id);

        // BFS recording every shortest-distance parent, so all shortest
        // paths can be reconstructed.
        let mut dist: FxHashMap<NodeId, usize> = FxHashMap::default();
        let mut parents: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
        let mut queue = VecDeque::new();
        dist.insert(src, 0);
        queue.push_back(src);

        while let Some(current) = queue.pop_front() {
            let d = dist[&current];
            if let Some(target_d) = dist.get(&dst) {
                if d >= *target_d {
                    continue;
                }
            }
            for next in self.traversal_neighbors(current, scope) {
                match dist.get(&next) {
                    None => {
                        dist.insert(next, d + 1);
                        parents.insert(next, vec![current]);
                        queue.push_back(next);
                    }
                    Some(nd) if *nd == d + 1 => {
                        if let Some(ps) = parents.get_mut(&next) {
                            ps.push(current);
                        }
                    }
                    Some(_) => {}
                }
            }
        }

        if !dist.contains_key(&dst) {
            return Vec::new();
        }

        let mut paths: Vec<Vec<NodeId>> = Vec::new();
        let mut walk = vec![dst];
        self.collect_paths(src, dst, &parents, &mut walk, &mut paths);
        paths.sort();
        if !all {
            paths.truncate(1);
        }

        paths
            .into_iter()
            .map(|ids| {
                let nodes: Vec<Node> = ids
                    .into_iter()
                    .filter_map(|id| self.node(id).cloned())
                    .collect();
                QueryRow::from_iter([("path_nodes".to_string(), QueryValue::Path(nodes))])
            })
            .collect()
    }

    fn collect_paths(
        &self,
        src: NodeId,
        current: NodeId,
        parents: &FxHashMap<NodeId, Vec<NodeId>>,
        walk: &mut Vec<NodeId>,
        out: &mut Vec<Vec<NodeId>>,
    ) {
        if current == src {
            let mut path = walk.clone();
            path.reverse();
            out.push(path);
            return;
        }
        let Some(ps) = parents.get(&current) else {
            return;
        };
        for parent in ps {
            walk.push(*parent);
            self.collect_paths(src, *parent, parents, walk, out);
            walk.pop();
        }
    }
}

fn row_str<'a>(row: &'a QueryRow, key: &str) -> &'a str {
    match row.get(key) {
        Some(QueryValue::Scalar(serde_json::Value::String(s))) => s.as_str(),
        _ => "",
    }
}

impl GraphBackend for MemoryGraph {
    fn upsert_node(&mut self, label: &str, key: &str, props: PropertyMap) -> NodeId {
        let index_key = (label.to_string(), key.to_string());
        if let Some(id) = self.key_index.get(&index_key) {
            let id = *id;
            if let Some(node) = self.nodes.get_mut(&id) {
                node.merge_properties(props);
            }
            return id;
        }

        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;

        let label = Label::new(label);
        let mut node = Node::new(id, label.clone(), key);
        node.merge_properties(props);

        self.label_index.entry(label).or_default().insert(id);
        self.key_index.insert(index_key, id);
        self.nodes.insert(id, node);
        id
    }

    fn get_node(&self, label: &str, key: &str) -> Option<&Node> {
        let id = self
            .key_index
            .get(&(label.to_string(), key.to_string()))?;
        self.nodes.get(id)
    }

    fn nodes_by_label(&self, label: &str) -> Vec<&Node> {
        let mut out: Vec<&Node> = self
            .label_index
            .get(&Label::new(label))
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    fn upsert_relationship(
        &mut self,
        edge_type: &str,
        from: (&str, &str),
        to: (&str, &str),
        props: PropertyMap,
    ) -> GraphResult<EdgeId> {
        let source = *self
            .key_index
            .get(&(from.0.to_string(), from.1.to_string()))
            .ok_or_else(|| GraphError::EndpointNotFound {
                label: from.0.to_string(),
                key: from.1.to_string(),
            })?;
        let target = *self
            .key_index
            .get(&(to.0.to_string(), to.1.to_string()))
            .ok_or_else(|| GraphError::EndpointNotFound {
                label: to.0.to_string(),
                key: to.1.to_string(),
            })?;

        let index_key = (edge_type.to_string(), source, target);
        if let Some(id) = self.edge_index.get(&index_key) {
            let id = *id;
            if let Some(edge) = self.edges.get_mut(&id) {
                edge.merge_properties(props);
            }
            return Ok(id);
        }

        let id = EdgeId::new(self.next_edge_id);
        self.next_edge_id += 1;

        let mut edge = Edge::new(id, EdgeType::new(edge_type), source, target);
        edge.merge_properties(props);

        self.outgoing.entry(source).or_default().push(id);
        self.incoming.entry(target).or_default().push(id);
        self.edge_index.insert(index_key, id);
        self.edges.insert(id, edge);
        Ok(id)
    }

    fn delete_node(&mut self, label: &str, key: &str) -> bool {
        match self
            .key_index
            .get(&(label.to_string(), key.to_string()))
            .copied()
        {
            Some(id) => self.remove_node(id),
            None => false,
        }
    }

    fn delete_by_tag(&mut self, tag: &str, value: &str) -> TagDeletion {
        let tagged = |props: &PropertyMap| props.get(tag).and_then(|v| v.as_str()) == Some(value);

        let mut deleted = TagDeletion::default();

        let edge_ids: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| tagged(&e.properties))
            .map(|e| e.id)
            .collect();
        for id in edge_ids {
            self.remove_edge(id);
            deleted.relationships += 1;
        }

        let node_ids: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| tagged(&n.properties))
            .map(|n| n.id)
            .collect();
        for id in node_ids {
            if self.remove_node(id) {
                deleted.nodes += 1;
            }
        }

        deleted
    }

    fn run(&self, query: &GraphQuery, scope: Option<&SnapshotScope>) -> GraphResult<Vec<QueryRow>> {
        let rows = match query {
            GraphQuery::Devices => self.run_devices(scope),
            GraphQuery::InterfaceCounts => self.run_interface_counts(scope),
            GraphQuery::Topology => self.run_topology(scope),
            GraphQuery::InterfacesByStatus { device, up } => {
                self.run_interfaces_by_status(device.as_deref(), *up, scope)
            }
            GraphQuery::ConnectedInterfaces { device, cdp_only } => {
                self.run_connected_interfaces(device, *cdp_only, scope)
            }
            GraphQuery::OspfAdjacencies { device } => {
                self.run_ospf_adjacencies(device.as_deref(), scope)
            }
            GraphQuery::DeviceNeighbors { device } => self.run_device_neighbors(device, scope),
            GraphQuery::ShortestPaths { from, to, all } => {
                self.run_shortest_paths(from, to, *all, scope)
            }
        };
        Ok(rows)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
