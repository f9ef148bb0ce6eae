//! Topology ingestion engine
//!
//! Merges a batch of per-device fact bundles into the graph under one
//! snapshot id. Each phase is batch-oriented: all rows of a phase are
//! written before the next begins, so link creation never interleaves
//! with node lookups.
//!
//! Every write is an upsert by natural key, which makes re-running the
//! same snapshot with the same bundles idempotent — re-ingestion is also
//! the recovery path after a partial failure.

use crate::graph::{GraphBackend, GraphError, PropertyMap, PropertyValue};
use crate::model::FactBundle;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced by an ingestion run
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("snapshot {0:?} already exists")]
    SnapshotExists(String),

    #[error(transparent)]
    Store(#[from] GraphError),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Counts of entities created or updated by one ingestion run.
///
/// `skipped_*` tallies link observations that could not be resolved
/// against the same batch (one-sided CDP reports, unknown OSPF neighbor
/// addresses). They are absorbed here, never raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionSummary {
    pub devices: usize,
    pub interfaces: usize,
    pub cdp_links: usize,
    pub ospf_links: usize,
    pub skipped_cdp: usize,
    pub skipped_ospf: usize,
}

/// Correlates per-device fact bundles into one consistent graph.
#[derive(Debug, Default)]
pub struct TopologyIngestionEngine;

impl TopologyIngestionEngine {
    pub fn new() -> Self {
        TopologyIngestionEngine
    }

    /// Ingest `bundles` under `snapshot_id`.
    ///
    /// Fails with [`IngestError::SnapshotExists`] when the snapshot node is
    /// already present — callers check through the registry first.
    pub fn ingest<B: GraphBackend>(
        &self,
        store: &mut B,
        snapshot_id: &str,
        bundles: &[FactBundle],
    ) -> IngestResult<IngestionSummary> {
        if store.get_node("Snapshot", snapshot_id).is_some() {
            return Err(IngestError::SnapshotExists(snapshot_id.to_string()));
        }

        info!(
            "ingesting snapshot {} ({} devices)",
            snapshot_id,
            bundles.len()
        );
        let mut summary = IngestionSummary {
            devices: bundles.len(),
            ..IngestionSummary::default()
        };

        self.create_snapshot_node(store, snapshot_id, bundles.len());
        self.upsert_devices(store, bundles);
        summary.interfaces = self.upsert_interfaces(store, snapshot_id, bundles)?;
        self.store_switch_payloads(store, snapshot_id, bundles);

        // Lookups are scoped to this batch only; they are not persisted.
        let iface_by_key = interface_lookup(bundles);
        let device_by_ip = ip_lookup(bundles);
        debug!(
            "indexed {} interfaces, {} device addresses",
            iface_by_key.len(),
            device_by_ip.len()
        );

        self.link_cdp(store, snapshot_id, bundles, &iface_by_key, &mut summary)?;
        self.link_ospf(store, snapshot_id, bundles, &device_by_ip, &mut summary)?;

        info!(
            "snapshot {} ingested: {} interfaces, {} cdp links ({} skipped), {} ospf links ({} skipped)",
            snapshot_id,
            summary.interfaces,
            summary.cdp_links,
            summary.skipped_cdp,
            summary.ospf_links,
            summary.skipped_ospf
        );
        Ok(summary)
    }

    fn create_snapshot_node<B: GraphBackend>(
        &self,
        store: &mut B,
        snapshot_id: &str,
        device_count: usize,
    ) {
        let mut props = PropertyMap::new();
        props.insert("id".to_string(), snapshot_id.into());
        props.insert("device_count".to_string(), (device_count as i64).into());
        if let Some(millis) = parse_snapshot_timestamp(snapshot_id) {
            props.insert("created_at".to_string(), PropertyValue::DateTime(millis));
        }
        store.upsert_node("Snapshot", snapshot_id, props);
    }

    fn upsert_devices<B: GraphBackend>(&self, store: &mut B, bundles: &[FactBundle]) {
        for bundle in bundles {
            let mut props = PropertyMap::new();
            props.insert("hostname".to_string(), bundle.hostname.as_str().into());
            props.insert("type".to_string(), bundle.device_type.as_str().into());
            props.insert("ip_address".to_string(), bundle.ip_address.as_str().into());
            store.upsert_node("Device", &bundle.hostname, props);
        }
    }

    fn upsert_interfaces<B: GraphBackend>(
        &self,
        store: &mut B,
        snapshot_id: &str,
        bundles: &[FactBundle],
    ) -> IngestResult<usize> {
        let mut count = 0;
        for bundle in bundles {
            for iface in &bundle.interfaces {
                let key = interface_key(&bundle.hostname, &iface.interface);
                let mut props = PropertyMap::new();
                props.insert("name".to_string(), iface.interface.as_str().into());
                props.insert("ip_address".to_string(), iface.ip_address.as_str().into());
                props.insert("ok".to_string(), iface.ok.as_str().into());
                props.insert("method".to_string(), iface.method.as_str().into());
                props.insert("status".to_string(), iface.status.as_str().into());
                props.insert("protocol".to_string(), iface.protocol.as_str().into());
                props.insert("snapshot_id".to_string(), snapshot_id.into());
                store.upsert_node("Interface", &key, props);

                // Ownership is structural and survives snapshot deletion,
                // so the edge carries no snapshot tag.
                store.upsert_relationship(
                    "HAS_INTERFACE",
                    ("Device", bundle.hostname.as_str()),
                    ("Interface", key.as_str()),
                    PropertyMap::new(),
                )?;
                count += 1;
            }
        }
        Ok(count)
    }

    fn store_switch_payloads<B: GraphBackend>(
        &self,
        store: &mut B,
        snapshot_id: &str,
        bundles: &[FactBundle],
    ) {
        for bundle in bundles.iter().filter(|b| b.device_type.is_switch()) {
            let stp = bundle.spanning_tree.clone().unwrap_or_default();
            let mut props = PropertyMap::new();
            props.insert("vlans".to_string(), to_json_blob(&bundle.vlans));
            props.insert("mac_addresses".to_string(), to_json_blob(&bundle.mac_addresses));
            props.insert("spanning_tree".to_string(), to_json_blob(&stp));
            props.insert("trunks".to_string(), to_json_blob(&bundle.trunks));
            // Devices survive snapshot deletion; the payload tag is a
            // separate property so tag-scoped deletes never match them.
            props.insert("payload_snapshot_id".to_string(), snapshot_id.into());
            store.upsert_node("Device", &bundle.hostname, props);
        }
    }

    fn link_cdp<B: GraphBackend>(
        &self,
        store: &mut B,
        snapshot_id: &str,
        bundles: &[FactBundle],
        iface_by_key: &FxHashMap<(&str, &str), &crate::model::InterfaceRecord>,
        summary: &mut IngestionSummary,
    ) -> IngestResult<()> {
        for bundle in bundles {
            for cdp in &bundle.cdp_neighbors {
                let local_name = cdp.local_interface.as_str();
                // CDP reports the neighbor with its domain suffix attached.
                let neighbor_device = cdp
                    .neighbor_device
                    .split('.')
                    .next()
                    .unwrap_or_default();
                let neighbor_name = cdp.neighbor_interface.as_str();

                if local_name.is_empty() || neighbor_device.is_empty() || neighbor_name.is_empty() {
                    summary.skipped_cdp += 1;
                    continue;
                }

                let local = iface_by_key.get(&(bundle.hostname.as_str(), local_name));
                let remote = iface_by_key.get(&(neighbor_device, neighbor_name));

                // A link exists only when both sides independently reported
                // the interface; a one-sided CDP record never creates a
                // dangling edge.
                let (Some(local), Some(remote)) = (local, remote) else {
                    summary.skipped_cdp += 1;
                    continue;
                };

                let local_key = interface_key(&bundle.hostname, local_name);
                let remote_key = interface_key(neighbor_device, neighbor_name);

                // Both ends observe the same physical link. Endpoints are
                // stored in canonical key order so the reciprocal report
                // upserts the same edge instead of creating a mirror.
                let (src_key, dst_key, src, dst) = if local_key <= remote_key {
                    (&local_key, &remote_key, local, remote)
                } else {
                    (&remote_key, &local_key, remote, local)
                };

                let mut props = PropertyMap::new();
                props.insert("protocol".to_string(), "CDP".into());
                props.insert("neighbor_ip".to_string(), cdp.neighbor_ip.as_str().into());
                props.insert("local_status".to_string(), src.status.as_str().into());
                props.insert("local_protocol".to_string(), src.protocol.as_str().into());
                props.insert("remote_status".to_string(), dst.status.as_str().into());
                props.insert("remote_protocol".to_string(), dst.protocol.as_str().into());
                props.insert("snapshot_id".to_string(), snapshot_id.into());

                store.upsert_relationship(
                    "CONNECTED_TO",
                    ("Interface", src_key.as_str()),
                    ("Interface", dst_key.as_str()),
                    props,
                )?;
                summary.cdp_links += 1;
            }
        }
        Ok(())
    }

    fn link_ospf<B: GraphBackend>(
        &self,
        store: &mut B,
        snapshot_id: &str,
        bundles: &[FactBundle],
        device_by_ip: &FxHashMap<&str, &str>,
        summary: &mut IngestionSummary,
    ) -> IngestResult<()> {
        for bundle in bundles {
            for ospf in &bundle.ospf_neighbors {
                let Some(neighbor_hostname) = device_by_ip.get(ospf.address.as_str()) else {
                    // Unresolvable neighbors are dropped, never stored as
                    // placeholder devices.
                    summary.skipped_ospf += 1;
                    continue;
                };

                let mut props = PropertyMap::new();
                props.insert("neighbor_id".to_string(), ospf.neighbor_id.as_str().into());
                props.insert("state".to_string(), ospf.state.as_str().into());
                props.insert("priority".to_string(), ospf.priority.as_str().into());
                props.insert("dead_time".to_string(), ospf.dead_time.as_str().into());
                props.insert("local_interface".to_string(), ospf.interface.as_str().into());
                props.insert("neighbor_address".to_string(), ospf.address.as_str().into());
                props.insert("snapshot_id".to_string(), snapshot_id.into());

                store.upsert_relationship(
                    "OSPF_NEIGHBOR",
                    ("Device", bundle.hostname.as_str()),
                    ("Device", neighbor_hostname),
                    props,
                )?;
                summary.ospf_links += 1;
            }
        }
        Ok(())
    }
}

pub fn interface_key(hostname: &str, interface: &str) -> String {
    format!("{}:{}", hostname, interface)
}

fn to_json_blob<S: serde::Serialize>(value: &S) -> PropertyValue {
    PropertyValue::String(serde_json::to_string(value).unwrap_or_else(|_| "null".to_string()))
}

/// Interface lookup over the current batch, keyed by (hostname, name).
fn interface_lookup(
    bundles: &[FactBundle],
) -> FxHashMap<(&str, &str), &crate::model::InterfaceRecord> {
    let mut map = FxHashMap::default();
    for bundle in bundles {
        for iface in &bundle.interfaces {
            map.insert(
                (bundle.hostname.as_str(), iface.interface.as_str()),
                iface,
            );
        }
    }
    map
}

/// Self-reported management address → hostname, over the current batch.
fn ip_lookup(bundles: &[FactBundle]) -> FxHashMap<&str, &str> {
    let mut map = FxHashMap::default();
    for bundle in bundles {
        if !bundle.ip_address.is_empty() {
            map.insert(bundle.ip_address.as_str(), bundle.hostname.as_str());
        }
    }
    map
}

fn parse_snapshot_timestamp(snapshot_id: &str) -> Option<i64> {
    let parsed = chrono::NaiveDateTime::parse_from_str(snapshot_id, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(snapshot_id, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    Some(parsed.and_utc().timestamp_millis())
}
