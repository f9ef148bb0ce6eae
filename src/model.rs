//! Fact records, fact bundles, and snapshot documents
//!
//! These are the structured records the parsers produce and the unit the
//! ingestion engine consumes. `NetworkSnapshot` is also the on-disk fact
//! bundle file format the snapshot registry loads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Device role, which selects the command plan used during collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Router,
    Switch,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Router => "router",
            DeviceType::Switch => "switch",
        }
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, DeviceType::Switch)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of `show ip interface brief`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub interface: String,
    pub ip_address: String,
    pub ok: String,
    pub method: String,
    pub status: String,
    pub protocol: String,
}

/// One entry of `show cdp neighbors detail`.
///
/// An entry is only kept when the device id and both interface names were
/// extracted; address/platform details are best-effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdpNeighborRecord {
    pub neighbor_device: String,
    #[serde(default)]
    pub neighbor_ip: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub capabilities: String,
    pub local_interface: String,
    pub neighbor_interface: String,
}

/// One row of `show ip ospf neighbor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OspfNeighborRecord {
    pub neighbor_id: String,
    pub priority: String,
    pub state: String,
    pub dead_time: String,
    pub address: String,
    pub interface: String,
}

/// One row of `show vlan brief`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VlanRecord {
    pub vlan_id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub ports: String,
}

/// One trunk port assembled from the sections of `show interfaces trunk`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrunkRecord {
    pub port: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub encapsulation: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub native_vlan: String,
    #[serde(default)]
    pub vlans_allowed: String,
    #[serde(default)]
    pub vlans_active: String,
    #[serde(default)]
    pub vlans_forwarding: String,
}

/// One row of `show mac address-table`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacTableEntry {
    pub vlan: String,
    pub mac_address: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub port: String,
}

/// Global settings section of `show spanning-tree summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StpConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_bridge_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_system_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfast_default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfast_bpdu_guard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfast_bpdu_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loopguard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_assurance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etherchannel_misconfig_guard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pathcost_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uplinkfast: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backbonefast: Option<String>,
}

/// Per-VLAN port-state counters from `show spanning-tree summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StpVlanStats {
    pub vlan: String,
    pub blocking: String,
    pub listening: String,
    pub learning: String,
    pub forwarding: String,
    pub stp_active: String,
}

/// Parsed spanning-tree summary: configuration plus per-VLAN statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanningTreeSummary {
    pub config: StpConfig,
    pub vlan_stats: Vec<StpVlanStats>,
}

/// Everything one device reported during a snapshot run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactBundle {
    pub hostname: String,
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    #[serde(default)]
    pub ip_address: String,
    pub interfaces: Vec<InterfaceRecord>,
    pub cdp_neighbors: Vec<CdpNeighborRecord>,
    #[serde(default)]
    pub ospf_neighbors: Vec<OspfNeighborRecord>,
    #[serde(default)]
    pub vlans: Vec<VlanRecord>,
    #[serde(default)]
    pub trunks: Vec<TrunkRecord>,
    #[serde(default)]
    pub mac_addresses: Vec<MacTableEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spanning_tree: Option<SpanningTreeSummary>,
}

impl FactBundle {
    pub fn new(hostname: impl Into<String>, device_type: DeviceType, ip_address: impl Into<String>) -> Self {
        FactBundle {
            hostname: hostname.into(),
            device_type,
            ip_address: ip_address.into(),
            interfaces: Vec::new(),
            cdp_neighbors: Vec::new(),
            ospf_neighbors: Vec::new(),
            vlans: Vec::new(),
            trunks: Vec::new(),
            mac_addresses: Vec::new(),
            spanning_tree: None,
        }
    }
}

/// A fleet-wide capture: one snapshot id, one fact bundle per device.
///
/// This is the fact-bundle file format produced by collection and consumed
/// by the snapshot registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub snapshot_id: String,
    pub devices: Vec<FactBundle>,
}

impl NetworkSnapshot {
    /// On-disk file name: colons are not filename-safe everywhere, so the
    /// snapshot id is stored with them replaced by dashes.
    pub fn file_name(&self) -> String {
        format!("network_{}.json", self.snapshot_id.replace(':', "-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_serde() {
        assert_eq!(serde_json::to_string(&DeviceType::Router).unwrap(), "\"router\"");
        let t: DeviceType = serde_json::from_str("\"switch\"").unwrap();
        assert!(t.is_switch());
    }

    #[test]
    fn test_bundle_document_shape() {
        let json = r#"{
            "snapshot_id": "2024-01-01T00:00:00",
            "devices": [{
                "hostname": "EDGE-R1",
                "type": "router",
                "ip_address": "10.0.0.1",
                "interfaces": [{
                    "interface": "GigabitEthernet0/0",
                    "ip_address": "10.0.0.1",
                    "ok": "YES",
                    "method": "NVRAM",
                    "status": "up",
                    "protocol": "up"
                }],
                "cdp_neighbors": [],
                "ospf_neighbors": []
            }]
        }"#;

        let snap: NetworkSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.devices.len(), 1);
        assert_eq!(snap.devices[0].device_type, DeviceType::Router);
        assert!(snap.devices[0].vlans.is_empty());
        assert_eq!(snap.file_name(), "network_2024-01-01T00-00-00.json");
    }

    #[test]
    fn test_mac_entry_type_field_name() {
        let entry = MacTableEntry {
            vlan: "10".to_string(),
            mac_address: "0cb8.63c3.0002".to_string(),
            entry_type: "DYNAMIC".to_string(),
            port: "Gi0/1".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "DYNAMIC");
    }
}
