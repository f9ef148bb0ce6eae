//! Parsers for the concrete show-command outputs
//!
//! Each parser degrades to an empty result when its table is absent from
//! the output; callers treat that as "no data on this device", never as a
//! failure.

use super::{is_noise, is_prompt, scan_rows, TableSpec};
use crate::model::{
    CdpNeighborRecord, InterfaceRecord, MacTableEntry, OspfNeighborRecord, SpanningTreeSummary,
    StpConfig, StpVlanStats, TrunkRecord, VlanRecord,
};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

// ----------------------------------------------------------------------
// show ip interface brief
// ----------------------------------------------------------------------

static INTERFACE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<interface>\S+)\s+(?P<ip_address>\S+)\s+(?P<ok>\S+)\s+(?P<method>\S+)\s+(?P<status>.+?)\s+(?P<protocol>\S+)\s*$",
    )
    .unwrap()
});

static INTERFACE_SPEC: TableSpec = TableSpec {
    header: |l| l.trim_start().starts_with("Interface") && l.contains("IP-Address"),
    separator: false,
    stop_prefix: None,
    stop_on_blank_run: None,
    row: &INTERFACE_ROW,
};

pub fn parse_interface_brief(raw: &str) -> Vec<InterfaceRecord> {
    scan_rows(raw, &INTERFACE_SPEC)
        .into_iter()
        .map(|c| InterfaceRecord {
            interface: c["interface"].to_string(),
            ip_address: c["ip_address"].to_string(),
            ok: c["ok"].to_string(),
            method: c["method"].to_string(),
            status: c["status"].trim().to_string(),
            protocol: c["protocol"].to_string(),
        })
        .collect()
}

// ----------------------------------------------------------------------
// show ip ospf neighbor
// ----------------------------------------------------------------------

static OSPF_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<neighbor_id>\d+\.\d+\.\d+\.\d+)\s+(?P<priority>\d+)\s+(?P<state>\S+)\s+(?P<dead_time>\S+)\s+(?P<address>\d+\.\d+\.\d+\.\d+)\s+(?P<interface>\S+)\s*$",
    )
    .unwrap()
});

static OSPF_SPEC: TableSpec = TableSpec {
    header: |l| l.contains("Neighbor ID") && l.contains("State"),
    separator: false,
    stop_prefix: None,
    stop_on_blank_run: None,
    row: &OSPF_ROW,
};

pub fn parse_ospf_neighbors(raw: &str) -> Vec<OspfNeighborRecord> {
    scan_rows(raw, &OSPF_SPEC)
        .into_iter()
        .map(|c| OspfNeighborRecord {
            neighbor_id: c["neighbor_id"].to_string(),
            priority: c["priority"].to_string(),
            state: c["state"].to_string(),
            dead_time: c["dead_time"].to_string(),
            address: c["address"].to_string(),
            interface: c["interface"].to_string(),
        })
        .collect()
}

// ----------------------------------------------------------------------
// show vlan brief
// ----------------------------------------------------------------------

static VLAN_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<vlan_id>\d+)\s+(?P<name>\S+)\s+(?P<status>\S+)\s*(?P<ports>.*)$").unwrap()
});

static VLAN_SPEC: TableSpec = TableSpec {
    header: |l| l.trim_start().starts_with("VLAN") && l.contains("Name"),
    separator: true,
    stop_prefix: None,
    stop_on_blank_run: None,
    row: &VLAN_ROW,
};

pub fn parse_vlan_brief(raw: &str) -> Vec<VlanRecord> {
    scan_rows(raw, &VLAN_SPEC)
        .into_iter()
        .map(|c| VlanRecord {
            vlan_id: c["vlan_id"].to_string(),
            name: c["name"].to_string(),
            status: c["status"].to_string(),
            ports: c["ports"].trim().to_string(),
        })
        .collect()
}

// ----------------------------------------------------------------------
// show mac address-table
// ----------------------------------------------------------------------

static MAC_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<vlan>\d+)\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+(?P<type>\S+)\s+(?P<port>\S+)\s*$",
    )
    .unwrap()
});

static MAC_SPEC: TableSpec = TableSpec {
    header: |l| l.contains("Vlan") && l.contains("Mac Address") && l.contains("Type"),
    separator: true,
    stop_prefix: Some("Total"),
    stop_on_blank_run: None,
    row: &MAC_ROW,
};

pub fn parse_mac_table(raw: &str) -> Vec<MacTableEntry> {
    scan_rows(raw, &MAC_SPEC)
        .into_iter()
        .map(|c| MacTableEntry {
            vlan: c["vlan"].to_string(),
            mac_address: c["mac"].to_string(),
            entry_type: c["type"].to_string(),
            port: c["port"].to_string(),
        })
        .collect()
}

// ----------------------------------------------------------------------
// show cdp neighbors detail
// ----------------------------------------------------------------------
//
// Not a table: a sequence of record blocks, separated by dash runs or the
// next "Device ID:" banner, each holding labelled fields.

static CDP_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{20,}").unwrap());
static CDP_DEVICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Device ID:\s*(\S+)").unwrap());
static CDP_IP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"IP address:\s*(\d+\.\d+\.\d+\.\d+)").unwrap());
static CDP_PLATFORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Platform:\s*([^,]+),\s*Capabilities:\s*(.+)").unwrap());
static CDP_INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Interface:\s*(\S+),\s*Port ID \(outgoing port\):\s*(\S+)").unwrap()
});

pub fn parse_cdp_neighbors(raw: &str) -> Vec<CdpNeighborRecord> {
    let mut neighbors = Vec::new();

    for chunk in CDP_SEPARATOR.split(raw) {
        // One chunk may still hold several entries back to back.
        let starts: Vec<usize> = chunk.match_indices("Device ID:").map(|(i, _)| i).collect();
        for (n, start) in starts.iter().enumerate() {
            let end = starts.get(n + 1).copied().unwrap_or(chunk.len());
            let entry = &chunk[*start..end];

            let Some(device) = CDP_DEVICE.captures(entry) else {
                continue;
            };
            let Some(iface) = CDP_INTERFACE.captures(entry) else {
                continue;
            };

            let mut record = CdpNeighborRecord {
                neighbor_device: device[1].to_string(),
                neighbor_ip: String::new(),
                platform: String::new(),
                capabilities: String::new(),
                local_interface: iface[1].to_string(),
                neighbor_interface: iface[2].to_string(),
            };
            if let Some(ip) = CDP_IP.captures(entry) {
                record.neighbor_ip = ip[1].to_string();
            }
            if let Some(platform) = CDP_PLATFORM.captures(entry) {
                record.platform = platform[1].trim().to_string();
                record.capabilities = platform[2].trim().to_string();
            }
            neighbors.push(record);
        }
    }

    neighbors
}

// ----------------------------------------------------------------------
// show interfaces trunk
// ----------------------------------------------------------------------
//
// Sectioned output: four banners introduce per-port rows that each fill in
// a different slice of the same trunk record. A port may first appear in
// any section.

#[derive(Clone, Copy, PartialEq)]
enum TrunkSection {
    Config,
    Allowed,
    Active,
    Forwarding,
}

static TRUNK_CONFIG_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<port>\S+)\s+(?P<mode>\S+)\s+(?P<encapsulation>\S+)\s+(?P<status>\S+)\s+(?P<native_vlan>\S+)\s*$",
    )
    .unwrap()
});
static TRUNK_VLAN_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<port>\S+)\s+(?P<vlans>.*)$").unwrap());

pub fn parse_trunk_interfaces(raw: &str) -> Vec<TrunkRecord> {
    let mut records: IndexMap<String, TrunkRecord> = IndexMap::new();
    let mut section: Option<TrunkSection> = None;

    for line in raw.lines() {
        let stripped = line.trim();

        if stripped.contains("Mode") && stripped.contains("Encapsulation") {
            section = Some(TrunkSection::Config);
            continue;
        } else if stripped.contains("Vlans allowed and active") {
            section = Some(TrunkSection::Active);
            continue;
        } else if stripped.contains("Vlans allowed on trunk") {
            section = Some(TrunkSection::Allowed);
            continue;
        } else if stripped.contains("spanning tree forwarding state") {
            section = Some(TrunkSection::Forwarding);
            continue;
        }

        if stripped.is_empty() || stripped.starts_with('-') || is_prompt(stripped) {
            continue;
        }
        if is_noise(stripped) || stripped.starts_with("Port") {
            continue;
        }

        match section {
            Some(TrunkSection::Config) => {
                if let Some(caps) = TRUNK_CONFIG_ROW.captures(line) {
                    let port = caps["port"].to_string();
                    let record = records.entry(port.clone()).or_insert_with(|| TrunkRecord {
                        port,
                        ..TrunkRecord::default()
                    });
                    record.mode = caps["mode"].to_string();
                    record.encapsulation = caps["encapsulation"].to_string();
                    record.status = caps["status"].to_string();
                    record.native_vlan = caps["native_vlan"].to_string();
                }
            }
            Some(current) => {
                if let Some(caps) = TRUNK_VLAN_ROW.captures(line) {
                    let port = caps["port"].to_string();
                    let vlans = caps["vlans"].trim().to_string();
                    let record = records.entry(port.clone()).or_insert_with(|| TrunkRecord {
                        port,
                        ..TrunkRecord::default()
                    });
                    match current {
                        TrunkSection::Allowed => record.vlans_allowed = vlans,
                        TrunkSection::Active => record.vlans_active = vlans,
                        TrunkSection::Forwarding => record.vlans_forwarding = vlans,
                        TrunkSection::Config => unreachable!(),
                    }
                }
            }
            None => {}
        }
    }

    records.into_values().collect()
}

// ----------------------------------------------------------------------
// show spanning-tree summary
// ----------------------------------------------------------------------
//
// A run of labelled configuration lines followed by a per-VLAN statistics
// table.

static STP_CONFIG_PATTERNS: LazyLock<Vec<(Regex, fn(&mut StpConfig, String))>> =
    LazyLock::new(|| {
        vec![
            (Regex::new(r"Switch is in (\S+) mode").unwrap(), |c, v| {
                c.mode = Some(v)
            }),
            (Regex::new(r"Root bridge for:\s+(.+)").unwrap(), |c, v| {
                c.root_bridge_for = Some(v.trim().to_string())
            }),
            (Regex::new(r"Extended system ID\s+is (\S+)").unwrap(), |c, v| {
                c.extended_system_id = Some(v)
            }),
            (Regex::new(r"Portfast Default\s+is (\S+)").unwrap(), |c, v| {
                c.portfast_default = Some(v)
            }),
            (
                Regex::new(r"Portfast Edge BPDU Guard Default\s+is (\S+)").unwrap(),
                |c, v| c.portfast_bpdu_guard = Some(v),
            ),
            (
                Regex::new(r"Portfast Edge BPDU Filter Default\s+is (\S+)").unwrap(),
                |c, v| c.portfast_bpdu_filter = Some(v),
            ),
            (Regex::new(r"Loopguard Default\s+is (\S+)").unwrap(), |c, v| {
                c.loopguard = Some(v)
            }),
            (Regex::new(r"Bridge Assurance\s+is (\S+)").unwrap(), |c, v| {
                c.bridge_assurance = Some(v)
            }),
            (
                Regex::new(r"EtherChannel misconfig guard\s+is (\S+)").unwrap(),
                |c, v| c.etherchannel_misconfig_guard = Some(v),
            ),
            (
                Regex::new(r"Configured Pathcost method used is (\S+)").unwrap(),
                |c, v| c.pathcost_method = Some(v),
            ),
            (Regex::new(r"UplinkFast\s+is (\S+)").unwrap(), |c, v| {
                c.uplinkfast = Some(v)
            }),
            (Regex::new(r"BackboneFast\s+is (\S+)").unwrap(), |c, v| {
                c.backbonefast = Some(v)
            }),
        ]
    });

static STP_STATS_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<vlan>VLAN\d+)\s+(?P<blocking>\d+)\s+(?P<listening>\d+)\s+(?P<learning>\d+)\s+(?P<forwarding>\d+)\s+(?P<stp_active>\d+)\s*$",
    )
    .unwrap()
});

pub fn parse_spanning_tree(raw: &str) -> SpanningTreeSummary {
    let mut summary = SpanningTreeSummary::default();
    let mut in_table = false;

    'lines: for line in raw.lines() {
        let stripped = line.trim();

        if stripped.is_empty() || is_prompt(stripped) || is_noise(stripped) {
            continue;
        }

        for (pattern, set) in STP_CONFIG_PATTERNS.iter() {
            if let Some(caps) = pattern.captures(line) {
                set(&mut summary.config, caps[1].to_string());
                continue 'lines;
            }
        }

        if line.contains("Blocking") && line.contains("Listening") && line.contains("Learning") {
            in_table = true;
            continue;
        }
        if stripped.starts_with("----") {
            continue;
        }
        // Trailing totals line, e.g. "2 vlans"
        if stripped.to_lowercase().contains("vlans") && !stripped.starts_with("VLAN") {
            continue;
        }

        if in_table {
            if let Some(caps) = STP_STATS_ROW.captures(line) {
                summary.vlan_stats.push(StpVlanStats {
                    vlan: caps["vlan"].to_string(),
                    blocking: caps["blocking"].to_string(),
                    listening: caps["listening"].to_string(),
                    learning: caps["learning"].to_string(),
                    forwarding: caps["forwarding"].to_string(),
                    stp_active: caps["stp_active"].to_string(),
                });
            }
        }
    }

    summary
}
