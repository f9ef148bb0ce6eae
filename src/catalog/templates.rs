//! The fixed query template set
//!
//! Descriptions and keywords double as the material the intent classifier
//! selects from; params list what must be extracted from the question.

use super::CatalogError;
use crate::graph::GraphQuery;
use std::collections::HashMap;

/// One named, parameterized query template.
#[derive(Debug, Clone, Copy)]
pub struct QueryTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub keywords: &'static [&'static str],
    pub params: &'static [&'static str],
}

pub static TEMPLATES: &[QueryTemplate] = &[
    QueryTemplate {
        name: "list_devices",
        description: "List all devices in the network with their hostname, type, and IP address",
        keywords: &["all devices", "show devices", "list devices", "devices"],
        params: &[],
    },
    QueryTemplate {
        name: "count_interfaces",
        description: "Count interfaces per device to see interface distribution",
        keywords: &["count interfaces", "interface count", "how many interfaces"],
        params: &[],
    },
    QueryTemplate {
        name: "show_topology",
        description: "Show complete physical topology with all CDP links as edges",
        keywords: &["topology", "cdp topology", "physical topology", "network map", "show links"],
        params: &[],
    },
    QueryTemplate {
        name: "find_down_interfaces",
        description: "Find all interfaces that are down or not operational",
        keywords: &[
            "down interfaces",
            "interfaces down",
            "not up",
            "offline interfaces",
            "failed interfaces",
        ],
        params: &[],
    },
    QueryTemplate {
        name: "show_ospf_neighbors",
        description: "Show all OSPF neighbor relationships across all devices",
        keywords: &["ospf neighbors", "ospf", "routing neighbors", "all ospf"],
        params: &[],
    },
    QueryTemplate {
        name: "show_up_interfaces",
        description: "Show all interfaces that are up and operational across all devices",
        keywords: &[
            "up interfaces",
            "interfaces up",
            "operational interfaces",
            "active interfaces",
        ],
        params: &[],
    },
    QueryTemplate {
        name: "show_up_interfaces_device",
        description: "Show interfaces that are up for a specific device",
        keywords: &[
            "up interfaces for",
            "operational interfaces on",
            "active interfaces for",
        ],
        params: &["device"],
    },
    QueryTemplate {
        name: "show_interfaces_connected_device",
        description: "Show all interfaces connected to a specific device",
        keywords: &["interfaces connected to", "connections to", "what's connected to"],
        params: &["device"],
    },
    QueryTemplate {
        name: "show_cdp_neighbors_device",
        description: "Show CDP neighbors for a specific device",
        keywords: &["cdp neighbors for", "cdp on", "physical neighbors of"],
        params: &["device"],
    },
    QueryTemplate {
        name: "show_ospf_neighbors_device",
        description: "Show OSPF neighbors for a specific device",
        keywords: &["ospf neighbors for", "ospf on", "routing neighbors of"],
        params: &["device"],
    },
    QueryTemplate {
        name: "show_shortest_path",
        description: "Show one shortest path between two devices (fastest)",
        keywords: &["path between", "route between", "one path", "single path"],
        params: &["device1", "device2"],
    },
    QueryTemplate {
        name: "show_all_paths",
        description: "Show all shortest paths between two devices",
        keywords: &["paths between", "all paths", "all routes", "how to reach"],
        params: &["device1", "device2"],
    },
    QueryTemplate {
        name: "show_neighbors_one_hop",
        description: "Show all neighbors for a device (one hop away)",
        keywords: &[
            "neighbors of",
            "neighbors for",
            "what is connected to",
            "adjacent to",
        ],
        params: &["device"],
    },
];

pub fn find(name: &str) -> Option<&'static QueryTemplate> {
    TEMPLATES.iter().find(|t| t.name == name)
}

/// Build the structured query body for a template, validating that every
/// required parameter is present.
pub fn build_query(
    template: &QueryTemplate,
    params: &HashMap<String, String>,
) -> Result<GraphQuery, CatalogError> {
    let require = |name: &str| -> Result<String, CatalogError> {
        params
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| CatalogError::MissingParameter {
                template: template.name.to_string(),
                param: name.to_string(),
            })
    };

    let query = match template.name {
        "list_devices" => GraphQuery::Devices,
        "count_interfaces" => GraphQuery::InterfaceCounts,
        "show_topology" => GraphQuery::Topology,
        "find_down_interfaces" => GraphQuery::InterfacesByStatus {
            device: None,
            up: false,
        },
        "show_ospf_neighbors" => GraphQuery::OspfAdjacencies { device: None },
        "show_up_interfaces" => GraphQuery::InterfacesByStatus {
            device: None,
            up: true,
        },
        "show_up_interfaces_device" => GraphQuery::InterfacesByStatus {
            device: Some(require("device")?),
            up: true,
        },
        "show_interfaces_connected_device" => GraphQuery::ConnectedInterfaces {
            device: require("device")?,
            cdp_only: false,
        },
        "show_cdp_neighbors_device" => GraphQuery::ConnectedInterfaces {
            device: require("device")?,
            cdp_only: true,
        },
        "show_ospf_neighbors_device" => GraphQuery::OspfAdjacencies {
            device: Some(require("device")?),
        },
        "show_shortest_path" => GraphQuery::ShortestPaths {
            from: require("device1")?,
            to: require("device2")?,
            all: false,
        },
        "show_all_paths" => GraphQuery::ShortestPaths {
            from: require("device1")?,
            to: require("device2")?,
            all: true,
        },
        "show_neighbors_one_hop" => GraphQuery::DeviceNeighbors {
            device: require("device")?,
        },
        other => return Err(CatalogError::UnknownTemplate(other.to_string())),
    };
    Ok(query)
}
