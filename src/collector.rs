//! Per-device fact collection
//!
//! Runs the fixed show-command sequence for a device's type against a
//! transport session and assembles a [`FactBundle`]. Device-type behavior
//! is a capability-keyed command plan, not inheritance: each type maps to
//! an ordered list of (command, parse step) pairs, and a switch
//! additionally attempts an OSPF query that may not exist on the platform.

use crate::model::{DeviceType, FactBundle, NetworkSnapshot};
use crate::parse::tables;
use crate::transport::{DeviceTransport, TransportError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced during collection
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("snapshot write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encode failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CollectorResult<T> = Result<T, CollectorError>;

/// Identity of one device to collect from.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub hostname: String,
    pub device_type: DeviceType,
    /// The device's own management address, as inventoried. This is what
    /// OSPF neighbor resolution matches against during ingestion.
    pub ip_address: String,
}

/// Which bundle field a command's parsed output lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    Interfaces,
    CdpNeighbors,
    OspfNeighbors,
    Vlans,
    Trunks,
    MacTable,
    SpanningTree,
}

/// One step of a device-type command plan.
#[derive(Debug, Clone, Copy)]
pub struct CommandStep {
    pub command: &'static str,
    pub kind: FactKind,
    /// A non-required step that fails degrades to empty output instead of
    /// aborting the device (L2 switches reject OSPF commands).
    pub required: bool,
}

const fn step(command: &'static str, kind: FactKind) -> CommandStep {
    CommandStep {
        command,
        kind,
        required: true,
    }
}

const ROUTER_PLAN: &[CommandStep] = &[
    step("show ip interface brief", FactKind::Interfaces),
    step("show cdp neighbors detail", FactKind::CdpNeighbors),
    step("show ip ospf neighbor", FactKind::OspfNeighbors),
];

const SWITCH_PLAN: &[CommandStep] = &[
    step("show ip interface brief", FactKind::Interfaces),
    step("show cdp neighbors detail", FactKind::CdpNeighbors),
    step("show vlan brief", FactKind::Vlans),
    step("show interfaces trunk", FactKind::Trunks),
    step("show mac address-table", FactKind::MacTable),
    step("show spanning-tree summary", FactKind::SpanningTree),
    CommandStep {
        command: "show ip ospf neighbor",
        kind: FactKind::OspfNeighbors,
        required: false,
    },
];

/// The ordered command plan for a device type.
pub fn command_plan(device_type: DeviceType) -> &'static [CommandStep] {
    match device_type {
        DeviceType::Router => ROUTER_PLAN,
        DeviceType::Switch => SWITCH_PLAN,
    }
}

/// Collection pacing and timeouts.
#[derive(Debug, Clone, Copy)]
pub struct CollectorSettings {
    /// Pause between commands on the same device. A deliberate throttle
    /// for slow or emulated control planes, not a correctness requirement.
    pub inter_command_pause: Duration,
    pub command_timeout: Duration,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        CollectorSettings {
            inter_command_pause: Duration::from_secs(2),
            command_timeout: Duration::from_secs(60),
        }
    }
}

/// Collects one device's facts over a transport session.
pub struct DeviceFactCollector<T: DeviceTransport> {
    transport: T,
    settings: CollectorSettings,
}

impl<T: DeviceTransport> DeviceFactCollector<T> {
    pub fn new(transport: T) -> Self {
        Self::with_settings(transport, CollectorSettings::default())
    }

    pub fn with_settings(transport: T, settings: CollectorSettings) -> Self {
        DeviceFactCollector {
            transport,
            settings,
        }
    }

    /// Run the device's command plan and return its fact bundle.
    ///
    /// The session is released on both success and failure.
    pub async fn collect(&mut self, descriptor: &DeviceDescriptor) -> CollectorResult<FactBundle> {
        info!(
            "collecting {} ({})",
            descriptor.hostname, descriptor.device_type
        );
        self.transport.connect().await?;

        let result = self.run_plan(descriptor).await;

        if let Err(e) = self.transport.disconnect().await {
            warn!("disconnect from {} failed: {}", descriptor.hostname, e);
        }
        result
    }

    async fn run_plan(&mut self, descriptor: &DeviceDescriptor) -> CollectorResult<FactBundle> {
        let mut bundle = FactBundle::new(
            &descriptor.hostname,
            descriptor.device_type,
            &descriptor.ip_address,
        );

        for (i, cmd) in command_plan(descriptor.device_type).iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settings.inter_command_pause).await;
            }

            let raw = match self.run_command(cmd.command).await {
                Ok(raw) => raw,
                Err(e) if !cmd.required => {
                    debug!(
                        "{}: optional command {:?} failed ({}), treating as empty",
                        descriptor.hostname, cmd.command, e
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match cmd.kind {
                FactKind::Interfaces => bundle.interfaces = tables::parse_interface_brief(&raw),
                FactKind::CdpNeighbors => bundle.cdp_neighbors = tables::parse_cdp_neighbors(&raw),
                FactKind::OspfNeighbors => {
                    bundle.ospf_neighbors = tables::parse_ospf_neighbors(&raw)
                }
                FactKind::Vlans => bundle.vlans = tables::parse_vlan_brief(&raw),
                FactKind::Trunks => bundle.trunks = tables::parse_trunk_interfaces(&raw),
                FactKind::MacTable => bundle.mac_addresses = tables::parse_mac_table(&raw),
                FactKind::SpanningTree => {
                    bundle.spanning_tree = Some(tables::parse_spanning_tree(&raw))
                }
            }
        }

        debug!(
            "{}: {} interfaces, {} cdp neighbors, {} ospf neighbors",
            descriptor.hostname,
            bundle.interfaces.len(),
            bundle.cdp_neighbors.len(),
            bundle.ospf_neighbors.len()
        );
        Ok(bundle)
    }

    async fn run_command(&mut self, command: &str) -> Result<String, TransportError> {
        match tokio::time::timeout(
            self.settings.command_timeout,
            self.transport.send_show_command(command),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout {
                command: command.to_string(),
                seconds: self.settings.command_timeout.as_secs(),
            }),
        }
    }
}

/// A device that could not be collected during a fleet run.
#[derive(Debug, Clone)]
pub struct FailedDevice {
    pub hostname: String,
    pub error: String,
}

/// Result of a fleet-wide collection run: a (possibly partial) snapshot
/// plus the devices that failed.
#[derive(Debug)]
pub struct FleetCapture {
    pub snapshot: NetworkSnapshot,
    pub failed: Vec<FailedDevice>,
}

/// Collect every device in sequence under a single snapshot id.
///
/// One device failing aborts only that device; the run proceeds and the
/// capture records which devices are missing. Each device gets a fresh
/// transport session; sessions never overlap.
pub async fn collect_fleet<T, F>(
    devices: &[DeviceDescriptor],
    settings: CollectorSettings,
    mut make_transport: F,
) -> FleetCapture
where
    T: DeviceTransport,
    F: FnMut(&DeviceDescriptor) -> T,
{
    let snapshot_id = chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string();
    info!("fleet collection started, snapshot {}", snapshot_id);

    let mut snapshot = NetworkSnapshot {
        snapshot_id,
        devices: Vec::new(),
    };
    let mut failed = Vec::new();

    for descriptor in devices {
        let mut collector = DeviceFactCollector::with_settings(make_transport(descriptor), settings);
        match collector.collect(descriptor).await {
            Ok(bundle) => snapshot.devices.push(bundle),
            Err(e) => {
                warn!("collection failed for {}: {}", descriptor.hostname, e);
                failed.push(FailedDevice {
                    hostname: descriptor.hostname.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "fleet collection finished: {} collected, {} failed",
        snapshot.devices.len(),
        failed.len()
    );
    FleetCapture { snapshot, failed }
}

/// Write a snapshot document into the capturable-snapshots directory.
pub fn write_snapshot(dir: &Path, snapshot: &NetworkSnapshot) -> CollectorResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(snapshot.file_name());
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(&path, json)?;
    info!("snapshot written to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_plan_order() {
        let plan = command_plan(DeviceType::Router);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].kind, FactKind::Interfaces);
        assert_eq!(plan[1].kind, FactKind::CdpNeighbors);
        assert_eq!(plan[2].kind, FactKind::OspfNeighbors);
        assert!(plan.iter().all(|s| s.required));
    }

    #[test]
    fn test_switch_plan_ospf_is_optional() {
        let plan = command_plan(DeviceType::Switch);
        let ospf = plan
            .iter()
            .find(|s| s.kind == FactKind::OspfNeighbors)
            .unwrap();
        assert!(!ospf.required);
        // everything else must succeed
        assert!(plan
            .iter()
            .filter(|s| s.kind != FactKind::OspfNeighbors)
            .all(|s| s.required));
    }
}
