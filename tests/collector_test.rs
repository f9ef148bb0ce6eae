use async_trait::async_trait;
use nettopo::collector::{collect_fleet, CollectorSettings, DeviceDescriptor, DeviceFactCollector};
use nettopo::model::DeviceType;
use nettopo::transport::{DeviceTransport, TransportError, TransportResult};
use std::collections::HashMap;
use std::time::Duration;

const INTERFACE_BRIEF: &str = "\
Interface                  IP-Address      OK? Method Status                Protocol
GigabitEthernet0/0         10.0.0.1        YES NVRAM  up                    up
GigabitEthernet0/1         unassigned      YES NVRAM  up                    up
R1#";

const CDP_DETAIL: &str = "\
-------------------------
Device ID: SW1.lab.local
Entry address(es):
  IP address: 10.0.0.2
Platform: Cisco 3725,  Capabilities: Switch IGMP
Interface: GigabitEthernet0/0,  Port ID (outgoing port): GigabitEthernet0/1
R1#";

const OSPF_NEIGHBORS: &str = "\
Neighbor ID     Pri   State           Dead Time   Address         Interface
2.2.2.2           1   FULL/DR         00:00:33    10.0.0.2        GigabitEthernet0/0
R1#";

const VLAN_BRIEF: &str = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
1    default                          active    Gi0/0
10   MANAGEMENT                       active
SW1#";

const TRUNKS: &str = "\
Port        Mode             Encapsulation  Status        Native vlan
Gi0/1       on               802.1q         trunking      1

Port        Vlans allowed on trunk
Gi0/1       10
SW1#";

const MAC_TABLE: &str = "\
Vlan    Mac Address       Type        Ports
----    -----------       --------    -----
  10    0cb8.63c3.0002    DYNAMIC     Gi0/1
Total Mac Addresses for this criterion: 1
SW1#";

const STP_SUMMARY: &str = "\
Switch is in rapid-pvst mode
Root bridge for: VLAN0010
Name                   Blocking Listening Learning Forwarding STP Active
---------------------- -------- --------- -------- ---------- ----------
VLAN0010                     0         0        0          3          3
SW1#";

const OSPF_REJECTED: &str = "\
              ^
% Invalid input detected at '^' marker.
SW1#";

/// Scripted transport: canned output per command, with optional failures.
struct MockTransport {
    responses: HashMap<&'static str, String>,
    fail_connect: bool,
    fail_commands: Vec<&'static str>,
    connected: bool,
    commands_seen: Vec<String>,
}

impl MockTransport {
    fn new(responses: HashMap<&'static str, String>) -> Self {
        MockTransport {
            responses,
            fail_connect: false,
            fail_commands: Vec::new(),
            connected: false,
            commands_seen: Vec::new(),
        }
    }

    fn router() -> Self {
        Self::new(HashMap::from([
            ("show ip interface brief", INTERFACE_BRIEF.to_string()),
            ("show cdp neighbors detail", CDP_DETAIL.to_string()),
            ("show ip ospf neighbor", OSPF_NEIGHBORS.to_string()),
        ]))
    }

    fn l2_switch() -> Self {
        Self::new(HashMap::from([
            ("show ip interface brief", INTERFACE_BRIEF.to_string()),
            ("show cdp neighbors detail", CDP_DETAIL.to_string()),
            ("show vlan brief", VLAN_BRIEF.to_string()),
            ("show interfaces trunk", TRUNKS.to_string()),
            ("show mac address-table", MAC_TABLE.to_string()),
            ("show spanning-tree summary", STP_SUMMARY.to_string()),
            ("show ip ospf neighbor", OSPF_REJECTED.to_string()),
        ]))
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    async fn connect(&mut self) -> TransportResult<()> {
        if self.fail_connect {
            return Err(TransportError::ConnectionFailed {
                host: "mock".to_string(),
                reason: "refused".to_string(),
            });
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> TransportResult<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn send_show_command(&mut self, command: &str) -> TransportResult<String> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.commands_seen.push(command.to_string());
        if self.fail_commands.contains(&command) {
            return Err(TransportError::CommandFailed {
                command: command.to_string(),
                reason: "boom".to_string(),
            });
        }
        self.responses
            .get(command)
            .cloned()
            .ok_or_else(|| TransportError::CommandFailed {
                command: command.to_string(),
                reason: "no scripted output".to_string(),
            })
    }

    async fn send_config_set(&mut self, _commands: &[String]) -> TransportResult<String> {
        Err(TransportError::CommandFailed {
            command: "config".to_string(),
            reason: "read-only mock".to_string(),
        })
    }
}

fn fast_settings() -> CollectorSettings {
    CollectorSettings {
        inter_command_pause: Duration::from_millis(0),
        command_timeout: Duration::from_secs(5),
    }
}

fn descriptor(hostname: &str, device_type: DeviceType, ip: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        hostname: hostname.to_string(),
        device_type,
        ip_address: ip.to_string(),
    }
}

#[tokio::test]
async fn router_bundle_has_all_router_facts() {
    let mut collector = DeviceFactCollector::with_settings(MockTransport::router(), fast_settings());
    let bundle = collector
        .collect(&descriptor("R1", DeviceType::Router, "10.0.0.1"))
        .await
        .unwrap();

    assert_eq!(bundle.hostname, "R1");
    assert_eq!(bundle.device_type, DeviceType::Router);
    assert_eq!(bundle.interfaces.len(), 2);
    assert_eq!(bundle.cdp_neighbors.len(), 1);
    assert_eq!(bundle.cdp_neighbors[0].neighbor_device, "SW1.lab.local");
    assert_eq!(bundle.ospf_neighbors.len(), 1);
    assert!(bundle.vlans.is_empty());
    assert!(bundle.spanning_tree.is_none());
}

#[tokio::test]
async fn l2_switch_ospf_failure_degrades_to_empty() {
    let mut transport = MockTransport::l2_switch();
    transport.fail_commands.push("show ip ospf neighbor");
    let mut collector = DeviceFactCollector::with_settings(transport, fast_settings());

    let bundle = collector
        .collect(&descriptor("SW1", DeviceType::Switch, "10.0.0.2"))
        .await
        .unwrap();

    // the failed optional command is just "zero neighbors"
    assert!(bundle.ospf_neighbors.is_empty());
    assert_eq!(bundle.vlans.len(), 2);
    assert_eq!(bundle.trunks.len(), 1);
    assert_eq!(bundle.mac_addresses.len(), 1);
    let stp = bundle.spanning_tree.unwrap();
    assert_eq!(stp.config.mode.as_deref(), Some("rapid-pvst"));
    assert_eq!(stp.vlan_stats.len(), 1);
}

#[tokio::test]
async fn switch_with_rejected_ospf_command_parses_to_empty() {
    // the command succeeds at the transport level but the device rejects
    // it; the parser sees no header and returns no rows
    let mut collector =
        DeviceFactCollector::with_settings(MockTransport::l2_switch(), fast_settings());
    let bundle = collector
        .collect(&descriptor("SW1", DeviceType::Switch, "10.0.0.2"))
        .await
        .unwrap();
    assert!(bundle.ospf_neighbors.is_empty());
}

#[tokio::test]
async fn required_command_failure_aborts_the_device() {
    let mut transport = MockTransport::router();
    transport.fail_commands.push("show cdp neighbors detail");
    let mut collector = DeviceFactCollector::with_settings(transport, fast_settings());

    let result = collector
        .collect(&descriptor("R1", DeviceType::Router, "10.0.0.1"))
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn fleet_run_isolates_failing_devices() {
    let devices = vec![
        descriptor("R1", DeviceType::Router, "10.0.0.1"),
        descriptor("DEAD-SW", DeviceType::Switch, "10.0.0.9"),
        descriptor("SW1", DeviceType::Switch, "10.0.0.2"),
    ];

    let capture = collect_fleet(&devices, fast_settings(), |d| {
        if d.hostname == "DEAD-SW" {
            let mut t = MockTransport::l2_switch();
            t.fail_connect = true;
            t
        } else if d.device_type == DeviceType::Router {
            MockTransport::router()
        } else {
            MockTransport::l2_switch()
        }
    })
    .await;

    assert_eq!(capture.snapshot.devices.len(), 2);
    assert_eq!(capture.failed.len(), 1);
    assert_eq!(capture.failed[0].hostname, "DEAD-SW");
    // partial snapshots are detectable by comparing counts
    assert_ne!(capture.snapshot.devices.len(), devices.len());
    assert!(!capture.snapshot.snapshot_id.is_empty());
}

#[tokio::test]
async fn snapshot_file_round_trips() {
    let devices = vec![descriptor("R1", DeviceType::Router, "10.0.0.1")];
    let capture = collect_fleet(&devices, fast_settings(), |_| MockTransport::router()).await;

    let dir = tempfile::tempdir().unwrap();
    let path = nettopo::collector::write_snapshot(dir.path(), &capture.snapshot).unwrap();
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("network_"));

    let raw = std::fs::read_to_string(&path).unwrap();
    let loaded: nettopo::model::NetworkSnapshot = serde_json::from_str(&raw).unwrap();
    assert_eq!(loaded, capture.snapshot);
}
