//! YAML configuration loading
//!
//! One file describes the device inventory, the snapshots directory, and
//! the optional classifier backend.

use crate::classify::ClassifierConfig;
use crate::collector::DeviceDescriptor;
use crate::model::DeviceType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file access failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Transport credentials for one device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub enable_secret: Option<String>,
}

/// One inventoried device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub mgmt_ip: String,
    pub mgmt_port: u16,
    /// The device's own management address; OSPF neighbor resolution
    /// matches reported neighbor addresses against this.
    #[serde(default)]
    pub ip_address: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

fn default_enabled() -> bool {
    true
}

fn default_snapshots_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Devices keyed by hostname, in inventory order.
    pub devices: IndexMap<String, DeviceConfig>,
    #[serde(default = "default_snapshots_dir")]
    pub snapshots_dir: PathBuf,
    #[serde(default)]
    pub classifier: Option<ClassifierConfig>,
}

impl AppConfig {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Descriptors for every enabled device, in inventory order.
    pub fn descriptors(&self) -> Vec<DeviceDescriptor> {
        self.devices
            .iter()
            .filter(|(_, d)| d.enabled)
            .map(|(hostname, d)| DeviceDescriptor {
                hostname: hostname.clone(),
                device_type: d.device_type,
                ip_address: d.ip_address.clone(),
            })
            .collect()
    }

    /// All inventoried hostnames, for classifier prompts and parameter
    /// extraction.
    pub fn device_names(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }
}
