//! Device transport contract
//!
//! Opening a session against a real device (SSH, telnet, console server)
//! is an external concern; the collector only needs this narrow surface.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a device transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("not connected to device")]
    NotConnected,

    #[error("connection to {host} failed: {reason}")]
    ConnectionFailed { host: String, reason: String },

    #[error("command {command:?} failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("command {command:?} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },
}

pub type TransportResult<T> = Result<T, TransportError>;

/// One command session against one device.
///
/// Implementations must keep a device's session single-threaded; the
/// collector drives commands strictly in sequence.
#[async_trait]
pub trait DeviceTransport: Send {
    async fn connect(&mut self) -> TransportResult<()>;

    async fn disconnect(&mut self) -> TransportResult<()>;

    fn is_connected(&self) -> bool;

    /// Execute a read-only show command and return its raw output.
    async fn send_show_command(&mut self, command: &str) -> TransportResult<String>;

    /// Apply configuration commands and return the combined output.
    async fn send_config_set(&mut self, commands: &[String]) -> TransportResult<String>;
}
