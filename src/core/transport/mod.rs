//! Transport layer for the device link
//!
//! Supports:
//! - Serial ports (USB-Serial dev boards, RS-232)
//! - Replay of a captured device log, for re-checking a recorded run offline

mod replay;
mod serial;

pub use replay::{ReplayConfig, ReplaySource, ReplayTransport};
pub use serial::{list_ports, SerialConfig, SerialTransport};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Transport selection
#[derive(Debug, Clone)]
pub enum Transport {
    /// Serial port connection
    Serial(SerialConfig),
    /// Captured device output played back from a file
    Replay(ReplayConfig),
}

/// Transport type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    /// Serial port
    Serial,
    /// Replayed capture
    Replay,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => write!(f, "Serial"),
            Self::Replay => write!(f, "Replay"),
        }
    }
}

/// Transport error types
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Not connected
    #[error("Not connected")]
    NotConnected,

    /// Remote end went away
    #[error("Disconnected")]
    Disconnected,
}

/// Link statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportStats {
    /// Bytes sent
    pub bytes_sent: u64,
    /// Bytes received
    pub bytes_received: u64,
    /// Reads that returned data
    pub reads: u64,
    /// Reads that timed out empty
    pub idle_reads: u64,
}

/// Byte link to the device under test
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransportTrait: Send + Sync {
    /// Open the link
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Close the link; safe to call when already closed
    async fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send data
    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Receive the next chunk.
    ///
    /// Waits at most the link's per-read timeout. An empty chunk means nothing
    /// arrived in time; `Disconnected` means the stream has ended.
    async fn receive(&mut self) -> Result<Bytes, TransportError>;

    /// Get transport type
    fn transport_type(&self) -> TransportType;

    /// Get connection info string
    fn connection_info(&self) -> String;

    /// Get statistics
    fn stats(&self) -> TransportStats;
}

/// Create a transport instance from configuration
pub fn create_transport(config: Transport) -> Box<dyn TransportTrait> {
    match config {
        Transport::Serial(cfg) => Box::new(SerialTransport::new(cfg)),
        Transport::Replay(cfg) => Box::new(ReplayTransport::new(cfg)),
    }
}
