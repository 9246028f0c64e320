//! Replay transport
//!
//! Plays back a captured device log as though the device were sending it.
//! Output is delivered in fixed-size chunks so line reassembly is exercised
//! the same way a serial port exercises it.

use super::{TransportError, TransportStats, TransportTrait, TransportType};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::path::PathBuf;

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Source of the captured output
    pub source: ReplaySource,
    /// Bytes handed out per `receive` call
    pub chunk_size: usize,
}

/// Where replayed bytes come from
#[derive(Debug, Clone)]
pub enum ReplaySource {
    /// Capture file on disk
    File(PathBuf),
    /// In-memory capture
    Memory(Bytes),
}

impl ReplayConfig {
    /// Replay a capture file
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: ReplaySource::File(path.into()),
            chunk_size: 64,
        }
    }

    /// Replay in-memory bytes
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            source: ReplaySource::Memory(data.into()),
            chunk_size: 64,
        }
    }

    /// Set chunk size (minimum 1)
    #[must_use]
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }
}

/// Replay transport
pub struct ReplayTransport {
    config: ReplayConfig,
    pending: Option<BytesMut>,
    sent: Vec<u8>,
    stats: TransportStats,
}

impl ReplayTransport {
    /// Create a new replay transport
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            config,
            pending: None,
            sent: Vec::new(),
            stats: TransportStats::default(),
        }
    }

    /// Bytes written by the harness so far
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }
}

#[async_trait]
impl TransportTrait for ReplayTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        let data = match &self.config.source {
            ReplaySource::File(path) => {
                let raw = tokio::fs::read(path).await.map_err(|e| {
                    TransportError::ConnectionFailed(format!("{}: {}", path.display(), e))
                })?;
                Bytes::from(raw)
            }
            ReplaySource::Memory(data) => data.clone(),
        };

        self.pending = Some(BytesMut::from(&data[..]));
        self.stats = TransportStats::default();
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.pending = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.pending.is_some()
    }

    async fn send(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if self.pending.is_none() {
            return Err(TransportError::NotConnected);
        }
        self.sent.extend_from_slice(data);
        self.stats.bytes_sent += data.len() as u64;
        Ok(data.len())
    }

    async fn receive(&mut self) -> Result<Bytes, TransportError> {
        let pending = self.pending.as_mut().ok_or(TransportError::NotConnected)?;
        if pending.is_empty() {
            return Err(TransportError::Disconnected);
        }

        let take = self.config.chunk_size.min(pending.len());
        let chunk = pending.split_to(take).freeze();
        self.stats.bytes_received += chunk.len() as u64;
        self.stats.reads += 1;
        Ok(chunk)
    }

    fn transport_type(&self) -> TransportType {
        TransportType::Replay
    }

    fn connection_info(&self) -> String {
        match &self.config.source {
            ReplaySource::File(path) => format!("replay of {}", path.display()),
            ReplaySource::Memory(data) => format!("replay of {} in-memory bytes", data.len()),
        }
    }

    fn stats(&self) -> TransportStats {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_chunks_then_disconnects() {
        let mut transport =
            ReplayTransport::new(ReplayConfig::from_bytes(&b"abcdef"[..]).chunk_size(4));
        transport.connect().await.unwrap();

        assert_eq!(&transport.receive().await.unwrap()[..], b"abcd");
        assert_eq!(&transport.receive().await.unwrap()[..], b"ef");
        assert!(matches!(transport.receive().await, Err(TransportError::Disconnected)));
        assert_eq!(transport.stats().bytes_received, 6);
    }

    #[tokio::test]
    async fn test_records_sent_bytes() {
        let mut transport = ReplayTransport::new(ReplayConfig::from_bytes(Bytes::new()));
        assert!(matches!(transport.send(b"start\n").await, Err(TransportError::NotConnected)));

        transport.connect().await.unwrap();
        transport.send(b"start\n").await.unwrap();
        assert_eq!(transport.sent(), b"start\n");
    }

    #[tokio::test]
    async fn test_missing_capture_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut transport =
            ReplayTransport::new(ReplayConfig::from_file(dir.path().join("capture.log")));
        assert!(matches!(
            transport.connect().await,
            Err(TransportError::ConnectionFailed(_))
        ));
    }
}
