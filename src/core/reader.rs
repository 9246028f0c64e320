//! Result stream reader
//!
//! Turns the raw byte stream from the device into result records. Each line
//! is classified in order:
//! 1. blank: ignored
//! 2. starts with the termination marker: stop reading
//! 3. starts with a decimal digit: parsed as a record
//! 4. anything else: device diagnostics, echoed only
//!
//! A digit-led line that fails to parse is kept as a [`MalformedLine`]
//! warning and the loop carries on.

use super::record::{RecordError, TestRecord};
use super::transport::{TransportError, TransportTrait};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Sentinel the firmware prints once every test has reported
pub const DEFAULT_TERMINATION_MARKER: &str = "✅ All tests";

/// Command that kicks off the on-device test run
pub const DEFAULT_START_COMMAND: &str = "start\n";

/// Time the board needs to come out of reset after the port opens
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

const DEVICE_TARGET: &str = "hiltest::device";

/// Reader configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Line prefix that ends the run
    pub termination_marker: String,
    /// Bytes written once to start the run
    pub start_command: String,
    /// Delay between opening the link and sending the start command
    pub settle_delay: Duration,
    /// Overall limit for the read loop (None = wait forever)
    pub max_duration: Option<Duration>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            termination_marker: DEFAULT_TERMINATION_MARKER.to_string(),
            start_command: DEFAULT_START_COMMAND.to_string(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            max_duration: None,
        }
    }
}

/// Reader errors
#[derive(Error, Debug)]
pub enum ReadError {
    /// Link failed mid-run
    #[error("device link error: {0}")]
    Link(#[from] TransportError),

    /// Termination marker not seen in time
    #[error("no termination marker after {}s ({records} records received)", limit.as_secs_f64())]
    Timeout {
        /// Configured limit
        limit: Duration,
        /// Records collected before giving up
        records: usize,
    },
}

/// How the read loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEnd {
    /// Termination marker seen
    Terminated,
    /// Device closed the stream first
    Closed,
}

/// A digit-led line that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedLine {
    /// One-based line number in the device stream
    pub line_number: usize,
    /// Line text as received
    pub raw: String,
    /// Parse failure
    pub reason: String,
}

/// Classification of a single device line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace only
    Blank,
    /// Termination marker
    Terminator,
    /// Parsed result record
    Record(TestRecord),
    /// Digit-led line that failed to parse
    Malformed(RecordError),
    /// Free-form device output
    Diagnostic,
}

/// Classify one line (already trimmed or not)
pub fn classify_line(line: &str, termination_marker: &str) -> LineKind {
    let line = line.trim();

    if line.is_empty() {
        return LineKind::Blank;
    }
    if line.starts_with(termination_marker) {
        return LineKind::Terminator;
    }
    if line.starts_with(|c: char| c.is_ascii_digit()) {
        return match TestRecord::parse(line) {
            Ok(record) => LineKind::Record(record),
            Err(e) => LineKind::Malformed(e),
        };
    }
    LineKind::Diagnostic
}

/// Splits a chunked byte stream into lines
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: Vec<u8>,
}

impl LineAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Pop the next complete line, without its terminator
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }

    /// Take whatever is left once the stream has ended
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut rest = std::mem::take(&mut self.buffer);
        if rest.last() == Some(&b'\r') {
            rest.pop();
        }
        Some(rest)
    }
}

/// Accumulates records line by line until the termination marker
#[derive(Debug)]
pub struct ResultCollector {
    marker: String,
    records: Vec<TestRecord>,
    malformed: Vec<MalformedLine>,
    lines_seen: usize,
    terminated: bool,
}

impl ResultCollector {
    /// Create a collector watching for `termination_marker`
    pub fn new(termination_marker: impl Into<String>) -> Self {
        Self {
            marker: termination_marker.into(),
            records: Vec::new(),
            malformed: Vec::new(),
            lines_seen: 0,
            terminated: false,
        }
    }

    /// Feed one raw line. Returns true once the termination marker is seen;
    /// lines fed after that are ignored.
    pub fn feed(&mut self, raw: &[u8]) -> bool {
        if self.terminated {
            return true;
        }
        self.lines_seen += 1;

        match std::str::from_utf8(raw) {
            Ok(line) => self.feed_str(line),
            Err(_) => {
                let text = String::from_utf8_lossy(raw);
                let text = text.trim();
                if text.starts_with(|c: char| c.is_ascii_digit()) {
                    tracing::warn!(target: DEVICE_TARGET, line_number = self.lines_seen, hex = %hex::encode(raw), "Corrupt result line: {text}");
                    self.malformed.push(MalformedLine {
                        line_number: self.lines_seen,
                        raw: text.to_string(),
                        reason: "invalid UTF-8".to_string(),
                    });
                } else {
                    tracing::info!(target: DEVICE_TARGET, hex = %hex::encode(raw), "Undecodable device line");
                }
                false
            }
        }
    }

    fn feed_str(&mut self, line: &str) -> bool {
        let line = line.trim();

        match classify_line(line, &self.marker) {
            LineKind::Blank => {}
            LineKind::Terminator => {
                tracing::info!(target: DEVICE_TARGET, "{line}");
                self.terminated = true;
            }
            LineKind::Record(record) => {
                tracing::info!(target: DEVICE_TARGET, "{line}");
                self.records.push(record);
            }
            LineKind::Malformed(e) => {
                tracing::warn!(target: DEVICE_TARGET, line_number = self.lines_seen, error = %e, "Malformed result line: {line}");
                self.malformed.push(MalformedLine {
                    line_number: self.lines_seen,
                    raw: line.to_string(),
                    reason: e.to_string(),
                });
            }
            LineKind::Diagnostic => {
                tracing::info!(target: DEVICE_TARGET, "{line}");
            }
        }

        self.terminated
    }

    /// Termination marker seen?
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Records collected so far
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    /// Freeze the collected results
    pub fn finish(self, end: StreamEnd) -> ReadOutcome {
        ReadOutcome {
            records: self.records,
            malformed: self.malformed,
            end,
            lines_seen: self.lines_seen,
        }
    }
}

/// Everything observed by one read loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Parsed records in arrival order
    pub records: Vec<TestRecord>,
    /// Digit-led lines that failed to parse
    pub malformed: Vec<MalformedLine>,
    /// Why the loop stopped
    pub end: StreamEnd,
    /// Lines read, blank ones included
    pub lines_seen: usize,
}

/// Let the device settle, then send the start command
pub async fn start_device(
    link: &mut dyn TransportTrait,
    config: &ReaderConfig,
) -> Result<(), TransportError> {
    if !config.settle_delay.is_zero() {
        tracing::debug!(delay_ms = config.settle_delay.as_millis() as u64, "Waiting for device reset");
        tokio::time::sleep(config.settle_delay).await;
    }

    link.send(config.start_command.as_bytes()).await?;
    tracing::info!("Listening for test results on {}", link.connection_info());
    Ok(())
}

/// Read lines until the termination marker, stream closure or timeout
pub async fn read_results(
    link: &mut dyn TransportTrait,
    config: &ReaderConfig,
) -> Result<ReadOutcome, ReadError> {
    let started = Instant::now();
    let mut assembler = LineAssembler::new();
    let mut collector = ResultCollector::new(config.termination_marker.as_str());

    loop {
        if let Some(limit) = config.max_duration {
            if started.elapsed() >= limit {
                return Err(ReadError::Timeout {
                    limit,
                    records: collector.records().len(),
                });
            }
        }

        let chunk = match link.receive().await {
            Ok(chunk) => chunk,
            Err(TransportError::Disconnected) => {
                if assembler.finish().is_some_and(|rest| collector.feed(&rest)) {
                    return Ok(collector.finish(StreamEnd::Terminated));
                }
                tracing::warn!("Device closed the stream before the termination marker");
                return Ok(collector.finish(StreamEnd::Closed));
            }
            Err(e) => return Err(ReadError::Link(e)),
        };

        if chunk.is_empty() {
            tokio::task::yield_now().await;
            continue;
        }

        assembler.push(&chunk);
        while let Some(line) = assembler.next_line() {
            if collector.feed(&line) {
                return Ok(collector.finish(StreamEnd::Terminated));
            }
        }
    }
}
