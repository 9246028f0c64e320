//! Test run orchestration
//!
//! load expectations -> open link -> start device -> read results ->
//! close link -> verify -> publish badges
//!
//! Any fatal error stops the run before badges are written, so a broken run
//! can never publish a stale "pass".

use super::badge::{BadgeReport, BadgeReporter};
use super::expectation::{load_expectations, ExpectationError};
use super::reader::{read_results, start_device, ReadError, ReadOutcome, ReaderConfig, StreamEnd};
use super::transport::{TransportError, TransportStats, TransportTrait, TransportType};
use super::verifier::{verify, PairingMode, RunSummary};
use crate::config::HarnessConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Fatal run errors
#[derive(Error, Debug)]
pub enum RunError {
    /// Expectation table missing or malformed
    #[error(transparent)]
    Expectations(#[from] ExpectationError),

    /// Device link could not be opened
    #[error("cannot open device link: {0}")]
    ConnectionFailure(#[source] TransportError),

    /// Device link failed after it was opened
    #[error("device link failed: {0}")]
    Link(#[source] TransportError),

    /// Termination marker never arrived
    #[error("run timed out after {}s with {records} records received", limit.as_secs_f64())]
    Timeout {
        /// Configured limit
        limit: Duration,
        /// Records received before the timeout
        records: usize,
    },
}

impl From<ReadError> for RunError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Link(e) => Self::Link(e),
            ReadError::Timeout { limit, records } => Self::Timeout { limit, records },
        }
    }
}

/// Result of a completed run
#[derive(Debug)]
pub struct RunOutcome {
    /// Verification result
    pub summary: RunSummary,
    /// Badge publication result
    pub badges: BadgeReport,
    /// How the read loop ended
    pub end: StreamEnd,
    /// Device lines read
    pub lines_seen: usize,
    /// Link the results came from
    pub transport: TransportType,
    /// Link statistics at the end of the run
    pub link_stats: TransportStats,
}

impl RunOutcome {
    /// All tests passed and every badge was written?
    pub fn is_success(&self) -> bool {
        self.summary.all_passed() && self.badges.is_complete()
    }

    /// Machine-readable report of this run
    pub fn report(&self) -> RunReport<'_> {
        RunReport {
            generated_at: Utc::now(),
            end: self.end,
            lines_seen: self.lines_seen,
            transport: self.transport,
            link: &self.link_stats,
            summary: &self.summary,
            badges_written: &self.badges.written,
            badge_failures: self.badges.failures.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Serializable run report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport<'a> {
    /// Report creation time
    pub generated_at: DateTime<Utc>,
    /// How the read loop ended
    pub end: StreamEnd,
    /// Device lines read
    pub lines_seen: usize,
    /// Link the results came from
    pub transport: TransportType,
    /// Link statistics
    pub link: &'a TransportStats,
    /// Verification result
    pub summary: &'a RunSummary,
    /// Badge files written
    pub badges_written: &'a [PathBuf],
    /// Badge write errors
    pub badge_failures: Vec<String>,
}

impl RunReport<'_> {
    /// Write the report as pretty JSON
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::from)?;
        std::fs::write(path, json)
    }
}

/// A configured test run
#[derive(Debug, Clone)]
pub struct TestRun {
    expectations: PathBuf,
    reader: ReaderConfig,
    pairing: PairingMode,
    reporter: BadgeReporter,
}

impl TestRun {
    /// Create a run from its parts
    pub fn new(
        expectations: impl Into<PathBuf>,
        reader: ReaderConfig,
        pairing: PairingMode,
        reporter: BadgeReporter,
    ) -> Self {
        Self {
            expectations: expectations.into(),
            reader,
            pairing,
            reporter,
        }
    }

    /// Create a run from harness configuration
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(
            &config.expectations.path,
            config.reader_config(),
            config.run.pairing,
            config.badge_reporter(),
        )
    }

    /// Execute the full pipeline against `link`
    pub async fn execute(&self, link: &mut dyn TransportTrait) -> Result<RunOutcome, RunError> {
        let expected = load_expectations(&self.expectations)?;
        tracing::info!(tests = expected.len(), path = %self.expectations.display(), "Expectations loaded");

        link.connect().await.map_err(RunError::ConnectionFailure)?;
        let transport = link.transport_type();
        tracing::info!(%transport, "Connected to {}", link.connection_info());

        let collected = collect(&mut *link, &self.reader).await;
        let link_stats = link.stats();
        tracing::debug!(
            bytes = link_stats.bytes_received,
            reads = link_stats.reads,
            idle = link_stats.idle_reads,
            "Link statistics"
        );
        if let Err(e) = link.disconnect().await {
            tracing::warn!(error = %e, "Error closing device link");
        }
        let collected = collected?;

        let summary =
            verify(&collected.records, &expected, self.pairing).with_malformed(collected.malformed);
        log_outcomes(&summary);

        let badges = self.reporter.publish(&summary);
        tracing::info!(
            written = badges.written.len(),
            failed = badges.failures.len(),
            dir = %self.reporter.output_dir().display(),
            "Badges published"
        );

        Ok(RunOutcome {
            summary,
            badges,
            end: collected.end,
            lines_seen: collected.lines_seen,
            transport,
            link_stats,
        })
    }
}

async fn collect(
    link: &mut dyn TransportTrait,
    reader: &ReaderConfig,
) -> Result<ReadOutcome, RunError> {
    start_device(link, reader).await.map_err(RunError::Link)?;
    Ok(read_results(link, reader).await?)
}

fn log_outcomes(summary: &RunSummary) {
    for outcome in &summary.outcomes {
        if outcome.passed {
            tracing::info!(test = outcome.test_id, "PASS");
        } else {
            tracing::warn!(
                test = outcome.test_id,
                got = ?outcome.actual.values(),
                expected = ?outcome.expected.values(),
                "FAIL"
            );
        }
    }
    for id in &summary.missing {
        tracing::warn!(test = id, "No result received");
    }
    if !summary.unexpected.is_empty() {
        tracing::warn!(count = summary.unexpected.len(), "Results with no matching expectation");
    }
    if !summary.malformed.is_empty() {
        tracing::warn!(count = summary.malformed.len(), "Malformed result lines were skipped");
    }
}
