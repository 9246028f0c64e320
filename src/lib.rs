//! # Hiltest Core Library
//!
//! Hardware-in-the-loop test harness. Starts the self-test firmware on a
//! device attached over serial, collects the result lines it prints, checks
//! them against a table of expected values and publishes status badges.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hiltest_core::{create_transport, HarnessConfig, TestRun, Transport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = HarnessConfig::load_default()?;
//!     let mut link = create_transport(Transport::Serial(config.serial_config()));
//!
//!     let outcome = TestRun::from_config(&config).execute(link.as_mut()).await?;
//!     println!(
//!         "{}/{} tests passed",
//!         outcome.summary.passed_count, outcome.summary.total_count
//!     );
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod core;

// Re-exports for convenience
pub use crate::cli::{ExitCodes, OutputFormat};
pub use crate::config::{ConfigError, HarnessConfig};
pub use crate::core::badge::{Badge, BadgeColor, BadgeReport, BadgeReporter, NamedBadge};
pub use crate::core::expectation::{load_expectations, parse_expectations, ExpectationError};
pub use crate::core::reader::{
    classify_line, LineKind, MalformedLine, ReadOutcome, ReaderConfig, ResultCollector, StreamEnd,
};
pub use crate::core::record::{RecordError, TestRecord};
pub use crate::core::runner::{RunError, RunOutcome, TestRun};
pub use crate::core::transport::{
    create_transport, ReplayConfig, SerialConfig, Transport, TransportError, TransportTrait,
};
pub use crate::core::verifier::{verify, PairingMode, RunSummary, VerificationOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
