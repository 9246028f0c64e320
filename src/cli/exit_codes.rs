//! CLI Exit Codes
//!
//! Exit codes for CI pipelines driving the harness.

use crate::config::ConfigError;
use crate::core::expectation::ExpectationError;
use crate::core::runner::{RunError, RunOutcome};
use crate::core::transport::TransportError;
use std::process::ExitCode;

/// Exit code constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCodes;

impl ExitCodes {
    /// Every test passed, every badge written
    pub const SUCCESS: u8 = 0;

    /// Run completed but at least one test failed
    pub const TESTS_FAILED: u8 = 1;

    /// Invalid arguments
    pub const INVALID_ARGS: u8 = 2;

    /// Device link could not be opened or broke mid-run
    pub const CONNECTION_FAILED: u8 = 3;

    /// Termination marker never arrived
    pub const TIMEOUT: u8 = 4;

    /// Serial port does not exist
    pub const PORT_NOT_FOUND: u8 = 5;

    /// Expectation table missing or unreadable
    pub const FILE_NOT_FOUND: u8 = 6;

    /// Permission denied on the port
    pub const PERMISSION_DENIED: u8 = 7;

    /// Configuration error
    pub const CONFIG_ERROR: u8 = 8;

    /// Expectation table has an unparseable row or a repeated test id
    pub const VALIDATION_FAILED: u8 = 17;

    /// One or more badges could not be written
    pub const BADGE_WRITE_FAILED: u8 = 18;

    /// Internal error
    pub const INTERNAL_ERROR: u8 = 127;
}

/// Exit code for a fatal run error
pub fn run_error_code(err: &RunError) -> u8 {
    match err {
        RunError::Expectations(ExpectationError::SourceUnavailable { .. }) => ExitCodes::FILE_NOT_FOUND,
        RunError::Expectations(
            ExpectationError::MalformedInput { .. } | ExpectationError::DuplicateId { .. },
        ) => ExitCodes::VALIDATION_FAILED,
        RunError::ConnectionFailure(TransportError::PortNotFound(_)) => ExitCodes::PORT_NOT_FOUND,
        RunError::ConnectionFailure(TransportError::PermissionDenied(_)) => {
            ExitCodes::PERMISSION_DENIED
        }
        RunError::ConnectionFailure(_) | RunError::Link(_) => ExitCodes::CONNECTION_FAILED,
        RunError::Timeout { .. } => ExitCodes::TIMEOUT,
    }
}

/// Exit code for a configuration error
pub fn config_error_code(_err: &ConfigError) -> u8 {
    ExitCodes::CONFIG_ERROR
}

/// Exit code for a completed run.
///
/// A badge write failure outranks test failures: the published state is stale.
pub fn outcome_code(outcome: &RunOutcome) -> u8 {
    if !outcome.badges.is_complete() {
        ExitCodes::BADGE_WRITE_FAILED
    } else if !outcome.summary.all_passed() {
        ExitCodes::TESTS_FAILED
    } else {
        ExitCodes::SUCCESS
    }
}

/// Convert to a process exit code
pub fn to_exit_code(code: u8) -> ExitCode {
    ExitCode::from(code)
}

/// Exit code description
pub fn exit_code_description(code: u8) -> &'static str {
    match code {
        0 => "Success",
        1 => "Tests failed",
        2 => "Invalid arguments",
        3 => "Connection failed",
        4 => "Run timed out",
        5 => "Port not found",
        6 => "Expectation file not found",
        7 => "Permission denied",
        8 => "Configuration error",
        17 => "Invalid expectation table",
        18 => "Badge write failed",
        127 => "Internal error",
        _ => "Unknown error",
    }
}

/// Print exit code table
pub fn print_exit_codes() {
    println!("Exit Codes:");
    for code in [0, 1, 2, 3, 4, 5, 6, 7, 8, 17, 18, 127] {
        println!("  {:>3}  {}", code, exit_code_description(code));
    }
}
