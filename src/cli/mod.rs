//! CLI Module
//!
//! Provides command-line support:
//! - Exit codes for CI automation
//! - Run summary rendering

pub mod exit_codes;
pub mod summary;

pub use exit_codes::{exit_code_description, print_exit_codes, ExitCodes};
pub use summary::{format_outcome, OutputFormat};
