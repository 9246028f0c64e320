//! Core module containing the harness engine
//!
//! This module provides:
//! - Transport layer for the device link (serial, capture replay)
//! - Result records and the expectation table loader
//! - Result stream reader (line classification, termination detection)
//! - Verifier (positional or by-id pairing)
//! - Badge reporter (shields.io endpoint documents)
//! - Run orchestration

pub mod badge;
pub mod expectation;
pub mod reader;
pub mod record;
pub mod runner;
pub mod transport;
pub mod verifier;
