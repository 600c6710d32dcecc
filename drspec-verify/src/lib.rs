//! # drspec-verify
//!
//! The Verification Runner (C10, §4.10): launches a contract-derived
//! check script in an isolated, time-boxed subprocess and reports its
//! verdict.

pub mod runner;

pub use runner::{run_verification, VerificationOutcome, VerificationRequest, DEFAULT_TIMEOUT};
