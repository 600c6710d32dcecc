//! # drspec-analysis
//!
//! Function extraction engine: scanner, parsers, hasher, hint extractor,
//! dependency graph, confidence model, and diff & pattern miner (C1-C4,
//! C8, C9, C11).

pub mod confidence;
pub mod diff;
pub mod graph;
pub mod hasher;
pub mod hints;
pub mod parsers;
pub mod scanner;

pub use hasher::code_hash;
pub use hints::{extract_hints, Hint};
pub use scanner::{Scanner, ScanOutcome, ScannedFunction};
