//! # drspec-storage
//!
//! Embedded columnar persistence layer (C5-C7, C12): connection
//! management, schema migrations, and the artifact/contract/queue/
//! dependency/learning repository, adapted from the teacher's
//! `DatabaseManager` + `DriftStorageEngine` pattern from `rusqlite` to
//! `duckdb`.

pub mod connection;
pub mod models;
pub mod repository;
mod schema;

pub use connection::DatabaseManager;
pub use repository::artifacts::NewArtifact;
pub use repository::contracts::SubmittedContract;
pub use repository::findings::NewFinding;
pub use repository::learning::{FunctionRollup, LearningTotals, NewLearningEvent};
pub use repository::Repository;
