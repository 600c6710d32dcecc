//! # drspec-core
//!
//! Foundation crate for the drspec indexing and state engine.
//! Types, errors, config, and the response envelope. Every other crate
//! in the workspace depends on this.

pub mod config;
pub mod envelope;
pub mod errors;
pub mod types;

pub use config::DrspecConfig;
pub use envelope::DrspecResponse;
pub use errors::error_code::DrspecErrorCode;
pub use types::{
    AgentTag, ArtifactStatus, ConfidenceLevel, Criticality, FindingKind, FindingStatus,
    FunctionId, Language, OnFail, QueueReason, QueueStatus, Significance,
};
