//! Per-concern error enums and the `DrspecErrorCode` mapping to §6's
//! SCREAMING_SNAKE_CASE error codes, following the teacher's
//! `DriftErrorCode` trait pattern (one impl per error enum, matched to a
//! `&'static str` code constant).

pub mod error_code;

use crate::types::function_id::FunctionIdError;
pub use error_code::DrspecErrorCode;

/// Errors from the Store / Repository layer (C5, C6, C7).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database not initialized at {path}")]
    NotInitialized { path: String },

    #[error("database error: {message}")]
    Db { message: String },

    #[error("database busy (another process holds the write lock)")]
    DbBusy,

    #[error("function not found: {0}")]
    FunctionNotFound(String),

    #[error("contract not found for: {0}")]
    ContractNotFound(String),

    #[error("queue item not found: {0}")]
    QueueItemNotFound(String),

    #[error("queue is empty")]
    QueueEmpty,

    #[error("invalid function id: {0}")]
    InvalidFunctionId(#[from] FunctionIdError),

    #[error("invalid reason: {0}")]
    InvalidReason(String),

    #[error("integrity error in contract upsert: {0}")]
    Integrity(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DrspecErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotInitialized { .. } => error_code::DB_NOT_INITIALIZED,
            Self::FunctionNotFound(_) => error_code::FUNCTION_NOT_FOUND,
            Self::ContractNotFound(_) => error_code::CONTRACT_NOT_FOUND,
            Self::QueueItemNotFound(_) => error_code::QUEUE_ITEM_NOT_FOUND,
            Self::QueueEmpty => error_code::QUEUE_EMPTY,
            Self::InvalidFunctionId(_) => error_code::INVALID_FUNCTION_ID,
            Self::InvalidReason(_) => error_code::VALIDATION_ERROR,
            Self::Integrity(_) => error_code::INTERNAL_ERROR,
            Self::Db { .. } | Self::DbBusy | Self::Internal(_) => error_code::INTERNAL_ERROR,
        }
    }
}

/// Errors from the Scanner (C3).
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("scan error: {0}")]
    Other(String),
}

impl DrspecErrorCode for ScanError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::PathNotFound(_) => error_code::PATH_NOT_FOUND,
            Self::Other(_) => error_code::SCAN_ERROR,
        }
    }
}

/// Errors from a single-file parse (C2). Collected per-file; never aborts
/// a directory scan (§7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported language for extension: {extension}")]
    UnsupportedLanguage { extension: String },

    #[error("source is not valid UTF-8")]
    InvalidUtf8,

    #[error("parse error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

impl DrspecErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        error_code::SCAN_ERROR
    }
}

/// Errors validating or decoding a contract document (§6).
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("invalid contract JSON: {0}")]
    InvalidJson(String),

    #[error("invalid contract schema: {0}")]
    InvalidSchema(String),
}

impl DrspecErrorCode for ContractError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => error_code::INVALID_JSON,
            Self::InvalidSchema(_) => error_code::INVALID_SCHEMA,
        }
    }
}

/// Errors from the Verification Runner (C10).
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("verification script exited non-zero: {stderr}")]
    ExecutionError { stderr: String },

    #[error("verification timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("verification output did not parse as the expected JSON shape: {0}")]
    ParseError(String),

    #[error("io error launching verification subprocess: {0}")]
    Io(String),
}

impl DrspecErrorCode for VerifyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ExecutionError { .. } => error_code::EXECUTION_ERROR,
            Self::Timeout(_) => error_code::VERIFICATION_FAILED,
            Self::ParseError(_) => error_code::PARSE_ERROR,
            Self::Io(_) => error_code::EXECUTION_ERROR,
        }
    }
}

/// Errors from the Diff & Pattern Miner (C11).
#[derive(Debug, thiserror::Error)]
pub enum MiningError {
    #[error("malformed unified diff: {0}")]
    MalformedDiff(String),

    #[error("git error: {0}")]
    Git(String),
}

impl DrspecErrorCode for MiningError {
    fn error_code(&self) -> &'static str {
        error_code::INTERNAL_ERROR
    }
}
