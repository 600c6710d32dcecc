//! The Artifact/Contract Repository (C6), Queue Engine (C7), Dependency
//! Graph backing store (C8), and Learning Log (C12) — one module per
//! entity, all routed through a shared [`DatabaseManager`], mirroring the
//! teacher's `DriftStorageEngine` (one `impl` block per storage concern
//! over a single connection owner).

pub mod artifacts;
pub mod config;
pub mod contracts;
pub mod dependencies;
pub mod findings;
pub mod learning;
pub mod queue;
pub mod traces;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use drspec_core::errors::StorageError;

use crate::connection::DatabaseManager;

/// Unified storage engine: owns the one `DatabaseManager` and exposes every
/// entity's operations as inherent methods, the way `DriftStorageEngine`
/// wraps its `DatabaseManager` and implements each storage trait on top of
/// it.
pub struct Repository {
    db: DatabaseManager,
}

impl Repository {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            db: DatabaseManager::open_in_memory()?,
        })
    }

    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.db.checkpoint()
    }

    pub fn path(&self) -> Option<&Path> {
        self.db.path()
    }

    pub(crate) fn db(&self) -> &DatabaseManager {
        &self.db
    }
}

/// Seconds since the Unix epoch, used for every `created_at`/`updated_at`
/// column. The store has no clock of its own; this is the single place
/// that reads the wall clock so every repository module stays testable
/// with a consistent notion of "now".
pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Fuzzy-match suggestions for absence errors (§7): case-insensitive
/// substring match against function name, falling back to path-prefix
/// match, capped at 5.
pub(crate) fn suggest_function_ids(
    candidates: impl Iterator<Item = String>,
    query: &str,
) -> Vec<String> {
    let query_lower = query.to_lowercase();
    let mut by_name = Vec::new();
    let mut by_prefix = Vec::new();
    for candidate in candidates {
        let lower = candidate.to_lowercase();
        let short = lower.rsplit(['.', ':']).next().unwrap_or(&lower);
        if short.contains(&query_lower) {
            by_name.push(candidate.clone());
        } else if lower.starts_with(&query_lower) {
            by_prefix.push(candidate);
        }
        if by_name.len() >= 5 {
            break;
        }
    }
    by_name.truncate(5);
    if by_name.len() < 5 {
        by_prefix.truncate(5 - by_name.len());
        by_name.extend(by_prefix);
    }
    by_name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_prefer_name_match_over_prefix() {
        let candidates = vec![
            "src/a.py::other".to_string(),
            "src/foo.py::helper".to_string(),
            "src/b.py::helper_two".to_string(),
        ];
        let suggestions = suggest_function_ids(candidates.into_iter(), "helper");
        assert_eq!(suggestions[0], "src/foo.py::helper");
    }
}
