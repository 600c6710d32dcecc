//! Queue Engine (C7, §4.4): priority queue with attempt counting, retry,
//! and terminal states.

use drspec_core::errors::StorageError;
use drspec_core::types::{QueueReason, QueueStatus};

use super::{now_unix, Repository};
use crate::connection::dbe;
use crate::models::QueueEntryRow;

impl Repository {
    /// push(function_id, priority, reason). Creates one row if absent;
    /// if present, updates priority/reason and sets PENDING, leaving
    /// `attempts` unchanged.
    pub fn queue_push(
        &self,
        function_id: &str,
        priority: i64,
        reason: QueueReason,
    ) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            let now = now_unix();
            let existing: bool = conn
                .query_row(
                    "SELECT count(*) > 0 FROM queue_entries WHERE function_id = ?",
                    [function_id],
                    |row| row.get(0),
                )
                .map_err(dbe)?;

            if existing {
                conn.execute(
                    "UPDATE queue_entries SET priority = ?, reason = ?, status = ?, updated_at = ?
                     WHERE function_id = ?",
                    duckdb::params![
                        priority,
                        reason.as_str(),
                        QueueStatus::Pending.as_str(),
                        now,
                        function_id,
                    ],
                )
                .map_err(dbe)?;
            } else {
                conn.execute(
                    "INSERT INTO queue_entries
                        (function_id, priority, status, reason, attempts, max_attempts,
                         error_message, created_at, updated_at)
                     VALUES (?, ?, ?, ?, 0, 3, NULL, ?, ?)",
                    duckdb::params![
                        function_id,
                        priority,
                        QueueStatus::Pending.as_str(),
                        reason.as_str(),
                        now,
                        now,
                    ],
                )
                .map_err(dbe)?;
            }
            Ok(())
        })
    }

    /// pop(): selects the PENDING row with `attempts < max_attempts` and
    /// the smallest priority (ties by oldest `created_at`); atomically
    /// marks it PROCESSING and increments `attempts`.
    pub fn queue_pop(&self) -> Result<Option<QueueEntryRow>, StorageError> {
        self.db().with_writer(|conn| {
            let selected: Option<String> = conn
                .query_row(
                    "SELECT function_id FROM queue_entries
                     WHERE status = ? AND attempts < max_attempts
                     ORDER BY priority ASC, created_at ASC
                     LIMIT 1",
                    [QueueStatus::Pending.as_str()],
                    |row| row.get(0),
                )
                .optional_row()
                .map_err(dbe)?;

            let Some(function_id) = selected else {
                return Ok(None);
            };

            let now = now_unix();
            conn.execute(
                "UPDATE queue_entries
                 SET status = ?, attempts = attempts + 1, updated_at = ?
                 WHERE function_id = ?",
                duckdb::params![QueueStatus::Processing.as_str(), now, function_id],
            )
            .map_err(dbe)?;

            row_for(conn, &function_id)
        })
    }

    /// peek(n, include_all): next `n` PENDING rows lowest-priority-first,
    /// or any non-terminal-status row when `include_all`.
    pub fn queue_peek(&self, n: i64, include_all: bool) -> Result<Vec<QueueEntryRow>, StorageError> {
        self.db().with_reader(|conn| {
            let sql = if include_all {
                "SELECT function_id, priority, status, reason, attempts, max_attempts,
                        error_message, created_at, updated_at
                 FROM queue_entries WHERE status IN ('PENDING', 'PROCESSING')
                 ORDER BY priority ASC, created_at ASC, function_id ASC LIMIT ?"
            } else {
                "SELECT function_id, priority, status, reason, attempts, max_attempts,
                        error_message, created_at, updated_at
                 FROM queue_entries WHERE status = 'PENDING'
                 ORDER BY priority ASC, created_at ASC, function_id ASC LIMIT ?"
            };
            let mut stmt = conn.prepare(sql).map_err(dbe)?;
            let rows = stmt.query_map([n], row_to_queue_entry).map_err(dbe)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r.map_err(dbe)?);
            }
            Ok(out)
        })
    }

    /// complete(function_id, success, error_message?): PROCESSING ->
    /// COMPLETED or PROCESSING -> FAILED.
    pub fn queue_complete(
        &self,
        function_id: &str,
        success: bool,
        error_message: Option<&str>,
    ) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            let now = now_unix();
            let status = if success {
                QueueStatus::Completed
            } else {
                QueueStatus::Failed
            };
            let updated = conn
                .execute(
                    "UPDATE queue_entries SET status = ?, error_message = ?, updated_at = ?
                     WHERE function_id = ?",
                    duckdb::params![status.as_str(), error_message, now, function_id],
                )
                .map_err(dbe)?;
            if updated == 0 {
                return Err(StorageError::QueueItemNotFound(function_id.to_string()));
            }
            Ok(())
        })
    }

    /// retry(function_id, reason): resets to PENDING, clears error, updates
    /// reason; `attempts` is untouched (see DESIGN.md open-question note).
    pub fn queue_retry(&self, function_id: &str, reason: QueueReason) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            let now = now_unix();
            let updated = conn
                .execute(
                    "UPDATE queue_entries SET status = ?, reason = ?, error_message = NULL, updated_at = ?
                     WHERE function_id = ?",
                    duckdb::params![QueueStatus::Pending.as_str(), reason.as_str(), now, function_id],
                )
                .map_err(dbe)?;
            if updated == 0 {
                return Err(StorageError::QueueItemNotFound(function_id.to_string()));
            }
            Ok(())
        })
    }

    pub fn queue_prioritize(&self, function_id: &str, new_priority: i64) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            let now = now_unix();
            let updated = conn
                .execute(
                    "UPDATE queue_entries SET priority = ?, updated_at = ? WHERE function_id = ?",
                    duckdb::params![new_priority, now, function_id],
                )
                .map_err(dbe)?;
            if updated == 0 {
                return Err(StorageError::QueueItemNotFound(function_id.to_string()));
            }
            Ok(())
        })
    }

    pub fn queue_remove(&self, function_id: &str) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            conn.execute("DELETE FROM queue_entries WHERE function_id = ?", [function_id])
                .map_err(dbe)?;
            Ok(())
        })
    }

    pub fn queue_clear_completed(&self) -> Result<usize, StorageError> {
        self.db().with_writer(|conn| {
            conn.execute(
                "DELETE FROM queue_entries WHERE status = ?",
                [QueueStatus::Completed.as_str()],
            )
            .map_err(dbe)
        })
    }

    pub fn queue_get(&self, function_id: &str) -> Result<Option<QueueEntryRow>, StorageError> {
        self.db().with_reader(|conn| row_for(conn, function_id))
    }
}

fn row_for(conn: &duckdb::Connection, function_id: &str) -> Result<Option<QueueEntryRow>, StorageError> {
    conn.query_row(
        "SELECT function_id, priority, status, reason, attempts, max_attempts,
                error_message, created_at, updated_at
         FROM queue_entries WHERE function_id = ?",
        [function_id],
        row_to_queue_entry,
    )
    .optional_row()
    .map_err(dbe)
}

fn row_to_queue_entry(row: &duckdb::Row<'_>) -> duckdb::Result<QueueEntryRow> {
    let status: String = row.get(2)?;
    let reason: String = row.get(3)?;
    Ok(QueueEntryRow {
        function_id: row.get(0)?,
        priority: row.get(1)?,
        status: QueueStatus::parse(&status).unwrap_or(QueueStatus::Pending),
        reason: QueueReason::parse(&reason).unwrap_or(QueueReason::New),
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        error_message: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

trait OptionalRowExt<T> {
    fn optional_row(self) -> duckdb::Result<Option<T>>;
}

impl<T> OptionalRowExt<T> for duckdb::Result<T> {
    fn optional_row(self) -> duckdb::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::artifacts::NewArtifact;
    use drspec_core::types::Language;

    fn seed(repo: &Repository, id: &str) {
        repo.upsert_artifact(&NewArtifact {
            function_id: id,
            file_path: "src/x.py",
            short_name: "f",
            qualified_name: "f",
            signature: "def f(x):",
            body: "def f(x):\n    return x",
            code_hash: "h1",
            language: Language::Python,
            start_line: 1,
            end_line: 2,
            parent: None,
        })
        .unwrap();
    }

    #[test]
    fn push_then_pop_transitions_to_processing() {
        let repo = Repository::open_in_memory().unwrap();
        seed(&repo, "src/x.py::f");
        repo.queue_push("src/x.py::f", 100, QueueReason::New).unwrap();
        let popped = repo.queue_pop().unwrap().unwrap();
        assert_eq!(popped.status, QueueStatus::Processing);
        assert_eq!(popped.attempts, 1);
    }

    #[test]
    fn pop_respects_priority_order() {
        let repo = Repository::open_in_memory().unwrap();
        seed(&repo, "src/x.py::f");
        seed(&repo, "src/x.py::g");
        repo.queue_push("src/x.py::f", 200, QueueReason::New).unwrap();
        repo.queue_push("src/x.py::g", 50, QueueReason::New).unwrap();
        let popped = repo.queue_pop().unwrap().unwrap();
        assert_eq!(popped.function_id, "src/x.py::g");
    }

    #[test]
    fn exhausted_attempts_never_pop_again() {
        let repo = Repository::open_in_memory().unwrap();
        seed(&repo, "src/x.py::f");
        repo.queue_push("src/x.py::f", 100, QueueReason::New).unwrap();
        for _ in 0..3 {
            let popped = repo.queue_pop().unwrap().unwrap();
            repo.queue_complete(&popped.function_id, false, Some("boom")).unwrap();
            repo.queue_retry(&popped.function_id, QueueReason::ManualRetry).unwrap();
        }
        assert!(repo.queue_pop().unwrap().is_none());
    }

    #[test]
    fn retry_preserves_attempts() {
        let repo = Repository::open_in_memory().unwrap();
        seed(&repo, "src/x.py::f");
        repo.queue_push("src/x.py::f", 100, QueueReason::New).unwrap();
        repo.queue_pop().unwrap();
        repo.queue_complete("src/x.py::f", false, None).unwrap();
        repo.queue_retry("src/x.py::f", QueueReason::ManualRetry).unwrap();
        let row = repo.queue_get("src/x.py::f").unwrap().unwrap();
        assert_eq!(row.attempts, 1);
        assert_eq!(row.status, QueueStatus::Pending);
    }
}
