//! Contract upsert protocol (§4.6): the store rejects any UPDATE of an
//! artifact row referenced by a child table, even when the referenced
//! column is untouched, so a contract submission is a scoped
//! all-or-nothing rewrite rather than a plain UPDATE.
//!
//! This is the one operation in the repository that opens its own
//! transaction instead of relying on a single statement's atomicity —
//! matching the teacher's note that the contract-upsert dance "must be
//! atomic under concurrent access" (§5) and is the only multi-step
//! operation that rolls back on intermediate failure.

use drspec_core::errors::StorageError;
use drspec_core::types::{AgentTag, QueueStatus};

use super::now_unix;
use crate::connection::dbe;
use crate::models::ContractRow;
use crate::repository::Repository;

pub struct SubmittedContract<'a> {
    pub function_id: &'a str,
    /// The validated contract JSON document (opaque to the store).
    pub document_json: &'a str,
    /// Submitted confidence on the `[0,100]` display scale (§4.9).
    pub confidence_0_100: f64,
    pub verification_script: Option<&'a str>,
    /// Appended after the rewrite completes, with the supplied agent tag.
    pub reasoning_trace: Option<(AgentTag, &'a str)>,
}

struct SavedQueueEntry {
    priority: i64,
    reason: String,
    attempts: i64,
    max_attempts: i64,
    created_at: i64,
}

struct SavedTrace {
    agent_tag: String,
    payload: String,
    created_at: i64,
}

struct SavedFinding {
    finding_type: String,
    significance: String,
    description: String,
    location: Option<String>,
    suggested_invariant: Option<String>,
    status: String,
    resolution_note: Option<String>,
    plot_path: Option<String>,
    created_at: i64,
    updated_at: i64,
}

struct SavedDependency {
    caller_id: String,
    callee_id: String,
    created_at: i64,
}

impl Repository {
    pub fn get_contract(&self, function_id: &str) -> Result<Option<ContractRow>, StorageError> {
        self.db().with_reader(|conn| {
            conn.query_row(
                "SELECT function_id, document, confidence, verification_script, created_at, updated_at
                 FROM contracts WHERE function_id = ?",
                [function_id],
                |row| {
                    Ok(ContractRow {
                        function_id: row.get(0)?,
                        document: row.get(1)?,
                        confidence: row.get(2)?,
                        verification_script: row.get(3)?,
                        created_at: row.get(4)?,
                        updated_at: row.get(5)?,
                    })
                },
            )
            .optional_contract()
            .map_err(dbe)
        })
    }

    /// The five-step rewrite of §4.6, executed as a single transaction.
    pub fn upsert_contract(&self, submitted: &SubmittedContract<'_>) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            let fid = submitted.function_id;
            let tx = conn.transaction().map_err(dbe)?;

            let artifact_exists: Option<String> = tx
                .query_row("SELECT function_id FROM artifacts WHERE function_id = ?", [fid], |r| r.get(0))
                .optional_contract()
                .map_err(dbe)?;
            if artifact_exists.is_none() {
                return Err(StorageError::FunctionNotFound(fid.to_string()));
            }

            // Step 1: read every child row that references this function_id.
            let saved_queue: Option<SavedQueueEntry> = tx
                .query_row(
                    "SELECT priority, reason, attempts, max_attempts, created_at
                     FROM queue_entries WHERE function_id = ?",
                    [fid],
                    |r| {
                        Ok(SavedQueueEntry {
                            priority: r.get(0)?,
                            reason: r.get(1)?,
                            attempts: r.get(2)?,
                            max_attempts: r.get(3)?,
                            created_at: r.get(4)?,
                        })
                    },
                )
                .optional_contract()
                .map_err(dbe)?;

            let saved_traces: Vec<SavedTrace> = {
                let mut stmt = tx
                    .prepare("SELECT agent_tag, payload, created_at FROM reasoning_traces WHERE function_id = ?")
                    .map_err(dbe)?;
                let rows = stmt
                    .query_map([fid], |r| {
                        Ok(SavedTrace {
                            agent_tag: r.get(0)?,
                            payload: r.get(1)?,
                            created_at: r.get(2)?,
                        })
                    })
                    .map_err(dbe)?;
                let mut out = Vec::new();
                for r in rows {
                    out.push(r.map_err(dbe)?);
                }
                out
            };

            let saved_findings: Vec<SavedFinding> = {
                let mut stmt = tx
                    .prepare(
                        "SELECT finding_type, significance, description, location,
                                suggested_invariant, status, resolution_note, plot_path,
                                created_at, updated_at
                         FROM vision_findings WHERE function_id = ?",
                    )
                    .map_err(dbe)?;
                let rows = stmt
                    .query_map([fid], |r| {
                        Ok(SavedFinding {
                            finding_type: r.get(0)?,
                            significance: r.get(1)?,
                            description: r.get(2)?,
                            location: r.get(3)?,
                            suggested_invariant: r.get(4)?,
                            status: r.get(5)?,
                            resolution_note: r.get(6)?,
                            plot_path: r.get(7)?,
                            created_at: r.get(8)?,
                            updated_at: r.get(9)?,
                        })
                    })
                    .map_err(dbe)?;
                let mut out = Vec::new();
                for r in rows {
                    out.push(r.map_err(dbe)?);
                }
                out
            };

            let saved_deps: Vec<SavedDependency> = {
                let mut stmt = tx
                    .prepare(
                        "SELECT caller_id, callee_id, created_at FROM dependencies
                         WHERE caller_id = ? OR callee_id = ?",
                    )
                    .map_err(dbe)?;
                let rows = stmt
                    .query_map(duckdb::params![fid, fid], |r| {
                        Ok(SavedDependency {
                            caller_id: r.get(0)?,
                            callee_id: r.get(1)?,
                            created_at: r.get(2)?,
                        })
                    })
                    .map_err(dbe)?;
                let mut out = Vec::new();
                for r in rows {
                    out.push(r.map_err(dbe)?);
                }
                out
            };

            // Step 2: delete every child row (including any prior contract,
            // which is about to be replaced rather than preserved).
            tx.execute("DELETE FROM dependencies WHERE caller_id = ? OR callee_id = ?", duckdb::params![fid, fid])
                .map_err(dbe)?;
            tx.execute("DELETE FROM vision_findings WHERE function_id = ?", [fid]).map_err(dbe)?;
            tx.execute("DELETE FROM reasoning_traces WHERE function_id = ?", [fid]).map_err(dbe)?;
            tx.execute("DELETE FROM queue_entries WHERE function_id = ?", [fid]).map_err(dbe)?;
            tx.execute("DELETE FROM contracts WHERE function_id = ?", [fid]).map_err(dbe)?;

            // Step 3: update the artifact's status per §4.9.
            let threshold = config_threshold(&tx)?;
            let new_status = drspec_analysis::confidence::status_for_confidence(
                submitted.confidence_0_100,
                threshold,
            );
            let now = now_unix();
            tx.execute(
                "UPDATE artifacts SET status = ?, updated_at = ? WHERE function_id = ?",
                duckdb::params![new_status.as_str(), now, fid],
            )
            .map_err(dbe)?;

            // Step 4: insert the new contract.
            let stored_confidence = drspec_analysis::confidence::to_stored(submitted.confidence_0_100);
            tx.execute(
                "INSERT INTO contracts (function_id, document, confidence, verification_script, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                duckdb::params![
                    fid,
                    submitted.document_json,
                    stored_confidence,
                    submitted.verification_script,
                    now,
                    now,
                ],
            )
            .map_err(dbe)?;

            // Step 5: restore saved child rows verbatim, except the queue
            // entry, which closes as COMPLETED. Attempts/priority/reason
            // are preserved rather than reset (see DESIGN.md).
            if let Some(q) = saved_queue {
                tx.execute(
                    "INSERT INTO queue_entries
                        (function_id, priority, status, reason, attempts, max_attempts,
                         error_message, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)",
                    duckdb::params![
                        fid,
                        q.priority,
                        QueueStatus::Completed.as_str(),
                        q.reason,
                        q.attempts,
                        q.max_attempts,
                        q.created_at,
                        now,
                    ],
                )
                .map_err(dbe)?;
            }
            for t in &saved_traces {
                tx.execute(
                    "INSERT INTO reasoning_traces (function_id, agent_tag, payload, created_at)
                     VALUES (?, ?, ?, ?)",
                    duckdb::params![fid, t.agent_tag, t.payload, t.created_at],
                )
                .map_err(dbe)?;
            }
            for f in &saved_findings {
                tx.execute(
                    "INSERT INTO vision_findings
                        (function_id, finding_type, significance, description, location,
                         suggested_invariant, status, resolution_note, plot_path,
                         created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    duckdb::params![
                        fid,
                        f.finding_type,
                        f.significance,
                        f.description,
                        f.location,
                        f.suggested_invariant,
                        f.status,
                        f.resolution_note,
                        f.plot_path,
                        f.created_at,
                        f.updated_at,
                    ],
                )
                .map_err(dbe)?;
            }
            for d in &saved_deps {
                tx.execute(
                    "INSERT INTO dependencies (caller_id, callee_id, created_at) VALUES (?, ?, ?)",
                    duckdb::params![d.caller_id, d.callee_id, d.created_at],
                )
                .map_err(dbe)?;
            }

            // Step 6: append the submitter's own reasoning trace, if any.
            if let Some((tag, payload)) = submitted.reasoning_trace {
                tx.execute(
                    "INSERT INTO reasoning_traces (function_id, agent_tag, payload, created_at)
                     VALUES (?, ?, ?, ?)",
                    duckdb::params![fid, tag.as_str(), payload, now],
                )
                .map_err(dbe)?;
            }

            tx.commit().map_err(dbe)?;
            Ok(())
        })
    }
}

fn config_threshold(tx: &duckdb::Transaction<'_>) -> Result<f64, StorageError> {
    let value: Option<String> = tx
        .query_row("SELECT value FROM config WHERE key = 'confidence_threshold'", [], |r| r.get(0))
        .optional_contract()
        .map_err(dbe)?;
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| StorageError::Internal(format!("non-numeric confidence_threshold: {v}"))),
        None => Ok(70.0),
    }
}

trait OptionalContractExt<T> {
    fn optional_contract(self) -> duckdb::Result<Option<T>>;
}

impl<T> OptionalContractExt<T> for duckdb::Result<T> {
    fn optional_contract(self) -> duckdb::Result<Option<T>> {
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
    use drspec_core::types::{ArtifactStatus, Language, QueueReason};

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
    fn upsert_preserves_trace_and_closes_queue_entry() {
        let repo = Repository::open_in_memory().unwrap();
        seed(&repo, "src/x.py::f");
        repo.queue_push("src/x.py::f", 50, QueueReason::New).unwrap();
        repo.queue_pop().unwrap();
        repo.add_reasoning_trace("src/x.py::f", AgentTag::Proposer, r#"{"step":1}"#)
            .unwrap();

        repo.upsert_contract(&SubmittedContract {
            function_id: "src/x.py::f",
            document_json: r#"{"function_signature":"def f(x):","intent_summary":"adds one","invariants":[]}"#,
            confidence_0_100: 85.0,
            verification_script: None,
            reasoning_trace: None,
        })
        .unwrap();

        let contract = repo.get_contract("src/x.py::f").unwrap().unwrap();
        assert!((contract.confidence - 0.85).abs() < 1e-9);

        let artifact = repo.get_artifact("src/x.py::f").unwrap().unwrap();
        assert_eq!(artifact.status, ArtifactStatus::Verified);

        let queue_entry = repo.queue_get("src/x.py::f").unwrap().unwrap();
        assert_eq!(queue_entry.status, QueueStatus::Completed);
        assert_eq!(queue_entry.priority, 50);

        let traces = repo.reasoning_traces_for("src/x.py::f").unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].payload, r#"{"step":1}"#);
    }

    #[test]
    fn low_confidence_sets_needs_review() {
        let repo = Repository::open_in_memory().unwrap();
        seed(&repo, "src/x.py::f");
        repo.upsert_contract(&SubmittedContract {
            function_id: "src/x.py::f",
            document_json: "{}",
            confidence_0_100: 40.0,
            verification_script: None,
            reasoning_trace: None,
        })
        .unwrap();
        let artifact = repo.get_artifact("src/x.py::f").unwrap().unwrap();
        assert_eq!(artifact.status, ArtifactStatus::NeedsReview);
    }

    #[test]
    fn missing_artifact_is_function_not_found() {
        let repo = Repository::open_in_memory().unwrap();
        let err = repo
            .upsert_contract(&SubmittedContract {
                function_id: "src/x.py::missing",
                document_json: "{}",
                confidence_0_100: 90.0,
                verification_script: None,
                reasoning_trace: None,
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::FunctionNotFound(_)));
    }
}
