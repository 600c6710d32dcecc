//! Artifact CRUD and the upsert status-transition rule (§4.5).

use drspec_core::errors::StorageError;
use drspec_core::types::{ArtifactStatus, Language};

use super::{now_unix, suggest_function_ids, Repository};
use crate::connection::dbe;
use crate::models::ArtifactRow;

/// Everything the upsert needs about a freshly-scanned function, before it
/// is reconciled against any existing row.
pub struct NewArtifact<'a> {
    pub function_id: &'a str,
    pub file_path: &'a str,
    pub short_name: &'a str,
    pub qualified_name: &'a str,
    pub signature: &'a str,
    pub body: &'a str,
    pub code_hash: &'a str,
    pub language: Language,
    pub start_line: i64,
    pub end_line: i64,
    pub parent: Option<&'a str>,
}

impl Repository {
    /// §4.5 upsert_artifact. Returns whether the row is new-or-changed
    /// (the signal the scan/repository cooperation queues on).
    pub fn upsert_artifact(&self, new: &NewArtifact<'_>) -> Result<bool, StorageError> {
        self.db().with_writer(|conn| {
            let existing: Option<(String, String)> = conn
                .query_row(
                    "SELECT code_hash, status FROM artifacts WHERE function_id = ?",
                    [new.function_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(dbe)?;

            let now = now_unix();

            match existing {
                None => {
                    conn.execute(
                        "INSERT INTO artifacts
                            (function_id, file_path, short_name, qualified_name, signature,
                             body, code_hash, language, start_line, end_line, parent, status,
                             created_at, updated_at)
                         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                        duckdb::params![
                            new.function_id,
                            new.file_path,
                            new.short_name,
                            new.qualified_name,
                            new.signature,
                            new.body,
                            new.code_hash,
                            new.language.as_str(),
                            new.start_line,
                            new.end_line,
                            new.parent,
                            ArtifactStatus::Pending.as_str(),
                            now,
                            now,
                        ],
                    )
                    .map_err(dbe)?;
                    Ok(true)
                }
                Some((old_hash, _)) if old_hash == new.code_hash => {
                    conn.execute(
                        "UPDATE artifacts SET signature = ?, start_line = ?, end_line = ?, updated_at = ?
                         WHERE function_id = ?",
                        duckdb::params![new.signature, new.start_line, new.end_line, now, new.function_id],
                    )
                    .map_err(dbe)?;
                    Ok(false)
                }
                Some((_, old_status)) => {
                    let status = ArtifactStatus::parse(&old_status).unwrap_or(ArtifactStatus::Pending);
                    let next_status = match status {
                        ArtifactStatus::Verified | ArtifactStatus::NeedsReview => ArtifactStatus::Stale,
                        other => other,
                    };
                    conn.execute(
                        "UPDATE artifacts SET file_path = ?, short_name = ?, qualified_name = ?,
                            signature = ?, body = ?, code_hash = ?, language = ?, start_line = ?,
                            end_line = ?, parent = ?, status = ?, updated_at = ?
                         WHERE function_id = ?",
                        duckdb::params![
                            new.file_path,
                            new.short_name,
                            new.qualified_name,
                            new.signature,
                            new.body,
                            new.code_hash,
                            new.language.as_str(),
                            new.start_line,
                            new.end_line,
                            new.parent,
                            next_status.as_str(),
                            now,
                            new.function_id,
                        ],
                    )
                    .map_err(dbe)?;
                    Ok(true)
                }
            }
        })
    }

    pub fn get_artifact(&self, function_id: &str) -> Result<Option<ArtifactRow>, StorageError> {
        self.db().with_reader(|conn| {
            conn.query_row(
                "SELECT function_id, file_path, short_name, qualified_name, signature, body,
                        code_hash, language, start_line, end_line, parent, status,
                        created_at, updated_at
                 FROM artifacts WHERE function_id = ?",
                [function_id],
                row_to_artifact,
            )
            .optional()
            .map_err(dbe)
        })
    }

    /// §7 absence-error fuzzy suggestions for a missing function id.
    pub fn suggest_artifacts(&self, query: &str) -> Result<Vec<String>, StorageError> {
        let ids = self.db().with_reader(|conn| {
            let mut stmt = conn
                .prepare("SELECT function_id FROM artifacts")
                .map_err(dbe)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(dbe)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r.map_err(dbe)?);
            }
            Ok(out)
        })?;
        Ok(suggest_function_ids(ids.into_iter(), query))
    }

    pub fn list_artifact_ids(&self) -> Result<Vec<String>, StorageError> {
        self.db().with_reader(|conn| {
            let mut stmt = conn
                .prepare("SELECT function_id FROM artifacts ORDER BY function_id")
                .map_err(dbe)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(dbe)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r.map_err(dbe)?);
            }
            Ok(out)
        })
    }

    /// Explicit project reset (§3 "deleted only by explicit project
    /// reset"). Deletes everything, children first to satisfy FKs.
    pub fn reset_all(&self) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            conn.execute_batch(
                "DELETE FROM learning_events;
                 DELETE FROM vision_findings;
                 DELETE FROM reasoning_traces;
                 DELETE FROM dependencies;
                 DELETE FROM queue_entries;
                 DELETE FROM contracts;
                 DELETE FROM artifacts;",
            )
            .map_err(dbe)
        })
    }
}

fn row_to_artifact(row: &duckdb::Row<'_>) -> duckdb::Result<ArtifactRow> {
    let language: String = row.get(7)?;
    let status: String = row.get(11)?;
    Ok(ArtifactRow {
        function_id: row.get(0)?,
        file_path: row.get(1)?,
        short_name: row.get(2)?,
        qualified_name: row.get(3)?,
        signature: row.get(4)?,
        body: row.get(5)?,
        code_hash: row.get(6)?,
        language: Language::parse(&language).unwrap_or(Language::Python),
        start_line: row.get(8)?,
        end_line: row.get(9)?,
        parent: row.get(10)?,
        status: ArtifactStatus::parse(&status).unwrap_or(ArtifactStatus::Pending),
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

trait OptionalExt<T> {
    fn optional(self) -> duckdb::Result<Option<T>>;
}

impl<T> OptionalExt<T> for duckdb::Result<T> {
    fn optional(self) -> duckdb::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
