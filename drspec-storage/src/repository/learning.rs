//! Learning Log (C12, §4.12): append-only record of mined bug-fix
//! patterns, plus the aggregate views the spec calls out.

use std::collections::HashMap;

use drspec_core::errors::StorageError;

use super::{now_unix, Repository};
use crate::connection::dbe;
use crate::models::LearningEventRow;

pub struct NewLearningEvent<'a> {
    pub commit_id: &'a str,
    pub commit_message: &'a str,
    pub function_id: &'a str,
    pub pattern_category: &'a str,
    pub pattern_description: &'a str,
    pub contract_modified: bool,
    pub confidence_boost: f64,
    pub invariants_added: i64,
    pub invariants_validated: i64,
}

#[derive(Debug, Clone, Default)]
pub struct LearningTotals {
    pub total_events: i64,
    pub contract_modifications: i64,
    pub total_confidence_boost: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FunctionRollup {
    pub patterns_seen: i64,
    pub total_boost: f64,
    pub invariants_added: i64,
    pub invariants_validated: i64,
}

impl Repository {
    /// One row per `(commit, function_id, pattern)` considered, regardless
    /// of whether a contract modification was actually applied. Commit
    /// message truncated to 500 chars, pattern description to 1000 (§4.12).
    pub fn add_learning_event(&self, new: &NewLearningEvent<'_>) -> Result<i64, StorageError> {
        let message = truncate(new.commit_message, 500);
        let description = truncate(new.pattern_description, 1000);
        self.db().with_writer(|conn| {
            let now = now_unix();
            conn.query_row(
                "INSERT INTO learning_events
                    (commit_id, commit_message, function_id, pattern_category,
                     pattern_description, contract_modified, confidence_boost,
                     invariants_added, invariants_validated, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
                duckdb::params![
                    new.commit_id,
                    message,
                    new.function_id,
                    new.pattern_category,
                    description,
                    new.contract_modified,
                    new.confidence_boost,
                    new.invariants_added,
                    new.invariants_validated,
                    now,
                ],
                |row| row.get(0),
            )
            .map_err(dbe)
        })
    }

    pub fn learning_events_for(&self, function_id: &str) -> Result<Vec<LearningEventRow>, StorageError> {
        self.db().with_reader(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, commit_id, commit_message, function_id, pattern_category,
                            pattern_description, contract_modified, confidence_boost,
                            invariants_added, invariants_validated, created_at
                     FROM learning_events WHERE function_id = ? ORDER BY id",
                )
                .map_err(dbe)?;
            let rows = stmt.query_map([function_id], row_to_event).map_err(dbe)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r.map_err(dbe)?);
            }
            Ok(out)
        })
    }

    pub fn learning_totals(&self) -> Result<LearningTotals, StorageError> {
        self.db().with_reader(|conn| {
            conn.query_row(
                "SELECT count(*), sum(CASE WHEN contract_modified THEN 1 ELSE 0 END),
                        coalesce(sum(confidence_boost), 0.0)
                 FROM learning_events",
                [],
                |row| {
                    Ok(LearningTotals {
                        total_events: row.get(0)?,
                        contract_modifications: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                        total_confidence_boost: row.get(2)?,
                    })
                },
            )
            .map_err(dbe)
        })
    }

    /// Per-category distribution: category -> event count.
    pub fn learning_category_distribution(&self) -> Result<HashMap<String, i64>, StorageError> {
        self.db().with_reader(|conn| {
            let mut stmt = conn
                .prepare("SELECT pattern_category, count(*) FROM learning_events GROUP BY pattern_category")
                .map_err(dbe)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
                .map_err(dbe)?;
            let mut out = HashMap::new();
            for r in rows {
                let (category, count) = r.map_err(dbe)?;
                out.insert(category, count);
            }
            Ok(out)
        })
    }

    /// Event count within the last 7 days of wall-clock time.
    pub fn learning_activity_last_7_days(&self) -> Result<i64, StorageError> {
        let cutoff = now_unix() - 7 * 24 * 60 * 60;
        self.db().with_reader(|conn| {
            conn.query_row(
                "SELECT count(*) FROM learning_events WHERE created_at >= ?",
                [cutoff],
                |row| row.get(0),
            )
            .map_err(dbe)
        })
    }

    pub fn learning_rollup_for(&self, function_id: &str) -> Result<FunctionRollup, StorageError> {
        let events = self.learning_events_for(function_id)?;
        let mut rollup = FunctionRollup::default();
        for e in &events {
            rollup.patterns_seen += 1;
            rollup.total_boost += e.confidence_boost;
            rollup.invariants_added += e.invariants_added;
            rollup.invariants_validated += e.invariants_validated;
        }
        Ok(rollup)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

fn row_to_event(row: &duckdb::Row<'_>) -> duckdb::Result<LearningEventRow> {
    Ok(LearningEventRow {
        id: row.get(0)?,
        commit_id: row.get(1)?,
        commit_message: row.get(2)?,
        function_id: row.get(3)?,
        pattern_category: row.get(4)?,
        pattern_description: row.get(5)?,
        contract_modified: row.get(6)?,
        confidence_boost: row.get(7)?,
        invariants_added: row.get(8)?,
        invariants_validated: row.get(9)?,
        created_at: row.get(10)?,
    })
}
