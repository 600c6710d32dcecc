//! VisionFinding: analyst observations about a function's behavior plot
//! (§3), feeding the confidence-display adjustment (§4.9).

use drspec_core::errors::StorageError;
use drspec_core::types::{FindingKind, FindingStatus, Significance};

use super::{now_unix, Repository};
use crate::connection::dbe;
use crate::models::VisionFindingRow;

pub struct NewFinding<'a> {
    pub function_id: &'a str,
    pub finding_type: FindingKind,
    pub significance: Significance,
    pub description: &'a str,
    pub location: Option<&'a str>,
    pub suggested_invariant: Option<&'a str>,
    pub plot_path: Option<&'a str>,
}

impl Repository {
    pub fn add_finding(&self, new: &NewFinding<'_>) -> Result<i64, StorageError> {
        self.db().with_writer(|conn| {
            let now = now_unix();
            conn.query_row(
                "INSERT INTO vision_findings
                    (function_id, finding_type, significance, description, location,
                     suggested_invariant, status, resolution_note, plot_path,
                     created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?) RETURNING id",
                duckdb::params![
                    new.function_id,
                    new.finding_type.as_str(),
                    new.significance.as_str(),
                    new.description,
                    new.location,
                    new.suggested_invariant,
                    FindingStatus::New.as_str(),
                    new.plot_path,
                    now,
                    now,
                ],
                |row| row.get(0),
            )
            .map_err(dbe)
        })
    }

    pub fn update_finding_status(
        &self,
        id: i64,
        status: FindingStatus,
        resolution_note: Option<&str>,
    ) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            let now = now_unix();
            conn.execute(
                "UPDATE vision_findings SET status = ?, resolution_note = ?, updated_at = ?
                 WHERE id = ?",
                duckdb::params![status.as_str(), resolution_note, now, id],
            )
            .map_err(dbe)?;
            Ok(())
        })
    }

    pub fn findings_for(&self, function_id: &str) -> Result<Vec<VisionFindingRow>, StorageError> {
        self.db().with_reader(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, function_id, finding_type, significance, description, location,
                            suggested_invariant, status, resolution_note, plot_path,
                            created_at, updated_at
                     FROM vision_findings WHERE function_id = ? ORDER BY id",
                )
                .map_err(dbe)?;
            let rows = stmt.query_map([function_id], row_to_finding).map_err(dbe)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r.map_err(dbe)?);
            }
            Ok(out)
        })
    }

    /// `NEW` findings for this function, in the shape the confidence model
    /// adjustment (§4.9) consumes.
    pub fn new_finding_significances(&self, function_id: &str) -> Result<Vec<Significance>, StorageError> {
        Ok(self
            .findings_for(function_id)?
            .into_iter()
            .filter(|f| f.status == FindingStatus::New)
            .map(|f| f.significance)
            .collect())
    }
}

fn row_to_finding(row: &duckdb::Row<'_>) -> duckdb::Result<VisionFindingRow> {
    let finding_type: String = row.get(2)?;
    let significance: String = row.get(3)?;
    let status: String = row.get(7)?;
    Ok(VisionFindingRow {
        id: row.get(0)?,
        function_id: row.get(1)?,
        finding_type: FindingKind::parse(&finding_type).unwrap_or(FindingKind::Outlier),
        significance: Significance::parse(&significance).unwrap_or(Significance::Low),
        description: row.get(4)?,
        location: row.get(5)?,
        suggested_invariant: row.get(6)?,
        status: FindingStatus::parse(&status).unwrap_or(FindingStatus::New),
        resolution_note: row.get(8)?,
        plot_path: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
