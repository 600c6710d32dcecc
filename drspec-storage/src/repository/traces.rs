//! ReasoningTrace: append-only audit records of an agent's intermediate
//! reasoning (§3). Preserved verbatim across contract upsert (§4.6).

use drspec_core::errors::StorageError;
use drspec_core::types::AgentTag;

use super::{now_unix, Repository};
use crate::connection::dbe;
use crate::models::ReasoningTraceRow;

impl Repository {
    pub fn add_reasoning_trace(
        &self,
        function_id: &str,
        agent_tag: AgentTag,
        payload_json: &str,
    ) -> Result<i64, StorageError> {
        self.db().with_writer(|conn| {
            let now = now_unix();
            conn.query_row(
                "INSERT INTO reasoning_traces (function_id, agent_tag, payload, created_at)
                 VALUES (?, ?, ?, ?) RETURNING id",
                duckdb::params![function_id, agent_tag.as_str(), payload_json, now],
                |row| row.get(0),
            )
            .map_err(dbe)
        })
    }

    pub fn reasoning_traces_for(&self, function_id: &str) -> Result<Vec<ReasoningTraceRow>, StorageError> {
        self.db().with_reader(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, function_id, agent_tag, payload, created_at
                     FROM reasoning_traces WHERE function_id = ? ORDER BY id",
                )
                .map_err(dbe)?;
            let rows = stmt
                .query_map([function_id], |row| {
                    let tag: String = row.get(2)?;
                    Ok(ReasoningTraceRow {
                        id: row.get(0)?,
                        function_id: row.get(1)?,
                        agent_tag: AgentTag::parse(&tag).unwrap_or(AgentTag::Proposer),
                        payload: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })
                .map_err(dbe)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r.map_err(dbe)?);
            }
            Ok(out)
        })
    }
}
