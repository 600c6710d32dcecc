//! Dependency edges (§3, backing C8's `DependencySource`).

use drspec_analysis::graph::{ArtifactSummary, DependencySource};
use drspec_core::errors::StorageError;
use drspec_core::types::FunctionId;

use super::{now_unix, Repository};
use crate::connection::dbe;
use crate::models::DependencyRow;

impl Repository {
    /// Adds `caller -> callee` if absent. Both endpoints must already
    /// exist as artifacts (enforced by the FK).
    pub fn add_dependency(&self, caller_id: &str, callee_id: &str) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            let now = now_unix();
            conn.execute(
                "INSERT INTO dependencies (caller_id, callee_id, created_at)
                 VALUES (?, ?, ?)
                 ON CONFLICT (caller_id, callee_id) DO NOTHING",
                duckdb::params![caller_id, callee_id, now],
            )
            .map_err(dbe)?;
            Ok(())
        })
    }

    pub fn remove_dependency(&self, caller_id: &str, callee_id: &str) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            conn.execute(
                "DELETE FROM dependencies WHERE caller_id = ? AND callee_id = ?",
                duckdb::params![caller_id, callee_id],
            )
            .map_err(dbe)?;
            Ok(())
        })
    }

    pub fn callees_of(&self, function_id: &str) -> Result<Vec<String>, StorageError> {
        self.db().with_reader(|conn| {
            let mut stmt = conn
                .prepare("SELECT callee_id FROM dependencies WHERE caller_id = ?")
                .map_err(dbe)?;
            let rows = stmt.query_map([function_id], |r| r.get::<_, String>(0)).map_err(dbe)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r.map_err(dbe)?);
            }
            Ok(out)
        })
    }

    pub fn callers_of(&self, function_id: &str) -> Result<Vec<String>, StorageError> {
        self.db().with_reader(|conn| {
            let mut stmt = conn
                .prepare("SELECT caller_id FROM dependencies WHERE callee_id = ?")
                .map_err(dbe)?;
            let rows = stmt.query_map([function_id], |r| r.get::<_, String>(0)).map_err(dbe)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r.map_err(dbe)?);
            }
            Ok(out)
        })
    }

    /// All edges, for graph statistics (§4.7).
    pub fn all_dependencies(&self) -> Result<Vec<DependencyRow>, StorageError> {
        self.db().with_reader(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, caller_id, callee_id, created_at FROM dependencies")
                .map_err(dbe)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(DependencyRow {
                        id: row.get(0)?,
                        caller_id: row.get(1)?,
                        callee_id: row.get(2)?,
                        created_at: row.get(3)?,
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

/// Adapts the repository to C8's storage-agnostic traversal trait. Lives
/// here rather than in `drspec-analysis` so that crate never depends on
/// `drspec-storage`.
impl DependencySource for Repository {
    fn callees(&self, id: &FunctionId) -> Vec<FunctionId> {
        self.callees_of(id.as_str())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| FunctionId::parse(s).ok())
            .collect()
    }

    fn callers(&self, id: &FunctionId) -> Vec<FunctionId> {
        self.callers_of(id.as_str())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|s| FunctionId::parse(s).ok())
            .collect()
    }

    fn artifact_summary(&self, id: &FunctionId) -> Option<ArtifactSummary> {
        let row = self.get_artifact(id.as_str()).ok().flatten()?;
        let has_contract = self.get_contract(id.as_str()).ok().flatten().is_some();
        Some(ArtifactSummary {
            short_name: row.short_name,
            file_path: row.file_path,
            status: row.status,
            has_contract,
        })
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
            short_name: id.rsplit("::").next().unwrap(),
            qualified_name: id.rsplit("::").next().unwrap(),
            signature: "def f():",
            body: "def f():\n    pass",
            code_hash: "h1",
            language: Language::Python,
            start_line: 1,
            end_line: 2,
            parent: None,
        })
        .unwrap();
    }

    #[test]
    fn cycle_edges_are_traversable_both_directions() {
        let repo = Repository::open_in_memory().unwrap();
        seed(&repo, "src/x.py::a");
        seed(&repo, "src/x.py::b");
        seed(&repo, "src/x.py::c");
        repo.add_dependency("src/x.py::a", "src/x.py::b").unwrap();
        repo.add_dependency("src/x.py::b", "src/x.py::c").unwrap();
        repo.add_dependency("src/x.py::c", "src/x.py::a").unwrap();

        let a = FunctionId::parse("src/x.py::a").unwrap();
        let graph = drspec_analysis::graph::get_graph(
            &repo,
            &a,
            3,
            drspec_analysis::graph::Direction::Callees,
        );
        assert_eq!(graph.nodes.len(), 3);
        assert!(graph.has_cycles);
    }

    #[test]
    fn duplicate_edge_insert_is_a_no_op() {
        let repo = Repository::open_in_memory().unwrap();
        seed(&repo, "src/x.py::a");
        seed(&repo, "src/x.py::b");
        repo.add_dependency("src/x.py::a", "src/x.py::b").unwrap();
        repo.add_dependency("src/x.py::a", "src/x.py::b").unwrap();
        assert_eq!(repo.all_dependencies().unwrap().len(), 1);
    }
}
