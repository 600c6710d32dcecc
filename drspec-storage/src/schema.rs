//! Numbered schema migrations, following the teacher's `migrations`
//! module convention: an ordered list of SQL batches applied once,
//! tracked in a `schema_migrations` table so re-opening an existing
//! database is a no-op.

use drspec_core::errors::StorageError;

use crate::connection::dbe;

const MIGRATIONS: &[(i64, &str)] = &[
    (
        1,
        r#"
        CREATE TABLE IF NOT EXISTS artifacts (
            function_id    TEXT PRIMARY KEY,
            file_path      TEXT NOT NULL,
            short_name     TEXT NOT NULL,
            qualified_name TEXT NOT NULL,
            signature      TEXT NOT NULL,
            body           TEXT NOT NULL,
            code_hash      TEXT NOT NULL,
            language       TEXT NOT NULL,
            start_line     BIGINT NOT NULL,
            end_line       BIGINT NOT NULL,
            parent         TEXT,
            status         TEXT NOT NULL,
            created_at     BIGINT NOT NULL,
            updated_at     BIGINT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS contracts (
            function_id          TEXT PRIMARY KEY REFERENCES artifacts(function_id),
            document             TEXT NOT NULL,
            confidence           DOUBLE NOT NULL,
            verification_script  TEXT,
            created_at           BIGINT NOT NULL,
            updated_at           BIGINT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS queue_entries (
            function_id    TEXT PRIMARY KEY REFERENCES artifacts(function_id),
            priority       BIGINT NOT NULL,
            status         TEXT NOT NULL,
            reason         TEXT NOT NULL,
            attempts       BIGINT NOT NULL DEFAULT 0,
            max_attempts   BIGINT NOT NULL DEFAULT 3,
            error_message  TEXT,
            created_at     BIGINT NOT NULL,
            updated_at     BIGINT NOT NULL
        );

        CREATE SEQUENCE IF NOT EXISTS seq_dependencies START 1;
        CREATE TABLE IF NOT EXISTS dependencies (
            id          BIGINT PRIMARY KEY DEFAULT nextval('seq_dependencies'),
            caller_id   TEXT NOT NULL REFERENCES artifacts(function_id),
            callee_id   TEXT NOT NULL REFERENCES artifacts(function_id),
            created_at  BIGINT NOT NULL,
            UNIQUE (caller_id, callee_id)
        );

        CREATE SEQUENCE IF NOT EXISTS seq_reasoning_traces START 1;
        CREATE TABLE IF NOT EXISTS reasoning_traces (
            id           BIGINT PRIMARY KEY DEFAULT nextval('seq_reasoning_traces'),
            function_id  TEXT NOT NULL REFERENCES artifacts(function_id),
            agent_tag    TEXT NOT NULL,
            payload      TEXT NOT NULL,
            created_at   BIGINT NOT NULL
        );

        CREATE SEQUENCE IF NOT EXISTS seq_vision_findings START 1;
        CREATE TABLE IF NOT EXISTS vision_findings (
            id                   BIGINT PRIMARY KEY DEFAULT nextval('seq_vision_findings'),
            function_id          TEXT NOT NULL REFERENCES artifacts(function_id),
            finding_type         TEXT NOT NULL,
            significance         TEXT NOT NULL,
            description          TEXT NOT NULL,
            location             TEXT,
            suggested_invariant  TEXT,
            status               TEXT NOT NULL,
            resolution_note      TEXT,
            plot_path            TEXT,
            created_at           BIGINT NOT NULL,
            updated_at           BIGINT NOT NULL
        );

        CREATE SEQUENCE IF NOT EXISTS seq_learning_events START 1;
        CREATE TABLE IF NOT EXISTS learning_events (
            id                     BIGINT PRIMARY KEY DEFAULT nextval('seq_learning_events'),
            commit_id              TEXT NOT NULL,
            commit_message         TEXT NOT NULL,
            function_id            TEXT NOT NULL REFERENCES artifacts(function_id),
            pattern_category       TEXT NOT NULL,
            pattern_description    TEXT NOT NULL,
            contract_modified      BOOLEAN NOT NULL,
            confidence_boost       DOUBLE NOT NULL,
            invariants_added       BIGINT NOT NULL,
            invariants_validated   BIGINT NOT NULL,
            created_at             BIGINT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS config (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    ),
];

/// Applies every migration whose id hasn't already been recorded, in order.
pub fn apply_migrations(conn: &duckdb::Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (id BIGINT PRIMARY KEY, applied_at BIGINT NOT NULL);",
    )
    .map_err(dbe)?;

    for (id, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT count(*) > 0 FROM schema_migrations WHERE id = ?",
                [*id],
                |row| row.get(0),
            )
            .map_err(dbe)?;
        if already {
            continue;
        }
        conn.execute_batch(sql).map_err(dbe)?;
        conn.execute(
            "INSERT INTO schema_migrations (id, applied_at) VALUES (?, epoch(now())::BIGINT)",
            [*id],
        )
        .map_err(dbe)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();
        apply_migrations(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT count(*) FROM schema_migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }
}
