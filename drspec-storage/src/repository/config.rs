//! Config: key -> value string map for process-wide tuning (§3), notably
//! the confidence threshold (default 70).

use drspec_core::errors::StorageError;

use super::Repository;
use crate::connection::dbe;

impl Repository {
    pub fn config_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.db().with_reader(|conn| {
            conn.query_row("SELECT value FROM config WHERE key = ?", [key], |row| row.get(0))
                .optional_value()
                .map_err(dbe)
        })
    }

    pub fn config_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.db().with_writer(|conn| {
            conn.execute(
                "INSERT INTO config (key, value) VALUES (?, ?)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value",
                duckdb::params![key, value],
            )
            .map_err(dbe)?;
            Ok(())
        })
    }

    /// `[0,100]` confidence threshold (§4.9). Falls back to 70 when unset.
    pub fn confidence_threshold(&self) -> Result<f64, StorageError> {
        match self.config_get("confidence_threshold")? {
            Some(v) => v.parse().map_err(|_| {
                StorageError::Internal(format!("non-numeric confidence_threshold: {v}"))
            }),
            None => Ok(70.0),
        }
    }
}

trait OptionalValueExt<T> {
    fn optional_value(self) -> duckdb::Result<Option<T>>;
}

impl<T> OptionalValueExt<T> for duckdb::Result<T> {
    fn optional_value(self) -> duckdb::Result<Option<T>> {
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

    #[test]
    fn defaults_to_seventy_when_unset() {
        let repo = Repository::open_in_memory().unwrap();
        assert_eq!(repo.confidence_threshold().unwrap(), 70.0);
    }

    #[test]
    fn set_then_get_round_trips() {
        let repo = Repository::open_in_memory().unwrap();
        repo.config_set("confidence_threshold", "80").unwrap();
        assert_eq!(repo.confidence_threshold().unwrap(), 80.0);
    }
}
