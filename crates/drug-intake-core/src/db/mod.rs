//! SQLite persistence for intake events and reference entries.
//!
//! The tracker never needs this; it is one way to keep events across runs.
//! Stored events are append-only, enforced by triggers in [`SCHEMA`].

mod events;
mod reference;
mod schema;

pub use schema::*;

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: i32, supported: i32 },

    #[error("Stored timestamp is invalid: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("Stored event rejected: {0}")]
    Validation(#[from] crate::store::ValidationError),

    #[error("Stored reference entry rejected: {0}")]
    Reference(#[from] crate::reference::ReferenceError),
}

pub type DbResult<T> = Result<T, DbError>;

/// An intake database with the schema applied.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// Private in-memory database, gone when dropped.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> DbResult<Self> {
        let found: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if found > SCHEMA_VERSION {
            return Err(DbError::SchemaVersion {
                found,
                supported: SCHEMA_VERSION,
            });
        }

        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tracing::debug!(version = SCHEMA_VERSION, "Intake database ready");
        Ok(Self { conn })
    }

    /// Schema version recorded in the file.
    pub fn schema_version(&self) -> DbResult<i32> {
        Ok(self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_created() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"drug_reference".to_string()));
        assert!(tables.contains(&"intake_events".to_string()));
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_reopen_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();

        drop(Database::open(file.path()).unwrap());
        let db = Database::open(file.path()).unwrap();
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(file.path()).unwrap();
            conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1).unwrap();
        }

        assert!(matches!(
            Database::open(file.path()),
            Err(DbError::SchemaVersion { found, .. }) if found == SCHEMA_VERSION + 1
        ));
    }
}
