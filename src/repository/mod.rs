//! Repository layer for SQLite persistence.
//!
//! All access goes through rusqlite with per-call connections. The
//! database file must already exist (created by `init`) before an import
//! run may touch it.

pub mod manuscripts;
pub mod repositories;

pub use manuscripts::{CommitMode, UpsertEngine, UpsertOutcome};
pub use repositories::RepositoryStore;

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database not found at {0}; run `compilatio init` first")]
    DatabaseMissing(String),
}

pub type Result<T> = std::result::Result<T, RepoError>;

/// Open a connection with sane defaults for a single-writer importer.
pub fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// Open an existing database, refusing to create one implicitly.
pub fn connect_existing(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        return Err(RepoError::DatabaseMissing(db_path.display().to_string()));
    }
    connect(db_path)
}

/// Create the schema (idempotent).
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS repositories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            short_name TEXT NOT NULL UNIQUE,
            logo_url TEXT,
            catalogue_url TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS manuscripts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            repository_id INTEGER NOT NULL REFERENCES repositories(id),
            shelfmark TEXT NOT NULL,
            collection TEXT,
            date_display TEXT,
            date_start INTEGER,
            date_end INTEGER,
            contents TEXT,
            provenance TEXT,
            language TEXT,
            folios TEXT,
            iiif_manifest_url TEXT,
            thumbnail_url TEXT,
            source_url TEXT,
            image_count INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_manuscripts_repository
            ON manuscripts(repository_id, shelfmark);
    "#,
    )?;
    Ok(())
}

/// Map `QueryReturnedNoRows` to `None`.
fn to_option<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
