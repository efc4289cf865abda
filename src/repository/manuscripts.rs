//! Manuscript upsert engine.
//!
//! Uniqueness is application-level on (repository_id, shelfmark): the
//! engine looks up the existing row and chooses UPDATE or INSERT itself,
//! so the same decision path runs in dry-run and execute mode.

use rusqlite::{params, Connection, Row};
use tracing::debug;

use super::{to_option, Result};
use crate::models::{Manuscript, ManuscriptRecord};

/// Whether database writes actually happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Full decision path, no writes.
    DryRun,
    Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

pub struct UpsertEngine<'a> {
    conn: &'a Connection,
    mode: CommitMode,
}

fn manuscript_from_row(row: &Row<'_>) -> rusqlite::Result<Manuscript> {
    Ok(Manuscript {
        id: row.get("id")?,
        repository_id: row.get("repository_id")?,
        record: ManuscriptRecord {
            shelfmark: row.get("shelfmark")?,
            collection: row.get("collection")?,
            date_display: row.get("date_display")?,
            date_start: row.get("date_start")?,
            date_end: row.get("date_end")?,
            contents: row.get("contents")?,
            provenance: row.get("provenance")?,
            language: row.get("language")?,
            folios: row.get("folios")?,
            iiif_manifest_url: row.get("iiif_manifest_url")?,
            thumbnail_url: row.get("thumbnail_url")?,
            source_url: row.get("source_url")?,
            image_count: row.get("image_count")?,
        },
    })
}

impl<'a> UpsertEngine<'a> {
    pub fn new(conn: &'a Connection, mode: CommitMode) -> Self {
        Self { conn, mode }
    }

    pub fn mode(&self) -> CommitMode {
        self.mode
    }

    /// Look up a manuscript by its natural key.
    pub fn find(&self, repository_id: i64, shelfmark: &str) -> Result<Option<Manuscript>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM manuscripts WHERE repository_id = ? AND shelfmark = ?",
        )?;
        to_option(stmt.query_row(params![repository_id, shelfmark], manuscript_from_row))
    }

    /// Insert or fully overwrite one record. Every column is written on
    /// update, so a field the source stopped providing goes to NULL
    /// rather than keeping a stale value.
    pub fn upsert(&self, repository_id: i64, record: &ManuscriptRecord) -> Result<UpsertOutcome> {
        let existing = self.find(repository_id, &record.shelfmark)?;
        let outcome = match existing {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };

        if self.mode == CommitMode::DryRun {
            debug!("[dry-run] would {:?} {}", outcome, record.shelfmark);
            return Ok(outcome);
        }

        match existing {
            Some(existing) => {
                self.conn.execute(
                    "UPDATE manuscripts SET
                        collection = ?, date_display = ?, date_start = ?, date_end = ?,
                        contents = ?, provenance = ?, language = ?, folios = ?,
                        iiif_manifest_url = ?, thumbnail_url = ?, source_url = ?,
                        image_count = ?
                     WHERE id = ?",
                    params![
                        record.collection,
                        record.date_display,
                        record.date_start,
                        record.date_end,
                        record.contents,
                        record.provenance,
                        record.language,
                        record.folios,
                        record.iiif_manifest_url,
                        record.thumbnail_url,
                        record.source_url,
                        record.image_count,
                        existing.id,
                    ],
                )?;
            }
            None => {
                self.conn.execute(
                    "INSERT INTO manuscripts (
                        repository_id, shelfmark, collection, date_display,
                        date_start, date_end, contents, provenance, language,
                        folios, iiif_manifest_url, thumbnail_url, source_url,
                        image_count
                     ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        repository_id,
                        record.shelfmark,
                        record.collection,
                        record.date_display,
                        record.date_start,
                        record.date_end,
                        record.contents,
                        record.provenance,
                        record.language,
                        record.folios,
                        record.iiif_manifest_url,
                        record.thumbnail_url,
                        record.source_url,
                        record.image_count,
                    ],
                )?;
            }
        }
        Ok(outcome)
    }

    /// Manuscript count for one repository.
    pub fn count(&self, repository_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM manuscripts WHERE repository_id = ?",
            params![repository_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
