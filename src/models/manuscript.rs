//! Manuscript records and rows.

use serde::{Deserialize, Serialize};

/// A canonical manuscript record as produced by the record builder,
/// ready for upsert. Shelfmark is the only mandatory field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManuscriptRecord {
    pub shelfmark: String,
    pub collection: Option<String>,
    /// Free-text date as extracted from the source.
    pub date_display: Option<String>,
    pub date_start: Option<i32>,
    pub date_end: Option<i32>,
    /// Title/description, truncated to 1000 chars.
    pub contents: Option<String>,
    pub provenance: Option<String>,
    pub language: Option<String>,
    /// Physical extent description.
    pub folios: Option<String>,
    pub iiif_manifest_url: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Human-facing catalogue page.
    pub source_url: Option<String>,
    pub image_count: Option<i64>,
}

impl ManuscriptRecord {
    pub fn new(shelfmark: impl Into<String>) -> Self {
        Self {
            shelfmark: shelfmark.into(),
            ..Default::default()
        }
    }
}

/// A manuscript row as stored in the database.
///
/// Uniqueness of `(shelfmark, repository_id)` is enforced at the
/// application level: importers look up before inserting and are the
/// sole writers of this table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manuscript {
    pub id: i64,
    pub repository_id: i64,
    #[serde(flatten)]
    pub record: ManuscriptRecord,
}
