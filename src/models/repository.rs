//! Holding-institution identity.

use serde::{Deserialize, Serialize};

/// A digitized-manuscript-holding institution.
///
/// Created lazily by any importer on first run (find-or-create by
/// `short_name`); never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Full institution name, e.g. "Bodleian Library, University of Oxford".
    pub name: String,
    /// Unique stable code, e.g. "Bodleian".
    pub short_name: String,
    pub logo_url: Option<String>,
    pub catalogue_url: String,
}

impl RepositoryInfo {
    pub fn new(
        name: impl Into<String>,
        short_name: impl Into<String>,
        logo_url: Option<&str>,
        catalogue_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            short_name: short_name.into(),
            logo_url: logo_url.map(|s| s.to_string()),
            catalogue_url: catalogue_url.into(),
        }
    }
}
