//! Discovery stage: enumerate candidate manuscripts from a catalogue.
//!
//! Three structurally different strategies produce the same stub shape:
//! paginated API enumeration, recursive IIIF collection-tree crawl, and
//! CSS-selector scraping of server-rendered result pages. All three
//! deduplicate by natural ID, honor a result cap, and the completed stub
//! list is cached to disk so the import phase can be retried
//! independently.

mod api;
mod collection;
mod html;

pub use api::{ApiEnumeration, FieldRef, MetaArray};
pub use collection::CollectionCrawl;
pub use html::HtmlScrape;

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::fetch::ManifestFetcher;
use crate::models::DiscoveryStub;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to fetch {0}")]
    Fetch(String),
    #[error("discovery produced no candidates")]
    NoCandidates,
    #[error("discovery cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("discovery cache is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A source's discovery configuration.
#[derive(Debug, Clone)]
pub enum DiscoveryStrategy {
    Api(ApiEnumeration),
    Collection(CollectionCrawl),
    Html(HtmlScrape),
}

impl DiscoveryStrategy {
    /// Run discovery to completion, capped at `limit` stubs when given.
    ///
    /// An empty result is an error: a source that suddenly enumerates
    /// nothing means the catalogue moved or is blocking us, and the run
    /// must not silently proceed to import nothing.
    pub async fn discover(
        &self,
        fetcher: &dyn ManifestFetcher,
        limit: Option<usize>,
    ) -> Result<Vec<DiscoveryStub>, DiscoveryError> {
        let stubs = match self {
            DiscoveryStrategy::Api(strategy) => strategy.run(fetcher, limit).await?,
            DiscoveryStrategy::Collection(strategy) => strategy.run(fetcher, limit).await?,
            DiscoveryStrategy::Html(strategy) => strategy.run(fetcher, limit).await?,
        };
        if stubs.is_empty() {
            return Err(DiscoveryError::NoCandidates);
        }
        info!("Discovery complete: {} candidates", stubs.len());
        Ok(stubs)
    }
}

/// Persist a discovery run as a flat JSON array.
pub fn save_cache(stubs: &[DiscoveryStub], path: &Path) -> Result<(), DiscoveryError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(stubs)?)?;
    info!("Saved {} stubs to {}", stubs.len(), path.display());
    Ok(())
}

/// Load a cached discovery run; `None` when the cache file is absent.
pub fn load_cache(path: &Path) -> Result<Option<Vec<DiscoveryStub>>, DiscoveryError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    let stubs: Vec<DiscoveryStub> = serde_json::from_str(&data)?;
    info!("Loaded {} stubs from cache {}", stubs.len(), path.display());
    Ok(Some(stubs))
}

/// Cap a stub list in place.
pub(crate) fn apply_limit(stubs: &mut Vec<DiscoveryStub>, limit: Option<usize>) {
    if let Some(limit) = limit {
        stubs.truncate(limit);
    }
}
