//! Built-in source definitions.
//!
//! Each source is pure configuration: a repository identity, a discovery
//! strategy, URL templates, and a normalization policy. The importer is
//! the only code path; adding a source means adding a spec here.

mod durham;
mod huntington;
mod parker;

use anyhow::{bail, Result};

use crate::models::{DiscoveryStub, RepositoryInfo};
use crate::discovery::DiscoveryStrategy;
use crate::record::SourcePolicy;

pub struct SourceSpec {
    /// Stable identifier used on the command line and in cache file names.
    pub id: &'static str,
    pub description: &'static str,
    pub repository: RepositoryInfo,
    pub strategy: DiscoveryStrategy,
    /// Manifest URL built from the stub ID, for sources whose stubs do
    /// not carry one. Contains `{id}`.
    pub manifest_url_template: Option<String>,
    /// Catalogue/viewer URL built from the stub ID. Contains `{id}`.
    pub source_url_template: Option<String>,
    pub policy: SourcePolicy,
}

impl SourceSpec {
    /// Manifest URL for one stub, if any.
    pub fn manifest_url(&self, stub: &DiscoveryStub) -> Option<String> {
        stub.manifest_url.clone().or_else(|| {
            self.manifest_url_template
                .as_ref()
                .map(|t| t.replace("{id}", &stub.id))
        })
    }

    /// Catalogue page URL for one stub, if any.
    pub fn source_url(&self, stub: &DiscoveryStub) -> Option<String> {
        stub.source_url.clone().or_else(|| {
            self.source_url_template
                .as_ref()
                .map(|t| t.replace("{id}", &stub.id))
        })
    }
}

/// All built-in sources.
pub fn all() -> Result<Vec<SourceSpec>> {
    Ok(vec![
        parker::spec()?,
        durham::spec()?,
        huntington::spec("EL")?,
        huntington::spec("HM")?,
    ])
}

/// Look up a source by its ID.
pub fn find(id: &str) -> Result<SourceSpec> {
    for spec in all()? {
        if spec.id == id {
            return Ok(spec);
        }
    }
    bail!("unknown source '{id}'; run `compilatio sources` for the list")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_construct() {
        let specs = all().unwrap();
        assert_eq!(specs.len(), 4);
        for spec in &specs {
            assert!(!spec.id.is_empty());
            assert!(!spec.repository.short_name.is_empty());
        }
    }

    #[test]
    fn test_ids_unique() {
        let specs = all().unwrap();
        let mut ids: Vec<_> = specs.iter().map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), specs.len());
    }

    #[test]
    fn test_find_unknown_source() {
        assert!(find("vatican").is_err());
    }

    #[test]
    fn test_manifest_url_prefers_stub() {
        let spec = find("parker").unwrap();
        let mut stub = DiscoveryStub::new("wz026zp2442");
        assert_eq!(
            spec.manifest_url(&stub).as_deref(),
            Some("https://purl.stanford.edu/wz026zp2442/iiif/manifest")
        );
        stub.manifest_url = Some("https://example.org/m".to_string());
        assert_eq!(spec.manifest_url(&stub).as_deref(), Some("https://example.org/m"));
    }
}
