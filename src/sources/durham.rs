//! Durham University Library and Durham Cathedral Library manuscripts,
//! served from the Durham "trifle" IIIF collection tree.
//!
//! Discovery walks a fixed set of sub-collections rather than the full
//! index, which also carries non-manuscript material.

use anyhow::Result;
use regex::Regex;

use super::SourceSpec;
use crate::classify::{Classifier, ShelfmarkExtractor};
use crate::dates::DatePolicy;
use crate::discovery::{CollectionCrawl, DiscoveryStrategy};
use crate::models::RepositoryInfo;
use crate::record::SourcePolicy;

const COLLECTION_BASE: &str = "https://iiif.durham.ac.uk/manifests/trifle/collection/32150";

pub(super) fn spec() -> Result<SourceSpec> {
    let strategy = DiscoveryStrategy::Collection(CollectionCrawl {
        roots: vec![
            // Cathedral Library MS books
            format!("{COLLECTION_BASE}/t2c7m01bk68j"),
            // Hunter MSS
            format!("{COLLECTION_BASE}/t2c8623hx722"),
            // Cathedral Add MSS
            format!("{COLLECTION_BASE}/t2c6682x3943"),
            // Cosin MSS
            format!("{COLLECTION_BASE}/t1c08612n52t"),
            // Bamburgh Library
            format!("{COLLECTION_BASE}/t2cqn59q396k"),
        ],
        max_depth: 5,
    });

    // Labels come as "Durham Cathedral Library MS A.I.3 - Title" on
    // collection stubs and "Title - Cosin MS. B.i.5" on manifests. The
    // long institution prefix is normalized to "DCL".
    let shelfmark_rules = ShelfmarkExtractor::new(&[
        (r"Durham Cathedral Library (MS\.?\s*[\w.]+)", "DCL {1}"),
        (r"DCL\s+(?:MS\.?\s*)?Hunter\s+MS\.?\s*\d+", ""),
        (r"DCL\s+MS\.?\s*[\w.]+", ""),
        (r"Cosin\s+MS\.?\s*[\w.]+", ""),
        (r"CADD\s*\d+", ""),
        (r"Bamburgh\s+[\w.]+", ""),
    ])?;

    let classifier = Classifier::new(
        None,
        &[
            (r"DCL MS\.?\s*A\.", "Cathedral A"),
            (r"DCL MS\.?\s*B\.", "Cathedral B"),
            (r"DCL MS\.?\s*C\.", "Cathedral C"),
            (r"DCL (?:MS\.?\s*)?Hunter", "Hunter"),
            (r"Cosin MS", "Cosin"),
            (r"CADD", "Cathedral Additional"),
            (r"Bamburgh", "Bamburgh"),
        ],
    )?;

    let policy = SourcePolicy {
        title_labels: vec!["Title".to_string()],
        date_labels: vec!["Published".to_string(), "Date".to_string()],
        language_labels: vec!["Language".to_string()],
        extent_labels: vec!["Extent".to_string(), "Physical Description".to_string()],
        provenance_labels: vec!["Provenance".to_string()],
        shelfmark_labels: Vec::new(),
        shelfmark_rules,
        fixed_collection: None,
        classifier,
        date_policy: DatePolicy::default(),
        title_strip: vec![
            // Leading shelfmark segment: "Durham Cathedral Library MS A.I.3 - "
            Regex::new(
                r"(?i)^(?:Durham Cathedral Library|DCL)\s+MS\.?\s*[\w.]+\s*-\s*",
            )?,
            // Trailing shelfmark segment: " - Cosin MS. B.i.5"
            Regex::new(
                r"(?i)\s*-\s*(?:Durham Cathedral Library|DCL|Cosin|CADD|Bamburgh)[\w.\s]*$",
            )?,
        ],
    };

    Ok(SourceSpec {
        id: "durham",
        description: "Durham Cathedral and University Library IIIF collections",
        repository: RepositoryInfo::new(
            "Durham University Library",
            "Durham",
            Some("https://iiif.durham.ac.uk/images/logos/duruni_logo.png"),
            "https://iiif.durham.ac.uk/index.html",
        ),
        strategy,
        manifest_url_template: None,
        source_url_template: Some(
            "https://iiif.durham.ac.uk/index.html?manifest={id}".to_string(),
        ),
        policy,
    })
}
