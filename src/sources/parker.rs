//! Parker Library on the Web (Corpus Christi College, Cambridge),
//! hosted by Stanford University Libraries.
//!
//! Discovery scrapes the Blacklight catalogue browse pages, scoped to
//! Archive/Manuscript items. Item IDs are Stanford druids; manifests
//! come from PURL.

use anyhow::Result;
use regex::Regex;
use scraper::Selector;

use super::SourceSpec;
use crate::classify::{Classifier, ShelfmarkExtractor};
use crate::dates::DatePolicy;
use crate::discovery::{DiscoveryStrategy, HtmlScrape};
use crate::models::RepositoryInfo;
use crate::record::SourcePolicy;

const PARKER_BASE: &str = "https://parker.stanford.edu/parker";

pub(super) fn spec() -> Result<SourceSpec> {
    let catalog_url = format!(
        "{PARKER_BASE}/catalog?f[format_main_ssim][]=Archive/Manuscript&per_page=96\
         &search_field=manuscript_number&sort=title_sort+asc,+pub_year_isi+desc&page={{page}}"
    );

    let strategy = DiscoveryStrategy::Html(HtmlScrape {
        url_template: catalog_url,
        first_page: 1,
        max_pages: 10,
        link_selector: Selector::parse(r#"a[href*="/catalog/"]"#)
            .map_err(|e| anyhow::anyhow!("bad selector: {e}"))?,
        // Druids look like wz026zp2442.
        id_pattern: Regex::new(r"/catalog/([a-z]{2}\d{3}[a-z]{2}\d{4})")?,
        shelfmark_from_text: Some(ShelfmarkExtractor::new(&[(
            r"MS\.?\s*(\d+[A-Za-z]?)",
            "MS {1}",
        )])?),
        source_url_template: Some(format!("{PARKER_BASE}/catalog/{{id}}")),
    });

    let policy = SourcePolicy {
        title_labels: vec!["Title".to_string()],
        date_labels: vec!["Date".to_string(), "Date of Creation".to_string()],
        language_labels: vec!["Language".to_string()],
        extent_labels: vec![
            "Physical Description".to_string(),
            "Extent".to_string(),
        ],
        provenance_labels: vec!["Provenance".to_string()],
        shelfmark_labels: Vec::new(),
        shelfmark_rules: ShelfmarkExtractor::new(&[(r"MS\.?\s*(\d+[A-Za-z]?)", "MS {1}")])?,
        fixed_collection: Some("Parker Library".to_string()),
        classifier: Classifier::new(None, &[])?,
        date_policy: DatePolicy::default(),
        title_strip: vec![
            Regex::new(r"(?i)^Cambridge,?\s*Corpus Christi College,?\s*")?,
            Regex::new(r"^MS\.?\s*\d+[A-Za-z]?\s*[:\-\u{2013}]?\s*")?,
        ],
    };

    Ok(SourceSpec {
        id: "parker",
        description: "Parker Library on the Web (Stanford PURL manifests)",
        repository: RepositoryInfo::new(
            "Parker Library, Corpus Christi College, Cambridge",
            "Parker",
            None,
            &format!("{PARKER_BASE}/catalog"),
        ),
        strategy,
        manifest_url_template: Some("https://purl.stanford.edu/{id}/iiif/manifest".to_string()),
        source_url_template: Some(format!("{PARKER_BASE}/catalog/{{id}}")),
        policy,
    })
}
