//! Canonical record assembly from discovery stubs and IIIF manifests.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::classify::{Classifier, ShelfmarkExtractor};
use crate::dates::{parse_date, DatePolicy};
use crate::iiif;
use crate::models::{DiscoveryStub, ManuscriptRecord};

/// Maximum stored length of the contents/title field.
const CONTENTS_MAX: usize = 1000;

/// Per-source normalization policy: which metadata labels to try, how to
/// derive shelfmark and collection, and how to read dates. This is data
/// handed to one shared builder, not per-source code.
#[derive(Debug, Clone)]
pub struct SourcePolicy {
    /// Labels tried in order for each field.
    pub title_labels: Vec<String>,
    pub date_labels: Vec<String>,
    pub language_labels: Vec<String>,
    pub extent_labels: Vec<String>,
    pub provenance_labels: Vec<String>,
    /// Metadata labels carrying the shelfmark directly (e.g. "Call
    /// Number"), tried before the pattern rules.
    pub shelfmark_labels: Vec<String>,
    /// Shelfmark extraction from the stub or manifest label, used when
    /// no metadata field carries it.
    pub shelfmark_rules: ShelfmarkExtractor,
    /// Collection is either fixed for the whole source or classified
    /// from the shelfmark.
    pub fixed_collection: Option<String>,
    pub classifier: Classifier,
    pub date_policy: DatePolicy,
    /// Cleanup patterns removed from the title (institution prefixes,
    /// leading shelfmarks).
    pub title_strip: Vec<Regex>,
}

impl SourcePolicy {
    fn clean_title(&self, title: &str) -> String {
        let mut title = title.to_string();
        for pattern in &self.title_strip {
            title = pattern.replace_all(&title, "").to_string();
        }
        title.trim().to_string()
    }

    fn collection_for(&self, shelfmark: &str) -> String {
        match &self.fixed_collection {
            Some(name) => name.clone(),
            None => self.classifier.collection(shelfmark),
        }
    }
}

/// Truncate to the storage limit, marking the cut with an ellipsis.
fn truncate_contents(s: &str) -> String {
    if s.chars().count() <= CONTENTS_MAX {
        return s.to_string();
    }
    let cut: String = s.chars().take(CONTENTS_MAX - 3).collect();
    format!("{}...", cut.trim_end())
}

fn pick_label(manifest: &Value, labels: &[String]) -> Option<String> {
    let metadata = manifest.get("metadata")?;
    labels
        .iter()
        .find_map(|label| iiif::extract_metadata_value(metadata, label))
}

/// Compose a discovery stub and its (possibly absent) manifest into a
/// canonical record.
///
/// Manifest-sourced values win; stub hint fields fill the gaps. A record
/// without a shelfmark from either source is rejected: shelfmark is the
/// only mandatory field.
pub fn build_record(
    stub: &DiscoveryStub,
    manifest: Option<&Value>,
    manifest_url: Option<&str>,
    policy: &SourcePolicy,
) -> Option<ManuscriptRecord> {
    let label = manifest.and_then(iiif::manifest_label);

    // Manifest metadata first, then discovery data (the collection stub
    // label is usually the more reliable carrier), then the manifest
    // label as a last resort.
    let shelfmark = manifest
        .and_then(|m| pick_label(m, &policy.shelfmark_labels))
        .or_else(|| stub.shelfmark.clone())
        .or_else(|| {
            stub.title
                .as_deref()
                .and_then(|t| policy.shelfmark_rules.extract(t))
        })
        .or_else(|| {
            label
                .as_deref()
                .and_then(|l| policy.shelfmark_rules.extract(l))
        })
        .filter(|s| !s.trim().is_empty());
    let shelfmark = match shelfmark {
        Some(s) => s.trim().to_string(),
        None => {
            debug!("No shelfmark for {}, dropping", stub.id);
            return None;
        }
    };

    let mut record = ManuscriptRecord::new(&shelfmark);
    record.collection = Some(policy.collection_for(&shelfmark));
    record.iiif_manifest_url = manifest_url
        .map(|s| s.to_string())
        .or_else(|| stub.manifest_url.clone());

    // Title/contents: manifest metadata, then manifest label, then stub.
    let title = manifest
        .and_then(|m| pick_label(m, &policy.title_labels))
        .or(label)
        .or_else(|| stub.title.clone())
        .map(|t| policy.clean_title(&t))
        .filter(|t| !t.is_empty());
    record.contents = title.map(|t| truncate_contents(&t));

    let date_display = manifest
        .and_then(|m| pick_label(m, &policy.date_labels))
        .or_else(|| stub.date.clone());
    if let Some(date_display) = date_display {
        let range = parse_date(&date_display, &policy.date_policy);
        record.date_start = range.start;
        record.date_end = range.end;
        record.date_display = Some(date_display);
    }

    record.language = manifest.and_then(|m| pick_label(m, &policy.language_labels));
    record.folios = manifest.and_then(|m| pick_label(m, &policy.extent_labels));
    record.provenance = manifest.and_then(|m| pick_label(m, &policy.provenance_labels));

    record.thumbnail_url = manifest
        .and_then(iiif::extract_thumbnail)
        .or_else(|| stub.thumbnail_url.clone());

    if let Some(manifest) = manifest {
        let pages = iiif::count_pages(manifest);
        if pages > 0 {
            record.image_count = Some(pages as i64);
        }
    }

    record.source_url = stub.source_url.clone();

    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> SourcePolicy {
        SourcePolicy {
            title_labels: vec!["Title".to_string()],
            date_labels: vec!["Date".to_string(), "Date of Creation".to_string()],
            language_labels: vec!["Language".to_string()],
            extent_labels: vec!["Extent".to_string(), "Physical Description".to_string()],
            provenance_labels: vec!["Provenance".to_string()],
            shelfmark_labels: Vec::new(),
            shelfmark_rules: ShelfmarkExtractor::new(&[(r"MS\.?\s*(\d+[A-Za-z]?)", "MS {1}")])
                .unwrap(),
            fixed_collection: Some("Parker Library".to_string()),
            classifier: Classifier::new(None, &[]).unwrap(),
            date_policy: DatePolicy::default(),
            title_strip: vec![
                Regex::new(r"(?i)^Cambridge,?\s*Corpus Christi College,?\s*").unwrap(),
                Regex::new(r"^MS\.?\s*\d+[A-Za-z]?\s*[:\-\u{2013}]?\s*").unwrap(),
            ],
        }
    }

    fn stub() -> DiscoveryStub {
        let mut stub = DiscoveryStub::new("wz026zp2442");
        stub.shelfmark = Some("MS 16".to_string());
        stub.title = Some("stub title".to_string());
        stub
    }

    #[test]
    fn test_manifest_values_preferred() {
        let manifest = json!({
            "label": "Cambridge, Corpus Christi College, MS 16: Chronica Majora",
            "metadata": [
                {"label": "Title", "value": "Chronica Majora"},
                {"label": "Date", "value": "13th century"},
                {"label": "Language", "value": "Latin"}
            ],
            "sequences": [{"canvases": [{}, {}]}]
        });

        let record = build_record(
            &stub(),
            Some(&manifest),
            Some("https://purl.example.org/m"),
            &policy(),
        )
        .unwrap();

        assert_eq!(record.shelfmark, "MS 16");
        assert_eq!(record.collection.as_deref(), Some("Parker Library"));
        assert_eq!(record.contents.as_deref(), Some("Chronica Majora"));
        assert_eq!(record.date_display.as_deref(), Some("13th century"));
        assert_eq!(record.date_start, Some(1200));
        assert_eq!(record.date_end, Some(1299));
        assert_eq!(record.language.as_deref(), Some("Latin"));
        assert_eq!(record.image_count, Some(2));
        assert_eq!(
            record.iiif_manifest_url.as_deref(),
            Some("https://purl.example.org/m")
        );
    }

    #[test]
    fn test_stub_hints_fill_gaps() {
        let mut stub = stub();
        stub.date = Some("ca. 1420".to_string());
        stub.thumbnail_url = Some("https://cdn.example.org/t.jpg".to_string());

        let record = build_record(&stub, None, None, &policy()).unwrap();
        assert_eq!(record.shelfmark, "MS 16");
        assert_eq!(record.contents.as_deref(), Some("stub title"));
        assert_eq!(record.date_start, Some(1395));
        assert_eq!(record.date_end, Some(1445));
        assert_eq!(
            record.thumbnail_url.as_deref(),
            Some("https://cdn.example.org/t.jpg")
        );
    }

    #[test]
    fn test_shelfmark_from_manifest_label() {
        let mut stub = stub();
        stub.shelfmark = None;
        stub.title = None;
        let manifest = json!({"label": "Corpus Christi College MS 286"});

        let record = build_record(&stub, Some(&manifest), None, &policy()).unwrap();
        assert_eq!(record.shelfmark, "MS 286");
    }

    #[test]
    fn test_shelfmark_from_stub_title() {
        let mut stub = stub();
        stub.shelfmark = None;
        stub.title = Some("Corpus Christi College MS 41 - Old English Bede".to_string());
        let manifest = json!({"label": "A codex with no number"});

        let record = build_record(&stub, Some(&manifest), None, &policy()).unwrap();
        assert_eq!(record.shelfmark, "MS 41");
    }

    #[test]
    fn test_missing_shelfmark_rejects_record() {
        let mut stub = stub();
        stub.shelfmark = None;
        stub.title = None;
        assert!(build_record(&stub, None, None, &policy()).is_none());

        let manifest = json!({"label": "A codex with no number"});
        assert!(build_record(&stub, Some(&manifest), None, &policy()).is_none());
    }

    #[test]
    fn test_shelfmark_metadata_label_wins() {
        let mut policy = policy();
        policy.shelfmark_labels = vec!["Call Number".to_string()];
        let manifest = json!({
            "metadata": [{"label": "Call Number", "value": "mssEL 26 C 9"}]
        });

        let record = build_record(&stub(), Some(&manifest), None, &policy).unwrap();
        assert_eq!(record.shelfmark, "mssEL 26 C 9");
    }

    #[test]
    fn test_title_cleanup() {
        let manifest = json!({
            "label": "Cambridge, Corpus Christi College, MS 16: Chronica Majora"
        });
        let record = build_record(&stub(), Some(&manifest), None, &policy()).unwrap();
        assert_eq!(record.contents.as_deref(), Some("Chronica Majora"));
    }

    #[test]
    fn test_contents_truncation() {
        let long = "x".repeat(1200);
        let manifest = json!({"metadata": [{"label": "Title", "value": long}]});
        let record = build_record(&stub(), Some(&manifest), None, &policy()).unwrap();
        let contents = record.contents.unwrap();
        assert_eq!(contents.chars().count(), 1000);
        assert!(contents.ends_with("..."));
    }

    #[test]
    fn test_second_choice_date_label() {
        let manifest = json!({
            "metadata": [{"label": "Date of Creation", "value": "1350"}]
        });
        let record = build_record(&stub(), Some(&manifest), None, &policy()).unwrap();
        assert_eq!(record.date_display.as_deref(), Some("1350"));
        assert_eq!(record.date_start, Some(1350));
    }
}
