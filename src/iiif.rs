//! Tolerant metadata extraction over IIIF Presentation manifests.
//!
//! Institutions serve an inconsistent mix of Presentation API v2 and v3
//! documents, and even within one dialect a label or value may be a bare
//! string, a `{"@value": ...}` object, a list of either, or a v3 language
//! map. Rather than duck-typing every access, the label/value shapes are
//! modeled as one tagged union with a single normalization path.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// Every shape a IIIF label or value is seen in across v2/v3 manifests.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LabelValue {
    /// Plain string: `"Language"`.
    Plain(String),
    /// v2 single-language object: `{"@value": "Latin", "@language": "en"}`.
    Legacy {
        #[serde(rename = "@value")]
        value: String,
    },
    /// v3 language map: `{"none": ["Latin"]}` or `{"en": [...]}`.
    Localized(BTreeMap<String, Vec<String>>),
    /// A list of any of the above.
    Many(Vec<LabelValue>),
}

impl LabelValue {
    /// Parse from raw JSON; `None` for shapes that are not label-like.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Resolve to a plain string using first-available-language order,
    /// joining multiple values with "; ". `None` when nothing resolves.
    pub fn to_plain(&self) -> Option<String> {
        let s = match self {
            LabelValue::Plain(s) => s.clone(),
            LabelValue::Legacy { value } => value.clone(),
            LabelValue::Localized(map) => {
                // Prefer English, then "none", then whatever comes first.
                let values = map
                    .get("en")
                    .or_else(|| map.get("none"))
                    .or_else(|| map.values().next())?;
                values.join("; ")
            }
            LabelValue::Many(items) => items
                .iter()
                .filter_map(|v| v.to_plain())
                .collect::<Vec<_>>()
                .join("; "),
        };
        let s = s.trim().to_string();
        if s.is_empty() {
            None
        } else {
            Some(s)
        }
    }
}

static MARKUP_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip embedded markup tags and collapse whitespace.
pub fn strip_markup(s: &str) -> String {
    let s = MARKUP_TAG.replace_all(s, " ");
    WHITESPACE.replace_all(&s, " ").trim().to_string()
}

fn normalize(value: &Value) -> Option<String> {
    LabelValue::from_value(value)?.to_plain()
}

/// Extract a value from a manifest's `metadata` array by label.
///
/// Label comparison is case- and whitespace-insensitive; the returned
/// value has markup stripped and whitespace collapsed. `None` when the
/// label is absent or resolves to an empty string.
pub fn extract_metadata_value(metadata: &Value, label: &str) -> Option<String> {
    let wanted = label.trim().to_lowercase();
    for entry in metadata.as_array()? {
        let entry_label = match entry.get("label").and_then(normalize) {
            Some(l) => l,
            None => continue,
        };
        if entry_label.trim().to_lowercase() != wanted {
            continue;
        }
        let value = entry.get("value").and_then(normalize)?;
        let value = strip_markup(&value);
        return if value.is_empty() { None } else { Some(value) };
    }
    None
}

/// The manifest's top-level label, normalized to a plain string.
pub fn manifest_label(manifest: &Value) -> Option<String> {
    let label = manifest.get("label").and_then(normalize)?;
    let label = strip_markup(&label);
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Canvas list across dialects: v2 `sequences[0].canvases`, v3 `items`.
fn canvases(manifest: &Value) -> Option<&Vec<Value>> {
    if let Some(canvases) = manifest
        .get("sequences")
        .and_then(|s| s.get(0))
        .and_then(|s| s.get("canvases"))
        .and_then(Value::as_array)
    {
        return Some(canvases);
    }
    manifest.get("items").and_then(Value::as_array)
}

/// Count of canvas/page entries in the manifest.
pub fn count_pages(manifest: &Value) -> usize {
    canvases(manifest).map(|c| c.len()).unwrap_or(0)
}

fn id_of(value: &Value) -> Option<String> {
    value
        .get("@id")
        .or_else(|| value.get("id"))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// First entry of a value that may be a single object or an array.
fn first<'a>(value: &'a Value) -> Option<&'a Value> {
    match value {
        Value::Array(items) => items.first(),
        Value::Null => None,
        other => Some(other),
    }
}

/// Image-service base URL of a canvas's first image, either dialect.
fn canvas_image_service(canvas: &Value) -> Option<String> {
    // v2: canvas.images[0].resource.service
    // v3: canvas.items[0].items[0].body.service
    let resource = canvas
        .get("images")
        .and_then(first)
        .and_then(|img| img.get("resource"))
        .or_else(|| {
            canvas
                .get("items")
                .and_then(first)
                .and_then(|page| page.get("items"))
                .and_then(first)
                .and_then(|anno| anno.get("body"))
        })?;

    if let Some(service) = resource.get("service").and_then(first) {
        if let Some(id) = id_of(service) {
            return Some(id);
        }
    }
    None
}

/// Direct image URL of a canvas's first image, either dialect.
fn canvas_image_id(canvas: &Value) -> Option<String> {
    let resource = canvas
        .get("images")
        .and_then(first)
        .and_then(|img| img.get("resource"))
        .or_else(|| {
            canvas
                .get("items")
                .and_then(first)
                .and_then(|page| page.get("items"))
                .and_then(first)
                .and_then(|anno| anno.get("body"))
        })?;
    id_of(resource)
}

/// Extract a thumbnail URL from a manifest.
///
/// Preference order: manifest-level `thumbnail`, then the first canvas's
/// image-service URL with IIIF resize parameters appended, then the first
/// canvas's direct image ID.
pub fn extract_thumbnail(manifest: &Value) -> Option<String> {
    if let Some(thumb) = manifest.get("thumbnail").and_then(first) {
        match thumb {
            Value::String(s) => return Some(s.clone()),
            other => {
                if let Some(id) = id_of(other) {
                    return Some(id);
                }
            }
        }
    }

    let canvas = canvases(manifest)?.first()?;
    if let Some(service) = canvas_image_service(canvas) {
        return Some(format!(
            "{}/full/200,/0/default.jpg",
            service.trim_end_matches('/')
        ));
    }
    canvas_image_id(canvas)
}
