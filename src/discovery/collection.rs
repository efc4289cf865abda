//! Recursive IIIF collection-tree crawl.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{apply_limit, DiscoveryError};
use crate::fetch::ManifestFetcher;
use crate::iiif;
use crate::models::DiscoveryStub;

/// Walks nested IIIF Collection documents (v2 `manifests`/`collections`
/// or v3 `items`), collecting manifest references. Deduplicates by
/// manifest ID across the whole tree and bounds recursion depth.
#[derive(Debug, Clone)]
pub struct CollectionCrawl {
    pub roots: Vec<String>,
    pub max_depth: usize,
}

fn entry_id(entry: &Value) -> Option<String> {
    entry
        .get("@id")
        .or_else(|| entry.get("id"))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

fn entry_type(entry: &Value) -> Option<&str> {
    entry
        .get("@type")
        .or_else(|| entry.get("type"))
        .and_then(Value::as_str)
}

fn is_manifest(entry: &Value) -> bool {
    matches!(entry_type(entry), Some("sc:Manifest") | Some("Manifest"))
}

fn is_collection(entry: &Value) -> bool {
    matches!(
        entry_type(entry),
        Some("sc:Collection") | Some("Collection")
    )
}

/// All child entries of a collection document, either dialect.
fn children(document: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    for key in ["manifests", "collections", "items"] {
        if let Some(entries) = document.get(key).and_then(Value::as_array) {
            out.extend(entries.iter());
        }
    }
    out
}

impl CollectionCrawl {
    pub async fn run(
        &self,
        fetcher: &dyn ManifestFetcher,
        limit: Option<usize>,
    ) -> Result<Vec<DiscoveryStub>, DiscoveryError> {
        let mut stubs = Vec::new();
        let mut seen_manifests: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();

        // Depth-first with an explicit stack; recursion depth is part of
        // each entry so one bad self-referencing tree cannot loop.
        let mut stack: Vec<(String, usize)> = self
            .roots
            .iter()
            .rev()
            .map(|url| (url.clone(), 0))
            .collect();
        let mut any_root_ok = false;

        while let Some((url, depth)) = stack.pop() {
            if depth > self.max_depth || !visited.insert(url.clone()) {
                continue;
            }

            let document = match fetcher.fetch_json(&url).await {
                Some(document) => document,
                None => {
                    warn!("Failed to fetch collection {url}");
                    continue;
                }
            };
            if depth == 0 {
                any_root_ok = true;
            }

            let label = iiif::manifest_label(&document).unwrap_or_default();
            debug!("Collection [depth {depth}] {label}");

            let mut sub = Vec::new();
            for entry in children(&document) {
                let id = match entry_id(entry) {
                    Some(id) => id,
                    None => continue,
                };
                if is_manifest(entry) {
                    if seen_manifests.insert(id.clone()) {
                        let mut stub = DiscoveryStub::new(id.clone());
                        stub.manifest_url = Some(id);
                        stub.title = entry.get("label").and_then(|l| {
                            iiif::LabelValue::from_value(l).and_then(|v| v.to_plain())
                        });
                        stubs.push(stub);
                    }
                } else if is_collection(entry) {
                    sub.push((id, depth + 1));
                }
            }
            // Preserve catalogue order for the sub-collections.
            for entry in sub.into_iter().rev() {
                stack.push(entry);
            }

            info!("  {} manifests so far", stubs.len());

            if let Some(limit) = limit {
                if stubs.len() >= limit {
                    break;
                }
            }
        }

        if !any_root_ok && stubs.is_empty() {
            return Err(DiscoveryError::Fetch(
                self.roots.first().cloned().unwrap_or_default(),
            ));
        }

        apply_limit(&mut stubs, limit);
        Ok(stubs)
    }
}
