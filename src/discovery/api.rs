//! Paginated JSON API enumeration.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::{apply_limit, DiscoveryError};
use crate::fetch::ManifestFetcher;
use crate::models::DiscoveryStub;

/// Where to find a stub field inside one item of the listing response.
#[derive(Debug, Clone)]
pub enum FieldRef {
    /// Dotted key path into the item object, e.g. `"thumbnailUri"` or
    /// `"links.self"`.
    Key(String),
    /// Named entry in the item's key/value metadata array (the
    /// ContentDM-style `metadataFields: [{field, value}, ...]` shape).
    Meta(String),
}

impl FieldRef {
    pub fn key(s: &str) -> Self {
        FieldRef::Key(s.to_string())
    }

    pub fn meta(s: &str) -> Self {
        FieldRef::Meta(s.to_string())
    }
}

/// Enumerates a paginated JSON search/listing endpoint until an empty
/// page or the page cap is reached.
#[derive(Debug, Clone)]
pub struct ApiEnumeration {
    /// Page URL template containing `{page}`.
    pub url_template: String,
    pub first_page: usize,
    pub max_pages: usize,
    /// JSON pointer to the item array in a page response, e.g. `/items`.
    pub items_pointer: String,
    /// Base for resolving relative links (thumbnails in particular).
    pub base_url: Option<Url>,
    /// Key/value metadata array within an item, when the source uses one.
    pub metadata_array: Option<MetaArray>,
    pub id_field: FieldRef,
    pub shelfmark_field: Option<FieldRef>,
    pub title_field: Option<FieldRef>,
    pub date_field: Option<FieldRef>,
    pub thumbnail_field: Option<FieldRef>,
    pub manifest_url_field: Option<FieldRef>,
}

/// Shape of a `[{field, value}, ...]` metadata array within an item.
#[derive(Debug, Clone)]
pub struct MetaArray {
    pub pointer: String,
    pub key_prop: String,
    pub value_prop: String,
}

fn lookup_key<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = item;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ApiEnumeration {
    fn resolve(&self, item: &Value, field: &FieldRef) -> Option<String> {
        match field {
            FieldRef::Key(path) => lookup_key(item, path).and_then(as_text),
            FieldRef::Meta(name) => {
                let meta = self.metadata_array.as_ref()?;
                let entries = item.pointer(&meta.pointer)?.as_array()?;
                entries.iter().find_map(|entry| {
                    let key = entry.get(&meta.key_prop)?.as_str()?;
                    if key == name {
                        entry.get(&meta.value_prop).and_then(as_text)
                    } else {
                        None
                    }
                })
            }
        }
    }

    /// Resolve a relative link against the configured base URL.
    fn absolutize(&self, link: &str) -> String {
        if link.starts_with("http") {
            return link.to_string();
        }
        match &self.base_url {
            Some(base) => base
                .join(link)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| link.to_string()),
            None => link.to_string(),
        }
    }

    fn stub_from_item(&self, item: &Value) -> Option<DiscoveryStub> {
        let id = self.resolve(item, &self.id_field)?;
        let mut stub = DiscoveryStub::new(id);
        stub.shelfmark = self
            .shelfmark_field
            .as_ref()
            .and_then(|f| self.resolve(item, f));
        stub.title = self
            .title_field
            .as_ref()
            .and_then(|f| self.resolve(item, f));
        stub.date = self.date_field.as_ref().and_then(|f| self.resolve(item, f));
        stub.thumbnail_url = self
            .thumbnail_field
            .as_ref()
            .and_then(|f| self.resolve(item, f))
            .map(|link| self.absolutize(&link));
        stub.manifest_url = self
            .manifest_url_field
            .as_ref()
            .and_then(|f| self.resolve(item, f));
        Some(stub)
    }

    pub async fn run(
        &self,
        fetcher: &dyn ManifestFetcher,
        limit: Option<usize>,
    ) -> Result<Vec<DiscoveryStub>, DiscoveryError> {
        let mut stubs = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for page in self.first_page..self.first_page + self.max_pages {
            let url = self.url_template.replace("{page}", &page.to_string());
            info!("Enumerating page {page}: {url}");

            let data = match fetcher.fetch_json(&url).await {
                Some(data) => data,
                // First page unreachable means the listing itself is
                // broken; later pages may legitimately run out.
                None if page == self.first_page => {
                    return Err(DiscoveryError::Fetch(url));
                }
                None => break,
            };

            let items = data
                .pointer(&self.items_pointer)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            if items.is_empty() {
                debug!("Page {page} is empty, stopping");
                break;
            }

            let mut found = 0usize;
            for item in &items {
                if let Some(stub) = self.stub_from_item(item) {
                    if seen.insert(stub.id.clone()) {
                        stubs.push(stub);
                        found += 1;
                    }
                }
            }
            info!("  {} new candidates (total: {})", found, stubs.len());

            if found == 0 {
                break;
            }
            if let Some(limit) = limit {
                if stubs.len() >= limit {
                    break;
                }
            }
        }

        apply_limit(&mut stubs, limit);
        Ok(stubs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    struct PageFetcher {
        pages: HashMap<String, Value>,
    }

    #[async_trait]
    impl ManifestFetcher for PageFetcher {
        async fn fetch_json(&self, url: &str) -> Option<Value> {
            self.pages.get(url).cloned()
        }

        async fn fetch_text(&self, _url: &str) -> Option<String> {
            None
        }
    }

    fn strategy() -> ApiEnumeration {
        ApiEnumeration {
            url_template: "https://api.example.org/list?page={page}".to_string(),
            first_page: 1,
            max_pages: 10,
            items_pointer: "/items".to_string(),
            base_url: Some(Url::parse("https://api.example.org").unwrap()),
            metadata_array: Some(MetaArray {
                pointer: "/metadataFields".to_string(),
                key_prop: "field".to_string(),
                value_prop: "value".to_string(),
            }),
            id_field: FieldRef::key("itemId"),
            shelfmark_field: Some(FieldRef::meta("callid")),
            title_field: Some(FieldRef::meta("title")),
            date_field: Some(FieldRef::meta("date")),
            thumbnail_field: Some(FieldRef::key("thumbnailUri")),
            manifest_url_field: None,
        }
    }

    fn item(id: u64, callid: &str) -> Value {
        json!({
            "itemId": id,
            "thumbnailUri": format!("https://cdn.example.org/{id}.jpg"),
            "metadataFields": [
                {"field": "callid", "value": callid},
                {"field": "title", "value": "Book of Hours"},
                {"field": "date", "value": "15th century"}
            ]
        })
    }

    #[tokio::test]
    async fn test_paginates_until_empty_page() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://api.example.org/list?page=1".to_string(),
            json!({"items": [item(1, "HM 1"), item(2, "HM 2")]}),
        );
        pages.insert(
            "https://api.example.org/list?page=2".to_string(),
            json!({"items": [item(3, "HM 3")]}),
        );
        pages.insert(
            "https://api.example.org/list?page=3".to_string(),
            json!({"items": []}),
        );

        let stubs = strategy()
            .run(&PageFetcher { pages }, None)
            .await
            .unwrap();
        assert_eq!(stubs.len(), 3);
        assert_eq!(stubs[0].id, "1");
        assert_eq!(stubs[0].shelfmark.as_deref(), Some("HM 1"));
        assert_eq!(stubs[0].date.as_deref(), Some("15th century"));
        assert_eq!(
            stubs[0].thumbnail_url.as_deref(),
            Some("https://cdn.example.org/1.jpg")
        );
    }

    #[tokio::test]
    async fn test_relative_thumbnail_resolved() {
        let mut pages = HashMap::new();
        let mut it = item(9, "HM 9");
        it["thumbnailUri"] = json!("/utils/getthumbnail/9");
        pages.insert(
            "https://api.example.org/list?page=1".to_string(),
            json!({"items": [it]}),
        );

        let stubs = strategy().run(&PageFetcher { pages }, None).await.unwrap();
        assert_eq!(
            stubs[0].thumbnail_url.as_deref(),
            Some("https://api.example.org/utils/getthumbnail/9")
        );
    }

    #[tokio::test]
    async fn test_dedup_and_limit() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://api.example.org/list?page=1".to_string(),
            json!({"items": [item(1, "HM 1"), item(1, "HM 1"), item(2, "HM 2")]}),
        );
        pages.insert(
            "https://api.example.org/list?page=2".to_string(),
            json!({"items": [item(3, "HM 3")]}),
        );

        let stubs = strategy()
            .run(&PageFetcher { pages }, Some(2))
            .await
            .unwrap();
        assert_eq!(stubs.len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_first_page_is_fatal() {
        let result = strategy()
            .run(
                &PageFetcher {
                    pages: HashMap::new(),
                },
                None,
            )
            .await;
        assert!(matches!(result, Err(DiscoveryError::Fetch(_))));
    }
}
