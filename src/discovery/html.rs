//! Discovery over server-rendered HTML result pages.

use std::collections::HashSet;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};

use super::{apply_limit, DiscoveryError};
use crate::classify::ShelfmarkExtractor;
use crate::fetch::ManifestFetcher;
use crate::models::DiscoveryStub;

/// Scrapes detail links out of paginated browse/search result pages.
///
/// Follows pages by URL template until a page yields no new items or
/// the page cap is reached.
#[derive(Debug, Clone)]
pub struct HtmlScrape {
    /// Page URL template containing `{page}`.
    pub url_template: String,
    pub first_page: usize,
    pub max_pages: usize,
    /// CSS selector for detail links.
    pub link_selector: Selector,
    /// Regex over the link href; capture 1 is the natural item ID.
    pub id_pattern: Regex,
    /// Shelfmark extraction from the link text, when the source embeds it.
    pub shelfmark_from_text: Option<ShelfmarkExtractor>,
    /// Detail-page URL template containing `{id}`.
    pub source_url_template: Option<String>,
}

/// One extracted link: (href, text).
fn extract_links(body: &str, selector: &Selector) -> Vec<(String, String)> {
    // scraper's DOM is not Send; keep it scoped so the surrounding
    // future stays Send across awaits.
    let document = Html::parse_document(body);
    document
        .select(selector)
        .filter_map(|el| {
            let href = el.value().attr("href")?.to_string();
            let text = el.text().collect::<Vec<_>>().join(" ");
            Some((href, text.trim().to_string()))
        })
        .collect()
}

impl HtmlScrape {
    pub async fn run(
        &self,
        fetcher: &dyn ManifestFetcher,
        limit: Option<usize>,
    ) -> Result<Vec<DiscoveryStub>, DiscoveryError> {
        let mut stubs = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for page in self.first_page..self.first_page + self.max_pages {
            let url = self.url_template.replace("{page}", &page.to_string());
            info!("Scraping result page {page}: {url}");

            let body = match fetcher.fetch_text(&url).await {
                Some(body) => body,
                None if page == self.first_page => return Err(DiscoveryError::Fetch(url)),
                None => break,
            };

            let links = extract_links(&body, &self.link_selector);
            let mut found = 0usize;

            for (href, text) in links {
                let id = match self
                    .id_pattern
                    .captures(&href)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
                {
                    Some(id) => id,
                    None => continue,
                };
                if !seen.insert(id.clone()) {
                    continue;
                }

                let mut stub = DiscoveryStub::new(id.clone());
                stub.shelfmark = self
                    .shelfmark_from_text
                    .as_ref()
                    .and_then(|e| e.extract(&text));
                if !text.is_empty() {
                    stub.title = Some(text);
                }
                stub.source_url = self
                    .source_url_template
                    .as_ref()
                    .map(|t| t.replace("{id}", &id));
                stubs.push(stub);
                found += 1;
            }

            info!("  {} new candidates (total: {})", found, stubs.len());

            if found == 0 {
                debug!("No new items on page {page}, stopping");
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
    use std::collections::HashMap;

    struct SiteFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl ManifestFetcher for SiteFetcher {
        async fn fetch_json(&self, _url: &str) -> Option<serde_json::Value> {
            None
        }

        async fn fetch_text(&self, url: &str) -> Option<String> {
            self.pages.get(url).cloned()
        }
    }

    fn strategy() -> HtmlScrape {
        HtmlScrape {
            url_template: "https://cat.example.org/browse?page={page}".to_string(),
            first_page: 1,
            max_pages: 10,
            link_selector: Selector::parse(r#"a[href*="/catalog/"]"#).unwrap(),
            id_pattern: Regex::new(r"/catalog/([a-z]{2}\d{3}[a-z]{2}\d{4})").unwrap(),
            shelfmark_from_text: Some(
                ShelfmarkExtractor::new(&[(r"MS\.?\s*(\d+[A-Za-z]?)", "MS {1}")]).unwrap(),
            ),
            source_url_template: Some("https://cat.example.org/catalog/{id}".to_string()),
        }
    }

    #[tokio::test]
    async fn test_scrape_extracts_ids_and_shelfmarks() {
        let mut pages = HashMap::new();
        pages.insert(
            "https://cat.example.org/browse?page=1".to_string(),
            r#"<html><body>
                <a href="/catalog/wz026zp2442">MS 16: Chronica Majora</a>
                <a href="/catalog/wz026zp2442">duplicate</a>
                <a href="/catalog/ab123cd4567">MS 286</a>
                <a href="/about">About</a>
            </body></html>"#
                .to_string(),
        );
        pages.insert(
            "https://cat.example.org/browse?page=2".to_string(),
            "<html><body>no links</body></html>".to_string(),
        );

        let stubs = strategy().run(&SiteFetcher { pages }, None).await.unwrap();
        assert_eq!(stubs.len(), 2);
        assert_eq!(stubs[0].id, "wz026zp2442");
        assert_eq!(stubs[0].shelfmark.as_deref(), Some("MS 16"));
        assert_eq!(
            stubs[0].source_url.as_deref(),
            Some("https://cat.example.org/catalog/wz026zp2442")
        );
        assert_eq!(stubs[1].shelfmark.as_deref(), Some("MS 286"));
    }

    #[tokio::test]
    async fn test_page_cap() {
        let mut pages = HashMap::new();
        for page in 1..=4 {
            pages.insert(
                format!("https://cat.example.org/browse?page={page}"),
                format!(
                    r#"<a href="/catalog/aa{page:03}bb{page:04}">MS {page}</a>"#
                ),
            );
        }
        let mut s = strategy();
        s.max_pages = 2;
        let stubs = s.run(&SiteFetcher { pages }, None).await.unwrap();
        assert_eq!(stubs.len(), 2);
    }
}
