//! Breadth-limited, depth-limited, deduplicating crawl of a documentation
//! site.
//!
//! Traversal is depth-first and sequential: one page at a time, one shared
//! visited set for the whole run, a pacing delay before every fetch. A
//! page that fails to render or parse yields an empty subtree and nothing
//! else; siblings and ancestors carry on.

use crate::config::CrawlConfig;
use crate::docs::Document;
use crate::render::PageRenderer;
use crate::semantic::normalize_text;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Decides which URLs get resolved, extracted, and traversed.
pub struct LinkPolicy {
    origin: Url,
    follow: Regex,
    media: Regex,
}

impl LinkPolicy {
    pub fn from_config(config: &CrawlConfig) -> anyhow::Result<Self> {
        Ok(Self {
            origin: Url::parse(&config.origin)?,
            follow: Regex::new(&config.follow_pattern)?,
            media: Regex::new(&config.media_pattern)?,
        })
    }

    /// Resolve an href to an absolute URL on the configured origin.
    ///
    /// Root-relative hrefs are joined onto the origin; absolute hrefs are
    /// kept only when they already live on the origin. Anything else
    /// (other hosts, fragments, mailto) is discarded.
    pub fn resolve(&self, href: &str) -> Option<String> {
        if href.starts_with('/') {
            return self.origin.join(href).ok().map(String::from);
        }

        if href.starts_with("http://") || href.starts_with("https://") {
            let parsed = Url::parse(href).ok()?;
            if parsed.host_str() == self.origin.host_str() {
                return Some(parsed.into());
            }
        }

        None
    }

    /// Media URLs are never traversed; everything else is followed only
    /// when it matches the documentation-path pattern.
    pub fn should_follow(&self, url: &str) -> bool {
        !self.media.is_match(url) && self.follow.is_match(url)
    }
}

struct PageExtraction {
    documents: Vec<Document>,
    links: Vec<String>,
}

pub struct Crawler<R> {
    renderer: R,
    policy: LinkPolicy,
    request_delay: Duration,
    doc_cap: usize,
}

impl<R: PageRenderer> Crawler<R> {
    pub fn new(config: &CrawlConfig, renderer: R) -> anyhow::Result<Self> {
        Ok(Self {
            renderer,
            policy: LinkPolicy::from_config(config)?,
            request_delay: Duration::from_millis(config.request_delay_ms),
            doc_cap: config.doc_cap,
        })
    }

    /// Crawl from `seeds`, following links up to `max_depth` hops deep.
    ///
    /// Returns the documents in discovery order. No URL is fetched twice
    /// within one run, regardless of how many paths reach it.
    pub async fn crawl(&self, seeds: &[String], max_depth: u32) -> Vec<Document> {
        let mut visited = HashSet::new();
        let mut documents = Vec::new();

        for seed in seeds {
            self.crawl_page(seed.clone(), max_depth, &mut visited, &mut documents)
                .await;
        }

        log::info!(
            "crawl finished: {} pages visited, {} documents",
            visited.len(),
            documents.len()
        );

        documents
    }

    fn crawl_page<'a>(
        &'a self,
        url: String,
        depth: u32,
        visited: &'a mut HashSet<String>,
        documents: &'a mut Vec<Document>,
    ) -> Pin<Box<dyn Future<Output = ()> + 'a>> {
        Box::pin(async move {
            if depth == 0 || visited.contains(&url) {
                return;
            }

            if documents.len() >= self.doc_cap {
                return;
            }

            // Mark before fetching so no other path into this URL can
            // schedule a second visit.
            visited.insert(url.clone());

            tokio::time::sleep(self.request_delay).await;

            let Some(html) = self.renderer.render(&url).await else {
                log::debug!("{url}: render failed, skipping subtree");
                return;
            };

            let page = self.extract_page(&html);
            log::debug!(
                "{url}: {} snippets, {} links to follow",
                page.documents.len(),
                page.links.len()
            );

            documents.extend(page.documents);

            for link in page.links {
                if documents.len() >= self.doc_cap {
                    log::debug!("document cap reached, stopping sibling traversal");
                    break;
                }

                self.crawl_page(link, depth - 1, visited, documents).await;
            }
        })
    }

    /// Pull text snippets and followable links out of one page.
    ///
    /// Snippets are deduplicated within the page by case-insensitive
    /// normalized text; the first occurrence wins. Duplicate text across
    /// pages is not deduplicated.
    fn extract_page(&self, html: &str) -> PageExtraction {
        let parsed = Html::parse_document(html);

        let mut documents = Vec::new();
        let mut links = Vec::new();
        let mut seen_text = HashSet::new();

        for anchor in parsed.select(&ANCHOR_SELECTOR) {
            let href = anchor.attr("href").unwrap_or_default();
            let Some(resolved) = self.policy.resolve(href) else {
                continue;
            };

            let text = anchor.text().collect::<String>();
            let text = text.trim();

            if !text.is_empty() && seen_text.insert(normalize_text(text)) {
                documents.push(Document::new(text, resolved.clone()));
            }

            if self.policy.should_follow(&resolved) {
                links.push(resolved);
            }
        }

        PageExtraction { documents, links }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LinkPolicy {
        LinkPolicy::from_config(&CrawlConfig::default()).unwrap()
    }

    #[test]
    fn test_resolve_root_relative() {
        let policy = policy();
        assert_eq!(
            policy.resolve("/documentation/swiftui"),
            Some("https://developer.apple.com/documentation/swiftui".to_string())
        );
    }

    #[test]
    fn test_resolve_keeps_on_origin_absolute() {
        let policy = policy();
        let url = "https://developer.apple.com/documentation/swift";
        assert_eq!(policy.resolve(url), Some(url.to_string()));
    }

    #[test]
    fn test_resolve_rejects_foreign_hosts() {
        let policy = policy();
        assert_eq!(policy.resolve("https://example.com/documentation/"), None);
        assert_eq!(policy.resolve("mailto:docs@example.com"), None);
        assert_eq!(policy.resolve("#section"), None);
    }

    #[test]
    fn test_media_urls_not_followed() {
        let policy = policy();
        assert!(!policy.should_follow("https://developer.apple.com/documentation/videos/foo"));
        assert!(!policy.should_follow("https://developer.apple.com/video/intro"));
        assert!(!policy.should_follow("https://developer.apple.com/documentation/clip.mp4"));
    }

    #[test]
    fn test_only_documentation_paths_followed() {
        let policy = policy();
        assert!(policy.should_follow("https://developer.apple.com/documentation/swiftui"));
        assert!(!policy.should_follow("https://developer.apple.com/support/"));
    }

    struct NullRenderer;

    impl PageRenderer for NullRenderer {
        async fn render(&self, _url: &str) -> Option<String> {
            None
        }
    }

    fn crawler() -> Crawler<NullRenderer> {
        Crawler::new(&CrawlConfig::default(), NullRenderer).unwrap()
    }

    #[test]
    fn test_extraction_dedups_case_insensitively() {
        let html = r#"
            <html><body>
                <a href="/documentation/swift/concurrency">Swift Concurrency</a>
                <a href="/documentation/swift/concurrency2">swift concurrency</a>
                <a href="/documentation/charts">Swift Charts</a>
            </body></html>
        "#;

        let page = crawler().extract_page(html);

        let texts: Vec<&str> = page.documents.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["Swift Concurrency", "Swift Charts"]);
    }

    #[test]
    fn test_extraction_skips_empty_text() {
        let html = r#"
            <html><body>
                <a href="/documentation/swift">   </a>
                <a href="/documentation/charts">Charts</a>
            </body></html>
        "#;

        let page = crawler().extract_page(html);
        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.documents[0].text, "Charts");
    }

    #[test]
    fn test_extraction_collects_followable_links_only() {
        let html = r#"
            <html><body>
                <a href="/documentation/swiftui">SwiftUI</a>
                <a href="/documentation/videos/wwdc">Session video</a>
                <a href="/support/">Support</a>
            </body></html>
        "#;

        let page = crawler().extract_page(html);

        assert_eq!(
            page.links,
            vec!["https://developer.apple.com/documentation/swiftui".to_string()]
        );
        // the video and support anchors still contribute text
        assert_eq!(page.documents.len(), 3);
    }
}
