//! Integration tests wiring the crawler, embedding pipeline, and
//! orchestrator together against a synthetic site.

use crate::render::PageRenderer;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};


/// In-memory site standing in for the render capability.
///
/// Counts render invocations per URL so tests can assert that no URL is
/// ever fetched twice within one crawl run.
pub struct FakeSite {
    pages: HashMap<String, String>,
    hits: Mutex<HashMap<String, usize>>,
}

impl FakeSite {
    pub fn new(pages: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .iter()
                .map(|(url, html)| (url.to_string(), html.to_string()))
                .collect(),
            hits: Mutex::new(HashMap::new()),
        })
    }

    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }
}

impl PageRenderer for Arc<FakeSite> {
    async fn render(&self, url: &str) -> Option<String> {
        *self
            .hits
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        self.pages.get(url).cloned()
    }
}

/// Crawl settings pointed at the synthetic site, with pacing disabled so
/// tests run instantly.
pub fn test_crawl_config() -> crate::config::CrawlConfig {
    crate::config::CrawlConfig {
        origin: "https://example.com".to_string(),
        seed_urls: vec!["https://example.com/documentation/".to_string()],
        request_delay_ms: 0,
        follow_pattern: "/documentation/".to_string(),
        ..Default::default()
    }
}
