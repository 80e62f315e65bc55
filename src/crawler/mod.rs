pub mod orchestrator;


use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::parser::LinkInfo;

pub use orchestrator::GuidedCrawler;

/// How one source is crawled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub seed_url: String,
    pub max_links_to_scrape: usize,
    pub use_rendered_fetch: bool,
    pub wait_selector: Option<String>,
    pub wait_timeout_ms: u64,
    pub timeout_seconds: u64,
}

impl CrawlConfig {
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            max_links_to_scrape: 3,
            use_rendered_fetch: false,
            wait_selector: None,
            wait_timeout_ms: 5000,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub corpus: String,
    /// Final URLs of pages that contributed a block, in fetch order.
    pub pages_visited: Vec<String>,
    /// URLs whose fetch failed.
    pub errors: Vec<String>,
}

impl CrawlResult {
    pub fn is_empty(&self) -> bool {
        self.corpus.trim().is_empty()
    }
}

/// Marker line that opens every page block in a corpus.
pub fn page_marker(final_url: &str) -> String {
    format!("--- PAGE: {} ---", final_url)
}

pub fn page_block(final_url: &str, text: &str) -> String {
    format!("{}\n{}", page_marker(final_url), text)
}

/// Picks which of the offered links are worth scraping.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkSelector: Send + Sync {
    async fn select_links(
        &self,
        links: &[LinkInfo],
        source_url: &str,
        model: &str,
    ) -> Result<Vec<String>>;
}
