use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::crawler::{page_block, CrawlConfig, CrawlResult, LinkSelector};
use crate::fetcher::{FetchOutcome, PageFetcher};
use crate::parser::{extract_article, extract_links_with_context, LinkInfo};

pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(500);
/// Links offered to the selector per crawl.
pub const MAX_LINKS_FOR_SELECTION: usize = 100;

/// Seed page, then selector-chosen links, one fetch at a time.
///
/// A crawl never fails as a whole. A dead seed yields an empty result with
/// the seed recorded in `errors`; dead article links are recorded and
/// skipped; pages with no extractable text are skipped silently.
pub struct GuidedCrawler {
    fetcher: Arc<dyn PageFetcher>,
    selector: Arc<dyn LinkSelector>,
    model: String,
    request_delay: Duration,
    max_links_for_selection: usize,
}

#[derive(Default)]
struct ScrapeProgress {
    blocks: Vec<String>,
    pages_visited: Vec<String>,
    errors: Vec<String>,
}

impl GuidedCrawler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        selector: Arc<dyn LinkSelector>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            selector,
            model: model.into(),
            request_delay: DEFAULT_REQUEST_DELAY,
            max_links_for_selection: MAX_LINKS_FOR_SELECTION,
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_max_links_for_selection(mut self, max_links: usize) -> Self {
        self.max_links_for_selection = max_links.max(1);
        self
    }

    pub async fn crawl(&self, config: &CrawlConfig) -> CrawlResult {
        info!(
            "Fetching seed URL {} ({})",
            config.seed_url,
            self.fetcher.strategy()
        );

        let (seed_html, seed_url) = match self.fetcher.fetch(&config.seed_url, None).await {
            FetchOutcome::Success { html, final_url } => (html, final_url),
            FetchOutcome::Failure { reason } => {
                error!("Failed to fetch seed URL {}: {}", config.seed_url, reason);
                return CrawlResult {
                    errors: vec![config.seed_url.clone()],
                    ..CrawlResult::default()
                };
            }
        };

        let mut links = extract_links_with_context(&seed_html, &seed_url);
        info!("Found {} links on seed page {}", links.len(), seed_url);
        if links.is_empty() {
            warn!("No links found on seed page {}", seed_url);
            return CrawlResult::default();
        }
        links.truncate(self.max_links_for_selection);

        let selected = self.select(&links, &seed_url, config.max_links_to_scrape).await;
        if selected.is_empty() {
            warn!("No links selected from {}", seed_url);
            return CrawlResult::default();
        }
        info!("Selected {} links for scraping", selected.len());

        let progress = self.scrape_selected(selected, &seed_url).await;

        CrawlResult {
            corpus: progress.blocks.join("\n\n"),
            pages_visited: progress.pages_visited,
            errors: progress.errors,
        }
    }

    /// Selector output restricted to offered URLs, deduplicated, in order.
    async fn select(&self, links: &[LinkInfo], seed_url: &str, max_links: usize) -> Vec<String> {
        let chosen = match self.selector.select_links(links, seed_url, &self.model).await {
            Ok(urls) => urls,
            Err(e) => {
                error!("Link selection failed for {}: {}", seed_url, e);
                return Vec::new();
            }
        };

        let offered: HashSet<&str> = links.iter().map(|link| link.url.as_str()).collect();
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for url in chosen {
            if !offered.contains(url.as_str()) {
                warn!("Selector returned a URL that was not offered: {}", url);
                continue;
            }
            if seen.insert(url.clone()) {
                selected.push(url);
            }
        }

        selected.truncate(max_links);
        selected
    }

    async fn scrape_selected(&self, urls: Vec<String>, seed_url: &str) -> ScrapeProgress {
        stream::iter(urls.into_iter().enumerate())
            .fold(ScrapeProgress::default(), |mut progress, (index, url)| async move {
                if index > 0 && !self.request_delay.is_zero() {
                    tokio::time::sleep(self.request_delay).await;
                }

                info!("Scraping article {}", url);
                match self.fetcher.fetch(&url, Some(seed_url)).await {
                    FetchOutcome::Success { html, final_url } => {
                        let text = extract_article(&html);
                        if text.is_empty() {
                            info!("No article text at {}, skipping", final_url);
                        } else {
                            info!("Extracted {} chars from {}", text.chars().count(), final_url);
                            progress.blocks.push(page_block(&final_url, &text));
                            progress.pages_visited.push(final_url);
                        }
                    }
                    FetchOutcome::Failure { reason } => {
                        warn!("Failed to fetch {}: {}", url, reason);
                        progress.errors.push(url);
                    }
                }

                progress
            })
            .await
    }
}
