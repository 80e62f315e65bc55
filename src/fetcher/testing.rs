use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::crawler::CrawlConfig;
use crate::error::Result;
use crate::fetcher::{FetchFailure, FetchOutcome, FetcherFactory, PageFetcher};

/// Fetcher double answering from a fixed URL → outcome table.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, FetchOutcome>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages
            .insert(url.to_string(), FetchOutcome::success(html, url));
        self
    }

    pub fn redirect(mut self, url: &str, final_url: &str, html: &str) -> Self {
        self.pages
            .insert(url.to_string(), FetchOutcome::success(html, final_url));
        self
    }

    pub fn fail(mut self, url: &str, reason: FetchFailure) -> Self {
        self.pages
            .insert(url.to_string(), FetchOutcome::failure(reason));
        self
    }

    /// Requested URL and referer for every call, in order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> FetchOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), referer.map(str::to_string)));

        self.pages.get(url).cloned().unwrap_or_else(|| {
            FetchOutcome::failure(FetchFailure::Transport(format!("unscripted URL {}", url)))
        })
    }

    fn strategy(&self) -> &'static str {
        "scripted"
    }
}

/// Hands out the same scripted fetcher for every crawl.
pub struct FixedFetchers(pub Arc<ScriptedFetcher>);

impl FetcherFactory for FixedFetchers {
    fn fetcher_for(&self, _config: &CrawlConfig) -> Result<Arc<dyn PageFetcher>> {
        let fetcher: Arc<dyn PageFetcher> = self.0.clone();
        Ok(fetcher)
    }
}
