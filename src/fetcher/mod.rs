pub mod rendered;
pub mod static_fetch;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::browser::RenderedSession;
use crate::crawler::CrawlConfig;
use crate::error::Result;

pub use rendered::{RenderedFetcher, RenderOptions};
pub use static_fetch::StaticFetcher;

/// Why a single page could not be fetched. Never fatal to a crawl.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("timed out")]
    Timeout,

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("not HTML ({0})")]
    NotHtml(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("render error: {0}")]
    RenderError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// `final_url` is the post-redirect address and is the page's canonical source.
    Success { html: String, final_url: String },
    Failure { reason: FetchFailure },
}

impl FetchOutcome {
    pub fn success(html: impl Into<String>, final_url: impl Into<String>) -> Self {
        FetchOutcome::Success {
            html: html.into(),
            final_url: final_url.into(),
        }
    }

    pub fn failure(reason: FetchFailure) -> Self {
        FetchOutcome::Failure { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Fetches one URL. Implementations must never panic or error past this
/// boundary: every problem becomes a [`FetchOutcome::Failure`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> FetchOutcome;

    fn strategy(&self) -> &'static str;
}

/// Picks the fetch strategy for a crawl.
pub trait FetcherFactory: Send + Sync {
    fn fetcher_for(&self, config: &CrawlConfig) -> Result<Arc<dyn PageFetcher>>;
}

/// Static HTTP unless the crawl asks for rendering, in which case pages go
/// through the shared browser session.
pub struct StrategyFetchers {
    session: Arc<RenderedSession>,
}

impl StrategyFetchers {
    pub fn new(session: Arc<RenderedSession>) -> Self {
        Self { session }
    }
}

impl FetcherFactory for StrategyFetchers {
    fn fetcher_for(&self, config: &CrawlConfig) -> Result<Arc<dyn PageFetcher>> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let fetcher: Arc<dyn PageFetcher> = if config.use_rendered_fetch {
            let options = RenderOptions {
                timeout,
                wait_selector: config.wait_selector.clone(),
                wait_timeout: Duration::from_millis(config.wait_timeout_ms),
                ..RenderOptions::default()
            };
            Arc::new(RenderedFetcher::new(self.session.clone(), options))
        } else {
            Arc::new(StaticFetcher::new(timeout)?)
        };
        Ok(fetcher)
    }
}
