use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::browser::stealth::LAZY_LOAD_SCROLL_SCRIPT;
use crate::browser::{BrowserFingerprint, RenderContext, RenderedSession};
use crate::fetcher::{FetchFailure, FetchOutcome, PageFetcher};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Budget for navigation up to the `load` event.
    pub timeout: Duration,
    pub wait_selector: Option<String>,
    pub wait_timeout: Duration,
    /// Pause after the synthetic scroll.
    pub settle_delay: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            wait_selector: None,
            wait_timeout: Duration::from_millis(5000),
            settle_delay: Duration::from_millis(300),
        }
    }
}

impl RenderOptions {
    /// Ceiling for one whole render. Navigation gets `timeout`, the selector
    /// wait and settle pause their own budgets, and the post-load CDP calls
    /// share one more `timeout`.
    pub fn render_budget(&self) -> Duration {
        self.timeout * 2 + self.wait_timeout + self.settle_delay
    }
}

/// Fetches pages through an isolated context of the shared browser.
pub struct RenderedFetcher {
    session: Arc<RenderedSession>,
    options: RenderOptions,
}

impl RenderedFetcher {
    pub fn new(session: Arc<RenderedSession>, options: RenderOptions) -> Self {
        Self { session, options }
    }

    pub async fn fetch_rendered(&self, url: &str, referer: Option<&str>) -> FetchOutcome {
        let fingerprint = BrowserFingerprint::random(self.session.user_agents());
        debug!("[render] Opening context for {} with UA {}", url, fingerprint.user_agent);

        let context = match self.session.context_for(&fingerprint).await {
            Ok(context) => context,
            Err(e) => {
                error!("[render] No browser context for {}: {}", url, e);
                return FetchOutcome::failure(FetchFailure::RenderError(e.to_string()));
            }
        };

        let budget = self.options.render_budget();
        let result = AssertUnwindSafe(timeout(budget, self.render(&context, url, referer)))
            .catch_unwind()
            .await
            .map(|rendered| {
                rendered.unwrap_or_else(|_| Err(format!("render timed out after {:?}", budget)))
            });

        // released on every path, including navigation failure
        context.close().await;

        match result {
            Ok(Ok((html, final_url))) => {
                info!("[render] Got {} chars from {}", html.len(), final_url);
                FetchOutcome::success(html, final_url)
            }
            Ok(Err(detail)) => {
                error!("[render] Fetch failed for {}: {}", url, detail);
                FetchOutcome::failure(FetchFailure::RenderError(detail))
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("[render] Unexpected failure rendering {}: {}", url, message);
                FetchOutcome::failure(FetchFailure::RenderError(format!(
                    "internal error: {}",
                    message
                )))
            }
        }
    }

    async fn render(
        &self,
        context: &RenderContext,
        url: &str,
        referer: Option<&str>,
    ) -> Result<(String, String), String> {
        let page = context.page();

        if let Some(referer) = referer {
            let headers = Headers::new(serde_json::json!({ "Referer": referer }));
            page.execute(SetExtraHttpHeadersParams::new(headers))
                .await
                .map_err(|e| format!("failed to set referer: {}", e))?;
        }

        // goto resolves on the load event, not network idle
        info!("[render] Navigating to {} (timeout={:?})", url, self.options.timeout);
        match timeout(self.options.timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(format!("navigation failed: {}", e)),
            Err(_) => {
                return Err(format!(
                    "navigation timed out after {:?}",
                    self.options.timeout
                ))
            }
        }

        if let Some(ref selector) = self.options.wait_selector {
            if !self.wait_for_selector(context, selector).await {
                debug!("[render] Selector '{}' not found on {}, continuing", selector, url);
            }
        }

        if let Err(e) = page.evaluate(LAZY_LOAD_SCROLL_SCRIPT).await {
            warn!("[render] Scroll failed on {}: {}", url, e);
        }
        sleep(self.options.settle_delay).await;

        let html = page
            .content()
            .await
            .map_err(|e| format!("failed to read page content: {}", e))?;
        let final_url = match page.url().await {
            Ok(Some(current)) => current,
            _ => url.to_string(),
        };

        Ok((html, final_url))
    }

    async fn wait_for_selector(&self, context: &RenderContext, selector: &str) -> bool {
        let deadline = Instant::now() + self.options.wait_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if let Ok(Ok(_)) = timeout(remaining, context.page().find_element(selector)).await {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            sleep(SELECTOR_POLL_INTERVAL.min(remaining)).await;
        }
    }
}

#[async_trait]
impl PageFetcher for RenderedFetcher {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> FetchOutcome {
        self.fetch_rendered(url, referer).await
    }

    fn strategy(&self) -> &'static str {
        "rendered"
    }
}
