use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client};
use std::time::Duration;
use tracing::{debug, warn};

use crate::browser::stealth::{browser_headers, UserAgentGenerator};
use crate::error::{Result, ServiceError};
use crate::fetcher::{FetchFailure, FetchOutcome, PageFetcher};

const MAX_REDIRECTS: usize = 10;

/// Plain HTTP GET with desktop-browser headers.
pub struct StaticFetcher {
    client: Client,
    timeout: Duration,
    user_agents: UserAgentGenerator,
}

impl StaticFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ServiceError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout,
            user_agents: UserAgentGenerator::new(),
        })
    }

    pub async fn fetch_static(&self, url: &str, referer: Option<&str>) -> FetchOutcome {
        let headers = browser_headers(self.user_agents.random_user_agent(), referer);

        let response = match self
            .client
            .get(url)
            .headers(headers)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return FetchOutcome::failure(classify(url, e)),
        };

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            debug!("Skipping non-HTML: {} ({})", url, content_type);
            return FetchOutcome::failure(FetchFailure::NotHtml(content_type));
        }

        let status = response.status();
        if status.as_u16() >= 400 {
            warn!("HTTP {} for {}", status.as_u16(), url);
            return FetchOutcome::failure(FetchFailure::HttpStatus(status.as_u16()));
        }

        let final_url = response.url().to_string();
        match response.text().await {
            Ok(html) => FetchOutcome::success(html, final_url),
            Err(e) => FetchOutcome::failure(classify(url, e)),
        }
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchFailure {
    if err.is_timeout() {
        warn!("Timeout fetching {}", url);
        FetchFailure::Timeout
    } else {
        warn!("Error fetching {}: {}", url, err);
        FetchFailure::Transport(err.to_string())
    }
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> FetchOutcome {
        self.fetch_static(url, referer).await
    }

    fn strategy(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = "<html><body><article><p>Kickoff at 4pm</p></article></body></html>";

    fn html_response(status: u16, body: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_raw(body.to_string(), "text/html; charset=utf-8")
    }

    fn fetcher() -> StaticFetcher {
        StaticFetcher::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fixtures"))
            .respond_with(html_response(200, PAGE))
            .mount(&server)
            .await;

        let url = format!("{}/fixtures", server.uri());
        let outcome = fetcher().fetch(&url, None).await;

        assert_eq!(outcome, FetchOutcome::success(PAGE, url));
    }

    #[tokio::test]
    async fn test_redirect_reports_final_url() {
        let server = MockServer::start().await;
        Mock::given(path("/old"))
            .respond_with(
                ResponseTemplate::new(301)
                    .insert_header("location", format!("{}/new", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(path("/new"))
            .respond_with(html_response(200, PAGE))
            .mount(&server)
            .await;

        let outcome = fetcher().fetch(&format!("{}/old", server.uri()), None).await;

        match outcome {
            FetchOutcome::Success { final_url, .. } => {
                assert_eq!(final_url, format!("{}/new", server.uri()));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(path("/missing"))
            .respond_with(html_response(404, "<html>not found</html>"))
            .mount(&server)
            .await;

        let outcome = fetcher().fetch(&format!("{}/missing", server.uri()), None).await;

        assert_eq!(outcome, FetchOutcome::failure(FetchFailure::HttpStatus(404)));
    }

    #[tokio::test]
    async fn test_non_html_rejected() {
        let server = MockServer::start().await;
        Mock::given(path("/feed.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("{\"ok\":true}", "application/json"),
            )
            .mount(&server)
            .await;

        let outcome = fetcher().fetch(&format!("{}/feed.json", server.uri()), None).await;

        assert_eq!(
            outcome,
            FetchOutcome::failure(FetchFailure::NotHtml("application/json".to_string()))
        );
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(html_response(200, PAGE).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetcher = StaticFetcher::new(Duration::from_millis(200)).unwrap();
        let outcome = fetcher.fetch(&format!("{}/slow", server.uri()), None).await;

        assert_eq!(outcome, FetchOutcome::failure(FetchFailure::Timeout));
    }

    #[tokio::test]
    async fn test_transport_error() {
        // nothing listens on port 1
        let outcome = fetcher().fetch("http://127.0.0.1:1/", None).await;

        assert!(matches!(
            outcome,
            FetchOutcome::Failure {
                reason: FetchFailure::Transport(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_referer_forwarded() {
        let server = MockServer::start().await;
        Mock::given(path("/story"))
            .and(header("referer", "https://punchng.com/topics/news/"))
            .respond_with(html_response(200, PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = fetcher()
            .fetch(
                &format!("{}/story", server.uri()),
                Some("https://punchng.com/topics/news/"),
            )
            .await;

        assert!(outcome.is_success());
    }
}
