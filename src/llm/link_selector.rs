use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::crawler::LinkSelector;
use crate::error::Result;
use crate::generator::prompt_date;
use crate::llm::client::OpenAiClient;
use crate::llm::strip_code_blocks;
use crate::parser::LinkInfo;

const MAX_OFFERED_LINKS: usize = 100;
const MAX_SELECTED_LINKS: usize = 3;
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 500;

const LINK_SELECTOR_PROMPT: &str = r#"You are selecting news links for prediction market generation.

AVAILABLE LINKS FROM {source_url}:
{links_json}

TODAY: {current_date}

TASK: Select exactly 3 links most likely to contain upcoming events suitable for YES/NO prediction markets.

PRIORITIZE:
- Sports fixtures, match schedules
- Elections, voting dates
- Policy announcements with deadlines
- Scheduled events with specific dates
- Breaking news about future developments

AVOID:
- Opinion pieces, editorials
- Historical/past event coverage
- Generic category/archive pages
- About/contact pages

Return JSON: {"selected_urls": ["url1", "url2", "url3"]}

If fewer than 3 good links exist, return what you have. Never return an empty array unless there are truly no relevant links."#;

#[derive(Debug, Default, Deserialize)]
struct SelectionResponse {
    #[serde(default)]
    selected_urls: Vec<String>,
}

/// Asks the model which links most likely describe upcoming events.
pub struct OpenAiLinkSelector {
    client: Arc<OpenAiClient>,
}

impl OpenAiLinkSelector {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

pub fn build_selection_prompt(
    links: &[LinkInfo],
    source_url: &str,
    current_date: &str,
) -> Result<String> {
    let offered = &links[..links.len().min(MAX_OFFERED_LINKS)];
    let links_json = serde_json::to_string_pretty(offered)?;

    Ok(LINK_SELECTOR_PROMPT
        .replace("{source_url}", source_url)
        .replace("{current_date}", current_date)
        .replace("{links_json}", &links_json))
}

/// Offered URLs named in the model's answer, at most three.
/// Unparsable answers select nothing.
pub fn parse_selection(content: &str, links: &[LinkInfo]) -> Vec<String> {
    let response: SelectionResponse = match serde_json::from_str(strip_code_blocks(content)) {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to parse link selection: {}", e);
            return Vec::new();
        }
    };

    let offered: HashSet<&str> = links.iter().map(|link| link.url.as_str()).collect();
    let mut selected: Vec<String> = response
        .selected_urls
        .into_iter()
        .filter(|url| {
            let known = offered.contains(url.as_str());
            if !known {
                warn!("Ignoring selected URL that was not offered: {}", url);
            }
            known
        })
        .collect();

    info!("Selected {} links from {} available", selected.len(), links.len());
    selected.truncate(MAX_SELECTED_LINKS);
    selected
}

#[async_trait]
impl LinkSelector for OpenAiLinkSelector {
    async fn select_links(
        &self,
        links: &[LinkInfo],
        source_url: &str,
        model: &str,
    ) -> Result<Vec<String>> {
        if links.is_empty() {
            warn!("No links provided for selection");
            return Ok(Vec::new());
        }

        let prompt = build_selection_prompt(links, source_url, &prompt_date(Utc::now()))?;
        let content = self
            .client
            .chat_json(model, &prompt, TEMPERATURE, MAX_TOKENS)
            .await?;

        Ok(parse_selection(&content, links))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn link(url: &str, text: &str) -> LinkInfo {
        LinkInfo {
            url: url.to_string(),
            anchor_text: text.to_string(),
            context: format!("{} context", text),
        }
    }

    fn offered() -> Vec<LinkInfo> {
        vec![
            link("https://punchng.com/a", "Senate budget vote"),
            link("https://punchng.com/b", "Fuel price"),
            link("https://punchng.com/c", "Election timetable"),
            link("https://punchng.com/d", "Opinion"),
        ]
    }

    #[test]
    fn test_prompt_lists_links() {
        let prompt =
            build_selection_prompt(&offered(), "https://punchng.com/topics/news/", "2026-01-10 08:00 UTC")
                .unwrap();

        assert!(prompt.contains("AVAILABLE LINKS FROM https://punchng.com/topics/news/:"));
        assert!(prompt.contains("TODAY: 2026-01-10 08:00 UTC"));
        assert!(prompt.contains("\"text\": \"Fuel price\""));
        assert!(prompt.contains("{\"selected_urls\": [\"url1\", \"url2\", \"url3\"]}"));
    }

    #[test]
    fn test_prompt_caps_offered_links() {
        let links: Vec<LinkInfo> = (0..150)
            .map(|i| link(&format!("https://npfl.ng/news/{}", i), "match"))
            .collect();

        let prompt = build_selection_prompt(&links, "https://npfl.ng", "today").unwrap();

        assert!(prompt.contains("https://npfl.ng/news/99\""));
        assert!(!prompt.contains("https://npfl.ng/news/100\""));
    }

    #[test]
    fn test_parse_selection_filters_and_caps() {
        let content = r#"{"selected_urls": ["https://punchng.com/c", "https://other.com/x", "https://punchng.com/a", "https://punchng.com/b", "https://punchng.com/d"]}"#;

        let selected = parse_selection(content, &offered());

        assert_eq!(
            selected,
            vec!["https://punchng.com/c", "https://punchng.com/a", "https://punchng.com/b"]
        );
    }

    #[test]
    fn test_parse_selection_degrades_to_empty() {
        assert!(parse_selection("not json at all", &offered()).is_empty());
        assert!(parse_selection("{\"other\": 1}", &offered()).is_empty());
        assert_eq!(
            parse_selection("```json\n{\"selected_urls\": [\"https://punchng.com/a\"]}\n```", &offered()),
            vec!["https://punchng.com/a"]
        );
    }

    #[tokio::test]
    async fn test_select_links_via_api() {
        let server = MockServer::start().await;
        Mock::given(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "model": "gpt-4o-mini", "max_tokens": 500 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "{\"selected_urls\": [\"https://punchng.com/b\"]}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = Arc::new(OpenAiClient::new("sk-test").with_base_url(&server.uri()));
        let selector = OpenAiLinkSelector::new(client);

        let selected = selector
            .select_links(&offered(), "https://punchng.com/topics/news/", "gpt-4o-mini")
            .await
            .unwrap();

        assert_eq!(selected, vec!["https://punchng.com/b"]);
    }

    #[tokio::test]
    async fn test_api_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Arc::new(OpenAiClient::new("sk-test").with_base_url(&server.uri()));
        let selector = OpenAiLinkSelector::new(client);

        let result = selector
            .select_links(&offered(), "https://punchng.com/", "gpt-4o-mini")
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_links_skips_api() {
        let client = Arc::new(OpenAiClient::new("sk-test").with_base_url("http://127.0.0.1:1"));
        let selector = OpenAiLinkSelector::new(client);

        let selected = selector.select_links(&[], "https://npfl.ng", "gpt-4o").await.unwrap();

        assert!(selected.is_empty());
    }
}
