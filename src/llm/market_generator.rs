use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::generator::{MarketProposal, ProposalGenerator, RawMarket};
use crate::llm::client::OpenAiClient;
use crate::llm::strip_code_blocks;

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 2000;

pub struct OpenAiProposalGenerator {
    client: Arc<OpenAiClient>,
}

impl OpenAiProposalGenerator {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

/// Fills the `{corpus}` and `{current_date}` placeholders.
pub fn render_prompt(template: &str, chunk: &str, current_date: &str) -> String {
    template
        .replace("{current_date}", current_date)
        .replace("{corpus}", chunk)
}

/// Proposals from a `{"markets": [...]}` object or a bare array.
/// Anything unparsable yields no proposals.
pub fn parse_markets(content: &str) -> Vec<MarketProposal> {
    let cleaned = strip_code_blocks(content);
    debug!("Model response (first 500 chars): {}", cleaned.chars().take(500).collect::<String>());

    let data: Value = match serde_json::from_str(cleaned) {
        Ok(data) => data,
        Err(e) => {
            error!("JSON parse error: {}", e);
            return Vec::new();
        }
    };

    let raw_markets = match data {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("markets") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    if raw_markets.is_empty() {
        info!("Model returned no markets for chunk");
        return Vec::new();
    }

    raw_markets
        .into_iter()
        .filter_map(|item| {
            let raw: RawMarket = match serde_json::from_value(item) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Failed to parse market: {}", e);
                    return None;
                }
            };
            let question = raw.question.clone().unwrap_or_default();
            let proposal = MarketProposal::from_raw(raw);
            if proposal.is_none() {
                warn!("Market with unusable timestamps skipped: {}", question);
            }
            proposal
        })
        .collect()
}

#[async_trait]
impl ProposalGenerator for OpenAiProposalGenerator {
    async fn generate(
        &self,
        chunk: &str,
        prompt_template: &str,
        model: &str,
        current_date: &str,
    ) -> Result<Vec<MarketProposal>> {
        let prompt = render_prompt(prompt_template, chunk, current_date);
        let content = self
            .client
            .chat_json(model, &prompt, TEMPERATURE, MAX_TOKENS)
            .await?;

        Ok(parse_markets(&content))
    }
}
