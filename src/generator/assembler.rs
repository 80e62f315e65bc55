use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::generator::budget::{max_corpus_chars, DEFAULT_MODEL};
use crate::generator::chunker::chunk_corpus;
use crate::generator::proposal::{dedupe_proposals, MarketProposal};
use crate::generator::ProposalGenerator;

/// Date line substituted into prompts.
pub fn prompt_date(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Chunks a corpus, asks the generator about each chunk in order and
/// merges the answers.
pub struct ProposalAssembler {
    generator: Arc<dyn ProposalGenerator>,
    model: String,
    max_tokens_override: Option<u64>,
}

impl ProposalAssembler {
    pub fn new(generator: Arc<dyn ProposalGenerator>) -> Self {
        Self {
            generator,
            model: DEFAULT_MODEL.to_string(),
            max_tokens_override: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens_override(mut self, max_tokens: Option<u64>) -> Self {
        self.max_tokens_override = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn assemble(
        &self,
        corpus: &str,
        prompt_template: &str,
        target_count: usize,
    ) -> Vec<MarketProposal> {
        if corpus.trim().is_empty() {
            warn!("Empty corpus, skipping generation");
            return Vec::new();
        }

        let max_chars = max_corpus_chars(&self.model, prompt_template, self.max_tokens_override);
        info!("Using model {}, max_chars per chunk: {}", self.model, max_chars);

        let chunks = chunk_corpus(corpus, max_chars);
        let now = Utc::now();
        let current_date = prompt_date(now);
        let mut proposals = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            match self
                .generator
                .generate(chunk, prompt_template, &self.model, &current_date)
                .await
            {
                Ok(generated) => {
                    let total = generated.len();
                    let valid: Vec<MarketProposal> = generated
                        .into_iter()
                        .filter(|proposal| {
                            let ok = proposal.is_valid_at(now);
                            if !ok {
                                warn!("Invalid proposal skipped: {}", proposal.question);
                            }
                            ok
                        })
                        .collect();
                    info!(
                        "Chunk {}/{}: {} markets ({} rejected)",
                        index + 1,
                        chunks.len(),
                        valid.len(),
                        total - valid.len()
                    );
                    proposals.extend(valid);
                }
                Err(e) => {
                    error!("Chunk {}/{} failed: {}", index + 1, chunks.len(), e);
                }
            }
        }

        let total = proposals.len();
        let mut unique = dedupe_proposals(proposals);
        info!("Generated {} unique proposals from {} total", unique.len(), total);

        unique.truncate(target_count);
        unique
    }
}
