pub mod assembler;
pub mod budget;
pub mod chunker;
pub mod proposal;

use async_trait::async_trait;

use crate::error::Result;

pub use assembler::{prompt_date, ProposalAssembler};
pub use budget::{max_corpus_chars, profile_for, ModelProfile, DEFAULT_MODEL};
pub use chunker::{chunk_corpus, PAGE_SEPARATOR};
pub use proposal::{dedupe_proposals, MarketProposal, RawMarket};

/// Turns one corpus chunk into candidate proposals.
///
/// Implementations return whatever parsed; validity is checked by the
/// assembler against the generation clock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProposalGenerator: Send + Sync {
    async fn generate(
        &self,
        chunk: &str,
        prompt_template: &str,
        model: &str,
        current_date: &str,
    ) -> Result<Vec<MarketProposal>>;
}
