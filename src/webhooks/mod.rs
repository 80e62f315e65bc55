pub mod oracle;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generator::MarketProposal;
use crate::jobs::SourceError;

pub use oracle::OracleCallback;

/// Everything one job produced, as delivered downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketBatch {
    pub markets: Vec<MarketProposal>,
    pub errors: Vec<SourceError>,
    pub generated_at: DateTime<Utc>,
}

impl MarketBatch {
    pub fn new(markets: Vec<MarketProposal>, errors: Vec<SourceError>) -> Self {
        Self {
            markets,
            errors,
            generated_at: Utc::now(),
        }
    }
}

/// Receives finished market batches.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MarketSink: Send + Sync {
    async fn deliver(&self, batch: &MarketBatch) -> Result<()>;
}
