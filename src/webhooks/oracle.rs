use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Result, ServiceError};
use crate::webhooks::{MarketBatch, MarketSink};

/// Posts batches to the oracle's market ingest endpoint.
pub struct OracleCallback {
    client: Client,
    callback_url: String,
}

impl OracleCallback {
    pub fn new(callback_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            callback_url,
        })
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }
}

#[async_trait::async_trait]
impl MarketSink for OracleCallback {
    async fn deliver(&self, batch: &MarketBatch) -> Result<()> {
        debug!(
            "Posting {} markets and {} errors to {}",
            batch.markets.len(),
            batch.errors.len(),
            self.callback_url
        );

        let response = self
            .client
            .post(&self.callback_url)
            .json(batch)
            .send()
            .await
            .map_err(|e| ServiceError::Network(format!("Failed to POST to oracle: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Network(format!(
                "Oracle callback failed with status {}: {}",
                status, body
            ))
            .into());
        }

        let created = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("created").and_then(Value::as_u64))
            .unwrap_or(0);
        info!("Oracle ingested {} markets", created);
        Ok(())
    }
}
