pub mod runner;


use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub use runner::{MarketService, ServiceSettings};

/// A source that produced nothing, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    pub source_id: String,
    pub error: String,
}

impl SourceError {
    pub fn new(source_id: &str, error: impl ToString) -> Self {
        Self {
            source_id: source_id.to_string(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
}

/// Timestamps are unix seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub started_at: f64,
    pub completed_at: Option<f64>,
    pub source_ids: Vec<String>,
    pub markets_generated: Option<usize>,
    /// `None` when every source succeeded.
    pub errors: Option<Vec<SourceError>>,
}

pub fn unix_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// In-memory job table. Records live until the process exits.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, source_ids: Vec<String>) -> Uuid {
        let job_id = Uuid::new_v4();
        let record = JobRecord {
            job_id,
            status: JobStatus::Processing,
            started_at: unix_now(),
            completed_at: None,
            source_ids,
            markets_generated: None,
            errors: None,
        };
        self.jobs.write().await.insert(job_id, record);
        job_id
    }

    pub async fn get(&self, job_id: &Uuid) -> Option<JobRecord> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Marks a job finished. Returns false for an unknown id.
    pub async fn complete(
        &self,
        job_id: &Uuid,
        markets_generated: usize,
        errors: Vec<SourceError>,
    ) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(job_id) {
            Some(record) => {
                record.status = JobStatus::Completed;
                record.completed_at = Some(unix_now());
                record.markets_generated = Some(markets_generated);
                record.errors = if errors.is_empty() { None } else { Some(errors) };
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}
