use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::crawler::{GuidedCrawler, LinkSelector};
use crate::error::{Result, ServiceError};
use crate::fetcher::FetcherFactory;
use crate::generator::{MarketProposal, ProposalAssembler, ProposalGenerator};
use crate::jobs::{JobRegistry, SourceError};
use crate::sources::{DataSource, SourceRegistry};
use crate::webhooks::{MarketBatch, MarketSink};

/// Knobs shared by every job.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub selection_model: String,
    pub generation_model: String,
    pub max_tokens_override: Option<u64>,
    pub request_delay: Duration,
    pub max_links_for_selection: usize,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            selection_model: config.ai.selection_model.clone(),
            generation_model: config.ai.generation_model.clone(),
            max_tokens_override: config.ai.max_tokens_override,
            request_delay: Duration::from_millis(config.crawl.request_delay_ms),
            max_links_for_selection: config.crawl.max_links_for_selection,
        }
    }
}

/// Runs generation jobs: crawl each source, turn its corpus into proposals,
/// hand the combined batch to the sink.
pub struct MarketService {
    sources: SourceRegistry,
    jobs: JobRegistry,
    fetchers: Arc<dyn FetcherFactory>,
    selector: Arc<dyn LinkSelector>,
    generator: Arc<dyn ProposalGenerator>,
    sink: Arc<dyn MarketSink>,
    settings: ServiceSettings,
}

impl MarketService {
    pub fn new(
        sources: SourceRegistry,
        fetchers: Arc<dyn FetcherFactory>,
        selector: Arc<dyn LinkSelector>,
        generator: Arc<dyn ProposalGenerator>,
        sink: Arc<dyn MarketSink>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            sources,
            jobs: JobRegistry::new(),
            fetchers,
            selector,
            generator,
            sink,
            settings,
        }
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Crawls one source and generates up to `target_count` proposals from it.
    pub async fn process_source(
        &self,
        source: &DataSource,
        target_count: usize,
    ) -> Result<Vec<MarketProposal>> {
        let template = source.prompt_template().ok_or_else(|| {
            ServiceError::Config(format!(
                "No prompt template '{}' for source {}",
                source.prompt_id(),
                source.id
            ))
        })?;

        let config = source.crawl_config();
        let fetcher = self.fetchers.fetcher_for(&config)?;
        info!(
            "[{}] Crawling {} with {} fetcher",
            source.id,
            config.seed_url,
            fetcher.strategy()
        );

        let crawler = GuidedCrawler::new(fetcher, self.selector.clone(), &self.settings.selection_model)
            .with_request_delay(self.settings.request_delay)
            .with_max_links_for_selection(self.settings.max_links_for_selection);
        let crawl = crawler.crawl(&config).await;

        if !crawl.errors.is_empty() {
            warn!("[{}] {} pages failed: {:?}", source.id, crawl.errors.len(), crawl.errors);
        }
        if crawl.is_empty() {
            return Err(ServiceError::EmptyCorpus(config.seed_url).into());
        }

        let assembler = ProposalAssembler::new(self.generator.clone())
            .with_model(self.settings.generation_model.clone())
            .with_max_tokens_override(self.settings.max_tokens_override);
        let markets = assembler.assemble(&crawl.corpus, template, target_count).await;

        info!(
            "[{}] {} markets from {} pages",
            source.id,
            markets.len(),
            crawl.pages_visited.len()
        );
        Ok(markets)
    }

    /// Registers a job and runs it in the background.
    pub async fn spawn_job(self: &Arc<Self>, source_ids: Vec<String>, target_count: usize) -> Uuid {
        let job_id = self.jobs.create(source_ids.clone()).await;
        info!(
            "Job {} accepted for {:?} ({} jobs tracked)",
            job_id,
            source_ids,
            self.jobs.len().await
        );

        let service = Arc::clone(self);
        tokio::spawn(async move {
            service.run_job(job_id, &source_ids, target_count).await;
        });

        job_id
    }

    /// Processes sources one after another; a failing source never stops the
    /// rest. Always ends with the job marked completed.
    pub async fn run_job(&self, job_id: Uuid, source_ids: &[String], target_count: usize) {
        let mut markets = Vec::new();
        let mut errors = Vec::new();

        for source_id in source_ids {
            let Some(source) = self.sources.get(source_id) else {
                warn!("Job {}: unknown source {}", job_id, source_id);
                errors.push(SourceError::new(
                    source_id,
                    ServiceError::UnknownSource(source_id.clone()),
                ));
                continue;
            };

            match self.process_source(source, target_count).await {
                Ok(generated) => markets.extend(generated),
                Err(e) => {
                    error!("Job {}: source {} failed: {}", job_id, source_id, e);
                    errors.push(SourceError::new(source_id, e));
                }
            }
        }

        let generated = markets.len();
        if !markets.is_empty() {
            let batch = MarketBatch::new(markets, errors.clone());
            if let Err(e) = self.sink.deliver(&batch).await {
                error!("Job {}: delivering {} markets failed: {}", job_id, generated, e);
            }
        }

        self.jobs.complete(&job_id, generated, errors).await;
        info!("Job {} completed with {} markets", job_id, generated);
    }
}
