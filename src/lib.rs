pub mod api;
pub mod browser;
pub mod config;
pub mod crawler;
pub mod error;
pub mod fetcher;
pub mod generator;
pub mod jobs;
pub mod llm;
pub mod parser;
pub mod sources;
pub mod webhooks;

pub use config::Config;
pub use crawler::{CrawlConfig, CrawlResult, GuidedCrawler};
pub use error::{Result, ServiceError};
pub use generator::{MarketProposal, ProposalAssembler};
pub use jobs::MarketService;
