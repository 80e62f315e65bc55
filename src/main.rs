use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ospm_data_service::api::{self, AppState};
use ospm_data_service::browser::RenderedSession;
use ospm_data_service::config::{ConfigManager, FileConfigManager};
use ospm_data_service::fetcher::StrategyFetchers;
use ospm_data_service::jobs::{MarketService, ServiceSettings};
use ospm_data_service::llm::{OpenAiClient, OpenAiLinkSelector, OpenAiProposalGenerator};
use ospm_data_service::sources::SourceRegistry;
use ospm_data_service::webhooks::OracleCallback;

fn init_tracing() {
    let filter = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| EnvFilter::try_new(level.to_lowercase()).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received Ctrl-C, shutting down...");
}

#[tokio::main]
async fn main() -> ospm_data_service::error::Result<()> {
    init_tracing();

    let config_manager = FileConfigManager::new(PathBuf::from("config.toml"));
    let mut config = config_manager.load_config().await?;
    config.apply_process_env();
    config_manager.validate_config(&config)?;

    tracing::info!("Starting OSPM data service");
    if config.openai_configured() {
        tracing::info!("OpenAI client initialized");
    } else {
        tracing::warn!("OPENAI_API_KEY not set, market generation is disabled");
    }

    let session = Arc::new(RenderedSession::new(config.browser.clone()));
    let client = Arc::new(
        OpenAiClient::new(config.ai.api_key.as_deref().unwrap_or_default())
            .with_base_url(&config.ai.base_url),
    );
    let sink = OracleCallback::new(
        config.oracle.callback_url.clone(),
        Duration::from_secs(config.oracle.timeout_seconds),
    )?;

    let service = Arc::new(MarketService::new(
        SourceRegistry::new(config.sources.clone()),
        Arc::new(StrategyFetchers::new(session.clone())),
        Arc::new(OpenAiLinkSelector::new(client.clone())),
        Arc::new(OpenAiProposalGenerator::new(client)),
        Arc::new(sink),
        ServiceSettings::from_config(&config),
    ));

    let state = AppState {
        service,
        openai_configured: config.openai_configured(),
    };
    let router = api::create_router(state, &config.server.cors_origin)?;

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    let served = api::serve(listener, router, shutdown_signal()).await;

    if session.is_running().await {
        tracing::info!("Closing shared browser");
    }
    session.shutdown().await;
    tracing::info!("OSPM data service stopped.");
    served
}
