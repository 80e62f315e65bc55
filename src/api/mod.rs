
use axum::{
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::jobs::{JobRecord, JobStatus, MarketService, SourceError};

const DEFAULT_TARGET_COUNT: usize = 5;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MarketService>,
    pub openai_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub openai_configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SourceInfo {
    pub id: String,
    pub category: String,
    pub seed_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceInfo>,
}

fn default_target_count() -> usize {
    DEFAULT_TARGET_COUNT
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateMarketsRequest {
    pub source_ids: Vec<String>,
    #[serde(default = "default_target_count")]
    pub target_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub job_id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub started_at: f64,
    pub completed_at: Option<f64>,
    pub markets_generated: Option<usize>,
    pub errors: Option<Vec<SourceError>>,
}

impl From<JobRecord> for JobStatusResponse {
    fn from(record: JobRecord) -> Self {
        Self {
            job_id: record.job_id,
            status: record.status,
            started_at: record.started_at,
            completed_at: record.completed_at,
            markets_generated: record.markets_generated,
            errors: record.errors,
        }
    }
}

/// Error body shaped as `{"detail": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

pub fn create_router(state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ServiceError::Config(format!("Invalid CORS origin '{}': {}", cors_origin, e)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(health_check))
        .route("/sources", get(list_sources))
        .route("/generate-markets", post(generate_markets))
        .route("/jobs/:job_id", get(get_job_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Serves `router` until `shutdown` resolves, then drains in-flight requests.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("API server listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.openai_configured { "healthy" } else { "degraded" };
    Json(HealthResponse {
        status: status.to_string(),
        openai_configured: state.openai_configured,
    })
}

async fn list_sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    let sources = state
        .service
        .sources()
        .all()
        .iter()
        .map(|source| SourceInfo {
            id: source.id.clone(),
            category: source.category.clone(),
            seed_url: source.seed_url.clone(),
        })
        .collect();
    Json(SourcesResponse { sources })
}

async fn generate_markets(
    State(state): State<AppState>,
    Json(request): Json<GenerateMarketsRequest>,
) -> std::result::Result<(StatusCode, Json<TriggerResponse>), ApiError> {
    if !state.openai_configured {
        warn!("Rejecting generation request: OpenAI not configured");
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::NotConfigured("OpenAI".to_string()).to_string(),
        ));
    }
    if request.source_ids.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "source_ids cannot be empty"));
    }

    let job_id = state
        .service
        .spawn_job(request.source_ids, request.target_count)
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(TriggerResponse {
            job_id,
            status: "accepted".to_string(),
        }),
    ))
}

async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> std::result::Result<Json<JobStatusResponse>, ApiError> {
    let not_found = || ApiError::new(StatusCode::NOT_FOUND, "Job not found");

    let job_id = Uuid::parse_str(&job_id).map_err(|_| not_found())?;
    let record = state.service.jobs().get(&job_id).await.ok_or_else(not_found)?;

    Ok(Json(record.into()))
}
