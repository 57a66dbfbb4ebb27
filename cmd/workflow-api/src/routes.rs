use axum::{
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::limit::GlobalConcurrencyLimitLayer;

use workflow_analysis::{
    observers::{Alert, MetricsSnapshot},
    AnalysisEvent, AnalysisService, Estimate, FixLogs, FixResult, GraphSummary,
    OptimizationOutcome, SuggestionResult, WorkflowDefinition,
};

use crate::{error::ApiError, middleware::bearer_auth};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AnalysisService>,
    /// Cancelled on shutdown; in-flight analyses end with 503
    pub shutdown: CancellationToken,
    pub token_prefix: Arc<str>,
}

/// Body of every analysis request
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    /// Workflow name, used as the workflow id when the definition has none
    #[serde(default)]
    pub name: Option<String>,
    pub definition: WorkflowDefinition,
    #[serde(default)]
    pub logs: Option<FixLogs>,
}

impl AnalysisRequest {
    fn into_definition(self) -> (WorkflowDefinition, Option<FixLogs>) {
        let mut definition = self.definition;
        if definition.name.is_none() {
            definition.name = self.name;
        }
        (definition, self.logs)
    }
}

pub fn router(state: AppState) -> Router {
    let analysis = Router::new()
        .route("/ia/suggestion", post(suggestion))
        .route("/ia/fix", post(fix))
        .route("/ia/estimate", post(estimate))
        .route("/ia/optimize", post(optimize))
        .route("/ia/graph", post(graph))
        .route("/ia/metrics", get(metrics))
        .route("/ia/logs", get(logs))
        .route("/ia/alerts", get(alerts))
        .route_layer(from_fn_with_state(state.clone(), bearer_auth));

    Router::new()
        .route("/health", get(health_check))
        .merge(analysis)
        .with_state(state)
}

/// Router with one admission limit shared by every route
pub fn app(state: AppState, max_concurrency: usize) -> Router {
    router(state).layer(GlobalConcurrencyLimitLayer::new(max_concurrency))
}

async fn suggestion(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<SuggestionResult>, ApiError> {
    let (definition, _) = request.into_definition();
    let token = state.shutdown.child_token();
    let result = state.service.suggest_cancellable(&definition, &token).await?;
    Ok(Json(result))
}

async fn fix(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<FixResult>, ApiError> {
    let (definition, logs) = request.into_definition();
    let token = state.shutdown.child_token();
    let result = state
        .service
        .fix_cancellable(&definition, logs.as_ref(), &token)
        .await?;
    Ok(Json(result))
}

async fn estimate(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<Estimate>, ApiError> {
    let (definition, _) = request.into_definition();
    let token = state.shutdown.child_token();
    let result = state.service.estimate_cancellable(&definition, &token).await?;
    Ok(Json(result))
}

async fn optimize(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<OptimizationOutcome>, ApiError> {
    let (definition, _) = request.into_definition();
    Ok(Json(state.service.optimize(&definition)?))
}

async fn graph(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<GraphSummary>, ApiError> {
    let (definition, _) = request.into_definition();
    Ok(Json(state.service.graph(&definition)?))
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.service.get_metrics())
}

async fn logs(State(state): State<AppState>) -> Json<Vec<AnalysisEvent>> {
    Json(state.service.get_logs())
}

async fn alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.service.get_alerts())
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "workflow-api",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.service.provider_name(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
