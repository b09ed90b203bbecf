//! API routes for titand
//!
//! Success bodies are `{success: true, <payload>, timestamp}`; failures are
//! `{error, details?, code?}` with a 4xx/5xx status.

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use titan_common::{
    AiOptimizeRequest, AuditPayload, CreatePlanRequest, Dashboard, DashboardPayload, Envelope,
    ErrorBody, ExecutionPayload, HealthPayload, MetricsPayload, MonitoringPayload,
    OptimizationPayload, PlanPayload, ReportPayload, TitanError,
};
use tracing::{error, info, warn};

use crate::server::AppState;

type AppStateArc = Arc<AppState>;

/// Alerts included in the dashboard
const DASHBOARD_ALERTS: usize = 10;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, code: &str) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                details: None,
                code: Some(code.to_string()),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<TitanError> for ApiError {
    fn from(e: TitanError) -> Self {
        let status = match &e {
            TitanError::NoPlan | TitanError::NoHealthData => StatusCode::NOT_FOUND,
            TitanError::PlanInProgress(_) => StatusCode::CONFLICT,
            TitanError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", e);
            return Self {
                status,
                body: ErrorBody {
                    error: "Internal server error".to_string(),
                    details: None,
                    code: Some(e.code().to_string()),
                },
            };
        }

        Self {
            status,
            body: ErrorBody {
                error: e.to_string(),
                details: None,
                code: Some(e.code().to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope::ok(data)))
}

// ============================================================================
// Request Tracking
// ============================================================================

/// Feed every request into the latency tracker and HTTP metrics
pub async fn track_requests(
    State(state): State<AppStateArc>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let latency = start.elapsed();
    let status = response.status();
    state.tracker.record(latency, !status.is_server_error());
    state.metrics.record_request(&method, status.as_u16(), latency);
    response
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/health", get(health_check))
        .route("/report", get(optimization_report))
        .route("/admin/dashboard", get(dashboard))
}

async fn health_check(State(state): State<AppStateArc>) -> ApiResult<HealthPayload> {
    let health = state.aggregator.run_health_check().await;
    ok(HealthPayload { health })
}

async fn optimization_report(State(state): State<AppStateArc>) -> ApiResult<ReportPayload> {
    let report = state.aggregator.generate_optimization_report().await?;
    ok(ReportPayload { report })
}

async fn dashboard(State(state): State<AppStateArc>) -> ApiResult<DashboardPayload> {
    let dashboard = Dashboard {
        latest_report: state.aggregator.latest_report().await,
        history: state.aggregator.history_summary().await,
        current_plan: state.aggregator.current_plan().await,
        performance: state.performance.summary().await,
        alerts: state.performance.alerts(DASHBOARD_ALERTS).await,
        security: state.security.dashboard().await,
        monitoring: state.monitoring.state().await,
    };
    ok(DashboardPayload { dashboard })
}

// ============================================================================
// AI Routes
// ============================================================================

pub fn ai_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/ai/optimize", post(optimize_model))
        .route("/ai/validate/:model_id", post(validate_model))
}

async fn optimize_model(
    State(state): State<AppStateArc>,
    body: Option<Json<AiOptimizeRequest>>,
) -> ApiResult<OptimizationPayload> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let model_id = match req.model_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "Model ID is required",
                "MISSING_MODEL_ID",
            ))
        }
    };

    info!("Optimizing model {}", model_id);
    let optimization = state
        .ai
        .optimize_model(&model_id, req.strategy.as_deref())
        .await?;
    ok(OptimizationPayload { optimization })
}

async fn validate_model(
    State(state): State<AppStateArc>,
    Path(model_id): Path<String>,
) -> ApiResult<OptimizationPayload> {
    let optimization = state.ai.validate_model(&model_id).await?;
    ok(OptimizationPayload { optimization })
}

// ============================================================================
// Performance Routes
// ============================================================================

pub fn performance_routes() -> Router<AppStateArc> {
    Router::new().route("/performance/metrics", get(performance_metrics))
}

async fn performance_metrics(State(state): State<AppStateArc>) -> ApiResult<MetricsPayload> {
    let metrics = state.performance.report().await;
    ok(MetricsPayload { metrics })
}

// ============================================================================
// Security Routes
// ============================================================================

pub fn security_routes() -> Router<AppStateArc> {
    Router::new().route("/security/audit", post(security_audit))
}

fn is_admin(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.contains("admin"))
}

async fn security_audit(
    State(state): State<AppStateArc>,
    headers: HeaderMap,
) -> ApiResult<AuditPayload> {
    if !is_admin(&headers) {
        warn!("Security audit rejected: admin access required");
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "Admin access required",
            "ADMIN_ACCESS_REQUIRED",
        ));
    }

    let audit = state.security.run_audit().await?;
    ok(AuditPayload { audit })
}

// ============================================================================
// Optimization Routes
// ============================================================================

pub fn optimization_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/optimization/plan", get(current_plan).post(create_plan))
        .route("/optimization/execute", post(execute_plan))
}

async fn current_plan(State(state): State<AppStateArc>) -> ApiResult<PlanPayload> {
    let plan = state.aggregator.current_plan().await.ok_or(TitanError::NoPlan)?;
    ok(PlanPayload { plan })
}

async fn create_plan(
    State(state): State<AppStateArc>,
    body: Option<Json<CreatePlanRequest>>,
) -> ApiResult<PlanPayload> {
    let targets = body.and_then(|Json(req)| req.targets).unwrap_or_default();
    let plan = state.aggregator.create_optimization_plan(targets).await;
    ok(PlanPayload { plan })
}

async fn execute_plan(State(state): State<AppStateArc>) -> ApiResult<ExecutionPayload> {
    let execution = state.aggregator.execute_current_plan().await?;
    ok(ExecutionPayload { execution })
}

// ============================================================================
// Monitoring Routes
// ============================================================================

pub fn monitoring_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/monitoring/start", post(start_monitoring))
        .route("/monitoring/stop", post(stop_monitoring))
}

async fn start_monitoring(State(state): State<AppStateArc>) -> ApiResult<MonitoringPayload> {
    if !state.monitoring.start().await {
        info!("Monitoring already running");
    }
    ok(MonitoringPayload {
        monitoring: state.monitoring.state().await,
    })
}

async fn stop_monitoring(State(state): State<AppStateArc>) -> ApiResult<MonitoringPayload> {
    if !state.monitoring.stop().await {
        info!("Monitoring was not running");
    }
    ok(MonitoringPayload {
        monitoring: state.monitoring.state().await,
    })
}

// ============================================================================
// Metrics Routes
// ============================================================================

pub fn metrics_routes() -> Router<AppStateArc> {
    Router::new().route("/metrics", get(prometheus_metrics))
}

async fn prometheus_metrics(State(state): State<AppStateArc>) -> Result<Response, ApiError> {
    let body = state.metrics.render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}
