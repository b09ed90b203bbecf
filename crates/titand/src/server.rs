//! HTTP server for titand

use anyhow::Result;
use axum::{middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::aggregator::HealthAggregator;
use crate::ai::AiOptimizer;
use crate::config::{Config, MetricsSourceKind};
use crate::events::EventBus;
use crate::executor::RemediationRunner;
use crate::instrumentation::{MetricsSource, RequestTracker, SystemMetricsSource};
use crate::metrics::TitanMetrics;
use crate::monitor::MonitoringLoop;
use crate::performance::PerformanceMonitor;
use crate::probes::{AiHealthProbe, PerformanceHealthProbe, SecurityHealthProbe};
use crate::routes;
use crate::sampler::{ChecklistScanner, SimulatedMetricsSource, SimulatedModelValidator};
use crate::security::SecurityAuditor;

/// Application state shared across handlers
pub struct AppState {
    pub aggregator: Arc<HealthAggregator>,
    pub performance: Arc<PerformanceMonitor>,
    pub security: Arc<SecurityAuditor>,
    pub ai: Arc<AiOptimizer>,
    pub monitoring: Arc<MonitoringLoop>,
    pub metrics: TitanMetrics,
    pub tracker: Arc<RequestTracker>,
    pub events: EventBus,
}

impl AppState {
    /// Wire every component from the loaded config
    pub fn from_config(config: &Config) -> Result<Self> {
        let seed = config.titand.sampler_seed;
        // distinct streams per sampler when a seed is fixed
        let seed_for = |offset: u64| seed.map(|s| s.wrapping_add(offset));

        let events = EventBus::new();
        let metrics = TitanMetrics::new()?;
        let tracker = Arc::new(RequestTracker::new());

        let source: Arc<dyn MetricsSource> = match config.titand.metrics_source {
            MetricsSourceKind::System => Arc::new(SystemMetricsSource::new(tracker.clone())),
            MetricsSourceKind::Simulated => Arc::new(SimulatedMetricsSource::new(seed_for(0))),
        };
        info!("Metrics source: {:?}", config.titand.metrics_source);

        let validator = Arc::new(SimulatedModelValidator::new(seed_for(1)));
        let ai = Arc::new(AiOptimizer::new(
            validator.clone(),
            config.ai.optimization_iterations,
        ));

        let scanner = Arc::new(ChecklistScanner::new(
            config.security.vulnerability_probability,
            seed_for(2),
        ));
        let security = Arc::new(SecurityAuditor::new(
            scanner,
            config.security.sections.clone(),
            events.clone(),
        ));

        let performance = Arc::new(PerformanceMonitor::new(source.clone(), events.clone()));

        let runner = Arc::new(RemediationRunner::new(
            ai.clone(),
            performance.clone(),
            security.clone(),
            config.step_delay(),
        ));

        let aggregator = HealthAggregator::builder()
            .ai_probe(AiHealthProbe::new(validator, config.ai.model_id.clone()))
            .performance_probe(PerformanceHealthProbe::new(source.clone()))
            .security_probe(SecurityHealthProbe::new(
                security.clone(),
                Duration::from_secs(config.security.audit_max_age_secs),
            ))
            .request_source(source)
            .step_runner(runner)
            .events(events.clone())
            .metrics(metrics.clone())
            .probe_timeout(config.probe_timeout())
            .step_timeout(config.step_timeout())
            .history(config.history_capacity, config.history_max_age_hours)
            .build()?;
        let aggregator = Arc::new(aggregator);

        let monitoring = Arc::new(MonitoringLoop::new(
            aggregator.clone(),
            performance.clone(),
            config,
        ));

        Ok(Self {
            aggregator,
            performance,
            security,
            ai,
            monitoring,
            metrics,
            tracker,
            events,
        })
    }
}

/// Full router with request tracking and tracing layers
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::ai_routes())
        .merge(routes::performance_routes())
        .merge(routes::security_routes())
        .merge(routes::optimization_routes())
        .merge(routes::monitoring_routes())
        .merge(routes::metrics_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::track_requests,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until ctrl-c
pub async fn run(state: AppState, bind_address: &str) -> Result<()> {
    let state = Arc::new(state);
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.monitoring.stop().await;
    info!("titand stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
