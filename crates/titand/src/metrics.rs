//! Prometheus metrics for titand

use prometheus::{
    register_gauge_vec_with_registry, register_histogram_with_registry,
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, GaugeVec, Histogram, IntCounter, IntCounterVec,
    IntGauge, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;
use titan_common::{HealthReport, PlanExecutionSummary, Result, TitanError};

fn metrics_err(e: prometheus::Error) -> TitanError {
    TitanError::Metrics(e.to_string())
}

/// Daemon metrics backed by an owned registry
#[derive(Clone)]
pub struct TitanMetrics {
    pub health_checks_total: IntCounter,
    pub overall_score: IntGauge,
    pub component_score: GaugeVec,
    pub probe_failures_total: IntCounterVec,
    pub health_check_duration_seconds: Histogram,
    pub plan_steps_total: IntCounterVec,
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: Histogram,
    pub monitoring_active: IntGauge,

    registry: Arc<Registry>,
}

impl TitanMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let health_checks_total = register_int_counter_with_registry!(
            "titan_health_checks_total",
            "Total number of health checks run",
            registry
        )
        .map_err(metrics_err)?;

        let overall_score = register_int_gauge_with_registry!(
            "titan_overall_score",
            "Overall health score of the latest report (0-100)",
            registry
        )
        .map_err(metrics_err)?;

        let component_score = register_gauge_vec_with_registry!(
            "titan_component_score",
            "Component score of the latest report by component",
            &["component"],
            registry
        )
        .map_err(metrics_err)?;

        let probe_failures_total = register_int_counter_vec_with_registry!(
            "titan_probe_failures_total",
            "Probe failures by probe and kind (error or timeout)",
            &["probe", "kind"],
            registry
        )
        .map_err(metrics_err)?;

        let health_check_duration_seconds = register_histogram_with_registry!(
            "titan_health_check_duration_seconds",
            "Wall time of a full health check",
            vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0],
            registry
        )
        .map_err(metrics_err)?;

        let plan_steps_total = register_int_counter_vec_with_registry!(
            "titan_plan_steps_total",
            "Executed optimization steps by final status",
            &["status"],
            registry
        )
        .map_err(metrics_err)?;

        let http_requests_total = register_int_counter_vec_with_registry!(
            "titan_http_requests_total",
            "HTTP requests by method and status code",
            &["method", "status"],
            registry
        )
        .map_err(metrics_err)?;

        let http_request_duration_seconds = register_histogram_with_registry!(
            "titan_http_request_duration_seconds",
            "HTTP request latency",
            vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0],
            registry
        )
        .map_err(metrics_err)?;

        let monitoring_active = register_int_gauge_with_registry!(
            "titan_monitoring_active",
            "1 while the monitoring loop runs",
            registry
        )
        .map_err(metrics_err)?;

        Ok(Self {
            health_checks_total,
            overall_score,
            component_score,
            probe_failures_total,
            health_check_duration_seconds,
            plan_steps_total,
            http_requests_total,
            http_request_duration_seconds,
            monitoring_active,
            registry: Arc::new(registry),
        })
    }

    pub fn record_report(&self, report: &HealthReport) {
        self.health_checks_total.inc();
        self.overall_score.set(report.overall_score as i64);
        self.component_score
            .with_label_values(&["ai"])
            .set(report.ai_health.optimization_score);
        self.component_score
            .with_label_values(&["performance"])
            .set(report.performance_health.load_capacity);
        self.component_score
            .with_label_values(&["security"])
            .set(report.security_health.security_score);
        self.health_check_duration_seconds
            .observe(report.duration_ms as f64 / 1000.0);
    }

    pub fn record_probe_failure(&self, probe: &str, timed_out: bool) {
        let kind = if timed_out { "timeout" } else { "error" };
        self.probe_failures_total.with_label_values(&[probe, kind]).inc();
    }

    pub fn record_execution(&self, summary: &PlanExecutionSummary) {
        for outcome in &summary.outcomes {
            self.plan_steps_total
                .with_label_values(&[outcome.status.as_str()])
                .inc();
        }
    }

    pub fn record_request(&self, method: &str, status: u16, latency: Duration) {
        self.http_requests_total
            .with_label_values(&[method, &status.to_string()])
            .inc();
        self.http_request_duration_seconds
            .observe(latency.as_secs_f64());
    }

    /// Prometheus text exposition of every registered metric
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).map_err(metrics_err)?;
        String::from_utf8(buffer).map_err(|e| TitanError::Metrics(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_registered_metrics() {
        let metrics = TitanMetrics::new().unwrap();
        metrics.health_checks_total.inc();
        metrics.record_probe_failure("security", true);
        metrics.record_request("GET", 200, Duration::from_millis(5));

        let text = metrics.render().unwrap();
        assert!(text.contains("titan_health_checks_total 1"));
        let failure = text
            .lines()
            .find(|l| l.starts_with("titan_probe_failures_total{"))
            .unwrap();
        assert!(failure.contains("kind=\"timeout\""));
        assert!(failure.contains("probe=\"security\""));
        assert!(failure.ends_with(" 1"));
        assert!(text.contains("titan_http_requests_total{method=\"GET\",status=\"200\"} 1"));
    }

    #[test]
    fn test_registries_are_independent() {
        let a = TitanMetrics::new().unwrap();
        let b = TitanMetrics::new().unwrap();
        a.overall_score.set(42);
        assert!(!b.render().unwrap().contains("titan_overall_score 42"));
    }
}
