//! Performance monitor
//!
//! Samples a `MetricsSource`, keeps a bounded sample and alert history, and
//! derives summaries and tuning suggestions from the recent window.

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use titan_common::{
    AlertLevel, EventKind, PerformanceAlert, PerformanceReport, PerformanceSample,
    PerformanceSummary,
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::events::EventBus;
use crate::instrumentation::MetricsSource;

pub const SAMPLE_CAPACITY: usize = 1000;
pub const ALERT_CAPACITY: usize = 200;

/// Samples averaged by `summary()`
pub const SUMMARY_WINDOW: usize = 10;

/// Alerting limits for a single sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    pub response_time_ms: f64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub error_rate: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            response_time_ms: 1000.0,
            cpu_percent: 80.0,
            memory_percent: 85.0,
            error_rate: 5.0,
        }
    }
}

#[derive(Default)]
struct MonitorState {
    samples: VecDeque<PerformanceSample>,
    alerts: VecDeque<PerformanceAlert>,
}

pub struct PerformanceMonitor {
    source: Arc<dyn MetricsSource>,
    thresholds: AlertThresholds,
    events: EventBus,
    state: RwLock<MonitorState>,
    active: AtomicBool,
}

impl PerformanceMonitor {
    pub fn new(source: Arc<dyn MetricsSource>, events: EventBus) -> Self {
        Self::with_thresholds(source, AlertThresholds::default(), events)
    }

    pub fn with_thresholds(
        source: Arc<dyn MetricsSource>,
        thresholds: AlertThresholds,
        events: EventBus,
    ) -> Self {
        Self {
            source,
            thresholds,
            events,
            state: RwLock::new(MonitorState::default()),
            active: AtomicBool::new(false),
        }
    }

    /// Set by the monitoring loop while it runs
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Take a sample, store it and raise alerts for it
    pub async fn collect(&self) -> PerformanceSample {
        let sample = self.sample();
        let alerts = self.check_alerts(&sample);

        {
            let mut state = self.state.write().await;
            if state.samples.len() == SAMPLE_CAPACITY {
                state.samples.pop_front();
            }
            state.samples.push_back(sample.clone());
            for alert in &alerts {
                if state.alerts.len() == ALERT_CAPACITY {
                    state.alerts.pop_front();
                }
                state.alerts.push_back(alert.clone());
            }
        }

        debug!(
            "Collected sample: {:.0}ms p50, {:.1}% cpu, {:.1}% memory",
            sample.response_time, sample.cpu_usage, sample.memory_usage
        );

        for alert in alerts {
            warn!("Performance alert [{:?}]: {}", alert.level, alert.message);
            self.events.publish(EventKind::PerformanceAlert {
                level: alert.level,
                metric: alert.metric,
                message: alert.message,
            });
        }

        sample
    }

    fn sample(&self) -> PerformanceSample {
        PerformanceSample {
            timestamp: Utc::now(),
            response_time: self.source.latency_p50().as_secs_f64() * 1000.0,
            response_time_p99: self.source.latency_p99().as_secs_f64() * 1000.0,
            cpu_usage: self.source.cpu_percent(),
            memory_usage: self.source.memory_percent(),
            memory_bytes: self.source.memory_bytes(),
            error_rate: self.source.error_rate(),
            total_requests: self.source.request_totals().total,
        }
    }

    fn check_alerts(&self, sample: &PerformanceSample) -> Vec<PerformanceAlert> {
        let t = &self.thresholds;
        let checks = [
            (AlertLevel::Error, "response_time", sample.response_time, t.response_time_ms, "ms"),
            (AlertLevel::Warning, "cpu_usage", sample.cpu_usage, t.cpu_percent, "%"),
            (AlertLevel::Critical, "memory_usage", sample.memory_usage, t.memory_percent, "%"),
            (AlertLevel::Error, "error_rate", sample.error_rate, t.error_rate, "%"),
        ];

        checks
            .into_iter()
            .filter(|(_, _, value, threshold, _)| value > threshold)
            .map(|(level, metric, value, threshold, unit)| PerformanceAlert {
                level,
                metric: metric.to_string(),
                value,
                threshold,
                message: format!("High {}: {:.1}{}", metric.replace('_', " "), value, unit),
                timestamp: sample.timestamp,
                resolved: false,
            })
            .collect()
    }

    /// Averages over the last `SUMMARY_WINDOW` samples; None before the first sample
    pub async fn summary(&self) -> Option<PerformanceSummary> {
        let state = self.state.read().await;
        if state.samples.is_empty() {
            return None;
        }

        let recent: Vec<&PerformanceSample> =
            state.samples.iter().rev().take(SUMMARY_WINDOW).collect();
        let n = recent.len() as f64;
        let avg = |f: fn(&PerformanceSample) -> f64| recent.iter().map(|s| f(s)).sum::<f64>() / n;

        Some(PerformanceSummary {
            average_response_time: avg(|s| s.response_time),
            average_cpu_usage: avg(|s| s.cpu_usage),
            average_memory_usage: avg(|s| s.memory_usage),
            average_error_rate: avg(|s| s.error_rate),
            total_data_points: state.samples.len(),
            monitoring_active: self.is_active(),
        })
    }

    /// Most recent alerts, oldest first
    pub async fn alerts(&self, limit: usize) -> Vec<PerformanceAlert> {
        let state = self.state.read().await;
        let skip = state.alerts.len().saturating_sub(limit);
        state.alerts.iter().skip(skip).cloned().collect()
    }

    /// Fresh sample plus the rolling summary and recent alerts
    pub async fn report(&self) -> PerformanceReport {
        let current = self.collect().await;
        PerformanceReport {
            current,
            summary: self.summary().await,
            alerts: self.alerts(20).await,
        }
    }

    /// Tuning suggestions derived from the recent window
    pub async fn optimize_performance(&self) -> Vec<String> {
        if self.summary().await.is_none() {
            self.collect().await;
        }
        let Some(summary) = self.summary().await else {
            return vec!["No metrics available for optimization".to_string()];
        };

        let mut suggestions = Vec::new();
        if summary.average_response_time > 500.0 {
            suggestions.push("Enable response compression".to_string());
            suggestions.push("Implement request caching".to_string());
            suggestions.push("Optimize database queries".to_string());
        }
        if summary.average_memory_usage > 75.0 {
            suggestions.push("Implement memory cleanup routines".to_string());
            suggestions.push("Reduce allocation in hot paths".to_string());
        }
        if summary.average_error_rate > 2.0 {
            suggestions.push("Improve error handling".to_string());
            suggestions.push("Add retry mechanisms".to_string());
            suggestions.push("Implement circuit breaker pattern".to_string());
        }
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrumentation::RequestTotals;
    use std::time::Duration;

    struct Fixed {
        latency_ms: u64,
        memory_percent: u64,
        cpu: f64,
        errors: f64,
    }

    impl MetricsSource for Fixed {
        fn latency_p50(&self) -> Duration {
            Duration::from_millis(self.latency_ms)
        }
        fn latency_p99(&self) -> Duration {
            Duration::from_millis(self.latency_ms * 2)
        }
        fn memory_bytes(&self) -> u64 {
            self.memory_percent
        }
        fn memory_total_bytes(&self) -> u64 {
            100
        }
        fn cpu_percent(&self) -> f64 {
            self.cpu
        }
        fn error_rate(&self) -> f64 {
            self.errors
        }
        fn request_totals(&self) -> RequestTotals {
            RequestTotals { total: 10, failed: 1 }
        }
    }

    fn monitor(latency_ms: u64, memory_percent: u64, cpu: f64, errors: f64) -> PerformanceMonitor {
        PerformanceMonitor::new(
            Arc::new(Fixed {
                latency_ms,
                memory_percent,
                cpu,
                errors,
            }),
            EventBus::new(),
        )
    }

    #[tokio::test]
    async fn test_healthy_sample_raises_no_alerts() {
        let monitor = monitor(200, 50, 40.0, 1.0);
        let sample = monitor.collect().await;
        assert_eq!(sample.response_time, 200.0);
        assert_eq!(sample.memory_usage, 50.0);
        assert!(monitor.alerts(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_alert_levels_per_metric() {
        let monitor = monitor(1500, 90, 85.0, 6.0);
        let mut rx = monitor.events.subscribe();
        monitor.collect().await;

        let alerts = monitor.alerts(10).await;
        let levels: Vec<(&str, AlertLevel)> =
            alerts.iter().map(|a| (a.metric.as_str(), a.level)).collect();
        assert_eq!(
            levels,
            vec![
                ("response_time", AlertLevel::Error),
                ("cpu_usage", AlertLevel::Warning),
                ("memory_usage", AlertLevel::Critical),
                ("error_rate", AlertLevel::Error),
            ]
        );
        assert_eq!(rx.recv().await.unwrap().kind.name(), "performance_alert");
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let monitor = monitor(1500, 50, 40.0, 1.0);
        for _ in 0..(ALERT_CAPACITY + 5) {
            monitor.collect().await;
        }
        assert_eq!(monitor.alerts(usize::MAX).await.len(), ALERT_CAPACITY);
        assert_eq!(monitor.summary().await.unwrap().total_data_points, ALERT_CAPACITY + 5);
    }

    #[tokio::test]
    async fn test_summary_and_suggestions() {
        let monitor = monitor(600, 80, 40.0, 3.0);
        assert!(monitor.summary().await.is_none());

        let suggestions = monitor.optimize_performance().await;
        assert_eq!(suggestions.len(), 8);

        let summary = monitor.summary().await.unwrap();
        assert_eq!(summary.average_response_time, 600.0);
        assert!(!summary.monitoring_active);
    }

    #[tokio::test]
    async fn test_healthy_window_has_no_suggestions() {
        let monitor = monitor(200, 50, 40.0, 1.0);
        monitor.collect().await;
        assert!(monitor.optimize_performance().await.is_empty());
    }
}
