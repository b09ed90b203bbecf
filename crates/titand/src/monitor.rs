//! Continuous monitoring loop
//!
//! A background task that samples performance, runs a health check and
//! checks the configured thresholds on every tick. With auto optimization
//! on, a low overall score creates and executes a plan in the same tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use titan_common::{EventKind, HealthReport, MonitoringState, PlanTargets};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::aggregator::HealthAggregator;
use crate::config::{Config, HealthThresholds};
use crate::performance::PerformanceMonitor;

/// Overall score below which auto optimization kicks in
pub const AUTO_OPTIMIZATION_SCORE: u8 = 80;

/// A crossed threshold: metric name, observed value, configured limit
#[derive(Debug, Clone, PartialEq)]
pub struct Breach {
    pub metric: &'static str,
    pub value: f64,
    pub threshold: f64,
}

/// Thresholds the report crosses, in ai, performance, security order
pub fn threshold_breaches(report: &HealthReport, thresholds: &HealthThresholds) -> Vec<Breach> {
    let mut breaches = Vec::new();

    if report.ai_health.model_accuracy < thresholds.ai_minimum_accuracy {
        breaches.push(Breach {
            metric: "ai_accuracy",
            value: report.ai_health.model_accuracy,
            threshold: thresholds.ai_minimum_accuracy,
        });
    }
    if report.performance_health.response_time > thresholds.performance_max_response_time {
        breaches.push(Breach {
            metric: "response_time",
            value: report.performance_health.response_time,
            threshold: thresholds.performance_max_response_time,
        });
    }
    if report.security_health.security_score < thresholds.security_minimum_score {
        breaches.push(Breach {
            metric: "security_score",
            value: report.security_health.security_score,
            threshold: thresholds.security_minimum_score,
        });
    }

    breaches
}

struct LoopContext {
    aggregator: Arc<HealthAggregator>,
    performance: Arc<PerformanceMonitor>,
    thresholds: HealthThresholds,
    auto_optimization: bool,
    ticks: AtomicU64,
}

impl LoopContext {
    async fn tick(&self) {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Monitoring tick {}", tick);

        self.performance.collect().await;
        let report = self.aggregator.run_health_check().await;

        for breach in threshold_breaches(&report, &self.thresholds) {
            warn!(
                "Threshold breached: {} = {:.1} (limit {:.1})",
                breach.metric, breach.value, breach.threshold
            );
            self.aggregator.events().publish(EventKind::ThresholdBreached {
                metric: breach.metric.to_string(),
                value: breach.value,
                threshold: breach.threshold,
            });
        }

        if self.auto_optimization && report.overall_score < AUTO_OPTIMIZATION_SCORE {
            self.auto_optimize(&report).await;
        }
    }

    async fn auto_optimize(&self, report: &HealthReport) {
        info!(
            "Auto optimization triggered (overall {}/100)",
            report.overall_score
        );
        self.aggregator.events().publish(EventKind::AutoOptimizationTriggered {
            report_id: report.report_id.clone(),
            overall_score: report.overall_score,
        });

        self.aggregator
            .create_optimization_plan(PlanTargets::default())
            .await;
        match self.aggregator.execute_current_plan().await {
            Ok(summary) => info!(
                "Auto optimization finished: {} completed, {} failed",
                summary.completed, summary.failed
            ),
            Err(e) => error!("Auto optimization failed: {}", e),
        }
    }
}

struct RunningTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct MonitoringLoop {
    context: Arc<LoopContext>,
    interval: Duration,
    task: Mutex<Option<RunningTask>>,
}

impl MonitoringLoop {
    pub fn new(
        aggregator: Arc<HealthAggregator>,
        performance: Arc<PerformanceMonitor>,
        config: &Config,
    ) -> Self {
        Self::with_settings(
            aggregator,
            performance,
            config.monitoring_interval(),
            config.health_thresholds.clone(),
            config.auto_optimization,
        )
    }

    pub fn with_settings(
        aggregator: Arc<HealthAggregator>,
        performance: Arc<PerformanceMonitor>,
        interval: Duration,
        thresholds: HealthThresholds,
        auto_optimization: bool,
    ) -> Self {
        Self {
            context: Arc::new(LoopContext {
                aggregator,
                performance,
                thresholds,
                auto_optimization,
                ticks: AtomicU64::new(0),
            }),
            interval,
            task: Mutex::new(None),
        }
    }

    /// Spawn the loop. Returns false when it is already running.
    pub async fn start(&self) -> bool {
        let mut task = self.task.lock().await;
        if task.as_ref().map_or(false, |t| !t.handle.is_finished()) {
            return false;
        }

        let (stop, mut stopped) = watch::channel(false);
        let context = self.context.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {}
                }
                // a started tick runs to completion so plan results are stored
                context.tick().await;
            }
            debug!("Monitoring task exiting");
        });

        *task = Some(RunningTask { stop, handle });
        self.set_active(true);

        let interval_ms = self.interval.as_millis() as u64;
        info!("Monitoring started (every {}ms)", interval_ms);
        self.context
            .aggregator
            .events()
            .publish(EventKind::MonitoringStarted { interval_ms });
        true
    }

    /// Signal the loop and wait for it to exit. Returns false when it was not running.
    ///
    /// A tick already in progress finishes first, including any plan it is executing.
    pub async fn stop(&self) -> bool {
        let Some(running) = self.task.lock().await.take() else {
            return false;
        };

        let _ = running.stop.send(true);
        if let Err(e) = running.handle.await {
            warn!("Monitoring task ended abnormally: {}", e);
        }

        self.set_active(false);
        info!("Monitoring stopped");
        self.context
            .aggregator
            .events()
            .publish(EventKind::MonitoringStopped);
        true
    }

    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .map_or(false, |t| !t.handle.is_finished())
    }

    pub async fn state(&self) -> MonitoringState {
        MonitoringState {
            active: self.is_running().await,
            interval_ms: self.interval.as_millis() as u64,
            auto_optimization: self.context.auto_optimization,
            ticks: self.context.ticks.load(Ordering::SeqCst),
        }
    }

    fn set_active(&self, active: bool) {
        self.context.performance.set_active(active);
        self.context
            .aggregator
            .metrics()
            .monitoring_active
            .set(i64::from(active));
    }
}
