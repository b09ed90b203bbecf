//! Health aggregator
//!
//! Owns the three probes, the bounded report history and the single current
//! optimization plan.
//!
//! ```text
//!            +-----------+
//!   ai ----->|           |      overall = 0.3 * ai.optimization_score
//!   perf --->| join! +   |--->          + 0.3 * performance.load_capacity
//!   sec ---->| timeouts  |              + 0.4 * security.security_score
//!            +-----------+
//! ```
//!
//! A probe that errors or exceeds the probe timeout contributes its
//! worst-case sentinel and is listed in `degraded_probes`; a health check
//! itself never fails.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use titan_common::{
    AiHealth, ComponentHealth, EventKind, HealthReport, HistorySummary, OptimizationPlan,
    PerformanceHealth, PlanExecutionSummary, PlanTargets, Result, SecurityHealth, SystemMetrics,
    TitanError,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::EventBus;
use crate::executor::{PlanExecutor, StepRunner};
use crate::history::ReportHistory;
use crate::instrumentation::MetricsSource;
use crate::metrics::TitanMetrics;
use crate::planner::plan_from_report;
use crate::probes::HealthProbe;
use crate::recommend::recommendations;
use crate::report;

pub const AI_WEIGHT: f64 = 0.3;
pub const PERFORMANCE_WEIGHT: f64 = 0.3;
pub const SECURITY_WEIGHT: f64 = 0.4;

/// Overall scores below this emit `SystemHealthCritical`
pub const CRITICAL_SCORE: u8 = 60;

pub type AiProbe = Arc<dyn HealthProbe<Output = AiHealth>>;
pub type PerformanceProbe = Arc<dyn HealthProbe<Output = PerformanceHealth>>;
pub type SecurityProbe = Arc<dyn HealthProbe<Output = SecurityHealth>>;

/// Weighted overall score; component scores are clamped to [0, 100] first
pub fn overall_score(
    ai: &AiHealth,
    performance: &PerformanceHealth,
    security: &SecurityHealth,
) -> u8 {
    let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
    let weighted = clamp(ai.score()) * AI_WEIGHT
        + clamp(performance.score()) * PERFORMANCE_WEIGHT
        + clamp(security.score()) * SECURITY_WEIGHT;
    weighted.round().clamp(0.0, 100.0) as u8
}

/// Resets the execution flag when dropped
struct ExecutionGuard<'a>(&'a AtomicBool);

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct HealthAggregator {
    ai_probe: AiProbe,
    performance_probe: PerformanceProbe,
    security_probe: SecurityProbe,
    request_source: Option<Arc<dyn MetricsSource>>,
    executor: PlanExecutor,
    events: EventBus,
    metrics: TitanMetrics,
    probe_timeout: Duration,
    history: RwLock<ReportHistory>,
    current_plan: Mutex<Option<OptimizationPlan>>,
    executing: AtomicBool,
    started: Instant,
}

impl HealthAggregator {
    pub fn builder() -> HealthAggregatorBuilder {
        HealthAggregatorBuilder::default()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn metrics(&self) -> &TitanMetrics {
        &self.metrics
    }

    /// Run all probes concurrently and build, store and announce a report
    pub async fn run_health_check(&self) -> HealthReport {
        let start = Instant::now();
        debug!("Running system health check");

        let (ai, performance, security) = tokio::join!(
            self.run_probe(self.ai_probe.as_ref()),
            self.run_probe(self.performance_probe.as_ref()),
            self.run_probe(self.security_probe.as_ref()),
        );

        let degraded_probes: Vec<String> = [ai.1, performance.1, security.1]
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        let (ai, performance, security) = (ai.0, performance.0, security.0);

        let overall = overall_score(&ai, &performance, &security);
        let recommendations = recommendations(&ai, &performance, &security, &degraded_probes);

        let totals = self
            .request_source
            .as_ref()
            .map(|source| source.request_totals())
            .unwrap_or_default();

        let report = HealthReport {
            report_id: HealthReport::new_id(),
            timestamp: chrono::Utc::now(),
            overall_score: overall,
            ai_health: ai,
            performance_health: performance,
            security_health: security,
            recommendations,
            system_metrics: SystemMetrics::new(
                self.started.elapsed().as_secs(),
                totals.total,
                totals.failed,
            ),
            degraded_probes,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        self.history.write().await.push(report.clone());
        self.metrics.record_report(&report);
        info!(
            "Health check {} complete: overall {}/100 ({} recommendations)",
            report.report_id,
            report.overall_score,
            report.recommendations.len()
        );
        self.announce(&report);

        report
    }

    /// Probe result, or the worst case plus the probe name when it failed
    async fn run_probe<P>(&self, probe: &P) -> (P::Output, Option<&'static str>)
    where
        P: HealthProbe + ?Sized,
    {
        match tokio::time::timeout(self.probe_timeout, probe.check()).await {
            Ok(Ok(health)) => (health, None),
            Ok(Err(e)) => {
                warn!("Probe {} failed: {}", probe.name(), e);
                self.metrics.record_probe_failure(probe.name(), false);
                (P::Output::worst_case(), Some(probe.name()))
            }
            Err(_) => {
                let e = TitanError::ProbeTimeout {
                    probe: probe.name().to_string(),
                    timeout_ms: self.probe_timeout.as_millis() as u64,
                };
                warn!("{}", e);
                self.metrics.record_probe_failure(probe.name(), true);
                (P::Output::worst_case(), Some(probe.name()))
            }
        }
    }

    fn announce(&self, report: &HealthReport) {
        self.events.publish(EventKind::ReportGenerated {
            report_id: report.report_id.clone(),
            overall_score: report.overall_score,
        });

        let critical_count = report.recommendations.iter().filter(|r| r.is_critical()).count();
        if critical_count > 0 {
            warn!("{} critical issues detected", critical_count);
            self.events.publish(EventKind::CriticalIssues {
                report_id: report.report_id.clone(),
                critical_count,
            });
        }

        if report.overall_score < CRITICAL_SCORE {
            error!("System health score is {}/100", report.overall_score);
            self.events.publish(EventKind::SystemHealthCritical {
                report_id: report.report_id.clone(),
                overall_score: report.overall_score,
            });
        }
    }

    /// Run a fresh health check and make a plan from it the current plan
    pub async fn create_optimization_plan(&self, targets: PlanTargets) -> OptimizationPlan {
        let report = self.run_health_check().await;
        let plan = plan_from_report(&report, targets);

        info!(
            "Optimization plan {} created: {} steps, {:.2}h",
            plan.plan_id,
            plan.optimization_steps.len(),
            plan.estimated_completion_time
        );
        self.events.publish(EventKind::PlanCreated {
            plan_id: plan.plan_id.clone(),
            steps: plan.optimization_steps.len(),
            estimated_hours: plan.estimated_completion_time,
        });

        *self.current_plan.lock().await = Some(plan.clone());
        plan
    }

    pub async fn current_plan(&self) -> Option<OptimizationPlan> {
        self.current_plan.lock().await.clone()
    }

    pub fn is_executing(&self) -> bool {
        self.executing.load(Ordering::SeqCst)
    }

    /// Execute the current plan; one execution at a time.
    ///
    /// The plan is read only after the execution flag is held, so a finished
    /// run's results are always visible to the next one.
    pub async fn execute_current_plan(&self) -> Result<PlanExecutionSummary> {
        if self
            .executing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            let running = self
                .current_plan
                .lock()
                .await
                .as_ref()
                .map(|plan| plan.plan_id.clone())
                .unwrap_or_default();
            return Err(TitanError::PlanInProgress(running));
        }
        let _guard = ExecutionGuard(&self.executing);

        let mut plan = self.current_plan().await.ok_or(TitanError::NoPlan)?;

        let summary = self.executor.execute(&mut plan).await;
        self.metrics.record_execution(&summary);

        let mut current = self.current_plan.lock().await;
        let still_current = current
            .as_ref()
            .map_or(false, |existing| existing.plan_id == plan.plan_id);
        if still_current {
            *current = Some(plan);
        } else {
            debug!("Plan {} was replaced during execution, results not stored", plan.plan_id);
        }

        Ok(summary)
    }

    pub async fn history(&self) -> Vec<HealthReport> {
        self.history.read().await.reports()
    }

    pub async fn latest_report(&self) -> Option<HealthReport> {
        self.history.read().await.latest().cloned()
    }

    pub async fn history_summary(&self) -> HistorySummary {
        self.history.read().await.summary()
    }

    /// Markdown report of the latest health check and the score trend
    pub async fn generate_optimization_report(&self) -> Result<String> {
        let history = self.history.read().await;
        let latest = history.latest().ok_or(TitanError::NoHealthData)?;
        Ok(report::render(latest, &history.summary()))
    }
}

/// Builder for `HealthAggregator`; probes and a step runner are required
pub struct HealthAggregatorBuilder {
    ai_probe: Option<AiProbe>,
    performance_probe: Option<PerformanceProbe>,
    security_probe: Option<SecurityProbe>,
    request_source: Option<Arc<dyn MetricsSource>>,
    step_runner: Option<Arc<dyn StepRunner>>,
    events: Option<EventBus>,
    metrics: Option<TitanMetrics>,
    probe_timeout: Duration,
    step_timeout: Duration,
    history_capacity: usize,
    history_max_age_hours: u64,
}

impl Default for HealthAggregatorBuilder {
    fn default() -> Self {
        Self {
            ai_probe: None,
            performance_probe: None,
            security_probe: None,
            request_source: None,
            step_runner: None,
            events: None,
            metrics: None,
            probe_timeout: Duration::from_secs(5),
            step_timeout: Duration::from_secs(120),
            history_capacity: 100,
            history_max_age_hours: 24,
        }
    }
}

impl HealthAggregatorBuilder {
    pub fn ai_probe(mut self, probe: impl HealthProbe<Output = AiHealth> + 'static) -> Self {
        self.ai_probe = Some(Arc::new(probe));
        self
    }

    pub fn performance_probe(
        mut self,
        probe: impl HealthProbe<Output = PerformanceHealth> + 'static,
    ) -> Self {
        self.performance_probe = Some(Arc::new(probe));
        self
    }

    pub fn security_probe(
        mut self,
        probe: impl HealthProbe<Output = SecurityHealth> + 'static,
    ) -> Self {
        self.security_probe = Some(Arc::new(probe));
        self
    }

    /// Source of the request totals in `system_metrics`
    pub fn request_source(mut self, source: Arc<dyn MetricsSource>) -> Self {
        self.request_source = Some(source);
        self
    }

    pub fn step_runner(mut self, runner: Arc<dyn StepRunner>) -> Self {
        self.step_runner = Some(runner);
        self
    }

    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn metrics(mut self, metrics: TitanMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn history(mut self, capacity: usize, max_age_hours: u64) -> Self {
        self.history_capacity = capacity;
        self.history_max_age_hours = max_age_hours;
        self
    }

    pub fn build(self) -> Result<HealthAggregator> {
        let missing = |what: &str| TitanError::Config(format!("aggregator needs {}", what));

        let events = self.events.unwrap_or_default();
        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => TitanMetrics::new()?,
        };
        let runner = self.step_runner.ok_or_else(|| missing("a step runner"))?;

        let ai_probe = self.ai_probe.ok_or_else(|| missing("an AI probe"))?;
        let performance_probe = self
            .performance_probe
            .ok_or_else(|| missing("a performance probe"))?;
        let security_probe = self.security_probe.ok_or_else(|| missing("a security probe"))?;
        let history = ReportHistory::new(self.history_capacity, self.history_max_age_hours);

        Ok(HealthAggregator {
            ai_probe,
            performance_probe,
            security_probe,
            request_source: self.request_source,
            executor: PlanExecutor::new(runner, events.clone(), self.step_timeout),
            events,
            metrics,
            probe_timeout: self.probe_timeout,
            history: RwLock::new(history),
            current_plan: Mutex::new(None),
            executing: AtomicBool::new(false),
            started: Instant::now(),
        })
    }
}
