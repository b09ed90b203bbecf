//! Shared fixtures for titand integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use titan_common::{
    AiHealth, OptimizationStep, PerformanceHealth, Result, SecurityHealth, TitanError,
    Vulnerability,
};
use titand::aggregator::HealthAggregator;
use titand::ai::AiOptimizer;
use titand::config::HealthThresholds;
use titand::events::EventBus;
use titand::executor::StepRunner;
use titand::instrumentation::RequestTracker;
use titand::monitor::MonitoringLoop;
use titand::performance::PerformanceMonitor;
use titand::probes::{FakeBehavior, FakeProbe};
use titand::sampler::{ChecklistScanner, SimulatedMetricsSource, SimulatedModelValidator};
use titand::security::{AuditSection, SecurityAuditor, VulnerabilityScanner};
use titand::server::AppState;

// ============================================================================
// Component values
// ============================================================================

/// accuracy 95, latency 100 -> optimization score 100
pub fn strong_ai() -> AiHealth {
    AiHealth::from_validation(95.0, 100.0)
}

/// response 400, memory 20 -> load capacity 50
pub fn steady_performance() -> PerformanceHealth {
    PerformanceHealth::from_metrics(400.0, 800.0, 20.0, 40.0, 1.0)
}

pub fn security(score: f64) -> SecurityHealth {
    SecurityHealth::from_audit(score, 2, 80.0, Utc::now())
}

// ============================================================================
// Step runners
// ============================================================================

/// Completes every step immediately, except the one named in `fail`
pub struct ScriptedRunner {
    pub fail: Option<&'static str>,
    pub delay: Duration,
}

impl ScriptedRunner {
    pub fn instant() -> Self {
        Self {
            fail: None,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(step_id: &'static str) -> Self {
        Self {
            fail: Some(step_id),
            delay: Duration::ZERO,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { fail: None, delay }
    }
}

#[async_trait]
impl StepRunner for ScriptedRunner {
    async fn run(&self, step: &OptimizationStep) -> Result<Vec<String>> {
        tokio::time::sleep(self.delay).await;
        if self.fail == Some(step.step_id.as_str()) {
            return Err(TitanError::Step {
                step: step.step_id.clone(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(vec![format!("ran {}", step.step_id)])
    }
}

// ============================================================================
// Scanners
// ============================================================================

/// Scanner whose backend is unreachable
pub struct DownScanner;

#[async_trait]
impl VulnerabilityScanner for DownScanner {
    async fn scan(&self, section: AuditSection) -> Result<Vec<Vulnerability>> {
        Err(TitanError::Probe {
            probe: section.as_str().to_string(),
            reason: "scanner unreachable".to_string(),
        })
    }
}

// ============================================================================
// Aggregators
// ============================================================================

pub struct Fixture {
    pub ai: FakeBehavior<AiHealth>,
    pub performance: FakeBehavior<PerformanceHealth>,
    pub security: FakeBehavior<SecurityHealth>,
    pub runner: ScriptedRunner,
    pub events: EventBus,
    pub probe_timeout: Duration,
}

impl Fixture {
    /// Overall 0.3 * 100 + 0.3 * 50 + 0.4 * security
    pub fn new(security_score: f64) -> Self {
        Self {
            ai: FakeBehavior::Healthy(strong_ai()),
            performance: FakeBehavior::Healthy(steady_performance()),
            security: FakeBehavior::Healthy(security(security_score)),
            runner: ScriptedRunner::instant(),
            events: EventBus::new(),
            probe_timeout: Duration::from_millis(200),
        }
    }

    pub fn build(self) -> HealthAggregator {
        HealthAggregator::builder()
            .ai_probe(FakeProbe::new("ai", self.ai))
            .performance_probe(FakeProbe::new("performance", self.performance))
            .security_probe(FakeProbe::new("security", self.security))
            .step_runner(Arc::new(self.runner))
            .events(self.events)
            .probe_timeout(self.probe_timeout)
            .step_timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }
}

/// Router state around a fake-probe aggregator
pub fn app_state(aggregator: HealthAggregator) -> Arc<AppState> {
    let events = aggregator.events().clone();
    let metrics = aggregator.metrics().clone();
    let aggregator = Arc::new(aggregator);

    let performance = Arc::new(PerformanceMonitor::new(
        Arc::new(SimulatedMetricsSource::new(Some(5))),
        events.clone(),
    ));
    let security = Arc::new(SecurityAuditor::new(
        Arc::new(ChecklistScanner::new(0.5, Some(5))),
        AuditSection::ALL.to_vec(),
        events.clone(),
    ));
    let ai = Arc::new(AiOptimizer::new(
        Arc::new(SimulatedModelValidator::new(Some(5))),
        3,
    ));
    let monitoring = Arc::new(MonitoringLoop::with_settings(
        aggregator.clone(),
        performance.clone(),
        Duration::from_secs(60),
        HealthThresholds::default(),
        false,
    ));

    Arc::new(AppState {
        aggregator,
        performance,
        security,
        ai,
        monitoring,
        metrics,
        tracker: Arc::new(RequestTracker::new()),
        events,
    })
}
