//! Health probes
//!
//! Each probe measures one component and returns its sub-report. The
//! aggregator runs them concurrently and substitutes the component's
//! worst-case sentinel when a probe errors or times out.
//!
//! Production wiring uses `AiHealthProbe`, `PerformanceHealthProbe` and
//! `SecurityHealthProbe`. Tests use `FakeProbe` with a scripted behaviour.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use titan_common::{
    AiHealth, ComponentHealth, PerformanceHealth, Result, SecurityHealth, TitanError,
};
use tracing::debug;

use crate::ai::ModelValidator;
use crate::instrumentation::MetricsSource;
use crate::security::SecurityAuditor;

// ============================================================================
// Probe Trait
// ============================================================================

#[async_trait]
pub trait HealthProbe: Send + Sync {
    type Output: ComponentHealth;

    fn name(&self) -> &'static str;

    async fn check(&self) -> Result<Self::Output>;
}

// ============================================================================
// AI
// ============================================================================

pub struct AiHealthProbe {
    validator: Arc<dyn ModelValidator>,
    model_id: String,
}

impl AiHealthProbe {
    pub fn new(validator: Arc<dyn ModelValidator>, model_id: impl Into<String>) -> Self {
        Self {
            validator,
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl HealthProbe for AiHealthProbe {
    type Output = AiHealth;

    fn name(&self) -> &'static str {
        "ai"
    }

    async fn check(&self) -> Result<AiHealth> {
        let run = self.validator.validate(&self.model_id).await?;
        debug!("AI probe: {:.1}% accuracy, {:.0}ms latency", run.accuracy, run.latency_ms);
        Ok(AiHealth::from_validation(run.accuracy, run.latency_ms))
    }
}

// ============================================================================
// Performance
// ============================================================================

pub struct PerformanceHealthProbe {
    source: Arc<dyn MetricsSource>,
}

impl PerformanceHealthProbe {
    pub fn new(source: Arc<dyn MetricsSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl HealthProbe for PerformanceHealthProbe {
    type Output = PerformanceHealth;

    fn name(&self) -> &'static str {
        "performance"
    }

    async fn check(&self) -> Result<PerformanceHealth> {
        let as_ms = |d: Duration| d.as_secs_f64() * 1000.0;
        Ok(PerformanceHealth::from_metrics(
            as_ms(self.source.latency_p50()),
            as_ms(self.source.latency_p99()),
            self.source.memory_percent(),
            self.source.cpu_percent(),
            self.source.error_rate(),
        ))
    }
}

// ============================================================================
// Security
// ============================================================================

/// Reports the latest audit, re-auditing once it is older than `max_age`
pub struct SecurityHealthProbe {
    auditor: Arc<SecurityAuditor>,
    max_age: Duration,
}

impl SecurityHealthProbe {
    pub fn new(auditor: Arc<SecurityAuditor>, max_age: Duration) -> Self {
        Self { auditor, max_age }
    }
}

#[async_trait]
impl HealthProbe for SecurityHealthProbe {
    type Output = SecurityHealth;

    fn name(&self) -> &'static str {
        "security"
    }

    async fn check(&self) -> Result<SecurityHealth> {
        let fresh = self.auditor.latest_audit().await.filter(|audit| {
            (Utc::now() - audit.timestamp)
                .to_std()
                .map(|age| age < self.max_age)
                .unwrap_or(true)
        });

        let audit = match fresh {
            Some(audit) => audit,
            None => {
                debug!("No recent security audit, running one");
                self.auditor.run_audit().await?
            }
        };

        Ok(SecurityHealth::from_audit(
            audit.score.overall,
            audit.open_vulnerabilities(),
            audit.compliance_rate(),
            audit.timestamp,
        ))
    }
}

// ============================================================================
// Fake Probe (Testing)
// ============================================================================

/// Scripted probe behaviour
#[derive(Debug, Clone)]
pub enum FakeBehavior<T> {
    Healthy(T),
    Fail(String),
    /// Sleeps before answering; used to exercise probe timeouts
    Hang(Duration),
}

pub struct FakeProbe<T> {
    name: &'static str,
    behavior: FakeBehavior<T>,
}

impl<T> FakeProbe<T> {
    pub fn new(name: &'static str, behavior: FakeBehavior<T>) -> Self {
        Self { name, behavior }
    }

    pub fn healthy(name: &'static str, value: T) -> Self {
        Self::new(name, FakeBehavior::Healthy(value))
    }

    pub fn failing(name: &'static str, reason: impl Into<String>) -> Self {
        Self::new(name, FakeBehavior::Fail(reason.into()))
    }
}

#[async_trait]
impl<T: ComponentHealth> HealthProbe for FakeProbe<T> {
    type Output = T;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn check(&self) -> Result<T> {
        match &self.behavior {
            FakeBehavior::Healthy(value) => Ok(value.clone()),
            FakeBehavior::Fail(reason) => Err(TitanError::Probe {
                probe: self.name.to_string(),
                reason: reason.clone(),
            }),
            FakeBehavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(T::worst_case())
            }
        }
    }
}
