//! Plan executor
//!
//! Walks the plan's steps in order and drives each through
//! `pending -> in_progress -> completed | failed`. A failing or timed-out
//! step is recorded and the next step still runs; there is no retry and no
//! rollback. Steps that are not pending (from an earlier run) are skipped.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use titan_common::{
    EventKind, OptimizationPlan, OptimizationStep, PlanExecutionSummary, Result, StepOutcome,
    StepStatus, TitanError,
};
use tracing::{debug, info, warn};

use crate::ai::AiOptimizer;
use crate::events::EventBus;
use crate::performance::PerformanceMonitor;
use crate::planner::{AI_MODEL_TUNING, PERFORMANCE_TUNING, SECURITY_HARDENING};
use crate::security::SecurityAuditor;

/// Model tuned by the AI remediation step
pub const REMEDIATION_MODEL: &str = "ensemble";

/// Performs the work behind one step; the returned lines describe what was done
#[async_trait]
pub trait StepRunner: Send + Sync {
    async fn run(&self, step: &OptimizationStep) -> Result<Vec<String>>;
}

/// Dispatches steps to the optimizer, monitor and auditor
pub struct RemediationRunner {
    ai: Arc<AiOptimizer>,
    performance: Arc<PerformanceMonitor>,
    security: Arc<SecurityAuditor>,
    delay: Duration,
}

impl RemediationRunner {
    pub fn new(
        ai: Arc<AiOptimizer>,
        performance: Arc<PerformanceMonitor>,
        security: Arc<SecurityAuditor>,
        delay: Duration,
    ) -> Self {
        Self {
            ai,
            performance,
            security,
            delay,
        }
    }
}

#[async_trait]
impl StepRunner for RemediationRunner {
    async fn run(&self, step: &OptimizationStep) -> Result<Vec<String>> {
        let detail = match step.step_id.as_str() {
            AI_MODEL_TUNING => {
                let result = self.ai.optimize_model(REMEDIATION_MODEL, None).await?;
                let mut detail = vec![format!(
                    "Model {} at {:.1}% accuracy, {:.0}ms latency",
                    result.model_id, result.accuracy, result.latency_ms
                )];
                detail.extend(result.recommendations);
                detail
            }
            PERFORMANCE_TUNING => self.performance.optimize_performance().await,
            SECURITY_HARDENING => {
                let audit = self.security.run_audit().await?;
                let mut detail = vec![format!(
                    "Audit {} scored {}/100 with {} findings",
                    audit.audit_id,
                    audit.score.overall,
                    audit.vulnerabilities.len()
                )];
                detail.extend(audit.recommendations);
                detail
            }
            other => {
                info!("Executing custom optimization step {}: {}", other, step.title);
                Vec::new()
            }
        };

        // simulated processing time
        tokio::time::sleep(self.delay).await;
        Ok(detail)
    }
}

pub struct PlanExecutor {
    runner: Arc<dyn StepRunner>,
    events: EventBus,
    step_timeout: Duration,
}

impl PlanExecutor {
    pub fn new(runner: Arc<dyn StepRunner>, events: EventBus, step_timeout: Duration) -> Self {
        Self {
            runner,
            events,
            step_timeout,
        }
    }

    /// Run every pending step of the plan in list order
    pub async fn execute(&self, plan: &mut OptimizationPlan) -> PlanExecutionSummary {
        let started = Instant::now();
        let plan_id = plan.plan_id.clone();
        info!("Executing optimization plan {} ({} steps)", plan_id, plan.optimization_steps.len());

        let mut outcomes = Vec::new();
        for step in plan.optimization_steps.iter_mut() {
            if step.status != StepStatus::Pending {
                debug!("Skipping step {} ({})", step.step_id, step.status);
                continue;
            }
            outcomes.push(self.execute_step(&plan_id, step).await);
        }

        let completed = outcomes.iter().filter(|o| o.status == StepStatus::Completed).count();
        let failed = outcomes.iter().filter(|o| o.status == StepStatus::Failed).count();
        info!(
            "Plan {} finished: {} completed, {} failed",
            plan_id, completed, failed
        );

        PlanExecutionSummary {
            plan_id,
            completed,
            failed,
            outcomes,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn execute_step(&self, plan_id: &str, step: &mut OptimizationStep) -> StepOutcome {
        let started = Instant::now();

        if let Err(e) = step.start() {
            warn!("Cannot start step {}: {}", step.step_id, e);
            return StepOutcome {
                step_id: step.step_id.clone(),
                status: step.status,
                detail: Vec::new(),
                error: Some(e.to_string()),
                duration_ms: 0,
            };
        }

        info!("Executing optimization step: {}", step.title);
        self.events.publish(EventKind::StepStarted {
            plan_id: plan_id.to_string(),
            step_id: step.step_id.clone(),
            category: step.category,
        });

        let result = match tokio::time::timeout(self.step_timeout, self.runner.run(step)).await {
            Ok(result) => result,
            Err(_) => Err(TitanError::Step {
                step: step.step_id.clone(),
                reason: format!("timed out after {}ms", self.step_timeout.as_millis()),
            }),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let (detail, error) = match result {
            Ok(detail) => {
                if let Err(e) = step.complete() {
                    warn!("Cannot complete step {}: {}", step.step_id, e);
                }
                info!("Completed step {} in {}ms", step.step_id, duration_ms);
                self.events.publish(EventKind::StepCompleted {
                    plan_id: plan_id.to_string(),
                    step_id: step.step_id.clone(),
                    duration_ms,
                });
                (detail, None)
            }
            Err(e) => {
                let reason = e.to_string();
                if let Err(e) = step.fail(reason.clone()) {
                    warn!("Cannot fail step {}: {}", step.step_id, e);
                }
                warn!("Step {} failed: {}", step.step_id, reason);
                self.events.publish(EventKind::StepFailed {
                    plan_id: plan_id.to_string(),
                    step_id: step.step_id.clone(),
                    error: reason.clone(),
                });
                (Vec::new(), Some(reason))
            }
        };

        StepOutcome {
            step_id: step.step_id.clone(),
            status: step.status,
            detail,
            error,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use titan_common::{PlanTargets, StepCategory};

    /// Fails the named step, sleeps on `hang`, succeeds otherwise
    struct Scripted {
        fail: Option<&'static str>,
        hang: Option<&'static str>,
    }

    #[async_trait]
    impl StepRunner for Scripted {
        async fn run(&self, step: &OptimizationStep) -> Result<Vec<String>> {
            if self.fail == Some(step.step_id.as_str()) {
                return Err(TitanError::Step {
                    step: step.step_id.clone(),
                    reason: "runner exploded".to_string(),
                });
            }
            if self.hang == Some(step.step_id.as_str()) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(vec![format!("ran {}", step.step_id)])
        }
    }

    fn plan() -> OptimizationPlan {
        OptimizationPlan {
            plan_id: "opt_plan_test".to_string(),
            created_at: Utc::now(),
            source_report_id: "health_test".to_string(),
            target_improvements: PlanTargets::default(),
            optimization_steps: vec![
                OptimizationStep::new(AI_MODEL_TUNING, StepCategory::Ai, "AI", "", true, 45),
                OptimizationStep::new(
                    PERFORMANCE_TUNING,
                    StepCategory::Performance,
                    "Perf",
                    "",
                    true,
                    30,
                ),
                OptimizationStep::new(
                    SECURITY_HARDENING,
                    StepCategory::Security,
                    "Sec",
                    "",
                    false,
                    60,
                ),
            ],
            estimated_completion_time: 2.25,
            expected_benefits: Vec::new(),
        }
    }

    fn executor(runner: Scripted, events: EventBus) -> PlanExecutor {
        PlanExecutor::new(Arc::new(runner), events, Duration::from_millis(100))
    }

    #[tokio::test]
    async fn test_all_steps_complete() {
        let mut plan = plan();
        let summary = executor(Scripted { fail: None, hang: None }, EventBus::new())
            .execute(&mut plan)
            .await;

        assert_eq!(summary.completed, 3);
        assert_eq!(summary.failed, 0);
        assert!(plan.is_finished());
        assert_eq!(summary.outcomes[0].detail, vec!["ran ai_model_tuning".to_string()]);
        assert!(plan.optimization_steps.iter().all(|s| s.finished_at.is_some()));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_steps() {
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let mut plan = plan();

        let summary = executor(Scripted { fail: Some(PERFORMANCE_TUNING), hang: None }, events)
            .execute(&mut plan)
            .await;

        let statuses: Vec<StepStatus> = plan.optimization_steps.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![StepStatus::Completed, StepStatus::Failed, StepStatus::Completed]
        );
        assert_eq!(summary.failed, 1);
        assert!(plan.optimization_steps[1]
            .error
            .as_deref()
            .unwrap()
            .contains("runner exploded"));

        let names: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "step_started",
                "step_completed",
                "step_started",
                "step_failed",
                "step_started",
                "step_completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_timed_out_step_fails() {
        let mut plan = plan();
        let runner = Scripted {
            fail: None,
            hang: Some(AI_MODEL_TUNING),
        };
        let summary = executor(runner, EventBus::new()).execute(&mut plan).await;

        assert_eq!(plan.optimization_steps[0].status, StepStatus::Failed);
        assert!(summary.outcomes[0].error.as_deref().unwrap().contains("timed out"));
        assert_eq!(summary.completed, 2);
    }

    #[tokio::test]
    async fn test_finished_steps_are_skipped_on_rerun() {
        let mut plan = plan();
        let executor = executor(Scripted { fail: None, hang: None }, EventBus::new());
        executor.execute(&mut plan).await;

        let second = executor.execute(&mut plan).await;
        assert!(second.outcomes.is_empty());
        assert_eq!(second.completed, 0);
    }
}
