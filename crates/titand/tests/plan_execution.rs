//! Optimization plan lifecycle tests

mod common;

use common::{Fixture, ScriptedRunner};
use std::sync::Arc;
use std::time::Duration;
use titan_common::{AiHealth, PerformanceHealth, PlanTargets, StepStatus, TitanError};
use titand::planner::{AI_MODEL_TUNING, PERFORMANCE_TUNING, SECURITY_HARDENING};
use titand::probes::FakeBehavior;

/// Every component below target: all three steps are planned
fn weak_fixture() -> Fixture {
    let mut fixture = Fixture::new(60.0);
    fixture.ai = FakeBehavior::Healthy(AiHealth::from_validation(75.0, 1000.0));
    fixture.performance =
        FakeBehavior::Healthy(PerformanceHealth::from_metrics(1500.0, 2500.0, 60.0, 50.0, 2.0));
    fixture
}

#[tokio::test]
async fn execute_without_plan_fails() {
    let aggregator = Fixture::new(80.0).build();
    let err = aggregator.execute_current_plan().await.unwrap_err();
    assert!(matches!(err, TitanError::NoPlan));
}

#[tokio::test]
async fn plan_covers_weak_components_in_order() {
    let aggregator = weak_fixture().build();
    let plan = aggregator.create_optimization_plan(PlanTargets::default()).await;

    assert_eq!(
        plan.step_ids(),
        vec![AI_MODEL_TUNING, PERFORMANCE_TUNING, SECURITY_HARDENING]
    );
    assert_eq!(plan.estimated_completion_time, 2.25);
    assert_eq!(aggregator.current_plan().await.unwrap().plan_id, plan.plan_id);
    // planning runs its own health check
    assert_eq!(aggregator.history().await.len(), 1);
}

#[tokio::test]
async fn planning_is_deterministic_for_same_health() {
    let aggregator = weak_fixture().build();
    let first = aggregator.create_optimization_plan(PlanTargets::default()).await;
    let second = aggregator.create_optimization_plan(PlanTargets::default()).await;

    assert_eq!(first.step_ids(), second.step_ids());
    assert_ne!(first.plan_id, second.plan_id);
    assert_eq!(aggregator.current_plan().await.unwrap().plan_id, second.plan_id);
}

#[tokio::test]
async fn failed_step_does_not_stop_the_plan() {
    let mut fixture = weak_fixture();
    fixture.runner = ScriptedRunner::failing(PERFORMANCE_TUNING);
    let mut rx = fixture.events.subscribe();
    let aggregator = fixture.build();

    aggregator.create_optimization_plan(PlanTargets::default()).await;
    let summary = aggregator.execute_current_plan().await.unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 1);

    let plan = aggregator.current_plan().await.unwrap();
    let statuses: Vec<StepStatus> = plan.optimization_steps.iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![StepStatus::Completed, StepStatus::Failed, StepStatus::Completed]
    );
    assert!(plan.optimization_steps[1]
        .error
        .as_deref()
        .unwrap()
        .contains("scripted failure"));

    let step_events: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|e| e.kind.name())
        .filter(|name| name.starts_with("step_"))
        .collect();
    assert_eq!(step_events.iter().filter(|n| **n == "step_failed").count(), 1);
    assert_eq!(step_events.iter().filter(|n| **n == "step_completed").count(), 2);

    let metrics = aggregator.metrics().render().unwrap();
    assert!(metrics.contains("titan_plan_steps_total{status=\"failed\"} 1"));
}

#[tokio::test]
async fn second_execution_is_rejected_while_running() {
    let mut fixture = weak_fixture();
    fixture.runner = ScriptedRunner::slow(Duration::from_millis(100));
    let aggregator = Arc::new(fixture.build());
    aggregator.create_optimization_plan(PlanTargets::default()).await;

    let running = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.execute_current_plan().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(aggregator.is_executing());
    let err = aggregator.execute_current_plan().await.unwrap_err();
    assert!(matches!(err, TitanError::PlanInProgress(_)));

    let summary = running.await.unwrap().unwrap();
    assert_eq!(summary.completed, 3);
    assert!(!aggregator.is_executing());
}

#[tokio::test]
async fn rerun_skips_finished_steps() {
    let aggregator = weak_fixture().build();
    aggregator.create_optimization_plan(PlanTargets::default()).await;

    aggregator.execute_current_plan().await.unwrap();
    let second = aggregator.execute_current_plan().await.unwrap();

    assert!(second.outcomes.is_empty());
    assert!(aggregator.current_plan().await.unwrap().is_finished());
}

#[tokio::test]
async fn replaced_plan_keeps_pending_steps() {
    let mut fixture = weak_fixture();
    fixture.runner = ScriptedRunner::slow(Duration::from_millis(100));
    let aggregator = Arc::new(fixture.build());
    aggregator.create_optimization_plan(PlanTargets::default()).await;

    let running = {
        let aggregator = aggregator.clone();
        tokio::spawn(async move { aggregator.execute_current_plan().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    let replacement = aggregator.create_optimization_plan(PlanTargets::default()).await;
    running.await.unwrap().unwrap();

    let current = aggregator.current_plan().await.unwrap();
    assert_eq!(current.plan_id, replacement.plan_id);
    assert!(current
        .optimization_steps
        .iter()
        .all(|s| s.status == StepStatus::Pending));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_run_each_step_once() {
    let mut fixture = weak_fixture();
    fixture.runner = ScriptedRunner::slow(Duration::from_millis(20));
    let aggregator = Arc::new(fixture.build());
    aggregator.create_optimization_plan(PlanTargets::default()).await;

    let callers: Vec<_> = (0..8)
        .map(|i| {
            let aggregator = aggregator.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10 * i)).await;
                aggregator.execute_current_plan().await
            })
        })
        .collect();

    let mut completed = 0;
    for caller in callers {
        match caller.await.unwrap() {
            Ok(summary) => completed += summary.completed,
            Err(err) => assert!(matches!(err, TitanError::PlanInProgress(_))),
        }
    }

    assert_eq!(completed, 3);
    assert!(aggregator.current_plan().await.unwrap().is_finished());
}
