//! Optimization planner
//!
//! Turns a health report into a list of remediation steps. Pure: the same
//! report always yields the same steps in the same order.

use chrono::Utc;
use titan_common::{HealthReport, OptimizationPlan, OptimizationStep, PlanTargets, StepCategory};

pub const AI_MODEL_TUNING: &str = "ai_model_tuning";
pub const PERFORMANCE_TUNING: &str = "performance_tuning";
pub const SECURITY_HARDENING: &str = "security_hardening";

const AI_SCORE_TARGET: f64 = 90.0;
const RESPONSE_TIME_TARGET_MS: f64 = 1000.0;
const SECURITY_SCORE_TARGET: f64 = 85.0;

/// Steps needed to bring the report's weak components back to target
pub fn steps_for(report: &HealthReport) -> Vec<OptimizationStep> {
    let mut steps = Vec::new();

    if report.ai_health.optimization_score < AI_SCORE_TARGET {
        steps.push(OptimizationStep::new(
            AI_MODEL_TUNING,
            StepCategory::Ai,
            "AI Model Fine-tuning",
            "Optimize AI models for better accuracy and performance",
            true,
            45,
        ));
    }

    if report.performance_health.response_time > RESPONSE_TIME_TARGET_MS {
        steps.push(OptimizationStep::new(
            PERFORMANCE_TUNING,
            StepCategory::Performance,
            "Performance Optimization",
            "Optimize system performance and reduce response times",
            true,
            30,
        ));
    }

    if report.security_health.security_score < SECURITY_SCORE_TARGET {
        steps.push(OptimizationStep::new(
            SECURITY_HARDENING,
            StepCategory::Security,
            "Security Hardening",
            "Address security vulnerabilities and improve security posture",
            false,
            60,
        ));
    }

    steps
}

/// Total estimated duration in hours
pub fn completion_hours(steps: &[OptimizationStep]) -> f64 {
    steps.iter().map(|s| s.estimated_duration as f64).sum::<f64>() / 60.0
}

pub fn plan_from_report(report: &HealthReport, targets: PlanTargets) -> OptimizationPlan {
    let steps = steps_for(report);
    OptimizationPlan {
        plan_id: format!("opt_plan_{}", uuid::Uuid::new_v4().simple()),
        created_at: Utc::now(),
        source_report_id: report.report_id.clone(),
        target_improvements: targets,
        estimated_completion_time: completion_hours(&steps),
        optimization_steps: steps,
        expected_benefits: vec![
            "Improved AI prediction accuracy".to_string(),
            "Faster system response times".to_string(),
            "Enhanced security posture".to_string(),
            "Better system stability".to_string(),
            "Reduced operational costs".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use titan_common::{
        AiHealth, PerformanceHealth, SecurityHealth, StepStatus, SystemMetrics,
    };

    fn report(accuracy: f64, latency: f64, response_time: f64, security: f64) -> HealthReport {
        HealthReport {
            report_id: "health_test".to_string(),
            timestamp: Utc::now(),
            overall_score: 50,
            ai_health: AiHealth::from_validation(accuracy, latency),
            performance_health: PerformanceHealth::from_metrics(
                response_time,
                response_time,
                50.0,
                40.0,
                1.0,
            ),
            security_health: SecurityHealth::from_audit(security, 2, 80.0, Utc::now()),
            recommendations: Vec::new(),
            system_metrics: SystemMetrics::new(10, 0, 0),
            degraded_probes: Vec::new(),
            duration_ms: 1,
        }
    }

    #[test]
    fn test_healthy_report_needs_no_steps() {
        // 95 + 100 - 10 caps at 100
        let plan = plan_from_report(&report(95.0, 100.0, 200.0, 95.0), PlanTargets::default());
        assert!(plan.optimization_steps.is_empty());
        assert_eq!(plan.estimated_completion_time, 0.0);
        assert_eq!(plan.expected_benefits.len(), 5);
    }

    #[test]
    fn test_all_steps_in_order() {
        // optimization score 75 + 100 - 100 = 75
        let plan = plan_from_report(&report(75.0, 1000.0, 1500.0, 60.0), PlanTargets::default());
        assert_eq!(
            plan.step_ids(),
            vec![AI_MODEL_TUNING, PERFORMANCE_TUNING, SECURITY_HARDENING]
        );
        assert_eq!(plan.estimated_completion_time, 135.0 / 60.0);
        assert!(plan.optimization_steps.iter().all(|s| s.status == StepStatus::Pending));
        assert!(!plan.optimization_steps[2].automated);
        assert_eq!(plan.source_report_id, "health_test");
    }

    #[test]
    fn test_planning_is_deterministic() {
        let report = report(85.0, 150.0, 1200.0, 80.0);
        let a = plan_from_report(&report, PlanTargets::default());
        let b = plan_from_report(&report, PlanTargets::default());

        assert_eq!(a.step_ids(), b.step_ids());
        assert_eq!(a.estimated_completion_time, b.estimated_completion_time);
        assert_ne!(a.plan_id, b.plan_id);
    }

    #[test]
    fn test_targets_are_carried() {
        let targets = PlanTargets {
            ai_accuracy_target: 97.0,
            ..PlanTargets::default()
        };
        let plan = plan_from_report(&report(75.0, 1000.0, 200.0, 95.0), targets.clone());
        assert_eq!(plan.target_improvements, targets);
        assert_eq!(plan.step_ids(), vec![AI_MODEL_TUNING]);
    }
}
