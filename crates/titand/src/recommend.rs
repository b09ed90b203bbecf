//! Recommendation rules applied to every health report

use titan_common::{
    AiHealth, Effort, PerformanceHealth, Priority, Recommendation, RecommendationCategory,
    SecurityHealth,
};

pub const AI_ACCURACY_TARGET: f64 = 90.0;
pub const AI_ACCURACY_CRITICAL: f64 = 80.0;
pub const RESPONSE_TIME_TARGET_MS: f64 = 1000.0;
pub const RESPONSE_TIME_CRITICAL_MS: f64 = 2000.0;
pub const SECURITY_SCORE_TARGET: f64 = 85.0;
pub const SECURITY_SCORE_CRITICAL: f64 = 70.0;

/// Recommendations for the three components, in ai/performance/security
/// order, followed by one system recommendation when probes were degraded.
pub fn recommendations(
    ai: &AiHealth,
    performance: &PerformanceHealth,
    security: &SecurityHealth,
    degraded_probes: &[String],
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if ai.model_accuracy < AI_ACCURACY_TARGET {
        out.push(Recommendation {
            id: "ai_accuracy_improvement".to_string(),
            category: RecommendationCategory::Ai,
            priority: if ai.model_accuracy < AI_ACCURACY_CRITICAL {
                Priority::Critical
            } else {
                Priority::High
            },
            title: "Improve AI Model Accuracy".to_string(),
            description: format!(
                "Current accuracy is {:.1}%, below the {}% threshold",
                ai.model_accuracy, AI_ACCURACY_TARGET
            ),
            action_required: "Run model fine-tuning and hyperparameter optimization".to_string(),
            estimated_impact: 15,
            implementation_effort: Effort::Medium,
        });
    }

    if performance.response_time > RESPONSE_TIME_TARGET_MS {
        out.push(Recommendation {
            id: "performance_optimization".to_string(),
            category: RecommendationCategory::Performance,
            priority: if performance.response_time > RESPONSE_TIME_CRITICAL_MS {
                Priority::Critical
            } else {
                Priority::High
            },
            title: "Optimize System Performance".to_string(),
            description: format!(
                "Response time is {:.0}ms, exceeding the {}ms target",
                performance.response_time, RESPONSE_TIME_TARGET_MS
            ),
            action_required: "Add caching, optimize queries and scale resources".to_string(),
            estimated_impact: 20,
            implementation_effort: Effort::Medium,
        });
    }

    if security.security_score < SECURITY_SCORE_TARGET {
        out.push(Recommendation {
            id: "security_hardening".to_string(),
            category: RecommendationCategory::Security,
            priority: if security.security_score < SECURITY_SCORE_CRITICAL {
                Priority::Critical
            } else {
                Priority::High
            },
            title: "Enhance Security Posture".to_string(),
            description: format!(
                "Security score is {:.0}/100 with {} open vulnerabilities",
                security.security_score, security.vulnerabilities_count
            ),
            action_required: "Address vulnerabilities and apply security best practices"
                .to_string(),
            estimated_impact: 25,
            implementation_effort: Effort::High,
        });
    }

    if !degraded_probes.is_empty() {
        out.push(Recommendation {
            id: "probe_failure".to_string(),
            category: RecommendationCategory::System,
            priority: Priority::Critical,
            title: "Restore Health Probes".to_string(),
            description: format!(
                "Probes without a result: {}. Their components are reported at worst case.",
                degraded_probes.join(", ")
            ),
            action_required: "Check the daemon logs for probe errors and timeouts".to_string(),
            estimated_impact: 10,
            implementation_effort: Effort::Low,
        });
    }

    out
}
