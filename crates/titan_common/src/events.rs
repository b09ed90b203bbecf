//! Notifications emitted by the daemon
//!
//! ```text
//! +-----------------+     +----------+     +-------------+
//! | aggregator /    | --> | EventBus | --> | subscribers |
//! | executor / ...  |     | (channel)|     | (log, UI)   |
//! +-----------------+     +----------+     +-------------+
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::performance::AlertLevel;
use crate::plan::StepCategory;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    ReportGenerated {
        report_id: String,
        overall_score: u8,
    },
    /// At least one recommendation in the report is critical
    CriticalIssues {
        report_id: String,
        critical_count: usize,
    },
    /// Overall score fell below the critical floor
    SystemHealthCritical {
        report_id: String,
        overall_score: u8,
    },
    /// A configured health threshold was crossed during monitoring
    ThresholdBreached {
        metric: String,
        value: f64,
        threshold: f64,
    },
    PlanCreated {
        plan_id: String,
        steps: usize,
        estimated_hours: f64,
    },
    StepStarted {
        plan_id: String,
        step_id: String,
        category: StepCategory,
    },
    StepCompleted {
        plan_id: String,
        step_id: String,
        duration_ms: u64,
    },
    StepFailed {
        plan_id: String,
        step_id: String,
        error: String,
    },
    AuditCompleted {
        audit_id: String,
        score: f64,
        vulnerabilities: usize,
    },
    CriticalVulnerability {
        audit_id: String,
        critical_count: usize,
    },
    PerformanceAlert {
        level: AlertLevel,
        metric: String,
        message: String,
    },
    AutoOptimizationTriggered {
        report_id: String,
        overall_score: u8,
    },
    MonitoringStarted {
        interval_ms: u64,
    },
    MonitoringStopped,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReportGenerated { .. } => "report_generated",
            Self::CriticalIssues { .. } => "critical_issues",
            Self::SystemHealthCritical { .. } => "system_health_critical",
            Self::ThresholdBreached { .. } => "threshold_breached",
            Self::PlanCreated { .. } => "plan_created",
            Self::StepStarted { .. } => "step_started",
            Self::StepCompleted { .. } => "step_completed",
            Self::StepFailed { .. } => "step_failed",
            Self::AuditCompleted { .. } => "audit_completed",
            Self::CriticalVulnerability { .. } => "critical_vulnerability",
            Self::PerformanceAlert { .. } => "performance_alert",
            Self::AutoOptimizationTriggered { .. } => "auto_optimization_triggered",
            Self::MonitoringStarted { .. } => "monitoring_started",
            Self::MonitoringStopped => "monitoring_stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitanEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl TitanEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = TitanEvent::new(EventKind::MonitoringStopped);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "monitoring_stopped");
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn test_event_names_match_tags() {
        let kind = EventKind::StepFailed {
            plan_id: "p".to_string(),
            step_id: "s".to_string(),
            error: "boom".to_string(),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["event"], kind.name());
    }
}
