//! TITAN common types shared between the daemon and the CLI.

pub mod api;
pub mod error;
pub mod events;
pub mod health;
pub mod performance;
pub mod plan;
pub mod recommendation;
pub mod security;

pub use api::{
    AiOptimizeRequest, AuditPayload, CreatePlanRequest, Dashboard, DashboardPayload, Envelope,
    ErrorBody, ExecutionPayload, HealthPayload, HistorySummary, MetricsPayload, ModelValidation,
    MonitoringPayload, MonitoringState, OptimizationPayload, PlanPayload, ReportPayload,
    ScoreTrend,
};
pub use error::{Result, TitanError};
pub use events::{EventKind, TitanEvent};
pub use health::{
    AiHealth, ComponentHealth, HealthReport, HealthStatus, PerformanceHealth, SecurityHealth,
    SystemMetrics,
};
pub use performance::{
    AlertLevel, PerformanceAlert, PerformanceReport, PerformanceSample, PerformanceSummary,
};
pub use plan::{
    OptimizationPlan, OptimizationStep, PlanExecutionSummary, PlanTargets, StepCategory,
    StepOutcome, StepStatus,
};
pub use recommendation::{Effort, Priority, Recommendation, RecommendationCategory};
pub use security::{
    compliance_rate, AreaScores, AuditTrendPoint, ComplianceCheck, ComplianceStandard,
    ComplianceStatus, SecurityArea, SecurityAudit, SecurityDashboard, SecurityScore, Severity,
    Vulnerability, VulnerabilityCategory,
};
