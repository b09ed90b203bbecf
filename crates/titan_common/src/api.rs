//! HTTP request/response shapes shared by titand and titanctl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::health::HealthReport;
use crate::performance::{PerformanceAlert, PerformanceReport, PerformanceSummary};
use crate::plan::{OptimizationPlan, PlanExecutionSummary, PlanTargets};
use crate::security::{SecurityAudit, SecurityDashboard};

/// Success envelope: `{success: true, <payload>, timestamp}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Failure body: `{error, details}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthPayload {
    pub health: HealthReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsPayload {
    pub metrics: PerformanceReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditPayload {
    pub audit: SecurityAudit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationPayload {
    pub optimization: ModelValidation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPayload {
    pub plan: OptimizationPlan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPayload {
    pub execution: PlanExecutionSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub dashboard: Dashboard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringPayload {
    pub monitoring: MonitoringState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPayload {
    pub report: String,
}

/// Body of `POST /ai/optimize`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiOptimizeRequest {
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
}

/// Body of `POST /optimization/plan`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePlanRequest {
    #[serde(default)]
    pub targets: Option<PlanTargets>,
}

/// Result of validating (and optionally tuning) a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelValidation {
    pub model_id: String,
    pub strategy: String,
    pub is_valid: bool,
    /// Accuracy in percent
    pub accuracy: f64,
    pub latency_ms: f64,
    pub memory_usage_mb: f64,
    pub iterations: u32,
    pub errors: Vec<String>,
    pub recommendations: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTrend {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

impl fmt::Display for ScoreTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Improving => "Improving",
            Self::Declining => "Declining",
            Self::Stable => "Stable",
            Self::InsufficientData => "Insufficient data",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub reports: usize,
    pub average_score: Option<f64>,
    pub latest_score: Option<u8>,
    pub trend: ScoreTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringState {
    pub active: bool,
    pub interval_ms: u64,
    pub auto_optimization: bool,
    pub ticks: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub latest_report: Option<HealthReport>,
    pub history: HistorySummary,
    pub current_plan: Option<OptimizationPlan>,
    pub performance: Option<PerformanceSummary>,
    pub alerts: Vec<PerformanceAlert>,
    pub security: SecurityDashboard,
    pub monitoring: MonitoringState,
}
