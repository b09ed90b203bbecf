//! Health report data model.
//!
//! A [`HealthReport`] combines the three component sub-reports produced by the
//! health probes with the weighted overall score and the recommendations
//! derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::recommendation::Recommendation;

/// Status shared by every component sub-report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Classify a value against descending `(excellent, good, warning)` cutoffs.
    /// A value must be strictly above a cutoff to reach that tier.
    pub fn from_cutoffs(value: f64, excellent: f64, good: f64, warning: f64) -> Self {
        if value > excellent {
            Self::Excellent
        } else if value > good {
            Self::Good
        } else if value > warning {
            Self::Warning
        } else {
            Self::Critical
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common view over the three component sub-reports.
pub trait ComponentHealth: Clone + Send + Sync + 'static {
    /// Sentinel used when the probe fails or times out.
    fn worst_case() -> Self;

    /// Score that feeds the weighted overall score (0-100).
    fn score(&self) -> f64;

    fn status(&self) -> HealthStatus;
}

/// AI model health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiHealth {
    /// Validation accuracy in percent
    pub model_accuracy: f64,
    /// Inference latency in milliseconds
    pub inference_latency: f64,
    pub optimization_score: f64,
    pub status: HealthStatus,
}

impl AiHealth {
    /// Derive the sub-report from a model validation.
    pub fn from_validation(accuracy: f64, latency_ms: f64) -> Self {
        let optimization_score = (accuracy + (100.0 - latency_ms / 10.0)).clamp(0.0, 100.0);
        Self {
            model_accuracy: accuracy,
            inference_latency: latency_ms,
            optimization_score,
            status: HealthStatus::from_cutoffs(accuracy, 90.0, 80.0, 70.0),
        }
    }
}

impl ComponentHealth for AiHealth {
    fn worst_case() -> Self {
        Self {
            model_accuracy: 0.0,
            inference_latency: 9999.0,
            optimization_score: 0.0,
            status: HealthStatus::Critical,
        }
    }

    fn score(&self) -> f64 {
        self.optimization_score
    }

    fn status(&self) -> HealthStatus {
        self.status
    }
}

/// Request-path performance health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceHealth {
    /// Median response time in milliseconds
    pub response_time: f64,
    /// 99th percentile response time in milliseconds
    pub response_time_p99: f64,
    /// Memory usage in percent
    pub memory_usage: f64,
    /// CPU usage in percent
    pub cpu_usage: f64,
    /// Error rate in percent
    pub error_rate: f64,
    pub load_capacity: f64,
    pub status: HealthStatus,
}

impl PerformanceHealth {
    pub fn from_metrics(
        response_time: f64,
        response_time_p99: f64,
        memory_usage: f64,
        cpu_usage: f64,
        error_rate: f64,
    ) -> Self {
        let load_capacity =
            (100.0 - (response_time / 10.0 + memory_usage / 2.0).min(100.0)).max(0.0);
        Self {
            response_time,
            response_time_p99,
            memory_usage,
            cpu_usage,
            error_rate,
            load_capacity,
            status: HealthStatus::from_cutoffs(load_capacity, 80.0, 60.0, 40.0),
        }
    }
}

impl ComponentHealth for PerformanceHealth {
    fn worst_case() -> Self {
        Self {
            response_time: 9999.0,
            response_time_p99: 9999.0,
            memory_usage: 100.0,
            cpu_usage: 100.0,
            error_rate: 100.0,
            load_capacity: 0.0,
            status: HealthStatus::Critical,
        }
    }

    fn score(&self) -> f64 {
        self.load_capacity
    }

    fn status(&self) -> HealthStatus {
        self.status
    }
}

/// Security posture health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityHealth {
    pub security_score: f64,
    pub vulnerabilities_count: usize,
    /// Compliance rate in percent
    pub compliance_rate: f64,
    pub last_audit: Option<DateTime<Utc>>,
    pub status: HealthStatus,
}

impl SecurityHealth {
    pub fn from_audit(
        security_score: f64,
        vulnerabilities_count: usize,
        compliance_rate: f64,
        last_audit: DateTime<Utc>,
    ) -> Self {
        Self {
            security_score,
            vulnerabilities_count,
            compliance_rate,
            last_audit: Some(last_audit),
            status: HealthStatus::from_cutoffs(security_score, 85.0, 70.0, 50.0),
        }
    }
}

impl ComponentHealth for SecurityHealth {
    fn worst_case() -> Self {
        Self {
            security_score: 0.0,
            vulnerabilities_count: 0,
            compliance_rate: 0.0,
            last_audit: None,
            status: HealthStatus::Critical,
        }
    }

    fn score(&self) -> f64 {
        self.security_score
    }

    fn status(&self) -> HealthStatus {
        self.status
    }
}

/// Aggregate process metrics attached to every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub successful_requests: u64,
    /// Share of successful requests in percent
    pub system_stability: f64,
}

impl SystemMetrics {
    pub fn new(uptime_seconds: u64, total_requests: u64, failed_requests: u64) -> Self {
        let successful_requests = total_requests.saturating_sub(failed_requests);
        let system_stability = if total_requests == 0 {
            100.0
        } else {
            successful_requests as f64 / total_requests as f64 * 100.0
        };
        Self {
            uptime_seconds,
            total_requests,
            successful_requests,
            system_stability,
        }
    }
}

/// Snapshot produced by one health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub report_id: String,
    pub timestamp: DateTime<Utc>,
    /// Weighted overall score (0-100)
    pub overall_score: u8,
    pub ai_health: AiHealth,
    pub performance_health: PerformanceHealth,
    pub security_health: SecurityHealth,
    pub recommendations: Vec<Recommendation>,
    pub system_metrics: SystemMetrics,
    /// Probes that failed or timed out and were replaced by their worst case
    #[serde(default)]
    pub degraded_probes: Vec<String>,
    pub duration_ms: u64,
}

impl HealthReport {
    pub fn new_id() -> String {
        format!("health_{}", uuid::Uuid::new_v4().simple())
    }
}
