//! Performance samples, alerts and summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub timestamp: DateTime<Utc>,
    /// Median response time in milliseconds
    pub response_time: f64,
    /// 99th percentile response time in milliseconds
    pub response_time_p99: f64,
    /// CPU usage in percent
    pub cpu_usage: f64,
    /// Memory usage in percent
    pub memory_usage: f64,
    pub memory_bytes: u64,
    /// Error rate in percent
    pub error_rate: f64,
    pub total_requests: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAlert {
    pub level: AlertLevel,
    pub metric: String,
    pub value: f64,
    pub threshold: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
}

/// Rolling averages over the most recent samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub average_response_time: f64,
    pub average_cpu_usage: f64,
    pub average_memory_usage: f64,
    pub average_error_rate: f64,
    pub total_data_points: usize,
    pub monitoring_active: bool,
}

/// Payload of `GET /performance/metrics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub current: PerformanceSample,
    pub summary: Option<PerformanceSummary>,
    pub alerts: Vec<PerformanceAlert>,
}
