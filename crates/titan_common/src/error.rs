//! Error types for TITAN.

use thiserror::Error;

use crate::plan::StepStatus;

#[derive(Error, Debug)]
pub enum TitanError {
    #[error("No optimization plan available")]
    NoPlan,

    #[error("Optimization plan {0} is already executing")]
    PlanInProgress(String),

    #[error("No health data available. Run a health check first.")]
    NoHealthData,

    #[error("Invalid step transition for {step}: {from} -> {to}")]
    InvalidTransition {
        step: String,
        from: StepStatus,
        to: StepStatus,
    },

    #[error("Probe {probe} failed: {reason}")]
    Probe { probe: String, reason: String },

    #[error("Probe {probe} timed out after {timeout_ms}ms")]
    ProbeTimeout { probe: String, timeout_ms: u64 },

    #[error("Optimization step {step} failed: {reason}")]
    Step { step: String, reason: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TitanError {
    /// Stable machine-readable code used in API error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            TitanError::NoPlan => "NO_PLAN",
            TitanError::PlanInProgress(_) => "PLAN_IN_PROGRESS",
            TitanError::NoHealthData => "NO_HEALTH_DATA",
            TitanError::InvalidTransition { .. } => "INVALID_TRANSITION",
            TitanError::Probe { .. } => "PROBE_FAILED",
            TitanError::ProbeTimeout { .. } => "PROBE_TIMEOUT",
            TitanError::Step { .. } => "STEP_FAILED",
            TitanError::InvalidRequest(_) => "INVALID_REQUEST",
            TitanError::Config(_) => "CONFIG_ERROR",
            TitanError::Metrics(_) => "METRICS_ERROR",
            TitanError::Io(_) => "IO_ERROR",
            TitanError::Json(_) => "JSON_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, TitanError>;
