//! Optimization plans and the per-step state machine
//!
//! ```text
//! pending -> in_progress -> completed
//!                        -> failed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TitanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepCategory {
    Ai,
    Performance,
    Security,
}

impl fmt::Display for StepCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ai => "ai",
            Self::Performance => "performance",
            Self::Security => "security",
        };
        f.write_str(name)
    }
}

/// One unit of remediation work tied to a single deficiency category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStep {
    pub step_id: String,
    pub category: StepCategory,
    pub title: String,
    pub description: String,
    pub automated: bool,
    /// Estimated duration in minutes
    pub estimated_duration: u32,
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub status: StepStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl OptimizationStep {
    pub fn new(
        step_id: &str,
        category: StepCategory,
        title: &str,
        description: &str,
        automated: bool,
        estimated_duration: u32,
    ) -> Self {
        Self {
            step_id: step_id.to_string(),
            category,
            title: title.to_string(),
            description: description.to_string(),
            automated,
            estimated_duration,
            dependencies: Vec::new(),
            status: StepStatus::Pending,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// pending -> in_progress
    pub fn start(&mut self) -> Result<()> {
        self.transition(StepStatus::Pending, StepStatus::InProgress)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// in_progress -> completed
    pub fn complete(&mut self) -> Result<()> {
        self.transition(StepStatus::InProgress, StepStatus::Completed)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// in_progress -> failed
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(StepStatus::InProgress, StepStatus::Failed)?;
        self.error = Some(reason.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, expected: StepStatus, next: StepStatus) -> Result<()> {
        if self.status != expected {
            return Err(TitanError::InvalidTransition {
                step: self.step_id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Score targets the plan aims for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTargets {
    pub ai_accuracy_target: f64,
    pub performance_target: f64,
    pub security_target: f64,
}

impl Default for PlanTargets {
    fn default() -> Self {
        Self {
            ai_accuracy_target: 95.0,
            performance_target: 95.0,
            security_target: 95.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationPlan {
    pub plan_id: String,
    pub created_at: DateTime<Utc>,
    /// Health report the plan was derived from
    pub source_report_id: String,
    pub target_improvements: PlanTargets,
    pub optimization_steps: Vec<OptimizationStep>,
    /// Estimated completion time in hours
    pub estimated_completion_time: f64,
    pub expected_benefits: Vec<String>,
}

impl OptimizationPlan {
    pub fn step_ids(&self) -> Vec<&str> {
        self.optimization_steps
            .iter()
            .map(|s| s.step_id.as_str())
            .collect()
    }

    pub fn count_with_status(&self, status: StepStatus) -> usize {
        self.optimization_steps
            .iter()
            .filter(|s| s.status == status)
            .count()
    }

    pub fn is_finished(&self) -> bool {
        self.optimization_steps.iter().all(|s| s.status.is_terminal())
    }
}

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_id: String,
    pub status: StepStatus,
    #[serde(default)]
    pub detail: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExecutionSummary {
    pub plan_id: String,
    pub completed: usize,
    pub failed: usize,
    pub outcomes: Vec<StepOutcome>,
    pub duration_ms: u64,
}
