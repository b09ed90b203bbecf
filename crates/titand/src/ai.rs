//! AI model optimizer
//!
//! Validation itself sits behind the `ModelValidator` trait; the optimizer
//! repeats it, keeps the best run and turns the numbers into advice.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use titan_common::{ModelValidation, Result, TitanError};
use tracing::{debug, info};

/// Strategy reported when the caller does not name one
pub const DEFAULT_STRATEGY: &str = "genetic_algorithm";

/// Raw numbers from one validation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationRun {
    /// Percent
    pub accuracy: f64,
    pub latency_ms: f64,
    pub memory_usage_mb: f64,
}

#[async_trait]
pub trait ModelValidator: Send + Sync {
    async fn validate(&self, model_id: &str) -> Result<ValidationRun>;
}

pub struct AiOptimizer {
    validator: Arc<dyn ModelValidator>,
    iterations: u32,
}

impl AiOptimizer {
    pub fn new(validator: Arc<dyn ModelValidator>, iterations: u32) -> Self {
        Self {
            validator,
            iterations: iterations.max(1),
        }
    }

    /// Validate the model repeatedly and report the most accurate run
    pub async fn optimize_model(
        &self,
        model_id: &str,
        strategy: Option<&str>,
    ) -> Result<ModelValidation> {
        let model_id = check_model_id(model_id)?;
        let strategy = strategy.unwrap_or(DEFAULT_STRATEGY);
        info!("Optimizing model {} ({}, {} iterations)", model_id, strategy, self.iterations);

        let mut best: Option<ValidationRun> = None;
        for iteration in 1..=self.iterations {
            let run = self.validator.validate(model_id).await?;
            debug!(
                "Iteration {}: accuracy {:.1}%, latency {:.0}ms",
                iteration, run.accuracy, run.latency_ms
            );
            if best.map_or(true, |b| run.accuracy > b.accuracy) {
                best = Some(run);
            }
        }

        let best = best.ok_or_else(|| TitanError::Probe {
            probe: "ai".to_string(),
            reason: "no validation runs".to_string(),
        })?;
        let result = build_validation(model_id, strategy, self.iterations, best);
        info!(
            "Model {} optimized: {:.1}% accuracy, {:.0}ms latency",
            model_id, result.accuracy, result.latency_ms
        );
        Ok(result)
    }

    /// Single validation pass without tuning
    pub async fn validate_model(&self, model_id: &str) -> Result<ModelValidation> {
        let model_id = check_model_id(model_id)?;
        let run = self.validator.validate(model_id).await?;
        Ok(build_validation(model_id, "validation", 1, run))
    }
}

fn check_model_id(model_id: &str) -> Result<&str> {
    let model_id = model_id.trim();
    if model_id.is_empty() {
        return Err(TitanError::InvalidRequest("model_id must not be empty".to_string()));
    }
    Ok(model_id)
}

fn build_validation(
    model_id: &str,
    strategy: &str,
    iterations: u32,
    run: ValidationRun,
) -> ModelValidation {
    let mut errors = Vec::new();
    if !run.accuracy.is_finite() || !run.latency_ms.is_finite() {
        errors.push("validation produced non-finite values".to_string());
    }

    ModelValidation {
        model_id: model_id.to_string(),
        strategy: strategy.to_string(),
        is_valid: errors.is_empty()
            && run.accuracy > 70.0
            && run.latency_ms < 1000.0
            && run.memory_usage_mb < 100.0,
        accuracy: run.accuracy,
        latency_ms: run.latency_ms,
        memory_usage_mb: run.memory_usage_mb,
        iterations,
        errors,
        recommendations: recommendations(&run),
        timestamp: Utc::now(),
    }
}

fn recommendations(run: &ValidationRun) -> Vec<String> {
    let mut out = Vec::new();
    if run.accuracy < 85.0 {
        out.push("Accuracy below target, consider more training data".to_string());
    }
    if run.latency_ms > 200.0 {
        out.push("High inference latency, consider model quantization or caching".to_string());
    }
    if run.memory_usage_mb > 80.0 {
        out.push("High memory usage, consider model pruning".to_string());
    }
    if out.is_empty() {
        out.push("Model is production-ready".to_string());
    }
    out
}
