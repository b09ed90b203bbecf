//! Randomized stand-ins for real measurement
//!
//! Each sampler keeps the output shape and bounds of the real thing and draws
//! values as a fixed baseline plus bounded jitter. All of them accept a seed
//! so runs can be reproduced.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use titan_common::{Result, TitanError, Vulnerability};

use crate::ai::{ModelValidator, ValidationRun};
use crate::instrumentation::{MetricsSource, RequestTotals};
use crate::security::{AuditSection, VulnerabilityScanner, CHECKLIST};

const SIMULATED_MEMORY_TOTAL: u64 = 8 * 1024 * 1024 * 1024;

fn make_rng(seed: Option<u64>) -> Mutex<StdRng> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Mutex::new(rng)
}

/// Draw from a shared rng; a poisoned lock still yields the generator
fn draw<T>(rng: &Mutex<StdRng>, f: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut guard = rng.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
}

/// Simulated host and request metrics
pub struct SimulatedMetricsSource {
    rng: Mutex<StdRng>,
    total: AtomicU64,
    failed: AtomicU64,
}

impl SimulatedMetricsSource {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: make_rng(seed),
            total: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

impl MetricsSource for SimulatedMetricsSource {
    /// 150ms baseline, up to 100ms variance and 50ms network delay
    fn latency_p50(&self) -> Duration {
        let ms = draw(&self.rng, |r| {
            150.0 + r.gen_range(0.0..100.0) + r.gen_range(0.0..50.0)
        });
        Duration::from_millis(ms as u64)
    }

    fn latency_p99(&self) -> Duration {
        let factor = draw(&self.rng, |r| r.gen_range(1.5..2.5));
        self.latency_p50().mul_f64(factor)
    }

    /// 45-70% of a fixed 8 GiB host
    fn memory_bytes(&self) -> u64 {
        let percent = draw(&self.rng, |r| 45.0 + r.gen_range(0.0..25.0));
        (SIMULATED_MEMORY_TOTAL as f64 * percent / 100.0) as u64
    }

    fn memory_total_bytes(&self) -> u64 {
        SIMULATED_MEMORY_TOTAL
    }

    fn cpu_percent(&self) -> f64 {
        draw(&self.rng, |r| 30.0 + r.gen_range(0.0..40.0))
    }

    /// 1% baseline with a 5% chance of a spike up to +10%
    fn error_rate(&self) -> f64 {
        draw(&self.rng, |r| {
            let spike = if r.gen_bool(0.05) {
                r.gen_range(0.0..10.0)
            } else {
                0.0
            };
            1.0 + spike
        })
    }

    fn request_totals(&self) -> RequestTotals {
        let added = draw(&self.rng, |r| r.gen_range(50..150u64));
        let failed = (added as f64 * self.error_rate() / 100.0).round() as u64;
        RequestTotals {
            total: self.total.fetch_add(added, Ordering::Relaxed) + added,
            failed: self.failed.fetch_add(failed, Ordering::Relaxed) + failed,
        }
    }
}

/// Simulated model validation: accuracy 88-97%, latency 80-140ms with a 10%
/// chance of a +100ms load spike
pub struct SimulatedModelValidator {
    rng: Mutex<StdRng>,
}

impl SimulatedModelValidator {
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: make_rng(seed) }
    }
}

#[async_trait]
impl ModelValidator for SimulatedModelValidator {
    async fn validate(&self, model_id: &str) -> Result<ValidationRun> {
        if model_id.trim().is_empty() {
            return Err(TitanError::InvalidRequest("model id is empty".to_string()));
        }
        Ok(draw(&self.rng, |r| {
            let spike = if r.gen_bool(0.1) { 100.0 } else { 0.0 };
            ValidationRun {
                accuracy: 88.0 + r.gen_range(0.0..9.0),
                latency_ms: 80.0 + r.gen_range(0.0..60.0) + spike,
                memory_usage_mb: 50.0 + r.gen_range(0.0..30.0),
            }
        }))
    }
}

/// Reports each checklist item of a section with a fixed probability
pub struct ChecklistScanner {
    rng: Mutex<StdRng>,
    probability: f64,
}

impl ChecklistScanner {
    pub fn new(probability: f64, seed: Option<u64>) -> Self {
        Self {
            rng: make_rng(seed),
            probability: probability.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl VulnerabilityScanner for ChecklistScanner {
    async fn scan(&self, section: AuditSection) -> Result<Vec<Vulnerability>> {
        let found = CHECKLIST
            .iter()
            .filter(|item| item.section == section)
            .filter(|_| draw(&self.rng, |r| r.gen_bool(self.probability)))
            .map(|item| item.to_vulnerability())
            .collect();
        Ok(found)
    }
}
