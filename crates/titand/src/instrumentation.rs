//! Metric sources feeding the performance probe and monitor
//!
//! `SystemMetricsSource` reads memory/CPU from sysinfo and request latency from
//! the `RequestTracker` filled by the HTTP middleware. Tests and demo setups
//! can swap in `sampler::SimulatedMetricsSource` or their own fakes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::System;

/// Number of recent requests kept for percentile calculations
pub const LATENCY_WINDOW: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestTotals {
    pub total: u64,
    pub failed: u64,
}

/// Capability the health probes measure against
pub trait MetricsSource: Send + Sync {
    fn latency_p50(&self) -> Duration;
    fn latency_p99(&self) -> Duration;
    fn memory_bytes(&self) -> u64;
    fn memory_total_bytes(&self) -> u64;
    /// Global CPU usage in percent
    fn cpu_percent(&self) -> f64;
    /// Failed request share in percent
    fn error_rate(&self) -> f64;
    fn request_totals(&self) -> RequestTotals;

    fn memory_percent(&self) -> f64 {
        let total = self.memory_total_bytes();
        if total == 0 {
            0.0
        } else {
            self.memory_bytes() as f64 / total as f64 * 100.0
        }
    }
}

/// Bounded window of request latencies plus lifetime counters
pub struct RequestTracker {
    window: Mutex<VecDeque<(Duration, bool)>>,
    capacity: usize,
    total: AtomicU64,
    failed: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::with_capacity(LATENCY_WINDOW)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            total: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    pub fn record(&self, latency: Duration, success: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }

        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back((latency, success));
    }

    /// Nearest-rank percentile over the window; zero when empty
    pub fn percentile(&self, p: f64) -> Duration {
        let window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if window.is_empty() {
            return Duration::ZERO;
        }
        let mut latencies: Vec<Duration> = window.iter().map(|(d, _)| *d).collect();
        latencies.sort_unstable();

        let rank = (p.clamp(0.0, 1.0) * latencies.len() as f64).ceil() as usize;
        latencies[rank.saturating_sub(1).min(latencies.len() - 1)]
    }

    /// Failed share of the window in percent
    pub fn window_error_rate(&self) -> f64 {
        let window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        if window.is_empty() {
            return 0.0;
        }
        let failed = window.iter().filter(|(_, ok)| !ok).count();
        failed as f64 / window.len() as f64 * 100.0
    }

    pub fn totals(&self) -> RequestTotals {
        RequestTotals {
            total: self.total.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Real instrumentation: sysinfo for host resources, tracker for latency
pub struct SystemMetricsSource {
    system: Mutex<System>,
    tracker: Arc<RequestTracker>,
}

impl SystemMetricsSource {
    pub fn new(tracker: Arc<RequestTracker>) -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu();
        Self {
            system: Mutex::new(system),
            tracker,
        }
    }
}

impl MetricsSource for SystemMetricsSource {
    fn latency_p50(&self) -> Duration {
        self.tracker.percentile(0.50)
    }

    fn latency_p99(&self) -> Duration {
        self.tracker.percentile(0.99)
    }

    fn memory_bytes(&self) -> u64 {
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_memory();
        system.used_memory()
    }

    fn memory_total_bytes(&self) -> u64 {
        let system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.total_memory()
    }

    fn cpu_percent(&self) -> f64 {
        let mut system = self.system.lock().unwrap_or_else(|e| e.into_inner());
        system.refresh_cpu();
        system.global_cpu_info().cpu_usage() as f64
    }

    fn error_rate(&self) -> f64 {
        self.tracker.window_error_rate()
    }

    fn request_totals(&self) -> RequestTotals {
        self.tracker.totals()
    }
}
