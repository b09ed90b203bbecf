//! Bounded health report history

use chrono::{Duration, Utc};
use std::collections::VecDeque;
use titan_common::{HealthReport, HistorySummary, ScoreTrend};

/// Reports compared by the trend calculation
const TREND_WINDOW: usize = 3;

/// Score delta across the trend window that counts as movement
const TREND_BAND: i32 = 5;

/// Ten years; keeps the cutoff arithmetic in range
const MAX_RETENTION_HOURS: u64 = 24 * 365 * 10;

/// Ring buffer of reports, bounded by count and by age
pub struct ReportHistory {
    reports: VecDeque<HealthReport>,
    capacity: usize,
    max_age: Duration,
}

impl ReportHistory {
    pub fn new(capacity: usize, max_age_hours: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            reports: VecDeque::with_capacity(capacity),
            capacity,
            max_age: Duration::hours(max_age_hours.min(MAX_RETENTION_HOURS) as i64),
        }
    }

    pub fn push(&mut self, report: HealthReport) {
        if self.reports.len() == self.capacity {
            self.reports.pop_front();
        }
        self.reports.push_back(report);
        self.prune();
    }

    /// Drop reports older than the retention window
    pub fn prune(&mut self) {
        let cutoff = Utc::now() - self.max_age;
        while self
            .reports
            .front()
            .map_or(false, |r| r.timestamp < cutoff)
        {
            self.reports.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&HealthReport> {
        self.reports.back()
    }

    pub fn reports(&self) -> Vec<HealthReport> {
        self.reports.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn average_score(&self) -> Option<f64> {
        if self.reports.is_empty() {
            return None;
        }
        let sum: u32 = self.reports.iter().map(|r| r.overall_score as u32).sum();
        Some(sum as f64 / self.reports.len() as f64)
    }

    /// Compare the newest report with the oldest of the last three
    pub fn trend(&self) -> ScoreTrend {
        if self.reports.len() < 2 {
            return ScoreTrend::InsufficientData;
        }
        let window: Vec<&HealthReport> = self.reports.iter().rev().take(TREND_WINDOW).collect();
        let newest = window[0].overall_score as i32;
        let oldest = window[window.len() - 1].overall_score as i32;
        let delta = newest - oldest;

        if delta > TREND_BAND {
            ScoreTrend::Improving
        } else if delta < -TREND_BAND {
            ScoreTrend::Declining
        } else {
            ScoreTrend::Stable
        }
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            reports: self.reports.len(),
            average_score: self.average_score(),
            latest_score: self.latest().map(|r| r.overall_score),
            trend: self.trend(),
        }
    }
}
