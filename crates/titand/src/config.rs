//! Configuration management for titand.
//!
//! Loads settings from `$TITAN_CONFIG`, then /etc/titan/config.toml, or uses defaults.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::security::AuditSection;

/// Config file path
pub const CONFIG_PATH: &str = "/etc/titan/config.toml";

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "TITAN_CONFIG";

/// Alerting thresholds checked by the monitoring loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthThresholds {
    #[serde(default = "default_ai_minimum_accuracy")]
    pub ai_minimum_accuracy: f64,

    /// Milliseconds
    #[serde(default = "default_performance_max_response_time")]
    pub performance_max_response_time: f64,

    #[serde(default = "default_security_minimum_score")]
    pub security_minimum_score: f64,
}

fn default_ai_minimum_accuracy() -> f64 {
    85.0
}

fn default_performance_max_response_time() -> f64 {
    2000.0
}

fn default_security_minimum_score() -> f64 {
    80.0
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            ai_minimum_accuracy: default_ai_minimum_accuracy(),
            performance_max_response_time: default_performance_max_response_time(),
            security_minimum_score: default_security_minimum_score(),
        }
    }
}

/// Security auditor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Audit sections that run on each audit
    #[serde(default = "default_sections")]
    pub sections: Vec<AuditSection>,

    /// Chance of each checklist item being reported by the simulated scanner
    #[serde(default = "default_vulnerability_probability")]
    pub vulnerability_probability: f64,

    /// Audits older than this are re-run by the security probe
    #[serde(default = "default_audit_max_age")]
    pub audit_max_age_secs: u64,
}

fn default_sections() -> Vec<AuditSection> {
    AuditSection::ALL.to_vec()
}

fn default_vulnerability_probability() -> f64 {
    0.3
}

fn default_audit_max_age() -> u64 {
    3600
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            sections: default_sections(),
            vulnerability_probability: default_vulnerability_probability(),
            audit_max_age_secs: default_audit_max_age(),
        }
    }
}

/// Where performance metrics come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSourceKind {
    /// sysinfo plus the request tracker
    System,
    /// Randomized baseline + jitter
    Simulated,
}

/// Daemon process settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_metrics_source")]
    pub metrics_source: MetricsSourceKind,

    /// Fixed seed for the samplers (reproducible runs)
    #[serde(default)]
    pub sampler_seed: Option<u64>,

    /// Start the monitoring loop at boot
    #[serde(default = "default_start_monitoring")]
    pub start_monitoring: bool,
}

fn default_bind_address() -> String {
    "127.0.0.1:7870".to_string()
}

fn default_metrics_source() -> MetricsSourceKind {
    MetricsSourceKind::System
}

fn default_start_monitoring() -> bool {
    true
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            metrics_source: default_metrics_source(),
            sampler_seed: None,
            start_monitoring: default_start_monitoring(),
        }
    }
}

/// AI optimizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Model validated by the AI health probe
    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default = "default_optimization_iterations")]
    pub optimization_iterations: u32,
}

fn default_model_id() -> String {
    "titan_ensemble".to_string()
}

fn default_optimization_iterations() -> u32 {
    5
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            optimization_iterations: default_optimization_iterations(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Health check interval of the monitoring loop in milliseconds
    #[serde(default = "default_monitoring_interval")]
    pub monitoring_interval: u64,

    /// Create and execute a plan when the overall score drops below 80
    #[serde(default)]
    pub auto_optimization: bool,

    #[serde(default)]
    pub health_thresholds: HealthThresholds,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_step_timeout")]
    pub step_timeout_ms: u64,

    /// Simulated processing time appended to every step
    #[serde(default = "default_step_delay")]
    pub step_delay_ms: u64,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default = "default_history_max_age")]
    pub history_max_age_hours: u64,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub titand: DaemonConfig,

    #[serde(default)]
    pub ai: AiConfig,
}

fn default_monitoring_interval() -> u64 {
    300_000 // 5 minutes
}

fn default_probe_timeout() -> u64 {
    5_000
}

fn default_step_timeout() -> u64 {
    120_000
}

fn default_step_delay() -> u64 {
    1_000
}

fn default_history_capacity() -> usize {
    100
}

fn default_history_max_age() -> u64 {
    24
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitoring_interval: default_monitoring_interval(),
            auto_optimization: false,
            health_thresholds: HealthThresholds::default(),
            probe_timeout_ms: default_probe_timeout(),
            step_timeout_ms: default_step_timeout(),
            step_delay_ms: default_step_delay(),
            history_capacity: default_history_capacity(),
            history_max_age_hours: default_history_max_age(),
            security: SecurityConfig::default(),
            titand: DaemonConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    /// Load config from `$TITAN_CONFIG` or the default path, falling back to defaults
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());
        Self::load_from_path(&path).unwrap_or_else(|e| {
            warn!("Config not loaded from {}, using defaults: {}", path, e);
            Config::default()
        })
    }

    /// Load and validate config from a specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.monitoring_interval == 0 {
            bail!("monitoring_interval must be greater than zero");
        }
        if self.probe_timeout_ms == 0 {
            bail!("probe_timeout_ms must be greater than zero");
        }
        if self.history_capacity == 0 {
            bail!("history_capacity must be greater than zero");
        }
        if self.security.sections.is_empty() {
            bail!("security.sections must enable at least one audit section");
        }
        if !(0.0..=1.0).contains(&self.security.vulnerability_probability) {
            bail!(
                "security.vulnerability_probability must be within [0, 1], got {}",
                self.security.vulnerability_probability
            );
        }
        Ok(())
    }

    pub fn monitoring_interval(&self) -> Duration {
        Duration::from_millis(self.monitoring_interval)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}
