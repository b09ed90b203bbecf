//! Security audit data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Points deducted from an area score per finding
    pub fn penalty(&self) -> f64 {
        match self {
            Self::Critical => 25.0,
            Self::High => 15.0,
            Self::Medium => 8.0,
            Self::Low => 3.0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityCategory {
    Authentication,
    Authorization,
    Injection,
    Xss,
    Csrf,
    Crypto,
    Config,
    InputValidation,
    Api,
    Infrastructure,
}

impl VulnerabilityCategory {
    /// Score area this category is counted against
    pub fn area(&self) -> SecurityArea {
        match self {
            Self::Authentication => SecurityArea::Authentication,
            Self::Authorization => SecurityArea::Authorization,
            Self::Crypto | Self::Config => SecurityArea::DataProtection,
            Self::Injection | Self::Xss | Self::Csrf | Self::InputValidation => {
                SecurityArea::InputValidation
            }
            Self::Api => SecurityArea::ApiSecurity,
            Self::Infrastructure => SecurityArea::Infrastructure,
        }
    }
}

/// The six areas an audit scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityArea {
    Authentication,
    Authorization,
    DataProtection,
    InputValidation,
    ApiSecurity,
    Infrastructure,
}

impl SecurityArea {
    pub const ALL: [SecurityArea; 6] = [
        SecurityArea::Authentication,
        SecurityArea::Authorization,
        SecurityArea::DataProtection,
        SecurityArea::InputValidation,
        SecurityArea::ApiSecurity,
        SecurityArea::Infrastructure,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub severity: Severity,
    pub category: VulnerabilityCategory,
    pub title: String,
    pub description: String,
    /// Affected location (component, endpoint or subsystem)
    pub location: String,
    pub impact: String,
    pub recommendation: String,
    #[serde(default)]
    pub cve_id: Option<String>,
    pub detected_at: DateTime<Utc>,
    pub resolved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStandard {
    Owasp,
    Gdpr,
    PciDss,
    Sox,
    Nist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Partial,
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub standard: ComplianceStandard,
    pub requirement: String,
    pub status: ComplianceStatus,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Compliance rate in percent. Partial checks count half, not-applicable
/// checks are excluded. An empty set counts as fully compliant.
pub fn compliance_rate(checks: &[ComplianceCheck]) -> f64 {
    let mut applicable = 0usize;
    let mut points = 0.0;
    for check in checks {
        match check.status {
            ComplianceStatus::Compliant => {
                applicable += 1;
                points += 1.0;
            }
            ComplianceStatus::Partial => {
                applicable += 1;
                points += 0.5;
            }
            ComplianceStatus::NonCompliant => applicable += 1,
            ComplianceStatus::NotApplicable => {}
        }
    }
    if applicable == 0 {
        100.0
    } else {
        points / applicable as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaScores {
    pub authentication: f64,
    pub authorization: f64,
    pub data_protection: f64,
    pub input_validation: f64,
    pub api_security: f64,
    pub infrastructure: f64,
}

impl AreaScores {
    pub fn get(&self, area: SecurityArea) -> f64 {
        match area {
            SecurityArea::Authentication => self.authentication,
            SecurityArea::Authorization => self.authorization,
            SecurityArea::DataProtection => self.data_protection,
            SecurityArea::InputValidation => self.input_validation,
            SecurityArea::ApiSecurity => self.api_security,
            SecurityArea::Infrastructure => self.infrastructure,
        }
    }

    pub fn mean(&self) -> f64 {
        SecurityArea::ALL.iter().map(|a| self.get(*a)).sum::<f64>() / SecurityArea::ALL.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScore {
    /// Rounded mean of the area scores (0-100)
    pub overall: f64,
    pub categories: AreaScores,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAudit {
    pub audit_id: String,
    pub timestamp: DateTime<Utc>,
    pub score: SecurityScore,
    pub vulnerabilities: Vec<Vulnerability>,
    pub compliance: Vec<ComplianceCheck>,
    pub recommendations: Vec<String>,
    pub duration_ms: u64,
}

impl SecurityAudit {
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.vulnerabilities
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }

    pub fn open_vulnerabilities(&self) -> usize {
        self.vulnerabilities.iter().filter(|v| !v.resolved).count()
    }

    pub fn compliance_rate(&self) -> f64 {
        compliance_rate(&self.compliance)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrendPoint {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub vulnerability_count: usize,
    pub critical_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityDashboard {
    pub last_audit: Option<DateTime<Utc>>,
    pub security_score: f64,
    pub total_vulnerabilities: usize,
    pub critical: usize,
    pub high: usize,
    pub resolved: usize,
    pub compliant_checks: usize,
    pub non_compliant_checks: usize,
    pub trends: Vec<AuditTrendPoint>,
}
