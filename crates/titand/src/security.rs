//! Security auditor
//!
//! Runs the enabled audit sections through a `VulnerabilityScanner`, records
//! the fixed compliance checks and scores six areas:
//! - 95 for an area without findings
//! - otherwise 100 minus 25/15/8/3 per critical/high/medium/low finding, floored at 0
//!
//! The overall score is the rounded mean of the six areas.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use titan_common::{
    AreaScores, AuditTrendPoint, ComplianceCheck, ComplianceStandard, ComplianceStatus,
    EventKind, Result, SecurityArea, SecurityAudit, SecurityDashboard, SecurityScore, Severity,
    TitanError, Vulnerability, VulnerabilityCategory,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::events::EventBus;

/// Audits kept for trend reporting
pub const AUDIT_HISTORY_CAPACITY: usize = 50;

/// Trend points shown on the dashboard
const DASHBOARD_TREND_POINTS: usize = 5;

/// Groups of checklist items that can be enabled in config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSection {
    Authentication,
    Authorization,
    DataProtection,
    InputValidation,
    ApiSecurity,
    Infrastructure,
    Cryptography,
}

impl AuditSection {
    pub const ALL: [AuditSection; 7] = [
        AuditSection::Authentication,
        AuditSection::Authorization,
        AuditSection::DataProtection,
        AuditSection::InputValidation,
        AuditSection::ApiSecurity,
        AuditSection::Infrastructure,
        AuditSection::Cryptography,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::DataProtection => "data_protection",
            Self::InputValidation => "input_validation",
            Self::ApiSecurity => "api_security",
            Self::Infrastructure => "infrastructure",
            Self::Cryptography => "cryptography",
        }
    }
}

/// One known weakness the scanner looks for
#[derive(Debug, Clone, Copy)]
pub struct ChecklistItem {
    pub id: &'static str,
    pub section: AuditSection,
    pub severity: Severity,
    pub category: VulnerabilityCategory,
    pub title: &'static str,
    pub description: &'static str,
    pub location: &'static str,
    pub impact: &'static str,
    pub recommendation: &'static str,
}

impl ChecklistItem {
    pub fn to_vulnerability(&self) -> Vulnerability {
        Vulnerability {
            id: self.id.to_string(),
            severity: self.severity,
            category: self.category,
            title: self.title.to_string(),
            description: self.description.to_string(),
            location: self.location.to_string(),
            impact: self.impact.to_string(),
            recommendation: self.recommendation.to_string(),
            cve_id: None,
            detected_at: Utc::now(),
            resolved: false,
        }
    }
}

macro_rules! item {
    ($id:expr, $section:ident, $severity:ident, $category:ident,
     $title:expr, $description:expr, $location:expr, $impact:expr, $recommendation:expr) => {
        ChecklistItem {
            id: $id,
            section: AuditSection::$section,
            severity: Severity::$severity,
            category: VulnerabilityCategory::$category,
            title: $title,
            description: $description,
            location: $location,
            impact: $impact,
            recommendation: $recommendation,
        }
    };
}

/// Every check the auditor knows about
pub const CHECKLIST: &[ChecklistItem] = &[
    // Authentication
    item!("auth_jwt_secret", Authentication, Medium, Authentication,
        "JWT Secret Key Security",
        "JWT secret key should be randomly generated and securely stored",
        "JWT configuration",
        "Weak JWT secrets can lead to token forgery",
        "Use cryptographically strong random secrets and rotate regularly"),
    item!("auth_session_fixation", Authentication, High, Authentication,
        "Session Fixation Prevention",
        "Sessions should be regenerated after login",
        "Authentication service",
        "Session fixation can lead to account takeover",
        "Regenerate session IDs after successful authentication"),
    item!("auth_mfa_missing", Authentication, High, Authentication,
        "Multi-Factor Authentication Not Implemented",
        "MFA should be available for all accounts",
        "User authentication",
        "Single factor authentication is vulnerable to credential theft",
        "Implement TOTP based MFA for user accounts"),
    item!("auth_weak_password_policy", Authentication, Medium, Authentication,
        "Weak Password Policy",
        "Password policy should enforce strong passwords",
        "User registration and password reset",
        "Weak passwords increase brute force attack risk",
        "Enforce minimum length, complexity and history requirements"),
    // Authorization
    item!("authz_rbac_incomplete", Authorization, High, Authorization,
        "Incomplete Role-Based Access Control",
        "All API endpoints should have role-based access controls",
        "API endpoints",
        "Unauthorized access to sensitive functions",
        "Apply RBAC to every endpoint"),
    item!("authz_privilege_escalation", Authorization, Critical, Authorization,
        "Potential Privilege Escalation",
        "User permissions should be validated before execution",
        "User management APIs",
        "Users could gain administrative access",
        "Validate user permissions at multiple levels"),
    item!("authz_api_key_exposure", Authorization, High, Authorization,
        "API Key Exposure Risk",
        "API keys should not appear in client-side code or logs",
        "Frontend and logging systems",
        "API key compromise could lead to unauthorized access",
        "Keep API keys on the server side only"),
    // Data protection
    item!("data_encryption_at_rest", DataProtection, High, Crypto,
        "Data Encryption at Rest",
        "Sensitive data should be encrypted when stored",
        "Database and file storage",
        "A data breach could expose sensitive information",
        "Encrypt sensitive data at rest with AES-256"),
    item!("data_encryption_in_transit", DataProtection, Critical, Crypto,
        "Data Encryption in Transit",
        "All traffic should use TLS 1.2 or newer",
        "Network communications",
        "Man-in-the-middle attacks could intercept sensitive data",
        "Enforce HTTPS with TLS 1.2+ for all communications"),
    item!("data_pii_handling", DataProtection, High, Config,
        "PII Data Handling",
        "Personally identifiable information should follow privacy regulations",
        "User data processing",
        "Privacy regulation violations",
        "Anonymize PII and apply data retention policies"),
    item!("data_backup_security", DataProtection, Medium, Infrastructure,
        "Backup Data Security",
        "Backups should be encrypted and access-controlled",
        "Backup systems",
        "Backup compromise could expose historical data",
        "Encrypt backups and restrict access to them"),
    // Input validation
    item!("input_sql_injection", InputValidation, Critical, Injection,
        "SQL Injection Prevention",
        "All database queries should be parameterized",
        "Database query functions",
        "SQL injection could compromise the whole database",
        "Use parameterized queries exclusively"),
    item!("input_xss_prevention", InputValidation, High, Xss,
        "Cross-Site Scripting Prevention",
        "User input should be sanitized before display",
        "Frontend data display",
        "XSS could steal sessions or inject code",
        "Sanitize input and set a Content Security Policy"),
    item!("input_command_injection", InputValidation, Critical, Injection,
        "Command Injection Prevention",
        "System commands should never receive unsanitized input",
        "System integration points",
        "Command injection could compromise the server",
        "Avoid shelling out or validate input strictly"),
    item!("input_file_upload", InputValidation, High, InputValidation,
        "File Upload Security",
        "Uploads should be validated for type, size and content",
        "File upload endpoints",
        "Malicious uploads could compromise the server",
        "Validate and sandbox uploaded files"),
    // API security
    item!("api_rate_limiting", ApiSecurity, Medium, Api,
        "API Rate Limiting",
        "APIs should be rate limited",
        "All API endpoints",
        "Abuse could exhaust resources",
        "Rate limit per client and endpoint"),
    item!("api_cors_config", ApiSecurity, Medium, Api,
        "CORS Configuration",
        "CORS should only allow known origins",
        "API CORS headers",
        "Permissive CORS enables cross-site requests",
        "List allowed origins explicitly instead of wildcards"),
    item!("api_versioning", ApiSecurity, Low, Api,
        "API Versioning Strategy",
        "APIs should be versioned so fixes can ship safely",
        "API endpoints",
        "Security fixes may break clients",
        "Adopt semantic versioning and a deprecation policy"),
    item!("api_error_disclosure", ApiSecurity, Medium, Api,
        "Information Disclosure in Error Messages",
        "Errors should not reveal internal details",
        "API error responses",
        "Internal details help attackers",
        "Return generic error messages in production"),
    // Infrastructure
    item!("infra_dependency_vulnerabilities", Infrastructure, High, Infrastructure,
        "Dependency Vulnerabilities",
        "Dependencies should be updated and scanned regularly",
        "Dependency manifests",
        "Known dependency vulnerabilities could be exploited",
        "Automate dependency scanning and updates"),
    item!("infra_env_config", Infrastructure, Medium, Config,
        "Environment Configuration Security",
        "Environment variables should not hold plain-text secrets",
        "Environment configuration",
        "Secrets could leak through configuration",
        "Use a secret manager"),
    item!("infra_logging_security", Infrastructure, Medium, Infrastructure,
        "Secure Logging Practices",
        "Logs should not contain sensitive data",
        "Logging system",
        "Logs could expose data or be tampered with",
        "Sanitize log output and protect log storage"),
    item!("infra_container_security", Infrastructure, High, Infrastructure,
        "Container Security",
        "Images should be minimal and scanned",
        "Container configuration",
        "Vulnerable images could be exploited",
        "Use minimal base images and scan them"),
    // Cryptography
    item!("crypto_random_generation", Cryptography, High, Crypto,
        "Cryptographically Secure Random Number Generation",
        "Random values should come from a CSPRNG",
        "Token and salt generation",
        "Predictable values could be exploited",
        "Use the operating system CSPRNG"),
    item!("crypto_key_management", Cryptography, Critical, Crypto,
        "Cryptographic Key Management",
        "Keys should be generated, stored and rotated properly",
        "Key storage and rotation",
        "Compromised keys decrypt all protected data",
        "Rotate keys regularly and store them in a KMS"),
    item!("crypto_hash_functions", Cryptography, Medium, Crypto,
        "Secure Hash Function Usage",
        "Passwords should use slow hash functions",
        "Password hashing",
        "Weak hashing enables password cracking",
        "Hash passwords with Argon2, scrypt or bcrypt"),
];

/// Fixed compliance posture recorded on every audit
fn compliance_checks() -> Vec<ComplianceCheck> {
    use ComplianceStandard::*;
    use ComplianceStatus::*;

    let now = Utc::now();
    [
        (Owasp, "A01: Broken Access Control", Partial, "Access control gaps on AI endpoints"),
        (Owasp, "A02: Cryptographic Failures", Partial, "Key management needs improvement"),
        (Owasp, "A03: Injection", Compliant, "Parameterized queries throughout"),
        (Owasp, "A04: Insecure Design", Compliant, "Security considered in design phase"),
        (Owasp, "A05: Security Misconfiguration", Partial, "Some configurations need review"),
        (Gdpr, "Data Protection by Design", Partial, "Privacy handled but documentation missing"),
        (Gdpr, "Right to be Forgotten", NonCompliant, "User data deletion not implemented"),
        (Nist, "Identify: Asset Management", Compliant, "Assets and data flows documented"),
        (Nist, "Protect: Access Control", Partial, "Access controls need enhancement"),
        (Nist, "Detect: Anomalies and Events", Partial, "Monitoring needs enhancement"),
    ]
    .into_iter()
    .map(|(standard, requirement, status, description)| ComplianceCheck {
        standard,
        requirement: requirement.to_string(),
        status,
        description: description.to_string(),
        timestamp: now,
    })
    .collect()
}

/// Source of findings for one audit section
#[async_trait]
pub trait VulnerabilityScanner: Send + Sync {
    async fn scan(&self, section: AuditSection) -> Result<Vec<Vulnerability>>;
}

/// Score the six areas from a set of findings
pub fn score_vulnerabilities(vulnerabilities: &[Vulnerability]) -> SecurityScore {
    let area_score = |area: SecurityArea| {
        let mut findings = vulnerabilities
            .iter()
            .filter(|v| v.category.area() == area)
            .peekable();
        if findings.peek().is_none() {
            return 95.0;
        }
        let penalty: f64 = findings.map(|v| v.severity.penalty()).sum();
        (100.0 - penalty).max(0.0)
    };

    let categories = AreaScores {
        authentication: area_score(SecurityArea::Authentication),
        authorization: area_score(SecurityArea::Authorization),
        data_protection: area_score(SecurityArea::DataProtection),
        input_validation: area_score(SecurityArea::InputValidation),
        api_security: area_score(SecurityArea::ApiSecurity),
        infrastructure: area_score(SecurityArea::Infrastructure),
    };

    SecurityScore {
        overall: categories.mean().round(),
        categories,
    }
}

fn audit_recommendations(
    vulnerabilities: &[Vulnerability],
    compliance: &[ComplianceCheck],
) -> Vec<String> {
    let count = |severity: Severity| {
        vulnerabilities
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    };
    let has_category =
        |category: VulnerabilityCategory| vulnerabilities.iter().any(|v| v.category == category);

    let mut recommendations = Vec::new();

    let critical = count(Severity::Critical);
    if critical > 0 {
        recommendations.push(format!("Address {} critical vulnerabilities immediately", critical));
    }
    let high = count(Severity::High);
    if high > 0 {
        recommendations.push(format!(
            "Resolve {} high-severity vulnerabilities within 48 hours",
            high
        ));
    }
    if has_category(VulnerabilityCategory::Authentication) {
        recommendations.push("Strengthen authentication mechanisms".to_string());
    }
    if has_category(VulnerabilityCategory::Crypto) {
        recommendations.push("Review and improve cryptographic implementations".to_string());
    }

    let non_compliant = compliance
        .iter()
        .filter(|c| c.status == ComplianceStatus::NonCompliant)
        .count();
    if non_compliant > 0 {
        recommendations.push(format!("Address {} compliance violations", non_compliant));
    }

    if recommendations.is_empty() {
        recommendations.push("Security posture is good, continue regular audits".to_string());
    }
    recommendations
}

fn audit_failure(reason: String) -> TitanError {
    TitanError::Probe {
        probe: "security".to_string(),
        reason,
    }
}

#[derive(Default)]
struct AuditorState {
    latest: Option<SecurityAudit>,
    trends: VecDeque<AuditTrendPoint>,
}

pub struct SecurityAuditor {
    scanner: Arc<dyn VulnerabilityScanner>,
    sections: Vec<AuditSection>,
    events: EventBus,
    state: RwLock<AuditorState>,
}

impl SecurityAuditor {
    pub fn new(
        scanner: Arc<dyn VulnerabilityScanner>,
        sections: Vec<AuditSection>,
        events: EventBus,
    ) -> Self {
        Self {
            scanner,
            sections,
            events,
            state: RwLock::new(AuditorState::default()),
        }
    }

    /// Run every enabled section, score the findings and store the audit.
    ///
    /// Fails when no section is enabled or any section cannot be scanned;
    /// a partial scan would score the missing areas as clean.
    pub async fn run_audit(&self) -> Result<SecurityAudit> {
        let start = Instant::now();
        if self.sections.is_empty() {
            return Err(audit_failure("no audit sections enabled".to_string()));
        }
        info!("Starting security audit ({} sections)", self.sections.len());

        let mut vulnerabilities = Vec::new();
        for section in &self.sections {
            match self.scanner.scan(*section).await {
                Ok(found) => vulnerabilities.extend(found),
                Err(e) => {
                    warn!("Audit section {} failed: {}", section.as_str(), e);
                    let reason = format!("section {} failed: {}", section.as_str(), e);
                    return Err(audit_failure(reason));
                }
            }
        }

        let compliance = compliance_checks();
        let score = score_vulnerabilities(&vulnerabilities);
        let recommendations = audit_recommendations(&vulnerabilities, &compliance);

        let audit = SecurityAudit {
            audit_id: format!("audit_{}", uuid::Uuid::new_v4().simple()),
            timestamp: Utc::now(),
            score,
            vulnerabilities,
            compliance,
            recommendations,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let critical = audit.count_severity(Severity::Critical);
        {
            let mut state = self.state.write().await;
            if state.trends.len() == AUDIT_HISTORY_CAPACITY {
                state.trends.pop_front();
            }
            state.trends.push_back(AuditTrendPoint {
                timestamp: audit.timestamp,
                score: audit.score.overall,
                vulnerability_count: audit.vulnerabilities.len(),
                critical_count: critical,
            });
            state.latest = Some(audit.clone());
        }

        info!(
            "Security audit {} complete: score {}/100, {} vulnerabilities",
            audit.audit_id,
            audit.score.overall,
            audit.vulnerabilities.len()
        );

        self.events.publish(EventKind::AuditCompleted {
            audit_id: audit.audit_id.clone(),
            score: audit.score.overall,
            vulnerabilities: audit.vulnerabilities.len(),
        });
        if critical > 0 {
            warn!("Security audit {} found {} critical vulnerabilities", audit.audit_id, critical);
            self.events.publish(EventKind::CriticalVulnerability {
                audit_id: audit.audit_id.clone(),
                critical_count: critical,
            });
        }

        Ok(audit)
    }

    pub async fn latest_audit(&self) -> Option<SecurityAudit> {
        self.state.read().await.latest.clone()
    }

    /// Mark a finding of the latest audit as resolved; false when unknown
    pub async fn resolve_vulnerability(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        let found = state
            .latest
            .as_mut()
            .and_then(|audit| audit.vulnerabilities.iter_mut().find(|v| v.id == id));
        match found {
            Some(vulnerability) => {
                vulnerability.resolved = true;
                info!("Vulnerability {} marked resolved", id);
                true
            }
            None => false,
        }
    }

    pub async fn dashboard(&self) -> SecurityDashboard {
        let state = self.state.read().await;
        let trends: Vec<AuditTrendPoint> = state
            .trends
            .iter()
            .rev()
            .take(DASHBOARD_TREND_POINTS)
            .rev()
            .cloned()
            .collect();

        match &state.latest {
            Some(audit) => SecurityDashboard {
                last_audit: Some(audit.timestamp),
                security_score: audit.score.overall,
                total_vulnerabilities: audit.vulnerabilities.len(),
                critical: audit.count_severity(Severity::Critical),
                high: audit.count_severity(Severity::High),
                resolved: audit.vulnerabilities.iter().filter(|v| v.resolved).count(),
                compliant_checks: audit
                    .compliance
                    .iter()
                    .filter(|c| c.status == ComplianceStatus::Compliant)
                    .count(),
                non_compliant_checks: audit
                    .compliance
                    .iter()
                    .filter(|c| c.status == ComplianceStatus::NonCompliant)
                    .count(),
                trends,
            },
            None => SecurityDashboard {
                last_audit: None,
                security_score: 0.0,
                total_vulnerabilities: 0,
                critical: 0,
                high: 0,
                resolved: 0,
                compliant_checks: 0,
                non_compliant_checks: 0,
                trends,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports every checklist item of the listed sections
    struct FixedScanner(Vec<AuditSection>);

    #[async_trait]
    impl VulnerabilityScanner for FixedScanner {
        async fn scan(&self, section: AuditSection) -> Result<Vec<Vulnerability>> {
            if !self.0.contains(&section) {
                return Ok(Vec::new());
            }
            Ok(CHECKLIST
                .iter()
                .filter(|i| i.section == section)
                .map(|i| i.to_vulnerability())
                .collect())
        }
    }

    struct BrokenScanner;

    #[async_trait]
    impl VulnerabilityScanner for BrokenScanner {
        async fn scan(&self, section: AuditSection) -> Result<Vec<Vulnerability>> {
            Err(TitanError::Probe {
                probe: section.as_str().to_string(),
                reason: "scanner offline".to_string(),
            })
        }
    }

    fn auditor(scanner: impl VulnerabilityScanner + 'static) -> SecurityAuditor {
        SecurityAuditor::new(Arc::new(scanner), AuditSection::ALL.to_vec(), EventBus::new())
    }

    #[test]
    fn test_checklist_has_26_unique_items() {
        assert_eq!(CHECKLIST.len(), 26);
        let mut ids: Vec<&str> = CHECKLIST.iter().map(|i| i.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 26);
        for section in AuditSection::ALL {
            assert!(CHECKLIST.iter().any(|i| i.section == section));
        }
    }

    #[test]
    fn test_clean_scan_scores_95() {
        let score = score_vulnerabilities(&[]);
        assert_eq!(score.overall, 95.0);
        assert_eq!(score.categories.api_security, 95.0);
    }

    #[test]
    fn test_area_penalties() {
        // auth section: medium + high + high + medium = 8 + 15 + 15 + 8
        let found: Vec<Vulnerability> = CHECKLIST
            .iter()
            .filter(|i| i.section == AuditSection::Authentication)
            .map(|i| i.to_vulnerability())
            .collect();
        let score = score_vulnerabilities(&found);
        assert_eq!(score.categories.authentication, 54.0);
        assert_eq!(score.categories.authorization, 95.0);
        // (54 + 95 * 5) / 6 = 88.17
        assert_eq!(score.overall, 88.0);
    }

    #[test]
    fn test_area_score_floors_at_zero() {
        let crypto: Vec<Vulnerability> = CHECKLIST
            .iter()
            .filter(|i| i.category.area() == SecurityArea::DataProtection)
            .map(|i| i.to_vulnerability())
            .collect();
        let score = score_vulnerabilities(&crypto);
        assert_eq!(score.categories.data_protection, 0.0);
    }

    #[tokio::test]
    async fn test_audit_records_compliance_and_events() {
        let auditor = auditor(FixedScanner(vec![AuditSection::Authorization]));
        let mut rx = auditor.events.subscribe();

        let audit = auditor.run_audit().await.unwrap();
        assert_eq!(audit.vulnerabilities.len(), 3);
        assert_eq!(audit.compliance.len(), 10);
        assert_eq!(audit.count_severity(Severity::Critical), 1);
        assert!(audit.recommendations[0].contains("1 critical"));

        assert_eq!(rx.recv().await.unwrap().kind.name(), "audit_completed");
        assert_eq!(rx.recv().await.unwrap().kind.name(), "critical_vulnerability");
    }

    #[tokio::test]
    async fn test_failed_section_fails_the_audit() {
        let auditor = auditor(BrokenScanner);
        let err = auditor.run_audit().await.unwrap_err();
        assert!(matches!(err, TitanError::Probe { ref probe, .. } if probe == "security"));
        assert!(auditor.latest_audit().await.is_none());
        assert!(auditor.dashboard().await.trends.is_empty());
    }

    #[tokio::test]
    async fn test_no_sections_fails_the_audit() {
        let scanner = Arc::new(FixedScanner(Vec::new()));
        let auditor = SecurityAuditor::new(scanner, Vec::new(), EventBus::new());
        assert!(auditor.run_audit().await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_and_dashboard() {
        let auditor = auditor(FixedScanner(vec![AuditSection::Cryptography]));
        assert!(auditor.dashboard().await.last_audit.is_none());

        auditor.run_audit().await.unwrap();
        assert!(auditor.resolve_vulnerability("crypto_key_management").await);
        assert!(!auditor.resolve_vulnerability("does_not_exist").await);

        let dashboard = auditor.dashboard().await;
        assert_eq!(dashboard.total_vulnerabilities, 3);
        assert_eq!(dashboard.critical, 1);
        assert_eq!(dashboard.resolved, 1);
        assert_eq!(dashboard.compliant_checks, 3);
        assert_eq!(dashboard.non_compliant_checks, 1);
        assert_eq!(dashboard.trends.len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_trends_keep_last_five() {
        let auditor = auditor(FixedScanner(Vec::new()));
        for _ in 0..7 {
            auditor.run_audit().await.unwrap();
        }
        assert_eq!(auditor.dashboard().await.trends.len(), 5);
    }
}
