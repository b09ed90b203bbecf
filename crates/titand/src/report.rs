//! Markdown optimization report

use std::fmt::Write;
use titan_common::{HealthReport, HistorySummary};

fn upper(s: impl ToString) -> String {
    s.to_string().to_uppercase()
}

/// Render the latest report together with the history trend
pub fn render(report: &HealthReport, history: &HistorySummary) -> String {
    let ai = &report.ai_health;
    let perf = &report.performance_health;
    let sec = &report.security_health;
    let sys = &report.system_metrics;

    let mut out = String::new();

    // writing to a String cannot fail
    let _ = writeln!(out, "# TITAN System Optimization Report\n");
    let _ = writeln!(out, "## Executive Summary");
    let _ = writeln!(out, "- **Report ID**: {}", report.report_id);
    let _ = writeln!(out, "- **Generated**: {}", report.timestamp.to_rfc3339());
    let _ = writeln!(out, "- **Overall System Score**: {}/100", report.overall_score);
    if !report.degraded_probes.is_empty() {
        let _ = writeln!(out, "- **Degraded Probes**: {}", report.degraded_probes.join(", "));
    }

    let _ = writeln!(out, "\n## Component Health Status\n");
    let _ = writeln!(out, "### AI Health: {}", upper(ai.status));
    let _ = writeln!(out, "- **Model Accuracy**: {:.1}%", ai.model_accuracy);
    let _ = writeln!(out, "- **Inference Latency**: {:.0}ms", ai.inference_latency);
    let _ = writeln!(out, "- **Optimization Score**: {:.1}/100\n", ai.optimization_score);

    let _ = writeln!(out, "### Performance Health: {}", upper(perf.status));
    let _ = writeln!(
        out,
        "- **Response Time**: {:.0}ms (p99 {:.0}ms)",
        perf.response_time, perf.response_time_p99
    );
    let _ = writeln!(out, "- **Memory Usage**: {:.1}%", perf.memory_usage);
    let _ = writeln!(out, "- **CPU Usage**: {:.1}%", perf.cpu_usage);
    let _ = writeln!(out, "- **Error Rate**: {:.2}%", perf.error_rate);
    let _ = writeln!(out, "- **Load Capacity**: {:.1}/100\n", perf.load_capacity);

    let _ = writeln!(out, "### Security Health: {}", upper(sec.status));
    let _ = writeln!(out, "- **Security Score**: {:.0}/100", sec.security_score);
    let _ = writeln!(out, "- **Vulnerabilities**: {}", sec.vulnerabilities_count);
    let _ = writeln!(out, "- **Compliance Rate**: {:.1}%", sec.compliance_rate);
    let last_audit = sec
        .last_audit
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    let _ = writeln!(out, "- **Last Audit**: {}", last_audit);

    let _ = writeln!(out, "\n## System Metrics");
    let _ = writeln!(out, "- **Uptime**: {}h", sys.uptime_seconds / 3600);
    let _ = writeln!(out, "- **Total Requests**: {}", sys.total_requests);
    let _ = writeln!(out, "- **Successful Requests**: {}", sys.successful_requests);
    let _ = writeln!(out, "- **System Stability**: {:.1}%", sys.system_stability);

    let _ = writeln!(out, "\n## Optimization Recommendations");
    if report.recommendations.is_empty() {
        let _ = writeln!(out, "\nNo recommendations, all components are within target.");
    }
    for rec in &report.recommendations {
        let _ = writeln!(out, "\n### {}: {}", upper(rec.priority), rec.title);
        let _ = writeln!(out, "- **Category**: {}", rec.category);
        let _ = writeln!(out, "- **Description**: {}", rec.description);
        let _ = writeln!(out, "- **Action Required**: {}", rec.action_required);
        let _ = writeln!(out, "- **Expected Impact**: {}%", rec.estimated_impact);
        let _ = writeln!(out, "- **Implementation Effort**: {}", rec.implementation_effort);
    }

    let _ = writeln!(out, "\n## Historical Trends");
    match history.average_score {
        Some(average) if history.reports > 1 => {
            let _ = writeln!(
                out,
                "- **Trend Analysis**: Based on {} health checks",
                history.reports
            );
            let _ = writeln!(out, "- **Average Score**: {:.0}", average);
            let _ = writeln!(out, "- **Score Trend**: {}", history.trend);
        }
        _ => {
            let _ = writeln!(out, "Insufficient historical data for trend analysis");
        }
    }

    let _ = writeln!(out, "\n## Next Steps");
    let _ = writeln!(out, "1. **Immediate**: Address critical and high-priority recommendations");
    let _ = writeln!(out, "2. **Short-term**: Execute the automated optimization plan");
    let _ = writeln!(out, "3. **Long-term**: Keep continuous monitoring enabled");
    let _ = writeln!(out, "\n---\n*Generated by titand {}*", env!("CARGO_PKG_VERSION"));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use titan_common::{
        AiHealth, PerformanceHealth, ScoreTrend, SecurityHealth, SystemMetrics,
    };

    fn report() -> HealthReport {
        let ai = AiHealth::from_validation(75.0, 1000.0);
        let performance = PerformanceHealth::from_metrics(1500.0, 2500.0, 60.0, 50.0, 2.0);
        let security = SecurityHealth::from_audit(60.0, 4, 60.0, Utc::now());
        HealthReport {
            report_id: "health_abc".to_string(),
            timestamp: Utc::now(),
            overall_score: 42,
            recommendations: crate::recommend::recommendations(&ai, &performance, &security, &[]),
            ai_health: ai,
            performance_health: performance,
            security_health: security,
            system_metrics: SystemMetrics::new(7200, 100, 5),
            degraded_probes: Vec::new(),
            duration_ms: 12,
        }
    }

    #[test]
    fn test_report_sections() {
        let summary = HistorySummary {
            reports: 3,
            average_score: Some(50.0),
            latest_score: Some(42),
            trend: ScoreTrend::Declining,
        };
        let md = render(&report(), &summary);

        assert!(md.contains("- **Report ID**: health_abc"));
        assert!(md.contains("- **Overall System Score**: 42/100"));
        assert!(md.contains("### AI Health: WARNING"));
        assert!(md.contains("### CRITICAL: Improve AI Model Accuracy"));
        assert!(md.contains("### HIGH: Optimize System Performance"));
        assert!(md.contains("- **Uptime**: 2h"));
        assert!(md.contains("- **Score Trend**: Declining"));
    }

    #[test]
    fn test_single_report_has_no_trend() {
        let summary = HistorySummary {
            reports: 1,
            average_score: Some(42.0),
            latest_score: Some(42),
            trend: ScoreTrend::InsufficientData,
        };
        let md = render(&report(), &summary);
        assert!(md.contains("Insufficient historical data"));
    }
}
