//! Health aggregation tests
//!
//! Fake probes keep every check deterministic; timeouts use short real sleeps.

mod common;

use approx::assert_relative_eq;
use common::{steady_performance, strong_ai, DownScanner, Fixture, ScriptedRunner};
use std::sync::Arc;
use std::time::{Duration, Instant};
use titan_common::{
    AiHealth, HealthStatus, PerformanceHealth, Priority, RecommendationCategory, ScoreTrend,
};
use titand::aggregator::HealthAggregator;
use titand::events::EventBus;
use titand::probes::{FakeBehavior, FakeProbe, SecurityHealthProbe};
use titand::security::{AuditSection, SecurityAuditor};

// ============================================================================
// Overall Score
// ============================================================================

#[tokio::test]
async fn overall_score_is_weighted_sum() {
    let aggregator = Fixture::new(80.0).build();
    let report = aggregator.run_health_check().await;

    // 0.3 * 100 + 0.3 * 50 + 0.4 * 80
    assert_eq!(report.overall_score, 77);
    assert_relative_eq!(report.performance_health.load_capacity, 50.0);
    assert!(report.degraded_probes.is_empty());
}

#[tokio::test]
async fn overall_score_stays_in_range() {
    for score in [0.0, 12.5, 49.9, 85.0, 100.0] {
        let report = Fixture::new(score).build().run_health_check().await;
        let expected = (30.0 + 15.0 + 0.4 * score).round() as u8;
        assert_eq!(report.overall_score, expected);
        assert!(report.overall_score <= 100);
    }
}

// ============================================================================
// Probe Failures
// ============================================================================

#[tokio::test]
async fn failing_probe_reports_worst_case() {
    let mut fixture = Fixture::new(80.0);
    fixture.ai = FakeBehavior::Fail("model registry unreachable".to_string());
    let report = fixture.build().run_health_check().await;

    assert_eq!(report.ai_health.status, HealthStatus::Critical);
    assert_eq!(report.ai_health.optimization_score, 0.0);
    assert_eq!(report.degraded_probes, vec!["ai".to_string()]);
    // 0.3 * 0 + 0.3 * 50 + 0.4 * 80
    assert_eq!(report.overall_score, 47);

    let system = report
        .recommendations
        .iter()
        .find(|r| r.category == RecommendationCategory::System)
        .unwrap();
    assert_eq!(system.priority, Priority::Critical);
}

#[tokio::test]
async fn hanging_probe_times_out() {
    let mut fixture = Fixture::new(80.0);
    fixture.security = FakeBehavior::Hang(Duration::from_secs(30));
    fixture.probe_timeout = Duration::from_millis(50);
    let aggregator = fixture.build();

    let start = Instant::now();
    let report = aggregator.run_health_check().await;

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(report.degraded_probes, vec!["security".to_string()]);
    assert_eq!(report.security_health.security_score, 0.0);
    assert_eq!(report.security_health.status, HealthStatus::Critical);
    assert!(report.security_health.last_audit.is_none());

    let metrics = aggregator.metrics().render().unwrap();
    assert!(metrics
        .lines()
        .any(|l| l.starts_with("titan_probe_failures_total{") && l.contains("kind=\"timeout\"")));
}

#[tokio::test]
async fn unreachable_scanner_degrades_security() {
    let events = EventBus::new();
    let auditor = Arc::new(SecurityAuditor::new(
        Arc::new(DownScanner),
        AuditSection::ALL.to_vec(),
        events.clone(),
    ));
    let aggregator = HealthAggregator::builder()
        .ai_probe(FakeProbe::healthy("ai", strong_ai()))
        .performance_probe(FakeProbe::healthy("performance", steady_performance()))
        .security_probe(SecurityHealthProbe::new(auditor.clone(), Duration::from_secs(3600)))
        .step_runner(Arc::new(ScriptedRunner::instant()))
        .events(events)
        .build()
        .unwrap();

    let report = aggregator.run_health_check().await;

    assert_eq!(report.degraded_probes, vec!["security".to_string()]);
    assert_eq!(report.security_health.security_score, 0.0);
    assert_eq!(report.security_health.status, HealthStatus::Critical);
    // 0.3 * 100 + 0.3 * 50 + 0.4 * 0
    assert_eq!(report.overall_score, 45);
    assert!(report.recommendations.iter().any(|r| {
        r.category == RecommendationCategory::Security && r.priority == Priority::Critical
    }));
    assert!(auditor.latest_audit().await.is_none());
}

#[tokio::test]
async fn all_probes_failing_still_produces_report() {
    let mut fixture = Fixture::new(80.0);
    fixture.ai = FakeBehavior::Fail("down".to_string());
    fixture.performance = FakeBehavior::Fail("down".to_string());
    fixture.security = FakeBehavior::Fail("down".to_string());
    let report = fixture.build().run_health_check().await;

    assert_eq!(report.overall_score, 0);
    assert_eq!(report.degraded_probes.len(), 3);
}

// ============================================================================
// Recommendations
// ============================================================================

#[tokio::test]
async fn low_security_score_adds_security_recommendation() {
    let report = Fixture::new(84.0).build().run_health_check().await;
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.category == RecommendationCategory::Security));

    let report = Fixture::new(90.0).build().run_health_check().await;
    assert!(report.recommendations.is_empty());
}

#[tokio::test]
async fn weak_components_yield_three_recommendations() {
    let mut fixture = Fixture::new(60.0);
    fixture.ai = FakeBehavior::Healthy(AiHealth::from_validation(75.0, 1000.0));
    fixture.performance =
        FakeBehavior::Healthy(PerformanceHealth::from_metrics(1500.0, 2500.0, 60.0, 50.0, 2.0));
    let report = fixture.build().run_health_check().await;

    let summary: Vec<(RecommendationCategory, Priority)> = report
        .recommendations
        .iter()
        .map(|r| (r.category, r.priority))
        .collect();
    assert_eq!(
        summary,
        vec![
            (RecommendationCategory::Ai, Priority::Critical),
            (RecommendationCategory::Performance, Priority::High),
            (RecommendationCategory::Security, Priority::Critical),
        ]
    );
}

// ============================================================================
// Events, History and Reports
// ============================================================================

#[tokio::test]
async fn critical_report_emits_events() {
    let fixture = Fixture::new(10.0);
    let mut rx = fixture.events.subscribe();
    let report = fixture.build().run_health_check().await;

    // 30 + 15 + 4
    assert_eq!(report.overall_score, 49);
    let names: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|e| e.kind.name())
        .collect();
    assert_eq!(
        names,
        vec!["report_generated", "critical_issues", "system_health_critical"]
    );
}

#[tokio::test]
async fn history_tracks_every_check() {
    let aggregator = Fixture::new(80.0).build();
    assert!(aggregator.generate_optimization_report().await.is_err());

    for _ in 0..3 {
        aggregator.run_health_check().await;
    }

    let history = aggregator.history().await;
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let summary = aggregator.history_summary().await;
    assert_eq!(summary.trend, ScoreTrend::Stable);
    assert_eq!(summary.latest_score, Some(77));

    let markdown = aggregator.generate_optimization_report().await.unwrap();
    assert!(markdown.contains("Based on 3 health checks"));
    assert!(markdown.contains("- **Overall System Score**: 77/100"));

    let metrics = aggregator.metrics().render().unwrap();
    assert!(metrics.contains("titan_health_checks_total 3"));
    assert!(metrics.contains("titan_overall_score 77"));
}
