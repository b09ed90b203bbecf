//! Terminal rendering for titanctl

use owo_colors::OwoColorize;
use titan_common::{
    Dashboard, HealthReport, HealthStatus, ModelValidation, MonitoringState, OptimizationPlan,
    PerformanceReport, PlanExecutionSummary, Priority, SecurityAudit, Severity, StepStatus,
};

const SEPARATOR: &str = "----------------------------------------";

fn status_label(status: HealthStatus) -> String {
    let label = format!("[{}]", status.as_str().to_uppercase());
    match status {
        HealthStatus::Excellent => label.bright_green().to_string(),
        HealthStatus::Good => label.green().to_string(),
        HealthStatus::Warning => label.yellow().to_string(),
        HealthStatus::Critical => label.bright_red().to_string(),
    }
}

fn score_colored(score: f64) -> String {
    let text = format!("{:.0}/100", score);
    if score >= 80.0 {
        text.bright_green().to_string()
    } else if score >= 60.0 {
        text.yellow().to_string()
    } else {
        text.bright_red().to_string()
    }
}

fn priority_label(priority: Priority) -> String {
    let label = format!("[{}]", priority.to_string().to_uppercase());
    match priority {
        Priority::Critical => label.bright_red().to_string(),
        Priority::High => label.red().to_string(),
        Priority::Medium => label.yellow().to_string(),
        Priority::Low => label.dimmed().to_string(),
    }
}

fn step_label(status: StepStatus) -> String {
    let label = format!("[{}]", status.as_str());
    match status {
        StepStatus::Completed => label.bright_green().to_string(),
        StepStatus::Failed => label.bright_red().to_string(),
        StepStatus::InProgress => label.cyan().to_string(),
        StepStatus::Pending => label.dimmed().to_string(),
    }
}

pub fn health(report: &HealthReport) {
    println!("{}", "TITAN System Health".bold());
    println!("{}", SEPARATOR);
    println!(
        "Overall:      {}   ({})",
        score_colored(report.overall_score as f64),
        report.report_id.dimmed()
    );
    println!(
        "AI:           {} accuracy {:.1}%, latency {:.0}ms",
        status_label(report.ai_health.status),
        report.ai_health.model_accuracy,
        report.ai_health.inference_latency
    );
    println!(
        "Performance:  {} response {:.0}ms, memory {:.1}%, cpu {:.1}%",
        status_label(report.performance_health.status),
        report.performance_health.response_time,
        report.performance_health.memory_usage,
        report.performance_health.cpu_usage
    );
    println!(
        "Security:     {} score {:.0}, {} vulnerabilities",
        status_label(report.security_health.status),
        report.security_health.security_score,
        report.security_health.vulnerabilities_count
    );
    if !report.degraded_probes.is_empty() {
        println!(
            "{} {}",
            "Degraded probes:".bright_red(),
            report.degraded_probes.join(", ")
        );
    }

    if !report.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations".bold());
        for rec in &report.recommendations {
            println!("  {} {}", priority_label(rec.priority), rec.title);
            println!("      {}", rec.action_required.dimmed());
        }
    }
}

pub fn performance(report: &PerformanceReport) {
    let current = &report.current;
    println!("{}", "Performance Metrics".bold());
    println!("{}", SEPARATOR);
    println!(
        "Response:     p50 {:.0}ms, p99 {:.0}ms",
        current.response_time, current.response_time_p99
    );
    println!("CPU:          {:.1}%", current.cpu_usage);
    println!("Memory:       {:.1}%", current.memory_usage);
    println!("Error rate:   {:.2}%", current.error_rate);
    println!("Requests:     {}", current.total_requests);

    if let Some(summary) = &report.summary {
        println!();
        println!(
            "Averages over {} samples: response {:.0}ms, cpu {:.1}%, memory {:.1}%",
            summary.total_data_points,
            summary.average_response_time,
            summary.average_cpu_usage,
            summary.average_memory_usage
        );
    }

    if !report.alerts.is_empty() {
        println!();
        println!("{}", "Alerts".bold());
        for alert in &report.alerts {
            println!("  [{:?}] {}", alert.level, alert.message);
        }
    }
}

pub fn audit(audit: &SecurityAudit) {
    println!("{}", "Security Audit".bold());
    println!("{}", SEPARATOR);
    println!("Audit:        {}", audit.audit_id.dimmed());
    println!("Score:        {}", score_colored(audit.score.overall));
    println!("Compliance:   {:.1}%", audit.compliance_rate());
    println!(
        "Findings:     {} critical, {} high, {} medium, {} low",
        audit.count_severity(Severity::Critical),
        audit.count_severity(Severity::High),
        audit.count_severity(Severity::Medium),
        audit.count_severity(Severity::Low)
    );

    for vuln in &audit.vulnerabilities {
        let severity = format!("[{}]", vuln.severity.to_string().to_uppercase());
        let severity = match vuln.severity {
            Severity::Critical => severity.bright_red().to_string(),
            Severity::High => severity.red().to_string(),
            Severity::Medium => severity.yellow().to_string(),
            Severity::Low => severity.dimmed().to_string(),
        };
        println!("  {} {} ({})", severity, vuln.title, vuln.location);
    }
}

pub fn plan(plan: &OptimizationPlan) {
    println!("{}", "Optimization Plan".bold());
    println!("{}", SEPARATOR);
    println!("Plan:         {}", plan.plan_id.dimmed());
    println!("Source:       {}", plan.source_report_id.dimmed());
    println!("Estimated:    {:.2}h", plan.estimated_completion_time);

    if plan.optimization_steps.is_empty() {
        println!();
        println!("{}", "No steps needed, all components are within target.".bright_green());
        return;
    }

    println!();
    for step in &plan.optimization_steps {
        let mode = if step.automated { "automated" } else { "manual" };
        println!(
            "  {} {} ({}, {}min, {})",
            step_label(step.status),
            step.title,
            step.category,
            step.estimated_duration,
            mode
        );
        if let Some(error) = &step.error {
            println!("      {}", error.bright_red());
        }
    }
}

pub fn execution(summary: &PlanExecutionSummary) {
    println!("{}", "Plan Execution".bold());
    println!("{}", SEPARATOR);
    println!(
        "{} completed, {} failed in {}ms",
        summary.completed.to_string().bright_green(),
        summary.failed.to_string().bright_red(),
        summary.duration_ms
    );
    for outcome in &summary.outcomes {
        println!("  {} {}", step_label(outcome.status), outcome.step_id);
        for line in &outcome.detail {
            println!("      {}", line.dimmed());
        }
        if let Some(error) = &outcome.error {
            println!("      {}", error.bright_red());
        }
    }
}

pub fn validation(result: &ModelValidation) {
    let verdict = if result.is_valid {
        "[VALID]".bright_green().to_string()
    } else {
        "[INVALID]".bright_red().to_string()
    };
    println!("{} {} ({})", verdict, result.model_id.bold(), result.strategy);
    println!(
        "Accuracy {:.1}%, latency {:.0}ms, memory {:.0}MB over {} iteration(s)",
        result.accuracy, result.latency_ms, result.memory_usage_mb, result.iterations
    );
    for rec in &result.recommendations {
        println!("  * {}", rec);
    }
}

pub fn monitoring(state: &MonitoringState) {
    let status = if state.active {
        "[ACTIVE]".bright_green().to_string()
    } else {
        "[STOPPED]".yellow().to_string()
    };
    println!(
        "Monitoring {} every {}ms, {} ticks, auto optimization {}",
        status,
        state.interval_ms,
        state.ticks,
        if state.auto_optimization { "on" } else { "off" }
    );
}

pub fn dashboard(dashboard: &Dashboard) {
    match &dashboard.latest_report {
        Some(report) => health(report),
        None => println!("{}", "No health checks yet".yellow()),
    }
    println!();
    println!(
        "History: {} reports, trend {}",
        dashboard.history.reports, dashboard.history.trend
    );
    if let Some(current) = &dashboard.current_plan {
        println!(
            "Plan:    {} ({} of {} steps finished)",
            current.plan_id,
            current.count_with_status(StepStatus::Completed)
                + current.count_with_status(StepStatus::Failed),
            current.optimization_steps.len()
        );
    }
    println!(
        "Security: {} open findings ({} critical)",
        dashboard
            .security
            .total_vulnerabilities
            .saturating_sub(dashboard.security.resolved),
        dashboard.security.critical
    );
    monitoring(&dashboard.monitoring);
}
