//! TITAN Control - CLI client for the titand daemon

mod client;
mod display;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use titan_common::{
    AuditPayload, DashboardPayload, ExecutionPayload, HealthPayload, MetricsPayload,
    MonitoringPayload, OptimizationPayload, PlanPayload, ReportPayload,
};

use client::TitanClient;

#[derive(Parser)]
#[command(name = "titanctl")]
#[command(about = "TITAN health and optimization control", long_about = None)]
#[command(version)]
struct Cli {
    /// titand base URL
    #[arg(long, env = "TITAN_URL", default_value = "http://127.0.0.1:7870", global = true)]
    url: String,

    /// Bearer token sent with every request (audits need an admin token)
    #[arg(long, env = "TITAN_TOKEN", global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a health check and show the report
    Status,

    /// Show current performance metrics and alerts
    Metrics {
        /// Print the Prometheus exposition instead
        #[arg(long)]
        prometheus: bool,
    },

    /// Run a security audit (admin)
    Audit,

    /// Show the current optimization plan
    Plan {
        /// Create a new plan from a fresh health check
        #[arg(long)]
        create: bool,
    },

    /// Execute the current optimization plan
    Execute,

    /// Print the markdown optimization report
    Report,

    /// Tune an AI model
    Optimize {
        model_id: String,

        #[arg(long)]
        strategy: Option<String>,
    },

    /// Validate an AI model without tuning
    Validate { model_id: String },

    /// Show the admin dashboard
    Dashboard,

    /// Control the monitoring loop
    Monitor {
        #[command(subcommand)]
        action: MonitorAction,
    },
}

#[derive(Subcommand)]
enum MonitorAction {
    Start,
    Stop,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = TitanClient::new(&cli.url, cli.token);

    match cli.command {
        Commands::Status => {
            let payload: HealthPayload = client.get("/health").await?;
            display::health(&payload.health);
        }
        Commands::Metrics { prometheus: true } => {
            print!("{}", client.metrics_text().await?);
        }
        Commands::Metrics { prometheus: false } => {
            let payload: MetricsPayload = client.get("/performance/metrics").await?;
            display::performance(&payload.metrics);
        }
        Commands::Audit => {
            let payload: AuditPayload = client.post("/security/audit", None).await?;
            display::audit(&payload.audit);
        }
        Commands::Plan { create: true } => {
            let payload: PlanPayload = client.post("/optimization/plan", Some(json!({}))).await?;
            display::plan(&payload.plan);
        }
        Commands::Plan { create: false } => {
            let payload: PlanPayload = client.get("/optimization/plan").await?;
            display::plan(&payload.plan);
        }
        Commands::Execute => {
            let payload: ExecutionPayload = client.post("/optimization/execute", None).await?;
            display::execution(&payload.execution);
        }
        Commands::Report => {
            let payload: ReportPayload = client.get("/report").await?;
            println!("{}", payload.report);
        }
        Commands::Optimize { model_id, strategy } => {
            let body = json!({ "model_id": model_id, "strategy": strategy });
            let payload: OptimizationPayload = client.post("/ai/optimize", Some(body)).await?;
            display::validation(&payload.optimization);
        }
        Commands::Validate { model_id } => {
            let path = format!("/ai/validate/{}", model_id);
            let payload: OptimizationPayload = client.post(&path, None).await?;
            display::validation(&payload.optimization);
        }
        Commands::Dashboard => {
            let payload: DashboardPayload = client.get("/admin/dashboard").await?;
            display::dashboard(&payload.dashboard);
        }
        Commands::Monitor { action } => {
            let path = match action {
                MonitorAction::Start => "/monitoring/start",
                MonitorAction::Stop => "/monitoring/stop",
            };
            let payload: MonitoringPayload = client.post(path, None).await?;
            display::monitoring(&payload.monitoring);
        }
    }

    Ok(())
}
