//! titand - TITAN health aggregation and optimization daemon

use anyhow::Result;
use titand::config::Config;
use titand::events;
use titand::server::{self, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("titand v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load();
    let state = AppState::from_config(&config)?;
    let _event_log = events::spawn_logger(&state.events);

    if config.titand.start_monitoring {
        state.monitoring.start().await;
    }

    server::run(state, &config.titand.bind_address).await
}
