//! TITAN daemon library - exposes modules for testing.

pub mod aggregator;
pub mod ai;
pub mod config;
pub mod events;
pub mod executor;
pub mod history;
pub mod instrumentation;
pub mod metrics;
pub mod monitor;
pub mod performance;
pub mod planner;
pub mod probes;
pub mod recommend;
pub mod report;
pub mod routes;
pub mod sampler;
pub mod security;
pub mod server;
