//! pulseboard - minimal uptime-monitoring service.
//!
//! Probes a health endpoint on an interval, records pass/fail samples,
//! rolls them up into hourly uptime percentages, and serves a public
//! status summary as JSON.

mod config;
mod db;
mod probe;
mod scheduler;
mod status;
mod web;

use config::Config;
use db::Store;
use scheduler::Scheduler;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("pulseboard=info".parse()?))
        .init();

    // Load configuration
    let cfg = Config::load();
    tracing::info!("Starting pulseboard on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);

    // Initialize database
    let store = Arc::new(Store::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    // Start probe and rollup loops
    let scheduler = Scheduler::new(store.clone(), cfg.clone());
    scheduler.start()?;

    // Start web server
    let server = Server::new(cfg, store);
    server.start().await?;

    Ok(())
}
