use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

mod api;
mod config;
mod directive;
mod error;
mod llm;
mod prompts;
mod service;
mod storage;
mod tools;

use crate::config::AppConfig;
use crate::service::PathsightService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging();

    info!(
        "Starting Pathsight service v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration once; everything downstream receives it explicitly
    let config = Arc::new(AppConfig::load()?);
    info!(
        host = %config.server.host,
        port = config.server.port,
        provider = ?config.llm.provider,
        model = %config.llm.model,
        "Configuration loaded"
    );

    // Initialize the service
    let service = Arc::new(PathsightService::new(config.clone())?);

    // Build the router
    let app = api::router(service);

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format()
        .with_target(true)
        .with_thread_ids(true)
        .compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pathsight_service=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format))
        .with(filter)
        .init();
}
