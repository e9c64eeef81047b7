/// TinyFlow: webhook-driven workflow run engine
///
/// Main entry point. Initializes configuration and starts the HTTP server.

use tinyflow::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Workflow documents and run queries at /api/workflows/* and /api/runs/*
/// - Deployment-status webhooks at /api/webhooks/deployments/{run_id}
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
