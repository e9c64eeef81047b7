/// Server setup and initialization
///
/// Wires together storage, the deployment client, the run engine, and the
/// HTTP routes into the complete Axum application.

use crate::{
    api::{
        webhooks::create_webhook_routes,
        workflows::{create_workflow_routes, AppState},
    },
    config::Config,
    deploy::{DeploymentClient, RailwayClient},
    runtime::{engine::RunEngine, storage::RunStorage},
    workflow::storage::WorkflowStorage,
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application with all routes
pub async fn create_app(config: Config) -> Result<Router> {
    // Ensure the database directory exists before SQLite opens the file
    if let Some(parent) = Path::new(&config.database.path).parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;
    }

    tracing::info!("🗄️ Opening database: {}", config.database.path);
    let options = SqliteConnectOptions::new()
        .filename(&config.database.path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    tracing::info!("📋 Initializing storage schemas");
    let workflows = WorkflowStorage::new(pool.clone());
    workflows.init_schema().await?;
    let runs = RunStorage::new(pool);
    runs.init_schema().await?;

    tracing::info!("🛰️ Initializing deployment client: {}", config.provider.api_url);
    let deployer: Arc<dyn DeploymentClient> = Arc::new(
        RailwayClient::new(&config.provider)
            .map_err(|e| anyhow::anyhow!("Failed to build deployment client: {}", e))?,
    );

    tracing::info!("⚙️ Initializing run engine");
    let engine = Arc::new(RunEngine::new(workflows.clone(), runs.clone(), deployer));

    let state = AppState {
        workflows,
        runs,
        engine,
    };

    let app = Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Workflow documents + run query surface
        .merge(create_workflow_routes())
        // Inbound deployment-status webhooks
        .merge(create_webhook_routes())
        .with_state(state);

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting TinyFlow server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
