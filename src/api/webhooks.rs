/// Inbound deployment-status webhook
///
/// The deployment provider posts status changes here; each delivery is one
/// scheduler tick for the addressed run. Payload statuses outside the
/// modeled set are acknowledged and ignored without touching the engine.

use crate::api::{error_response, workflows::AppState};
use crate::runtime::processor::EventOutcome;
use crate::runtime::types::NodeStatus;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{post, Router},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

/// Provider webhook payload, keyed to a run via the service mapping
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentWebhook {
    /// External id of the service the status applies to
    pub service_id: String,
    /// Provider status value; only DEPLOYING/SUCCESS/FAILED are modeled
    pub status: String,
    /// When the provider recorded the status; defaults to receipt time
    pub timestamp: Option<DateTime<Utc>>,
}

/// Create webhook routes
pub fn create_webhook_routes() -> Router<AppState> {
    Router::new().route(
        "/api/webhooks/deployments/{run_id}",
        post(receive_deployment_event),
    )
}

/// Process one deployment-status delivery for a run
///
/// POST /api/webhooks/deployments/{run_id}
async fn receive_deployment_event(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Json(payload): Json<DeploymentWebhook>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    tracing::info!(
        "📥 Deployment webhook for run {}: service {} is {}",
        run_id,
        payload.service_id,
        payload.status
    );

    let Some(status) = NodeStatus::from_webhook(&payload.status) else {
        tracing::debug!(
            "🙉 Unrecognized deployment status '{}' for run {}, acknowledging without processing",
            payload.status,
            run_id
        );
        return Ok(Json(json!({ "acknowledged": true, "ignored": payload.status })));
    };

    let timestamp = payload.timestamp.unwrap_or_else(Utc::now);

    match state
        .engine
        .handle_deployment_event(&run_id, &payload.service_id, status, timestamp)
        .await
    {
        Ok(EventOutcome::IgnoredTerminal) => {
            Ok(Json(json!({ "acknowledged": true, "runTerminal": true })))
        }
        Ok(EventOutcome::Recorded {
            deployed,
            run_status,
        }) => Ok(Json(json!({
            "acknowledged": true,
            "runStatus": run_status,
            "deployedNodes": deployed,
        }))),
        Err(err) => {
            tracing::error!(
                "❌ Webhook processing failed for run {} (service {}): {}",
                run_id,
                payload.service_id,
                err
            );
            Err(error_response(&err))
        }
    }
}
