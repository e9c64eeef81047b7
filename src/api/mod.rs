/// HTTP API layer
///
/// REST endpoints for workflow documents, the run query surface, and the
/// inbound deployment-status webhook.

pub mod webhooks;
pub mod workflows;

use crate::runtime::error::RunError;
use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};

/// Map an engine error to an HTTP status plus a JSON body carrying the
/// specific violated rule.
pub(crate) fn error_response(err: &RunError) -> (StatusCode, Json<Value>) {
    let status = match err {
        RunError::WorkflowNotFound(_) | RunError::RunNotFound(_) => StatusCode::NOT_FOUND,
        RunError::GraphInvalid(_) | RunError::MissingImage { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RunError::UnknownService { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RunError::DeploymentFailed { .. } => StatusCode::BAD_GATEWAY,
        RunError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(json!({ "error": err.to_string() })))
}
