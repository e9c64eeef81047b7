/// Run engine error taxonomy
///
/// Validation errors are raised synchronously to the run-start caller;
/// event-processing errors go back to the webhook caller but always leave
/// the persisted run state consistent.

use crate::deploy::DeployError;
use crate::workflow::graph::GraphViolation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("run not found: {0}")]
    RunNotFound(String),

    /// The graph failed a structural rule; carries the specific violation
    #[error("workflow graph is invalid: {0}")]
    GraphInvalid(#[from] GraphViolation),

    /// Valid DAG, but a task node is missing its container image
    #[error("node {node} has no container image")]
    MissingImage { node: String },

    /// A webhook referenced a service this run never created — a provider
    /// or integration bug, surfaced rather than dropped
    #[error("webhook references unknown service {service_id}")]
    UnknownService { service_id: String },

    /// Provider-side failure creating a service; run state already
    /// committed before the attempt is untouched
    #[error("deployment failed for node {node}: {source}")]
    DeploymentFailed {
        node: String,
        #[source]
        source: DeployError,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
