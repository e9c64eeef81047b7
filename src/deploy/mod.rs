/// Deployment provider collaborator
///
/// The run engine never talks to the provider directly; it goes through the
/// [`DeploymentClient`] trait so the state machine can be exercised against
/// a fake in tests. The production implementation speaks the provider's
/// GraphQL API ([`railway::RailwayClient`]).

pub mod railway;

use crate::workflow::types::NodeVariable;
use async_trait::async_trait;
use thiserror::Error;

pub use railway::RailwayClient;

/// Errors surfaced by the deployment provider
#[derive(Debug, Error)]
pub enum DeployError {
    /// Network-level failure or timeout talking to the provider
    #[error("provider transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The provider processed the request and rejected it
    #[error("provider rejected service creation: {message}")]
    Provider { message: String },
    /// Response parsed but carried neither data nor errors
    #[error("malformed provider response")]
    MalformedResponse,
}

/// Per-workflow credentials for the deployment provider
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    /// API token, sent as a bearer header
    pub api_key: String,
    /// Provider project that created services land in
    pub project_id: String,
}

/// Request to create one remote service for a task node
#[derive(Debug, Clone)]
pub struct CreateServiceRequest {
    /// Externally unique service name ("{node name} at {run millis}")
    pub name: String,
    /// Container image to deploy
    pub image: String,
    /// Environment variables for the service
    pub variables: Vec<NodeVariable>,
}

/// Identifier of a service the provider created
#[derive(Debug, Clone)]
pub struct CreatedService {
    pub service_id: String,
}

/// Creates remote services for task nodes
#[async_trait]
pub trait DeploymentClient: Send + Sync {
    async fn create_service(
        &self,
        credentials: &ProviderCredentials,
        request: CreateServiceRequest,
    ) -> Result<CreatedService, DeployError>;
}
