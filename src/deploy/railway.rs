/// Railway-compatible GraphQL deployment client
///
/// Creates services through the provider's `serviceCreate` mutation. Every
/// call carries the workflow's own API token, so one client instance serves
/// all workflows.

use crate::config::ProviderConfig;
use crate::deploy::{
    CreateServiceRequest, CreatedService, DeployError, DeploymentClient, ProviderCredentials,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const CREATE_SERVICE_MUTATION: &str = r#"
mutation ServiceCreate($input: ServiceCreateInput!) {
  serviceCreate(input: $input) {
    id
  }
}
"#;

/// GraphQL client for the deployment provider
#[derive(Debug, Clone)]
pub struct RailwayClient {
    http: reqwest::Client,
    api_url: String,
}

impl RailwayClient {
    /// Build a client with the configured endpoint and request timeout
    pub fn new(config: &ProviderConfig) -> Result<Self, DeployError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ServiceCreateData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct ServiceCreateData {
    #[serde(rename = "serviceCreate")]
    service_create: ServiceCreatePayload,
}

#[derive(Debug, Deserialize)]
struct ServiceCreatePayload {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[async_trait]
impl DeploymentClient for RailwayClient {
    async fn create_service(
        &self,
        credentials: &ProviderCredentials,
        request: CreateServiceRequest,
    ) -> Result<CreatedService, DeployError> {
        tracing::debug!(
            "🛰️ Creating provider service '{}' in project {}",
            request.name,
            credentials.project_id
        );

        let variables: serde_json::Map<String, serde_json::Value> = request
            .variables
            .iter()
            .map(|v| (v.name.clone(), serde_json::Value::String(v.value.clone())))
            .collect();

        let body = json!({
            "query": CREATE_SERVICE_MUTATION,
            "variables": {
                "input": {
                    "projectId": credentials.project_id,
                    "name": request.name,
                    "source": { "image": request.image },
                    "variables": variables,
                }
            }
        });

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&credentials.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GraphQlResponse>()
            .await?;

        if let Some(errors) = response.errors {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(DeployError::Provider { message });
        }

        let payload = response.data.ok_or(DeployError::MalformedResponse)?;

        tracing::debug!(
            "✅ Provider service created: {} -> {}",
            request.name,
            payload.service_create.id
        );

        Ok(CreatedService {
            service_id: payload.service_create.id,
        })
    }
}
