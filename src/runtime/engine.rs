/// Run engine wiring
///
/// Owns the storage handles and the deployment-client collaborator shared
/// by the run materializer and the event processor. The engine has no
/// background loop of its own: runs advance only when `start_run` or
/// `handle_deployment_event` is called.

use crate::deploy::{CreateServiceRequest, CreatedService, DeploymentClient, ProviderCredentials};
use crate::runtime::error::RunError;
use crate::runtime::storage::RunStorage;
use crate::runtime::types::WorkflowRun;
use crate::workflow::storage::WorkflowStorage;
use crate::workflow::types::WorkflowNode;
use std::sync::Arc;

/// Drives workflow runs: materializes them and advances them per webhook
pub struct RunEngine {
    pub(crate) workflows: WorkflowStorage,
    pub(crate) runs: RunStorage,
    pub(crate) deployer: Arc<dyn DeploymentClient>,
}

impl RunEngine {
    /// Create a new engine over the given stores and deployment client
    pub fn new(
        workflows: WorkflowStorage,
        runs: RunStorage,
        deployer: Arc<dyn DeploymentClient>,
    ) -> Self {
        Self {
            workflows,
            runs,
            deployer,
        }
    }

    /// Load the deployment credentials of the workflow a run belongs to
    pub(crate) async fn credentials_for(
        &self,
        workflow_id: &str,
    ) -> Result<ProviderCredentials, RunError> {
        let workflow = self
            .workflows
            .get_workflow(workflow_id)
            .await?
            .ok_or_else(|| RunError::WorkflowNotFound(workflow_id.to_string()))?;

        Ok(ProviderCredentials {
            api_key: workflow.api_key,
            project_id: workflow.project_id,
        })
    }

    /// Create the remote service for one task node of a run
    ///
    /// The service name embeds the run start time so repeated runs of the
    /// same workflow get externally unique names.
    pub(crate) async fn deploy_node(
        &self,
        credentials: &ProviderCredentials,
        run: &WorkflowRun,
        node: &WorkflowNode,
    ) -> Result<CreatedService, RunError> {
        let image = node
            .container_image
            .clone()
            .filter(|img| !img.is_empty())
            .ok_or_else(|| RunError::MissingImage {
                node: node.public_id.clone(),
            })?;

        let request = CreateServiceRequest {
            name: format!("{} at {}", node.name, run.date_started.timestamp_millis()),
            image,
            variables: node.variables.clone(),
        };

        tracing::info!(
            "🚀 Deploying task '{}' ({}) for run {}",
            node.name,
            node.public_id,
            run.public_id
        );

        self.deployer
            .create_service(credentials, request)
            .await
            .map_err(|source| RunError::DeploymentFailed {
                node: node.public_id.clone(),
                source,
            })
    }
}
