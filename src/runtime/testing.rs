/// Shared test fixtures for the run engine
///
/// Provides an engine harness over in-memory SQLite plus a fake deployment
/// client that records every service it creates.

use crate::deploy::{
    CreateServiceRequest, CreatedService, DeployError, DeploymentClient, ProviderCredentials,
};
use crate::runtime::engine::RunEngine;
use crate::runtime::storage::RunStorage;
use crate::workflow::storage::WorkflowStorage;
use crate::workflow::types::{Workflow, WorkflowEdge, WorkflowNode};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory deployment client recording created services
#[derive(Debug, Default)]
pub struct FakeDeployments {
    counter: AtomicUsize,
    /// Service names created, in call order
    pub created: Mutex<Vec<String>>,
    /// Node names whose deployment should fail
    pub fail_for: Mutex<Vec<String>>,
}

impl FakeDeployments {
    pub fn fail_node(&self, node_name: &str) {
        self.fail_for.lock().unwrap().push(node_name.to_string());
    }

    /// Number of create-service calls observed
    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    /// How many created services were for the given node name
    pub fn created_for(&self, node_name: &str) -> usize {
        let prefix = format!("{node_name} at ");
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|name| name.starts_with(&prefix))
            .count()
    }
}

#[async_trait]
impl DeploymentClient for FakeDeployments {
    async fn create_service(
        &self,
        _credentials: &ProviderCredentials,
        request: CreateServiceRequest,
    ) -> Result<CreatedService, DeployError> {
        let failing = self
            .fail_for
            .lock()
            .unwrap()
            .iter()
            .any(|name| request.name.starts_with(&format!("{name} at ")));
        if failing {
            return Err(DeployError::Provider {
                message: format!("refused to create {}", request.name),
            });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.created.lock().unwrap().push(request.name);
        Ok(CreatedService {
            service_id: format!("svc_{n}"),
        })
    }
}

/// Engine plus direct handles to its stores and fake deployments
pub struct Harness {
    pub engine: RunEngine,
    pub workflows: WorkflowStorage,
    pub runs: RunStorage,
    pub deployments: Arc<FakeDeployments>,
}

pub async fn harness() -> Harness {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    let workflows = WorkflowStorage::new(pool.clone());
    workflows.init_schema().await.unwrap();
    let runs = RunStorage::new(pool);
    runs.init_schema().await.unwrap();

    let deployments = Arc::new(FakeDeployments::default());
    let deployer: Arc<dyn DeploymentClient> = deployments.clone();
    let engine = RunEngine::new(workflows.clone(), runs.clone(), deployer);

    Harness {
        engine,
        workflows,
        runs,
        deployments,
    }
}

/// Build a task node with a container image
pub fn task(id: &str, is_root: bool, is_input: bool) -> WorkflowNode {
    let now = Utc::now();
    WorkflowNode {
        public_id: id.to_string(),
        name: id.to_string(),
        created_at: now,
        updated_at: now,
        container_image: Some("busybox:latest".to_string()),
        variables: vec![],
        is_root,
        is_input,
    }
}

/// Build an edge between two node ids
pub fn link(source: &str, target: &str) -> WorkflowEdge {
    WorkflowEdge {
        public_id: format!("wfe_{source}_{target}"),
        source: source.to_string(),
        target: target.to_string(),
    }
}

/// Build and persist a workflow from the given graph, returning its id
pub async fn seed_workflow(
    harness: &Harness,
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
) -> String {
    let now = Utc::now();
    let workflow = Workflow {
        public_id: crate::workflow::types::workflow_id(),
        name: "test workflow".to_string(),
        project_id: "prj_test".to_string(),
        api_key: "key_test".to_string(),
        created_at: now,
        updated_at: now,
        nodes,
        edges,
    };
    harness.workflows.save_workflow(&workflow).await.unwrap();
    workflow.public_id
}

/// Look up the external service id a run mapped for a node
pub async fn service_of(harness: &Harness, run_id: &str, node_id: &str) -> String {
    let versioned = harness.runs.get_run(run_id).await.unwrap().unwrap();
    versioned
        .run
        .service_mappings
        .iter()
        .find(|m| m.node_id == node_id)
        .unwrap_or_else(|| panic!("no mapping for node {node_id}"))
        .service_id
        .clone()
}
