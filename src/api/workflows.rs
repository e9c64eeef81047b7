/// Workflow document REST API and run query surface
///
/// The graph editor is an external collaborator: it submits complete
/// workflow documents here and polls run views for display. Node/edge
/// editing endpoints are intentionally absent.

use crate::api::error_response;
use crate::runtime::engine::RunEngine;
use crate::runtime::projection::{project_run, RunView};
use crate::runtime::storage::RunStorage;
use crate::workflow::graph::{is_runnable, is_valid_dag};
use crate::workflow::storage::WorkflowStorage;
use crate::workflow::types::{
    workflow_edge_id, workflow_id, workflow_node_id, NodeVariable, Workflow, WorkflowEdge,
    WorkflowNode,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Workflow document storage
    pub workflows: WorkflowStorage,
    /// Run storage for the query surface
    pub runs: RunStorage,
    /// Run engine for starting runs and processing events
    pub engine: Arc<RunEngine>,
}

/// Request body for workflow creation
///
/// When `nodes` is omitted the default two-task template is seeded
/// (an input task wired into an output task).
#[derive(Debug, Deserialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    pub project_id: String,
    pub api_key: String,
    #[serde(default)]
    pub nodes: Option<Vec<NodeSpec>>,
    #[serde(default)]
    pub edges: Option<Vec<EdgeSpec>>,
}

/// Node definition as submitted by the editor collaborator
#[derive(Debug, Deserialize)]
pub struct NodeSpec {
    /// Client-assigned id, referenced by edges; generated when absent
    pub public_id: Option<String>,
    pub name: String,
    pub container_image: Option<String>,
    #[serde(default)]
    pub variables: Vec<NodeVariable>,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default)]
    pub is_input: bool,
}

/// Edge definition as submitted by the editor collaborator
#[derive(Debug, Deserialize)]
pub struct EdgeSpec {
    pub source: String,
    pub target: String,
}

/// Workflow shaped for display, with derived validity flags
#[derive(Debug, Serialize)]
pub struct WorkflowView {
    pub public_id: String,
    pub name: String,
    pub project_id: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    /// Derived at query time, never stored
    pub is_valid_dag: bool,
    pub is_runnable: bool,
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowView {
    fn from_workflow(workflow: Workflow) -> Self {
        let is_valid = is_valid_dag(&workflow.nodes, &workflow.edges);
        let runnable = is_valid && is_runnable(&workflow.nodes);
        Self {
            public_id: workflow.public_id,
            name: workflow.name,
            project_id: workflow.project_id,
            created_at: workflow.created_at,
            updated_at: workflow.updated_at,
            is_valid_dag: is_valid,
            is_runnable: runnable,
            nodes: workflow.nodes,
            edges: workflow.edges,
        }
    }
}

/// Create workflow and run query routes
pub fn create_workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflows", post(create_workflow))
        .route("/api/workflows", get(list_workflows))
        .route("/api/workflows/{id}", get(get_workflow))
        .route("/api/workflows/{id}/runs", post(start_run))
        .route("/api/workflows/{id}/runs", get(list_runs))
        .route("/api/runs/{id}", get(get_run))
}

/// Create a new workflow document
///
/// POST /api/workflows
async fn create_workflow(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkflowRequest>,
) -> Result<Json<WorkflowView>, StatusCode> {
    if payload.name.is_empty() || payload.project_id.is_empty() || payload.api_key.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let now = Utc::now();
    let (nodes, edges) = match payload.nodes {
        Some(specs) => {
            let nodes: Vec<WorkflowNode> = specs
                .into_iter()
                .map(|spec| WorkflowNode {
                    public_id: spec.public_id.unwrap_or_else(workflow_node_id),
                    name: spec.name,
                    created_at: now,
                    updated_at: now,
                    container_image: spec.container_image,
                    variables: spec.variables,
                    is_root: spec.is_root,
                    is_input: spec.is_input,
                })
                .collect();

            let mut edges: Vec<WorkflowEdge> = Vec::new();
            for spec in payload.edges.unwrap_or_default() {
                // At most one edge per ordered (source, target) pair.
                if edges
                    .iter()
                    .any(|e| e.source == spec.source && e.target == spec.target)
                {
                    continue;
                }
                edges.push(WorkflowEdge {
                    public_id: workflow_edge_id(),
                    source: spec.source,
                    target: spec.target,
                });
            }
            (nodes, edges)
        }
        None => default_template(now),
    };

    let workflow = Workflow {
        public_id: workflow_id(),
        name: payload.name,
        project_id: payload.project_id,
        api_key: payload.api_key,
        created_at: now,
        updated_at: now,
        nodes,
        edges,
    };

    if let Err(e) = state.workflows.save_workflow(&workflow).await {
        tracing::error!("Failed to save workflow: {}", e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    tracing::info!("📦 Created workflow: {} ({})", workflow.public_id, workflow.name);

    Ok(Json(WorkflowView::from_workflow(workflow)))
}

/// The seed graph every fresh workflow starts from: one input task feeding
/// one output (root) task.
fn default_template(now: chrono::DateTime<Utc>) -> (Vec<WorkflowNode>, Vec<WorkflowEdge>) {
    let input_id = workflow_node_id();
    let output_id = workflow_node_id();

    let nodes = vec![
        WorkflowNode {
            public_id: output_id.clone(),
            name: "Output Task".to_string(),
            created_at: now,
            updated_at: now,
            container_image: None,
            variables: vec![],
            is_root: true,
            is_input: false,
        },
        WorkflowNode {
            public_id: input_id.clone(),
            name: "Input Task".to_string(),
            created_at: now,
            updated_at: now,
            container_image: None,
            variables: vec![],
            is_root: false,
            is_input: true,
        },
    ];

    let edges = vec![WorkflowEdge {
        public_id: workflow_edge_id(),
        source: input_id,
        target: output_id,
    }];

    (nodes, edges)
}

/// List all workflows
///
/// GET /api/workflows
async fn list_workflows(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.workflows.list_workflows().await {
        Ok(workflows) => Ok(Json(json!({ "workflows": workflows }))),
        Err(e) => {
            tracing::error!("Failed to list workflows: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a specific workflow by id
///
/// GET /api/workflows/{id}
async fn get_workflow(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowView>, StatusCode> {
    match state.workflows.get_workflow(&id).await {
        Ok(Some(workflow)) => Ok(Json(WorkflowView::from_workflow(workflow))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get workflow {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Start a run for a workflow
///
/// POST /api/workflows/{id}/runs
async fn start_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunView>, (StatusCode, Json<Value>)> {
    match state.engine.start_run(&id).await {
        Ok(run) => Ok(Json(project_run(&run))),
        Err(err) => {
            tracing::warn!("Failed to start run for workflow {}: {}", id, err);
            Err(error_response(&err))
        }
    }
}

/// List a workflow's runs, newest first
///
/// GET /api/workflows/{id}/runs
async fn list_runs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.runs.list_runs(&id).await {
        Ok(runs) => {
            let views: Vec<RunView> = runs.iter().map(project_run).collect();
            Ok(Json(json!({ "total": views.len(), "runs": views })))
        }
        Err(e) => {
            tracing::error!("Failed to list runs for workflow {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Get a single run view
///
/// GET /api/runs/{id}
async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunView>, StatusCode> {
    match state.runs.get_run(&id).await {
        Ok(Some(versioned)) => Ok(Json(project_run(&versioned.run))),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get run {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
