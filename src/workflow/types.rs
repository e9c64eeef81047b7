/// Core workflow type definitions
///
/// Defines the structures for workflows, task nodes, and edges. Workflows
/// are serialized to JSON for persistence and snapshotted verbatim into
/// runs when execution starts.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A complete workflow definition: a DAG of containerized tasks plus the
/// deployment credentials used to create services for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier (e.g., "wf_1f9a…")
    pub public_id: String,
    /// Human-readable workflow name
    pub name: String,
    /// Deployment provider project the tasks deploy into
    pub project_id: String,
    /// Deployment provider API token
    pub api_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Task nodes in this workflow
    pub nodes: Vec<WorkflowNode>,
    /// Directed edges connecting nodes
    pub edges: Vec<WorkflowEdge>,
}

/// A single task node in the workflow DAG
///
/// A node without a container image exists in the graph but is not runnable;
/// run start is gated on every node carrying an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Unique node identifier within the workflow (e.g., "wfn_03bd…")
    pub public_id: String,
    /// Display name, also used to derive deployed service names
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Container image to deploy for this task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_image: Option<String>,
    /// Environment variables passed to the deployed service
    #[serde(default)]
    pub variables: Vec<NodeVariable>,
    /// Terminal sink of the workflow; its SUCCESS completes a run
    pub is_root: bool,
    /// Source node with no required predecessors; deployed at run start
    pub is_input: bool,
}

/// Name/value variable pair handed to the deployment provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeVariable {
    pub name: String,
    pub value: String,
}

/// Directed edge between two task nodes (source runs before target)
///
/// At most one edge exists per ordered (source, target) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEdge {
    /// Unique edge identifier (e.g., "wfe_9c21…")
    pub public_id: String,
    /// Source node public id
    pub source: String,
    /// Target node public id
    pub target: String,
}

/// Generate a prefixed workflow id
pub fn workflow_id() -> String {
    format!("wf_{}", Uuid::new_v4().simple())
}

/// Generate a prefixed node id
pub fn workflow_node_id() -> String {
    format!("wfn_{}", Uuid::new_v4().simple())
}

/// Generate a prefixed edge id
pub fn workflow_edge_id() -> String {
    format!("wfe_{}", Uuid::new_v4().simple())
}

/// Generate a prefixed run id
pub fn workflow_run_id() -> String {
    format!("wfr_{}", Uuid::new_v4().simple())
}
