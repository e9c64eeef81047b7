/// Run execution types
///
/// A run snapshots a workflow's nodes and edges at start time; the snapshot
/// never changes afterwards. Progress is tracked by an append-only log of
/// per-node deployment status events and an append-only map from node ids
/// to the external services created for them.

use crate::workflow::types::{WorkflowEdge, WorkflowNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-node deployment status as reported by provider webhooks
///
/// NOT_STARTED is implicit: a node with no log entries has not been
/// deployed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Deploying,
    Success,
    Failed,
}

impl NodeStatus {
    /// Parse a webhook status value; anything outside the modeled set maps
    /// to None and is acknowledged without touching the run.
    pub fn from_webhook(value: &str) -> Option<Self> {
        match value {
            "DEPLOYING" => Some(Self::Deploying),
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Run lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Run record exists but input-node deployment has not finished
    Preparing,
    Running,
    Failed,
    Completed,
}

impl RunStatus {
    /// Terminal runs ignore all further events
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Failed | RunStatus::Completed)
    }

    /// Stable column value for indexed queries
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Preparing => "PREPARING",
            RunStatus::Running => "RUNNING",
            RunStatus::Failed => "FAILED",
            RunStatus::Completed => "COMPLETED",
        }
    }
}

/// One recorded status event for a node within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentEvent {
    pub node_id: String,
    pub recorded_status: NodeStatus,
    pub recorded_at: DateTime<Utc>,
}

/// Association between an internal node id and the external service created
/// for it; routes inbound webhook events back to the correct node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceMapping {
    pub node_id: String,
    pub service_id: String,
}

/// One execution attempt of a workflow's frozen node/edge snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    /// Unique run identifier (e.g., "wfr_7be0…")
    pub public_id: String,
    /// Workflow this run was materialized from
    pub workflow_id: String,
    pub status: RunStatus,
    pub date_started: DateTime<Utc>,
    /// Node snapshot, immutable after creation
    pub nodes: Vec<WorkflowNode>,
    /// Edge snapshot, immutable after creation
    pub edges: Vec<WorkflowEdge>,
    /// Append-only node id → external service id map
    pub service_mappings: Vec<ServiceMapping>,
    /// Append-only per-node status event log
    pub deployment_log: Vec<DeploymentEvent>,
}

impl WorkflowRun {
    /// Look up a snapshotted node by public id
    pub fn node(&self, node_id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.public_id == node_id)
    }

    /// The workflow's terminal sink node, if flagged
    pub fn root_node(&self) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.is_root)
    }

    /// Resolve an external service id back to the node it was created for
    pub fn node_for_service(&self, service_id: &str) -> Option<&str> {
        self.service_mappings
            .iter()
            .find(|m| m.service_id == service_id)
            .map(|m| m.node_id.as_str())
    }

    /// Whether a service was already created (or claimed) for this node
    pub fn has_mapping(&self, node_id: &str) -> bool {
        self.service_mappings.iter().any(|m| m.node_id == node_id)
    }

    /// Whether any status event has been logged for this node; used as the
    /// "already deployed" marker for exactly-once triggering.
    pub fn has_events(&self, node_id: &str) -> bool {
        self.deployment_log.iter().any(|e| e.node_id == node_id)
    }

    /// Whether the node has recorded a SUCCESS event
    pub fn has_succeeded(&self, node_id: &str) -> bool {
        self.deployment_log
            .iter()
            .any(|e| e.node_id == node_id && e.recorded_status == NodeStatus::Success)
    }

    /// Ids of nodes with an edge pointing at `node_id`
    pub fn predecessors<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a str> {
        self.edges
            .iter()
            .filter(move |e| e.target == node_id)
            .map(|e| e.source.as_str())
    }

    /// Ids of nodes `node_id` points at
    pub fn successors<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a str> {
        self.edges
            .iter()
            .filter(move |e| e.source == node_id)
            .map(|e| e.target.as_str())
    }

    /// Append a status event to the run log
    pub fn record_event(&mut self, node_id: &str, status: NodeStatus, at: DateTime<Utc>) {
        self.deployment_log.push(DeploymentEvent {
            node_id: node_id.to_string(),
            recorded_status: status,
            recorded_at: at,
        });
    }

    /// Append a service mapping; at most one mapping may exist per node
    pub fn record_mapping(&mut self, node_id: &str, service_id: &str) {
        if !self.has_mapping(node_id) {
            self.service_mappings.push(ServiceMapping {
                node_id: node_id.to_string(),
                service_id: service_id.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str) -> WorkflowEdge {
        WorkflowEdge {
            public_id: format!("wfe_{source}_{target}"),
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    fn run_with_edges(edges: Vec<WorkflowEdge>) -> WorkflowRun {
        WorkflowRun {
            public_id: "wfr_test".to_string(),
            workflow_id: "wf_test".to_string(),
            status: RunStatus::Running,
            date_started: Utc::now(),
            nodes: vec![],
            edges,
            service_mappings: vec![],
            deployment_log: vec![],
        }
    }

    #[test]
    fn adjacency_follows_edge_direction() {
        let run = run_with_edges(vec![edge("a", "b"), edge("a", "c"), edge("b", "c")]);

        // Query through a locally owned id; the iterators borrow it for as
        // long as they borrow the run.
        let join = String::from("c");
        let preds: Vec<&str> = run.predecessors(&join).collect();
        assert_eq!(preds, vec!["a", "b"]);

        let succs: Vec<&str> = run.successors("a").collect();
        assert_eq!(succs, vec!["b", "c"]);
        assert_eq!(run.successors(&join).count(), 0);
    }
}
