/// Run Projection: read-side shaping of run state for display
///
/// Produces a display-ready view of a run: per-node event history sorted
/// newest-first, the latest status per node, and a flattened chronological
/// activity feed across all nodes. Pure over the run; nothing here mutates.

use crate::runtime::types::{NodeStatus, RunStatus, WorkflowRun};
use crate::workflow::types::NodeVariable;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display-ready view of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunView {
    pub public_id: String,
    pub workflow_id: String,
    pub status: RunStatus,
    pub date_started: DateTime<Utc>,
    pub nodes: Vec<RunNodeView>,
    /// All events across all nodes, newest first
    pub activity: Vec<ActivityEntry>,
}

/// One snapshotted node with its deployment history
#[derive(Debug, Clone, Serialize)]
pub struct RunNodeView {
    pub public_id: String,
    pub name: String,
    pub is_root: bool,
    pub is_input: bool,
    pub container_image: Option<String>,
    pub variables: Vec<NodeVariable>,
    /// External service created for this node, if any yet
    pub service_id: Option<String>,
    /// First entry of `history`; None renders as not-yet-started
    pub latest_status: Option<NodeStatus>,
    /// This node's events, newest first
    pub history: Vec<RunNodeEvent>,
}

/// One status event in a node's history
#[derive(Debug, Clone, Serialize)]
pub struct RunNodeEvent {
    pub recorded_status: NodeStatus,
    pub recorded_at: DateTime<Utc>,
}

/// One line of the cross-node activity feed
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub node_id: String,
    pub node_name: String,
    pub recorded_status: NodeStatus,
    pub recorded_at: DateTime<Utc>,
}

/// Shape a run for display
pub fn project_run(run: &WorkflowRun) -> RunView {
    let nodes = run
        .nodes
        .iter()
        .map(|node| {
            let mut history: Vec<RunNodeEvent> = run
                .deployment_log
                .iter()
                .filter(|e| e.node_id == node.public_id)
                .map(|e| RunNodeEvent {
                    recorded_status: e.recorded_status,
                    recorded_at: e.recorded_at,
                })
                .collect();
            history.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));

            let service_id = run
                .service_mappings
                .iter()
                .find(|m| m.node_id == node.public_id)
                .map(|m| m.service_id.clone());

            RunNodeView {
                public_id: node.public_id.clone(),
                name: node.name.clone(),
                is_root: node.is_root,
                is_input: node.is_input,
                container_image: node.container_image.clone(),
                variables: node.variables.clone(),
                service_id,
                latest_status: history.first().map(|e| e.recorded_status),
                history,
            }
        })
        .collect();

    let mut activity: Vec<ActivityEntry> = run
        .deployment_log
        .iter()
        .map(|e| ActivityEntry {
            node_id: e.node_id.clone(),
            node_name: run
                .node(&e.node_id)
                .map(|n| n.name.clone())
                .unwrap_or_else(|| e.node_id.clone()),
            recorded_status: e.recorded_status,
            recorded_at: e.recorded_at,
        })
        .collect();
    activity.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));

    RunView {
        public_id: run.public_id.clone(),
        workflow_id: run.workflow_id.clone(),
        status: run.status,
        date_started: run.date_started,
        nodes,
        activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::types::{DeploymentEvent, ServiceMapping};
    use crate::workflow::types::WorkflowNode;
    use chrono::Duration;

    fn node(id: &str, is_root: bool, is_input: bool) -> WorkflowNode {
        let now = Utc::now();
        WorkflowNode {
            public_id: id.to_string(),
            name: format!("task {id}"),
            created_at: now,
            updated_at: now,
            container_image: Some("busybox:latest".to_string()),
            variables: vec![],
            is_root,
            is_input,
        }
    }

    fn fixture() -> WorkflowRun {
        let start = Utc::now() - Duration::minutes(10);
        WorkflowRun {
            public_id: "wfr_1".to_string(),
            workflow_id: "wf_1".to_string(),
            status: RunStatus::Running,
            date_started: start,
            nodes: vec![node("a", false, true), node("b", true, false)],
            edges: vec![],
            service_mappings: vec![ServiceMapping {
                node_id: "a".to_string(),
                service_id: "svc_0".to_string(),
            }],
            deployment_log: vec![
                DeploymentEvent {
                    node_id: "a".to_string(),
                    recorded_status: NodeStatus::Deploying,
                    recorded_at: start + Duration::seconds(1),
                },
                DeploymentEvent {
                    node_id: "a".to_string(),
                    recorded_status: NodeStatus::Success,
                    recorded_at: start + Duration::seconds(30),
                },
            ],
        }
    }

    #[test]
    fn node_history_is_newest_first_and_latest_is_first() {
        let view = project_run(&fixture());

        let a = &view.nodes[0];
        assert_eq!(a.latest_status, Some(NodeStatus::Success));
        assert_eq!(a.history.len(), 2);
        assert_eq!(a.history[0].recorded_status, NodeStatus::Success);
        assert_eq!(a.history[1].recorded_status, NodeStatus::Deploying);
        assert_eq!(a.service_id.as_deref(), Some("svc_0"));
    }

    #[test]
    fn nodes_without_events_render_as_not_started() {
        let view = project_run(&fixture());

        let b = &view.nodes[1];
        assert_eq!(b.latest_status, None);
        assert!(b.history.is_empty());
        assert_eq!(b.service_id, None);
    }

    #[test]
    fn activity_feed_is_flattened_newest_first() {
        let view = project_run(&fixture());

        assert_eq!(view.activity.len(), 2);
        assert_eq!(view.activity[0].recorded_status, NodeStatus::Success);
        assert_eq!(view.activity[1].recorded_status, NodeStatus::Deploying);
        assert_eq!(view.activity[0].node_name, "task a");
        assert!(view.activity[0].recorded_at >= view.activity[1].recorded_at);
    }

    #[test]
    fn projection_does_not_mutate_the_run() {
        let run = fixture();
        let log_before = run.deployment_log.len();
        let _ = project_run(&run);
        assert_eq!(run.deployment_log.len(), log_before);
        assert_eq!(run.status, RunStatus::Running);
    }
}
