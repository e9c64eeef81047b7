/// Graph Validator: pure structural checks on a workflow's node/edge set
///
/// A workflow graph is runnable when it is a valid DAG (connected root sink,
/// connected input sources, no directed cycles) and every task node carries
/// a container image. Validity is derived at query time, never stored.

use crate::workflow::types::{WorkflowEdge, WorkflowNode};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// The specific rule a graph failed, reported to the run-start caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphViolation {
    #[error("workflow has no nodes")]
    Empty,
    #[error("edge {edge} references unknown node {node}")]
    UnknownEndpoint { edge: String, node: String },
    #[error("workflow has no root node connected to the graph")]
    NoSink,
    #[error("workflow has no input node")]
    NoInput,
    #[error("input node {node} is not connected to any edge")]
    DisconnectedInput { node: String },
    #[error("input node {node} has an incoming edge")]
    InputHasIncomingEdge { node: String },
    #[error("workflow contains a cycle through node {node}")]
    Cycle { node: String },
}

/// Validate the node/edge set, reporting the first violated rule.
///
/// A single node that is both root and input with no edges is the degenerate
/// one-task workflow and validates without any edge requirement.
pub fn validate_graph(
    nodes: &[WorkflowNode],
    edges: &[WorkflowEdge],
) -> Result<(), GraphViolation> {
    if nodes.is_empty() {
        return Err(GraphViolation::Empty);
    }

    let node_ids: HashSet<&str> = nodes.iter().map(|n| n.public_id.as_str()).collect();
    for edge in edges {
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                return Err(GraphViolation::UnknownEndpoint {
                    edge: edge.public_id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
    }

    // Degenerate single-task workflow: one node acting as both input and
    // root needs no edges.
    if nodes.len() == 1 && edges.is_empty() {
        let only = &nodes[0];
        if only.is_root && only.is_input {
            return Ok(());
        }
    }

    let connected = |node: &WorkflowNode| {
        edges
            .iter()
            .any(|e| e.source == node.public_id || e.target == node.public_id)
    };

    if !nodes.iter().any(|n| n.is_root && connected(n)) {
        return Err(GraphViolation::NoSink);
    }

    if !nodes.iter().any(|n| n.is_input) {
        return Err(GraphViolation::NoInput);
    }

    if let Some(orphan) = nodes.iter().find(|n| n.is_input && !connected(n)) {
        return Err(GraphViolation::DisconnectedInput {
            node: orphan.public_id.clone(),
        });
    }

    // Input nodes are pure sources. One that is also an edge target would be
    // deployed both at run start and again when its predecessor succeeds.
    if let Some(fed) = nodes
        .iter()
        .find(|n| n.is_input && edges.iter().any(|e| e.target == n.public_id))
    {
        return Err(GraphViolation::InputHasIncomingEdge {
            node: fed.public_id.clone(),
        });
    }

    detect_cycle(nodes, edges)
}

/// Predicate form of [`validate_graph`]
pub fn is_valid_dag(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> bool {
    validate_graph(nodes, edges).is_ok()
}

/// First node lacking a non-empty container image, if any; run start reports
/// the offending node, queries only need the predicate form.
pub fn first_missing_image(nodes: &[WorkflowNode]) -> Option<&WorkflowNode> {
    nodes
        .iter()
        .find(|n| n.container_image.as_deref().is_none_or(str::is_empty))
}

/// Every task node must carry a non-empty container image before a run may
/// start; a graph can be a valid DAG without being runnable.
pub fn is_runnable(nodes: &[WorkflowNode]) -> bool {
    first_missing_image(nodes).is_none()
}

/// Per-node depth-first traversal with a recursion-stack set; revisiting a
/// node still on the active stack signals a cycle.
fn detect_cycle(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Result<(), GraphViolation> {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: HashSet<&str> = HashSet::new();

    for node in nodes {
        if let Some(on_cycle) = visit(node.public_id.as_str(), &adjacency, &mut visited, &mut stack)
        {
            return Err(GraphViolation::Cycle {
                node: on_cycle.to_string(),
            });
        }
    }

    Ok(())
}

fn visit<'a>(
    node: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    stack: &mut HashSet<&'a str>,
) -> Option<&'a str> {
    if stack.contains(node) {
        return Some(node);
    }
    if !visited.insert(node) {
        return None;
    }
    stack.insert(node);

    if let Some(successors) = adjacency.get(node) {
        for next in successors {
            if let Some(on_cycle) = visit(next, adjacency, visited, stack) {
                return Some(on_cycle);
            }
        }
    }

    stack.remove(node);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn node(id: &str, is_root: bool, is_input: bool) -> WorkflowNode {
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

    fn edge(source: &str, target: &str) -> WorkflowEdge {
        WorkflowEdge {
            public_id: format!("wfe_{source}_{target}"),
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn empty_graph_is_invalid() {
        assert_eq!(validate_graph(&[], &[]), Err(GraphViolation::Empty));
    }

    #[test]
    fn linear_chain_is_valid() {
        let nodes = [node("a", false, true), node("b", false, false), node("c", true, false)];
        let edges = [edge("a", "b"), edge("b", "c")];
        assert!(is_valid_dag(&nodes, &edges));
    }

    #[test]
    fn back_edge_makes_chain_invalid() {
        let nodes = [node("a", false, true), node("b", false, false), node("c", true, false)];
        let edges = [edge("a", "b"), edge("b", "c"), edge("c", "b")];
        assert!(matches!(
            validate_graph(&nodes, &edges),
            Err(GraphViolation::Cycle { .. })
        ));
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let nodes = [node("a", false, true), node("b", true, false)];
        let edges = [edge("a", "b"), edge("b", "b")];
        assert!(matches!(
            validate_graph(&nodes, &edges),
            Err(GraphViolation::Cycle { .. })
        ));
    }

    #[test]
    fn disconnected_input_is_invalid() {
        let nodes = [
            node("a", false, true),
            node("lonely", false, true),
            node("b", true, false),
        ];
        let edges = [edge("a", "b")];
        assert_eq!(
            validate_graph(&nodes, &edges),
            Err(GraphViolation::DisconnectedInput {
                node: "lonely".to_string()
            })
        );
    }

    #[test]
    fn unconnected_root_is_invalid() {
        let nodes = [node("a", false, true), node("b", false, false), node("c", true, false)];
        let edges = [edge("a", "b")];
        assert_eq!(validate_graph(&nodes, &edges), Err(GraphViolation::NoSink));
    }

    #[test]
    fn missing_input_flag_is_invalid() {
        let nodes = [node("a", false, false), node("b", true, false)];
        let edges = [edge("a", "b")];
        assert_eq!(validate_graph(&nodes, &edges), Err(GraphViolation::NoInput));
    }

    #[test]
    fn edge_to_unknown_node_is_invalid() {
        let nodes = [node("a", false, true), node("b", true, false)];
        let edges = [edge("a", "ghost")];
        assert!(matches!(
            validate_graph(&nodes, &edges),
            Err(GraphViolation::UnknownEndpoint { .. })
        ));
    }

    #[test]
    fn root_and_input_singleton_is_valid() {
        let nodes = [node("solo", true, true)];
        assert!(is_valid_dag(&nodes, &[]));
    }

    #[test]
    fn singleton_without_both_roles_is_invalid() {
        assert!(!is_valid_dag(&[node("solo", true, false)], &[]));
        assert!(!is_valid_dag(&[node("solo", false, true)], &[]));
    }

    #[test]
    fn diamond_is_valid() {
        let nodes = [
            node("a", false, true),
            node("b", false, false),
            node("c", false, false),
            node("d", true, false),
        ];
        let edges = [edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")];
        assert!(is_valid_dag(&nodes, &edges));
    }

    #[test]
    fn input_node_with_incoming_edge_is_invalid() {
        let nodes = [
            node("a", false, true),
            node("x", false, true),
            node("b", true, false),
        ];
        let edges = [edge("a", "x"), edge("x", "b")];
        assert_eq!(
            validate_graph(&nodes, &edges),
            Err(GraphViolation::InputHasIncomingEdge {
                node: "x".to_string()
            })
        );
    }

    #[test]
    fn runnability_requires_images_on_every_node() {
        let mut nodes = vec![node("a", false, true), node("b", true, false)];
        assert!(is_runnable(&nodes));
        assert!(first_missing_image(&nodes).is_none());

        nodes[1].container_image = None;
        assert!(!is_runnable(&nodes));
        assert_eq!(first_missing_image(&nodes).unwrap().public_id, "b");

        nodes[1].container_image = Some(String::new());
        assert!(!is_runnable(&nodes));
    }
}
