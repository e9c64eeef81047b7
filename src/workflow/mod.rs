/// Workflow definition layer
///
/// Type definitions for workflow DAGs, the pure graph validator, and the
/// SQLite document store backing them.

pub mod graph;
pub mod storage;
pub mod types;

pub use graph::{first_missing_image, is_runnable, is_valid_dag, validate_graph, GraphViolation};
pub use storage::{WorkflowMetadata, WorkflowStorage};
pub use types::{NodeVariable, Workflow, WorkflowEdge, WorkflowNode};
