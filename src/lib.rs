/// TinyFlow: webhook-driven workflow run engine
///
/// Workflows are DAGs of containerized tasks. Starting a run deploys the
/// input tasks as remote services via a Railway-compatible provider;
/// inbound deployment-status webhooks then advance execution node by node
/// until the root task succeeds.

// Core configuration and setup
pub mod config;

// Workflow definition layer - types, graph validation, document storage
pub mod workflow;

// Run-execution engine - materializer, event processor, projections
pub mod runtime;

// Deployment provider collaborator - service creation via GraphQL
pub mod deploy;

// HTTP API layer - workflow/run endpoints and the deployment webhook
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use deploy::DeploymentClient;
pub use runtime::{EventOutcome, NodeStatus, RunEngine, RunError, RunStatus, RunView, WorkflowRun};
pub use server::start_server;
pub use workflow::{Workflow, WorkflowEdge, WorkflowNode};
