/// Run-execution engine
///
/// Materializes workflow runs, advances them from deployment-status
/// webhooks, and shapes run state for display. The webhook handler is the
/// only scheduler tick; no background loop exists.

pub mod engine;
pub mod error;
pub mod materializer;
pub mod processor;
pub mod projection;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::RunEngine;
pub use error::RunError;
pub use processor::EventOutcome;
pub use projection::{project_run, RunView};
pub use storage::{RunStorage, VersionedRun};
pub use types::{DeploymentEvent, NodeStatus, RunStatus, ServiceMapping, WorkflowRun};
