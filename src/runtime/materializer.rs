/// Run Materializer
///
/// Snapshots a validated workflow into an immutable run record and deploys
/// its input nodes. The run is persisted as PREPARING before the first
/// provider call so that status webhooks arriving mid-start already find
/// their run, and flips to RUNNING once every input deployment is recorded.

use crate::runtime::engine::RunEngine;
use crate::runtime::error::RunError;
use crate::runtime::types::{RunStatus, WorkflowRun};
use crate::workflow::graph::{first_missing_image, validate_graph};
use crate::workflow::types::workflow_run_id;
use chrono::Utc;

impl RunEngine {
    /// Materialize and start a run for the given workflow
    ///
    /// Fails with the specific graph violation or the first node missing a
    /// container image before anything is persisted. A provider failure
    /// while deploying input nodes marks the run FAILED and is returned as
    /// [`RunError::DeploymentFailed`]; services created before the failure
    /// are not rolled back.
    pub async fn start_run(&self, workflow_id: &str) -> Result<WorkflowRun, RunError> {
        let workflow = self
            .workflows
            .get_workflow(workflow_id)
            .await?
            .ok_or_else(|| RunError::WorkflowNotFound(workflow_id.to_string()))?;

        validate_graph(&workflow.nodes, &workflow.edges)?;

        if let Some(missing) = first_missing_image(&workflow.nodes) {
            return Err(RunError::MissingImage {
                node: missing.public_id.clone(),
            });
        }

        let run = WorkflowRun {
            public_id: workflow_run_id(),
            workflow_id: workflow.public_id.clone(),
            status: RunStatus::Preparing,
            date_started: Utc::now(),
            nodes: workflow.nodes.clone(),
            edges: workflow.edges.clone(),
            service_mappings: vec![],
            deployment_log: vec![],
        };

        tracing::info!(
            "🏁 Materialized run {} for workflow {} ({} nodes, {} edges)",
            run.public_id,
            workflow.public_id,
            run.nodes.len(),
            run.edges.len()
        );

        self.runs.insert_run(&run).await?;

        let credentials = crate::deploy::ProviderCredentials {
            api_key: workflow.api_key.clone(),
            project_id: workflow.project_id.clone(),
        };

        for node in run.nodes.iter().filter(|n| n.is_input) {
            match self.deploy_node(&credentials, &run, node).await {
                Ok(created) => {
                    self.runs
                        .update_run(&run.public_id, |r| {
                            r.record_mapping(&node.public_id, &created.service_id)
                        })
                        .await?;
                }
                Err(err) => {
                    tracing::warn!(
                        "❌ Input deployment failed for run {}, marking run FAILED: {}",
                        run.public_id,
                        err
                    );
                    self.runs
                        .update_run(&run.public_id, |r| r.status = RunStatus::Failed)
                        .await?;
                    return Err(err);
                }
            }
        }

        // A degenerate single-node run can already be terminal here if its
        // webhook raced the start; never resurrect it.
        let run = self
            .runs
            .update_run(&run.public_id, |r| {
                if !r.status.is_terminal() {
                    r.status = RunStatus::Running;
                }
            })
            .await?;

        tracing::info!(
            "▶️ Run {} is {} with {} input deployments",
            run.public_id,
            run.status.as_str(),
            run.service_mappings.len()
        );

        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::error::RunError;
    use crate::runtime::testing::{harness, link, seed_workflow, task};
    use crate::runtime::types::RunStatus;
    use crate::workflow::graph::GraphViolation;

    #[tokio::test]
    async fn starting_a_run_deploys_only_input_nodes() {
        let h = harness().await;
        let wf = seed_workflow(
            &h,
            vec![task("a", false, true), task("b", false, false), task("c", true, false)],
            vec![link("a", "b"), link("b", "c")],
        )
        .await;

        let run = h.engine.start_run(&wf).await.unwrap();

        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(h.deployments.created_count(), 1);
        assert_eq!(h.deployments.created_for("a"), 1);
        assert_eq!(run.service_mappings.len(), 1);
        assert_eq!(run.service_mappings[0].node_id, "a");
        assert!(run.deployment_log.is_empty());
    }

    #[tokio::test]
    async fn run_snapshot_matches_workflow_graph() {
        let h = harness().await;
        let wf = seed_workflow(
            &h,
            vec![task("a", false, true), task("b", true, false)],
            vec![link("a", "b")],
        )
        .await;

        let run = h.engine.start_run(&wf).await.unwrap();

        assert_eq!(run.workflow_id, wf);
        assert_eq!(run.nodes.len(), 2);
        assert_eq!(run.edges.len(), 1);
    }

    #[tokio::test]
    async fn cyclic_workflow_is_rejected_before_any_deployment() {
        let h = harness().await;
        let wf = seed_workflow(
            &h,
            vec![
                task("a", false, true),
                task("b", false, false),
                task("c", true, false),
            ],
            vec![link("a", "b"), link("b", "c"), link("c", "b")],
        )
        .await;

        let err = h.engine.start_run(&wf).await.unwrap_err();
        assert!(matches!(
            err,
            RunError::GraphInvalid(GraphViolation::Cycle { .. })
        ));
        assert_eq!(h.deployments.created_count(), 0);
        assert!(h.runs.list_runs(&wf).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn node_without_image_blocks_run_start() {
        let h = harness().await;
        let mut sink = task("b", true, false);
        sink.container_image = None;
        let wf = seed_workflow(&h, vec![task("a", false, true), sink], vec![link("a", "b")]).await;

        let err = h.engine.start_run(&wf).await.unwrap_err();
        assert!(matches!(err, RunError::MissingImage { node } if node == "b"));
        assert_eq!(h.deployments.created_count(), 0);
    }

    #[tokio::test]
    async fn unknown_workflow_is_reported() {
        let h = harness().await;
        let err = h.engine.start_run("wf_ghost").await.unwrap_err();
        assert!(matches!(err, RunError::WorkflowNotFound(_)));
    }

    #[tokio::test]
    async fn input_deployment_failure_marks_run_failed() {
        let h = harness().await;
        let wf = seed_workflow(
            &h,
            vec![
                task("a", false, true),
                task("x", false, true),
                task("b", true, false),
            ],
            vec![link("a", "b"), link("x", "b")],
        )
        .await;
        h.deployments.fail_node("x");

        let err = h.engine.start_run(&wf).await.unwrap_err();
        assert!(matches!(err, RunError::DeploymentFailed { .. }));

        let runs = h.runs.list_runs(&wf).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Failed);
        // "a" deployed before "x" failed; its service is not rolled back.
        assert_eq!(h.deployments.created_for("a"), 1);
    }
}
