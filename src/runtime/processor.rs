/// Event Processor: the run's execution driver
///
/// Invoked once per inbound deployment-status webhook; there is no other
/// scheduler tick. Each invocation appends the event to the run's log,
/// decides whether downstream nodes became eligible, and commits the whole
/// decision with a compare-and-swap on the run's version. A node is claimed
/// with a DEPLOYING log entry in the same write that records the triggering
/// event, which is what makes deployment triggering exactly-once under
/// concurrent, duplicate, or out-of-order delivery: the losing writer
/// reloads, sees the claim, and finds nothing eligible.

use crate::runtime::engine::RunEngine;
use crate::runtime::error::RunError;
use crate::runtime::types::{NodeStatus, RunStatus, WorkflowRun};
use chrono::{DateTime, Utc};

/// What a webhook delivery did to the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Run was already FAILED or COMPLETED; event dropped with no state
    /// change and no provider calls
    IgnoredTerminal,
    /// Event appended; `deployed` lists nodes whose services were created
    /// by this delivery
    Recorded {
        deployed: Vec<String>,
        run_status: RunStatus,
    },
}

impl RunEngine {
    /// Process one deployment-status event for a run
    ///
    /// Safe to call concurrently for the same run: the log append and the
    /// eligibility claims commit atomically under the version CAS, and a
    /// conflicting writer recomputes against the fresh state.
    pub async fn handle_deployment_event(
        &self,
        run_id: &str,
        service_id: &str,
        status: NodeStatus,
        timestamp: DateTime<Utc>,
    ) -> Result<EventOutcome, RunError> {
        let (run, eligible) = loop {
            let versioned = self
                .runs
                .get_run(run_id)
                .await?
                .ok_or_else(|| RunError::RunNotFound(run_id.to_string()))?;

            let mut run = versioned.run;
            if run.status.is_terminal() {
                tracing::debug!(
                    "🙈 Run {} is already {}, ignoring event for service {}",
                    run_id,
                    run.status.as_str(),
                    service_id
                );
                return Ok(EventOutcome::IgnoredTerminal);
            }

            let node_id = run
                .node_for_service(service_id)
                .ok_or_else(|| RunError::UnknownService {
                    service_id: service_id.to_string(),
                })?
                .to_string();

            run.record_event(&node_id, status, timestamp);

            let eligible = if status == NodeStatus::Success {
                eligible_successors(&run, &node_id)
            } else {
                vec![]
            };

            if eligible.is_empty() {
                run.status = next_run_status(&run, &node_id, status);
            } else {
                // Claim each eligible node inside the same conditional
                // write as the triggering event.
                let claimed_at = Utc::now();
                for candidate in &eligible {
                    run.record_event(candidate, NodeStatus::Deploying, claimed_at);
                }
            }

            if self.runs.try_update_run(&run, versioned.version).await? {
                break (run, eligible);
            }

            tracing::debug!("🔁 Lost run {} version race, recomputing event", run_id);
        };

        tracing::info!(
            "📥 Recorded {:?} for service {} on run {} ({} newly eligible)",
            status,
            service_id,
            run_id,
            eligible.len()
        );

        if eligible.is_empty() {
            return Ok(EventOutcome::Recorded {
                deployed: vec![],
                run_status: run.status,
            });
        }

        // The log commit above is durable; a provider failure below must
        // not disturb it.
        let credentials = self.credentials_for(&run.workflow_id).await?;
        for candidate in &eligible {
            let node = run.node(candidate).ok_or_else(|| {
                RunError::Storage(anyhow::anyhow!(
                    "run {} snapshot is missing node {}",
                    run.public_id,
                    candidate
                ))
            })?;

            let created = self.deploy_node(&credentials, &run, node).await?;
            self.runs
                .update_run(run_id, |r| r.record_mapping(candidate, &created.service_id))
                .await?;
        }

        Ok(EventOutcome::Recorded {
            deployed: eligible,
            run_status: run.status,
        })
    }
}

/// Topological-readiness check over the run's committed log
///
/// A successor of the just-succeeded node is eligible iff no status event
/// has ever been logged for it, no service exists for it yet, and every one
/// of its predecessors has recorded SUCCESS. Called after the triggering
/// event is appended, so the succeeded node counts as a satisfied
/// predecessor. The mapping check keeps nodes deployed at run start (before
/// their first webhook lands) from being claimed a second time.
fn eligible_successors(run: &WorkflowRun, succeeded: &str) -> Vec<String> {
    let mut eligible: Vec<String> = Vec::new();

    for candidate in run.successors(succeeded) {
        if eligible.iter().any(|e| e.as_str() == candidate) {
            continue;
        }
        if run.has_events(candidate) || run.has_mapping(candidate) {
            continue;
        }
        if run.predecessors(candidate).all(|p| run.has_succeeded(p)) {
            eligible.push(candidate.to_string());
        }
    }

    eligible
}

/// Terminal/continuation decision when an event unlocked nothing
fn next_run_status(run: &WorkflowRun, node_id: &str, status: NodeStatus) -> RunStatus {
    match status {
        NodeStatus::Failed => RunStatus::Failed,
        NodeStatus::Success
            if run
                .root_node()
                .is_some_and(|root| root.public_id == node_id) =>
        {
            RunStatus::Completed
        }
        // Other branches may still be in flight.
        _ => run.status,
    }
}
