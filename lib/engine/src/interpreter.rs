//! Node-by-node flow interpreter.
//!
//! One task becomes one run: load the flow, create a running execution
//! log, walk the graph from the entry trigger, then finalize the log and
//! the flow's stats. Node failures are caught here at the run boundary
//! and recorded on the log; they never escape [`FlowInterpreter::run`].
//!
//! Traversal is iterative and follows only the first outgoing edge of
//! each node, in the order edges were authored. A visited set cuts
//! cycles, so a miswired flow fails its run instead of spinning forever.

use crate::error::{EngineError, NodeError};
use crate::handlers;
use crate::queue::Task;
use crate::registry::ActiveFlowRegistry;
use crate::store::FlowStore;
use crate::worker::TaskRunner;
use async_trait::async_trait;
use crosswire_flow::{ExecutionLog, ExecutionStatus, Flow};
use crosswire_social::{PlatformClient, TriggerEvent};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Executes flows against the events that triggered them.
pub struct FlowInterpreter<S: FlowStore, C: PlatformClient> {
    store: Arc<S>,
    client: Arc<C>,
    registry: Arc<ActiveFlowRegistry>,
}

impl<S: FlowStore, C: PlatformClient> FlowInterpreter<S, C> {
    /// Creates an interpreter over the given store, client, and registry.
    pub fn new(store: Arc<S>, client: Arc<C>, registry: Arc<ActiveFlowRegistry>) -> Self {
        Self {
            store,
            client,
            registry,
        }
    }

    /// Runs one task to completion and returns the finished log.
    ///
    /// # Errors
    ///
    /// Returns an error only when no run could be recorded at all: the
    /// flow is gone or the store rejected the initial log insert. Every
    /// failure past that point is written to the log instead.
    pub async fn run(&self, task: Task) -> Result<ExecutionLog, EngineError> {
        let mut flow =
            self.store
                .get_flow(task.flow_id)
                .await?
                .ok_or(EngineError::FlowNotFound {
                    flow_id: task.flow_id,
                })?;

        let started = Instant::now();
        let trigger_data = serde_json::to_value(&task.event).unwrap_or(JsonValue::Null);
        let mut log = ExecutionLog::start(
            flow.id,
            flow.user_id,
            task.event.kind.clone(),
            trigger_data,
        );
        self.store.create_execution_log(&log).await?;

        let outcome = self.walk(&flow, &task.event, &mut log).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(result) => log.complete(result, elapsed_ms),
            Err(e) => {
                tracing::warn!(
                    flow_id = %flow.id,
                    log_id = %log.id,
                    failure_kind = e.kind().as_str(),
                    error = %e,
                    "flow run failed"
                );
                log.fail(e.to_string(), elapsed_ms);
            }
        }

        self.finalize(&mut flow, &log).await;
        Ok(log)
    }

    /// Walks the graph from the entry trigger, returning the last node's
    /// result.
    async fn walk(
        &self,
        flow: &Flow,
        event: &TriggerEvent,
        log: &mut ExecutionLog,
    ) -> Result<JsonValue, NodeError> {
        let entry = flow.entry_node().ok_or(NodeError::MissingTriggerNode)?;
        let mut visited = HashSet::new();
        let mut current = entry;

        loop {
            if !visited.insert(current.id.clone()) {
                return Err(NodeError::CycleDetected {
                    node_id: current.id.clone(),
                });
            }

            log.visit_node(current.id.clone());
            // Path updates are best effort; losing one must not kill the run.
            if let Err(e) = self.store.save_execution_log(log).await {
                tracing::warn!(log_id = %log.id, error = %e, "could not persist execution path");
            }

            let result = handlers::execute_node(
                self.store.as_ref(),
                self.client.as_ref(),
                flow.user_id,
                current,
                event,
            )
            .await?;

            let Some(edge) = flow.first_edge_from(&current.id) else {
                return Ok(result);
            };
            current = flow
                .node(&edge.target)
                .ok_or_else(|| NodeError::DanglingEdge {
                    edge_id: edge.id.clone(),
                    target: edge.target.clone(),
                })?;
        }
    }

    /// Persists the finished log, folds the outcome into the flow's
    /// stats, and syncs the registry with the flow's activation state.
    async fn finalize(&self, flow: &mut Flow, log: &ExecutionLog) {
        if let Err(e) = self.store.save_execution_log(log).await {
            tracing::warn!(log_id = %log.id, error = %e, "could not persist finished execution log");
        }

        flow.record_run(log.status == ExecutionStatus::Completed);
        if let Err(e) = self.store.save_flow(flow).await {
            tracing::warn!(flow_id = %flow.id, error = %e, "could not persist flow stats");
        }
        self.registry.refresh(flow);
    }
}

#[async_trait]
impl<S: FlowStore, C: PlatformClient> TaskRunner for FlowInterpreter<S, C> {
    async fn run_task(&self, task: Task) -> Result<ExecutionLog, EngineError> {
        self.run(task).await
    }
}
