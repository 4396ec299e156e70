//! The automation engine facade.
//!
//! [`Engine`] owns every moving part: the active-flow registry, the
//! trigger matcher, the task queue, the worker, and the interpreter.
//! Callers hand it a store and a platform client, load the active flows,
//! and feed it events. Matching and enqueueing are synchronous; execution
//! happens when the background worker drains the queue, or on demand
//! through [`Engine::drain_pending`].

use crate::error::EngineError;
use crate::interpreter::FlowInterpreter;
use crate::matcher::TriggerMatcher;
use crate::queue::{Task, TaskQueue};
use crate::registry::ActiveFlowRegistry;
use crate::store::FlowStore;
use crate::worker::Worker;
use crosswire_core::FlowId;
use crosswire_social::{PlatformClient, TriggerEvent};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Coordinates matching, queueing, and execution of flows.
pub struct Engine<S: FlowStore, C: PlatformClient> {
    store: Arc<S>,
    registry: Arc<ActiveFlowRegistry>,
    queue: Arc<TaskQueue>,
    matcher: TriggerMatcher,
    worker: Worker<FlowInterpreter<S, C>>,
}

impl<S: FlowStore + 'static, C: PlatformClient + 'static> Engine<S, C> {
    /// Creates an engine over the given store and platform client.
    pub fn new(store: Arc<S>, client: Arc<C>) -> Self {
        let registry = Arc::new(ActiveFlowRegistry::new());
        let queue = Arc::new(TaskQueue::new());
        let interpreter = Arc::new(FlowInterpreter::new(
            Arc::clone(&store),
            client,
            Arc::clone(&registry),
        ));
        let worker = Worker::new(Arc::clone(&queue), interpreter);
        let matcher = TriggerMatcher::new(Arc::clone(&registry));

        Self {
            store,
            registry,
            queue,
            matcher,
            worker,
        }
    }

    /// Loads every active flow from the store into the registry.
    ///
    /// Returns the number of flows now registered. Called once on startup
    /// and safe to call again to rebuild the working set.
    pub async fn load_active_flows(&self) -> Result<usize, EngineError> {
        let flows = self.store.find_active_flows().await?;
        let count = flows.len();
        self.registry.replace_all(flows);
        tracing::info!(count, "loaded active flows");
        Ok(count)
    }

    /// Spawns the background worker and returns a handle for stopping it.
    pub fn start(&self) -> EngineHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = self.worker.clone();
        let handle = tokio::spawn(worker.run(shutdown_rx));
        tracing::info!("engine worker started");

        EngineHandle {
            shutdown: shutdown_tx,
            worker: handle,
        }
    }

    /// Matches an event against the registry and enqueues a task per hit.
    ///
    /// Returns how many flows were enqueued. Zero is normal: most events
    /// match nothing.
    pub fn trigger_automation(&self, event: &TriggerEvent) -> usize {
        let tasks = self.matcher.match_event(event);
        let matched = tasks.len();
        for task in tasks {
            self.queue.enqueue(task);
        }
        if matched > 0 {
            tracing::debug!(
                matched,
                platform = %event.platform,
                kind = %event.kind,
                "event matched flows"
            );
        }
        matched
    }

    /// Enqueues a run for one specific flow, bypassing trigger matching.
    ///
    /// The flow's own trigger node still re-validates against the event
    /// when the run executes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::FlowNotFound`] if the flow does not exist.
    pub async fn trigger_flow(
        &self,
        flow_id: FlowId,
        event: TriggerEvent,
    ) -> Result<(), EngineError> {
        let flow = self
            .store
            .get_flow(flow_id)
            .await?
            .ok_or(EngineError::FlowNotFound { flow_id })?;
        self.queue.enqueue(Task::new(flow.id, flow.user_id, event));
        Ok(())
    }

    /// Marks a flow active and registers it for matching.
    pub async fn activate_flow(&self, flow_id: FlowId) -> Result<(), EngineError> {
        self.set_flow_active(flow_id, true).await
    }

    /// Marks a flow inactive and removes it from matching.
    pub async fn deactivate_flow(&self, flow_id: FlowId) -> Result<(), EngineError> {
        self.set_flow_active(flow_id, false).await
    }

    async fn set_flow_active(&self, flow_id: FlowId, active: bool) -> Result<(), EngineError> {
        let mut flow = self
            .store
            .get_flow(flow_id)
            .await?
            .ok_or(EngineError::FlowNotFound { flow_id })?;
        flow.set_active(active);
        self.store.save_flow(&flow).await?;
        self.registry.refresh(&flow);
        tracing::info!(flow_id = %flow_id, active, "flow activation changed");
        Ok(())
    }

    /// Deletes a flow from the store and the registry.
    ///
    /// Returns whether the flow existed. Tasks already queued for it will
    /// be dropped with a warning when they drain.
    pub async fn remove_flow(&self, flow_id: FlowId) -> Result<bool, EngineError> {
        let existed = self.store.delete_flow(flow_id).await?;
        self.registry.remove(flow_id);
        Ok(existed)
    }

    /// Re-reads one flow from the store and syncs the registry to it.
    ///
    /// Picks up edits made outside this engine. A flow that no longer
    /// exists is simply unregistered.
    pub async fn refresh_flow(&self, flow_id: FlowId) -> Result<(), EngineError> {
        match self.store.get_flow(flow_id).await? {
            Some(flow) => self.registry.refresh(&flow),
            None => {
                self.registry.remove(flow_id);
            }
        }
        Ok(())
    }

    /// Drains the queue on the caller's task instead of the worker's.
    ///
    /// Returns the number of tasks processed. Intended for callers that
    /// have not spawned the background worker and want deterministic
    /// completion, e.g. command-line tools and tests.
    pub async fn drain_pending(&self) -> usize {
        self.worker.drain().await
    }

    /// Number of tasks waiting in the queue.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Whether a drain pass is currently running.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.queue.is_draining()
    }

    /// Number of flows currently registered for matching.
    #[must_use]
    pub fn active_flow_count(&self) -> usize {
        self.registry.len()
    }
}

/// Handle to a running engine worker.
pub struct EngineHandle {
    shutdown: watch::Sender<bool>,
    worker: JoinHandle<()>,
}

impl EngineHandle {
    /// Signals the worker to stop and waits for it to finish.
    ///
    /// The worker drains any tasks enqueued before the signal on its way
    /// out.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.worker.await {
            tracing::warn!(error = %e, "worker task did not shut down cleanly");
        }
    }
}
