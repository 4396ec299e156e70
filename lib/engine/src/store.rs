//! Persistence seam for flows, execution logs, and connections.
//!
//! The engine only talks to storage through [`FlowStore`], so the
//! interpreter can be tested against [`MemoryFlowStore`] while production
//! wires in a database-backed implementation.

use async_trait::async_trait;
use crosswire_core::{FlowId, UserId};
use crosswire_flow::{ExecutionLog, Flow};
use crosswire_social::{Platform, SocialConnection};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Errors from flow store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Could not reach the backing store.
    ConnectionFailed { message: String },
    /// A read or write against the store failed.
    QueryFailed { message: String },
    /// A stored row could not be decoded into a domain type.
    Decode { message: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed { message } => {
                write!(f, "store connection failed: {message}")
            }
            Self::QueryFailed { message } => write!(f, "store query failed: {message}"),
            Self::Decode { message } => write!(f, "stored row could not be decoded: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Trait for flow, execution log, and connection persistence.
#[async_trait]
pub trait FlowStore: Send + Sync {
    /// Returns every flow whose settings mark it active.
    async fn find_active_flows(&self) -> Result<Vec<Flow>, StoreError>;

    /// Fetches a flow by id, or `None` if it does not exist.
    async fn get_flow(&self, flow_id: FlowId) -> Result<Option<Flow>, StoreError>;

    /// Inserts or replaces a flow.
    async fn save_flow(&self, flow: &Flow) -> Result<(), StoreError>;

    /// Deletes a flow. Returns whether it existed.
    async fn delete_flow(&self, flow_id: FlowId) -> Result<bool, StoreError>;

    /// Inserts a new execution log record.
    async fn create_execution_log(&self, log: &ExecutionLog) -> Result<(), StoreError>;

    /// Updates an existing execution log record.
    async fn save_execution_log(&self, log: &ExecutionLog) -> Result<(), StoreError>;

    /// Finds the user's connected account for a platform.
    ///
    /// Disconnected accounts are filtered out; callers never see them.
    async fn find_connection(
        &self,
        user_id: UserId,
        platform: Platform,
    ) -> Result<Option<SocialConnection>, StoreError>;
}

/// In-memory [`FlowStore`] backed by mutex-guarded maps.
///
/// Keeps execution logs in creation order so tests can assert on the
/// sequence of runs. `set_log_save_failure` makes log updates fail, which
/// exercises the interpreter's best-effort bookkeeping paths.
#[derive(Default)]
pub struct MemoryFlowStore {
    flows: Mutex<HashMap<FlowId, Flow>>,
    connections: Mutex<Vec<SocialConnection>>,
    logs: Mutex<Vec<ExecutionLog>>,
    fail_log_saves: AtomicBool,
}

impl MemoryFlowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a connection for lookup by `find_connection`.
    pub fn add_connection(&self, connection: SocialConnection) {
        if let Ok(mut connections) = self.connections.lock() {
            connections.push(connection);
        }
    }

    /// When set, `save_execution_log` fails with a simulated error.
    /// Inserts through `create_execution_log` still succeed.
    pub fn set_log_save_failure(&self, fail: bool) {
        self.fail_log_saves.store(fail, Ordering::SeqCst);
    }

    /// Returns all execution logs in creation order.
    #[must_use]
    pub fn logs(&self) -> Vec<ExecutionLog> {
        self.logs.lock().map(|logs| logs.clone()).unwrap_or_default()
    }

    fn locked<'a, T>(mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>, StoreError> {
        mutex.lock().map_err(|_| StoreError::QueryFailed {
            message: "store mutex poisoned".to_string(),
        })
    }

    fn check_log_saves(&self) -> Result<(), StoreError> {
        if self.fail_log_saves.load(Ordering::SeqCst) {
            return Err(StoreError::QueryFailed {
                message: "simulated log write failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FlowStore for MemoryFlowStore {
    async fn find_active_flows(&self) -> Result<Vec<Flow>, StoreError> {
        let flows = Self::locked(&self.flows)?;
        Ok(flows.values().filter(|f| f.is_active()).cloned().collect())
    }

    async fn get_flow(&self, flow_id: FlowId) -> Result<Option<Flow>, StoreError> {
        let flows = Self::locked(&self.flows)?;
        Ok(flows.get(&flow_id).cloned())
    }

    async fn save_flow(&self, flow: &Flow) -> Result<(), StoreError> {
        let mut flows = Self::locked(&self.flows)?;
        flows.insert(flow.id, flow.clone());
        Ok(())
    }

    async fn delete_flow(&self, flow_id: FlowId) -> Result<bool, StoreError> {
        let mut flows = Self::locked(&self.flows)?;
        Ok(flows.remove(&flow_id).is_some())
    }

    async fn create_execution_log(&self, log: &ExecutionLog) -> Result<(), StoreError> {
        let mut logs = Self::locked(&self.logs)?;
        logs.push(log.clone());
        Ok(())
    }

    async fn save_execution_log(&self, log: &ExecutionLog) -> Result<(), StoreError> {
        self.check_log_saves()?;
        let mut logs = Self::locked(&self.logs)?;
        match logs.iter_mut().find(|existing| existing.id == log.id) {
            Some(existing) => *existing = log.clone(),
            None => logs.push(log.clone()),
        }
        Ok(())
    }

    async fn find_connection(
        &self,
        user_id: UserId,
        platform: Platform,
    ) -> Result<Option<SocialConnection>, StoreError> {
        let connections = Self::locked(&self.connections)?;
        Ok(connections
            .iter()
            .find(|c| c.user_id == user_id && c.platform == platform && c.is_connected)
            .cloned())
    }
}
