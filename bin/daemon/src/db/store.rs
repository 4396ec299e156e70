//! Postgres-backed implementation of the engine's store seam.

use async_trait::async_trait;
use crosswire_core::{FlowId, UserId};
use crosswire_engine::{FlowStore, StoreError};
use crosswire_flow::{ExecutionLog, Flow};
use crosswire_social::{Platform, SocialConnection};
use sqlx::PgPool;

use super::connection::ConnectionRepository;
use super::execution_log::ExecutionLogRepository;
use super::flow::FlowRepository;

/// [`FlowStore`] over PostgreSQL.
pub struct PgFlowStore {
    flows: FlowRepository,
    logs: ExecutionLogRepository,
    connections: ConnectionRepository,
}

impl PgFlowStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            flows: FlowRepository::new(pool.clone()),
            logs: ExecutionLogRepository::new(pool.clone()),
            connections: ConnectionRepository::new(pool),
        }
    }
}

/// Maps a sqlx error onto the engine's store error taxonomy.
fn store_error(e: sqlx::Error) -> StoreError {
    let message = e.to_string();
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::ConnectionFailed { message },
        sqlx::Error::Decode(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Decode { message },
        _ => StoreError::QueryFailed { message },
    }
}

#[async_trait]
impl FlowStore for PgFlowStore {
    async fn find_active_flows(&self) -> Result<Vec<Flow>, StoreError> {
        self.flows.find_active().await.map_err(store_error)
    }

    async fn get_flow(&self, flow_id: FlowId) -> Result<Option<Flow>, StoreError> {
        self.flows.find_by_id(flow_id).await.map_err(store_error)
    }

    async fn save_flow(&self, flow: &Flow) -> Result<(), StoreError> {
        self.flows.upsert(flow).await.map_err(store_error)
    }

    async fn delete_flow(&self, flow_id: FlowId) -> Result<bool, StoreError> {
        self.flows.delete(flow_id).await.map_err(store_error)
    }

    async fn create_execution_log(&self, log: &ExecutionLog) -> Result<(), StoreError> {
        self.logs.insert(log).await.map_err(store_error)
    }

    async fn save_execution_log(&self, log: &ExecutionLog) -> Result<(), StoreError> {
        self.logs.update(log).await.map_err(store_error)
    }

    async fn find_connection(
        &self,
        user_id: UserId,
        platform: Platform,
    ) -> Result<Option<SocialConnection>, StoreError> {
        self.connections
            .find_connected(user_id, platform)
            .await
            .map_err(store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_to_connection_failed() {
        let e = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(
            store_error(e),
            StoreError::ConnectionFailed { .. }
        ));
    }

    #[test]
    fn missing_columns_map_to_decode() {
        let e = sqlx::Error::ColumnNotFound("settings".to_string());
        assert!(matches!(store_error(e), StoreError::Decode { .. }));
    }

    #[test]
    fn other_errors_map_to_query_failed() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::QueryFailed { .. }
        ));
    }
}
