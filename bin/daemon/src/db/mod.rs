//! Database access for the crosswire daemon.
//!
//! This module provides the Postgres persistence layer:
//! - Flow documents (nodes, edges, settings, and stats as JSONB)
//! - Execution log records
//! - Social platform connections
//!
//! [`PgFlowStore`] composes the per-table repositories into the engine's
//! [`FlowStore`](crosswire_engine::FlowStore) seam.

pub mod connection;
pub mod execution_log;
pub mod flow;
pub mod store;

pub use connection::ConnectionRepository;
pub use execution_log::ExecutionLogRepository;
pub use flow::FlowRepository;
pub use store::PgFlowStore;

/// Builds the decode error reported when a stored value cannot be turned
/// into its domain type.
pub(crate) fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}
