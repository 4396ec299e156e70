//! Flow model for the crosswire automation engine.
//!
//! This crate provides:
//!
//! - **Graph Model**: Flows as ordered node lists plus directed edges
//! - **Node Kinds**: Typed payloads for triggers, checks, actions, and delays
//! - **Settings & Stats**: Activation state and per-flow run counters
//! - **Execution Logs**: The durable record of each run
//! - **Validation**: Structural checks over the authored graph

pub mod definition;
pub mod edge;
pub mod error;
pub mod execution;
pub mod graph;
pub mod node;

pub use definition::{Flow, FlowSettings, FlowStats};
pub use edge::Edge;
pub use error::GraphError;
pub use execution::{DEFAULT_MAX_RETRIES, ExecutionLog, ExecutionStatus};
pub use graph::FlowGraph;
pub use node::{
    DelayUnit, FollowCondition, Node, NodeId, NodeKind, matching_keyword, split_keywords,
};
