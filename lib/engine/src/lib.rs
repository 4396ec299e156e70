//! Automation engine for the crosswire platform.
//!
//! This crate turns social events into flow runs:
//!
//! - **Matching**: Events are checked against the registry of active flows
//! - **Queueing**: Each hit becomes a task in an unbounded FIFO queue
//! - **Execution**: A single worker drains the queue through the interpreter
//! - **Recording**: Every run writes an execution log and updates flow stats
//!
//! Storage and platform access sit behind the [`FlowStore`] and
//! `PlatformClient` traits, so the whole engine runs against in-memory
//! fakes in tests and against Postgres plus the Instagram API in
//! production.

pub mod engine;
pub mod error;
mod handlers;
pub mod interpreter;
pub mod matcher;
pub mod queue;
pub mod registry;
pub mod store;
pub mod worker;

pub use engine::{Engine, EngineHandle};
pub use error::{EngineError, FailureKind, NodeError};
pub use interpreter::FlowInterpreter;
pub use matcher::TriggerMatcher;
pub use queue::{Task, TaskQueue};
pub use registry::ActiveFlowRegistry;
pub use store::{FlowStore, MemoryFlowStore, StoreError};
pub use worker::{TaskRunner, Worker};
