//! Core domain types for the crosswire automation platform.
//!
//! This crate provides the strongly-typed identifiers shared by every other
//! crate in the workspace.

pub mod id;

pub use id::{ConnectionId, ExecutionLogId, FlowId, ParseIdError, UserId};
