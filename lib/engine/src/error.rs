//! Errors produced while interpreting a flow run.
//!
//! Node handlers and the graph walk return [`NodeError`]; the interpreter
//! catches every variant at the run boundary and records its `Display`
//! output verbatim on the execution log. [`EngineError`] covers the failures
//! that happen before a run exists, such as a missing flow.

use crate::store::StoreError;
use crosswire_core::FlowId;
use crosswire_flow::{FollowCondition, NodeId};
use crosswire_social::{Platform, PlatformError};

/// Broad classification of a run failure, used for structured logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The flow definition or event payload was unusable.
    Validation,
    /// An external dependency (connection, platform API) was unavailable.
    ExternalDependency,
    /// A trigger or condition re-check did not hold for this event.
    Match,
}

impl FailureKind {
    /// Returns the lowercase name used in log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::ExternalDependency => "external_dependency",
            Self::Match => "match",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by a node handler or by the graph walk itself.
///
/// Every variant fails the run; none of them abort the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The flow has no trigger node to start from.
    MissingTriggerNode,
    /// The node kind is reserved or unrecognized and cannot be executed.
    UnknownNodeType { node_type: String },
    /// The trigger node's platform or content-type filter rejected the event.
    TriggerMismatch,
    /// A comment trigger has no keywords configured.
    MissingKeywords,
    /// The event carries no comment text to match keywords against.
    MissingComment,
    /// None of the configured keywords appear in the event comment.
    KeywordMismatch,
    /// The follower check ran but the configured condition did not hold.
    FollowerConditionNotMet { condition: FollowCondition },
    /// No connected account exists for the platform the node needs.
    MissingConnection { platform: Platform },
    /// A send_message node has an empty message body.
    EmptyMessage,
    /// The event has no sender, so there is nobody to message.
    MissingRecipient,
    /// An edge points at a node id that does not exist in the flow.
    DanglingEdge { edge_id: String, target: NodeId },
    /// The walk reached a node it had already executed.
    CycleDetected { node_id: NodeId },
    /// A platform API call failed.
    Platform(PlatformError),
    /// A store lookup needed by a handler failed.
    Store(StoreError),
}

impl NodeError {
    /// Classifies this error for log fields and stats.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingTriggerNode
            | Self::UnknownNodeType { .. }
            | Self::MissingKeywords
            | Self::EmptyMessage
            | Self::MissingRecipient
            | Self::DanglingEdge { .. }
            | Self::CycleDetected { .. } => FailureKind::Validation,
            Self::TriggerMismatch
            | Self::MissingComment
            | Self::KeywordMismatch
            | Self::FollowerConditionNotMet { .. } => FailureKind::Match,
            Self::MissingConnection { .. } | Self::Platform(_) | Self::Store(_) => {
                FailureKind::ExternalDependency
            }
        }
    }
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTriggerNode => write!(f, "no trigger node found"),
            // Capitalized and colon-spaced exactly as clients already parse it.
            Self::UnknownNodeType { node_type } => write!(f, "Unknown node type: {node_type}"),
            Self::TriggerMismatch => write!(f, "trigger conditions not met"),
            Self::MissingKeywords => write!(f, "no keywords configured for comment trigger"),
            Self::MissingComment => write!(f, "trigger event has no comment"),
            Self::KeywordMismatch => {
                write!(f, "comment does not contain any configured keyword")
            }
            Self::FollowerConditionNotMet { condition } => {
                write!(f, "follower condition not met: {condition}")
            }
            Self::MissingConnection { platform } => {
                write!(f, "no active {platform} connection")
            }
            Self::EmptyMessage => write!(f, "message text is empty"),
            Self::MissingRecipient => write!(f, "trigger event has no sender to message"),
            Self::DanglingEdge { edge_id, target } => {
                write!(f, "edge {edge_id} points to missing node: {target}")
            }
            Self::CycleDetected { node_id } => {
                write!(f, "flow cycle detected at node: {node_id}")
            }
            Self::Platform(e) => write!(f, "platform error: {e}"),
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for NodeError {}

impl From<PlatformError> for NodeError {
    fn from(e: PlatformError) -> Self {
        Self::Platform(e)
    }
}

impl From<StoreError> for NodeError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Errors surfaced outside a run, before an execution log exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Flow store operation failed.
    Store(StoreError),
    /// The referenced flow does not exist in the store.
    FlowNotFound { flow_id: FlowId },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::FlowNotFound { flow_id } => write!(f, "flow not found: {flow_id}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
