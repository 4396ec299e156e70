//! Flow node types and payloads.
//!
//! Nodes are the steps of a flow. Each node has:
//! - An id unique within its flow, assigned by the flow editor
//! - A kind drawn from a fixed vocabulary, carrying its own typed payload
//!
//! Trigger kinds (`social_trigger`, `comment_trigger`) double as match
//! predicates: the trigger matcher evaluates them against inbound events, and
//! the interpreter re-evaluates them when the run reaches the node.

use crosswire_social::{Platform, TriggerEvent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A node's identity within its flow.
///
/// Assigned by the flow editor, so it is an opaque string rather than an id
/// the engine generates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node id from an authored string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The condition a `follower_check` node asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowCondition {
    /// The event's sender must follow the flow owner's account.
    #[default]
    IsFollowing,
    /// The event's sender must not follow the flow owner's account.
    NotFollowing,
}

impl FollowCondition {
    /// Returns the snake_case name of the condition.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IsFollowing => "is_following",
            Self::NotFollowing => "not_following",
        }
    }
}

impl fmt::Display for FollowCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit for a `delay` node's duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl DelayUnit {
    /// Seconds in one unit.
    #[must_use]
    pub const fn seconds_per_unit(&self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days => 86_400,
        }
    }

    /// Converts an amount of this unit into a duration.
    #[must_use]
    pub fn duration_for(&self, amount: u64) -> Duration {
        Duration::from_secs(amount.saturating_mul(self.seconds_per_unit()))
    }
}

/// A node's kind and its typed payload.
///
/// The serialized form is internally tagged on `"type"`, so an authored node
/// looks like `{"id": "n1", "type": "comment_trigger", "keywords": "sale"}`.
/// The reserved kinds (`webhook`, `email`, `notification`) parse but have no
/// handler; the interpreter rejects them at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry node matching platform-level events.
    SocialTrigger {
        /// Only match events from this platform; unset matches any.
        platform: Option<Platform>,
        /// Only match events for this content type; unset matches any.
        content_type: Option<String>,
    },
    /// Entry node matching comments containing configured keywords.
    CommentTrigger {
        /// Comma-separated keywords, as authored.
        #[serde(default)]
        keywords: String,
    },
    /// Asserts the event sender's follow relationship to the flow owner.
    FollowerCheck {
        /// The asserted relationship.
        #[serde(default)]
        condition: FollowCondition,
    },
    /// Sends a direct message to the event's sender.
    SendMessage {
        /// The message text.
        #[serde(default)]
        message: String,
        /// Optional message type hint ("text", "template", ...).
        message_type: Option<String>,
    },
    /// Suspends the run for a fixed duration.
    Delay {
        /// Amount of `unit` to wait.
        #[serde(default)]
        duration: u64,
        /// Unit the duration is expressed in.
        #[serde(default)]
        unit: DelayUnit,
    },
    /// Placeholder conditional step. Always succeeds; no branching.
    Condition,
    /// Reserved. Not yet executable.
    Webhook,
    /// Reserved. Not yet executable.
    Email,
    /// Reserved. Not yet executable.
    Notification,
}

impl NodeKind {
    /// Returns the snake_case type tag for this kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::SocialTrigger { .. } => "social_trigger",
            Self::CommentTrigger { .. } => "comment_trigger",
            Self::FollowerCheck { .. } => "follower_check",
            Self::SendMessage { .. } => "send_message",
            Self::Delay { .. } => "delay",
            Self::Condition => "condition",
            Self::Webhook => "webhook",
            Self::Email => "email",
            Self::Notification => "notification",
        }
    }

    /// Whether this kind can serve as a flow's entry node.
    #[must_use]
    pub const fn is_trigger(&self) -> bool {
        matches!(
            self,
            Self::SocialTrigger { .. } | Self::CommentTrigger { .. }
        )
    }

    /// Evaluates this kind's trigger predicate against an event.
    ///
    /// Non-trigger kinds never match. A `social_trigger` treats an unset
    /// platform or content-type filter as a wildcard; a `comment_trigger`
    /// needs configured keywords and a comment on the event.
    #[must_use]
    pub fn matches_event(&self, event: &TriggerEvent) -> bool {
        match self {
            Self::SocialTrigger {
                platform,
                content_type,
            } => {
                let platform_ok = platform.is_none_or(|p| p == event.platform);
                let content_ok = content_type
                    .as_deref()
                    .is_none_or(|ct| event.content_type.as_deref() == Some(ct));
                platform_ok && content_ok
            }
            Self::CommentTrigger { keywords } => event
                .comment
                .as_deref()
                .is_some_and(|comment| matching_keyword(keywords, comment).is_some()),
            _ => false,
        }
    }
}

/// Splits an authored keyword list on commas, trimming and lower-casing each
/// entry and dropping empties.
#[must_use]
pub fn split_keywords(keywords: &str) -> Vec<String> {
    keywords
        .split(',')
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

/// Returns the first configured keyword the comment contains, compared
/// case-insensitively as a substring (not a word-boundary match).
#[must_use]
pub fn matching_keyword(keywords: &str, comment: &str) -> Option<String> {
    let comment = comment.to_lowercase();
    split_keywords(keywords)
        .into_iter()
        .find(|keyword| comment.contains(keyword.as_str()))
}

/// A flow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identity unique within the owning flow.
    pub id: NodeId,
    /// The node's kind and payload.
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    /// Creates a node.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}
