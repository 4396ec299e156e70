//! Normalized inbound trigger events.
//!
//! Webhook payload parsing lives with the ingestion boundary; by the time an
//! event reaches the engine it has this shape regardless of which platform
//! produced it.

use crate::platform::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A normalized social event, as handed to the trigger matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// The platform the event originated from.
    pub platform: Platform,
    /// The event type ("comment", "message", "story_mention", "manual", ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Comment text, when the event is a comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Content type the event is attached to ("post", "reel", "story", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Platform-scoped id of the account that caused the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_user_id: Option<String>,
    /// Raw provider fields preserved for the execution log.
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub payload: JsonValue,
    /// When the event was received.
    pub received_at: DateTime<Utc>,
}

impl TriggerEvent {
    /// Creates an event with the given platform and type.
    #[must_use]
    pub fn new(platform: Platform, kind: impl Into<String>) -> Self {
        Self {
            platform,
            kind: kind.into(),
            comment: None,
            content_type: None,
            from_user_id: None,
            payload: JsonValue::Null,
            received_at: Utc::now(),
        }
    }

    /// Creates a manual/test trigger event.
    #[must_use]
    pub fn manual(platform: Platform) -> Self {
        Self::new(platform, "manual")
    }

    /// Sets the comment text.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the id of the account that caused the event.
    #[must_use]
    pub fn with_from_user(mut self, from_user_id: impl Into<String>) -> Self {
        self.from_user_id = Some(from_user_id.into());
        self
    }

    /// Attaches the raw provider payload.
    #[must_use]
    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = payload;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let event = TriggerEvent::new(Platform::Instagram, "comment")
            .with_comment("love this!")
            .with_content_type("reel")
            .with_from_user("ig_9001");

        assert_eq!(event.kind, "comment");
        assert_eq!(event.comment.as_deref(), Some("love this!"));
        assert_eq!(event.content_type.as_deref(), Some("reel"));
        assert_eq!(event.from_user_id.as_deref(), Some("ig_9001"));
    }

    #[test]
    fn manual_event_kind() {
        let event = TriggerEvent::manual(Platform::Instagram);
        assert_eq!(event.kind, "manual");
        assert!(event.comment.is_none());
    }

    #[test]
    fn serializes_kind_as_type() {
        let event = TriggerEvent::new(Platform::Instagram, "comment");
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "comment");
        assert_eq!(json["platform"], "instagram");
    }
}
