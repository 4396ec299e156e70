//! Matches incoming events against registered flows.
//!
//! The matcher is pure: it reads a registry snapshot, applies the entry
//! node's filter rules, and returns tasks. It performs no I/O and never
//! mutates a flow, so matching stays cheap on the event ingestion path.

use crate::queue::Task;
use crate::registry::ActiveFlowRegistry;
use crosswire_flow::Flow;
use crosswire_social::TriggerEvent;
use std::sync::Arc;

/// Decides which flows an event should run.
pub struct TriggerMatcher {
    registry: Arc<ActiveFlowRegistry>,
}

impl TriggerMatcher {
    /// Creates a matcher over the given registry.
    #[must_use]
    pub fn new(registry: Arc<ActiveFlowRegistry>) -> Self {
        Self { registry }
    }

    /// Returns one task per registered flow whose trigger accepts the event.
    ///
    /// The order of tasks across different flows is unspecified.
    #[must_use]
    pub fn match_event(&self, event: &TriggerEvent) -> Vec<Task> {
        self.registry
            .snapshot()
            .iter()
            .filter(|flow| Self::flow_matches(flow, event))
            .map(|flow| Task::new(flow.id, flow.user_id, event.clone()))
            .collect()
    }

    /// Whether a single flow's entry trigger accepts the event.
    ///
    /// Inactive flows never match. Flows without a trigger entry node are
    /// skipped without error; they simply cannot be started by events.
    #[must_use]
    pub fn flow_matches(flow: &Flow, event: &TriggerEvent) -> bool {
        if !flow.is_active() {
            return false;
        }
        flow.entry_node()
            .is_some_and(|node| node.kind.matches_event(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosswire_core::UserId;
    use crosswire_flow::{Node, NodeKind};
    use crosswire_social::Platform;

    fn comment_flow(keywords: &str, active: bool) -> Flow {
        let mut flow = Flow::new(UserId::new(), "comment flow").with_node(Node::new(
            "trigger",
            NodeKind::CommentTrigger {
                keywords: keywords.to_string(),
            },
        ));
        flow.set_active(active);
        flow
    }

    fn social_flow(platform: Option<Platform>, active: bool) -> Flow {
        let mut flow = Flow::new(UserId::new(), "social flow").with_node(Node::new(
            "trigger",
            NodeKind::SocialTrigger {
                platform,
                content_type: None,
            },
        ));
        flow.set_active(active);
        flow
    }

    #[test]
    fn inactive_flows_never_match() {
        let flow = comment_flow("sale", false);
        let event =
            TriggerEvent::new(Platform::Instagram, "comment").with_comment("huge sale today");

        assert!(!TriggerMatcher::flow_matches(&flow, &event));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let flow = comment_flow("sale,discount", true);
        let event =
            TriggerEvent::new(Platform::Instagram, "comment").with_comment("Is there a SALE today?");

        assert!(TriggerMatcher::flow_matches(&flow, &event));
    }

    #[test]
    fn missing_comment_never_matches_comment_trigger() {
        let flow = comment_flow("sale", true);
        let event = TriggerEvent::new(Platform::Instagram, "comment");

        assert!(!TriggerMatcher::flow_matches(&flow, &event));
    }

    #[test]
    fn empty_keywords_never_match() {
        let flow = comment_flow("", true);
        let event = TriggerEvent::new(Platform::Instagram, "comment").with_comment("anything");

        assert!(!TriggerMatcher::flow_matches(&flow, &event));
    }

    #[test]
    fn social_trigger_without_platform_filter_matches_any_platform() {
        let flow = social_flow(None, true);
        let event = TriggerEvent::new(Platform::Tiktok, "post");

        assert!(TriggerMatcher::flow_matches(&flow, &event));
    }

    #[test]
    fn social_trigger_platform_filter_rejects_other_platforms() {
        let flow = social_flow(Some(Platform::Instagram), true);
        let event = TriggerEvent::new(Platform::Youtube, "post");

        assert!(!TriggerMatcher::flow_matches(&flow, &event));
    }

    #[test]
    fn flow_without_trigger_entry_is_skipped() {
        let mut flow = Flow::new(UserId::new(), "no trigger").with_node(Node::new(
            "send",
            NodeKind::SendMessage {
                message: "hello".to_string(),
                message_type: None,
            },
        ));
        flow.set_active(true);
        let event = TriggerEvent::new(Platform::Instagram, "comment").with_comment("hello");

        assert!(!TriggerMatcher::flow_matches(&flow, &event));
    }

    #[test]
    fn match_event_builds_one_task_per_matching_flow() {
        let registry = Arc::new(ActiveFlowRegistry::new());
        let matching_a = comment_flow("sale", true);
        let matching_b = social_flow(None, true);
        let ignored = comment_flow("unrelated", true);
        let a_id = matching_a.id;
        let b_id = matching_b.id;

        registry.insert(matching_a);
        registry.insert(matching_b);
        registry.insert(ignored);

        let matcher = TriggerMatcher::new(registry);
        let event = TriggerEvent::new(Platform::Instagram, "comment").with_comment("big sale");
        let tasks = matcher.match_event(&event);

        assert_eq!(tasks.len(), 2);
        let ids: Vec<_> = tasks.iter().map(|t| t.flow_id).collect();
        assert!(ids.contains(&a_id));
        assert!(ids.contains(&b_id));
    }
}
