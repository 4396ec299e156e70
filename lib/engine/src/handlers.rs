//! Per-node execution handlers.
//!
//! Each flow node kind maps to exactly one handler here. Handlers take
//! everything they need as arguments and return the node's JSON result;
//! the interpreter owns the walk, the log, and the stats. Trigger
//! handlers re-validate their filters even though the matcher already
//! checked them, so a stale task drained after a flow was edited still
//! fails cleanly instead of acting on the wrong event.

use crate::error::NodeError;
use crate::store::FlowStore;
use chrono::Utc;
use crosswire_core::UserId;
use crosswire_flow::{DelayUnit, FollowCondition, Node, NodeKind, matching_keyword, split_keywords};
use crosswire_social::{Platform, PlatformClient, TriggerEvent};
use serde_json::{Value as JsonValue, json};

/// Dispatches a node to its handler.
pub(crate) async fn execute_node<S: FlowStore, C: PlatformClient>(
    store: &S,
    client: &C,
    user_id: UserId,
    node: &Node,
    event: &TriggerEvent,
) -> Result<JsonValue, NodeError> {
    match &node.kind {
        NodeKind::SocialTrigger { .. } => social_trigger(&node.kind, event),
        NodeKind::CommentTrigger { keywords } => comment_trigger(keywords, event),
        NodeKind::FollowerCheck { condition } => {
            follower_check(store, client, user_id, *condition, event).await
        }
        NodeKind::SendMessage { message, .. } => {
            send_message(store, client, user_id, message, event).await
        }
        NodeKind::Delay { duration, unit } => delay(*duration, *unit).await,
        NodeKind::Condition => Ok(json!({ "passed": true })),
        NodeKind::Webhook | NodeKind::Email | NodeKind::Notification => {
            Err(NodeError::UnknownNodeType {
                node_type: node.kind.type_name().to_string(),
            })
        }
    }
}

fn social_trigger(kind: &NodeKind, event: &TriggerEvent) -> Result<JsonValue, NodeError> {
    if !kind.matches_event(event) {
        return Err(NodeError::TriggerMismatch);
    }
    Ok(json!({ "triggered": true }))
}

fn comment_trigger(keywords: &str, event: &TriggerEvent) -> Result<JsonValue, NodeError> {
    if split_keywords(keywords).is_empty() {
        return Err(NodeError::MissingKeywords);
    }
    let comment = event
        .comment
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or(NodeError::MissingComment)?;

    match matching_keyword(keywords, comment) {
        Some(keyword) => Ok(json!({ "triggered": true, "keyword": keyword })),
        None => Err(NodeError::KeywordMismatch),
    }
}

async fn follower_check<S: FlowStore, C: PlatformClient>(
    store: &S,
    client: &C,
    user_id: UserId,
    condition: FollowCondition,
    event: &TriggerEvent,
) -> Result<JsonValue, NodeError> {
    let platform = event.platform;
    let connection = store
        .find_connection(user_id, platform)
        .await?
        .ok_or(NodeError::MissingConnection { platform })?;

    // An event without a sender reads as "not following".
    let is_following = match event.from_user_id.as_deref() {
        Some(sender) => {
            client
                .check_follows(
                    &connection.access_token,
                    sender,
                    &connection.platform_user_id,
                )
                .await
        }
        None => false,
    };

    let satisfied = match condition {
        FollowCondition::IsFollowing => is_following,
        FollowCondition::NotFollowing => !is_following,
    };
    if !satisfied {
        return Err(NodeError::FollowerConditionNotMet { condition });
    }
    Ok(json!({ "is_following": is_following, "condition": condition.as_str() }))
}

async fn send_message<S: FlowStore, C: PlatformClient>(
    store: &S,
    client: &C,
    user_id: UserId,
    message: &str,
    event: &TriggerEvent,
) -> Result<JsonValue, NodeError> {
    if message.trim().is_empty() {
        return Err(NodeError::EmptyMessage);
    }

    let platform = event.platform;
    let connection = store
        .find_connection(user_id, platform)
        .await?
        .ok_or(NodeError::MissingConnection { platform })?;
    let recipient = event
        .from_user_id
        .as_deref()
        .ok_or(NodeError::MissingRecipient)?;

    if platform == Platform::Instagram {
        let receipt = client
            .send_direct_message(&connection.access_token, recipient, message)
            .await?;
        Ok(serde_json::to_value(&receipt).unwrap_or(JsonValue::Null))
    } else {
        // Only Instagram delivery is wired up; other platforms get a
        // simulated receipt.
        Ok(json!({
            "message_id": format!("sim_{}", Utc::now().timestamp_millis()),
            "recipient_id": recipient,
            "simulated": true,
        }))
    }
}

async fn delay(duration: u64, unit: DelayUnit) -> Result<JsonValue, NodeError> {
    let wait = unit.duration_for(duration);
    tokio::time::sleep(wait).await;
    let waited_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
    Ok(json!({ "waited_ms": waited_ms }))
}
