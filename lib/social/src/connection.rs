//! Per-user platform credentials.

use crate::platform::Platform;
use chrono::{DateTime, Utc};
use crosswire_core::{ConnectionId, UserId};
use serde::{Deserialize, Serialize};

/// A user's connection to a social platform.
///
/// Read-only from the engine's perspective: the `follower_check` and
/// `send_message` handlers look one up to obtain the access token and the
/// owning account's platform id. Token acquisition and refresh live with the
/// OAuth boundary, outside this workspace's engine crates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConnection {
    /// Unique identifier for this connection record.
    pub id: ConnectionId,
    /// The owning crosswire user.
    pub user_id: UserId,
    /// Which platform the connection is for.
    pub platform: Platform,
    /// The connected account's own id on the platform.
    pub platform_user_id: String,
    /// OAuth access token for API calls.
    pub access_token: String,
    /// Whether the connection is currently usable.
    pub is_connected: bool,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
}

impl SocialConnection {
    /// Creates a connected credential record.
    #[must_use]
    pub fn new(
        user_id: UserId,
        platform: Platform,
        platform_user_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            user_id,
            platform,
            platform_user_id: platform_user_id.into(),
            access_token: access_token.into(),
            is_connected: true,
            connected_at: Utc::now(),
        }
    }
}
