//! Database repository for social platform connections.

use chrono::{DateTime, Utc};
use crosswire_core::{ConnectionId, UserId};
use crosswire_social::{Platform, SocialConnection};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;

use super::decode_error;

/// Row type for connection queries.
#[derive(FromRow)]
struct ConnectionRow {
    id: String,
    user_id: String,
    platform: String,
    platform_user_id: String,
    access_token: String,
    is_connected: bool,
    connected_at: DateTime<Utc>,
}

impl ConnectionRow {
    fn try_into_connection(self) -> Result<SocialConnection, sqlx::Error> {
        let id = ConnectionId::from_str(&self.id)
            .map_err(|e| decode_error(format!("invalid connection id '{}': {}", self.id, e)))?;
        let user_id = UserId::from_str(&self.user_id)
            .map_err(|e| decode_error(format!("invalid user id '{}': {}", self.user_id, e)))?;
        let platform = Platform::from_str(&self.platform)
            .map_err(|e| decode_error(format!("invalid platform '{}': {}", self.platform, e)))?;

        Ok(SocialConnection {
            id,
            user_id,
            platform,
            platform_user_id: self.platform_user_id,
            access_token: self.access_token,
            is_connected: self.is_connected,
            connected_at: self.connected_at,
        })
    }
}

/// Repository for connection lookups.
pub struct ConnectionRepository {
    pool: PgPool,
}

impl ConnectionRepository {
    /// Creates a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds the user's most recent usable connection for a platform.
    pub async fn find_connected(
        &self,
        user_id: UserId,
        platform: Platform,
    ) -> Result<Option<SocialConnection>, sqlx::Error> {
        let row: Option<ConnectionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, platform, platform_user_id, access_token,
                   is_connected, connected_at
            FROM social_connections
            WHERE user_id = $1 AND platform = $2 AND is_connected = TRUE
            ORDER BY connected_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id.to_string())
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(r.try_into_connection()?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(conn: &SocialConnection) -> ConnectionRow {
        ConnectionRow {
            id: conn.id.to_string(),
            user_id: conn.user_id.to_string(),
            platform: conn.platform.to_string(),
            platform_user_id: conn.platform_user_id.clone(),
            access_token: conn.access_token.clone(),
            is_connected: conn.is_connected,
            connected_at: conn.connected_at,
        }
    }

    #[test]
    fn row_converts_back_to_connection() {
        let conn = SocialConnection::new(UserId::new(), Platform::Instagram, "ig_9", "tok");
        let converted = sample_row(&conn)
            .try_into_connection()
            .expect("row should convert");

        assert_eq!(converted.id, conn.id);
        assert_eq!(converted.user_id, conn.user_id);
        assert_eq!(converted.platform, Platform::Instagram);
        assert_eq!(converted.platform_user_id, "ig_9");
        assert_eq!(converted.access_token, "tok");
        assert!(converted.is_connected);
    }

    #[test]
    fn unknown_platform_is_a_decode_error() {
        let conn = SocialConnection::new(UserId::new(), Platform::Instagram, "ig_9", "tok");
        let mut row = sample_row(&conn);
        row.platform = "myspace".to_string();

        let err = row
            .try_into_connection()
            .expect_err("conversion should fail");
        assert!(matches!(err, sqlx::Error::Decode(_)));
    }
}
