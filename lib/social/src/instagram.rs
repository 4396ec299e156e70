//! Instagram Graph API client.
//!
//! Implements [`PlatformClient`] against the Instagram messaging and follower
//! endpoints. Only the two calls the engine makes are covered here; webhook
//! subscription management and OAuth token exchange live with the ingestion
//! boundary.

use crate::client::{MessageReceipt, PlatformClient};
use crate::error::PlatformError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Base URL of the Instagram Graph API.
const DEFAULT_BASE_URL: &str = "https://graph.instagram.com";

/// Default timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Instagram Graph API.
pub struct InstagramClient {
    http: reqwest::Client,
    base_url: String,
}

impl InstagramClient {
    /// Creates a client against the production Graph API.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new() -> Result<Self, PlatformError> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a client against a specific base URL with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_follow_state(
        &self,
        access_token: &str,
        platform_user_id: &str,
        target_user_id: &str,
    ) -> Result<bool, PlatformError> {
        let url = format!(
            "{}/v1/{}/follows/{}",
            self.base_url, platform_user_id, target_user_id
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: FollowStateResponse =
            serde_json::from_str(&body).map_err(|e| PlatformError::InvalidResponse {
                message: e.to_string(),
            })?;

        Ok(parsed.is_following)
    }
}

#[async_trait]
impl PlatformClient for InstagramClient {
    async fn check_follows(
        &self,
        access_token: &str,
        platform_user_id: &str,
        target_user_id: &str,
    ) -> bool {
        match self
            .fetch_follow_state(access_token, platform_user_id, target_user_id)
            .await
        {
            Ok(is_following) => is_following,
            Err(e) => {
                tracing::warn!(error = %e, "follow check failed, treating as not following");
                false
            }
        }
    }

    async fn send_direct_message(
        &self,
        access_token: &str,
        recipient_id: &str,
        text: &str,
    ) -> Result<MessageReceipt, PlatformError> {
        let url = format!("{}/v1/me/messages", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&json!({
                "recipient": { "id": recipient_id },
                "message": { "text": text },
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: SendMessageResponse =
            serde_json::from_str(&body).map_err(|e| PlatformError::InvalidResponse {
                message: e.to_string(),
            })?;

        Ok(MessageReceipt {
            message_id: parsed.message_id,
            recipient_id: recipient_id.to_string(),
        })
    }
}

/// Builds an API error, pulling the platform's error message out of the body
/// when it has the standard `{"error": {"message": ...}}` shape.
fn api_error(status: u16, body: &str) -> PlatformError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    PlatformError::Api { status, message }
}

#[derive(Debug, Deserialize)]
struct FollowStateResponse {
    is_following: bool,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    message_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_extracts_platform_message() {
        let err = api_error(400, r#"{"error": {"message": "Invalid user", "code": 100}}"#);
        assert_eq!(
            err,
            PlatformError::Api {
                status: 400,
                message: "Invalid user".to_string(),
            }
        );
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = api_error(502, "Bad Gateway\n");
        assert_eq!(
            err,
            PlatformError::Api {
                status: 502,
                message: "Bad Gateway".to_string(),
            }
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = InstagramClient::with_base_url("https://example.test/", DEFAULT_TIMEOUT)
            .expect("client should build");
        assert_eq!(client.base_url, "https://example.test");
    }
}
