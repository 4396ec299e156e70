//! The client trait the engine uses to reach a social platform API.

use crate::error::PlatformError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Receipt returned by a successful direct-message send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageReceipt {
    /// Platform-assigned id of the sent message.
    pub message_id: String,
    /// Platform-scoped id of the recipient.
    pub recipient_id: String,
}

/// Calls the engine makes against a social platform API.
///
/// Implementations are expected to be cheap to share behind an `Arc` and to
/// carry their own HTTP client state.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Reports whether `platform_user_id` follows `target_user_id`.
    ///
    /// This check fails closed: implementations must answer `false` on any
    /// transport or API error rather than surfacing the error, so a flaky
    /// follow lookup reads as "not following" instead of crashing a run.
    async fn check_follows(
        &self,
        access_token: &str,
        platform_user_id: &str,
        target_user_id: &str,
    ) -> bool;

    /// Sends a direct message to `recipient_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the message could not be delivered, so the
    /// calling node handler can fail its run.
    async fn send_direct_message(
        &self,
        access_token: &str,
        recipient_id: &str,
        text: &str,
    ) -> Result<MessageReceipt, PlatformError>;
}

/// A direct message recorded by [`MockPlatformClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Platform-scoped id of the recipient.
    pub recipient_id: String,
    /// The message text.
    pub text: String,
}

/// A mock platform client that can be configured to succeed or fail.
#[derive(Debug, Default)]
pub struct MockPlatformClient {
    following: AtomicBool,
    fail_sends: AtomicBool,
    send_counter: AtomicU64,
    sent: Mutex<Vec<SentMessage>>,
}

impl MockPlatformClient {
    /// Creates a mock where follow checks answer false and sends succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the answer returned by follow checks.
    pub fn set_following(&self, following: bool) {
        self.following.store(following, Ordering::SeqCst);
    }

    /// Makes every subsequent send fail with a platform API error.
    pub fn set_send_failure(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Returns the messages sent so far, in send order.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PlatformClient for MockPlatformClient {
    async fn check_follows(
        &self,
        _access_token: &str,
        _platform_user_id: &str,
        _target_user_id: &str,
    ) -> bool {
        self.following.load(Ordering::SeqCst)
    }

    async fn send_direct_message(
        &self,
        _access_token: &str,
        recipient_id: &str,
        text: &str,
    ) -> Result<MessageReceipt, PlatformError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(PlatformError::Api {
                status: 500,
                message: "mock send failure".to_string(),
            });
        }

        let sequence = self.send_counter.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMessage {
                recipient_id: recipient_id.to_string(),
                text: text.to_string(),
            });
        }

        Ok(MessageReceipt {
            message_id: format!("mock_msg_{}", sequence),
            recipient_id: recipient_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_records_sent_messages() {
        let client = MockPlatformClient::new();

        let receipt = client
            .send_direct_message("token", "ig_42", "hello")
            .await
            .expect("send should succeed");

        assert_eq!(receipt.recipient_id, "ig_42");
        assert_eq!(receipt.message_id, "mock_msg_1");

        let sent = client.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "hello");
    }

    #[tokio::test]
    async fn mock_send_failure() {
        let client = MockPlatformClient::new();
        client.set_send_failure(true);

        let result = client.send_direct_message("token", "ig_42", "hello").await;
        assert!(result.is_err());
        assert!(client.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn mock_follow_check_defaults_to_false() {
        let client = MockPlatformClient::new();
        assert!(!client.check_follows("token", "a", "b").await);

        client.set_following(true);
        assert!(client.check_follows("token", "a", "b").await);
    }
}
