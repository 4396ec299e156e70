//! Social platform types and API client for the crosswire automation engine.
//!
//! This crate provides:
//!
//! - **Platform vocabulary**: The social networks the engine understands
//! - **Trigger events**: Normalized inbound events handed to the engine
//! - **Connections**: Per-user OAuth credentials for a platform
//! - **Platform client**: The trait the engine calls to reach a platform API,
//!   an Instagram Graph API implementation, and a configurable mock

pub mod client;
pub mod connection;
pub mod error;
pub mod event;
pub mod instagram;
pub mod platform;

pub use client::{MessageReceipt, MockPlatformClient, PlatformClient, SentMessage};
pub use connection::SocialConnection;
pub use error::PlatformError;
pub use event::TriggerEvent;
pub use instagram::InstagramClient;
pub use platform::{ParsePlatformError, Platform};
