//! The social networks the automation engine understands.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported social platform.
///
/// Serialized and displayed in lowercase, matching the form used in trigger
/// events and node filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Youtube,
    Twitter,
    Facebook,
}

impl Platform {
    /// Returns the lowercase name of the platform.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
            Self::Youtube => "youtube",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a platform name fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePlatformError {
    /// The string that failed to parse.
    pub value: String,
}

impl fmt::Display for ParsePlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown platform: {}", self.value)
    }
}

impl std::error::Error for ParsePlatformError {}

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instagram" => Ok(Self::Instagram),
            "tiktok" => Ok(Self::Tiktok),
            "youtube" => Ok(Self::Youtube),
            "twitter" => Ok(Self::Twitter),
            "facebook" => Ok(Self::Facebook),
            other => Err(ParsePlatformError {
                value: other.to_string(),
            }),
        }
    }
}
