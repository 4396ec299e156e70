//! Errors produced by platform API calls.

use std::fmt;

/// Error from a social platform API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The HTTP request could not be completed.
    Transport {
        /// Description of the transport failure.
        message: String,
    },
    /// The platform API answered with an error response.
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Error detail reported by the platform.
        message: String,
    },
    /// The response body did not have the expected shape.
    InvalidResponse {
        /// Description of what was wrong with the body.
        message: String,
    },
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { message } => write!(f, "transport error: {}", message),
            Self::Api { status, message } => {
                write!(f, "platform api error (status {}): {}", status, message)
            }
            Self::InvalidResponse { message } => {
                write!(f, "unexpected platform response: {}", message)
            }
        }
    }
}

impl std::error::Error for PlatformError {}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status() {
        let err = PlatformError::Api {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "platform api error (status 429): rate limited"
        );
    }
}
