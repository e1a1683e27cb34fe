//! Error types for the feed engine.

use postfeed_protocol::{PostId, ProtocolError};
use thiserror::Error;

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors that can occur while driving the feed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The backend answered with an unexpected status code.
    #[error("request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// What the request was trying to do.
        message: String,
    },

    /// Authentication failed.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The response body could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid state transition.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// Navigation outside the known pages.
    #[error("page {requested} is out of range (last page {last_page})")]
    PageOutOfRange {
        /// The page the caller asked for.
        requested: i64,
        /// The last page currently known.
        last_page: u32,
    },

    /// The post is not part of the loaded page.
    #[error("post {0} is not on the loaded page")]
    PostNotFound(PostId),

    /// The notification stream has ended.
    #[error("notification subscription closed")]
    SubscriptionClosed,
}

impl FeedError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Transport { retryable, .. } => *retryable,
            FeedError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<ProtocolError> for FeedError {
    fn from(err: ProtocolError) -> Self {
        FeedError::Protocol(err.to_string())
    }
}
