//! Error types for chirp.

use crate::ids::IdError;

/// Result type for chirp domain operations.
pub type Result<T> = std::result::Result<T, ChirpError>;

/// Errors raised by domain validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChirpError {
    /// The requested username does not satisfy the username rules.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// The tweet body does not satisfy the tweet rules.
    #[error("invalid tweet: {0}")]
    InvalidTweet(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
