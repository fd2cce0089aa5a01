//! Error types for chirp storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Blob storage operation failed.
    #[error("blob storage error: {0}")]
    Blob(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Key that was looked up.
        id: String,
    },

    /// Another user already owns the username.
    #[error("username already taken: {username}")]
    UsernameTaken {
        /// The contested username.
        username: String,
    },

    /// The user has already claimed a username.
    #[error("username already set")]
    UsernameAlreadySet,

    /// The user must claim a username before this operation.
    #[error("username required")]
    UsernameRequired,

    /// A blob key would escape the blob root.
    #[error("invalid blob key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    pub(crate) fn user_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity: "user",
            id: id.to_string(),
        }
    }

    pub(crate) fn tweet_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity: "tweet",
            id: id.to_string(),
        }
    }
}
