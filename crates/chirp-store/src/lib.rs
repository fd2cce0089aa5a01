//! Storage layer for chirp.
//!
//! This crate provides the document store for users and tweets, the blob
//! store for image attachments, and the read paths built on top of them
//! (timeline and search).
//!
//! # Backends
//!
//! - [`MemoryStore`]: in-process maps, used by tests and local development
//! - `RocksStore`: `RocksDB` with column families, behind the
//!   `rocksdb-backend` feature
//!
//! # Consistency
//!
//! Compound mutations (claiming a username, following, posting and deleting
//! tweets) touch more than one document. Every backend applies them under a
//! single write lock and commits them as one unit, so the username index and
//! the follow sets on both sides of an edge never diverge.
//!
//! # Example
//!
//! ```
//! use chirp_store::{MemoryStore, Store};
//! use chirp_core::IdentityKey;
//!
//! let store = MemoryStore::new();
//! let identity: IdentityKey = "uid-alice".parse().unwrap();
//!
//! let user = store.get_or_create_user(&identity).unwrap();
//! assert!(!user.has_username());
//!
//! let user = store.set_username(&identity, "alice").unwrap();
//! assert_eq!(user.username, "alice");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod blob;
pub mod error;
pub mod memory;
pub mod search;
pub mod timeline;

#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use blob::{BlobStore, FsBlobStore, StoredBlob};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;
pub use search::{search_tweets, search_users};
pub use timeline::build_timeline;

use chirp_core::{IdentityKey, Tweet, TweetId, TweetUpdate, User};

/// The storage trait defining all document operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Get a user by identity key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, identity: &IdentityKey) -> Result<Option<User>>;

    /// Get a user, inserting a blank user first if none exists.
    ///
    /// Calling this twice without an intervening mutation returns equal users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_or_create_user(&self, identity: &IdentityKey) -> Result<User>;

    /// Find the user owning a username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// List every user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_users(&self) -> Result<Vec<User>>;

    /// Claim a username for a user.
    ///
    /// The uniqueness check and the write happen atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the user doesn't exist.
    /// - `StoreError::UsernameAlreadySet` if the user already has a username.
    /// - `StoreError::UsernameTaken` if another user owns the username.
    fn set_username(&self, identity: &IdentityKey, username: &str) -> Result<User>;

    /// Add a follow edge from a user to the owner of `username`.
    ///
    /// Both sides of the edge are written atomically. Following an already
    /// followed user, or oneself, changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if either user doesn't exist.
    fn follow(&self, identity: &IdentityKey, username: &str) -> Result<()>;

    /// Remove a follow edge. Removing a missing edge changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if either user doesn't exist.
    fn unfollow(&self, identity: &IdentityKey, username: &str) -> Result<()>;

    // =========================================================================
    // Tweet Operations
    // =========================================================================

    /// Insert a tweet and append it to its owner's tweet log.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the owner doesn't exist.
    fn create_tweet(&self, owner: &IdentityKey, tweet: &Tweet) -> Result<()>;

    /// Get a tweet by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_tweet(&self, id: &TweetId) -> Result<Option<Tweet>>;

    /// Apply an edit to a tweet and return the updated tweet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the tweet doesn't exist.
    fn update_tweet(&self, id: &TweetId, update: TweetUpdate) -> Result<Tweet>;

    /// Delete a tweet and remove it from its owner's tweet log.
    ///
    /// Returns the deleted tweet so callers can clean up its image.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the owner or tweet doesn't exist.
    fn delete_tweet(&self, owner: &IdentityKey, id: &TweetId) -> Result<Tweet>;

    /// All tweets written by any of `authors`, ordered by author ascending
    /// and then newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn tweets_by_authors(&self, authors: &[String]) -> Result<Vec<Tweet>>;

    /// List every tweet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_tweets(&self) -> Result<Vec<Tweet>>;

    /// Resolve a user's tweet log, newest first.
    ///
    /// References whose tweet document is missing are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn tweets_of(&self, user: &User) -> Result<Vec<Tweet>> {
        let mut tweets = Vec::with_capacity(user.tweets.len());
        for id in user.tweets.iter().rev() {
            if let Some(tweet) = self.get_tweet(id)? {
                tweets.push(tweet);
            }
        }
        Ok(tweets)
    }
}
