//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// User documents, keyed by identity key.
    pub const USERS: &str = "users";

    /// Index: username to identity key.
    pub const USERNAMES: &str = "usernames";

    /// Tweet documents, keyed by `tweet_id` (ULID).
    pub const TWEETS: &str = "tweets";

    /// Index: tweets by author, keyed by `author || 0x00 || tweet_id`.
    /// Value is empty (index only).
    pub const TWEETS_BY_AUTHOR: &str = "tweets_by_author";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::USERS, cf::USERNAMES, cf::TWEETS, cf::TWEETS_BY_AUTHOR]
}
