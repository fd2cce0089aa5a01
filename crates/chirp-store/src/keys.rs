//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in column families.

use chirp_core::{IdentityKey, TweetId};

/// Separator between the author and the tweet ID in index keys.
///
/// Usernames never contain a NUL byte, so the separator keeps one author's
/// prefix from matching another author whose name extends it.
const AUTHOR_SEPARATOR: u8 = 0;

/// Create a user key from an identity key.
#[must_use]
pub fn user_key(identity: &IdentityKey) -> Vec<u8> {
    identity.as_bytes().to_vec()
}

/// Create a username index key.
#[must_use]
pub fn username_key(username: &str) -> Vec<u8> {
    username.as_bytes().to_vec()
}

/// Create a tweet key from a tweet ID.
#[must_use]
pub fn tweet_key(id: &TweetId) -> Vec<u8> {
    id.to_bytes().to_vec()
}

/// Create a prefix for iterating all tweets by an author.
#[must_use]
pub fn author_tweets_prefix(author: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(author.len() + 1);
    key.extend_from_slice(author.as_bytes());
    key.push(AUTHOR_SEPARATOR);
    key
}

/// Create an author-tweet index key.
///
/// Format: `author || 0x00 || tweet_id (16 bytes)`
///
/// Since ULIDs are time-ordered, an author's tweets are sorted oldest first.
#[must_use]
pub fn author_tweet_key(author: &str, id: &TweetId) -> Vec<u8> {
    let mut key = author_tweets_prefix(author);
    key.extend_from_slice(&id.to_bytes());
    key
}

/// Extract the tweet ID from an author-tweet index key.
///
/// Returns `None` if the key is shorter than a tweet ID.
#[must_use]
pub fn extract_tweet_id_from_author_key(key: &[u8]) -> Option<TweetId> {
    let start = key.len().checked_sub(16)?;
    let bytes: [u8; 16] = key[start..].try_into().ok()?;
    Some(TweetId::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tweet_key_length() {
        let key = tweet_key(&TweetId::generate());
        assert_eq!(key.len(), 16);
    }

    #[test]
    fn author_tweet_key_format() {
        let id = TweetId::generate();
        let key = author_tweet_key("bob", &id);

        assert_eq!(key.len(), 3 + 1 + 16);
        assert!(key.starts_with(&author_tweets_prefix("bob")));
        assert!(!key.starts_with(&author_tweets_prefix("bo")));
        assert_eq!(&key[4..], id.to_bytes());
    }

    #[test]
    fn extract_tweet_id_roundtrip() {
        let id = TweetId::generate();
        let key = author_tweet_key("alice", &id);
        assert_eq!(extract_tweet_id_from_author_key(&key), Some(id));
        assert_eq!(extract_tweet_id_from_author_key(b"short"), None);
    }
}
