//! User documents.
//!
//! A user owns an append-only log of tweet references and two username sets
//! describing the follow graph around it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChirpError, Result};
use crate::{IdentityKey, TweetId};

/// Maximum length of a username, in characters.
pub const MAX_USERNAME_CHARS: usize = 32;

/// A user profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The identity key (from the identity provider).
    pub identity: IdentityKey,

    /// Chosen username. Empty until the user picks one.
    pub username: String,

    /// References to the user's tweets, oldest first.
    pub tweets: Vec<TweetId>,

    /// Usernames this user follows.
    pub following: BTreeSet<String>,

    /// Usernames following this user.
    pub followers: BTreeSet<String>,

    /// When the user document was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a blank user with no username, tweets or follow edges.
    #[must_use]
    pub fn new(identity: IdentityKey) -> Self {
        Self {
            identity,
            username: String::new(),
            tweets: Vec::new(),
            following: BTreeSet::new(),
            followers: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether the user has claimed a username yet.
    #[must_use]
    pub fn has_username(&self) -> bool {
        !self.username.is_empty()
    }

    /// Whether this user follows `username`.
    #[must_use]
    pub fn is_following(&self, username: &str) -> bool {
        self.following.contains(username)
    }

    /// Resolve a newest-first position into a tweet reference.
    ///
    /// Position 0 is the most recently posted tweet.
    #[must_use]
    pub fn tweet_at(&self, newest_first_index: usize) -> Option<TweetId> {
        let len = self.tweets.len();
        if newest_first_index >= len {
            return None;
        }
        self.tweets.get(len - 1 - newest_first_index).copied()
    }

    /// Whether the tweet belongs to this user's log.
    #[must_use]
    pub fn owns_tweet(&self, id: &TweetId) -> bool {
        self.tweets.contains(id)
    }

    /// Remove a tweet reference from the log. Returns whether it was present.
    pub fn remove_tweet(&mut self, id: &TweetId) -> bool {
        let before = self.tweets.len();
        self.tweets.retain(|t| t != id);
        self.tweets.len() != before
    }
}

/// Validate a requested username.
///
/// Usernames are 1 to [`MAX_USERNAME_CHARS`] characters of ASCII letters,
/// digits, `_`, `.` and `-`. They double as blob directory names and URL
/// path segments.
///
/// # Errors
///
/// Returns [`ChirpError::InvalidUsername`] describing the first violated rule.
pub fn validate_username(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ChirpError::InvalidUsername(
            "Username cannot be empty.".into(),
        ));
    }
    if name.chars().count() > MAX_USERNAME_CHARS {
        return Err(ChirpError::InvalidUsername(format!(
            "Username must be at most {MAX_USERNAME_CHARS} characters."
        )));
    }
    if name.starts_with('.') {
        return Err(ChirpError::InvalidUsername(
            "Username cannot start with a dot.".into(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ChirpError::InvalidUsername(
            "Username may only contain letters, digits, '_', '.' and '-'.".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new("uid-1".parse().unwrap())
    }

    #[test]
    fn new_user_is_blank() {
        let user = user();
        assert!(!user.has_username());
        assert!(user.tweets.is_empty());
        assert!(user.following.is_empty());
        assert!(user.followers.is_empty());
    }

    #[test]
    fn tweet_at_counts_from_newest() {
        let mut user = user();
        let ids: Vec<TweetId> = (0..3).map(|_| TweetId::generate()).collect();
        user.tweets.extend(ids.iter().copied());

        assert_eq!(user.tweet_at(0), Some(ids[2]));
        assert_eq!(user.tweet_at(2), Some(ids[0]));
        assert_eq!(user.tweet_at(3), None);
    }

    #[test]
    fn remove_tweet_reports_presence() {
        let mut user = user();
        let id = TweetId::generate();
        user.tweets.push(id);

        assert!(user.remove_tweet(&id));
        assert!(!user.remove_tweet(&id));
        assert!(user.tweets.is_empty());
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob_the-builder.2").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(".hidden").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("slash/name").is_err());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_CHARS)).is_ok());
        assert!(validate_username(&"a".repeat(MAX_USERNAME_CHARS + 1)).is_err());
    }
}
