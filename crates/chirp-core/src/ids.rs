//! Identifier types for chirp.
//!
//! This module provides strongly-typed identifiers for users and tweets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Maximum length of an identity key, matching the provider's uid limit.
pub const MAX_IDENTITY_KEY_LEN: usize = 128;

/// The opaque identity of a user, as issued by the identity provider.
///
/// Identity keys are extracted from the verified `sub` claim of an ID token
/// and are the primary key of user documents. They never change.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Return the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the bytes of the key.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl FromStr for IdentityKey {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > MAX_IDENTITY_KEY_LEN {
            return Err(IdError::InvalidIdentity);
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityKey({})", self.0)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for IdentityKey {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IdentityKey> for String {
    fn from(id: IdentityKey) -> Self {
        id.0
    }
}

/// A tweet identifier using ULID for time-ordering.
///
/// Tweet IDs are time-ordered, so a later tweet always has a greater ID than
/// an earlier one created by the same process. This breaks ties between
/// tweets posted within the same second.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TweetId(Ulid);

impl TweetId {
    /// Create a new `TweetId` from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Generate a new `TweetId` with the current timestamp.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Return the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> &Ulid {
        &self.0
    }

    /// Return the bytes of the ULID (16 bytes).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_bytes()
    }

    /// Create a `TweetId` from bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Ulid::from_bytes(bytes))
    }
}

impl FromStr for TweetId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for TweetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TweetId({})", self.0)
    }
}

impl fmt::Display for TweetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TweetId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TweetId> for String {
    fn from(id: TweetId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a usable identity key.
    #[error("invalid identity key")]
    InvalidIdentity,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_rejects_empty_and_oversized() {
        assert_eq!("".parse::<IdentityKey>(), Err(IdError::InvalidIdentity));
        let long = "x".repeat(MAX_IDENTITY_KEY_LEN + 1);
        assert_eq!(long.parse::<IdentityKey>(), Err(IdError::InvalidIdentity));
        assert!("Xq3kd9PzUbh2".parse::<IdentityKey>().is_ok());
    }

    #[test]
    fn identity_key_serde_json() {
        let key: IdentityKey = "firebase-uid-1".parse().unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"firebase-uid-1\"");
        let parsed: IdentityKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, parsed);
        assert!(serde_json::from_str::<IdentityKey>("\"\"").is_err());
    }

    #[test]
    fn tweet_id_roundtrip() {
        let id = TweetId::generate();
        let parsed = TweetId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert_eq!(TweetId::from_bytes(id.to_bytes()), id);
    }

    #[test]
    fn tweet_id_rejects_garbage() {
        assert_eq!("not-a-ulid".parse::<TweetId>(), Err(IdError::InvalidUlid));
    }

    #[test]
    fn tweet_ids_are_time_ordered() {
        let first = TweetId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = TweetId::generate();
        assert!(second > first);
    }
}
