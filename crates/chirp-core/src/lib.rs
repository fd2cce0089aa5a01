//! Core types and utilities for chirp.
//!
//! This crate provides the foundational types used throughout the service:
//!
//! - **Identifiers**: `IdentityKey`, `TweetId`
//! - **Users**: `User` with its tweet log and follow sets
//! - **Tweets**: `Tweet`, `TweetUpdate`, `ImageRef`
//! - **Search**: case-insensitive prefix matching
//! - **Timeline**: ordering and capping of merged tweet feeds
//!
//! # Usernames
//!
//! A user starts without a username and picks one exactly once. Tweets carry
//! a denormalized copy of their author's username, and follow sets store
//! usernames, so a username never changes after it is claimed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod search;
pub mod timeline;
pub mod tweet;
pub mod user;

pub use error::{ChirpError, Result};
pub use ids::{IdError, IdentityKey, TweetId};
pub use search::matches_prefix;
pub use timeline::{sort_newest_first, TIMELINE_LIMIT};
pub use tweet::{validate_tweet_body, ImageRef, Tweet, TweetUpdate, MAX_TWEET_CHARS};
pub use user::{validate_username, User, MAX_USERNAME_CHARS};
