//! User and tweet search.
//!
//! Both searches scan the whole collection; there is no index.

use chirp_core::{matches_prefix, sort_newest_first, Tweet, User};

use crate::error::Result;
use crate::Store;

/// Users whose username starts with `query`, ignoring case.
///
/// Users that have not claimed a username are never returned.
///
/// # Errors
///
/// Returns an error if the user scan fails.
pub fn search_users<S: Store + ?Sized>(store: &S, query: &str) -> Result<Vec<User>> {
    Ok(store
        .list_users()?
        .into_iter()
        .filter(|u| u.has_username() && matches_prefix(&u.username, query))
        .collect())
}

/// Tweets whose body starts with `query`, ignoring case, newest first.
///
/// # Errors
///
/// Returns an error if the tweet scan fails.
pub fn search_tweets<S: Store + ?Sized>(store: &S, query: &str) -> Result<Vec<Tweet>> {
    let mut tweets: Vec<Tweet> = store
        .list_tweets()?
        .into_iter()
        .filter(|t| matches_prefix(&t.body, query))
        .collect();
    sort_newest_first(&mut tweets);
    Ok(tweets)
}
