//! Timeline generation.

use std::collections::BTreeSet;

use chirp_core::{sort_newest_first, Tweet, User, TIMELINE_LIMIT};

use crate::error::Result;
use crate::Store;

/// Build a user's timeline.
///
/// Collects the tweets of the user and of everyone they follow, orders them
/// newest first and keeps the latest [`TIMELINE_LIMIT`]. The timeline is
/// computed from scratch on every call.
///
/// # Errors
///
/// Returns an error if the tweet query fails.
pub fn build_timeline<S: Store + ?Sized>(store: &S, user: &User) -> Result<Vec<Tweet>> {
    let mut authors: BTreeSet<String> = user.following.clone();
    if user.has_username() {
        authors.insert(user.username.clone());
    }
    if authors.is_empty() {
        return Ok(Vec::new());
    }

    let authors: Vec<String> = authors.into_iter().collect();
    let mut tweets = store.tweets_by_authors(&authors)?;
    sort_newest_first(&mut tweets);
    tweets.truncate(TIMELINE_LIMIT);

    tracing::debug!(
        username = %user.username,
        authors = authors.len(),
        tweets = tweets.len(),
        "Built timeline"
    );

    Ok(tweets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use chirp_core::IdentityKey;
    use chrono::{Duration, Utc};

    fn claim(store: &MemoryStore, name: &str) -> IdentityKey {
        let id: IdentityKey = format!("uid-{name}").parse().unwrap();
        store.get_or_create_user(&id).unwrap();
        store.set_username(&id, name).unwrap();
        id
    }

    fn post(store: &MemoryStore, owner: &IdentityKey, author: &str, minutes_ago: i64) {
        let tweet = Tweet::posted_at(
            author,
            format!("{author} {minutes_ago}m"),
            None,
            Utc::now() - Duration::minutes(minutes_ago),
        );
        store.create_tweet(owner, &tweet).unwrap();
    }

    #[test]
    fn includes_only_self_and_followed() {
        let store = MemoryStore::new();
        let u = claim(&store, "u");
        let a = claim(&store, "a");
        let b = claim(&store, "b");
        let stranger = claim(&store, "stranger");
        store.follow(&u, "a").unwrap();
        store.follow(&u, "b").unwrap();

        post(&store, &u, "u", 7);
        post(&store, &a, "a", 1);
        post(&store, &b, "b", 4);
        post(&store, &a, "a", 9);
        post(&store, &stranger, "stranger", 0);

        let user = store.get_user(&u).unwrap().unwrap();
        let timeline = build_timeline(&store, &user).unwrap();

        assert_eq!(timeline.len(), 4);
        assert!(timeline
            .iter()
            .all(|t| ["u", "a", "b"].contains(&t.author.as_str())));
        assert!(timeline
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[test]
    fn caps_at_limit() {
        let store = MemoryStore::new();
        let u = claim(&store, "u");
        for minutes in 0..30 {
            post(&store, &u, "u", minutes);
        }

        let user = store.get_user(&u).unwrap().unwrap();
        let timeline = build_timeline(&store, &user).unwrap();

        assert_eq!(timeline.len(), TIMELINE_LIMIT);
        assert_eq!(timeline[0].body, "u 0m");
    }

    #[test]
    fn user_without_username_has_empty_timeline() {
        let store = MemoryStore::new();
        let id: IdentityKey = "uid-new".parse().unwrap();
        let user = store.get_or_create_user(&id).unwrap();
        assert!(build_timeline(&store, &user).unwrap().is_empty());
    }
}
