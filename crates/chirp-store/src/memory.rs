//! In-memory storage implementation.
//!
//! All documents live behind one `RwLock`, so every compound mutation is
//! applied in a single critical section.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chirp_core::{IdentityKey, Tweet, TweetId, TweetUpdate, User};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Default)]
struct Documents {
    users: HashMap<IdentityKey, User>,
    usernames: HashMap<String, IdentityKey>,
    tweets: HashMap<TweetId, Tweet>,
}

/// Memory-backed storage implementation.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<Documents>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Documents>> {
        self.docs
            .read()
            .map_err(|_| StoreError::Database("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Documents>> {
        self.docs
            .write()
            .map_err(|_| StoreError::Database("store lock poisoned".into()))
    }
}

impl Documents {
    fn user_mut(&mut self, identity: &IdentityKey) -> Result<&mut User> {
        self.users
            .get_mut(identity)
            .ok_or_else(|| StoreError::user_not_found(identity))
    }

    /// Resolve follower and followee for a follow-graph mutation.
    ///
    /// Returns `None` when the follower targets themselves.
    fn edge(&self, identity: &IdentityKey, username: &str) -> Result<Option<IdentityKey>> {
        let follower = self
            .users
            .get(identity)
            .ok_or_else(|| StoreError::user_not_found(identity))?;
        if !follower.has_username() {
            return Err(StoreError::UsernameRequired);
        }
        let followee = self
            .usernames
            .get(username)
            .cloned()
            .ok_or_else(|| StoreError::user_not_found(username))?;
        if &followee == identity {
            return Ok(None);
        }
        Ok(Some(followee))
    }
}

impl Store for MemoryStore {
    fn get_user(&self, identity: &IdentityKey) -> Result<Option<User>> {
        Ok(self.read()?.users.get(identity).cloned())
    }

    fn get_or_create_user(&self, identity: &IdentityKey) -> Result<User> {
        if let Some(user) = self.read()?.users.get(identity) {
            return Ok(user.clone());
        }

        let mut docs = self.write()?;
        let user = docs
            .users
            .entry(identity.clone())
            .or_insert_with(|| {
                tracing::info!(identity = %identity, "Created user document");
                User::new(identity.clone())
            })
            .clone();
        Ok(user)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let docs = self.read()?;
        Ok(docs
            .usernames
            .get(username)
            .and_then(|identity| docs.users.get(identity))
            .cloned())
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.read()?.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    fn set_username(&self, identity: &IdentityKey, username: &str) -> Result<User> {
        let mut docs = self.write()?;

        if docs.user_mut(identity)?.has_username() {
            return Err(StoreError::UsernameAlreadySet);
        }
        if docs.usernames.contains_key(username) {
            return Err(StoreError::UsernameTaken {
                username: username.to_string(),
            });
        }

        docs.usernames
            .insert(username.to_string(), identity.clone());
        let user = docs.user_mut(identity)?;
        user.username = username.to_string();
        Ok(user.clone())
    }

    fn follow(&self, identity: &IdentityKey, username: &str) -> Result<()> {
        let mut docs = self.write()?;
        let Some(followee) = docs.edge(identity, username)? else {
            return Ok(());
        };

        let follower = docs.user_mut(identity)?;
        follower.following.insert(username.to_string());
        let follower_name = follower.username.clone();
        docs.user_mut(&followee)?.followers.insert(follower_name);
        Ok(())
    }

    fn unfollow(&self, identity: &IdentityKey, username: &str) -> Result<()> {
        let mut docs = self.write()?;
        let Some(followee) = docs.edge(identity, username)? else {
            return Ok(());
        };

        let follower = docs.user_mut(identity)?;
        follower.following.remove(username);
        let follower_name = follower.username.clone();
        docs.user_mut(&followee)?.followers.remove(&follower_name);
        Ok(())
    }

    fn create_tweet(&self, owner: &IdentityKey, tweet: &Tweet) -> Result<()> {
        let mut docs = self.write()?;
        docs.user_mut(owner)?.tweets.push(tweet.id);
        docs.tweets.insert(tweet.id, tweet.clone());
        Ok(())
    }

    fn get_tweet(&self, id: &TweetId) -> Result<Option<Tweet>> {
        Ok(self.read()?.tweets.get(id).cloned())
    }

    fn update_tweet(&self, id: &TweetId, update: TweetUpdate) -> Result<Tweet> {
        let mut docs = self.write()?;
        let tweet = docs
            .tweets
            .get_mut(id)
            .ok_or_else(|| StoreError::tweet_not_found(id))?;
        tweet.apply(update);
        Ok(tweet.clone())
    }

    fn delete_tweet(&self, owner: &IdentityKey, id: &TweetId) -> Result<Tweet> {
        let mut docs = self.write()?;
        if !docs.user_mut(owner)?.remove_tweet(id) {
            return Err(StoreError::tweet_not_found(id));
        }
        docs.tweets
            .remove(id)
            .ok_or_else(|| StoreError::tweet_not_found(id))
    }

    fn tweets_by_authors(&self, authors: &[String]) -> Result<Vec<Tweet>> {
        let docs = self.read()?;
        let mut tweets: Vec<Tweet> = docs
            .tweets
            .values()
            .filter(|t| authors.contains(&t.author))
            .cloned()
            .collect();
        tweets.sort_by(|a, b| {
            a.author
                .cmp(&b.author)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(tweets)
    }

    fn list_tweets(&self) -> Result<Vec<Tweet>> {
        Ok(self.read()?.tweets.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(s: &str) -> IdentityKey {
        s.parse().unwrap()
    }

    fn store_with(names: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for name in names {
            let id = identity(&format!("uid-{name}"));
            store.get_or_create_user(&id).unwrap();
            store.set_username(&id, name).unwrap();
        }
        store
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let id = identity("uid-1");

        let first = store.get_or_create_user(&id).unwrap();
        let second = store.get_or_create_user(&id).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn username_is_unique_and_set_once() {
        let store = store_with(&["alice"]);
        let bob = identity("uid-bob");
        store.get_or_create_user(&bob).unwrap();

        let taken = store.set_username(&bob, "alice");
        assert!(matches!(taken, Err(StoreError::UsernameTaken { .. })));
        assert!(!store.get_user(&bob).unwrap().unwrap().has_username());

        store.set_username(&bob, "bob").unwrap();
        let again = store.set_username(&bob, "robert");
        assert!(matches!(again, Err(StoreError::UsernameAlreadySet)));
        assert!(store.find_user_by_username("robert").unwrap().is_none());
    }

    #[test]
    fn follow_then_unfollow_restores_both_sides() {
        let store = store_with(&["alice", "bob"]);
        let alice = identity("uid-alice");
        let bob = identity("uid-bob");
        let before_alice = store.get_user(&alice).unwrap().unwrap();
        let before_bob = store.get_user(&bob).unwrap().unwrap();

        store.follow(&alice, "bob").unwrap();
        store.follow(&alice, "bob").unwrap();
        let mid_alice = store.get_user(&alice).unwrap().unwrap();
        let mid_bob = store.get_user(&bob).unwrap().unwrap();
        assert_eq!(mid_alice.following.len(), 1);
        assert!(mid_bob.followers.contains("alice"));

        store.unfollow(&alice, "bob").unwrap();
        assert_eq!(store.get_user(&alice).unwrap().unwrap(), before_alice);
        assert_eq!(store.get_user(&bob).unwrap().unwrap(), before_bob);
    }

    #[test]
    fn follow_self_and_unknown() {
        let store = store_with(&["alice"]);
        let alice = identity("uid-alice");

        store.follow(&alice, "alice").unwrap();
        assert!(store.get_user(&alice).unwrap().unwrap().following.is_empty());

        let missing = store.follow(&alice, "nobody");
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn tweet_lifecycle() {
        let store = store_with(&["bob"]);
        let bob = identity("uid-bob");
        let tweet = Tweet::new("bob", "hello world", None);

        store.create_tweet(&bob, &tweet).unwrap();
        let user = store.get_user(&bob).unwrap().unwrap();
        assert_eq!(user.tweets, vec![tweet.id]);

        let updated = store
            .update_tweet(
                &tweet.id,
                TweetUpdate {
                    body: "edited".into(),
                    image: None,
                },
            )
            .unwrap();
        assert_eq!(updated.body, "edited");

        let removed = store.delete_tweet(&bob, &tweet.id).unwrap();
        assert_eq!(removed.id, tweet.id);
        assert!(store.get_tweet(&tweet.id).unwrap().is_none());
        assert!(store.get_user(&bob).unwrap().unwrap().tweets.is_empty());
    }

    #[test]
    fn delete_requires_ownership() {
        let store = store_with(&["alice", "bob"]);
        let tweet = Tweet::new("bob", "mine", None);
        store.create_tweet(&identity("uid-bob"), &tweet).unwrap();

        let result = store.delete_tweet(&identity("uid-alice"), &tweet.id);
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(store.get_tweet(&tweet.id).unwrap().is_some());
    }

    #[test]
    fn tweets_by_authors_orders_by_author_then_time() {
        let store = store_with(&["alice", "bob", "carol"]);
        let now = chrono::Utc::now();
        let posts = [
            ("bob", 1),
            ("alice", 3),
            ("bob", 2),
            ("alice", 1),
            ("carol", 5),
        ];
        for (author, minutes_ago) in posts {
            let tweet = Tweet::posted_at(
                author,
                format!("{author}-{minutes_ago}"),
                None,
                now - chrono::Duration::minutes(minutes_ago),
            );
            store
                .create_tweet(&identity(&format!("uid-{author}")), &tweet)
                .unwrap();
        }

        let tweets = store
            .tweets_by_authors(&["alice".into(), "bob".into()])
            .unwrap();
        let bodies: Vec<_> = tweets.iter().map(|t| t.body.as_str()).collect();
        assert_eq!(bodies, vec!["alice-1", "alice-3", "bob-1", "bob-2"]);
    }
}
