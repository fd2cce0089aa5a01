//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//! Reads go straight to the database; compound writes take the store's write
//! lock, read the documents they touch, and commit one `WriteBatch`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use chirp_core::{IdentityKey, Tweet, TweetId, TweetUpdate, User};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Database("write lock poisoned".into()))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_doc<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn scan_docs<T: serde::de::DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut docs = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            docs.push(Self::deserialize(&value)?);
        }
        Ok(docs)
    }

    fn require_user(&self, identity: &IdentityKey) -> Result<User> {
        self.get_user(identity)?
            .ok_or_else(|| StoreError::user_not_found(identity))
    }

    fn lookup_identity(&self, username: &str) -> Result<Option<IdentityKey>> {
        let cf = self.cf(cf::USERNAMES)?;
        let Some(raw) = self
            .db
            .get_cf(&cf, keys::username_key(username))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };
        let identity = String::from_utf8(raw)
            .map_err(|e| StoreError::Serialization(e.to_string()))?
            .parse::<IdentityKey>()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(identity))
    }

    fn write_users(&self, users: &[&User]) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let mut batch = WriteBatch::default();
        for user in users {
            batch.put_cf(&cf_users, keys::user_key(&user.identity), Self::serialize(user)?);
        }
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Load both ends of a follow edge. `None` means a self-edge.
    fn edge(&self, identity: &IdentityKey, username: &str) -> Result<Option<(User, User)>> {
        let follower = self.require_user(identity)?;
        if !follower.has_username() {
            return Err(StoreError::UsernameRequired);
        }
        let followee_id = self
            .lookup_identity(username)?
            .ok_or_else(|| StoreError::user_not_found(username))?;
        if &followee_id == identity {
            return Ok(None);
        }
        let followee = self.require_user(&followee_id)?;
        Ok(Some((follower, followee)))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn get_user(&self, identity: &IdentityKey) -> Result<Option<User>> {
        self.get_doc(cf::USERS, &keys::user_key(identity))
    }

    fn get_or_create_user(&self, identity: &IdentityKey) -> Result<User> {
        if let Some(user) = self.get_user(identity)? {
            return Ok(user);
        }

        let _guard = self.lock()?;
        if let Some(user) = self.get_user(identity)? {
            return Ok(user);
        }

        let user = User::new(identity.clone());
        self.write_users(&[&user])?;
        tracing::info!(identity = %identity, "Created user document");
        Ok(user)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.lookup_identity(username)? {
            Some(identity) => self.get_user(&identity),
            None => Ok(None),
        }
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.scan_docs(cf::USERS)?;
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    fn set_username(&self, identity: &IdentityKey, username: &str) -> Result<User> {
        let _guard = self.lock()?;

        let mut user = self.require_user(identity)?;
        if user.has_username() {
            return Err(StoreError::UsernameAlreadySet);
        }
        if self.lookup_identity(username)?.is_some() {
            return Err(StoreError::UsernameTaken {
                username: username.to_string(),
            });
        }
        user.username = username.to_string();

        let cf_users = self.cf(cf::USERS)?;
        let cf_names = self.cf(cf::USERNAMES)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(identity), Self::serialize(&user)?);
        batch.put_cf(&cf_names, keys::username_key(username), identity.as_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(user)
    }

    fn follow(&self, identity: &IdentityKey, username: &str) -> Result<()> {
        let _guard = self.lock()?;
        let Some((mut follower, mut followee)) = self.edge(identity, username)? else {
            return Ok(());
        };

        follower.following.insert(followee.username.clone());
        followee.followers.insert(follower.username.clone());
        self.write_users(&[&follower, &followee])
    }

    fn unfollow(&self, identity: &IdentityKey, username: &str) -> Result<()> {
        let _guard = self.lock()?;
        let Some((mut follower, mut followee)) = self.edge(identity, username)? else {
            return Ok(());
        };

        follower.following.remove(&followee.username);
        followee.followers.remove(&follower.username);
        self.write_users(&[&follower, &followee])
    }

    // =========================================================================
    // Tweet Operations
    // =========================================================================

    fn create_tweet(&self, owner: &IdentityKey, tweet: &Tweet) -> Result<()> {
        let _guard = self.lock()?;

        let mut user = self.require_user(owner)?;
        user.tweets.push(tweet.id);

        let cf_users = self.cf(cf::USERS)?;
        let cf_tweets = self.cf(cf::TWEETS)?;
        let cf_by_author = self.cf(cf::TWEETS_BY_AUTHOR)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(owner), Self::serialize(&user)?);
        batch.put_cf(&cf_tweets, keys::tweet_key(&tweet.id), Self::serialize(tweet)?);
        batch.put_cf(
            &cf_by_author,
            keys::author_tweet_key(&tweet.author, &tweet.id),
            [],
        ); // Index entry (empty value)

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_tweet(&self, id: &TweetId) -> Result<Option<Tweet>> {
        self.get_doc(cf::TWEETS, &keys::tweet_key(id))
    }

    fn update_tweet(&self, id: &TweetId, update: TweetUpdate) -> Result<Tweet> {
        let _guard = self.lock()?;

        let mut tweet = self
            .get_tweet(id)?
            .ok_or_else(|| StoreError::tweet_not_found(id))?;
        tweet.apply(update);

        let cf = self.cf(cf::TWEETS)?;
        self.db
            .put_cf(&cf, keys::tweet_key(id), Self::serialize(&tweet)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(tweet)
    }

    fn delete_tweet(&self, owner: &IdentityKey, id: &TweetId) -> Result<Tweet> {
        let _guard = self.lock()?;

        let mut user = self.require_user(owner)?;
        if !user.remove_tweet(id) {
            return Err(StoreError::tweet_not_found(id));
        }
        let tweet = self
            .get_tweet(id)?
            .ok_or_else(|| StoreError::tweet_not_found(id))?;

        let cf_users = self.cf(cf::USERS)?;
        let cf_tweets = self.cf(cf::TWEETS)?;
        let cf_by_author = self.cf(cf::TWEETS_BY_AUTHOR)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(owner), Self::serialize(&user)?);
        batch.delete_cf(&cf_tweets, keys::tweet_key(id));
        batch.delete_cf(&cf_by_author, keys::author_tweet_key(&tweet.author, id));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(tweet)
    }

    fn tweets_by_authors(&self, authors: &[String]) -> Result<Vec<Tweet>> {
        let cf_by_author = self.cf(cf::TWEETS_BY_AUTHOR)?;

        let mut sorted_authors: Vec<&String> = authors.iter().collect();
        sorted_authors.sort();
        sorted_authors.dedup();

        let mut tweets = Vec::new();
        for author in sorted_authors {
            let prefix = keys::author_tweets_prefix(author);
            let iter = self
                .db
                .iterator_cf(&cf_by_author, IteratorMode::From(&prefix, Direction::Forward));

            let mut by_author = Vec::new();
            for item in iter {
                let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                if !key.starts_with(&prefix) {
                    break;
                }
                let Some(id) = keys::extract_tweet_id_from_author_key(&key) else {
                    continue;
                };
                if let Some(tweet) = self.get_tweet(&id)? {
                    by_author.push(tweet);
                }
            }

            by_author.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
            tweets.extend(by_author);
        }

        Ok(tweets)
    }

    fn list_tweets(&self) -> Result<Vec<Tweet>> {
        self.scan_docs(cf::TWEETS)
    }
}
