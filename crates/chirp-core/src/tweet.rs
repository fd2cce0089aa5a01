//! Tweet documents.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChirpError, Result};
use crate::TweetId;

/// Maximum length of a tweet body, in characters.
pub const MAX_TWEET_CHARS: usize = 280;

/// A reference to an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Public URL the image is served from.
    pub url: String,
    /// Object-store key, used when the image is deleted.
    pub blob_key: String,
}

/// A posted tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tweet {
    /// Stable identifier.
    pub id: TweetId,

    /// Author's username at the time of posting.
    pub author: String,

    /// When the tweet was posted, truncated to whole seconds.
    pub created_at: DateTime<Utc>,

    /// Text content.
    pub body: String,

    /// Public URL of the attached image, if any.
    pub image_url: Option<String>,

    /// Object-store key of the attached image, if any.
    pub blob_key: Option<String>,
}

impl Tweet {
    /// Create a tweet posted now.
    #[must_use]
    pub fn new(author: impl Into<String>, body: impl Into<String>, image: Option<ImageRef>) -> Self {
        Self::posted_at(author, body, image, Utc::now())
    }

    /// Create a tweet with an explicit posting time.
    #[must_use]
    pub fn posted_at(
        author: impl Into<String>,
        body: impl Into<String>,
        image: Option<ImageRef>,
        at: DateTime<Utc>,
    ) -> Self {
        let (image_url, blob_key) = match image {
            Some(image) => (Some(image.url), Some(image.blob_key)),
            None => (None, None),
        };
        Self {
            id: TweetId::generate(),
            author: author.into(),
            created_at: at.trunc_subsecs(0),
            body: body.into(),
            image_url,
            blob_key,
        }
    }

    /// Apply an edit in place.
    ///
    /// The image fields are only replaced when the update carries a new image.
    pub fn apply(&mut self, update: TweetUpdate) {
        self.body = update.body;
        if let Some(image) = update.image {
            self.image_url = Some(image.url);
            self.blob_key = Some(image.blob_key);
        }
    }
}

/// A partial update to a tweet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetUpdate {
    /// Replacement body.
    pub body: String,
    /// Replacement image; `None` keeps the current one.
    pub image: Option<ImageRef>,
}

/// Validate a tweet body.
///
/// # Errors
///
/// Returns [`ChirpError::InvalidTweet`] if the body is blank or longer than
/// [`MAX_TWEET_CHARS`].
pub fn validate_tweet_body(body: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Err(ChirpError::InvalidTweet("Tweet cannot be empty.".into()));
    }
    if body.chars().count() > MAX_TWEET_CHARS {
        return Err(ChirpError::InvalidTweet(format!(
            "Tweet must be at most {MAX_TWEET_CHARS} characters."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn image(name: &str) -> ImageRef {
        ImageRef {
            url: format!("/media/bob/{name}"),
            blob_key: format!("bob/{name}"),
        }
    }

    #[test]
    fn timestamps_have_second_precision() {
        let tweet = Tweet::new("bob", "hello world", None);
        assert_eq!(tweet.created_at.nanosecond(), 0);
    }

    #[test]
    fn edit_without_image_keeps_existing_image() {
        let mut tweet = Tweet::new("bob", "original", Some(image("cat.png")));
        tweet.apply(TweetUpdate {
            body: "edited".into(),
            image: None,
        });

        assert_eq!(tweet.body, "edited");
        assert_eq!(tweet.image_url.as_deref(), Some("/media/bob/cat.png"));
        assert_eq!(tweet.blob_key.as_deref(), Some("bob/cat.png"));
    }

    #[test]
    fn edit_with_image_replaces_both_fields() {
        let mut tweet = Tweet::new("bob", "original", Some(image("cat.png")));
        tweet.apply(TweetUpdate {
            body: "edited".into(),
            image: Some(image("dog.png")),
        });

        assert_eq!(tweet.image_url.as_deref(), Some("/media/bob/dog.png"));
        assert_eq!(tweet.blob_key.as_deref(), Some("bob/dog.png"));
    }

    #[test]
    fn body_rules() {
        assert!(validate_tweet_body("hello").is_ok());
        assert!(validate_tweet_body("   ").is_err());
        assert!(validate_tweet_body(&"é".repeat(MAX_TWEET_CHARS)).is_ok());
        assert!(validate_tweet_body(&"é".repeat(MAX_TWEET_CHARS + 1)).is_err());
    }
}
