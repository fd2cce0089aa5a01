//! Timeline ordering.

use crate::Tweet;

/// Maximum number of tweets shown on a timeline.
pub const TIMELINE_LIMIT: usize = 20;

/// Sort tweets newest first.
///
/// Tweets posted within the same second are ordered by their identifier,
/// which is time-ordered as well.
pub fn sort_newest_first(tweets: &mut [Tweet]) {
    tweets.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
