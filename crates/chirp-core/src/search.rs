//! Prefix matching used by user and tweet search.

/// Case-insensitive prefix match.
///
/// The candidate is truncated to the query's length in characters and the
/// two are compared ignoring case. An empty query matches every candidate.
#[must_use]
pub fn matches_prefix(candidate: &str, query: &str) -> bool {
    let len = query.chars().count();
    let head: String = candidate.chars().take(len).collect();
    head.to_lowercase() == query.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_case_insensitive() {
        assert!(matches_prefix("Hello world", "hello"));
        assert!(matches_prefix("hello world", "HELLO W"));
        assert!(!matches_prefix("hello world", "world"));
    }

    #[test]
    fn empty_query_matches_everything() {
        assert!(matches_prefix("anything", ""));
        assert!(matches_prefix("", ""));
    }

    #[test]
    fn query_longer_than_candidate_fails() {
        assert!(!matches_prefix("hi", "hip"));
    }

    #[test]
    fn truncation_counts_characters() {
        assert!(matches_prefix("Über alles", "üb"));
    }
}
