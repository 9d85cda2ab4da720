use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized news item, produced by any source adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub description: String,
    /// Human-readable source name, e.g. "Hacker News". Distinct from the
    /// configured source key used as the aggregation map key.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_source: Option<String>,
    pub published_at: DateTime<Utc>,
    /// 0 when the source has no notion of score.
    pub score: i64,
    /// 0 when the source has no notion of comments.
    pub comments: i64,
}

/// User-configured description of one feed to poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Unique key; becomes the section key in the aggregated result.
    pub name: String,
    /// Adapter selector, matched case-insensitively at dispatch time.
    pub kind: String,
    pub url: String,
    pub limit: usize,
    /// Required by some adapter kinds (e.g. the subreddit for a forum).
    pub sub_source: Option<String>,
}

/// Collapse a batch of per-attempt outcomes under the skip-and-continue
/// policy: individual failures are tolerated unless nothing succeeded.
///
/// Returns the collected successes, or the full skip set when every
/// attempt failed and at least one attempt was made. An empty input is a
/// successful empty batch.
pub fn combine<T, E>(attempts: impl IntoIterator<Item = Result<T, E>>) -> Result<Vec<T>, Vec<E>> {
    let mut collected = Vec::new();
    let mut skipped = Vec::new();
    for attempt in attempts {
        match attempt {
            Ok(value) => collected.push(value),
            Err(skip) => skipped.push(skip),
        }
    }
    if collected.is_empty() && !skipped.is_empty() {
        return Err(skipped);
    }
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_keeps_successes_and_drops_skips() {
        let attempts: Vec<Result<i32, &str>> = vec![Ok(1), Err("a"), Ok(2)];
        assert_eq!(combine(attempts), Ok(vec![1, 2]));
    }

    #[test]
    fn combine_fails_when_everything_was_skipped() {
        let attempts: Vec<Result<i32, &str>> = vec![Err("a"), Err("b")];
        assert_eq!(combine(attempts), Err(vec!["a", "b"]));
    }

    #[test]
    fn combine_treats_empty_input_as_success() {
        let attempts: Vec<Result<i32, &str>> = Vec::new();
        assert_eq!(combine(attempts), Ok(Vec::new()));
    }
}
