//! Per-source adapters converting each wire format into [`NewsItem`]s.

pub mod hackernews;
pub mod reddit;
pub mod rss_feed;

pub use hackernews::HackerNewsSource;
pub use reddit::RedditSource;
pub use rss_feed::RssFeedSource;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::fetcher::FetchError;
use crate::types::NewsItem;

/// Closed set of adapter kinds a [`crate::SourceSpec`] can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    HackerNewsTop,
    HackerNewsBest,
    Reddit,
    Rss,
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hackernews" | "hackernews-top" => Ok(Self::HackerNewsTop),
            "hackernews-best" => Ok(Self::HackerNewsBest),
            "reddit" => Ok(Self::Reddit),
            "rss" | "infoq" => Ok(Self::Rss),
            _ => Err(SourceError::UnsupportedType(s.to_string())),
        }
    }
}

/// A named source could not produce any item.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("unsupported source type: {0}")]
    UnsupportedType(String),
    #[error("sub_source is required for source {0}")]
    MissingSubSource(String),
    #[error("app credentials not configured")]
    MissingCredentials,
    #[error(transparent)]
    Http(#[from] FetchError),
    #[error("access forbidden (403), typically rate limiting in restricted network environments")]
    Forbidden(#[source] FetchError),
    #[error("failed to parse {label} response: {reason}")]
    Parse { label: String, reason: String },
    #[error("no items fetched from {label}, skipped: {skipped:?}")]
    Exhausted { label: String, skipped: Vec<String> },
}

/// Interpret a Unix timestamp, falling back to the current time for values
/// outside chrono's representable range.
pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

/// Truncate to at most `limit` characters, appending an ellipsis marker
/// when anything was cut.
pub(crate) fn truncate_chars(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        return s.to_string();
    }
    let mut out: String = s.chars().take(limit).collect();
    out.push_str("...");
    out
}

/// Stable descending sort by score; the fetch order is preserved for ties.
pub(crate) fn sort_by_score(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.score.cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_parses_case_insensitively() {
        assert_eq!(
            "HackerNews".parse::<SourceKind>().unwrap(),
            SourceKind::HackerNewsTop
        );
        assert_eq!(
            "hackernews-best".parse::<SourceKind>().unwrap(),
            SourceKind::HackerNewsBest
        );
        assert_eq!("Reddit".parse::<SourceKind>().unwrap(), SourceKind::Reddit);
        assert_eq!("RSS".parse::<SourceKind>().unwrap(), SourceKind::Rss);
        assert_eq!("InfoQ".parse::<SourceKind>().unwrap(), SourceKind::Rss);
    }

    #[test]
    fn source_kind_rejects_unknown_types() {
        let err = "gopher".parse::<SourceKind>().unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedType(t) if t == "gopher"));
    }

    #[test]
    fn truncate_chars_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo", 10), "héllo");
        assert_eq!(truncate_chars("héllo", 3), "hél...");
    }

    #[test]
    fn truncate_chars_is_exact_at_the_limit() {
        let input = "a".repeat(205);
        let out = truncate_chars(&input, 200);
        assert_eq!(out.chars().count(), 203);
        assert!(out.ends_with("..."));
    }
}
