use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::de::from_str;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use tracing::warn;

use super::{truncate_chars, SourceError};
use crate::fetcher::HttpClient;
use crate::types::{combine, NewsItem, SourceSpec};

const DESCRIPTION_LIMIT: usize = 200;
const RSS_ACCEPT: &str = "application/rss+xml, application/xml, text/xml, */*";
const READER_USER_AGENT: &str = "NewsDigest/1.0 RSS Reader";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    title: String,
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "pubDate", default)]
    pub_date: String,
    // Feeds may tag an article with several categories; the first one is
    // the sub-source.
    #[serde(rename = "category", default)]
    categories: Vec<String>,
}

/// Adapter for RSS 2.0 article feeds.
///
/// Feeds carry no score or comment counts; items keep the feed's own order
/// until the final sort by publication date.
pub struct RssFeedSource {
    http: Arc<HttpClient>,
}

impl RssFeedSource {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Fetch and normalize the feed's articles, newest first.
    pub async fn fetch_articles(&self, spec: &SourceSpec) -> Result<Vec<NewsItem>, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(RSS_ACCEPT));
        headers.insert(USER_AGENT, HeaderValue::from_static(READER_USER_AGENT));
        let body = self.http.get_with_headers(&spec.url, headers).await?;
        let text = String::from_utf8_lossy(&body);

        let feed: Rss = from_str(&text).map_err(|e| SourceError::Parse {
            label: spec.name.clone(),
            reason: e.to_string(),
        })?;

        // The channel title is the human-readable source name; fall back to
        // the configured key when the feed omits it.
        let label = match feed.channel.title.trim() {
            "" => spec.name.clone(),
            title => title.to_string(),
        };

        let mut attempts = Vec::new();
        for item in feed.channel.items.into_iter().take(spec.limit) {
            let title = item.title.trim();
            if title.is_empty() {
                warn!(source = %label, "skipping article with empty title");
                attempts.push(Err("untitled article".to_string()));
                continue;
            }

            let published_at = parse_pub_date(&item.pub_date).unwrap_or_else(|| {
                warn!(source = %label, pub_date = %item.pub_date, "unparseable pubDate, using current time");
                Utc::now()
            });

            let category = item
                .categories
                .first()
                .map(|c| c.trim())
                .unwrap_or_default();
            attempts.push(Ok(NewsItem {
                title: title.to_string(),
                url: item.link.trim().to_string(),
                description: clean_description(&item.description),
                source: label.clone(),
                sub_source: (!category.is_empty()).then(|| category.to_string()),
                published_at,
                score: 0,
                comments: 0,
            }));
        }

        let mut items = combine(attempts).map_err(|skipped| SourceError::Exhausted {
            label: label.clone(),
            skipped,
        })?;

        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(items)
    }
}

/// Feed dates arrive in several dialects. The RFC 2822 forms cover the
/// usual `pubDate` spellings with named or numeric zones; ISO 8601 shows
/// up in feeds generated from APIs.
pub(crate) fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_rfc1123_lenient(raw) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Some feeds stamp a weekday that does not match the date, which the
/// strict RFC 2822 parser rejects. Drop the weekday and retry, accepting
/// either a numeric offset or a named zone treated as UTC.
fn parse_rfc1123_lenient(raw: &str) -> Option<DateTime<Utc>> {
    let rest = match raw.split_once(',') {
        Some((_weekday, rest)) => rest.trim_start(),
        None => raw,
    };
    if let Ok(dt) = DateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    let (body, zone) = rest.rsplit_once(' ')?;
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    NaiveDateTime::parse_from_str(body, "%d %b %Y %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Strip the paragraph and line-break tags feeds commonly leave in their
/// summaries, decode the handful of entities that survive, then bound the
/// length for digest rendering.
pub(crate) fn clean_description(raw: &str) -> String {
    let cleaned = raw
        .replace("<p>", "")
        .replace("</p>", "")
        .replace("<br>", " ")
        .replace("<br/>", " ")
        .replace("<br />", " ")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    truncate_chars(cleaned.trim(), DESCRIPTION_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc1123_with_named_zone() {
        let parsed = parse_pub_date("Thu, 04 Jul 2025 00:00:00 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 7, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_rfc1123_with_numeric_offset() {
        let parsed = parse_pub_date("Thu, 04 Jul 2025 02:30:00 +0230").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 7, 4, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_single_digit_day() {
        let parsed = parse_pub_date("Mon, 2 Jan 2006 15:04:05 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap());
    }

    #[test]
    fn parses_iso8601_variants() {
        let zulu = parse_pub_date("2006-01-02T15:04:05Z").unwrap();
        assert_eq!(zulu, Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap());

        let offset = parse_pub_date("2006-01-02T15:04:05-07:00").unwrap();
        assert_eq!(offset, Utc.with_ymd_and_hms(2006, 1, 2, 22, 4, 5).unwrap());

        let naive = parse_pub_date("2006-01-02T15:04:05").unwrap();
        assert_eq!(naive, Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap());
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(parse_pub_date("invalid date").is_none());
        assert!(parse_pub_date("").is_none());
    }

    #[test]
    fn clean_description_strips_tags_and_entities() {
        let raw = "<p>Rust&nbsp;&amp;&nbsp;Go<br/>compared: &lt;fast&gt; &quot;safe&quot; &#39;fun&#39;</p>";
        assert_eq!(
            clean_description(raw),
            "Rust & Go compared: <fast> \"safe\" 'fun'"
        );
    }

    #[test]
    fn clean_description_truncates_to_limit_plus_ellipsis() {
        let raw = "x".repeat(205);
        let cleaned = clean_description(&raw);
        assert_eq!(cleaned.len(), 203);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn clean_description_short_input_is_untouched() {
        assert_eq!(clean_description("  plain text  "), "plain text");
    }
}
