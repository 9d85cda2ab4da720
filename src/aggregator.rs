use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::RedditAppConfig;
use crate::fetcher::HttpClient;
use crate::sources::{HackerNewsSource, RedditSource, RssFeedSource, SourceError, SourceKind};
use crate::types::{combine, NewsItem, SourceSpec};

/// Every configured source failed; there is nothing to aggregate.
#[derive(Debug, Error)]
#[error("failed to fetch news from any source, skipped: {skipped:?}")]
pub struct AggregateError {
    pub skipped: Vec<String>,
}

/// The aggregated result: source key to that source's ordered records.
pub type AggregateResult = BTreeMap<String, Vec<NewsItem>>;

/// Fans out over the configured sources and merges their records.
///
/// Sources are fetched one at a time; a failing source is skipped with a
/// warning and its key is left out of the result. Only the case where no
/// source produced anything is an error.
pub struct NewsAggregator {
    hackernews: HackerNewsSource,
    reddit: RedditSource,
    rss: RssFeedSource,
}

impl NewsAggregator {
    pub fn new(reddit_app: RedditAppConfig) -> Self {
        Self::with_client(Arc::new(HttpClient::new()), reddit_app)
    }

    /// Build on a shared transport. Tests inject a seeded client here.
    pub fn with_client(http: Arc<HttpClient>, reddit_app: RedditAppConfig) -> Self {
        Self {
            hackernews: HackerNewsSource::new(http.clone()),
            reddit: RedditSource::new(http.clone(), reddit_app),
            rss: RssFeedSource::new(http),
        }
    }

    /// Replace the forum adapter, e.g. one with overridden OAuth endpoints.
    pub fn with_reddit_source(mut self, reddit: RedditSource) -> Self {
        self.reddit = reddit;
        self
    }

    /// Fetch every configured source under the partial-failure policy.
    pub async fn fetch_all(&self, specs: &[SourceSpec]) -> Result<AggregateResult, AggregateError> {
        let mut attempts = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.fetch_source(spec).await {
                Ok(items) => {
                    info!(source = %spec.name, items = items.len(), "fetched source");
                    attempts.push(Ok((spec.name.clone(), items)));
                }
                Err(e) => {
                    warn!(source = %spec.name, error = %e, "failed to fetch source, skipping");
                    attempts.push(Err(spec.name.clone()));
                }
            }
        }

        let entries = combine(attempts).map_err(|skipped| AggregateError { skipped })?;
        Ok(entries.into_iter().collect())
    }

    /// Dispatch one spec to the adapter its declared type selects. An
    /// unrecognized type fails this source, not the whole batch.
    pub async fn fetch_source(&self, spec: &SourceSpec) -> Result<Vec<NewsItem>, SourceError> {
        match spec.kind.parse::<SourceKind>()? {
            SourceKind::HackerNewsTop => self.hackernews.fetch_top_stories(spec).await,
            SourceKind::HackerNewsBest => self.hackernews.fetch_best_stories(spec).await,
            SourceKind::Reddit => self.reddit.fetch_hot(spec).await,
            SourceKind::Rss => self.rss.fetch_articles(spec).await,
        }
    }
}
