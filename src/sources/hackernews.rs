use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;

use super::{from_unix, sort_by_score, SourceError};
use crate::fetcher::{FetchError, HttpClient};
use crate::types::{combine, NewsItem, SourceSpec};

const SOURCE_LABEL: &str = "Hacker News";
/// Canonical story page, used when an item has no external URL.
const ITEM_PAGE_URL: &str = "https://news.ycombinator.com/item";

/// Raw story payload from the item endpoint. Fields are sparse: self-posts
/// carry no `url`, and deleted items may carry nothing at all.
#[derive(Debug, Deserialize)]
struct Story {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    descendants: i64,
    #[serde(default)]
    time: i64,
}

/// Adapter for the Hacker News Firebase API: a list endpoint returns story
/// ids, each story is then fetched individually.
pub struct HackerNewsSource {
    http: Arc<HttpClient>,
}

impl HackerNewsSource {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Fetch the current top stories, highest score first.
    pub async fn fetch_top_stories(&self, spec: &SourceSpec) -> Result<Vec<NewsItem>, SourceError> {
        self.fetch_list(spec, "topstories.json").await
    }

    /// Fetch the current best stories, highest score first.
    pub async fn fetch_best_stories(&self, spec: &SourceSpec) -> Result<Vec<NewsItem>, SourceError> {
        self.fetch_list(spec, "beststories.json").await
    }

    async fn fetch_list(
        &self,
        spec: &SourceSpec,
        list: &str,
    ) -> Result<Vec<NewsItem>, SourceError> {
        let list_url = format!("{}/{}", spec.url.trim_end_matches('/'), list);
        let mut ids: Vec<i64> = self.http.get_json(&list_url).await?;
        // The list endpoint's own ordering decides which ids are attempted.
        ids.truncate(spec.limit);

        let mut attempts = Vec::with_capacity(ids.len());
        for id in ids {
            match self.fetch_story(spec, id).await {
                Ok(Some(item)) => attempts.push(Ok(item)),
                Ok(None) => {
                    warn!(id, "skipping story without a title");
                    attempts.push(Err(id));
                }
                Err(e) => {
                    warn!(id, error = %e, "failed to fetch story, skipping");
                    attempts.push(Err(id));
                }
            }
        }

        let mut items = combine(attempts).map_err(|skipped| SourceError::Exhausted {
            label: SOURCE_LABEL.to_string(),
            skipped: skipped.iter().map(i64::to_string).collect(),
        })?;

        sort_by_score(&mut items);
        Ok(items)
    }

    async fn fetch_story(
        &self,
        spec: &SourceSpec,
        id: i64,
    ) -> Result<Option<NewsItem>, FetchError> {
        let item_url = format!("{}/item/{}.json", spec.url.trim_end_matches('/'), id);
        let story: Story = self.http.get_json(&item_url).await?;

        if story.title.is_empty() {
            return Ok(None);
        }

        let url = if story.url.is_empty() {
            format!("{ITEM_PAGE_URL}?id={id}")
        } else {
            story.url
        };

        Ok(Some(NewsItem {
            title: story.title,
            url,
            description: format!(
                "Score: {}, Comments: {}",
                story.score, story.descendants
            ),
            source: SOURCE_LABEL.to_string(),
            sub_source: None,
            published_at: from_unix(story.time),
            score: story.score,
            comments: story.descendants,
        }))
    }
}
