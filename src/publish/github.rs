use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::PublishError;
use crate::fetcher::DEFAULT_USER_AGENT;

const API_BASE: &str = "https://api.github.com";

#[derive(Debug, Serialize)]
struct IssueRequest<'a> {
    title: &'a str,
    body: &'a str,
}

/// Subset of the create-issue response worth reporting back.
#[derive(Debug, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub html_url: String,
}

/// Creates one issue per digest run on the configured repository.
pub struct GithubPublisher {
    client: reqwest::Client,
    token: String,
    owner: String,
    repo: String,
    api_base: String,
}

impl GithubPublisher {
    pub fn new(token: String, owner: String, repo: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            token,
            owner,
            repo,
            api_base: API_BASE.to_string(),
        }
    }

    /// Override the API base URL, e.g. for a self-hosted instance or tests.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Create an issue carrying the rendered digest.
    pub async fn create_issue(&self, title: &str, body: &str) -> Result<Issue, PublishError> {
        let url = format!(
            "{}/repos/{}/{}/issues",
            self.api_base, self.owner, self.repo
        );
        debug!(%url, "creating issue");

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, DEFAULT_USER_AGENT)
            .json(&IssueRequest { title, body })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Status { status, body });
        }

        Ok(response.json().await?)
    }
}
