//! Publishers delivering the rendered digest to external services.

pub mod github;
pub mod telegram;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status code {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}
