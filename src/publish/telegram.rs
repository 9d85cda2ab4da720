use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::PublishError;
use crate::fetcher::DEFAULT_USER_AGENT;

const API_BASE: &str = "https://api.telegram.org";

/// Telegram message formatting mode. `MarkdownV2` is the stricter dialect
/// and requires reserved characters to be escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Markdown,
    MarkdownV2,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
            ParseMode::MarkdownV2 => "MarkdownV2",
        }
    }
}

/// Escape every character the MarkdownV2 dialect reserves.
pub fn escape_markdown_v2(text: &str) -> String {
    const RESERVED: &[char] = &[
        '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    message_thread_id: i64,
    parse_mode: &'a str,
}

/// Posts digest messages to a chat thread via the bot API.
pub struct TelegramPublisher {
    client: reqwest::Client,
    bot_token: String,
    api_base: String,
}

impl TelegramPublisher {
    pub fn new(bot_token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            bot_token,
            api_base: API_BASE.to_string(),
        }
    }

    /// Override the API base URL. Tests point this at a local server.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Post one message. A non-200 response surfaces as [`PublishError`];
    /// callers decide whether that is fatal for the run.
    pub async fn send_message(
        &self,
        text: &str,
        chat_id: i64,
        thread_id: i64,
        parse_mode: ParseMode,
    ) -> Result<(), PublishError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let payload = SendMessage {
            chat_id,
            text,
            message_thread_id: thread_id,
            parse_mode: parse_mode.as_str(),
        };

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Status { status, body });
        }

        debug!(chat_id, thread_id, "message delivered");
        Ok(())
    }
}
