use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use news_digest::aggregator::{AggregateResult, NewsAggregator};
use news_digest::config::{Config, RedditAppConfig, TelegramConfig};
use news_digest::digest;
use news_digest::publish::github::GithubPublisher;
use news_digest::publish::telegram::{escape_markdown_v2, ParseMode, TelegramPublisher};

/// Aggregate the configured news sources and publish a daily digest.
#[derive(Parser)]
#[command(name = "news-digest", version, about)]
struct Cli {
    /// Digest date override (YYYY-MM-DD); defaults to today in UTC.
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Publish the digest as an issue on the configured repository.
    Issue,
    /// Write the digest to a dated markdown file.
    Markdown {
        /// Directory the dated digest files are written into.
        #[arg(long, default_value = "news")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;
    let date = cli.date.unwrap_or_else(|| Utc::now().date_naive());

    let aggregator = NewsAggregator::new(RedditAppConfig::from_env());
    info!(sources = config.sources.len(), "fetching news from all sources");
    let news = aggregator
        .fetch_all(&config.sources)
        .await
        .context("fetching news")?;

    let document = digest::render_document(date, &news);

    match cli.command {
        Command::Issue => publish_issue(&config, date, &document).await?,
        Command::Markdown { out_dir } => write_markdown(&out_dir, date, &document, &news).await?,
    }

    Ok(())
}

async fn publish_issue(config: &Config, date: NaiveDate, document: &str) -> anyhow::Result<()> {
    let publisher = GithubPublisher::new(
        config.github_token.clone(),
        config.github_owner.clone(),
        config.github_repo.clone(),
    );
    let title = format!("Daily News Digest - {}", date.format("%Y-%m-%d"));

    info!(%title, "creating issue");
    let issue = publisher
        .create_issue(&title, document)
        .await
        .context("creating issue")?;
    info!(number = issue.number, url = %issue.html_url, "issue created");

    // Chat delivery is best-effort; the issue is already out.
    match TelegramConfig::from_env() {
        Ok(telegram) => {
            let chat = TelegramPublisher::new(telegram.bot_token.clone());
            match chat
                .send_message(document, telegram.chat_id, telegram.thread_id, ParseMode::Markdown)
                .await
            {
                Ok(()) => info!("chat message sent"),
                Err(e) => warn!(error = %e, "failed to send chat message"),
            }
        }
        Err(e) => info!(reason = %e, "chat publishing disabled"),
    }

    Ok(())
}

async fn write_markdown(
    out_dir: &PathBuf,
    date: NaiveDate,
    document: &str,
    news: &AggregateResult,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    let path = out_dir.join(format!("{}.md", date.format("%Y-%m-%d")));
    std::fs::write(&path, document).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "digest written");

    match TelegramConfig::from_env() {
        Ok(telegram) => {
            let chat = TelegramPublisher::new(telegram.bot_token.clone());
            for (source, items) in news {
                if items.is_empty() {
                    continue;
                }
                let text = source_message(date, source, items);
                if let Err(e) = chat
                    .send_message(&text, telegram.chat_id, telegram.thread_id, ParseMode::MarkdownV2)
                    .await
                {
                    warn!(source = %source, error = %e, "failed to send chat message");
                }
            }
        }
        Err(e) => info!(reason = %e, "chat publishing disabled"),
    }

    Ok(())
}

/// One MarkdownV2 chat message per source: a bold dated header followed by
/// the numbered title/link list.
fn source_message(date: NaiveDate, source: &str, items: &[news_digest::NewsItem]) -> String {
    let header = escape_markdown_v2(&format!("[{}] {}", date.format("%Y-%m-%d"), source));
    let mut text = format!("*{header}*\n\n");
    for (i, item) in items.iter().enumerate() {
        text.push_str(&format!(
            "{}\\. [{}]({})\n",
            i + 1,
            escape_markdown_v2(&item.title),
            item.url
        ));
    }
    text
}
