use std::env;

use thiserror::Error;

use crate::types::SourceSpec;

const DEFAULT_LIMIT: usize = 10;

/// Fatal at startup; nothing is fetched with a broken configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(String),
    #[error("invalid {name}: {reason}")]
    Invalid { name: String, reason: String },
    #[error("no valid sources configured")]
    NoSources,
}

/// Application configuration assembled from environment variables.
///
/// `SOURCES` holds a comma-separated list of source names; each name `N`
/// is then described by `SOURCE_N_TYPE`, `SOURCE_N_URL`, an optional
/// `SOURCE_N_LIMIT` (default 10) and an optional `SOURCE_N_SUBSOURCE`.
#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub github_owner: String,
    pub github_repo: String,
    pub sources: Vec<SourceSpec>,
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parameterized over the variable lookup so tests never touch
    /// process-wide environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let github_token = require(&lookup, "GITHUB_TOKEN")?;
        let github_owner = require(&lookup, "GITHUB_OWNER")?;
        let github_repo = require(&lookup, "GITHUB_REPO")?;
        let sources = parse_sources(&lookup)?;

        Ok(Self {
            github_token,
            github_owner,
            github_repo,
            sources,
        })
    }
}

fn require(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn parse_sources(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Vec<SourceSpec>, ConfigError> {
    let list = require(lookup, "SOURCES")?;

    let mut sources = Vec::new();
    for name in list.split(',') {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }

        let kind = require(lookup, &format!("SOURCE_{name}_TYPE"))?;
        let url = require(lookup, &format!("SOURCE_{name}_URL"))?;

        let limit_key = format!("SOURCE_{name}_LIMIT");
        let limit = match lookup(&limit_key).filter(|v| !v.is_empty()) {
            Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
                name: limit_key,
                reason: e.to_string(),
            })?,
            None => DEFAULT_LIMIT,
        };

        let sub_source =
            lookup(&format!("SOURCE_{name}_SUBSOURCE")).filter(|v| !v.is_empty());

        sources.push(SourceSpec {
            name: name.to_string(),
            kind,
            url,
            limit,
            sub_source,
        });
    }

    if sources.is_empty() {
        return Err(ConfigError::NoSources);
    }
    Ok(sources)
}

/// OAuth application credentials for the forum adapter. Missing values are
/// not an error; the adapter degrades to unauthenticated requests.
#[derive(Debug, Clone, Default)]
pub struct RedditAppConfig {
    pub app_id: String,
    pub app_secret: String,
}

impl RedditAppConfig {
    pub fn from_env() -> Self {
        Self {
            app_id: env::var("REDDIT_APP_ID").unwrap_or_default(),
            app_secret: env::var("REDDIT_APP_SECRET").unwrap_or_default(),
        }
    }
}

/// Chat publisher credentials. Optional as a whole: when absent the digest
/// is still produced, only the chat delivery is skipped.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
    pub thread_id: i64,
}

impl TelegramConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = require(&lookup, "TELEGRAM_BOT_TOKEN")?;
        let chat_id = parse_i64(&lookup, "TELEGRAM_CHAT_ID")?;
        let thread_id = parse_i64(&lookup, "TELEGRAM_THREAD_ID")?;
        Ok(Self {
            bot_token,
            chat_id,
            thread_id,
        })
    }
}

fn parse_i64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<i64, ConfigError> {
    require(lookup, key)?
        .parse::<i64>()
        .map_err(|e| ConfigError::Invalid {
            name: key.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn base_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_OWNER", "o"),
            ("GITHUB_REPO", "r"),
            ("SOURCES", "HN, REDDIT"),
            ("SOURCE_HN_TYPE", "hackernews"),
            ("SOURCE_HN_URL", "https://hacker-news.firebaseio.com/v0"),
            ("SOURCE_REDDIT_TYPE", "reddit"),
            ("SOURCE_REDDIT_URL", "https://www.reddit.com"),
            ("SOURCE_REDDIT_LIMIT", "5"),
            ("SOURCE_REDDIT_SUBSOURCE", "rust"),
        ]
    }

    #[test]
    fn loads_sources_with_defaults() {
        let env = base_env();
        let config = Config::from_lookup(lookup_from(&env)).unwrap();

        assert_eq!(config.sources.len(), 2);
        let hn = &config.sources[0];
        assert_eq!(hn.name, "HN");
        assert_eq!(hn.limit, DEFAULT_LIMIT);
        assert_eq!(hn.sub_source, None);

        let reddit = &config.sources[1];
        assert_eq!(reddit.limit, 5);
        assert_eq!(reddit.sub_source.as_deref(), Some("rust"));
    }

    #[test]
    fn missing_required_variable_is_an_error() {
        let mut env = base_env();
        env.retain(|(k, _)| *k != "GITHUB_TOKEN");
        let err = Config::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(k) if k == "GITHUB_TOKEN"));
    }

    #[test]
    fn missing_per_source_type_is_an_error() {
        let mut env = base_env();
        env.retain(|(k, _)| *k != "SOURCE_HN_TYPE");
        let err = Config::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(k) if k == "SOURCE_HN_TYPE"));
    }

    #[test]
    fn invalid_limit_is_an_error() {
        let mut env = base_env();
        env.push(("SOURCE_HN_LIMIT", "many"));
        let err = Config::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == "SOURCE_HN_LIMIT"));
    }

    #[test]
    fn blank_entries_in_the_source_list_are_skipped() {
        let mut env = base_env();
        env.retain(|(k, _)| *k != "SOURCES");
        env.push(("SOURCES", " ,HN,, REDDIT ,"));
        let config = Config::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(config.sources.len(), 2);
    }

    #[test]
    fn all_blank_source_list_is_an_error() {
        let mut env = base_env();
        env.retain(|(k, _)| *k != "SOURCES");
        env.push(("SOURCES", " , ,"));
        let err = Config::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::NoSources));
    }

    #[test]
    fn telegram_config_parses_numeric_ids() {
        let env = vec![
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-1001234"),
            ("TELEGRAM_THREAD_ID", "42"),
        ];
        let config = TelegramConfig::from_lookup(lookup_from(&env)).unwrap();
        assert_eq!(config.chat_id, -1001234);
        assert_eq!(config.thread_id, 42);
    }

    #[test]
    fn telegram_config_rejects_non_numeric_chat_id() {
        let env = vec![
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "general"),
            ("TELEGRAM_THREAD_ID", "42"),
        ];
        let err = TelegramConfig::from_lookup(lookup_from(&env)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == "TELEGRAM_CHAT_ID"));
    }
}
