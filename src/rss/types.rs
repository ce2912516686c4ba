//! Type definitions for the RSS module.

use serde::Serialize;
use std::fmt;
use tokio::time::Duration;

/// A single entry as presented by the source feed, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Publish date in whatever format the source used. Empty when absent.
    pub published_raw: String,
}

/// Parse result for one feed URL. Items keep the order the source gave them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedDocument {
    pub source_url: String,
    pub title: Option<String>,
    pub items: Vec<FeedItem>,
}

/// Why a single feed could not contribute articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FetchErrorKind {
    InvalidUrl,
    NetworkFailure,
    ParseFailure,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FetchErrorKind::InvalidUrl => "invalid url",
            FetchErrorKind::NetworkFailure => "network failure",
            FetchErrorKind::ParseFailure => "parse failure",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind} for {url}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub fn invalid_url(url: &str, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::InvalidUrl,
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn network(url: &str, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::NetworkFailure,
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn parse(url: &str, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::ParseFailure,
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Only transport problems are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.kind == FetchErrorKind::NetworkFailure
    }
}

/// JSON Feed (jsonfeed.org) top-level structure
#[derive(Debug, serde::Deserialize)]
pub struct JsonFeed {
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<JsonFeedItem>,
}

/// JSON Feed item structure
#[derive(Debug, serde::Deserialize)]
pub struct JsonFeedItem {
    pub id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content_text: Option<String>,
    pub content_html: Option<String>,
    pub date_published: Option<String>,
    pub date_modified: Option<String>,
}

// Constants
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const RETRY_DELAY: Duration = Duration::from_secs(5);
pub const MAX_RETRIES: usize = 0;
pub const USER_AGENT: &str = concat!("feedpage/", env!("CARGO_PKG_VERSION"));
pub const FEED_ACCEPT: &str = "application/rss+xml, application/atom+xml, application/feed+json, application/json, application/xml, text/xml, */*;q=0.9";
