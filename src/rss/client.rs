//! HTTP client creation and request handling for RSS feeds.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header;
use tokio::time::Duration;
use tracing::debug;

use super::parser::parse_feed;
use super::types::{FeedDocument, FetchError, FEED_ACCEPT, REQUEST_TIMEOUT, USER_AGENT};
use super::util::{decode_body, is_valid_url};
use crate::TARGET_WEB_REQUEST;

/// Anything that can fetch a feed URL and parse it into a `FeedDocument`.
///
/// One call is one attempt: implementations must not retry.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_and_parse(&self, url: &str) -> Result<FeedDocument, FetchError>;
}

/// Create the shared HTTP client used for every feed request in a run.
///
/// `request_timeout` bounds the whole exchange, from connecting until the
/// body has been read.
pub fn create_http_client(request_timeout: Duration) -> Result<reqwest::Client> {
    debug!(target: TARGET_WEB_REQUEST, "Creating HTTP client with {:?} timeout", request_timeout);

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .gzip(true)
        .timeout(request_timeout)
        .redirect(reqwest::redirect::Policy::default())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))
}

/// `FeedSource` backed by a real HTTP client.
#[derive(Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpFeedSource {
    pub fn new(client: reqwest::Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    pub fn with_timeout(request_timeout: Duration) -> Result<Self> {
        Ok(Self::new(create_http_client(request_timeout)?, request_timeout))
    }

    pub fn with_defaults() -> Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    fn network_error(&self, url: &str, context: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::network(url, format!("timed out after {:?}", self.request_timeout))
        } else {
            FetchError::network(url, format!("{}: {}", context, err))
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_and_parse(&self, url: &str) -> Result<FeedDocument, FetchError> {
        if !is_valid_url(url) {
            return Err(FetchError::invalid_url(url, "expected an absolute http(s) URL"));
        }

        debug!(target: TARGET_WEB_REQUEST, "Loading RSS feed from {}", url);

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, FEED_ACCEPT)
            .send()
            .await
            .map_err(|err| self.network_error(url, "request failed", err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::network(url, format!("HTTP status {}", status)));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|s| s.to_lowercase());

        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.network_error(url, "failed to read body", err))?;

        debug!(target: TARGET_WEB_REQUEST, "Received {} bytes from {}", bytes.len(), url);

        let text = decode_body(&bytes, content_type.as_deref());
        parse_feed(&text, content_type.as_deref(), url)
    }
}
