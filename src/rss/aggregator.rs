//! Concurrent fan-out over every configured feed.

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use super::client::FeedSource;
use super::types::{FeedDocument, FetchError, MAX_RETRIES, RETRY_DELAY};
use crate::article::{normalize, Article};
use crate::TARGET_WEB_REQUEST;

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Extra attempts after a network failure. Parse and URL errors are never retried.
    pub max_retries: usize,
    pub retry_delay: Duration,
    /// Upper bound on simultaneous fetches. `None` runs one per URL.
    pub max_concurrency: Option<usize>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            retry_delay: RETRY_DELAY,
            max_concurrency: None,
        }
    }
}

/// What happened to one configured URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FeedOutcome {
    Fetched { url: String, items: usize },
    Failed(FetchError),
}

#[derive(Debug, Default)]
pub struct AggregateReport {
    /// Articles of every successful feed, grouped by feed in configuration
    /// order, each group in source order.
    pub articles: Vec<Article>,
    /// One entry per non-blank URL, same order as the input.
    pub outcomes: Vec<FeedOutcome>,
}

impl AggregateReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FeedOutcome::Fetched { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FetchError> {
        self.outcomes.iter().filter_map(|o| match o {
            FeedOutcome::Failed(err) => Some(err),
            FeedOutcome::Fetched { .. } => None,
        })
    }
}

/// Fetch every URL concurrently and normalize whatever succeeds.
///
/// Always returns: a feed that cannot be fetched or parsed is logged and
/// recorded in `outcomes`, never propagated. The call waits for every fetch
/// before returning, and article order never depends on completion order.
pub async fn aggregate<S>(source: &S, urls: &[String], options: &AggregateOptions) -> AggregateReport
where
    S: FeedSource + ?Sized,
{
    let urls: Vec<&str> = urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| {
            if u.is_empty() {
                debug!(target: TARGET_WEB_REQUEST, "Skipping empty feed URL");
            }
            !u.is_empty()
        })
        .collect();

    let fetches = urls
        .iter()
        .map(|url| fetch_with_retries(source, url, options));

    // Each slot belongs to the URL at the same index.
    let results: Vec<Result<FeedDocument, FetchError>> = match options.max_concurrency {
        Some(limit) => stream::iter(fetches).buffered(limit.max(1)).collect().await,
        None => join_all(fetches).await,
    };

    let mut report = AggregateReport::default();
    for (url, result) in urls.iter().zip(results) {
        match result {
            Ok(document) => {
                let count = document.items.len();
                debug!(target: TARGET_WEB_REQUEST, "Parsed {} entries from {}", count, url);
                report
                    .articles
                    .extend(document.items.into_iter().map(normalize));
                report.outcomes.push(FeedOutcome::Fetched {
                    url: url.to_string(),
                    items: count,
                });
            }
            Err(err) => {
                error!(target: TARGET_WEB_REQUEST, "Failed to process URL {}: {}", url, err);
                report.outcomes.push(FeedOutcome::Failed(err));
            }
        }
    }

    info!(
        target: TARGET_WEB_REQUEST,
        "Aggregated {} articles from {}/{} feeds",
        report.articles.len(),
        report.succeeded(),
        report.outcomes.len()
    );

    report
}

async fn fetch_with_retries<S>(
    source: &S,
    url: &str,
    options: &AggregateOptions,
) -> Result<FeedDocument, FetchError>
where
    S: FeedSource + ?Sized,
{
    let mut attempts = 0;
    loop {
        match source.fetch_and_parse(url).await {
            Ok(document) => return Ok(document),
            Err(err) if err.is_retryable() && attempts < options.max_retries => {
                attempts += 1;
                warn!(
                    target: TARGET_WEB_REQUEST,
                    "Attempt {} failed for {} ({}), retrying in {:?}",
                    attempts, url, err, options.retry_delay
                );
                sleep(options.retry_delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rss::types::{FeedItem, FetchErrorKind};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves canned documents; unknown URLs fail as unreachable. Feeds listed
    /// in `delays` answer late so completion order differs from input order.
    #[derive(Default)]
    struct StubSource {
        feeds: HashMap<String, Vec<FeedItem>>,
        delays: HashMap<String, u64>,
        flaky: Mutex<HashMap<String, usize>>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn with_feed(mut self, url: &str, titles: &[&str]) -> Self {
            let items = titles
                .iter()
                .map(|t| FeedItem {
                    title: t.to_string(),
                    link: format!("{}/{}", url, t),
                    description: String::new(),
                    published_raw: String::new(),
                })
                .collect();
            self.feeds.insert(url.to_string(), items);
            self
        }

        fn with_delay(mut self, url: &str, millis: u64) -> Self {
            self.delays.insert(url.to_string(), millis);
            self
        }

        fn failing_first(self, url: &str, times: usize) -> Self {
            self.flaky.lock().unwrap().insert(url.to_string(), times);
            self
        }
    }

    #[async_trait]
    impl FeedSource for StubSource {
        async fn fetch_and_parse(&self, url: &str) -> Result<FeedDocument, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(millis) = self.delays.get(url) {
                sleep(Duration::from_millis(*millis)).await;
            }
            {
                let mut flaky = self.flaky.lock().unwrap();
                if let Some(remaining) = flaky.get_mut(url) {
                    if *remaining > 0 {
                        *remaining -= 1;
                        return Err(FetchError::network(url, "connection reset"));
                    }
                }
            }
            if url == "bad" {
                return Err(FetchError::invalid_url(url, "bad"));
            }
            match self.feeds.get(url) {
                Some(items) => Ok(FeedDocument {
                    source_url: url.to_string(),
                    title: None,
                    items: items.clone(),
                }),
                None => Err(FetchError::network(url, "unreachable")),
            }
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn titles(report: &AggregateReport) -> Vec<&str> {
        report.articles.iter().map(|a| a.title.as_str()).collect()
    }

    fn quick() -> AggregateOptions {
        AggregateOptions {
            max_retries: 0,
            retry_delay: Duration::from_millis(1),
            max_concurrency: None,
        }
    }

    #[tokio::test]
    async fn test_empty_url_list() {
        let source = StubSource::default();
        let report = aggregate(&source, &[], &quick()).await;
        assert!(report.articles.is_empty());
        assert!(report.outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_order_follows_configuration_not_completion() {
        let source = StubSource::default()
            .with_feed("a", &["a1", "a2"])
            .with_feed("b", &["b1"])
            .with_delay("a", 50);

        let report = aggregate(&source, &urls(&["a", "b"]), &quick()).await;
        assert_eq!(titles(&report), vec!["a1", "a2", "b1"]);
        assert_eq!(report.succeeded(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let source = StubSource::default().with_feed("a", &["a1"]);

        let report = aggregate(&source, &urls(&["down", "a", "bad"]), &quick()).await;
        assert_eq!(titles(&report), vec!["a1"]);
        assert_eq!(report.succeeded(), 1);

        let kinds: Vec<FetchErrorKind> = report.failures().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![FetchErrorKind::NetworkFailure, FetchErrorKind::InvalidUrl]);
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_report() {
        let source = StubSource::default();
        let report = aggregate(&source, &urls(&["x", "y"]), &quick()).await;
        assert!(report.articles.is_empty());
        assert_eq!(report.failures().count(), 2);
    }

    #[tokio::test]
    async fn test_blank_urls_are_skipped() {
        let source = StubSource::default().with_feed("a", &["a1"]);
        let report = aggregate(&source, &urls(&["", "  ", "a"]), &quick()).await;
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_network_failures_are_retried() {
        let source = StubSource::default()
            .with_feed("a", &["a1"])
            .failing_first("a", 2);

        let options = AggregateOptions {
            max_retries: 2,
            ..quick()
        };
        let report = aggregate(&source, &urls(&["a"]), &options).await;
        assert_eq!(titles(&report), vec!["a1"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_retried() {
        let source = StubSource::default();
        let options = AggregateOptions {
            max_retries: 3,
            ..quick()
        };
        let report = aggregate(&source, &urls(&["bad"]), &options).await;
        assert_eq!(report.failures().count(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bounded_concurrency_keeps_order() {
        let source = StubSource::default()
            .with_feed("a", &["a1"])
            .with_feed("b", &["b1"])
            .with_feed("c", &["c1"])
            .with_delay("a", 30);

        let options = AggregateOptions {
            max_concurrency: Some(2),
            ..quick()
        };
        let report = aggregate(&source, &urls(&["a", "b", "c"]), &options).await;
        assert_eq!(titles(&report), vec!["a1", "b1", "c1"]);
    }
}
