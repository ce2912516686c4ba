//! One end-to-end run: configuration in, published page out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::config::{ConfigSource, ConfigurationError};
use crate::filter::filter_by_title;
use crate::publish::{PageSink, PublishError};
use crate::render::{render_page, PageOptions, RenderError};
use crate::rss::{aggregate, AggregateOptions, FeedOutcome, FeedSource};
use crate::sort::sort_by_recency;
use crate::TARGET_PIPELINE;

/// Fatal problems. Individual feed failures never show up here.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub aggregate: AggregateOptions,
    pub page_title: String,
    /// Stamped into the page footer when set.
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            aggregate: AggregateOptions::default(),
            page_title: PageOptions::default().title,
            generated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub feeds_attempted: usize,
    pub feeds_succeeded: usize,
    pub feeds_failed: usize,
    pub articles_fetched: usize,
    pub articles_published: usize,
    pub page_bytes: usize,
    pub location: String,
    pub outcomes: Vec<FeedOutcome>,
}

/// Load config, aggregate, filter, sort, render and publish.
///
/// Succeeds however many feeds fail; configuration, render and publish
/// errors end the run.
#[instrument(level = "info", skip_all, fields(config = %config_source.describe()))]
pub async fn run_pipeline<C, F, P>(
    config_source: &C,
    feed_source: &F,
    sink: &P,
    options: &RunOptions,
) -> Result<RunSummary, RunError>
where
    C: ConfigSource + ?Sized,
    F: FeedSource + ?Sized,
    P: PageSink + ?Sized,
{
    let config = config_source.load().await.map_err(|err| {
        error!(target: TARGET_PIPELINE, "Configuration error: {}", err);
        err
    })?;

    info!(
        target: TARGET_PIPELINE,
        "Starting run with {} feeds and {} phrases",
        config.urls.len(),
        config.phrases.len()
    );
    if config.phrases.is_empty() {
        warn!(target: TARGET_PIPELINE, "No phrases configured; the page will list no articles");
    }

    let report = aggregate(feed_source, &config.urls, &options.aggregate).await;
    let feeds_succeeded = report.succeeded();
    let feeds_attempted = report.outcomes.len();
    let articles_fetched = report.articles.len();

    for failure in report.failures() {
        warn!(target: TARGET_PIPELINE, "Feed excluded ({}): {}", failure.kind, failure.url);
    }

    let matched = filter_by_title(report.articles, &config.phrases);
    let ordered = sort_by_recency(matched);
    info!(
        target: TARGET_PIPELINE,
        "{} of {} articles matched the configured phrases",
        ordered.len(),
        articles_fetched
    );

    let page_options = PageOptions {
        title: options.page_title.clone(),
        generated_at: options.generated_at,
    };
    let page = render_page(&ordered, &page_options).map_err(|err| {
        error!(target: TARGET_PIPELINE, "Render error: {}", err);
        err
    })?;

    let location = sink.publish(&page).await.map_err(|err| {
        error!(target: TARGET_PIPELINE, "Publish error: {}", err);
        err
    })?;

    let summary = RunSummary {
        feeds_attempted,
        feeds_succeeded,
        feeds_failed: feeds_attempted - feeds_succeeded,
        articles_fetched,
        articles_published: ordered.len(),
        page_bytes: page.len(),
        location,
        outcomes: report.outcomes,
    };

    info!(
        target: TARGET_PIPELINE,
        "Finished: {} articles published to {} ({}/{} feeds ok)",
        summary.articles_published,
        summary.location,
        summary.feeds_succeeded,
        summary.feeds_attempted
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::rss::{FeedDocument, FeedItem, FetchError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubFeeds {
        feeds: HashMap<String, Vec<FeedItem>>,
    }

    impl StubFeeds {
        fn with_item(mut self, url: &str, title: &str, published_raw: &str) -> Self {
            self.feeds.entry(url.to_string()).or_default().push(FeedItem {
                title: title.to_string(),
                link: format!("https://example.com/{}", title.len()),
                description: String::new(),
                published_raw: published_raw.to_string(),
            });
            self
        }
    }

    #[async_trait]
    impl FeedSource for StubFeeds {
        async fn fetch_and_parse(&self, url: &str) -> Result<FeedDocument, FetchError> {
            self.feeds
                .get(url)
                .map(|items| FeedDocument {
                    source_url: url.to_string(),
                    title: None,
                    items: items.clone(),
                })
                .ok_or_else(|| FetchError::network(url, "unreachable"))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        pages: Mutex<Vec<Vec<u8>>>,
    }

    #[async_trait]
    impl PageSink for MemorySink {
        async fn publish(&self, page: &[u8]) -> Result<String, PublishError> {
            self.pages.lock().unwrap().push(page.to_vec());
            Ok("memory".to_string())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl PageSink for FailingSink {
        async fn publish(&self, _page: &[u8]) -> Result<String, PublishError> {
            Err(PublishError::Upload {
                location: "nowhere".to_string(),
                reason: "denied".to_string(),
            })
        }
    }

    struct BrokenConfig;

    #[async_trait]
    impl ConfigSource for BrokenConfig {
        async fn load(&self) -> Result<Configuration, ConfigurationError> {
            Configuration::from_json(b"{\"urls\": []}", "broken")
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    fn config(urls: &[&str], phrases: &[&str]) -> Configuration {
        Configuration {
            urls: urls.iter().map(|s| s.to_string()).collect(),
            phrases: phrases.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_partial_failure_still_publishes() {
        let feeds = StubFeeds::default()
            .with_item("a", "Company X Acquisition", "2024-01-02T00:00:00Z")
            .with_item("b", "Weather Update", "2024-01-03T00:00:00Z");
        let sink = MemorySink::default();

        let summary = run_pipeline(
            &config(&["a", "b", "down"], &["Acquisition"]),
            &feeds,
            &sink,
            &RunOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(summary.feeds_attempted, 3);
        assert_eq!(summary.feeds_succeeded, 2);
        assert_eq!(summary.feeds_failed, 1);
        assert_eq!(summary.articles_fetched, 2);
        assert_eq!(summary.articles_published, 1);
        assert_eq!(summary.location, "memory");

        let pages = sink.pages.lock().unwrap();
        let page = String::from_utf8(pages[0].clone()).unwrap();
        assert!(page.contains("Company X Acquisition"));
        assert!(!page.contains("Weather Update"));
        assert_eq!(summary.page_bytes, pages[0].len());
    }

    #[tokio::test]
    async fn test_configuration_error_is_fatal() {
        let sink = MemorySink::default();
        let err = run_pipeline(&BrokenConfig, &StubFeeds::default(), &sink, &RunOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Configuration(_)));
        assert!(sink.pages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_error_is_fatal() {
        let err = run_pipeline(
            &config(&[], &["x"]),
            &StubFeeds::default(),
            &FailingSink,
            &RunOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RunError::Publish(_)));
    }
}
