use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tokio::signal;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use feedpage::config::{ConfigSource, LocalFileConfig};
use feedpage::environment::{get_env_var_or, get_env_var_parsed, get_optional_env_var};
use feedpage::logging;
use feedpage::publish::{LocalFileSink, PageSink};
use feedpage::rss::{AggregateOptions, HttpFeedSource};
use feedpage::storage::{create_s3_client, S3ConfigSource, S3PageSink, StorageSettings};
use feedpage::{run_pipeline, RunOptions, TARGET_PIPELINE};

#[derive(Parser)]
#[command(author, version, about = "Builds a static headline page from syndication feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read configuration from S3 and publish the page to S3
    Remote {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Read configuration from a local file and write the page to a local file
    Local {
        /// Configuration JSON with `urls` and `phrases`
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Where to write the rendered page
        #[arg(short, long, default_value = "out.html")]
        output: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Repeat the run every N minutes instead of exiting after one
    #[arg(short, long)]
    watch: Option<u64>,

    /// Page heading (defaults to FEEDPAGE_PAGE_TITLE or "prtech.news")
    #[arg(short, long)]
    title: Option<String>,

    /// Add an "Updated" timestamp to the page footer
    #[arg(long)]
    stamp: bool,

    /// Cap on simultaneous feed requests
    #[arg(long)]
    max_concurrency: Option<usize>,
}

impl RunArgs {
    fn options(&self) -> RunOptions {
        let defaults = AggregateOptions::default();
        let max_concurrency = self
            .max_concurrency
            .or_else(|| get_optional_env_var("FEEDPAGE_MAX_CONCURRENCY").and_then(|v| v.parse().ok()));

        RunOptions {
            aggregate: AggregateOptions {
                max_retries: get_env_var_parsed("FEEDPAGE_MAX_RETRIES", defaults.max_retries),
                retry_delay: Duration::from_secs(get_env_var_parsed(
                    "FEEDPAGE_RETRY_DELAY_SECS",
                    defaults.retry_delay.as_secs(),
                )),
                max_concurrency,
            },
            page_title: self
                .title
                .clone()
                .unwrap_or_else(|| get_env_var_or("FEEDPAGE_PAGE_TITLE", "prtech.news")),
            generated_at: None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::configure_logging();

    let cli = Cli::parse();

    let request_timeout = Duration::from_secs(get_env_var_parsed(
        "FEEDPAGE_REQUEST_TIMEOUT_SECS",
        feedpage::rss::REQUEST_TIMEOUT.as_secs(),
    ));
    let feed_source = HttpFeedSource::with_timeout(request_timeout)?;

    let ok = match cli.command {
        Commands::Remote { run } => {
            let settings = StorageSettings::from_env();
            let client = create_s3_client(&settings).await;
            let config_source = S3ConfigSource::new(client.clone(), settings.config.clone());
            let sink = S3PageSink::new(client, settings.output.clone());
            run_loop(&config_source, &feed_source, &sink, &run).await
        }
        Commands::Local {
            config,
            output,
            run,
        } => {
            let config_source = LocalFileConfig::new(config);
            let sink = LocalFileSink::new(output);
            run_loop(&config_source, &feed_source, &sink, &run).await
        }
    }
    .context("run loop failed")?;

    if !ok {
        process::exit(1);
    }
    Ok(())
}

/// Run once, or keep running on an interval until Ctrl-C. Returns whether the
/// last run succeeded.
async fn run_loop(
    config_source: &dyn ConfigSource,
    feed_source: &HttpFeedSource,
    sink: &dyn PageSink,
    args: &RunArgs,
) -> Result<bool> {
    loop {
        let mut options = args.options();
        if args.stamp {
            options.generated_at = Some(Utc::now());
        }

        let ok = match run_pipeline(config_source, feed_source, sink, &options).await {
            Ok(summary) => {
                info!(
                    target: TARGET_PIPELINE,
                    "Run succeeded: {}",
                    serde_json::to_string(&summary)?
                );
                true
            }
            Err(err) => {
                error!(target: TARGET_PIPELINE, "Run failed: {}", err);
                false
            }
        };

        let Some(minutes) = args.watch else {
            return Ok(ok);
        };

        info!(target: TARGET_PIPELINE, "Sleeping for {} minutes before next run", minutes);
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!(target: TARGET_PIPELINE, "Ctrl-C received, stopping");
                return Ok(ok);
            }
            _ = sleep(Duration::from_secs(minutes.max(1) * 60)) => {}
        }
    }
}
