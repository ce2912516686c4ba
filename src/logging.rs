use std::io;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::environment::get_env_var_or;

const DEFAULT_STDOUT_FILTER: &str =
    "info,web_request=warn,aws_config=warn,aws_smithy_runtime=warn,hyper=warn";
const DEFAULT_FILE_FILTER: &str = "info,web_request=debug,aws_smithy_runtime=info";

pub fn configure_logging() {
    // RUST_LOG overrides the stdout filter only
    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDOUT_FILTER));

    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(stdout_filter);

    // Daily rolling file with per-feed detail
    let log_dir = get_env_var_or("FEEDPAGE_LOG_DIR", "logs");
    let file_appender = rolling::daily(log_dir, "feedpage.log");
    let file_log = fmt::layer()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new(DEFAULT_FILE_FILTER));

    // Ignore a second initialization (tests, repeated runs in one process)
    let _ = tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .try_init();
}
