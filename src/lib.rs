pub mod article;
pub mod config;
pub mod environment;
pub mod filter;
pub mod logging;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod rss;
pub mod sort;
pub mod storage;

pub use article::{normalize, Article};
pub use config::{ConfigSource, Configuration, ConfigurationError, LocalFileConfig};
pub use filter::filter_by_title;
pub use pipeline::{run_pipeline, RunError, RunOptions, RunSummary};
pub use publish::{LocalFileSink, PageSink, PublishError};
pub use render::{render_page, PageOptions, RenderError};
pub use sort::sort_by_recency;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_PIPELINE: &str = "pipeline";
pub const TARGET_STORAGE: &str = "storage";
