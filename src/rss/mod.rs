//! Feed fetching, parsing and aggregation for feedpage.
//!
//! This module turns a list of feed URLs into normalized articles.

mod aggregator;
mod client;
mod parser;
mod types;
mod util;

pub use self::types::*;

pub use self::aggregator::{aggregate, AggregateOptions, AggregateReport, FeedOutcome};
pub use self::client::{create_http_client, FeedSource, HttpFeedSource};
pub use self::parser::parse_feed;
pub use self::util::{cleanup_xml, is_valid_url, parse_date};
