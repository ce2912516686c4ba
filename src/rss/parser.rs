//! Feed parsing logic for RSS, Atom, and JSON formats.

use feed_rs::model::Entry;
use feed_rs::parser;
use std::io::Cursor;
use tracing::{debug, warn};

use super::types::{FeedDocument, FeedItem, FetchError, JsonFeed, JsonFeedItem};
use super::util::{cleanup_xml, declare_utf8, looks_like_xml_feed};
use crate::TARGET_WEB_REQUEST;

/// Turn a fetched body into a `FeedDocument`.
///
/// JSON Feed is tried when the content type says so (or the body is a JSON
/// object); everything else goes through feed-rs, with one more attempt after
/// `cleanup_xml` for bodies that look like RSS/Atom but fail to parse.
///
/// `body` is already-decoded text; any encoding named in its XML declaration
/// is ignored.
pub fn parse_feed(
    body: &str,
    content_type: Option<&str>,
    url: &str,
) -> Result<FeedDocument, FetchError> {
    let is_json = content_type.map_or(false, |ct| ct.contains("json"))
        || body.trim_start().starts_with('{');

    if is_json {
        debug!(target: TARGET_WEB_REQUEST, "Processing as JSON feed: {}", url);
        return serde_json::from_str::<JsonFeed>(body)
            .map(|feed| json_feed_document(feed, url))
            .map_err(|err| FetchError::parse(url, format!("invalid JSON feed: {}", err)));
    }

    debug!(target: TARGET_WEB_REQUEST, "Processing as XML feed: {}", url);
    let body = declare_utf8(body);
    match parser::parse(Cursor::new(body.as_bytes())) {
        Ok(feed) => Ok(xml_feed_document(feed, url)),
        Err(first_err) => {
            if !looks_like_xml_feed(&body) {
                let preview = if body.chars().all(|c| !c.is_control() || c.is_whitespace()) {
                    body.chars().take(100).collect::<String>()
                } else {
                    "[binary data]".to_string()
                };
                return Err(FetchError::parse(
                    url,
                    format!("content is not RSS or Atom: {}", preview),
                ));
            }

            let cleaned = cleanup_xml(&body);
            match parser::parse(Cursor::new(cleaned.as_bytes())) {
                Ok(feed) => {
                    warn!(target: TARGET_WEB_REQUEST, "Feed from {} parsed only after XML cleanup", url);
                    Ok(xml_feed_document(feed, url))
                }
                Err(second_err) => Err(FetchError::parse(
                    url,
                    format!(
                        "failed even after cleanup. First error: {}. Second error: {}",
                        first_err, second_err
                    ),
                )),
            }
        }
    }
}

fn xml_feed_document(feed: feed_rs::model::Feed, url: &str) -> FeedDocument {
    FeedDocument {
        source_url: url.to_string(),
        title: feed.title.map(|t| t.content),
        items: feed.entries.into_iter().map(entry_to_item).collect(),
    }
}

fn entry_to_item(entry: Entry) -> FeedItem {
    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .unwrap_or_default();

    FeedItem {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        link: entry
            .links
            .first()
            .map(|link| link.href.clone())
            .unwrap_or_default(),
        description,
        // feed-rs has already decoded the date; hand it on in a lossless form
        published_raw: entry
            .published
            .or(entry.updated)
            .map(|d| d.to_rfc3339())
            .unwrap_or_default(),
    }
}

fn json_feed_document(feed: JsonFeed, url: &str) -> FeedDocument {
    FeedDocument {
        source_url: url.to_string(),
        title: feed.title,
        items: feed.items.into_iter().map(json_item_to_item).collect(),
    }
}

fn json_item_to_item(item: JsonFeedItem) -> FeedItem {
    FeedItem {
        title: item.title.unwrap_or_default(),
        link: item.url.or(item.id).unwrap_or_default(),
        description: item
            .summary
            .or(item.content_text)
            .or(item.content_html)
            .unwrap_or_default(),
        published_raw: item
            .date_published
            .or(item.date_modified)
            .unwrap_or_default(),
    }
}
