//! Utility functions for RSS feed processing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use encoding_rs::{Encoding, WINDOWS_1252};
use std::borrow::Cow;
use tracing::{debug, warn};
use url::Url;

use crate::TARGET_WEB_REQUEST;

/// Helper function to validate a URL
pub fn is_valid_url(url: &str) -> bool {
    if let Ok(parsed) = Url::parse(url) {
        parsed.scheme() == "http" || parsed.scheme() == "https"
    } else {
        false
    }
}

/// Parse a date string in various formats, normalized to UTC.
pub fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let date_str = date_str.trim();
    if date_str.is_empty() {
        return None;
    }

    // RSS 2.0 pubDate
    if let Ok(date) = DateTime::parse_from_rfc2822(date_str) {
        return Some(date.with_timezone(&Utc));
    }

    // Atom and JSON Feed
    if let Ok(date) = DateTime::parse_from_rfc3339(date_str) {
        return Some(date.with_timezone(&Utc));
    }

    // Offset-carrying formats seen in the wild
    for format in &[
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S %z",
        "%a, %d %b %Y %H:%M %z",
    ] {
        if let Ok(date) = DateTime::parse_from_str(date_str, format) {
            return Some(date.with_timezone(&Utc));
        }
    }

    // No offset given, assume UTC
    for format in &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(date_str, format) {
            return Some(naive.and_utc());
        }
    }

    for format in &["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(day) = NaiveDate::parse_from_str(date_str, format) {
            return day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Charset named by a `Content-Type` header, e.g. `text/xml; charset=ISO-8859-1`.
fn charset_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        let (name, value) = part.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Byte range of the `encoding` label in a leading XML declaration.
fn xml_encoding_span(text: &str) -> Option<(usize, usize)> {
    let start = text.find("<?xml")?;
    if !text[..start]
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
        .is_empty()
    {
        return None;
    }
    let end = start + text[start..].find("?>")?;
    let attr = start + text[start..end].find("encoding")? + "encoding".len();
    let eq = attr + text[attr..end].find('=')? + 1;
    let quote_at = eq + text[eq..end].find(['"', '\''])?;
    let quote = if text[quote_at..].starts_with('"') { '"' } else { '\'' };
    let value_start = quote_at + 1;
    let value_end = value_start + text[value_start..end].find(quote)?;
    Some((value_start, value_end))
}

/// Decode a fetched body into text.
///
/// A byte order mark wins, then the `Content-Type` charset, then the XML
/// declaration. Without any of those the body is read as UTF-8, falling back
/// to windows-1252 when it is not valid UTF-8.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    let label = content_type
        .and_then(charset_from_content_type)
        .or_else(|| xml_encoding_span(&head).map(|(start, end)| &head[start..end]));

    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| label.and_then(|label| Encoding::for_label(label.trim().as_bytes())));

    match encoding {
        Some(encoding) => {
            let (text, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                warn!(target: TARGET_WEB_REQUEST, "Body is not valid {}; undecodable bytes replaced", encoding.name());
            }
            text.into_owned()
        }
        None => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => {
                debug!(target: TARGET_WEB_REQUEST, "Body is not UTF-8 and names no charset, reading as windows-1252");
                let (text, _, _) = WINDOWS_1252.decode(bytes);
                text.into_owned()
            }
        },
    }
}

/// Point the XML declaration at UTF-8 once the body has been decoded, so the
/// XML parser does not decode the text a second time.
pub fn declare_utf8(text: &str) -> Cow<'_, str> {
    match xml_encoding_span(text) {
        Some((start, end)) if !text[start..end].eq_ignore_ascii_case("utf-8") => {
            Cow::Owned(format!("{}UTF-8{}", &text[..start], &text[end..]))
        }
        _ => Cow::Borrowed(text),
    }
}

/// Check whether a body looks like an XML syndication document at all.
pub fn looks_like_xml_feed(body: &str) -> bool {
    body.contains("<rss") || body.contains("<feed") || body.contains("<rdf:RDF")
}

/// Clean up malformed XML
pub fn cleanup_xml(xml: &str) -> String {
    let mut cleaned = xml.trim().trim_start_matches('\u{FEFF}').to_string();

    // Drop anything before the document actually starts
    if let Some(xml_start) = cleaned.find("<?xml") {
        cleaned = cleaned[xml_start..].to_string();
    } else if let Some(rss_start) = cleaned.find("<rss") {
        cleaned = cleaned[rss_start..].to_string();
    } else if let Some(rdf_start) = cleaned.find("<rdf:RDF") {
        cleaned = cleaned[rdf_start..].to_string();
    } else if let Some(feed_start) = cleaned.find("<feed") {
        cleaned = cleaned[feed_start..].to_string();
    }

    // HTML entities that are not defined in XML
    cleaned = cleaned
        .replace("&nbsp;", "&#160;")
        .replace("&ndash;", "&#8211;")
        .replace("&mdash;", "&#8212;")
        .replace("&rsquo;", "&#8217;")
        .replace("&lsquo;", "&#8216;")
        .replace("&rdquo;", "&#8221;")
        .replace("&ldquo;", "&#8220;")
        .replace("&hellip;", "&#8230;")
        .replace("&amp;amp;", "&amp;");

    cleaned = cleaned
        .chars()
        .filter(|&c| {
            matches!(c,
                '\u{0009}' | // tab
                '\u{000A}' | // newline
                '\u{000D}' | // carriage return
                '\u{0020}'..='\u{D7FF}' |
                '\u{E000}'..='\u{FFFD}' |
                '\u{10000}'..='\u{10FFFF}'
            )
        })
        .collect();

    if !cleaned.starts_with("<?xml") {
        cleaned = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", cleaned);
    }

    cleaned
}
