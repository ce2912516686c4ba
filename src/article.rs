//! The uniform article record carried through filtering, sorting and rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rss::{parse_date, FeedItem};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub description: String,
    /// `None` when the source date was missing or unparseable.
    pub published: Option<DateTime<Utc>>,
}

/// Convert one feed item into an `Article`. Never fails: a bad date only
/// leaves `published` empty.
pub fn normalize(item: FeedItem) -> Article {
    let published = parse_date(&item.published_raw);

    Article {
        title: item.title,
        link: item.link,
        description: item.description,
        published,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(published_raw: &str) -> FeedItem {
        FeedItem {
            title: "Company X Acquisition".to_string(),
            link: "https://example.com/a".to_string(),
            description: "<b>Deal</b> closed".to_string(),
            published_raw: published_raw.to_string(),
        }
    }

    #[test]
    fn test_fields_are_copied_verbatim() {
        let article = normalize(item("Tue, 02 Jan 2024 10:00:00 +0000"));
        assert_eq!(article.title, "Company X Acquisition");
        assert_eq!(article.link, "https://example.com/a");
        assert_eq!(article.description, "<b>Deal</b> closed");
        assert_eq!(
            article.published,
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_bad_date_degrades_to_none() {
        assert_eq!(normalize(item("sometime last week")).published, None);
        assert_eq!(normalize(item("")).published, None);
    }

    #[test]
    fn test_normalize_is_pure() {
        let raw = item("2024-01-02T10:00:00Z");
        assert_eq!(normalize(raw.clone()), normalize(raw));
    }
}
