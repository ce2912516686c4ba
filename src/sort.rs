//! Recency ordering.

use std::cmp::Reverse;

use crate::article::Article;

/// Order articles newest first. Undated articles go last, and ties (equal
/// timestamps, or no timestamp at all) keep their input order.
pub fn sort_by_recency(mut articles: Vec<Article>) -> Vec<Article> {
    // `sort_by_key` is stable; `Some(_) > None` puts undated articles at the end.
    articles.sort_by_key(|article| Reverse(article.published));
    articles
}
