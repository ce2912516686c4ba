//! Phrase-based title filtering.

use std::collections::BTreeSet;

use crate::article::Article;

/// Keep the articles whose title contains at least one phrase.
///
/// Matching is case-sensitive substring containment. Duplicate phrases are
/// collapsed and empty phrases ignored, so an empty phrase list keeps nothing.
/// Input order is preserved.
pub fn filter_by_title<S: AsRef<str>>(articles: Vec<Article>, phrases: &[S]) -> Vec<Article> {
    let phrases: BTreeSet<&str> = phrases
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_empty())
        .collect();

    if phrases.is_empty() {
        return Vec::new();
    }

    articles
        .into_iter()
        .filter(|article| phrases.iter().any(|phrase| article.title.contains(phrase)))
        .collect()
}
