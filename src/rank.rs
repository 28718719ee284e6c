//! Merging, ranking and truncation of extracted articles.

use crate::models::Article;
use crate::normalize::parse_date;
use chrono::{DateTime, Utc};
use itertools::Itertools;

fn sort_key(article: &Article) -> Option<DateTime<Utc>> {
    article.published_at.as_deref().and_then(parse_date)
}

/// Deduplicate by canonical link (id when the link is empty), keeping the
/// first occurrence in source-priority order; stable-sort by publish date
/// descending with undated items last; truncate to `max_items`.
pub fn merge(articles: Vec<Article>, max_items: usize) -> Vec<Article> {
    let mut merged: Vec<Article> = articles
        .into_iter()
        .unique_by(|a| {
            if a.link.is_empty() {
                a.id.clone()
            } else {
                a.link.clone()
            }
        })
        .collect();

    // Vec::sort_by is stable, so equal timestamps keep discovery order.
    // None compares below every Some, which puts undated items last under
    // the reversed comparison.
    merged.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
    merged.truncate(max_items);
    merged
}
