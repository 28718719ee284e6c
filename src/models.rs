//! Data models for discovered candidates and the snapshot output document.
//!
//! Two lifetimes of data flow through the pipeline:
//! - [`ArticleCandidate`]: a URL produced by discovery, consumed exactly once
//!   by the fetch/extract stage and never persisted
//! - [`Article`] inside an [`OutputDocument`]: the immutable output record,
//!   serialized to the snapshot JSON file
//!
//! Output field names are camelCase to stay wire-compatible with the
//! snapshot files consumed downstream, handled via serde renames rather
//! than non-snake-case Rust fields.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A discovered article URL plus whatever the discovery source already knew
/// about it.
///
/// Sitemap and crawl discovery only fill `url`. Entry pages attach the
/// section they were listed under as `category_hint`. Feed discovery also
/// carries the RSS item's title/summary/date so extraction can fall back to
/// them when the article page itself is unreachable or unparseable.
#[derive(Debug, Clone)]
pub struct ArticleCandidate {
    /// Absolute URL as found (canonicalized later, at extraction time).
    pub url: String,
    /// Category inferred from the page or feed that referenced this URL.
    pub category_hint: Option<String>,
    /// Title carried over from an RSS `<item>`, if this came from a feed.
    pub feed_title: Option<String>,
    /// Summary carried over from an RSS `<item>`.
    pub feed_summary: Option<String>,
    /// Raw publish date string carried over from an RSS `<item>`.
    pub feed_date: Option<String>,
}

impl ArticleCandidate {
    /// Candidate with no discovery-time hints (sitemap, crawl, Google News).
    pub fn bare(url: String) -> Self {
        ArticleCandidate {
            url,
            category_hint: None,
            feed_title: None,
            feed_summary: None,
            feed_date: None,
        }
    }

    /// Candidate with an entry-page category hint.
    pub fn hinted(url: String, hint: Option<String>) -> Self {
        ArticleCandidate {
            url,
            category_hint: hint,
            feed_title: None,
            feed_summary: None,
            feed_date: None,
        }
    }
}

/// How trustworthy a `publishedAt` value is.
///
/// `Exact` means the timestamp came from the page itself (JSON-LD, meta
/// tags, a `<time>` element) or from a feed. `Approximate` means it was
/// reconstructed from a date segment embedded in the URL path and pinned to
/// noon UTC, which is good enough for ranking but is not a verified publish
/// time. Downstream consumers must be able to tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateConfidence {
    Exact,
    Approximate,
}

/// One article in the final snapshot.
///
/// Immutable once built. `id` is a deterministic content hash of the
/// canonical link (or the title when no link exists), so re-running the
/// pipeline over unchanged input yields identical ids.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Hex SHA-256 of the canonical link (or title when the link is empty).
    pub id: String,
    /// Headline; never empty, falls back to the link itself.
    pub title: String,
    /// Canonical absolute URL; unique key within one snapshot.
    pub link: String,
    pub summary: Option<String>,
    /// UTC ISO-8601, or `None` when no date was discoverable.
    pub published_at: Option<String>,
    /// The same instant projected into the site's display offset.
    /// Never used for sorting or deduplication.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub published_at_local: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date_confidence: Option<DateConfidence>,
    /// Human-readable site name.
    pub source: String,
    pub category: Option<String>,
    /// UTC ISO-8601 timestamp of extraction time.
    pub fetched_at: String,
}

/// Stable id for an article: hex SHA-256 of the canonical link, or of the
/// title when no link is available.
pub fn article_id(link: &str, title: &str) -> String {
    let key = if link.is_empty() { title } else { link };
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Top-level snapshot document written to `<site>.json`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDocument {
    pub source: String,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub generated_at_local: Option<String>,
    pub count: usize,
    pub items: Vec<Article>,
}
