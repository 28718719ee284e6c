//! Article extraction from fetched HTML.
//!
//! Field precedence is fixed:
//! 1. JSON-LD structured data (`NewsArticle` and friends, including
//!    objects nested in `@graph`)
//! 2. Open Graph / meta tags / `<time>` elements whenever JSON-LD is
//!    absent or yields an empty title
//! 3. category inferred from the URL path outranks both, and the
//!    discovery-time hint outranks page-derived sections
//! 4. a `YYYY-MM-DD` segment in the URL path as a last-resort publish
//!    date, pinned to noon UTC and flagged approximate
//!
//! Absence is always `None`, never an error: a page with no date simply
//! produces an undated article.

use crate::models::{Article, ArticleCandidate, DateConfidence, article_id};
use crate::normalize::{canonicalize_with, iso_local, iso_utc, parse_date};
use crate::sites::SiteConfig;
use crate::utils::{clean_ws, truncate_for_log};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// The only shape the JSON-LD visitor produces. The input is genuinely
/// heterogeneous third-party JSON, so the visitor itself stays duck-typed
/// over `serde_json::Value`.
#[derive(Debug, Default, PartialEq)]
pub struct ArticleMetadata {
    pub headline: String,
    pub description: String,
    pub date_published: String,
    pub section: String,
}

const ARTICLE_TYPES: &[&str] = &[
    "NewsArticle",
    "Article",
    "BlogPosting",
    "PodcastEpisode",
    "AudioObject",
];

fn first_string(value: Option<&Value>) -> Option<&str> {
    match value? {
        Value::String(s) => Some(s.as_str()),
        Value::Array(items) => items.iter().find_map(|v| v.as_str()),
        _ => None,
    }
}

fn select_metadata(obj: &Value) -> Option<ArticleMetadata> {
    let map = obj.as_object()?;
    let type_name = first_string(map.get("@type"))?;
    if !ARTICLE_TYPES.contains(&type_name) {
        return None;
    }
    let date = ["datePublished", "uploadDate", "dateCreated", "dateModified"]
        .iter()
        .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
        .unwrap_or("");
    Some(ArticleMetadata {
        headline: map
            .get("headline")
            .and_then(|v| v.as_str())
            .or_else(|| map.get("name").and_then(|v| v.as_str()))
            .unwrap_or("")
            .to_string(),
        description: map
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        date_published: date.to_string(),
        section: first_string(map.get("articleSection"))
            .unwrap_or("")
            .to_string(),
    })
}

fn scan_value(value: &Value) -> Option<ArticleMetadata> {
    match value {
        Value::Object(map) => {
            if let Some(Value::Array(graph)) = map.get("@graph") {
                for node in graph {
                    if let Some(found) = select_metadata(node) {
                        return Some(found);
                    }
                }
            }
            select_metadata(value)
        }
        Value::Array(items) => items.iter().find_map(scan_value),
        _ => None,
    }
}

/// Scan every `<script type="application/ld+json">` block for the first
/// article-like object. Blocks that fail to parse as JSON are skipped.
pub fn parse_json_ld(document: &Html) -> Option<ArticleMetadata> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    for script in document.select(&selector) {
        let text = script.text().collect::<String>();
        let parsed: Value = match serde_json::from_str(text.trim()) {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, block = %truncate_for_log(text.trim(), 120), "Skipping malformed JSON-LD block");
                continue;
            }
        };
        if let Some(found) = scan_value(&parsed) {
            return Some(found);
        }
    }
    None
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(clean_ws)
        .filter(|s| !s.is_empty())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .map(|el| clean_ws(&el.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn meta_title(document: &Html) -> Option<String> {
    meta_content(document, r#"meta[property="og:title"]"#)
        .or_else(|| meta_content(document, r#"meta[name="title"]"#))
        .or_else(|| first_text(document, "title"))
        .or_else(|| first_text(document, "h1"))
}

fn meta_summary(document: &Html) -> Option<String> {
    meta_content(document, r#"meta[property="og:description"]"#)
        .or_else(|| meta_content(document, r#"meta[name="description"]"#))
}

fn meta_date(document: &Html) -> Option<String> {
    meta_content(document, r#"meta[property="article:published_time"]"#)
        .or_else(|| meta_content(document, r#"meta[property="og:article:published_time"]"#))
        .or_else(|| meta_content(document, r#"meta[property="og:published_time"]"#))
        .or_else(|| meta_content(document, r#"meta[itemprop="datePublished"]"#))
        .or_else(|| meta_content(document, r#"meta[itemprop="uploadDate"]"#))
        .or_else(|| {
            let sel = Selector::parse("time[datetime]").ok()?;
            document
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("datetime"))
                .map(str::to_string)
                .filter(|s| !s.trim().is_empty())
        })
        .or_else(|| meta_content(document, r#"meta[name="date"]"#))
}

fn meta_section(document: &Html) -> Option<String> {
    meta_content(document, r#"meta[property="article:section"]"#)
        .or_else(|| meta_content(document, r#"meta[name="section"]"#))
}

/// The page's `<link rel="canonical">` target, when present and on the
/// same host as the site.
fn declared_canonical(document: &Html, site: &SiteConfig) -> Option<String> {
    let sel = Selector::parse(r#"link[rel="canonical"]"#).ok()?;
    let href = document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr("href"))?
        .trim()
        .to_string();
    let parsed = Url::parse(&href).ok()?;
    if parsed.host_str().unwrap_or("").contains(site.host) {
        Some(href)
    } else {
        None
    }
}

static URL_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{4})-(\d{2})-(\d{2})/").unwrap());

/// Publish-date substitute reconstructed from a URL path segment like
/// `/news/2024-05-01/...`: noon UTC on that date. Ranking only; callers
/// must mark it [`DateConfidence::Approximate`].
pub fn date_from_url(url: &str) -> Option<DateTime<Utc>> {
    let caps = URL_DATE_RE.captures(url)?;
    let raw = format!("{}-{}-{}T12:00:00Z", &caps[1], &caps[2], &caps[3]);
    parse_date(&raw)
}

/// The full page-level date chain (JSON-LD then meta/`<time>`), used on
/// its own by the date-backfill step.
pub fn date_from_html(body: &str) -> Option<DateTime<Utc>> {
    let document = Html::parse_document(body);
    parse_json_ld(&document)
        .map(|ld| ld.date_published)
        .filter(|d| !d.is_empty())
        .and_then(|raw| parse_date(&raw))
        .or_else(|| meta_date(&document).and_then(|raw| parse_date(&raw)))
}

/// Build an [`Article`] from a fetched page.
///
/// Returns `None` when the page yields neither a title nor a summary;
/// such candidates are discarded silently, not counted as errors.
pub fn extract(
    site: &SiteConfig,
    url: &str,
    body: &str,
    candidate: &ArticleCandidate,
    fetched_at: DateTime<Utc>,
) -> Option<Article> {
    let document = Html::parse_document(body);

    let link_source = declared_canonical(&document, site).unwrap_or_else(|| url.to_string());
    let link = canonicalize_with(&link_source, site.strip_all_queries, site.tracking_params);

    // URL-derived category outranks both the page and the hint; the hint
    // outranks page-derived sections.
    let mut category = site
        .category_from_url(&link)
        .or_else(|| candidate.category_hint.clone());

    let mut title = String::new();
    let mut summary = String::new();
    let mut raw_date: Option<String> = None;

    if let Some(ld) = parse_json_ld(&document) {
        title = clean_ws(&ld.headline);
        summary = clean_ws(&ld.description);
        if !ld.date_published.is_empty() {
            raw_date = Some(ld.date_published);
        }
        if category.is_none() && !ld.section.is_empty() {
            category = Some(clean_ws(&ld.section));
        }
    }
    if title.is_empty() {
        if let Some(t) = meta_title(&document) {
            title = t;
        }
        if summary.is_empty() {
            summary = meta_summary(&document).unwrap_or_default();
        }
        if raw_date.is_none() {
            raw_date = meta_date(&document);
        }
        if category.is_none() {
            category = meta_section(&document);
        }
    }

    // Feed-carried fields plug any remaining holes.
    if title.is_empty() {
        if let Some(t) = &candidate.feed_title {
            title = clean_ws(t);
        }
    }
    if summary.is_empty() {
        if let Some(s) = &candidate.feed_summary {
            summary = clean_ws(s);
        }
    }
    if raw_date.is_none() {
        raw_date = candidate.feed_date.clone();
    }

    if title.is_empty() && summary.is_empty() {
        debug!(%url, "No title or summary extractable; discarding");
        return None;
    }

    let published = match raw_date.as_deref().and_then(parse_date) {
        Some(dt) => Some((dt, DateConfidence::Exact)),
        None => date_from_url(&link).map(|dt| (dt, DateConfidence::Approximate)),
    };

    let title = if title.is_empty() { link.clone() } else { title };
    let summary = if summary.is_empty() { None } else { Some(summary) };

    Some(Article {
        id: article_id(&link, &title),
        title,
        link: link.clone(),
        summary,
        published_at: published.map(|(dt, _)| iso_utc(dt)),
        published_at_local: published.and_then(|(dt, _)| {
            site.local_offset_minutes
                .and_then(|minutes| iso_local(dt, minutes))
        }),
        date_confidence: published.map(|(_, confidence)| confidence),
        source: site.source_name.to_string(),
        category,
        fetched_at: iso_utc(fetched_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites;
    use chrono::TimeZone;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()
    }

    fn bare(url: &str) -> ArticleCandidate {
        ArticleCandidate::bare(url.to_string())
    }

    #[test]
    fn test_json_ld_takes_precedence_over_og() {
        let html = r#"<html><head>
            <meta property="og:title" content="B" />
            <script type="application/ld+json">
            {"@type": "NewsArticle", "headline": "A",
             "description": "desc", "datePublished": "2024-05-01T10:00:00Z"}
            </script>
        </head><body></body></html>"#;
        let site = sites::site("seven").unwrap();
        let url = "https://7news.com.au/world/story";
        let article = extract(site, url, html, &bare(url), fetched_at()).unwrap();
        assert_eq!(article.title, "A");
        assert_eq!(article.summary.as_deref(), Some("desc"));
        assert_eq!(article.published_at.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(article.date_confidence, Some(DateConfidence::Exact));
    }

    #[test]
    fn test_json_ld_graph_and_type_list() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@graph": [
                {"@type": "WebSite", "name": "ignored"},
                {"@type": ["PodcastEpisode", "Thing"], "name": "Episode 1",
                 "uploadDate": "2024-04-30T08:00:00+10:00"}
            ]}
        </script></head></html>"#;
        let document = Html::parse_document(html);
        let ld = parse_json_ld(&document).unwrap();
        assert_eq!(ld.headline, "Episode 1");
        assert_eq!(ld.date_published, "2024-04-30T08:00:00+10:00");
    }

    #[test]
    fn test_malformed_json_ld_block_is_skipped() {
        let html = r#"<html><head>
            <script type="application/ld+json">{not json</script>
            <script type="application/ld+json">
            {"@type": "Article", "headline": "Recovered"}
            </script>
        </head></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(parse_json_ld(&document).unwrap().headline, "Recovered");
    }

    #[test]
    fn test_meta_fallback_when_no_json_ld() {
        let html = r#"<html><head>
            <meta property="og:title" content="Meta Title" />
            <meta property="og:description" content="Meta Desc" />
            <meta property="article:published_time" content="2024-05-01T10:00:00+10:00" />
            <meta property="article:section" content="Sport" />
        </head></html>"#;
        let site = sites::site("aucd").unwrap();
        let url = "https://aucd.com.au/some-post";
        let article = extract(site, url, html, &bare(url), fetched_at()).unwrap();
        assert_eq!(article.title, "Meta Title");
        assert_eq!(article.published_at.as_deref(), Some("2024-05-01T00:00:00Z"));
        assert_eq!(article.category.as_deref(), Some("Sport"));
    }

    #[test]
    fn test_url_category_outranks_page_section() {
        let html = r#"<html><head>
            <meta property="og:title" content="T" />
            <meta property="article:section" content="Page Section" />
        </head></html>"#;
        let site = sites::site("seven").unwrap();
        let url = "https://7news.com.au/politics/story-slug";
        let article = extract(site, url, html, &bare(url), fetched_at()).unwrap();
        assert_eq!(article.category.as_deref(), Some("Politics"));
    }

    #[test]
    fn test_url_date_fallback_is_approximate() {
        let html = r#"<html><head><meta property="og:title" content="T" /></head></html>"#;
        let site = sites::site("abc").unwrap();
        let url = "https://www.abc.net.au/news/2024-05-01/story-slug/104000000";
        let article = extract(site, url, html, &bare(url), fetched_at()).unwrap();
        assert_eq!(article.published_at.as_deref(), Some("2024-05-01T12:00:00Z"));
        assert_eq!(article.date_confidence, Some(DateConfidence::Approximate));
    }

    #[test]
    fn test_no_title_no_summary_is_discarded() {
        let html = "<html><head></head><body><nav>menu</nav></body></html>";
        let site = sites::site("abc").unwrap();
        let url = "https://www.abc.net.au/news/2024-05-01/story/1";
        assert!(extract(site, url, html, &bare(url), fetched_at()).is_none());
    }

    #[test]
    fn test_summary_only_page_falls_back_title_to_link() {
        let html = r#"<html><head>
            <meta name="description" content="Only a description" />
        </head></html>"#;
        let site = sites::site("seven").unwrap();
        let url = "https://7news.com.au/world/mystery";
        let article = extract(site, url, html, &bare(url), fetched_at()).unwrap();
        assert_eq!(article.title, "https://7news.com.au/world/mystery");
        assert_eq!(article.id, article_id("https://7news.com.au/world/mystery", ""));
    }

    #[test]
    fn test_declared_canonical_preferred_same_host_only() {
        let html = r#"<html><head>
            <link rel="canonical" href="https://7news.com.au/world/real-slug" />
            <meta property="og:title" content="T" />
        </head></html>"#;
        let site = sites::site("seven").unwrap();
        let url = "https://7news.com.au/world/tracking-slug?cid=social";
        let article = extract(site, url, html, &bare(url), fetched_at()).unwrap();
        assert_eq!(article.link, "https://7news.com.au/world/real-slug");

        let foreign = r#"<html><head>
            <link rel="canonical" href="https://evil.example.com/x" />
            <meta property="og:title" content="T" />
        </head></html>"#;
        let article = extract(site, url, foreign, &bare(url), fetched_at()).unwrap();
        assert_eq!(article.link, "https://7news.com.au/world/tracking-slug");
    }

    #[test]
    fn test_feed_seed_fills_holes() {
        let html = "<html><head></head></html>";
        let site = sites::site("twocr").unwrap();
        let candidate = ArticleCandidate {
            url: "https://www.2cr.com.au/post-1/".to_string(),
            category_hint: None,
            feed_title: Some("Feed Title".to_string()),
            feed_summary: Some("Feed summary".to_string()),
            feed_date: Some("Wed, 01 May 2024 10:00:00 GMT".to_string()),
        };
        let article = extract(site, &candidate.url, html, &candidate, fetched_at()).unwrap();
        assert_eq!(article.title, "Feed Title");
        assert_eq!(article.published_at.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(article.link, "https://www.2cr.com.au/post-1");
    }

    #[test]
    fn test_local_projection_when_site_configures_offset() {
        let html = r#"<html><head>
            <meta property="og:title" content="T" />
            <meta property="article:published_time" content="2024-05-01T00:00:00Z" />
        </head></html>"#;
        let site = sites::site("seven").unwrap();
        let url = "https://7news.com.au/world/story";
        let article = extract(site, url, html, &bare(url), fetched_at()).unwrap();
        assert_eq!(
            article.published_at_local.as_deref(),
            Some("2024-05-01T10:00:00+10:00")
        );
    }

    #[test]
    fn test_date_from_html_for_backfill() {
        let body = r#"<html><head><script type="application/ld+json">
            {"@type": "NewsArticle", "headline": "x",
             "datePublished": "2024-05-01T10:00:00Z"}
        </script></head></html>"#;
        let dt = date_from_html(body).unwrap();
        assert_eq!(iso_utc(dt), "2024-05-01T10:00:00Z");
        assert!(date_from_html("<html></html>").is_none());
    }
}
