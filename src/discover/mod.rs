//! Candidate URL discovery.
//!
//! Up to five sources contribute, in priority order: sitemaps (via
//! robots.txt), entry/category pages, a shallow bounded crawl, the site's
//! own RSS feeds, and a Google News RSS search as the last resort. Each
//! source produces [`ArticleCandidate`]s; [`merge_candidates`] collapses
//! them by canonical URL with first-occurrence-wins semantics.
//!
//! Every source fails soft: a dead robots.txt, an unparseable sitemap or a
//! 404 entry page is logged and contributes nothing, but never aborts the
//! run.

pub mod crawl;
pub mod entry;
pub mod feeds;
pub mod google_news;
pub mod rss;
pub mod sitemap;

use crate::models::ArticleCandidate;
use crate::normalize::canonicalize_with;
use crate::sites::SiteConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

/// Merge discovery sources in priority order: dedupe by canonicalized URL
/// (first occurrence wins), keep the earliest category hint seen for each
/// URL, and apply the site's article-shape filter uniformly.
pub fn merge_candidates(
    site: &SiteConfig,
    sources: Vec<Vec<ArticleCandidate>>,
) -> Vec<ArticleCandidate> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: HashMap<String, ArticleCandidate> = HashMap::new();

    for source in sources {
        for candidate in source {
            if !site.looks_like_article(&candidate.url) {
                continue;
            }
            let key =
                canonicalize_with(&candidate.url, site.strip_all_queries, site.tracking_params);
            match by_key.get_mut(&key) {
                None => {
                    order.push(key.clone());
                    by_key.insert(key, candidate);
                }
                Some(existing) => {
                    // Later sources may know the category the first did not.
                    if existing.category_hint.is_none() && candidate.category_hint.is_some() {
                        existing.category_hint = candidate.category_hint;
                    }
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

static GENERIC_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[A-Za-z0-9.\-]+/[A-Za-z0-9\-/_.%]+"#).unwrap());
static RELATIVE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(/[A-Za-z0-9\-/_.%]+)""#).unwrap());

/// Extract article-shaped links from a page: anchor tags first, then raw
/// regex matches over the whole body. The regex pass is the widening net,
/// picking up URLs embedded in inline scripts and JSON that anchor
/// parsing never sees.
pub fn links_from_html_anywhere(site: &SiteConfig, body: &str, base: &str) -> Vec<String> {
    let base_url = Url::parse(base).ok();
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    let mut push = |raw: &str| {
        let resolved = if raw.starts_with("//") {
            format!("https:{raw}")
        } else if raw.starts_with('/') {
            match &base_url {
                Some(b) => match b.join(raw) {
                    Ok(u) => u.to_string(),
                    Err(_) => return,
                },
                None => return,
            }
        } else {
            raw.to_string()
        };
        let trimmed = resolved.split('#').next().unwrap_or("").to_string();
        if site.looks_like_article(&trimmed) && seen.insert(trimmed.clone()) {
            links.push(trimmed);
        }
    };

    let document = Html::parse_document(body);
    let anchor = Selector::parse("a[href]").unwrap();
    for element in document.select(&anchor) {
        if let Some(href) = element.value().attr("href") {
            push(href.trim());
        }
    }
    for m in GENERIC_URL_RE.find_iter(body) {
        push(m.as_str());
    }
    for caps in RELATIVE_PATH_RE.captures_iter(body) {
        push(&caps[1]);
    }

    links
}

/// Navigable (non-article) links used to grow the crawl frontier.
pub fn nav_links(site: &SiteConfig, body: &str, base: &str) -> Vec<String> {
    let base_url = Url::parse(base).ok();
    let document = Html::parse_document(body);
    let anchor = Selector::parse("a[href]").unwrap();
    let mut out = Vec::new();
    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        let resolved = if href.starts_with('/') {
            match &base_url {
                Some(b) => match b.join(href) {
                    Ok(u) => u.to_string(),
                    Err(_) => continue,
                },
                None => continue,
            }
        } else {
            href.to_string()
        };
        if site.may_crawl(&resolved) {
            out.push(resolved);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites;

    #[test]
    fn test_merge_canonicalizes_and_dedupes_across_sources() {
        // sitemap yields a and b; entry page yields a?utm_source=x and c
        let site = sites::site("seven").unwrap();
        let sitemap = vec![
            ArticleCandidate::bare("https://7news.com.au/world/a".to_string()),
            ArticleCandidate::bare("https://7news.com.au/world/b".to_string()),
        ];
        let entry = vec![
            ArticleCandidate::hinted(
                "https://7news.com.au/world/a?utm_source=x".to_string(),
                Some("World".to_string()),
            ),
            ArticleCandidate::hinted(
                "https://7news.com.au/world/c".to_string(),
                Some("World".to_string()),
            ),
        ];

        let merged = merge_candidates(site, vec![sitemap, entry]);
        assert_eq!(merged.len(), 3);
        // duplicate collapsed onto the sitemap occurrence, hint backfilled
        assert_eq!(merged[0].url, "https://7news.com.au/world/a");
        assert_eq!(merged[0].category_hint.as_deref(), Some("World"));
        assert_eq!(merged[1].url, "https://7news.com.au/world/b");
        assert_eq!(merged[2].url, "https://7news.com.au/world/c");
    }

    #[test]
    fn test_merge_filters_non_articles() {
        let site = sites::site("abc").unwrap();
        let merged = merge_candidates(
            site,
            vec![vec![
                ArticleCandidate::bare("https://www.abc.net.au/news/2024-05-01/story/1".to_string()),
                ArticleCandidate::bare("https://www.abc.net.au/iview/show".to_string()),
                ArticleCandidate::bare("https://www.abc.net.au/news/sitemap.xml".to_string()),
            ]],
        );
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_links_from_anchors_and_script_json() {
        let site = sites::site("abc").unwrap();
        let body = r#"
            <html><body>
            <a href="/news/2024-05-01/anchored-story/101">story</a>
            <a href="/iview/not-news">nope</a>
            <script>{"url": "https://www.abc.net.au/news/2024-05-02/scripted-story/102"}</script>
            <script>{"path": "/news/2024-05-03/relative-story/103"}</script>
            </body></html>
        "#;
        let links = links_from_html_anywhere(site, body, "https://www.abc.net.au/news");
        assert!(links.contains(&"https://www.abc.net.au/news/2024-05-01/anchored-story/101".to_string()));
        assert!(links.contains(&"https://www.abc.net.au/news/2024-05-02/scripted-story/102".to_string()));
        assert!(links.contains(&"https://www.abc.net.au/news/2024-05-03/relative-story/103".to_string()));
        assert_eq!(links.len(), 3);
    }

    #[test]
    fn test_nav_links_respect_crawl_rules() {
        let site = sites::site("abc").unwrap();
        let body = r#"
            <a href="/news/politics">politics</a>
            <a href="https://www.abc.net.au/iview">iview</a>
            <a href="/news/photo.jpg">media</a>
        "#;
        let nav = nav_links(site, body, "https://www.abc.net.au/news");
        assert_eq!(nav, vec!["https://www.abc.net.au/news/politics".to_string()]);
    }
}
