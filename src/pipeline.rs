//! Per-site pipeline: discover, fetch, extract, merge, persist.
//!
//! Sources run in priority order. The site's own feeds and the Google News
//! search are fallbacks, consulted only when organic discovery yields fewer
//! than half the target item count. Every stage fails soft except the final
//! snapshot write.

use std::collections::HashSet;
use std::error::Error;
use std::future::Future;

use chrono::Utc;
use tokio::time::{Duration, sleep};
use tracing::{info, instrument, warn};

use crate::discover::{self, merge_candidates};
use crate::extract;
use crate::fetch::Fetcher;
use crate::models::{Article, ArticleCandidate, article_id};
use crate::normalize::{canonicalize_with, iso_local, iso_utc, parse_date};
use crate::outputs;
use crate::rank;
use crate::sites::SiteConfig;
use crate::utils::clean_ws;

/// Options shared by every site run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub out_dir: String,
    /// Force an RSS mirror even for sites not configured for one.
    pub rss: bool,
    /// Override the site's configured item cap.
    pub max_items: Option<usize>,
}

/// Fetch bound relative to the target count: discovery over-collects so
/// that dead links and non-articles still leave enough survivors.
const FETCH_CAP_FACTOR: usize = 2;

/// An article synthesized purely from feed-carried fields, used when the
/// article page itself cannot be fetched.
fn article_from_seed(site: &SiteConfig, candidate: &ArticleCandidate) -> Option<Article> {
    let title = candidate.feed_title.as_deref().map(clean_ws)?;
    if title.is_empty() {
        return None;
    }
    let link = canonicalize_with(&candidate.url, site.strip_all_queries, site.tracking_params);
    let summary = candidate
        .feed_summary
        .as_deref()
        .map(clean_ws)
        .filter(|s| !s.is_empty());
    let published = candidate.feed_date.as_deref().and_then(parse_date);
    Some(Article {
        id: article_id(&link, &title),
        title,
        link,
        summary,
        published_at: published.map(iso_utc),
        published_at_local: published.and_then(|dt| {
            site.local_offset_minutes
                .and_then(|minutes| iso_local(dt, minutes))
        }),
        date_confidence: published.map(|_| crate::models::DateConfidence::Exact),
        source: site.source_name.to_string(),
        category: candidate.category_hint.clone(),
        fetched_at: iso_utc(Utc::now()),
    })
}

/// Fetch and extract a batch of candidates, skipping links already seen.
/// One failing URL never stops the batch. The fetch function is injected
/// so the skip-and-continue behavior is testable without sockets.
async fn fetch_candidates<F, Fut>(
    site: &SiteConfig,
    fetch: F,
    candidates: Vec<ArticleCandidate>,
    seen: &mut HashSet<String>,
    cap: usize,
) -> Vec<Article>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<String, Box<dyn Error>>>,
{
    let mut articles = Vec::new();
    for candidate in candidates {
        if seen.len() >= cap {
            break;
        }
        let key = canonicalize_with(&candidate.url, site.strip_all_queries, site.tracking_params);
        if !seen.insert(key) {
            continue;
        }

        let article = match fetch(candidate.url.clone()).await {
            Ok(body) => extract::extract(site, &candidate.url, &body, &candidate, Utc::now()),
            Err(e) => {
                warn!(url = %candidate.url, error = %e, "article fetch failed");
                // Feed-seeded candidates still carry enough to emit.
                article_from_seed(site, &candidate)
            }
        };
        if let Some(article) = article {
            articles.push(article);
        }
        sleep(Duration::from_millis(site.fetch_sleep_ms)).await;
    }
    articles
}

/// Run the full pipeline for one site. Returns the number of items written.
#[instrument(skip(site, options), fields(site = site.key))]
pub async fn run_site(site: &SiteConfig, options: &RunOptions) -> Result<usize, Box<dyn Error>> {
    let max_items = options.max_items.unwrap_or(site.max_items);
    let fetcher = Fetcher::new(&site.fetch)?;
    let fetch = |url: String| {
        let fetcher = &fetcher;
        async move { fetcher.text(&url).await }
    };

    let sitemap = discover::sitemap::collect(site, &fetcher).await;
    let entry = discover::entry::collect(site, &fetcher).await;
    let crawl = discover::crawl::collect(site, &fetcher).await;
    let candidates = merge_candidates(site, vec![sitemap, entry, crawl]);
    info!(candidates = candidates.len(), "organic discovery finished");

    let cap = FETCH_CAP_FACTOR * max_items;
    let mut seen: HashSet<String> = HashSet::new();
    let mut articles = fetch_candidates(site, &fetch, candidates, &mut seen, cap).await;

    if articles.len() < max_items / 2 && !site.feeds.is_empty() {
        info!(so_far = articles.len(), "under target, consulting site feeds");
        let from_feeds = discover::feeds::collect(site, &fetcher).await;
        articles.extend(fetch_candidates(site, &fetch, from_feeds, &mut seen, cap).await);
    }

    if articles.len() < max_items / 2 && site.google_news_query.is_some() {
        info!(so_far = articles.len(), "still under target, consulting Google News");
        let from_gn = discover::google_news::collect(site, &fetcher).await;
        articles.extend(fetch_candidates(site, &fetch, from_gn, &mut seen, cap).await);
    }

    let merged = rank::merge(articles, max_items);
    let document = outputs::json::build_document(site, merged);
    outputs::json::write_snapshot(site, &document, &options.out_dir).await?;
    if options.rss || site.rss_output {
        outputs::rss::write_feed(site, &document.items, &options.out_dir).await?;
    }
    Ok(document.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites;

    #[test]
    fn test_article_from_seed_full() {
        let site = sites::site("twocr").unwrap();
        let candidate = ArticleCandidate {
            url: "https://www.2cr.com.au/archives/123?utm_source=feed".to_string(),
            category_hint: None,
            feed_title: Some("  標題   一  ".to_string()),
            feed_summary: Some("summary".to_string()),
            feed_date: Some("Wed, 01 May 2024 10:00:00 +1000".to_string()),
        };
        let article = article_from_seed(site, &candidate).unwrap();
        assert_eq!(article.title, "標題 一");
        assert_eq!(article.link, "https://www.2cr.com.au/archives/123");
        assert_eq!(article.published_at.as_deref(), Some("2024-05-01T00:00:00Z"));
        assert_eq!(
            article.date_confidence,
            Some(crate::models::DateConfidence::Exact)
        );
    }

    #[test]
    fn test_article_from_seed_requires_title() {
        let site = sites::site("twocr").unwrap();
        let candidate = ArticleCandidate::bare("https://www.2cr.com.au/archives/9".to_string());
        assert!(article_from_seed(site, &candidate).is_none());
    }

    #[tokio::test]
    async fn test_one_failing_fetch_keeps_the_rest() {
        let site = sites::site("abc").unwrap();
        let candidates: Vec<ArticleCandidate> = (1..=5)
            .map(|i| {
                ArticleCandidate::bare(format!(
                    "https://www.abc.net.au/news/2024-05-01/story-{i}/10{i}"
                ))
            })
            .collect();

        let fetch = |url: String| async move {
            if url.contains("story-3") {
                return Err::<String, Box<dyn Error>>("connection refused".into());
            }
            Ok(format!(
                r#"<html><head><meta property="og:title" content="Story" /><meta property="og:description" content="{url}" /></head></html>"#
            ))
        };

        let mut seen = HashSet::new();
        let articles = fetch_candidates(site, &fetch, candidates, &mut seen, 10).await;
        assert_eq!(articles.len(), 4, "the four healthy URLs must survive");
        assert!(articles.iter().all(|a| !a.link.contains("story-3")));
    }
}
