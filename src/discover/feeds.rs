//! Site RSS feed discovery, with WordPress-style pagination.
//!
//! Feed items arrive with their own title, summary and publish date. Those
//! travel along on the candidate so extraction can fall back to them when
//! the article page itself gives nothing usable.

use tokio::time::{Duration, sleep};
use tracing::{debug, instrument, warn};

use crate::discover::rss::{RssItem, parse_items};
use crate::fetch::Fetcher;
use crate::models::ArticleCandidate;
use crate::sites::SiteConfig;

/// URL variants for page N of a feed. Page 1 is the feed itself. For later
/// pages WordPress installs answer one of `?paged=N`, `/page/N/feed/` or
/// `/page/N/?feed=rss2` depending on their permalink setup; unsupported
/// variants 404 or come back empty, both of which read as "no more pages".
pub fn feed_page_urls(base: &str, page: u32) -> Vec<String> {
    if page <= 1 {
        return vec![base.to_string()];
    }
    let sep = if base.contains('?') { '&' } else { '?' };
    let mut urls = vec![format!("{base}{sep}paged={page}")];
    if let Some(root) = base.strip_suffix("/feed/").or_else(|| base.strip_suffix("/feed")) {
        urls.push(format!("{root}/page/{page}/feed/"));
        urls.push(format!("{root}/page/{page}/?feed=rss2"));
    }
    urls
}

fn to_candidate(item: RssItem) -> Option<ArticleCandidate> {
    // Some feeds put the article URL only in the guid. A permalink guid is
    // usable; an opaque one (tag: URIs, numeric ids) is not.
    let url = item
        .link
        .or_else(|| item.guid.filter(|g| g.starts_with("http")))?;
    Some(ArticleCandidate {
        url,
        category_hint: None,
        feed_title: item.title,
        feed_summary: item.description,
        feed_date: item.pub_date,
    })
}

/// Read every configured feed, following pagination until a page comes back
/// empty or the page bound is hit.
#[instrument(skip(site, fetcher), fields(site = site.key))]
pub async fn collect(site: &SiteConfig, fetcher: &Fetcher) -> Vec<ArticleCandidate> {
    let max_pages = site.feed_pagination.unwrap_or(1);
    let mut out = Vec::new();

    for feed in site.feeds {
        'pages: for page in 1..=max_pages {
            let mut page_items: Vec<RssItem> = Vec::new();
            for url in feed_page_urls(feed, page) {
                match fetcher.text(&url).await {
                    Ok(body) => {
                        let items = parse_items(&body);
                        if !items.is_empty() {
                            debug!(url = %url, count = items.len(), "feed page parsed");
                            page_items = items;
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "feed fetch failed");
                    }
                }
            }
            if page_items.is_empty() {
                // Page 1 empty means a dead feed; later pages mean the end
                // of pagination. Either way, move on.
                break 'pages;
            }
            out.extend(page_items.into_iter().filter_map(to_candidate));
            sleep(Duration::from_millis(site.fetch_sleep_ms)).await;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_page_urls_first_page() {
        assert_eq!(
            feed_page_urls("https://www.2cr.com.au/feed/", 1),
            vec!["https://www.2cr.com.au/feed/"]
        );
    }

    #[test]
    fn test_feed_page_urls_wordpress_variants() {
        assert_eq!(
            feed_page_urls("https://aucd.com.au/feed/", 3),
            vec![
                "https://aucd.com.au/feed/?paged=3",
                "https://aucd.com.au/page/3/feed/",
                "https://aucd.com.au/page/3/?feed=rss2",
            ]
        );
    }

    #[test]
    fn test_feed_page_urls_query_feed() {
        assert_eq!(
            feed_page_urls("https://example.com/index.php?feed=rss2", 2),
            vec!["https://example.com/index.php?feed=rss2&paged=2"]
        );
    }

    #[test]
    fn test_to_candidate_requires_link() {
        let item = RssItem {
            title: Some("T".to_string()),
            link: None,
            ..RssItem::default()
        };
        assert!(to_candidate(item).is_none());

        let item = RssItem {
            title: Some("T".to_string()),
            link: Some("https://www.2cr.com.au/archives/123".to_string()),
            description: Some("S".to_string()),
            pub_date: Some("Wed, 01 May 2024 10:00:00 +1000".to_string()),
            ..RssItem::default()
        };
        let candidate = to_candidate(item).unwrap();
        assert_eq!(candidate.url, "https://www.2cr.com.au/archives/123");
        assert_eq!(candidate.feed_title.as_deref(), Some("T"));
        assert_eq!(candidate.feed_date.as_deref(), Some("Wed, 01 May 2024 10:00:00 +1000"));
    }

    #[test]
    fn test_to_candidate_falls_back_to_permalink_guid() {
        let item = RssItem {
            title: Some("T".to_string()),
            guid: Some("https://aucd.com.au/?p=4521".to_string()),
            ..RssItem::default()
        };
        let candidate = to_candidate(item).unwrap();
        assert_eq!(candidate.url, "https://aucd.com.au/?p=4521");

        let item = RssItem {
            title: Some("T".to_string()),
            guid: Some("tag:example.com,2024:4521".to_string()),
            ..RssItem::default()
        };
        assert!(to_candidate(item).is_none());
    }
}
