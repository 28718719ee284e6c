//! Shallow breadth-first crawl bounded by a page budget and, for sites that
//! need it, a wall-clock deadline.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use tokio::time::{Duration, sleep};
use tracing::{debug, info, instrument, warn};

use crate::discover::{links_from_html_anywhere, nav_links};
use crate::fetch::Fetcher;
use crate::models::ArticleCandidate;
use crate::sites::SiteConfig;

/// Crawl outward from the entry pages, collecting article links from every
/// visited page. Navigation links grow the frontier; article links are
/// collected but never visited. A site with a zero page budget skips the
/// crawl entirely.
#[instrument(skip(site, fetcher), fields(site = site.key))]
pub async fn collect(site: &SiteConfig, fetcher: &Fetcher) -> Vec<ArticleCandidate> {
    if site.crawl_max_pages == 0 || site.entry_pages.is_empty() {
        return Vec::new();
    }

    let started = Instant::now();
    let mut frontier: VecDeque<String> = site
        .entry_pages
        .iter()
        .map(|p| (*p).to_string())
        .collect();
    let mut visited: HashSet<String> = HashSet::new();
    let mut collected: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    while let Some(page) = frontier.pop_front() {
        if visited.len() >= site.crawl_max_pages {
            break;
        }
        if let Some(limit) = site.crawl_deadline_secs {
            if started.elapsed().as_secs() >= limit {
                info!(visited = visited.len(), "crawl deadline reached");
                break;
            }
        }
        if !visited.insert(page.clone()) {
            continue;
        }

        let body = match fetcher.text(&page).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %page, error = %e, "crawl fetch failed");
                continue;
            }
        };

        let links = links_from_html_anywhere(site, &body, &page);
        debug!(url = %page, found = links.len(), "crawled page");
        for link in links {
            if collected.insert(link.clone()) {
                out.push(ArticleCandidate::bare(link));
            }
        }
        for nav in nav_links(site, &body, &page) {
            if !visited.contains(&nav) {
                frontier.push_back(nav);
            }
        }

        sleep(Duration::from_millis(site.fetch_sleep_ms)).await;
    }

    info!(visited = visited.len(), found = out.len(), "crawl finished");
    out
}
