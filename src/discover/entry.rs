//! Entry-page discovery: configured section/category pages, optionally
//! widened with common pagination URL shapes.

use tokio::time::{Duration, sleep};
use tracing::{debug, instrument, warn};

use crate::discover::links_from_html_anywhere;
use crate::fetch::Fetcher;
use crate::models::ArticleCandidate;
use crate::sites::SiteConfig;

/// Common pagination shapes for a section page: the page itself, then
/// `?page=N` and `/page/N/` variants for pages 2..=N. Sites answer whichever
/// shape they support and 404 the other, which the fetch layer absorbs.
pub fn pagination_candidates(base: &str, pages: u32) -> Vec<String> {
    let trimmed = base.trim_end_matches('/');
    let mut out = vec![trimmed.to_string()];
    for n in 2..=pages {
        out.push(format!("{trimmed}?page={n}"));
        out.push(format!("{trimmed}/page/{n}/"));
    }
    out
}

/// Scrape every configured entry page for article links, attaching the
/// entry page's category as a hint.
#[instrument(skip(site, fetcher), fields(site = site.key))]
pub async fn collect(site: &SiteConfig, fetcher: &Fetcher) -> Vec<ArticleCandidate> {
    let mut pages: Vec<(String, Option<String>)> = Vec::new();
    for base in site.entry_pages {
        let hint = site.category_from_url(base);
        match site.entry_pagination {
            Some(n) => {
                for page in pagination_candidates(base, n) {
                    pages.push((page, hint.clone()));
                }
            }
            None => pages.push(((*base).to_string(), hint)),
        }
    }

    let mut out = Vec::new();
    for (page, hint) in pages {
        let body = match fetcher.text(&page).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %page, error = %e, "entry page fetch failed");
                continue;
            }
        };
        let links = links_from_html_anywhere(site, &body, &page);
        debug!(url = %page, found = links.len(), "entry page scraped");
        for link in links {
            out.push(ArticleCandidate::hinted(link, hint.clone()));
        }
        sleep(Duration::from_millis(site.fetch_sleep_ms)).await;
    }
    out
}
