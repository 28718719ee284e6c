//! Google News RSS fallback.
//!
//! Only consulted when organic discovery underperforms. Google News items
//! rarely link the article directly; the real target hides in the `<link>`,
//! the `<guid>`, an entity-escaped URL inside `<description>`, or a
//! `u`/`url`/`q` query parameter on a `news.google.com` redirect.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::discover::rss::{RssItem, parse_items};
use crate::fetch::Fetcher;
use crate::models::ArticleCandidate;
use crate::sites::SiteConfig;

static EMBEDDED_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s'">]+"#).unwrap());

/// RSS search URL for a site-scoped query.
pub fn search_url(query: &str, locale: (&str, &str, &str)) -> String {
    let (hl, gl, ceid) = locale;
    format!(
        "https://news.google.com/rss/search?q={}&hl={}&gl={}&ceid={}",
        urlencoding::encode(query),
        hl,
        gl,
        ceid
    )
}

/// Whether a URL's parsed host matches the site. A substring test over the
/// whole URL would also match the percent-encoded host inside a
/// `news.google.com/url?u=...` redirect link.
fn on_host(url: &str, host: &str) -> bool {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.contains(host)))
        .unwrap_or(false)
}

fn url_from_text(text: &str, host: &str) -> Option<String> {
    let decoded = quick_xml::escape::unescape(text)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| text.to_string());
    EMBEDDED_URL_RE
        .find_iter(&decoded)
        .map(|m| m.as_str().to_string())
        .find(|u| on_host(u, host))
}

/// The real article URL behind a Google News item, or `None` when nothing
/// on-host can be recovered.
pub fn resolve_target(item: &RssItem, host: &str) -> Option<String> {
    if let Some(link) = &item.link {
        if on_host(link, host) {
            return Some(link.trim().to_string());
        }
    }
    if let Some(guid) = &item.guid {
        if on_host(guid, host) {
            return Some(guid.trim().to_string());
        }
    }
    if let Some(description) = &item.description {
        if let Some(found) = url_from_text(description, host) {
            return Some(found);
        }
    }
    if let Some(link) = &item.link {
        if link.contains("news.google.com") {
            if let Ok(parsed) = Url::parse(link) {
                for key in ["u", "url", "q"] {
                    if let Some((_, value)) =
                        parsed.query_pairs().find(|(k, _)| k == key)
                    {
                        if value.contains(host) {
                            return Some(value.into_owned());
                        }
                    }
                }
            }
        }
    }
    None
}

/// Query Google News for recent on-host articles. Yields nothing for sites
/// without a configured query.
#[instrument(skip(site, fetcher), fields(site = site.key))]
pub async fn collect(site: &SiteConfig, fetcher: &Fetcher) -> Vec<ArticleCandidate> {
    let Some(query) = site.google_news_query else {
        return Vec::new();
    };
    let url = search_url(query, site.google_news_locale);
    let xml = match fetcher.text(&url).await {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, "google news fetch failed");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    for item in parse_items(&xml) {
        let Some(target) = resolve_target(&item, site.host) else {
            continue;
        };
        if site.looks_like_article(&target) {
            out.push(ArticleCandidate::bare(target));
        }
    }
    debug!(found = out.len(), "google news resolved");
    out
}
