//! Sitemap discovery: robots.txt `Sitemap:` directives, then the sitemap
//! XML files they point at.

use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::discover::rss::resolve_general_ref;
use crate::fetch::Fetcher;
use crate::models::ArticleCandidate;
use crate::sites::SiteConfig;

static SITEMAP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*Sitemap:\s*(https?://\S+)\s*$").unwrap());
static LOC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<loc>\s*(.*?)\s*</loc>").unwrap());

/// Bound on collected URLs relative to the site's target output size.
/// Sitemaps on large sites run to hundreds of thousands of entries.
const SITEMAP_CAP_FACTOR: usize = 15;

/// `Sitemap:` URLs listed in a robots.txt body.
pub fn sitemaps_from_robots(robots: &str) -> Vec<String> {
    SITEMAP_RE
        .captures_iter(robots)
        .map(|c| c[1].to_string())
        .collect()
}

/// All `<loc>` values in a sitemap document, covering both `urlset` and
/// `sitemapindex` shapes. Falls back to a textual scan when the XML does
/// not parse, which real-world sitemaps occasionally fail to do.
///
/// `<loc>` content is accumulated across text/CDATA/entity-reference
/// fragments, so a URL containing `&amp;` stays one URL.
pub fn parse_sitemap_locs(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);

    let mut locs = Vec::new();
    let mut in_loc = false;
    let mut buf = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                in_loc = e.local_name().as_ref() == b"loc";
                buf.clear();
            }
            Ok(Event::End(e)) => {
                if in_loc && e.local_name().as_ref() == b"loc" {
                    let text = buf.trim();
                    if !text.is_empty() {
                        locs.push(text.to_string());
                    }
                }
                in_loc = false;
                buf.clear();
            }
            Ok(Event::Text(t)) if in_loc => {
                if let Ok(text) = t.xml10_content() {
                    buf.push_str(&text);
                }
            }
            Ok(Event::CData(t)) if in_loc => {
                buf.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Ok(Event::GeneralRef(r)) if in_loc => {
                if let Some(text) = resolve_general_ref(&r) {
                    buf.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => {
                return LOC_RE
                    .captures_iter(xml)
                    .map(|c| c[1].to_string())
                    .collect();
            }
            _ => {}
        }
    }
    locs
}

/// Collect article candidates from the site's sitemaps. Yields nothing for
/// sites without a configured robots.txt.
#[instrument(skip(site, fetcher), fields(site = site.key))]
pub async fn collect(site: &SiteConfig, fetcher: &Fetcher) -> Vec<ArticleCandidate> {
    let Some(robots_url) = site.robots_url else {
        return Vec::new();
    };
    let robots = match fetcher.text(robots_url).await {
        Ok(body) => body,
        Err(e) => {
            warn!(url = robots_url, error = %e, "robots.txt fetch failed");
            return Vec::new();
        }
    };

    let cap = SITEMAP_CAP_FACTOR * site.max_items;
    let mut out = Vec::new();
    for sitemap_url in sitemaps_from_robots(&robots) {
        if !sitemap_url.to_lowercase().ends_with(".xml") {
            continue;
        }
        let xml = match fetcher.text(&sitemap_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %sitemap_url, error = %e, "sitemap fetch failed");
                continue;
            }
        };
        let before = out.len();
        for loc in parse_sitemap_locs(&xml) {
            if site.looks_like_article(&loc) {
                out.push(ArticleCandidate::bare(loc));
            }
        }
        debug!(url = %sitemap_url, added = out.len() - before, "sitemap parsed");
        if out.len() >= cap {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sitemaps_from_robots() {
        let robots = "User-agent: *\nDisallow: /search\n\
            Sitemap: https://www.abc.net.au/news-sitemap.xml\n\
            sitemap: https://www.abc.net.au/sitemap-index.xml\n";
        let found = sitemaps_from_robots(robots);
        assert_eq!(
            found,
            vec![
                "https://www.abc.net.au/news-sitemap.xml",
                "https://www.abc.net.au/sitemap-index.xml",
            ]
        );
    }

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <url><loc>https://example.com/news/2024-05-01/a/1</loc></url>
            <url><loc> https://example.com/news/2024-05-01/b/2 </loc></url>
        </urlset>"#;
        let locs = parse_sitemap_locs(xml);
        assert_eq!(locs.len(), 2);
        assert_eq!(locs[1], "https://example.com/news/2024-05-01/b/2");
    }

    #[test]
    fn test_loc_with_entity_stays_one_url() {
        let xml = r#"<urlset>
            <url><loc>https://example.com/news/2024-05-01/a/1?id=7&amp;ref=sitemap</loc></url>
        </urlset>"#;
        assert_eq!(
            parse_sitemap_locs(xml),
            vec!["https://example.com/news/2024-05-01/a/1?id=7&ref=sitemap"]
        );
    }

    #[test]
    fn test_parse_sitemapindex() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sitemap><loc>https://example.com/sitemap-1.xml</loc></sitemap>
            <sitemap><loc>https://example.com/sitemap-2.xml</loc></sitemap>
        </sitemapindex>"#;
        let locs = parse_sitemap_locs(xml);
        assert_eq!(
            locs,
            vec![
                "https://example.com/sitemap-1.xml",
                "https://example.com/sitemap-2.xml",
            ]
        );
    }

    #[test]
    fn test_regex_fallback_on_broken_xml() {
        let xml = "<urlset><url><loc>https://example.com/news/2024-05-01/x/9</loc></url><url><loc>https://example.com/news/2024-05-02/y/10</loc>";
        let locs = parse_sitemap_locs(xml);
        assert!(locs.contains(&"https://example.com/news/2024-05-01/x/9".to_string()));
    }
}
