//! Per-site configuration and the compiled-in site registry.
//!
//! Every supported site is the same pipeline instantiated with different
//! data: entry pages, URL-shape rules, category slug tables, feeds and a
//! Google News fallback query. Nothing in here is executable site logic:
//! adding a site means adding a [`SiteConfig`] value, not code.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Default User-Agent identifying the aggregator.
pub const DEFAULT_UA: &str = "newsnap/0.1 (+news-aggregator; contact: ops@newsnap.dev)";

/// Browser User-Agent used for origins that reject the default one.
pub const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const HTML_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// How to talk to one origin: fixed headers, timeout, and an optional
/// alternate User-Agent retried once on 403/406 responses.
#[derive(Debug, Clone)]
pub struct FetchStrategy {
    pub user_agent: &'static str,
    pub accept: Option<&'static str>,
    pub accept_language: Option<&'static str>,
    /// Site-compatibility workaround, not a general retry policy.
    pub alternate_user_agent: Option<&'static str>,
    pub timeout_secs: u64,
}

impl FetchStrategy {
    const fn default_bot() -> Self {
        FetchStrategy {
            user_agent: DEFAULT_UA,
            accept: None,
            accept_language: None,
            alternate_user_agent: None,
            timeout_secs: 25,
        }
    }
}

/// A URL path-prefix whose trailing segment names the category, e.g.
/// `["news", "topic"]` maps `/news/topic/world/...` to the slug `world`.
/// The empty prefix means the first path segment is the slug.
pub type CategoryPrefix = &'static [&'static str];

/// Everything the pipeline needs to know about one site, as data.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Registry key, also the CLI name (`newsnap run --site abc`).
    pub key: &'static str,
    /// Human-readable source name carried into every output record.
    pub source_name: &'static str,
    /// Host substring all article URLs must contain.
    pub host: &'static str,
    pub robots_url: Option<&'static str>,
    pub entry_pages: &'static [&'static str],
    /// Generate `?page=N` / `/page/N/` candidates per entry page up to N.
    pub entry_pagination: Option<u32>,
    /// Crawl never leaves these prefixes.
    pub allowed_prefixes: &'static [&'static str],
    /// URLs containing any of these substrings are never articles.
    pub blocked_segments: &'static [&'static str],
    /// Hosts whose links are dropped outright (login pages, social embeds).
    pub blocked_hosts: &'static [&'static str],
    /// Path substrings that mark an article URL (`/article/`, `/stories/`).
    pub article_markers: &'static [&'static str],
    /// Accept URLs whose path embeds a `YYYY-MM-DD` segment.
    pub accept_date_segment: bool,
    /// Accept any same-host URL with at least this many path segments.
    /// `None` disables the segment-count rule.
    pub min_path_segments: Option<usize>,
    /// Substrings the path must contain before any article rule applies.
    pub required_substrings: &'static [&'static str],
    /// Slug-to-display-name table used by URL category inference.
    pub category_slugs: &'static [(&'static str, &'static str)],
    /// Path prefixes under which the next segment is the category slug.
    pub category_prefixes: &'static [CategoryPrefix],
    /// Site RSS feeds consulted when organic discovery runs dry.
    pub feeds: &'static [&'static str],
    /// WordPress-style `?paged=N` feed pagination up to N pages.
    pub feed_pagination: Option<u32>,
    /// Query for the Google News RSS fallback, e.g. `site:abc.net.au/news`.
    pub google_news_query: Option<&'static str>,
    /// Locale parameters for the Google News query (`hl`, `gl`, `ceid`).
    pub google_news_locale: (&'static str, &'static str, &'static str),
    /// Output file name without extension.
    pub output_stem: &'static str,
    pub max_items: usize,
    pub fetch: FetchStrategy,
    /// Display timezone as minutes east of UTC (+600 for Sydney standard
    /// time). Projection only; sorting always uses UTC.
    pub local_offset_minutes: Option<i32>,
    pub crawl_max_pages: usize,
    pub fetch_sleep_ms: u64,
    /// Wall-clock bound on the crawl stage; exceeded means stop visiting
    /// and emit what was collected.
    pub crawl_deadline_secs: Option<u64>,
    /// Query parameters carry no content on this site, drop them all.
    pub strip_all_queries: bool,
    /// Site-specific tracking keys stripped in addition to `utm_*`.
    pub tracking_params: &'static [&'static str],
    /// Emit an RSS mirror next to the JSON snapshot.
    pub rss_output: bool,
    pub feed_language: &'static str,
}

static DATE_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d{4}-\d{2}-\d{2}/").unwrap());

const MEDIA_EXTS: &[&str] = &[
    ".mp3", ".mp4", ".m4a", ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".webp", ".svg", ".webm",
    ".m3u8",
];

impl SiteConfig {
    /// Whether a URL has the shape of an article page on this site.
    ///
    /// This is the single filter applied to every discovery source:
    /// same host, not a sitemap or media file, not a blocked section, and
    /// matching at least one of the site's article rules (marker segment,
    /// embedded date, or bare path-depth).
    pub fn looks_like_article(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => return false,
        };
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return false;
        }
        let host = parsed.host_str().unwrap_or("");
        if !host.contains(self.host) {
            return false;
        }
        let lower = url.to_lowercase();
        if lower.ends_with(".xml") {
            return false;
        }
        if MEDIA_EXTS.iter().any(|ext| lower.ends_with(ext)) {
            return false;
        }
        if self.blocked_segments.iter().any(|seg| url.contains(seg)) {
            return false;
        }
        if !self.required_substrings.iter().all(|s| url.contains(s)) {
            return false;
        }

        if self.article_markers.iter().any(|m| url.contains(m)) {
            return true;
        }
        if self.accept_date_segment && DATE_SEGMENT_RE.is_match(parsed.path()) {
            return true;
        }
        if let Some(min) = self.min_path_segments {
            let segments = parsed
                .path()
                .split('/')
                .filter(|s| !s.is_empty())
                .count();
            return segments >= min;
        }
        false
    }

    /// Whether the crawler may visit a URL (navigation pages included).
    pub fn may_crawl(&self, url: &str) -> bool {
        if !self.allowed_prefixes.iter().any(|p| url.starts_with(p)) {
            return false;
        }
        let lower = url.to_lowercase();
        if MEDIA_EXTS.iter().any(|ext| lower.ends_with(ext)) {
            return false;
        }
        !self.blocked_hosts.iter().any(|h| url.contains(h))
    }

    /// Category display name inferred from the URL path, when the path
    /// matches one of the site's category prefixes.
    pub fn category_from_url(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let segments: Vec<&str> = parsed
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        for prefix in self.category_prefixes {
            if segments.len() > prefix.len()
                && segments.iter().zip(prefix.iter()).all(|(a, b)| a == b)
            {
                return Some(self.slug_title(segments[prefix.len()]));
            }
            // A bare section root like `/news` still names its category.
            if !prefix.is_empty() && segments.len() == prefix.len() && segments == *prefix {
                return Some(self.slug_title(segments[segments.len() - 1]));
            }
        }
        None
    }

    /// Display name for a section slug: table lookup, else Title Case by
    /// hyphen.
    pub fn slug_title(&self, slug: &str) -> String {
        for (key, name) in self.category_slugs {
            if *key == slug {
                return (*name).to_string();
            }
        }
        slug.split('-')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(f) => f.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

static SITES: Lazy<Vec<SiteConfig>> = Lazy::new(|| {
    vec![
        SiteConfig {
            key: "abc",
            source_name: "ABC News",
            host: "abc.net.au",
            robots_url: Some("https://www.abc.net.au/robots.txt"),
            entry_pages: &[
                "https://www.abc.net.au/news",
                "https://www.abc.net.au/news/justin",
                "https://www.abc.net.au/news/politics",
                "https://www.abc.net.au/news/world",
                "https://www.abc.net.au/news/business",
                "https://www.abc.net.au/news/sport",
                "https://www.abc.net.au/news/health",
                "https://www.abc.net.au/news/science",
            ],
            entry_pagination: Some(3),
            allowed_prefixes: &["https://www.abc.net.au/news/"],
            blocked_segments: &[],
            blocked_hosts: &[],
            article_markers: &["/article/", "/stories/"],
            accept_date_segment: true,
            min_path_segments: None,
            required_substrings: &["/news/"],
            category_slugs: &[
                ("justin", "Just In"),
                ("politics", "Politics"),
                ("world", "World"),
                ("business", "Business"),
                ("sport", "Sport"),
                ("health", "Health"),
                ("science", "Science"),
                ("news", "News"),
            ],
            category_prefixes: &[&["news"]],
            feeds: &[
                "https://www.abc.net.au/news/feed/45910/rss.xml",
                "https://www.abc.net.au/news/feed/51120/rss.xml",
                "https://www.abc.net.au/news/feed/52278/rss.xml",
                "https://www.abc.net.au/news/feed/51892/rss.xml",
                "https://www.abc.net.au/news/feed/51800/rss.xml",
                "https://www.abc.net.au/news/feed/53446/rss.xml",
                "https://www.abc.net.au/news/feed/43606/rss.xml",
                "https://www.abc.net.au/news/feed/45926/rss.xml",
                "https://www.abc.net.au/news/feed/45920/rss.xml",
                "https://www.abc.net.au/news/feed/45922/rss.xml",
            ],
            feed_pagination: None,
            google_news_query: Some("site:abc.net.au/news"),
            google_news_locale: ("en-AU", "AU", "AU:en"),
            output_stem: "abc_en",
            max_items: 200,
            fetch: FetchStrategy::default_bot(),
            local_offset_minutes: None,
            crawl_max_pages: 80,
            fetch_sleep_ms: 400,
            crawl_deadline_secs: None,
            strip_all_queries: false,
            tracking_params: &[],
            rss_output: true,
            feed_language: "en",
        },
        SiteConfig {
            key: "seven",
            source_name: "7NEWS",
            host: "7news.com.au",
            robots_url: Some("https://7news.com.au/robots.txt"),
            entry_pages: &[
                "https://7news.com.au/",
                "https://7news.com.au/news",
                "https://7news.com.au/politics",
                "https://7news.com.au/world",
                "https://7news.com.au/business",
                "https://7news.com.au/sport",
                "https://7news.com.au/entertainment",
                "https://7news.com.au/lifestyle",
                "https://7news.com.au/technology",
                "https://7news.com.au/travel",
            ],
            entry_pagination: None,
            allowed_prefixes: &["https://7news.com.au/"],
            blocked_segments: &[
                "/sitemap/",
                "/tag/",
                "/category/",
                "/live/",
                "/weather/",
                "/privacy",
                "/terms",
            ],
            blocked_hosts: &[],
            article_markers: &[],
            accept_date_segment: false,
            min_path_segments: Some(1),
            required_substrings: &[],
            category_slugs: &[
                ("news", "News"),
                ("politics", "Politics"),
                ("world", "World"),
                ("business", "Business"),
                ("sport", "Sport"),
                ("entertainment", "Entertainment"),
                ("lifestyle", "Lifestyle"),
                ("technology", "Technology"),
                ("travel", "Travel"),
            ],
            category_prefixes: &[&[]],
            feeds: &[],
            feed_pagination: None,
            google_news_query: Some("site:7news.com.au"),
            google_news_locale: ("en-AU", "AU", "AU:en"),
            output_stem: "seven_en",
            max_items: 200,
            fetch: FetchStrategy::default_bot(),
            local_offset_minutes: Some(600),
            crawl_max_pages: 100,
            fetch_sleep_ms: 400,
            crawl_deadline_secs: None,
            strip_all_queries: true,
            tracking_params: &[],
            rss_output: true,
            feed_language: "en",
        },
        SiteConfig {
            key: "nine",
            source_name: "9News",
            host: "9news.com.au",
            robots_url: Some("https://www.9news.com.au/robots.txt"),
            entry_pages: &[
                "https://www.9news.com.au/",
                "https://www.9news.com.au/national",
                "https://www.9news.com.au/world",
                "https://www.9news.com.au/politics",
                "https://www.9news.com.au/business",
                "https://www.9news.com.au/health",
                "https://www.9news.com.au/technology",
                "https://www.9news.com.au/entertainment",
                "https://www.9news.com.au/sport",
            ],
            entry_pagination: None,
            allowed_prefixes: &["https://www.9news.com.au/"],
            blocked_segments: &["/meet-the-team", "/coupons", "/web-stories"],
            blocked_hosts: &[
                "9now.com.au",
                "login.nine.com.au",
                "help.nine.com.au",
                "schema.org",
                "w3.org",
                "facebook.com",
                "twitter.com",
                "instagram.com",
                "pinterest.com",
            ],
            article_markers: &[],
            accept_date_segment: false,
            min_path_segments: Some(1),
            required_substrings: &[],
            category_slugs: &[
                ("national", "National"),
                ("world", "World"),
                ("politics", "Politics"),
                ("business", "Business"),
                ("health", "Health"),
                ("technology", "Technology"),
                ("entertainment", "Entertainment"),
                ("sport", "Sport"),
            ],
            category_prefixes: &[&[]],
            feeds: &[],
            feed_pagination: None,
            google_news_query: Some("site:9news.com.au"),
            google_news_locale: ("en-AU", "AU", "AU:en"),
            output_stem: "nine_en",
            max_items: 200,
            fetch: FetchStrategy {
                user_agent: BROWSER_UA,
                accept: Some(HTML_ACCEPT),
                accept_language: None,
                alternate_user_agent: Some(DEFAULT_UA),
                timeout_secs: 15,
            },
            local_offset_minutes: Some(600),
            crawl_max_pages: 100,
            fetch_sleep_ms: 200,
            crawl_deadline_secs: Some(600),
            strip_all_queries: true,
            tracking_params: &[],
            rss_output: true,
            feed_language: "en",
        },
        SiteConfig {
            key: "sbs-en",
            source_name: "SBS English",
            host: "sbs.com.au",
            robots_url: Some("https://www.sbs.com.au/robots.txt"),
            entry_pages: &[
                "https://www.sbs.com.au/news/collection/just-in",
                "https://www.sbs.com.au/news/collection/top-stories",
                "https://www.sbs.com.au/news/topic/cost-of-living",
                "https://www.sbs.com.au/news/topic/australia",
                "https://www.sbs.com.au/news/topic/world",
                "https://www.sbs.com.au/news/topic/politics",
                "https://www.sbs.com.au/news/topic/immigration",
                "https://www.sbs.com.au/news/topic/indigenous",
                "https://www.sbs.com.au/news/topic/environment",
                "https://www.sbs.com.au/news/topic/life",
            ],
            entry_pagination: None,
            allowed_prefixes: &["https://www.sbs.com.au/news"],
            blocked_segments: &["/topic/", "/collection/"],
            blocked_hosts: &[],
            article_markers: &["/article/", "/podcast-episode/"],
            accept_date_segment: false,
            min_path_segments: None,
            required_substrings: &["/news/"],
            category_slugs: &[
                ("just-in", "Just In"),
                ("top-stories", "Top Stories"),
                ("cost-of-living", "Cost of Living"),
                ("australia", "Australia"),
                ("world", "World"),
                ("politics", "Politics"),
                ("immigration", "Immigration"),
                ("indigenous", "Indigenous"),
                ("environment", "Environment"),
                ("life", "Life"),
            ],
            category_prefixes: &[&["news", "topic"], &["news", "collection"]],
            feeds: &[],
            feed_pagination: None,
            google_news_query: Some("site:sbs.com.au/news"),
            google_news_locale: ("en-AU", "AU", "AU:en"),
            output_stem: "sbs_en",
            max_items: 200,
            fetch: FetchStrategy::default_bot(),
            local_offset_minutes: None,
            crawl_max_pages: 80,
            fetch_sleep_ms: 500,
            crawl_deadline_secs: None,
            strip_all_queries: false,
            tracking_params: &[],
            rss_output: false,
            feed_language: "en",
        },
        SiteConfig {
            key: "sbs-zh-hant",
            source_name: "SBS 中文（繁體）",
            host: "sbs.com.au",
            robots_url: None,
            entry_pages: &[
                "https://www.sbs.com.au/language/chinese/zh-hant/topic/news",
                "https://www.sbs.com.au/language/chinese/zh-hant",
            ],
            entry_pagination: None,
            allowed_prefixes: &["https://www.sbs.com.au/language/chinese/"],
            blocked_segments: &["/topic/"],
            blocked_hosts: &[],
            article_markers: &["/article/", "/podcast-episode/", "/audio/"],
            accept_date_segment: false,
            min_path_segments: None,
            required_substrings: &["/language/"],
            category_slugs: &[],
            category_prefixes: &[],
            feeds: &[
                "https://www.sbs.com.au/language/chinese/zh-hant/feed",
                "https://www.sbs.com.au/language/chinese/feed",
            ],
            feed_pagination: None,
            google_news_query: None,
            google_news_locale: ("zh-TW", "AU", "AU:zh-Hant"),
            output_stem: "sbs_zh_hant",
            max_items: 120,
            fetch: FetchStrategy {
                accept_language: Some("zh-HK,zh-TW;q=0.9,zh;q=0.8,en;q=0.5"),
                ..FetchStrategy::default_bot()
            },
            local_offset_minutes: None,
            crawl_max_pages: 0,
            fetch_sleep_ms: 400,
            crawl_deadline_secs: None,
            strip_all_queries: false,
            tracking_params: &[],
            rss_output: true,
            feed_language: "zh-hant",
        },
        SiteConfig {
            key: "twocr",
            source_name: "2CR 澳華之聲",
            host: "2cr.com.au",
            robots_url: None,
            entry_pages: &[],
            entry_pagination: None,
            allowed_prefixes: &[],
            blocked_segments: &["/category/", "/tag/"],
            blocked_hosts: &[],
            article_markers: &[],
            accept_date_segment: false,
            min_path_segments: Some(1),
            required_substrings: &[],
            category_slugs: &[],
            category_prefixes: &[],
            feeds: &[
                "https://www.2cr.com.au/feed/",
                "https://www.2cr.com.au/category/news/feed/",
            ],
            feed_pagination: Some(12),
            google_news_query: None,
            google_news_locale: ("zh-TW", "AU", "AU:zh-Hant"),
            output_stem: "twocr",
            max_items: 250,
            fetch: FetchStrategy {
                timeout_secs: 20,
                ..FetchStrategy::default_bot()
            },
            local_offset_minutes: None,
            crawl_max_pages: 0,
            fetch_sleep_ms: 300,
            crawl_deadline_secs: None,
            strip_all_queries: false,
            tracking_params: &[],
            rss_output: false,
            feed_language: "zh-hant",
        },
        SiteConfig {
            key: "aucd",
            source_name: "澳洲新報",
            host: "aucd.com.au",
            robots_url: None,
            entry_pages: &[],
            entry_pagination: None,
            allowed_prefixes: &[],
            blocked_segments: &[],
            blocked_hosts: &[],
            article_markers: &[],
            accept_date_segment: false,
            min_path_segments: Some(1),
            required_substrings: &[],
            category_slugs: &[],
            category_prefixes: &[],
            feeds: &["https://aucd.com.au/feed/"],
            feed_pagination: Some(8),
            google_news_query: None,
            google_news_locale: ("zh-TW", "AU", "AU:zh-Hant"),
            output_stem: "aucd",
            max_items: 200,
            fetch: FetchStrategy {
                accept_language: Some("zh-HK,zh-TW;q=0.9,zh;q=0.8,en;q=0.5"),
                timeout_secs: 20,
                ..FetchStrategy::default_bot()
            },
            local_offset_minutes: None,
            crawl_max_pages: 0,
            fetch_sleep_ms: 400,
            crawl_deadline_secs: None,
            strip_all_queries: false,
            tracking_params: &[],
            rss_output: false,
            feed_language: "zh-hant",
        },
    ]
});

/// All built-in sites, in registry order.
pub fn all() -> &'static [SiteConfig] {
    &SITES
}

/// Look up one site by its registry key.
pub fn site(key: &str) -> Option<&'static SiteConfig> {
    SITES.iter().find(|s| s.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert!(site("abc").is_some());
        assert!(site("sbs-en").is_some());
        assert!(site("nosuchsite").is_none());
        assert_eq!(all().len(), 7);
    }

    #[test]
    fn test_abc_article_shapes() {
        let abc = site("abc").unwrap();
        assert!(abc.looks_like_article("https://www.abc.net.au/news/2024-05-01/some-story/104000000"));
        assert!(abc.looks_like_article("https://www.abc.net.au/news/article/whatever"));
        assert!(!abc.looks_like_article("https://www.abc.net.au/news/feed/45910/rss.xml"));
        assert!(!abc.looks_like_article("https://www.abc.net.au/iview/show"));
        assert!(!abc.looks_like_article("https://example.com/news/2024-05-01/story/"));
    }

    #[test]
    fn test_seven_article_shapes() {
        let seven = site("seven").unwrap();
        assert!(seven.looks_like_article("https://7news.com.au/world/some-headline-c-123"));
        assert!(!seven.looks_like_article("https://7news.com.au/sitemap/news.xml"));
        assert!(!seven.looks_like_article("https://7news.com.au/tag/floods"));
        assert!(!seven.looks_like_article("https://7news.com.au/video/clip.mp4"));
    }

    #[test]
    fn test_nine_blocked_hosts() {
        let nine = site("nine").unwrap();
        assert!(!nine.may_crawl("https://login.nine.com.au/signin"));
        assert!(!nine.may_crawl("https://www.facebook.com/9news"));
        assert!(nine.may_crawl("https://www.9news.com.au/national"));
    }

    #[test]
    fn test_category_from_url_prefixed() {
        let abc = site("abc").unwrap();
        assert_eq!(
            abc.category_from_url("https://www.abc.net.au/news/world/2024-05-01/x"),
            Some("World".to_string())
        );
        assert_eq!(
            abc.category_from_url("https://www.abc.net.au/news"),
            Some("News".to_string())
        );
        assert_eq!(abc.category_from_url("https://www.abc.net.au/iview"), None);
    }

    #[test]
    fn test_category_from_url_first_segment() {
        let seven = site("seven").unwrap();
        assert_eq!(
            seven.category_from_url("https://7news.com.au/politics/some-story"),
            Some("Politics".to_string())
        );
    }

    #[test]
    fn test_category_from_url_sbs_topic() {
        let sbs = site("sbs-en").unwrap();
        assert_eq!(
            sbs.category_from_url("https://www.sbs.com.au/news/topic/cost-of-living/page"),
            Some("Cost of Living".to_string())
        );
        assert_eq!(
            sbs.category_from_url("https://www.sbs.com.au/news/collection/just-in"),
            Some("Just In".to_string())
        );
    }

    #[test]
    fn test_slug_title_fallback_title_cases() {
        let sbs = site("sbs-en").unwrap();
        assert_eq!(sbs.slug_title("climate-change-policy"), "Climate Change Policy");
        assert_eq!(sbs.slug_title("world"), "World");
    }
}
