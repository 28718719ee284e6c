//! Date normalization and URL canonicalization.
//!
//! Everything here is total: malformed input yields `None` (dates) or the
//! input unchanged (URLs), never an error. "Date not found" is a value,
//! not an exception.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use url::Url;

/// Parse a raw date string from RSS, meta tags or JSON-LD into a UTC
/// instant.
///
/// Accepted forms, in order of attempt:
/// - RFC 3339 / ISO-8601 with an offset (`2024-05-01T10:00:00+10:00`, `...Z`)
/// - ISO-8601 without an offset, assumed UTC (`2024-05-01T10:00:00`)
/// - bare dates, assumed midnight UTC (`2024-05-01`)
/// - RFC 2822/1123 as seen in RSS `pubDate` (`Wed, 01 May 2024 10:00:00 GMT`),
///   with zone-less forms assumed UTC
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // No timezone designator: assume UTC.
    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // RFC 822 without a zone, assumed UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%a, %d %b %Y %H:%M:%S") {
        return Some(naive.and_utc());
    }

    None
}

/// Normalize a raw date string to UTC ISO-8601, or `None` when it cannot
/// be interpreted.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(iso_utc)
}

/// Serialize a UTC instant as `2024-05-01T10:00:00Z`.
pub fn iso_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Project a UTC instant into a fixed display offset (minutes east of UTC).
/// Display only; callers must keep sorting and dedup on the UTC value.
pub fn iso_local(dt: DateTime<Utc>, offset_minutes: i32) -> Option<String> {
    let offset = FixedOffset::east_opt(offset_minutes * 60)?;
    Some(
        dt.with_timezone(&offset)
            .to_rfc3339_opts(SecondsFormat::Secs, false),
    )
}

/// Canonicalize an article URL.
///
/// Forces https, lowercases the host (via the `url` parser), resolves
/// protocol-relative forms, strips the fragment, strips `utm_*` plus any
/// site-specific tracking parameters (or every query parameter when
/// `strip_all_queries` is set), and trims the trailing slash except at the
/// root. Idempotent: canonicalizing twice is a no-op. Unparseable input is
/// returned unchanged so the caller's dedup still has a stable key.
pub fn canonicalize_with(url: &str, strip_all_queries: bool, tracking_params: &[&str]) -> String {
    let raw = url.trim();
    let absolute = if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        raw.to_string()
    };

    let mut parsed = match Url::parse(&absolute) {
        Ok(u) => u,
        Err(_) => return raw.to_string(),
    };
    if parsed.scheme() == "http" {
        let _ = parsed.set_scheme("https");
    }
    parsed.set_fragment(None);

    let kept: Vec<(String, String)> = if strip_all_queries {
        Vec::new()
    } else {
        parsed
            .query_pairs()
            .filter(|(k, _)| {
                !k.starts_with("utm_") && !tracking_params.iter().any(|t| t == k)
            })
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    };
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    urlencoding::encode(k).into_owned()
                } else {
                    format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))
                }
            })
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

/// Canonicalize with the default tracking-parameter policy (`utm_*` only).
pub fn canonicalize(url: &str) -> String {
    canonicalize_with(url, false, &[])
}
