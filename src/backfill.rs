//! Date backfill: patch missing `publishedAt` values in an existing
//! snapshot by re-fetching the article pages.
//!
//! This is the one place in the program with a hard precondition: the
//! snapshot file must already exist. Everything downstream of that stays
//! fail-soft, a page that still yields no date simply keeps its null.

use std::error::Error;
use std::path::Path;

use chrono::Utc;
use tokio::fs;
use tokio::time::{Duration, sleep};
use tracing::{info, instrument, warn};

use crate::extract::date_from_html;
use crate::fetch::Fetcher;
use crate::models::{DateConfidence, OutputDocument};
use crate::normalize::{iso_utc, parse_date};
use crate::sites::SiteConfig;

/// Re-fetch every undated item in the snapshot at `path` and write the
/// patched document back in place. Returns the number of items fixed.
#[instrument(skip(site), fields(site = site.key, path = %path))]
pub async fn fix_dates(site: &SiteConfig, path: &str) -> Result<usize, Box<dyn Error>> {
    if !Path::new(path).exists() {
        return Err(format!("{path} not found. Run the scrape for this site first.").into());
    }

    let raw = fs::read_to_string(path).await?;
    let mut document: OutputDocument = serde_json::from_str(&raw)?;
    let fetcher = Fetcher::new(&site.fetch)?;

    let mut fixed = 0;
    for item in &mut document.items {
        if item.published_at.is_some() || item.link.is_empty() {
            continue;
        }
        let body = match fetcher.text(&item.link).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %item.link, error = %e, "backfill fetch failed");
                continue;
            }
        };
        if let Some(dt) = date_from_html(&body) {
            item.published_at = Some(iso_utc(dt));
            item.date_confidence = Some(DateConfidence::Exact);
            fixed += 1;
        }
        sleep(Duration::from_millis(site.fetch_sleep_ms)).await;
    }

    // Keep published/local pairs consistent for items just patched.
    if let Some(minutes) = site.local_offset_minutes {
        for item in &mut document.items {
            if item.published_at_local.is_none() {
                item.published_at_local = item
                    .published_at
                    .as_deref()
                    .and_then(parse_date)
                    .and_then(|dt| crate::normalize::iso_local(dt, minutes));
            }
        }
    }

    document.generated_at = iso_utc(Utc::now());
    document.count = document.items.len();
    fs::write(path, serde_json::to_string_pretty(&document)?).await?;
    info!(fixed, total = document.count, "backfill finished");
    Ok(fixed)
}
