//! JSON snapshot writer.

use std::error::Error;

use chrono::Utc;
use tokio::fs;
use tracing::{error, info, instrument};

use crate::models::{Article, OutputDocument};
use crate::normalize::{iso_local, iso_utc};
use crate::sites::SiteConfig;

/// Build the snapshot document for one site's merged articles.
pub fn build_document(site: &SiteConfig, items: Vec<Article>) -> OutputDocument {
    let now = Utc::now();
    OutputDocument {
        source: site.source_name.to_string(),
        generated_at: iso_utc(now),
        generated_at_local: site
            .local_offset_minutes
            .and_then(|minutes| iso_local(now, minutes)),
        count: items.len(),
        items,
    }
}

/// Write the snapshot to `<out_dir>/<stem>.json`, pretty-printed. Unlike
/// discovery and fetching, a write failure here is fatal: a run that cannot
/// persist its result has produced nothing.
#[instrument(level = "info", skip(document), fields(site = site.key))]
pub async fn write_snapshot(
    site: &SiteConfig,
    document: &OutputDocument,
    out_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(document)?;
    let path = format!("{}/{}.json", out_dir, site.output_stem);
    if let Err(e) = fs::write(&path, json).await {
        error!(path = %path, error = %e, "Failed to write JSON snapshot");
        return Err(e.into());
    }
    info!(path = %path, count = document.count, "Wrote JSON snapshot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites;

    #[test]
    fn test_build_document_counts_items() {
        let site = sites::site("abc").unwrap();
        let document = build_document(site, Vec::new());
        assert_eq!(document.source, "ABC News");
        assert_eq!(document.count, 0);
        assert!(document.generated_at_local.is_none());
        assert!(document.generated_at.ends_with('Z'));
    }

    #[test]
    fn test_build_document_local_projection() {
        let site = sites::site("seven").unwrap();
        let document = build_document(site, Vec::new());
        let local = document.generated_at_local.unwrap();
        assert!(local.ends_with("+10:00"));
    }
}
