//! # newsnap
//!
//! A news snapshot pipeline for a set of Australian news sites (ABC, 7NEWS,
//! 9News, SBS English and Chinese, 2CR, AUCD). Each run discovers candidate
//! article URLs, fetches and extracts metadata, and writes a ranked JSON
//! snapshot per site, optionally mirrored as RSS.
//!
//! ## Architecture
//!
//! One pipeline, parameterized per site:
//! 1. **Discovery**: sitemaps (via robots.txt), entry/category pages, a
//!    shallow bounded crawl, site feeds, and a Google News RSS fallback
//! 2. **Fetch/Extract**: JSON-LD first, then Open Graph and meta tags, then
//!    URL-pattern inference
//! 3. **Merge**: dedupe by canonical link, sort by publish date descending,
//!    truncate to the per-site cap
//! 4. **Output**: `<out-dir>/<stem>.json`, plus `<stem>.xml` where enabled
//!
//! ## Usage
//!
//! ```sh
//! newsnap run --all --out-dir ./out
//! ```

use clap::Parser;
use std::error::Error;
use tracing::{error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod backfill;
mod cli;
mod discover;
mod extract;
mod fetch;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod rank;
mod sites;
mod utils;

use cli::{Cli, Command};
use pipeline::RunOptions;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();

    match args.command {
        Command::Run {
            site,
            all,
            out_dir,
            rss,
            max_items,
        } => {
            if let Err(e) = ensure_writable_dir(&out_dir).await {
                error!(
                    path = %out_dir,
                    error = %e,
                    "Output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }

            let targets: Vec<&sites::SiteConfig> = if all {
                sites::all().iter().collect()
            } else {
                let key = site.as_deref().unwrap_or_default();
                match sites::site(key) {
                    Some(s) => vec![s],
                    None => {
                        error!(site = key, "Unknown site; run `newsnap sites` for the list");
                        return Err(format!("unknown site: {key}").into());
                    }
                }
            };

            let options = RunOptions {
                out_dir,
                rss,
                max_items,
            };
            let mut failures = 0usize;
            for target in targets {
                info!(site = target.key, "Starting site run");
                match pipeline::run_site(target, &options).await {
                    Ok(count) => info!(site = target.key, count, "Site run complete"),
                    Err(e) => {
                        error!(site = target.key, error = %e, "Site run failed");
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                return Err(format!("{failures} site run(s) failed").into());
            }
        }
        Command::FixDates {
            site,
            file,
            out_dir,
        } => {
            let Some(config) = sites::site(&site) else {
                error!(site = %site, "Unknown site; run `newsnap sites` for the list");
                return Err(format!("unknown site: {site}").into());
            };
            let path =
                file.unwrap_or_else(|| format!("{}/{}.json", out_dir, config.output_stem));
            let fixed = backfill::fix_dates(config, &path).await?;
            info!(site = config.key, fixed, "Date backfill complete");
        }
        Command::Sites => {
            for s in sites::all() {
                println!("{:<12} {:<18} {}.json", s.key, s.source_name, s.output_stem);
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
