//! Command-line interface definitions.
//!
//! # Examples
//!
//! ```sh
//! # Scrape one site into the current directory
//! newsnap run --site abc
//!
//! # Scrape everything into ./out, forcing RSS mirrors
//! newsnap run --all --out-dir ./out --rss
//!
//! # Patch missing publish dates in an existing snapshot
//! newsnap fix-dates --site sbs-zh-hant
//!
//! # List the built-in sites
//! newsnap sites
//! ```

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape sites and write JSON (and optionally RSS) snapshots
    Run {
        /// Site key to run (see `sites` for the list)
        #[arg(short, long, conflicts_with = "all")]
        site: Option<String>,

        /// Run every built-in site in registry order
        #[arg(long)]
        all: bool,

        /// Directory snapshots are written to
        #[arg(short, long, default_value = ".")]
        out_dir: String,

        /// Also write RSS mirrors for sites not configured for one
        #[arg(long)]
        rss: bool,

        /// Override the per-site maximum item count
        #[arg(long)]
        max_items: Option<usize>,
    },

    /// Re-fetch pages for snapshot items missing a publish date
    FixDates {
        /// Site key the snapshot belongs to
        #[arg(short, long)]
        site: String,

        /// Snapshot path (defaults to `<out-dir>/<site-stem>.json`)
        #[arg(short, long)]
        file: Option<String>,

        /// Directory the snapshot lives in
        #[arg(short, long, default_value = ".")]
        out_dir: String,
    },

    /// List the built-in sites and their output files
    Sites,
}
