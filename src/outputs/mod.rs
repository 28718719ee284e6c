//! Snapshot writers.
//!
//! Every run ends in a JSON snapshot per site; sites configured for it (or
//! asked for on the command line) also get an RSS mirror of the same items
//! next to the JSON file:
//!
//! ```text
//! out_dir/
//! ├── abc_en.json
//! ├── abc_en.xml
//! ├── sbs_zh_hant.json
//! └── sbs_zh_hant.xml
//! ```

pub mod json;
pub mod rss;
