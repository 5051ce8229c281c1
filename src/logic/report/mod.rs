//! Report Module - Run artifacts
//!
//! Layout of an output directory:
//! - `results.jsonl` - every record, row order
//! - `flagged.json` - flagged records by combined score, with explanations
//! - `root_cause.txt` - narrative (empty when nothing was flagged)
//! - `summary.json` - run statistics

pub mod types;
pub mod writer;


pub use types::{CategoryCounts, FlaggedRow, RunSummary};
pub use writer::{ReportWriter, FLAGGED_FILE, RESULTS_FILE, ROOT_CAUSE_FILE, SUMMARY_FILE};
