//! Output module for persisting job state and run reports
//!
//! This module handles:
//! - The `PersistenceSink` seam and its JSON file implementation
//! - Reloading pagination checkpoints
//! - Recording run statistics and writing the markdown summary

mod json;
mod markdown;
pub mod stats;
mod traits;

pub use json::{
    load_pagination_snapshot, seed_directory_name, seed_output_dir, JsonFileSink,
    EXTRACTED_URLS_FILE, FILTERED_PAGINATION_FILE, PAGES_FILE, PAGINATION_FILE, RESULTS_FILE,
};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{print_statistics, RunStatistics, SeedStatus, SeedSummary};
pub use traits::{
    ExtractionRecord, FailureRecord, OutputError, OutputResult, PersistenceSink, SeedResults,
};
