//! Output sink traits and types
//!
//! This module defines the trait interface for persistence sinks and the data
//! structures written for each Seed Job.

use crate::crawler::{ExtractedPage, PaginationSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One page the model extracted content from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub url: String,
    pub result: String,
}

/// One page whose dispatch failed terminally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub url: String,
    pub error: String,
}

/// Merged dispatch results and pagination records for one seed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedResults {
    pub seed_url: String,

    /// Every URL claimed during the crawl
    pub visited_urls: Vec<String>,

    pub results: Vec<ExtractionRecord>,

    /// Pages the model reported as having no press content
    pub no_content: Vec<String>,

    /// Pages whose dispatch exhausted its retries or lost its credentials
    pub failures: Vec<FailureRecord>,

    /// Pages whose fetch failed and were dropped
    pub dropped_urls: Vec<String>,

    pub pagination: PaginationSnapshot,

    /// True when the crawl hit its wall-clock ceiling
    pub crawl_timed_out: bool,
}

/// External home for a Seed Job's persisted state
///
/// Implementations must tolerate concurrent `write_pagination` calls; the last write
/// wins.
pub trait PersistenceSink: Send + Sync {
    /// Writes the full pagination record set
    fn write_pagination(&self, snapshot: &PaginationSnapshot) -> OutputResult<()>;

    /// Writes the Extracted Pages of a finished crawl
    fn write_pages(&self, pages: &[ExtractedPage]) -> OutputResult<()>;

    /// Writes the merged results of a finished job
    fn write_results(&self, results: &SeedResults) -> OutputResult<()>;

    /// Writes the claimed URLs and the keyword-filtered pagination links of a finished crawl
    fn write_link_lists(
        &self,
        extracted_urls: &[String],
        filtered_pagination_links: &[String],
    ) -> OutputResult<()>;
}
