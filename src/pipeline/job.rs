//! Seed Job runner
//!
//! One Seed Job crawls a seed, persists its pages, dispatches every page to the model
//! and persists the merged results. A page whose dispatch fails is recorded as a
//! per-item failure; the remaining pages are still dispatched.

use crate::crawler::{filter_pagination_links, CrawlEngine, CrawlReport};
use crate::llm::{DispatchOutcome, Dispatcher};
use crate::output::{
    load_pagination_snapshot, seed_output_dir, ExtractionRecord, FailureRecord, JsonFileSink,
    PersistenceSink, SeedResults, SeedStatus, SeedSummary, PAGINATION_FILE,
};
use crate::ScoutError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Runs Seed Jobs against a shared engine, dispatcher and output root
pub struct JobRunner {
    engine: CrawlEngine,
    dispatcher: Dispatcher,
    output_root: PathBuf,
    fresh: bool,
}

impl JobRunner {
    /// `fresh` re-runs seeds whose output directory already exists
    pub fn new(
        engine: CrawlEngine,
        dispatcher: Dispatcher,
        output_root: impl Into<PathBuf>,
        fresh: bool,
    ) -> Self {
        Self {
            engine,
            dispatcher,
            output_root: output_root.into(),
            fresh,
        }
    }

    /// Runs one Seed Job, folding any job-level error into the summary
    pub async fn run_seed(&self, seed: &Url) -> SeedSummary {
        match self.try_run_seed(seed).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Error processing {}: {}", seed, e);
                SeedSummary::failed(seed.as_str(), e.to_string())
            }
        }
    }

    async fn try_run_seed(&self, seed: &Url) -> Result<SeedSummary, ScoutError> {
        let directory = seed_output_dir(&self.output_root, seed);
        let Some(sink) = JsonFileSink::claim(&directory, self.fresh)? else {
            let previous = load_pagination_snapshot(&directory.join(PAGINATION_FILE));
            let pages: u64 = previous.values().map(|record| record.page_count).sum();
            tracing::info!(
                "Skipping {} - output directory already exists ({} pages recorded earlier)",
                seed,
                pages
            );
            return Ok(SeedSummary {
                pages: usize::try_from(pages).unwrap_or(usize::MAX),
                ..SeedSummary::skipped(seed.as_str())
            });
        };

        let started = Instant::now();
        let sink = Arc::new(sink);

        let report = self
            .engine
            .crawl(seed, Some(Arc::clone(&sink) as Arc<dyn PersistenceSink>))
            .await?;
        sink.write_pages(&report.pages)?;
        sink.write_link_lists(&report.visited, &filter_pagination_links(&report.pagination))?;

        let results = self.dispatch_pages(&report).await;
        sink.write_results(&results)?;

        let summary = SeedSummary {
            seed: seed.to_string(),
            status: SeedStatus::Completed,
            elapsed: started.elapsed(),
            pages: report.pages.len(),
            results: results.results.len(),
            no_content: results.no_content.len(),
            failures: results.failures.len(),
            timed_out: report.timed_out,
            error: None,
        };

        tracing::info!(
            "Processed {} in {:.2} seconds: {} pages, {} results, {} failures",
            seed,
            summary.elapsed.as_secs_f64(),
            summary.pages,
            summary.results,
            summary.failures
        );

        Ok(summary)
    }

    /// Dispatches every page in crawl order and merges the outcomes with pagination
    async fn dispatch_pages(&self, report: &CrawlReport) -> SeedResults {
        let mut results = SeedResults {
            seed_url: report.seed.to_string(),
            visited_urls: report.visited.clone(),
            dropped_urls: report.failed.clone(),
            pagination: report.pagination.clone(),
            crawl_timed_out: report.timed_out,
            ..Default::default()
        };

        for page in &report.pages {
            match self.dispatcher.dispatch(&page.content, &page.url).await {
                Ok(dispatched) => match dispatched.outcome {
                    DispatchOutcome::Content(result) => {
                        results.results.push(ExtractionRecord {
                            url: page.url.clone(),
                            result,
                        });
                    }
                    DispatchOutcome::NoContent => {
                        tracing::info!("No press release content found for {}", page.url);
                        results.no_content.push(page.url.clone());
                    }
                },
                Err(e) => {
                    tracing::error!("Dispatch failed for {}: {}", page.url, e);
                    results.failures.push(FailureRecord {
                        url: page.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        results
    }
}
