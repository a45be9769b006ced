//! Cross-job worker pool
//!
//! Seed Jobs run in parallel up to a fixed worker count. Jobs share nothing mutable
//! except the Credential Rotator held by the `JobRunner`'s dispatcher.

use crate::output::SeedSummary;
use crate::pipeline::job::JobRunner;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Runs every seed through `runner` with at most `workers` jobs in flight
///
/// Summaries come back in completion order. A job that panics is reported as failed.
pub async fn run_seed_jobs(runner: Arc<JobRunner>, seeds: Vec<Url>, workers: usize) -> Vec<SeedSummary> {
    let total = seeds.len();
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut jobs = JoinSet::new();

    tracing::info!("Processing {} seeds with {} workers", total, workers.max(1));

    for seed in seeds {
        let runner = Arc::clone(&runner);
        let semaphore = Arc::clone(&semaphore);

        jobs.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return SeedSummary::failed(seed.as_str(), "worker pool closed"),
            };
            runner.run_seed(&seed).await
        });
    }

    let mut summaries = Vec::with_capacity(total);
    while let Some(joined) = jobs.join_next().await {
        match joined {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                tracing::error!("Seed job panicked: {}", e);
                summaries.push(SeedSummary::failed("<unknown>", e.to_string()));
            }
        }

        let done = summaries.len();
        tracing::info!(
            "Progress: {}/{} seeds processed. {} remaining.",
            done,
            total,
            total - done
        );
    }

    summaries
}
