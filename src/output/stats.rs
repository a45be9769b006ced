//! Run statistics
//!
//! This module tallies per-seed outcomes and prints the end-of-run report.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// How a Seed Job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStatus {
    Completed,
    /// Output directory already existed
    Skipped,
    Failed,
}

impl SeedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of one Seed Job
#[derive(Debug, Clone)]
pub struct SeedSummary {
    pub seed: String,
    pub status: SeedStatus,
    pub elapsed: Duration,
    pub pages: usize,
    pub results: usize,
    pub no_content: usize,
    pub failures: usize,
    pub timed_out: bool,
    pub error: Option<String>,
}

impl SeedSummary {
    pub fn skipped(seed: impl Into<String>) -> Self {
        Self::empty(seed, SeedStatus::Skipped, None)
    }

    pub fn failed(seed: impl Into<String>, error: impl Into<String>) -> Self {
        Self::empty(seed, SeedStatus::Failed, Some(error.into()))
    }

    fn empty(seed: impl Into<String>, status: SeedStatus, error: Option<String>) -> Self {
        Self {
            seed: seed.into(),
            status,
            elapsed: Duration::ZERO,
            pages: 0,
            results: 0,
            no_content: 0,
            failures: 0,
            timed_out: false,
            error,
        }
    }
}

/// Aggregate statistics for one run
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub config_hash: String,
    pub seeds: Vec<SeedSummary>,
}

impl RunStatistics {
    pub fn new(config_hash: impl Into<String>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            config_hash: config_hash.into(),
            seeds: Vec::new(),
        }
    }

    pub fn record(&mut self, summary: SeedSummary) {
        self.seeds.push(summary);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn processed(&self) -> usize {
        self.seeds.len()
    }

    pub fn successful(&self) -> usize {
        self.count(SeedStatus::Completed)
    }

    pub fn skipped(&self) -> usize {
        self.count(SeedStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(SeedStatus::Failed)
    }

    /// Summed wall time of the completed seeds
    pub fn total_time(&self) -> Duration {
        self.seeds
            .iter()
            .filter(|s| s.status == SeedStatus::Completed)
            .map(|s| s.elapsed)
            .sum()
    }

    /// Mean wall time per completed seed; zero when none completed
    pub fn average_time(&self) -> Duration {
        match self.successful() {
            0 => Duration::ZERO,
            n => self.total_time() / n as u32,
        }
    }

    pub fn total_results(&self) -> usize {
        self.seeds.iter().map(|s| s.results).sum()
    }

    fn count(&self, status: SeedStatus) -> usize {
        self.seeds.iter().filter(|s| s.status == status).count()
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Run Statistics ===\n");

    println!(
        "Total websites processed: {}/{}",
        stats.successful(),
        stats.processed()
    );
    println!("  Skipped: {}", stats.skipped());
    println!("  Failed: {}", stats.failed());
    println!(
        "Total processing time: {:.2} seconds",
        stats.total_time().as_secs_f64()
    );
    println!(
        "Average time per website: {:.2} seconds",
        stats.average_time().as_secs_f64()
    );
    println!("Total extracted results: {}", stats.total_results());

    let failed: Vec<_> = stats
        .seeds
        .iter()
        .filter(|s| s.status == SeedStatus::Failed)
        .collect();
    if !failed.is_empty() {
        println!("\nFailed seeds:");
        for seed in failed {
            println!(
                "  - {}: {}",
                seed.seed,
                seed.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
