//! Crawl Engine - per-job expansion driver
//!
//! This module drives one Seed Job from its seed URL to exhaustion:
//! - Claiming the seed and fixing the allowed-domain set
//! - Running fetch → extract → classify → enqueue → pagination-detect per page
//! - Bounding intra-job parallelism with a `JoinSet` over an explicit work queue
//! - Enforcing the job's wall-clock ceiling
//!
//! Fetch failures are page-scoped: the URL is logged and dropped, the job continues.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::pagination::{PaginationSnapshot, PaginationTracker};
use crate::crawler::parser::{parse_page, ExtractedPage};
use crate::output::PersistenceSink;
use crate::state::{CrawlPhase, PhaseTracker};
use crate::url::{extract_domain, LinkClassifier};
use crate::{ScoutError, UrlError};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use url::Url;

/// Limits applied to one Seed Job
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Pages fetched concurrently within the job
    pub max_concurrent_fetches: usize,
    /// Wall-clock ceiling for the whole expansion
    pub job_timeout: Duration,
}

impl From<&CrawlerConfig> for CrawlSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_concurrent_fetches: config.max_concurrent_fetches,
            job_timeout: config.job_timeout(),
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 4,
            job_timeout: Duration::from_secs(3600),
        }
    }
}

/// Where a scheduled URL was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrigin {
    Seed,
    Anchor,
    BodyText,
    Card,
    Pagination,
}

/// A claimed URL waiting to be fetched
#[derive(Debug, Clone)]
struct FetchTask {
    url: Url,
    /// Pagination parent inherited from the discovering page; `None` only for the seed
    parent: Option<Url>,
    origin: LinkOrigin,
}

impl FetchTask {
    fn parent(&self) -> &Url {
        self.parent.as_ref().unwrap_or(&self.url)
    }
}

/// What processing one page produced
struct PageOutcome {
    page: ExtractedPage,
    discovered: Vec<FetchTask>,
}

/// Job-scoped state shared by every in-flight fetch
struct JobContext {
    fetcher: Arc<dyn Fetcher>,
    classifier: Arc<LinkClassifier>,
    frontier: Frontier,
    tracker: PaginationTracker,
    allowed_domains: RwLock<HashSet<String>>,
}

/// Everything a finished Seed Job accumulated
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub seed: Url,
    pub pages: Vec<ExtractedPage>,
    pub pagination: PaginationSnapshot,
    /// Every URL claimed during the job, sorted
    pub visited: Vec<String>,
    /// URLs whose fetch failed and were dropped
    pub failed: Vec<String>,
    /// True when the wall-clock ceiling cut expansion short
    pub timed_out: bool,
    pub phase: CrawlPhase,
    pub elapsed: Duration,
}

/// Drives Seed Jobs using a shared fetcher and classifier
pub struct CrawlEngine {
    fetcher: Arc<dyn Fetcher>,
    classifier: Arc<LinkClassifier>,
    settings: CrawlSettings,
}

impl CrawlEngine {
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: CrawlSettings) -> Self {
        Self {
            fetcher,
            classifier: Arc::new(LinkClassifier::new()),
            settings,
        }
    }

    /// Crawls everything reachable from `seed` until the queue drains or time runs out
    ///
    /// Pagination checkpoints go to `sink` after every tracker mutation.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Expansion finished (possibly cut short by the ceiling)
    /// * `Err(ScoutError)` - The seed has no usable domain
    pub async fn crawl(
        &self,
        seed: &Url,
        sink: Option<Arc<dyn PersistenceSink>>,
    ) -> Result<CrawlReport, ScoutError> {
        let started = Instant::now();
        let deadline = started + self.settings.job_timeout;
        let mut phase = PhaseTracker::new();

        let seed_domain = extract_domain(seed).ok_or(UrlError::MissingDomain)?;
        let ctx = Arc::new(JobContext {
            fetcher: Arc::clone(&self.fetcher),
            classifier: Arc::clone(&self.classifier),
            frontier: Frontier::new(),
            tracker: PaginationTracker::new(sink),
            allowed_domains: RwLock::new(HashSet::from([seed_domain])),
        });

        let mut pending = VecDeque::new();
        if ctx.frontier.try_claim(seed) {
            pending.push_back(FetchTask {
                url: seed.clone(),
                parent: None,
                origin: LinkOrigin::Seed,
            });
        }

        tracing::info!("Crawling {} ({})", seed, phase.current());
        phase.advance(CrawlPhase::Expanding)?;

        let max_in_flight = self.settings.max_concurrent_fetches.max(1);
        let mut in_flight: JoinSet<(Url, Result<PageOutcome, FetchError>)> = JoinSet::new();
        let mut pages = Vec::new();
        let mut failed = Vec::new();
        let mut timed_out = false;

        loop {
            while in_flight.len() < max_in_flight {
                let Some(task) = pending.pop_front() else {
                    break;
                };
                let ctx = Arc::clone(&ctx);
                in_flight.spawn(async move {
                    let url = task.url.clone();
                    (url, process_task(&ctx, task).await)
                });
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                joined = in_flight.join_next() => match joined {
                    Some(Ok((_, Ok(outcome)))) => {
                        pages.push(outcome.page);
                        pending.extend(outcome.discovered);
                    }
                    Some(Ok((url, Err(e)))) => {
                        tracing::warn!("Dropping {}: {}", url, e);
                        failed.push(url.to_string());
                    }
                    Some(Err(e)) => {
                        tracing::error!("Page task failed: {}", e);
                    }
                    None => {}
                },
                _ = sleep_until(deadline) => {
                    timed_out = true;
                    break;
                }
            }
        }

        if timed_out {
            tracing::warn!(
                "Job for {} hit its {:?} ceiling with {} pages in flight and {} queued",
                seed,
                self.settings.job_timeout,
                in_flight.len(),
                pending.len()
            );
            in_flight.abort_all();
        }

        phase.advance(CrawlPhase::Drained)?;
        ctx.tracker.checkpoint().await;

        let elapsed = started.elapsed();
        tracing::info!(
            "Crawl of {} {}: {} pages, {} dropped, {} URLs claimed in {:?}",
            seed,
            phase.current(),
            pages.len(),
            failed.len(),
            ctx.frontier.len(),
            elapsed
        );

        Ok(CrawlReport {
            seed: seed.clone(),
            pages,
            pagination: ctx.tracker.snapshot(),
            visited: ctx.frontier.claimed_urls(),
            failed,
            timed_out,
            phase: phase.current(),
            elapsed,
        })
    }
}

/// Fetches one claimed URL and expands it
///
/// This method:
/// 1. Fetches the page (a seed redirect widens the allowed domains)
/// 2. Extracts headings, body text, links and pagination candidates
/// 3. Schedules classified, unclaimed links from anchors, body text and cards
/// 4. Records the page under its pagination parent and picks the next page
///
/// Every task inherits the parent of the page that discovered it, so a job's pages all
/// count toward the seed's record.
async fn process_task(ctx: &JobContext, task: FetchTask) -> Result<PageOutcome, FetchError> {
    tracing::debug!("Fetching {} ({:?})", task.url, task.origin);
    let fetched = ctx.fetcher.fetch(&task.url).await?;
    let final_url = fetched.final_url;

    if task.origin == LinkOrigin::Seed && final_url != task.url {
        if let Some(domain) = extract_domain(&final_url) {
            tracing::info!("Seed {} redirected to {}", task.url, final_url);
            ctx.allowed_domains
                .write()
                .unwrap_or_else(|p| p.into_inner())
                .insert(domain);
        }
        ctx.frontier.try_claim(&final_url);
    }

    let parsed = parse_page(&fetched.body, &final_url);
    let parent = task.parent().clone();

    let mut discovered = Vec::new();
    {
        let allowed = ctx
            .allowed_domains
            .read()
            .unwrap_or_else(|p| p.into_inner());

        let sources = [
            (LinkOrigin::Anchor, &parsed.anchor_links),
            (LinkOrigin::BodyText, &parsed.text_links),
            (LinkOrigin::Card, &parsed.card_links),
        ];
        for (origin, links) in sources {
            for link in links {
                if ctx.classifier.should_visit(link, &allowed) && ctx.frontier.try_claim(link) {
                    discovered.push(FetchTask {
                        url: link.clone(),
                        parent: Some(parent.clone()),
                        origin,
                    });
                }
            }
        }
    }

    ctx.tracker.record_page(&parent, &final_url).await;

    if let Some(next) = ctx
        .tracker
        .pick_next(&parent, &parsed.pagination, &ctx.frontier)
        .await
    {
        discovered.push(FetchTask {
            url: next,
            parent: Some(parent),
            origin: LinkOrigin::Pagination,
        });
    }

    tracing::debug!(
        "Processed {}: {} new URLs scheduled",
        final_url,
        discovered.len()
    );

    Ok(PageOutcome {
        page: parsed.page,
        discovered,
    })
}
