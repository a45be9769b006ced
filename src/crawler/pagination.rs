//! Pagination Tracker
//!
//! Accumulates, per parent URL, every pagination link discovered under that parent and
//! the number of pages visited beneath it. The full record set is checkpointed to the
//! configured `PersistenceSink` after every mutation so partial progress survives a
//! crash; checkpoint failures are logged and never interrupt the crawl.
//!
//! Sink writes are file I/O, so they run on tokio's blocking pool.

use crate::crawler::frontier::Frontier;
use crate::output::PersistenceSink;
use crate::url::mentions_news_keyword;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use url::Url;

/// Pagination links a page exposes, grouped by tier
#[derive(Debug, Clone, Default)]
pub struct PaginationCandidates {
    /// Explicit forward pointer (`a.next`, `rel="next"`, `aria-label="Next"`)
    pub next: Option<Url>,
    /// Explicit backward pointer
    pub previous: Option<Url>,
    /// Enumerated page-number links, in document order
    pub numbered: Vec<Url>,
    /// Year-selector option values
    pub years: Vec<Url>,
}

impl PaginationCandidates {
    pub fn is_empty(&self) -> bool {
        self.next.is_none()
            && self.previous.is_none()
            && self.numbered.is_empty()
            && self.years.is_empty()
    }

    /// Candidates in precedence order
    fn in_tier_order(&self) -> impl Iterator<Item = &Url> {
        self.next
            .iter()
            .chain(self.previous.iter())
            .chain(self.numbered.iter())
            .chain(self.years.iter())
    }
}

/// Discovered pagination surface for one parent URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationRecord {
    /// Insertion-ordered, duplicate-free
    pub pagination_links: Vec<String>,
    pub page_count: u64,
}

impl PaginationRecord {
    fn add_link(&mut self, link: &str) {
        if !self.pagination_links.iter().any(|existing| existing == link) {
            self.pagination_links.push(link.to_string());
        }
    }
}

/// Parent URL -> record, serialized as the pagination checkpoint
pub type PaginationSnapshot = BTreeMap<String, PaginationRecord>;

pub struct PaginationTracker {
    records: Mutex<PaginationSnapshot>,
    sink: Option<Arc<dyn PersistenceSink>>,
}

impl PaginationTracker {
    pub fn new(sink: Option<Arc<dyn PersistenceSink>>) -> Self {
        Self {
            records: Mutex::new(PaginationSnapshot::new()),
            sink,
        }
    }

    /// Records a visit to `page_url` under `parent_url`
    ///
    /// The page count increments on every call, even when the link is already known.
    pub async fn record_page(&self, parent_url: &Url, page_url: &Url) {
        {
            let mut records = self.lock();
            let record = records.entry(parent_url.to_string()).or_default();
            record.add_link(page_url.as_str());
            record.page_count += 1;
        }
        self.checkpoint().await;
    }

    /// Picks the next page to follow under `parent_url`
    ///
    /// Tiers are tried in order: next, previous, numbered pages, year options. Every
    /// candidate examined is added to the parent's record; the first one `frontier`
    /// lets us claim wins and stops the search.
    pub async fn pick_next(
        &self,
        parent_url: &Url,
        candidates: &PaginationCandidates,
        frontier: &Frontier,
    ) -> Option<Url> {
        if candidates.is_empty() {
            return None;
        }

        let mut chosen = None;
        {
            let mut records = self.lock();
            let record = records.entry(parent_url.to_string()).or_default();

            for candidate in candidates.in_tier_order() {
                record.add_link(candidate.as_str());
                if frontier.try_claim(candidate) {
                    chosen = Some(candidate.clone());
                    break;
                }
            }
        }

        if let Some(next) = &chosen {
            tracing::debug!("Pagination under {} continues at {}", parent_url, next);
        }
        self.checkpoint().await;

        chosen
    }

    /// A copy of every record
    pub fn snapshot(&self) -> PaginationSnapshot {
        self.lock().clone()
    }

    /// Writes the current records to the sink, if any
    ///
    /// The snapshot is cloned under the lock and written after releasing it, so
    /// concurrent checkpoints may land in any order.
    pub async fn checkpoint(&self) {
        let Some(sink) = &self.sink else {
            return;
        };

        let sink = Arc::clone(sink);
        let snapshot = self.snapshot();
        match tokio::task::spawn_blocking(move || sink.write_pagination(&snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed to checkpoint pagination state: {}", e),
            Err(e) => tracing::warn!("Pagination checkpoint task failed: {}", e),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PaginationSnapshot> {
        self.records.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Every parent and pagination link that carries a news keyword, sorted and deduplicated
pub fn filter_pagination_links(snapshot: &PaginationSnapshot) -> Vec<String> {
    let mut filtered: Vec<String> = snapshot
        .iter()
        .flat_map(|(parent, record)| {
            std::iter::once(parent).chain(record.pagination_links.iter())
        })
        .filter(|link| mentions_news_keyword(link))
        .cloned()
        .collect();
    filtered.sort();
    filtered.dedup();
    filtered
}

impl std::fmt::Debug for PaginationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationTracker")
            .field("records", &self.lock().len())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
