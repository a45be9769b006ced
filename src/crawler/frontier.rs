//! Visited-Set Frontier
//!
//! The single gate through which a URL may be scheduled for fetch within a Seed Job.
//! Claims are keyed by the normalized URL string and are atomic under concurrent callers.

use std::collections::HashSet;
use std::sync::Mutex;
use url::Url;

#[derive(Debug, Default)]
pub struct Frontier {
    claimed: Mutex<HashSet<String>>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for this job
    ///
    /// Returns true exactly once per URL; every later call (from any task) returns false.
    pub fn try_claim(&self, url: &Url) -> bool {
        let mut claimed = self.claimed.lock().unwrap_or_else(|p| p.into_inner());
        claimed.insert(url.as_str().to_string())
    }

    pub fn len(&self) -> usize {
        self.claimed.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every claimed URL, sorted
    pub fn claimed_urls(&self) -> Vec<String> {
        let claimed = self.claimed.lock().unwrap_or_else(|p| p.into_inner());
        let mut urls: Vec<String> = claimed.iter().cloned().collect();
        urls.sort();
        urls
    }
}
