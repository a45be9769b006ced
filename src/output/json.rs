//! JSON file sink
//!
//! Each seed gets its own directory holding:
//! - `pagination_info.json`: live pagination checkpoint
//! - `scraped_content.json`: Extracted Pages
//! - `final_results.json`: merged dispatch results
//! - `extracted_urls.json`: every URL claimed during the crawl
//! - `filtered_pagination_links.json`: pagination links that mention a news keyword
//!
//! Files are written to a temporary sibling and renamed into place, so a reader never
//! sees a half-written document.

use crate::crawler::{ExtractedPage, PaginationSnapshot};
use crate::output::traits::{OutputResult, PersistenceSink, SeedResults};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

pub const PAGINATION_FILE: &str = "pagination_info.json";
pub const PAGES_FILE: &str = "scraped_content.json";
pub const RESULTS_FILE: &str = "final_results.json";
pub const EXTRACTED_URLS_FILE: &str = "extracted_urls.json";
pub const FILTERED_PAGINATION_FILE: &str = "filtered_pagination_links.json";

/// Hex digits of the seed digest appended to each directory name
const SEED_DIGEST_LEN: usize = 8;

/// Writes a Seed Job's documents under one directory
#[derive(Debug)]
pub struct JsonFileSink {
    directory: PathBuf,
    writes: AtomicU64,
}

impl JsonFileSink {
    /// Claims `directory` for one Seed Job
    ///
    /// The directory itself is created with a single `create_dir`, so two jobs can never
    /// both claim it. When it already exists the result is `None`, unless
    /// `reuse_existing` is set.
    pub fn claim(directory: impl Into<PathBuf>, reuse_existing: bool) -> OutputResult<Option<Self>> {
        let directory = directory.into();
        if let Some(parent) = directory.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match std::fs::create_dir(&directory) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !reuse_existing {
                    return Ok(None);
                }
                tracing::debug!("Reusing output directory {}", directory.display());
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Some(Self {
            directory,
            writes: AtomicU64::new(0),
        }))
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> OutputResult<()> {
        let target = self.directory.join(name);
        let sequence = self.writes.fetch_add(1, Ordering::Relaxed);
        let temp = self.directory.join(format!(".{}.{}.tmp", name, sequence));

        let body = serde_json::to_vec_pretty(value)?;
        std::fs::write(&temp, body)?;
        std::fs::rename(&temp, &target)?;

        tracing::debug!("Wrote {}", target.display());
        Ok(())
    }
}

impl PersistenceSink for JsonFileSink {
    fn write_pagination(&self, snapshot: &PaginationSnapshot) -> OutputResult<()> {
        self.write_json(PAGINATION_FILE, snapshot)
    }

    fn write_pages(&self, pages: &[ExtractedPage]) -> OutputResult<()> {
        self.write_json(PAGES_FILE, pages)
    }

    fn write_results(&self, results: &SeedResults) -> OutputResult<()> {
        self.write_json(RESULTS_FILE, results)
    }

    fn write_link_lists(
        &self,
        extracted_urls: &[String],
        filtered_pagination_links: &[String],
    ) -> OutputResult<()> {
        self.write_json(EXTRACTED_URLS_FILE, extracted_urls)?;
        self.write_json(FILTERED_PAGINATION_FILE, filtered_pagination_links)
    }
}

/// Reads a pagination checkpoint
///
/// A missing or unparseable file yields an empty snapshot and a warning.
pub fn load_pagination_snapshot(path: &Path) -> PaginationSnapshot {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Pagination info not readable at {}: {}", path.display(), e);
            return PaginationSnapshot::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("Malformed pagination info at {}: {}", path.display(), e);
            PaginationSnapshot::new()
        }
    }
}

/// Directory name for a seed's outputs
///
/// Host (and explicit port) followed by the last path segment, keeping only
/// characters that are safe in file names, then a short digest of the full seed URL so
/// seeds that share a host and last segment never share a directory.
pub fn seed_directory_name(seed: &Url) -> String {
    let last_segment = seed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string());

    let mut site = seed.host_str().unwrap_or("site").to_string();
    if let Some(port) = seed.port() {
        site = format!("{}_{}", site, port);
    }

    let raw = match last_segment {
        Some(segment) => format!("{}_{}", site, segment),
        None => site,
    };

    let sanitized: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let digest = hex::encode(Sha256::digest(seed.as_str().as_bytes()));
    let digest = &digest[..SEED_DIGEST_LEN];

    if sanitized.trim_matches(|c| c == '.' || c == '_').is_empty() {
        format!("default_directory_{}", digest)
    } else {
        format!("{}_{}", sanitized, digest)
    }
}

/// `<root>/<seed directory name>`
pub fn seed_output_dir(root: &Path, seed: &Url) -> PathBuf {
    root.join(seed_directory_name(seed))
}
