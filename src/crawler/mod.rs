//! Crawler module for page discovery within a Seed Job
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `Fetcher` capability
//! - HTML extraction (headings, body text, links, pagination candidates)
//! - The Visited-Set Frontier and the Pagination Tracker
//! - The Crawl Engine that drives a job from seed to drained

mod engine;
mod fetcher;
mod frontier;
mod pagination;
mod parser;

pub use engine::{CrawlEngine, CrawlReport, CrawlSettings, LinkOrigin};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use frontier::Frontier;
pub use pagination::{
    filter_pagination_links, PaginationCandidates, PaginationRecord, PaginationSnapshot,
    PaginationTracker,
};
pub use parser::{
    clean_text, extract_body_text, extract_headings, parse_page, ExtractedPage, ParsedPage,
};
