//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: The lifecycle of one Seed Job's crawl (seeded, expanding, drained)
//! - `PhaseTracker`: Holds the current phase and rejects illegal transitions

mod crawl_phase;

// Re-export main types
pub use crawl_phase::{CrawlPhase, PhaseTracker};
