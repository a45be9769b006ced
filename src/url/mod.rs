//! URL handling module for Press-Scout
//!
//! This module provides URL normalization, domain extraction, and the Link Classifier
//! that decides which discovered links are worth visiting.

mod classifier;
mod domain;
mod normalize;

// Re-export main functions
pub use classifier::{mentions_news_keyword, LinkClassifier, NEWS_KEYWORDS};
pub use domain::extract_domain;
pub use normalize::{normalize_url, resolve_href};
