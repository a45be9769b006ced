//! Configuration module for Press-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use press_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("press-scout.toml")).unwrap();
//! println!("Worker pool size: {}", config.jobs.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, CredentialsConfig, JobsConfig, LlmConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, load_seed_file};

// Re-export validation functions
pub use validation::{validate, validate_seed};
