use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Press-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Seed URLs, one Seed Job each
    #[serde(default)]
    pub seeds: Vec<String>,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    pub llm: LlmConfig,
    pub credentials: CredentialsConfig,
    pub output: OutputConfig,
}

/// Crawl Engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header sent with every page fetch
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Maximum number of in-flight page fetches within one job
    #[serde(rename = "max-concurrent-fetches", default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Wall-clock ceiling for one job's expansion (seconds)
    #[serde(rename = "job-timeout-secs", default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,

    /// Per-request timeout for page fetches (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl CrawlerConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Cross-job worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Number of Seed Jobs processed in parallel
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// Language-model endpoint and dispatch policy
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Model identifier sent with every completion request
    pub model: String,

    /// Maximum characters per chunk
    #[serde(rename = "chunk-size", default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Total attempts per dispatch call
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Exponential backoff multiplier (seconds)
    #[serde(rename = "backoff-multiplier-secs", default = "default_backoff_multiplier")]
    pub backoff_multiplier_secs: u64,

    /// Lower bound on the backoff delay (seconds)
    #[serde(rename = "backoff-min-secs", default = "default_backoff_min")]
    pub backoff_min_secs: u64,

    /// Upper bound on the backoff delay (seconds)
    #[serde(rename = "backoff-max-secs", default = "default_backoff_max")]
    pub backoff_max_secs: u64,
}

/// Credential store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Path to the SQLite database holding the active/cooling-down key lists
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Cooling-down size at which all keys are returned to the active set
    #[serde(rename = "cooldown-threshold", default = "default_cooldown_threshold")]
    pub cooldown_threshold: usize,

    /// Environment variable holding a JSON array of keys used to seed an empty store
    #[serde(rename = "keys-env", default = "default_keys_env")]
    pub keys_env: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory; each seed gets its own subdirectory
    pub directory: String,

    /// Path to the markdown run summary
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_job_timeout_secs() -> u64 {
    3600
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_workers() -> usize {
    2
}

fn default_chunk_size() -> usize {
    6000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_multiplier() -> u64 {
    30
}

fn default_backoff_min() -> u64 {
    60
}

fn default_backoff_max() -> u64 {
    120
}

fn default_cooldown_threshold() -> usize {
    30
}

fn default_keys_env() -> String {
    "GROQ_API_KEYS".to_string()
}
