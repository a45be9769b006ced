//! Integration tests for Press-Scout
//!
//! These tests use wiremock to stand in for both the crawled website and the
//! language-model endpoint.

mod crawl_tests;
mod dispatch_tests;
mod pipeline_tests;

use press_scout::config::{CrawlerConfig, LlmConfig};
use press_scout::llm::RetryPolicy;
use std::time::Duration;

pub fn crawler_config() -> CrawlerConfig {
    CrawlerConfig {
        user_agent: "PressScout-Test/0.1".to_string(),
        max_concurrent_fetches: 4,
        job_timeout_secs: 30,
        request_timeout_secs: 5,
    }
}

pub fn llm_config(base_url: &str) -> LlmConfig {
    LlmConfig {
        base_url: base_url.to_string(),
        model: "test-model".to_string(),
        chunk_size: 6000,
        max_attempts: 5,
        backoff_multiplier_secs: 30,
        backoff_min_secs: 60,
        backoff_max_secs: 120,
    }
}

/// Same attempt ceiling as production, with millisecond backoff
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        multiplier: Duration::from_millis(1),
        min_delay: Duration::from_millis(2),
        max_delay: Duration::from_millis(5),
    }
}

pub fn html(body: &str) -> wiremock::ResponseTemplate {
    wiremock::ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Test</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

pub fn completion(content: &str) -> wiremock::ResponseTemplate {
    wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    }))
}
