//! Language-model dispatch
//!
//! This module sends extracted page text to an external model, including:
//! - The `LlmEndpoint` capability and an OpenAI-compatible client
//! - Chunking, boilerplate stripping and sentinel detection
//! - The process-wide Credential Rotator
//! - The Rate-Limited Dispatcher with whole-call retry and backoff

mod dispatcher;
mod endpoint;
mod rotator;
mod text;

pub use dispatcher::{DispatchError, DispatchOutcome, Dispatched, Dispatcher, RetryPolicy};
pub use endpoint::{build_prompt, ChatCompletionsClient, LlmEndpoint, LlmError};
pub use rotator::{mask_key, parse_key_list, seed_store_from_env, CredentialError, CredentialRotator};
pub use text::{chunk_text, is_no_content, strip_leading_phrase, NO_CONTENT_SENTINEL};
