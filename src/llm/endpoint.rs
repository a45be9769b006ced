//! Language-model endpoint
//!
//! The Dispatcher talks to the model through the `LlmEndpoint` capability. The default
//! implementation targets an OpenAI-compatible `/chat/completions` API.

use crate::config::LlmConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Failures of a single completion call
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Sends one chunk of page text to the model with one credential
#[async_trait]
pub trait LlmEndpoint: Send + Sync {
    async fn complete(&self, chunk: &str, api_key: &str) -> Result<String, LlmError>;
}

/// Builds the extraction prompt around a chunk of page text
pub fn build_prompt(chunk: &str) -> String {
    format!(
        "Extract and present the press release, news, newsPage, press media, reports related content as follows:
1. Provide the official reports, press release, newsPage, newsroom, news, press, press room, news feed, breaking news, newsletter, publication or similar content text exactly as it appears.
2. List all links to separate reports, press releases, newsPage, newsroom, news, press, press room, news feed, breaking news, newsletters, or content.
3. If only titles are available, present them in a comma-separated list.
4. Include the content that is part of the official newsPage, reports, press release, newsroom, news, press, press room, news feed, breaking news, newsletter, or content.
5. Omit any text that is not part of the press release itself, such as:
- Introductory or concluding remarks
- Explanatory notes
- Commentary
- Disclaimers (unless they are part of the official content)
6. If the content contains non-English text, extract and present it in its original language without translation.
7. Preserve the original formatting, including headers, subheaders, and bullet points.
8. Do not add any additional text, headers, or explanations of your own.
9. Start directly with the press release content without any introductory text.
10. If no press release content is found, respond with \"{sentinel}\".
11. Do not include any introductory phrases.

Content to analyze:
{chunk}",
        sentinel = crate::llm::NO_CONTENT_SENTINEL,
        chunk = chunk,
    )
}

/// OpenAI-compatible chat-completions client
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(config: &LlmConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &LlmConfig) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl LlmEndpoint for ChatCompletionsClient {
    async fn complete(&self, chunk: &str, api_key: &str) -> Result<String, LlmError> {
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| LlmError::Transport("API key is not a valid header value".to_string()))?;

        let prompt = build_prompt(chunk);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited(text));
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("no choices in response".to_string()))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
