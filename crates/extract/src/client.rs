use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::prompt;
use crate::schema::RawGraph;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const API_KEY_VAR: &str = "DS_API";

const MAX_ATTEMPTS: usize = 3;
const BACKOFF: Duration = Duration::from_secs(3);

/// Client for a DeepSeek-compatible chat-completions endpoint.
///
/// Stateless and reentrant: one instance is shared by every worker.
#[derive(Clone)]
pub struct DeepSeekClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl DeepSeekClient {
    pub fn new(base_url: String, model: String, api_key: String) -> Self {
        Self {
            base_url,
            model,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Build a client from the `DS_API` environment variable.
    ///
    /// A missing key is fatal: the pipeline refuses to start rather than
    /// run a batch of calls that can only fail.
    pub fn from_env() -> Result<Self, ExtractError> {
        let api_key = std::env::var(API_KEY_VAR).map_err(|_| ExtractError::MissingApiKey)?;
        Ok(Self::new(
            DEFAULT_BASE_URL.to_string(),
            DEFAULT_MODEL.to_string(),
            api_key,
        ))
    }

    /// One request/response round trip, no retry.
    async fn generate(&self, text: &str) -> Result<RawGraph, ExtractError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt::SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt::build_user_prompt(text),
                },
            ],
            // Deterministic output
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api { status, body });
        }

        let envelope: ChatResponse = response.json().await?;
        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ExtractError::MissingContent)?;

        // The response must be exactly one JSON object, no prose around it.
        let graph: RawGraph = serde_json::from_str(&content)?;
        Ok(graph)
    }

    /// Extract a graph fragment, retrying transient failures.
    ///
    /// Up to `MAX_ATTEMPTS` attempts with a fixed `BACKOFF` wait between
    /// them. The final error is returned to the caller, which records the
    /// record as pending rather than crashing the batch.
    pub async fn extract(&self, text: &str) -> Result<RawGraph, ExtractError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.generate(text).await {
                Ok(graph) => {
                    debug!(attempt, "extraction succeeded");
                    return Ok(graph);
                }
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    warn!(
                        attempt,
                        max_attempts = MAX_ATTEMPTS,
                        backoff_secs = BACKOFF.as_secs(),
                        error = %e,
                        "extraction attempt failed, retrying"
                    );
                    sleep(BACKOFF).await;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "extraction failed, giving up");
                    return Err(e);
                }
            }
        }
    }
}
