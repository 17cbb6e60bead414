use thiserror::Error;

/// Failure modes of one extraction call.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error: status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response envelope carried no message content.
    #[error("API response contained no message content")]
    MissingContent,

    /// The model output was not a single valid JSON object.
    #[error("Model output is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The `DS_API` credential is absent from the environment.
    #[error("DS_API is not set; put the extraction API key in the environment or a .env file")]
    MissingApiKey,
}

impl ExtractError {
    /// Whether a retry can reasonably change the outcome.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ExtractError::MissingApiKey)
    }
}
