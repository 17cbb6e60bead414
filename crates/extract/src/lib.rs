pub mod client;
pub mod error;
pub mod prompt;
pub mod schema;

pub use client::DeepSeekClient;
pub use error::ExtractError;
pub use schema::{GraphFragment, RawGraph};

use async_trait::async_trait;

/// Seam between the dispatcher and the actual model call, so the
/// concurrency machinery can be exercised without a network.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn extract(&self, text: &str) -> Result<RawGraph, ExtractError>;
}

#[async_trait]
impl ExtractionService for DeepSeekClient {
    async fn extract(&self, text: &str) -> Result<RawGraph, ExtractError> {
        DeepSeekClient::extract(self, text).await
    }
}
