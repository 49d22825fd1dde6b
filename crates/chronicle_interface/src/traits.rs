//! Text service trait.

use async_trait::async_trait;
use chronicle_core::{GenerateRequest, GenerateResponse};
use chronicle_error::ChronicleResult;

/// A generative text service.
///
/// One call maps a system prompt, a user prompt and sampling parameters to
/// text plus token usage.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a single-turn request.
    async fn generate(&self, req: &GenerateRequest) -> ChronicleResult<GenerateResponse>;

    /// Provider name (e.g., "anthropic").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier.
    fn model_name(&self) -> &str;
}
