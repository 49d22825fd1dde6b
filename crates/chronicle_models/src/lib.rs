//! Text service integrations for the chronicle generation pipeline.
//!
//! Provides [`AnthropicClient`], a [`chronicle_interface::TextGenerator`]
//! over the Anthropic Messages API, plus OpenTelemetry metrics shared by all
//! providers.
//!
//! ```no_run
//! use chronicle_core::{GenerateRequest, SamplingParams};
//! use chronicle_interface::TextGenerator;
//! use chronicle_models::AnthropicClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AnthropicClient::from_env("claude-sonnet-4-5")?;
//! let request = GenerateRequest::builder()
//!     .model("claude-sonnet-4-5")
//!     .system_prompt("You are a chronicler.")
//!     .user_prompt("Describe the harbor at dawn.")
//!     .sampling(SamplingParams { temperature: Some(0.9), top_p: None, max_tokens: 512 })
//!     .build()?;
//! let response = client.generate(&request).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod anthropic;
mod metrics;

pub use anthropic::{
    AnthropicClient, AnthropicContentBlock, AnthropicMessage, AnthropicMessageBuilder,
    AnthropicRequest, AnthropicRequestBuilder, AnthropicResponse, AnthropicUsage, RetryPolicy,
};
pub use metrics::{CallLabels, FailureClass, LlmMetrics};
