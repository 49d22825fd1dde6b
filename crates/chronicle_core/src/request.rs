//! Request and response types exchanged with a text service.

use crate::CallType;
use serde::{Deserialize, Serialize};

/// Sampling parameters for one call.
///
/// Regeneration varies only `top_p`; temperature is fixed per call type.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus-sampling cutoff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Maximum completion tokens
    pub max_tokens: u32,
}

/// Single-turn generation request.
///
/// # Examples
///
/// ```
/// use chronicle_core::{GenerateRequest, SamplingParams};
///
/// let request = GenerateRequest::builder()
///     .model("claude-sonnet-4-5")
///     .system_prompt("You are a chronicler.")
///     .user_prompt("Write a ledger entry.")
///     .sampling(SamplingParams { temperature: Some(0.8), top_p: None, max_tokens: 2048 })
///     .build()
///     .unwrap();
///
/// assert_eq!(request.model(), "claude-sonnet-4-5");
/// assert_eq!(request.sampling().max_tokens, 2048);
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct GenerateRequest {
    /// Model identifier
    model: String,
    /// System prompt
    system_prompt: String,
    /// User prompt
    user_prompt: String,
    /// Sampling parameters
    sampling: SamplingParams,
    /// Pipeline call that issued the request, for metrics labelling
    #[builder(default, setter(into, strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    call_type: Option<CallType>,
}

impl GenerateRequest {
    /// Create a builder.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }
}

/// Token usage reported for a call.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input_tokens: u64,
    /// Completion tokens
    pub output_tokens: u64,
    /// Dollar cost reported by the service, if it reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<f64>,
}

/// Text plus usage returned by a text service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Generated text
    pub text: String,
    /// Usage
    pub usage: TokenUsage,
    /// Model that actually served the call
    pub model: String,
}
