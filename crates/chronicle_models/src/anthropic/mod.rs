//! Anthropic Messages API provider.

mod client;
mod dto;

pub use client::{AnthropicClient, RetryPolicy};
pub use dto::{
    AnthropicContentBlock, AnthropicMessage, AnthropicMessageBuilder, AnthropicRequest,
    AnthropicRequestBuilder, AnthropicResponse, AnthropicUsage,
};
