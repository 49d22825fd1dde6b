//! Live Anthropic API tests. Run with `--features api` and `ANTHROPIC_API_KEY` set.

use chronicle_core::{GenerateRequest, SamplingParams};
use chronicle_interface::TextGenerator;
use chronicle_models::AnthropicClient;

const MODEL: &str = "claude-3-5-haiku-latest";

fn request(prompt: &str, sampling: SamplingParams) -> anyhow::Result<GenerateRequest> {
    Ok(GenerateRequest::builder()
        .model(MODEL)
        .system_prompt("Answer tersely.")
        .user_prompt(prompt)
        .sampling(sampling)
        .build()?)
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_anthropic_simple_generation() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let client = AnthropicClient::from_env(MODEL)?;

    let response = client
        .generate(&request(
            "Say 'test' and nothing else.",
            SamplingParams {
                temperature: Some(0.0),
                top_p: None,
                max_tokens: 16,
            },
        )?)
        .await?;

    assert!(!response.text.is_empty());
    assert!(response.usage.input_tokens > 0);
    Ok(())
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_anthropic_with_top_p() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let client = AnthropicClient::from_env(MODEL)?;

    let response = client
        .generate(&request(
            "Count to 3.",
            SamplingParams {
                temperature: None,
                top_p: Some(0.9),
                max_tokens: 32,
            },
        )?)
        .await?;

    assert!(response.usage.output_tokens > 0);
    Ok(())
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_anthropic_rejects_bad_key() -> anyhow::Result<()> {
    let client = AnthropicClient::new("not-a-key", MODEL);

    let result = client
        .generate(&request(
            "Hello",
            SamplingParams {
                temperature: None,
                top_p: None,
                max_tokens: 8,
            },
        )?)
        .await;

    let err = result.expect_err("invalid key must fail");
    assert!(!err.user_message().is_empty());
    Ok(())
}
