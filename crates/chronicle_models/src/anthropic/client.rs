use crate::{
    AnthropicMessage, AnthropicRequest, AnthropicResponse, CallLabels, FailureClass, LlmMetrics,
};
use chronicle_core::{GenerateRequest, GenerateResponse, ModelPricing, TokenUsage};
use chronicle_error::{
    BuilderError, ChronicleError, ChronicleResult, ConfigError, GenerationError,
    GenerationErrorKind, HttpError,
};
use chronicle_interface::TextGenerator;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
use tracing::{debug, error, instrument, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Backoff settings for transient API failures (429, 529, 5xx, transport errors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// First backoff delay in milliseconds
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay in seconds
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            max_delay_secs: 30,
        }
    }
}

/// Anthropic API client.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    retry: RetryPolicy,
    pricing: HashMap<String, ModelPricing>,
}

impl AnthropicClient {
    /// Creates a new Anthropic client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Anthropic API key
    /// * `model` - Default model, used when a request leaves its model empty
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        debug!("Creating new Anthropic client");
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
            retry: RetryPolicy::default(),
            pricing: HashMap::new(),
        }
    }

    /// Creates a client from the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env(model: impl Into<String>) -> ChronicleResult<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ConfigError::new("ANTHROPIC_API_KEY is not set"))?;
        Ok(Self::new(api_key, model))
    }

    /// Override the endpoint (for proxies and test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Price table used to compute the cost of each call, keyed by model.
    pub fn with_pricing(mut self, pricing: HashMap<String, ModelPricing>) -> Self {
        self.pricing = pricing;
        self
    }

    /// Converts a pipeline request to a Messages API request.
    fn convert_request(&self, request: &GenerateRequest) -> ChronicleResult<AnthropicRequest> {
        let model = if request.model().is_empty() {
            self.model.clone()
        } else {
            request.model().clone()
        };

        let message = AnthropicMessage::builder()
            .role("user")
            .content(request.user_prompt().clone())
            .build()
            .map_err(|e| BuilderError::new(e.to_string()))?;

        let system = Some(request.system_prompt().clone()).filter(|s| !s.is_empty());

        AnthropicRequest::builder()
            .model(model)
            .max_tokens(request.sampling().max_tokens)
            .system(system)
            .messages(vec![message])
            .temperature(request.sampling().temperature)
            .top_p(request.sampling().top_p)
            .build()
            .map_err(|e| BuilderError::new(e.to_string()).into())
    }

    /// Sends one request without retrying.
    async fn send_once(&self, request: &AnthropicRequest) -> Result<AnthropicResponse, HttpError> {
        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| HttpError::new(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Anthropic API returned error");
            return Err(HttpError::with_status(
                status.as_u16(),
                upstream_message(&body),
            ));
        }

        response
            .json::<AnthropicResponse>()
            .await
            .map_err(|e| HttpError::new(format!("Failed to decode response: {}", e)))
    }

    /// Sends a request, retrying transient failures with jittered exponential backoff.
    #[instrument(skip(self, request), fields(model = %request.model()))]
    pub async fn generate_anthropic(
        &self,
        request: &AnthropicRequest,
    ) -> Result<AnthropicResponse, HttpError> {
        debug!("Sending request to Anthropic API");

        let strategy = ExponentialBackoff::from_millis(self.retry.initial_backoff_ms)
            .factor(2)
            .max_delay(Duration::from_secs(self.retry.max_delay_secs))
            .map(jitter)
            .take(self.retry.max_retries);

        Retry::spawn(strategy, || async {
            match self.send_once(request).await {
                Ok(response) => Ok(response),
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "Anthropic request failed, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Permanent Anthropic error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await
    }

    fn price(&self, model: &str, input_tokens: u64, output_tokens: u64) -> Option<f64> {
        self.pricing
            .get(model)
            .map(|p| p.cost(input_tokens, output_tokens))
    }
}

/// Pull `error.message` out of an API error body, falling back to the raw body.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait::async_trait]
impl TextGenerator for AnthropicClient {
    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, request), fields(model = %request.model()))]
    async fn generate(&self, request: &GenerateRequest) -> ChronicleResult<GenerateResponse> {
        let anthropic_request = self.convert_request(request)?;
        let model = anthropic_request.model().clone();
        let labels = CallLabels {
            provider: self.provider_name(),
            model: &model,
            call_type: *request.call_type(),
        };
        let metrics = LlmMetrics::get();
        let started = Instant::now();

        let response = match self.generate_anthropic(&anthropic_request).await {
            Ok(response) => response,
            Err(e) => {
                metrics.record_failure(&labels, started.elapsed(), FailureClass::of(&e));
                return Err(ChronicleError::from(e));
            }
        };

        let input_tokens = *response.usage().input_tokens();
        let output_tokens = *response.usage().output_tokens();
        let usage = TokenUsage {
            input_tokens,
            output_tokens,
            actual_cost: self.price(response.model(), input_tokens, output_tokens),
        };
        metrics.record_success(&labels, started.elapsed(), &usage);

        if response.content().is_empty() {
            return Err(GenerationError::new(GenerationErrorKind::MalformedResponse(format!(
                "response {} carried no content blocks",
                response.id()
            )))
            .into());
        }

        debug!(
            response_id = %response.id(),
            input_tokens,
            output_tokens,
            "Received response from Anthropic"
        );

        Ok(GenerateResponse {
            text: response.text(),
            usage,
            model: response.model().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::SamplingParams;

    fn request(model: &str) -> GenerateRequest {
        GenerateRequest::builder()
            .model(model)
            .system_prompt("system")
            .user_prompt("user")
            .sampling(SamplingParams {
                temperature: None,
                top_p: Some(0.9),
                max_tokens: 256,
            })
            .build()
            .unwrap()
    }

    #[test]
    fn empty_model_falls_back_to_client_default() {
        let client = AnthropicClient::new("key", "default-model");
        let converted = client.convert_request(&request("")).unwrap();
        assert_eq!(converted.model(), "default-model");
        assert_eq!(*converted.top_p(), Some(0.9));
        assert_eq!(*converted.temperature(), None);
        assert_eq!(converted.system().as_deref(), Some("system"));
    }

    #[test]
    fn request_body_omits_unset_sampling() {
        let client = AnthropicClient::new("key", "m");
        let converted = client.convert_request(&request("m")).unwrap();
        let json = serde_json::to_value(&converted).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_tokens"], 256);
    }

    #[test]
    fn upstream_message_prefers_error_message() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert_eq!(upstream_message(body), "Overloaded");
        assert_eq!(upstream_message("bad gateway\n"), "bad gateway");
    }

    #[test]
    fn response_text_skips_non_text_blocks() {
        let json = r#"{
            "id": "msg_1",
            "model": "m",
            "content": [{"type": "text", "text": "Hello"}, {"type": "thinking"}, {"type": "text", "text": " there"}],
            "usage": {"input_tokens": 3, "output_tokens": 2}
        }"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), "Hello there");
    }

    #[test]
    fn pricing_produces_actual_cost() {
        let mut pricing = HashMap::new();
        pricing.insert(
            "m".to_string(),
            ModelPricing {
                input_per_million: 3.0,
                output_per_million: 15.0,
            },
        );
        let client = AnthropicClient::new("key", "m").with_pricing(pricing);
        let cost = client.price("m", 1_000_000, 1_000_000).unwrap();
        assert!((cost - 18.0).abs() < 1e-9);
        assert!(client.price("other", 1, 1).is_none());
    }
}
