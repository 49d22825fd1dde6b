//! Scripted text service for pipeline tests.

use async_trait::async_trait;
use chronicle_core::{GenerateRequest, GenerateResponse, TokenUsage};
use chronicle_error::{ChronicleResult, HttpError};
use chronicle_interface::TextGenerator;
use chronicle_pipeline::AbortSignal;
use std::sync::Mutex;

/// A single scripted response (success or error).
#[derive(Debug, Clone)]
pub enum MockResponse {
    Success(String),
    Error(String),
}

/// Text service that replays a script and records every request.
///
/// Responses echo the requested model so configured pricing applies.
pub struct MockGenerator {
    script: Mutex<Vec<MockResponse>>,
    requests: Mutex<Vec<GenerateRequest>>,
    abort_on_call: Mutex<Option<(usize, AbortSignal)>>,
}

impl MockGenerator {
    /// Create a mock that replays the responses in order.
    pub fn new_sequence(responses: Vec<MockResponse>) -> Self {
        Self {
            script: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            abort_on_call: Mutex::new(None),
        }
    }

    /// Create a mock whose every call succeeds with the given texts, in order.
    pub fn new_texts(texts: &[&str]) -> Self {
        Self::new_sequence(
            texts
                .iter()
                .map(|t| MockResponse::Success(t.to_string()))
                .collect(),
        )
    }

    /// Queue more responses after the current script.
    pub fn push(&self, response: MockResponse) {
        self.script.lock().unwrap().push(response);
    }

    /// Queue more successful texts.
    pub fn push_texts(&self, texts: &[&str]) {
        for text in texts {
            self.push(MockResponse::Success(text.to_string()));
        }
    }

    /// Trip the signal while serving the n-th call from now (1-based).
    pub fn abort_during_call(&self, n: usize, signal: AbortSignal) {
        let served = self.call_count();
        *self.abort_on_call.lock().unwrap() = Some((served + n, signal));
    }

    /// Number of calls served so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received, oldest first.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request.
    #[allow(dead_code)]
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, req: &GenerateRequest) -> ChronicleResult<GenerateResponse> {
        let count = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(req.clone());
            requests.len()
        };

        if let Some((n, signal)) = self.abort_on_call.lock().unwrap().as_ref()
            && *n == count
        {
            signal.abort();
        }

        let next = {
            let mut script = self.script.lock().unwrap();
            if script.is_empty() {
                None
            } else {
                Some(script.remove(0))
            }
        };

        match next {
            Some(MockResponse::Success(text)) => Ok(GenerateResponse {
                text,
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 50,
                    actual_cost: None,
                },
                model: req.model().clone(),
            }),
            Some(MockResponse::Error(message)) => Err(HttpError::with_status(529, message).into()),
            None => Err(HttpError::new(format!(
                "Mock script exhausted (call {})",
                count
            ))
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
