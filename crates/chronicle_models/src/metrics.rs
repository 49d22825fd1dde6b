//! Per-call metrics for the text service.
//!
//! Every measurement carries the provider, the model and the pipeline call
//! type that issued the request, so spend and latency can be broken down by
//! stage (perspective, generation, compare, ...).

use chronicle_core::{CallType, TokenUsage};
use chronicle_error::HttpError;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::OnceLock;
use std::time::Duration;

static METRICS: OnceLock<LlmMetrics> = OnceLock::new();

/// Why a call failed, as a low-cardinality label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FailureClass {
    /// 429
    RateLimited,
    /// 529
    Overloaded,
    /// 401 or 403
    Unauthorized,
    /// Other 5xx
    Server,
    /// Other 4xx
    InvalidRequest,
    /// No response arrived
    Transport,
}

impl FailureClass {
    /// Classify a transport error by its status code.
    pub fn of(error: &HttpError) -> Self {
        match error.status {
            None => Self::Transport,
            Some(429) => Self::RateLimited,
            Some(529) => Self::Overloaded,
            Some(401 | 403) => Self::Unauthorized,
            Some(status) if status >= 500 => Self::Server,
            Some(_) => Self::InvalidRequest,
        }
    }
}

/// Labels shared by every measurement of one call.
#[derive(Debug, Clone, Copy)]
pub struct CallLabels<'a> {
    /// Provider name
    pub provider: &'a str,
    /// Model identifier
    pub model: &'a str,
    /// Issuing pipeline call, when known
    pub call_type: Option<CallType>,
}

impl CallLabels<'_> {
    fn key_values(&self) -> Vec<KeyValue> {
        let call_type = self
            .call_type
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unlabelled".to_string());
        vec![
            KeyValue::new("provider", self.provider.to_string()),
            KeyValue::new("model", self.model.to_string()),
            KeyValue::new("call_type", call_type),
        ]
    }
}

/// Text service instruments.
pub struct LlmMetrics {
    calls: Counter<u64>,
    failures: Counter<u64>,
    latency: Histogram<f64>,
    input_tokens: Counter<u64>,
    output_tokens: Counter<u64>,
    cost: Counter<f64>,
}

impl LlmMetrics {
    fn init() -> Self {
        let meter = global::meter("chronicle.calls");
        Self {
            calls: meter
                .u64_counter("chronicle.calls.completed")
                .with_description("Text service calls that returned a response")
                .build(),
            failures: meter
                .u64_counter("chronicle.calls.failed")
                .with_description("Text service calls that failed after retries")
                .build(),
            latency: meter
                .f64_histogram("chronicle.calls.latency")
                .with_unit("s")
                .with_description("Wall time per call, retries included")
                .build(),
            input_tokens: meter
                .u64_counter("chronicle.tokens.input")
                .with_description("Prompt tokens billed")
                .build(),
            output_tokens: meter
                .u64_counter("chronicle.tokens.output")
                .with_description("Completion tokens billed")
                .build(),
            cost: meter
                .f64_counter("chronicle.cost")
                .with_unit("USD")
                .with_description("Priced cost of completed calls")
                .build(),
        }
    }

    /// The process-wide instruments.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a call that returned a response.
    pub fn record_success(&self, labels: &CallLabels<'_>, elapsed: Duration, usage: &TokenUsage) {
        let attributes = labels.key_values();
        self.calls.add(1, &attributes);
        self.latency.record(elapsed.as_secs_f64(), &attributes);
        self.input_tokens.add(usage.input_tokens, &attributes);
        self.output_tokens.add(usage.output_tokens, &attributes);
        if let Some(cost) = usage.actual_cost {
            self.cost.add(cost, &attributes);
        }
    }

    /// Record a call that failed.
    pub fn record_failure(&self, labels: &CallLabels<'_>, elapsed: Duration, class: FailureClass) {
        let mut attributes = labels.key_values();
        self.latency.record(elapsed.as_secs_f64(), &attributes);
        attributes.push(KeyValue::new("failure", class.as_ref().to_string()));
        self.failures.add(1, &attributes);
    }
}
