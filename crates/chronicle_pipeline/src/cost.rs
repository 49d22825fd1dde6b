//! Cost and token accounting around every external call.

use crate::{AbortSignal, ResolvedCall};
use chrono::Utc;
use chronicle_core::{
    CostRecord, CostTotals, GenerateRequest, GenerateResponse, ModelPricing, SamplingParams,
};
use chronicle_error::{
    BuilderError, ChronicleResult, GenerationError, GenerationErrorKind, StepError, StepErrorKind,
};
use chronicle_interface::{CostSink, TextGenerator};
use std::collections::HashMap;
use tracing::{debug, error, info, instrument, warn};

/// Rough token estimate: four characters per token.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(4)
}

/// Wraps the text service for one step run.
///
/// Every call that returns is priced and appended to the cost sink. Calls
/// that returned non-blank text are also kept in the step's ledger, which
/// feeds the chronicle's running totals. The abort signal is checked after
/// every call returns; the cost of that call is recorded first.
pub struct CostRecorder<'a, G, C> {
    generator: &'a G,
    sink: &'a C,
    pricing: &'a HashMap<String, ModelPricing>,
    abort: &'a AbortSignal,
    chronicle_id: String,
    step: String,
    records: Vec<CostRecord>,
}

impl<'a, G, C> CostRecorder<'a, G, C>
where
    G: TextGenerator,
    C: CostSink,
{
    /// Create a recorder for one step run.
    pub fn new(
        generator: &'a G,
        sink: &'a C,
        pricing: &'a HashMap<String, ModelPricing>,
        abort: &'a AbortSignal,
        chronicle_id: impl Into<String>,
        step: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            sink,
            pricing,
            abort,
            chronicle_id: chronicle_id.into(),
            step: step.into(),
            records: Vec::new(),
        }
    }

    /// Call the text service with the configured sampling for `call`.
    pub async fn call(
        &mut self,
        call: &ResolvedCall,
        system_prompt: &str,
        user_prompt: &str,
    ) -> ChronicleResult<GenerateResponse> {
        self.call_with(call, system_prompt, user_prompt, call.sampling())
            .await
    }

    /// Call the text service with explicit sampling parameters.
    #[instrument(
        skip(self, call, system_prompt, user_prompt, sampling),
        fields(chronicle_id = %self.chronicle_id, step = %self.step, call_type = %call.call_type())
    )]
    pub async fn call_with(
        &mut self,
        call: &ResolvedCall,
        system_prompt: &str,
        user_prompt: &str,
        sampling: SamplingParams,
    ) -> ChronicleResult<GenerateResponse> {
        let pricing = self.pricing.get(call.model()).copied();
        let estimated_input = estimate_tokens(system_prompt) + estimate_tokens(user_prompt);
        let estimated_cost = pricing
            .map(|p| p.cost(estimated_input, u64::from(sampling.max_tokens)))
            .unwrap_or(0.0);
        debug!(estimated_input, estimated_cost, "Calling text service");

        let request = GenerateRequest::builder()
            .model(call.model().clone())
            .system_prompt(system_prompt)
            .user_prompt(user_prompt)
            .sampling(sampling)
            .call_type(*call.call_type())
            .build()
            .map_err(|e| BuilderError::new(e.to_string()))?;

        let response = self.generator.generate(&request).await.map_err(|e| {
            error!(error = %e, "Text service call failed");
            GenerationError::new(GenerationErrorKind::Upstream(e.user_message()))
        })?;

        let usage = response.usage;
        let actual_cost = usage
            .actual_cost
            .or_else(|| pricing.map(|p| p.cost(usage.input_tokens, usage.output_tokens)))
            .unwrap_or(0.0);
        let record = CostRecord {
            id: uuid::Uuid::new_v4().to_string(),
            chronicle_id: self.chronicle_id.clone(),
            call_type: *call.call_type(),
            model: response.model.clone(),
            estimated_cost,
            actual_cost,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            created_at: Utc::now(),
        };
        if let Err(e) = self.sink.save(&record).await {
            error!(error = %e, cost_id = %record.id, "Failed to append cost record");
        }
        info!(
            input_tokens = record.input_tokens,
            output_tokens = record.output_tokens,
            actual_cost = record.actual_cost,
            "Text service call recorded"
        );
        if response.text.trim().is_empty() {
            warn!(cost_id = %record.id, "Text service returned a blank response");
        } else {
            self.records.push(record);
        }

        if self.abort.is_aborted() {
            info!("Abort requested, stopping before persistence");
            return Err(StepError::new(StepErrorKind::Aborted {
                step: self.step.clone(),
                debug: Some(response.text),
            })
            .into());
        }

        Ok(response)
    }

    /// Cost records of the calls made so far that returned usable text.
    pub fn records(&self) -> &[CostRecord] {
        &self.records
    }

    /// Totals over the calls made so far.
    pub fn totals(&self) -> CostTotals {
        let mut totals = CostTotals::default();
        for record in &self.records {
            totals.add(record);
        }
        totals
    }

    /// Model of the most recent call.
    pub fn last_model(&self) -> Option<&str> {
        self.records.last().map(|r| r.model.as_str())
    }

    /// Chronicle the recorder is accounting for.
    pub fn chronicle_id(&self) -> &str {
        &self.chronicle_id
    }
}
