//! Token and dollar accounting for external calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kind of external call, used for configuration and accounting.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallType {
    /// Perspective synthesis
    Perspective,
    /// Primary generation
    Generation,
    /// Full, creative, or sampling-only regeneration
    Regeneration,
    /// Version comparison
    Compare,
    /// Version merge
    Combine,
    /// Copy-edit polish
    CopyEdit,
    /// Temporal alignment check
    TemporalCheck,
    /// Unanchored reference check
    QuickCheck,
    /// Summary
    Summary,
    /// Title fragment extraction
    TitleFragments,
    /// Title candidate shaping
    TitleCandidates,
    /// Image placement planning
    ImageRefs,
    /// Cover scene or scene description writing
    SceneDescription,
}

/// Dollar price of a model per million tokens.
///
/// # Examples
///
/// ```
/// use chronicle_core::ModelPricing;
///
/// let pricing = ModelPricing { input_per_million: 3.0, output_per_million: 15.0 };
/// assert!((pricing.cost(1_000_000, 0) - 3.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per million prompt tokens
    pub input_per_million: f64,
    /// Price per million completion tokens
    pub output_per_million: f64,
}

impl ModelPricing {
    /// Dollar cost of a call with the given token counts.
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        (input_tokens as f64 * self.input_per_million
            + output_tokens as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

/// One successful external call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRecord {
    /// Record id
    pub id: String,
    /// Chronicle the call was made for
    pub chronicle_id: String,
    /// Call type
    pub call_type: CallType,
    /// Model used
    pub model: String,
    /// Pre-call estimate in dollars
    pub estimated_cost: f64,
    /// Actual cost in dollars
    pub actual_cost: f64,
    /// Prompt tokens
    pub input_tokens: u64,
    /// Completion tokens
    pub output_tokens: u64,
    /// When the call completed
    pub created_at: DateTime<Utc>,
}

/// Running totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTotals {
    /// Sum of estimates
    pub estimated_cost: f64,
    /// Sum of actual costs
    pub actual_cost: f64,
    /// Sum of prompt tokens
    pub input_tokens: u64,
    /// Sum of completion tokens
    pub output_tokens: u64,
    /// Number of calls
    pub calls: u64,
}

impl CostTotals {
    /// Fold one record into the totals.
    pub fn add(&mut self, record: &CostRecord) {
        self.estimated_cost += record.estimated_cost;
        self.actual_cost += record.actual_cost;
        self.input_tokens += record.input_tokens;
        self.output_tokens += record.output_tokens;
        self.calls += 1;
    }
}

/// Totals overall and per call type.
///
/// # Examples
///
/// ```
/// use chronicle_core::{CallType, CostAccumulator, CostRecord};
///
/// let record = CostRecord {
///     id: "c1".into(),
///     chronicle_id: "chr".into(),
///     call_type: CallType::Summary,
///     model: "m".into(),
///     estimated_cost: 0.01,
///     actual_cost: 0.02,
///     input_tokens: 100,
///     output_tokens: 50,
///     created_at: chrono::Utc::now(),
/// };
/// let mut acc = CostAccumulator::default();
/// acc.add(&record);
/// assert_eq!(acc.totals.calls, 1);
/// assert_eq!(acc.by_call_type[&CallType::Summary].input_tokens, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostAccumulator {
    /// Overall totals
    pub totals: CostTotals,
    /// Totals per call type
    pub by_call_type: BTreeMap<CallType, CostTotals>,
}

impl CostAccumulator {
    /// Fold one record into overall and per-type totals.
    pub fn add(&mut self, record: &CostRecord) {
        self.totals.add(record);
        self.by_call_type
            .entry(record.call_type)
            .or_default()
            .add(record);
    }
}
