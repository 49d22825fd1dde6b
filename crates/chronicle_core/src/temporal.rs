//! Temporal placement of a chronicle within world history.

use serde::{Deserialize, Serialize};

/// How much of history a chronicle spans.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TemporalScope {
    /// A single moment or scene
    Moment,
    /// A bounded episode inside one era
    #[default]
    Episode,
    /// Most of one era
    Era,
    /// Several eras
    Epoch,
}

/// Where a chronicle sits in time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemporalContext {
    /// Era the chronicle is centered on
    pub focal_era: String,
    /// Every era the chronicle touches, focal era included
    #[serde(default)]
    pub touched_eras: Vec<String>,
    /// First tick covered
    pub start_tick: i64,
    /// Last tick covered
    pub end_tick: i64,
    /// Scope classification
    #[serde(default)]
    pub scope: TemporalScope,
    /// Free-form description of the period
    #[serde(default)]
    pub description: String,
}

impl TemporalContext {
    /// Whether a tick falls inside the covered range.
    pub fn contains_tick(&self, tick: i64) -> bool {
        tick >= self.start_tick && tick <= self.end_tick
    }
}
