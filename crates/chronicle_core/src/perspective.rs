//! Perspective synthesis: the interpretive brief that conditions all prose.

use crate::{CulturalIdentity, EntityRef, WorldFact};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Derived summary of the entities, relationships and events selected for a chronicle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Constellation {
    /// Most common culture among the cast, ties broken alphabetically
    pub dominant_culture: Option<String>,
    /// Entity count per kind
    pub kind_mix: BTreeMap<String, usize>,
    /// Most frequent tags, most frequent first
    pub prominent_tags: Vec<String>,
    /// Relationship count per kind
    pub relationship_mix: BTreeMap<String, usize>,
    /// Number of entities considered
    pub entity_count: usize,
    /// Number of relationships considered
    pub relationship_count: usize,
    /// Number of events considered
    pub event_count: usize,
}

/// A world fact rewritten with chronicle-specific framing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetedFact {
    /// Source fact id
    pub fact_id: String,
    /// Interpretation for this chronicle
    pub interpretation: String,
}

/// How the text should treat one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDirective {
    /// Entity id
    pub entity_id: String,
    /// Entity name
    #[serde(default)]
    pub entity_name: String,
    /// Directive text
    pub directive: String,
}

/// Structured output of a perspective synthesis call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveSynthesis {
    /// Narrative brief
    pub brief: String,
    /// Faceted fact interpretations
    pub faceted_facts: Vec<FacetedFact>,
    /// Suggested motifs
    pub suggested_motifs: Vec<String>,
    /// Narrative voice, keyed by dimension (register, distance, ...)
    pub narrative_voice: BTreeMap<String, String>,
    /// Per-entity directives
    pub entity_directives: Vec<EntityDirective>,
    /// How the period should be conveyed, when a temporal context was supplied
    pub temporal_narrative: Option<String>,
}

/// Snapshot of every input the synthesis call saw.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveInput {
    /// Constellation summary
    pub constellation: Constellation,
    /// World facts
    pub facts: Vec<WorldFact>,
    /// Tone fragments
    pub tone_fragments: Vec<String>,
    /// Cultural identities
    pub cultural_identities: Vec<CulturalIdentity>,
    /// Entity subset
    pub entities: Vec<EntityRef>,
}

/// The latest perspective synthesis for a chronicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveRecord {
    /// When the synthesis ran
    pub generated_at: DateTime<Utc>,
    /// Model that produced it
    pub model: String,
    /// Input snapshot
    pub input: PerspectiveInput,
    /// Structured output
    pub output: PerspectiveSynthesis,
}
