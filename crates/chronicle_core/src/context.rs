//! Caller-supplied generation context: style, cast, and world data.

use serde::{Deserialize, Serialize};

/// Whether a style produces prose narrative or an in-world document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StyleFormat {
    /// Narrative prose
    #[default]
    Story,
    /// In-universe document (letter, ledger, decree, ...)
    Document,
}

/// Narrative style selected for a chronicle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NarrativeStyle {
    /// Style identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Story or document
    #[serde(default)]
    pub format: StyleFormat,
    /// Prose or document guidance injected into prompts
    #[serde(default)]
    pub guidance: String,
    /// Document type for document formats (e.g. "merchant's ledger")
    #[serde(default)]
    pub document_type: Option<String>,
    /// Visual framing used for image prompts
    #[serde(default)]
    pub visual_framing: Option<String>,
    /// Target length in words
    #[serde(default)]
    pub target_words: Option<usize>,
}

impl NarrativeStyle {
    /// Whether this style produces an in-world document.
    pub fn is_document(&self) -> bool {
        self.format == StyleFormat::Document
    }
}

/// A member of the chronicle's cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Entity id
    pub entity_id: String,
    /// Entity display name
    pub entity_name: String,
    /// Entity kind (person, faction, place, ...)
    pub entity_kind: String,
    /// Narrative role (protagonist, witness, ...)
    pub role: String,
    /// Whether this is a primary cast member
    #[serde(default)]
    pub is_primary: bool,
}

/// A world entity available to the generator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityRef {
    /// Entity id
    pub id: String,
    /// Display name
    pub name: String,
    /// Entity kind
    pub kind: String,
    /// Culture the entity belongs to
    #[serde(default)]
    pub culture: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Visual descriptor used for image prompts
    #[serde(default)]
    pub visual_description: Option<String>,
}

/// A directed relationship between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipRef {
    /// Source entity id
    pub source_id: String,
    /// Target entity id
    pub target_id: String,
    /// Relationship kind (ally, rival, ...)
    pub kind: String,
    /// Strength in `0.0..=1.0`
    #[serde(default)]
    pub strength: f64,
}

impl RelationshipRef {
    /// Whether the relationship touches the entity.
    pub fn involves(&self, entity_id: &str) -> bool {
        self.source_id == entity_id || self.target_id == entity_id
    }

    /// The other endpoint, if the relationship touches the entity.
    pub fn other(&self, entity_id: &str) -> Option<&str> {
        if self.source_id == entity_id {
            Some(&self.target_id)
        } else if self.target_id == entity_id {
            Some(&self.source_id)
        } else {
            None
        }
    }
}

/// A historical event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventRef {
    /// Event id
    pub id: String,
    /// One-line headline
    pub headline: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Tick the event happened at
    pub tick: i64,
    /// Significance in `0.0..=1.0`
    #[serde(default)]
    pub significance: f64,
    /// Entities involved
    #[serde(default)]
    pub entity_ids: Vec<String>,
}

/// A canonical world fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldFact {
    /// Fact id
    pub id: String,
    /// Fact text
    pub text: String,
}

/// Identity traits of a culture present in the cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CulturalIdentity {
    /// Culture name
    pub culture: String,
    /// Identity traits, values, customs
    #[serde(default)]
    pub traits: Vec<String>,
}

/// An alternate name an entity may appear under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAlias {
    /// Entity id
    pub entity_id: String,
    /// Alias text
    pub alias: String,
}

/// A named era.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraRef {
    /// Era id
    pub id: String,
    /// Display name
    pub name: String,
    /// First tick of the era
    pub start_tick: i64,
    /// Last tick of the era, open-ended when absent
    #[serde(default)]
    pub end_tick: Option<i64>,
}

/// Everything a primary generation needs, snapshotted onto the record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChronicleContext {
    /// Narrative style
    pub style: NarrativeStyle,
    /// Ordered cast
    pub role_assignments: Vec<RoleAssignment>,
    /// World entities available for neighborhood selection
    pub entities: Vec<EntityRef>,
    /// Relationships among entities
    pub relationships: Vec<RelationshipRef>,
    /// Historical events
    pub events: Vec<EventRef>,
    /// Canonical world facts
    pub facts: Vec<WorldFact>,
    /// Raw tone fragments
    pub tone_fragments: Vec<String>,
    /// Cultural identities present in the cast
    pub cultural_identities: Vec<CulturalIdentity>,
    /// Optional author direction
    pub narrative_direction: Option<String>,
    /// Known eras
    pub eras: Vec<EraRef>,
    /// Names the world generator may still hand out
    pub name_bank: Vec<String>,
    /// Entity aliases
    pub aliases: Vec<EntityAlias>,
    /// Minor names allowed to appear without being in the cast
    pub tertiary_cast: Vec<String>,
}

impl ChronicleContext {
    /// Look up an entity by id.
    pub fn entity(&self, id: &str) -> Option<&EntityRef> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Entities referenced by the cast, in cast order.
    pub fn cast_entities(&self) -> Vec<&EntityRef> {
        self.role_assignments
            .iter()
            .filter_map(|role| self.entity(&role.entity_id))
            .collect()
    }

    /// Every name that may legitimately appear in the content.
    pub fn known_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .role_assignments
            .iter()
            .map(|r| r.entity_name.clone())
            .collect();
        names.extend(self.entities.iter().map(|e| e.name.clone()));
        names.extend(self.aliases.iter().map(|a| a.alias.clone()));
        names.extend(self.name_bank.iter().cloned());
        names.extend(self.tertiary_cast.iter().cloned());
        names
    }
}
