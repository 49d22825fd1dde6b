//! Test utilities for pipeline tests.
//!
//! This module provides a scripted text service and world fixtures.

#![allow(dead_code)]

pub mod mock_generator;

#[allow(unused_imports)]
pub use mock_generator::{MockGenerator, MockResponse};

use chronicle_core::{
    ChronicleContext, EntityRef, EventRef, NarrativeStyle, RelationshipRef, RoleAssignment,
    StyleFormat, WorldFact,
};
use chronicle_pipeline::{
    ChronicleDispatcher, InMemoryChronicleRepository, InMemoryCostSink, PipelineConfig,
};

/// Dispatcher wired to the mock and in-memory stores.
pub type TestDispatcher =
    ChronicleDispatcher<MockGenerator, InMemoryChronicleRepository, InMemoryCostSink>;

/// A perspective synthesis response.
pub const PERSPECTIVE: &str = r#"Here is the brief:
```json
{
  "brief": "A harbor reckoning told by the man who kept its books.",
  "suggested_motifs": ["salt", "ledger ink"],
  "narrative_voice": {"register": "plain", "distance": "close"},
  "entity_directives": [{"entity_id": "ent-aldric", "entity_name": "Aldric Venn", "directive": "Never forgives."}]
}
```"#;

/// A first draft.
pub const DRAFT: &str = "The tide came in grey. Aldric Venn counted the barrels twice \
at Greyharbor and found the same shortfall both times.";

/// A story-format world with two cast members.
pub fn harbor_context() -> ChronicleContext {
    ChronicleContext {
        style: NarrativeStyle {
            id: "style-ledger".into(),
            name: "Harbor Tale".into(),
            format: StyleFormat::Story,
            guidance: "Close third person, short sentences.".into(),
            document_type: None,
            visual_framing: Some("Muted oil painting".into()),
            target_words: Some(800),
        },
        role_assignments: vec![
            RoleAssignment {
                entity_id: "ent-aldric".into(),
                entity_name: "Aldric Venn".into(),
                entity_kind: "person".into(),
                role: "protagonist".into(),
                is_primary: true,
            },
            RoleAssignment {
                entity_id: "ent-harbor".into(),
                entity_name: "Greyharbor".into(),
                entity_kind: "place".into(),
                role: "setting".into(),
                is_primary: false,
            },
        ],
        entities: vec![
            EntityRef {
                id: "ent-aldric".into(),
                name: "Aldric Venn".into(),
                kind: "person".into(),
                culture: Some("Saltborn".into()),
                tags: vec!["merchant".into()],
                description: "A harbor clerk with a long memory.".into(),
                visual_description: Some("grey coat, ink-stained fingers".into()),
            },
            EntityRef {
                id: "ent-harbor".into(),
                name: "Greyharbor".into(),
                kind: "place".into(),
                culture: Some("Saltborn".into()),
                tags: vec!["port".into()],
                description: "A cold trading port.".into(),
                visual_description: None,
            },
            EntityRef {
                id: "ent-guild".into(),
                name: "Tidewright Guild".into(),
                kind: "faction".into(),
                culture: None,
                tags: vec!["merchant".into()],
                description: "Owns the quays.".into(),
                visual_description: None,
            },
        ],
        relationships: vec![RelationshipRef {
            source_id: "ent-aldric".into(),
            target_id: "ent-guild".into(),
            kind: "debtor".into(),
            strength: 0.8,
        }],
        events: vec![EventRef {
            id: "evt-flood".into(),
            headline: "The spring flood".into(),
            description: "Half the warehouses were lost.".into(),
            tick: 40,
            significance: 0.9,
            entity_ids: vec!["ent-harbor".into()],
        }],
        facts: vec![WorldFact {
            id: "fact-salt".into(),
            text: "Salt is the harbor's only export.".into(),
        }],
        tone_fragments: vec!["weary".into(), "precise".into()],
        ..Default::default()
    }
}

/// A dispatcher over the bundled configuration.
pub fn dispatcher(generator: MockGenerator) -> TestDispatcher {
    let config = PipelineConfig::bundled().expect("bundled config loads");
    ChronicleDispatcher::new(
        generator,
        InMemoryChronicleRepository::new(),
        InMemoryCostSink::new(),
        &config,
    )
    .expect("bundled config resolves")
}
