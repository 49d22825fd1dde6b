//! Prompt sections shared by several stages.

use crate::Neighborhood;
use chronicle_core::{ChronicleContext, NarrativeStyle, PerspectiveSynthesis, TemporalContext};
use std::fmt::Write;

/// Role framing for prose-producing calls.
pub(crate) fn author_system_prompt(style: &NarrativeStyle) -> String {
    let mut prompt = if style.is_document() {
        let document = style.document_type.as_deref().unwrap_or("historical document");
        format!(
            "You write in-world documents for a generated fantasy history. \
             Produce a believable {} written by someone inside the world. \
             Never break the frame or address the reader as an outsider.",
            document
        )
    } else {
        "You write literary chronicles for a generated fantasy history. \
         Produce finished prose with a clear arc, grounded in the supplied world facts."
            .to_string()
    };
    if !style.guidance.trim().is_empty() {
        let _ = write!(prompt, "\n\nStyle: {}\n{}", style.name, style.guidance.trim());
    }
    if let Some(words) = style.target_words {
        let _ = write!(prompt, "\n\nAim for roughly {} words.", words);
    }
    prompt.push_str("\n\nRespond with the text only, without a title line or commentary.");
    prompt
}

/// The cast with roles and entity ids.
pub(crate) fn cast_block(context: &ChronicleContext) -> String {
    let mut block = String::from("## Cast\n");
    for role in &context.role_assignments {
        let primary = if role.is_primary { ", primary" } else { "" };
        let _ = write!(
            block,
            "- {} [{}] ({}, {}{})",
            role.entity_name, role.entity_id, role.entity_kind, role.role, primary
        );
        if let Some(entity) = context.entity(&role.entity_id)
            && !entity.description.is_empty()
        {
            let _ = write!(block, ": {}", entity.description);
        }
        block.push('\n');
    }
    block
}

/// Related entities, relationships and events of a neighborhood.
pub(crate) fn neighborhood_block(hood: &Neighborhood) -> String {
    let name_of = |id: &str| {
        hood.entities()
            .find(|e| e.id == id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    let mut block = String::new();
    if !hood.related.is_empty() {
        block.push_str("## Connected figures\n");
        for entity in &hood.related {
            let _ = writeln!(block, "- {} ({}): {}", entity.name, entity.kind, entity.description);
        }
        block.push('\n');
    }
    if !hood.relationships.is_empty() {
        block.push_str("## Relationships\n");
        for rel in &hood.relationships {
            let _ = writeln!(
                block,
                "- {} is {} of {} (strength {:.2})",
                name_of(&rel.source_id),
                rel.kind,
                name_of(&rel.target_id),
                rel.strength
            );
        }
        block.push('\n');
    }
    if !hood.events.is_empty() {
        block.push_str("## Events\n");
        for event in &hood.events {
            let _ = write!(block, "- [tick {}] {}", event.tick, event.headline);
            if !event.description.is_empty() {
                let _ = write!(block, ": {}", event.description);
            }
            block.push('\n');
        }
        block.push('\n');
    }
    block
}

/// The structured perspective brief.
pub(crate) fn perspective_block(synthesis: &PerspectiveSynthesis) -> String {
    let mut block = format!("## Perspective\n{}\n", synthesis.brief.trim());
    if !synthesis.narrative_voice.is_empty() {
        block.push_str("\n### Narrative voice\n");
        for (dimension, voice) in &synthesis.narrative_voice {
            let _ = writeln!(block, "- {}: {}", dimension, voice);
        }
    }
    if !synthesis.suggested_motifs.is_empty() {
        let _ = writeln!(
            block,
            "\n### Motifs\n{}",
            synthesis.suggested_motifs.join("; ")
        );
    }
    if !synthesis.faceted_facts.is_empty() {
        block.push_str("\n### World facts, as this text sees them\n");
        for fact in &synthesis.faceted_facts {
            let _ = writeln!(block, "- {}", fact.interpretation);
        }
    }
    if !synthesis.entity_directives.is_empty() {
        block.push_str("\n### Entity directives\n");
        for directive in &synthesis.entity_directives {
            let name = if directive.entity_name.is_empty() {
                &directive.entity_id
            } else {
                &directive.entity_name
            };
            let _ = writeln!(block, "- {}: {}", name, directive.directive);
        }
    }
    if let Some(temporal) = &synthesis.temporal_narrative {
        let _ = writeln!(block, "\n### Period\n{}", temporal);
    }
    block
}

/// Temporal placement with era names resolved.
pub(crate) fn temporal_block(temporal: &TemporalContext, context: &ChronicleContext) -> String {
    let era_name = |id: &str| {
        context
            .eras
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let mut block = format!(
        "## Temporal context\nFocal era: {}\nTicks: {} to {}\nScope: {}\n",
        era_name(&temporal.focal_era),
        temporal.start_tick,
        temporal.end_tick,
        temporal.scope
    );
    if !temporal.touched_eras.is_empty() {
        let touched: Vec<String> = temporal.touched_eras.iter().map(|e| era_name(e)).collect();
        let _ = writeln!(block, "Also touches: {}", touched.join(", "));
    }
    if !temporal.description.is_empty() {
        let _ = writeln!(block, "{}", temporal.description);
    }
    block
}

/// Cast members with their visual descriptors.
pub(crate) fn visual_cast_block(context: &ChronicleContext) -> String {
    let mut block = String::new();
    for entity in context.cast_entities() {
        let look = entity
            .visual_description
            .as_deref()
            .unwrap_or(entity.description.as_str());
        let _ = writeln!(block, "- {} [{}] ({}): {}", entity.name, entity.id, entity.kind, look);
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::{EntityRef, RoleAssignment, StyleFormat};

    #[test]
    fn document_styles_frame_the_document_type() {
        let style = NarrativeStyle {
            id: "ledger".into(),
            name: "Ledger".into(),
            format: StyleFormat::Document,
            document_type: Some("merchant's ledger".into()),
            guidance: "Dry columns of debts.".into(),
            ..Default::default()
        };
        let prompt = author_system_prompt(&style);
        assert!(prompt.contains("merchant's ledger"));
        assert!(prompt.contains("Style: Ledger"));
    }

    #[test]
    fn cast_block_lists_roles() {
        let context = ChronicleContext {
            role_assignments: vec![RoleAssignment {
                entity_id: "e1".into(),
                entity_name: "Mira Vale".into(),
                entity_kind: "person".into(),
                role: "protagonist".into(),
                is_primary: true,
            }],
            entities: vec![EntityRef {
                id: "e1".into(),
                name: "Mira Vale".into(),
                kind: "person".into(),
                description: "A harbor pilot".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let block = cast_block(&context);
        assert!(block.contains("- Mira Vale [e1] (person, protagonist, primary): A harbor pilot"));
    }
}
