//! Constellation summaries and bounded neighborhood selection.
//!
//! Both run locally over the caller-supplied context; neither makes an
//! external call.

use crate::NeighborhoodConfig;
use chronicle_core::{
    ChronicleContext, Constellation, EntityRef, EventRef, RelationshipRef, TemporalContext,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Number of tags kept in a constellation summary.
const PROMINENT_TAGS: usize = 5;

/// The slice of the world a chronicle is written from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Neighborhood {
    /// Cast entities, in cast order
    pub cast: Vec<EntityRef>,
    /// Entities connected to the cast, strongest connection first
    pub related: Vec<EntityRef>,
    /// Relationships among the selected entities, strongest first
    pub relationships: Vec<RelationshipRef>,
    /// Events involving the selected entities, most significant first
    pub events: Vec<EventRef>,
}

impl Neighborhood {
    /// Cast followed by related entities.
    pub fn entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.cast.iter().chain(self.related.iter())
    }
}

fn by_strength(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Select the cast, its strongest neighbors, and the relationships and events among them.
///
/// Events outside the temporal context's tick range are skipped when one is given.
pub fn select_neighborhood(
    context: &ChronicleContext,
    temporal: Option<&TemporalContext>,
    bounds: &NeighborhoodConfig,
) -> Neighborhood {
    let cast: Vec<EntityRef> = context.cast_entities().into_iter().cloned().collect();
    let cast_ids: HashSet<&str> = context
        .role_assignments
        .iter()
        .map(|r| r.entity_id.as_str())
        .collect();

    let mut strongest: HashMap<&str, f64> = HashMap::new();
    for rel in &context.relationships {
        for cast_id in &cast_ids {
            if let Some(other) = rel.other(cast_id)
                && !cast_ids.contains(other)
            {
                let entry = strongest.entry(other).or_insert(f64::MIN);
                *entry = entry.max(rel.strength);
            }
        }
    }
    let mut ranked: Vec<(&str, f64)> = strongest.into_iter().collect();
    ranked.sort_by(|a, b| by_strength(a.1, b.1).then_with(|| a.0.cmp(b.0)));
    let related: Vec<EntityRef> = ranked
        .into_iter()
        .filter_map(|(id, _)| context.entity(id).cloned())
        .take(bounds.max_related_entities)
        .collect();

    let selected: HashSet<&str> = cast
        .iter()
        .chain(related.iter())
        .map(|e| e.id.as_str())
        .chain(cast_ids.iter().copied())
        .collect();

    let mut relationships: Vec<RelationshipRef> = context
        .relationships
        .iter()
        .filter(|r| selected.contains(r.source_id.as_str()) && selected.contains(r.target_id.as_str()))
        .cloned()
        .collect();
    relationships.sort_by(|a, b| by_strength(a.strength, b.strength));
    relationships.truncate(bounds.max_relationships);

    let mut events: Vec<EventRef> = context
        .events
        .iter()
        .filter(|e| e.entity_ids.iter().any(|id| selected.contains(id.as_str())))
        .filter(|e| temporal.is_none_or(|t| t.contains_tick(e.tick)))
        .cloned()
        .collect();
    events.sort_by(|a, b| by_strength(a.significance, b.significance).then(a.tick.cmp(&b.tick)));
    events.truncate(bounds.max_events);

    Neighborhood {
        cast,
        related,
        relationships,
        events,
    }
}

/// Summarize a neighborhood.
///
/// The dominant culture counts cast members only and breaks ties
/// alphabetically. Tags are ranked by frequency across all selected entities.
pub fn compute_constellation(neighborhood: &Neighborhood) -> Constellation {
    let mut cultures: BTreeMap<&str, usize> = BTreeMap::new();
    for entity in &neighborhood.cast {
        if let Some(culture) = entity.culture.as_deref() {
            *cultures.entry(culture).or_default() += 1;
        }
    }
    // BTreeMap iterates alphabetically; max_by keeps the last maximum, so reverse
    let dominant_culture = cultures
        .iter()
        .rev()
        .max_by_key(|(_, count)| **count)
        .map(|(culture, _)| culture.to_string());

    let mut kind_mix = BTreeMap::new();
    let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entity in neighborhood.entities() {
        *kind_mix.entry(entity.kind.clone()).or_default() += 1;
        for tag in &entity.tags {
            *tag_counts.entry(tag.as_str()).or_default() += 1;
        }
    }
    let mut tags: Vec<(&str, usize)> = tag_counts.into_iter().collect();
    tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let prominent_tags = tags
        .into_iter()
        .take(PROMINENT_TAGS)
        .map(|(tag, _)| tag.to_string())
        .collect();

    let mut relationship_mix = BTreeMap::new();
    for rel in &neighborhood.relationships {
        *relationship_mix.entry(rel.kind.clone()).or_default() += 1;
    }

    Constellation {
        dominant_culture,
        kind_mix,
        prominent_tags,
        relationship_mix,
        entity_count: neighborhood.cast.len() + neighborhood.related.len(),
        relationship_count: neighborhood.relationships.len(),
        event_count: neighborhood.events.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronicle_core::RoleAssignment;

    fn entity(id: &str, kind: &str, culture: Option<&str>, tags: &[&str]) -> EntityRef {
        EntityRef {
            id: id.into(),
            name: id.to_uppercase(),
            kind: kind.into(),
            culture: culture.map(Into::into),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn rel(a: &str, b: &str, kind: &str, strength: f64) -> RelationshipRef {
        RelationshipRef {
            source_id: a.into(),
            target_id: b.into(),
            kind: kind.into(),
            strength,
        }
    }

    fn event(id: &str, tick: i64, significance: f64, ids: &[&str]) -> EventRef {
        EventRef {
            id: id.into(),
            headline: id.into(),
            tick,
            significance,
            entity_ids: ids.iter().map(|i| i.to_string()).collect(),
            ..Default::default()
        }
    }

    fn role(id: &str) -> RoleAssignment {
        RoleAssignment {
            entity_id: id.into(),
            entity_name: id.to_uppercase(),
            entity_kind: "person".into(),
            role: "protagonist".into(),
            is_primary: true,
        }
    }

    fn context() -> ChronicleContext {
        ChronicleContext {
            role_assignments: vec![role("a"), role("b")],
            entities: vec![
                entity("a", "person", Some("tessic"), &["sailor", "exile"]),
                entity("b", "person", Some("varan"), &["sailor"]),
                entity("c", "faction", Some("varan"), &["guild"]),
                entity("d", "place", None, &["port"]),
                entity("e", "person", None, &[]),
            ],
            relationships: vec![
                rel("a", "c", "member", 0.4),
                rel("b", "c", "rival", 0.9),
                rel("a", "d", "resident", 0.6),
                rel("d", "e", "ruler", 1.0),
            ],
            events: vec![
                event("ev1", 10, 0.5, &["a"]),
                event("ev2", 50, 0.9, &["c"]),
                event("ev3", 30, 0.9, &["e"]),
                event("ev4", 20, 0.9, &["b"]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn related_entities_ranked_by_strongest_link() {
        let hood = select_neighborhood(&context(), None, &NeighborhoodConfig::default());
        let related: Vec<&str> = hood.related.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(related, vec!["c", "d"]);
    }

    #[test]
    fn relationships_stay_inside_selection() {
        let hood = select_neighborhood(&context(), None, &NeighborhoodConfig::default());
        assert_eq!(hood.relationships.len(), 3);
        assert_eq!(hood.relationships[0].kind, "rival");
        assert!(hood.relationships.iter().all(|r| r.target_id != "e"));
    }

    #[test]
    fn events_filtered_by_selection_and_ticks() {
        let temporal = TemporalContext {
            start_tick: 0,
            end_tick: 40,
            ..Default::default()
        };
        let hood = select_neighborhood(&context(), Some(&temporal), &NeighborhoodConfig::default());
        let ids: Vec<&str> = hood.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["ev4", "ev1"]);
    }

    #[test]
    fn bounds_are_respected() {
        let bounds = NeighborhoodConfig {
            max_related_entities: 1,
            max_relationships: 1,
            max_events: 1,
        };
        let hood = select_neighborhood(&context(), None, &bounds);
        assert_eq!(hood.related.len(), 1);
        assert_eq!(hood.relationships.len(), 1);
        assert_eq!(hood.events.len(), 1);
    }

    #[test]
    fn constellation_ties_break_alphabetically() {
        let hood = select_neighborhood(&context(), None, &NeighborhoodConfig::default());
        let constellation = compute_constellation(&hood);
        assert_eq!(constellation.dominant_culture.as_deref(), Some("tessic"));
        assert_eq!(constellation.prominent_tags[0], "sailor");
        assert_eq!(constellation.kind_mix.get("person"), Some(&2));
        assert_eq!(constellation.relationship_mix.get("rival"), Some(&1));
        assert_eq!(constellation.entity_count, 4);
    }
}
