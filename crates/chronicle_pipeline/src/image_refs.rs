//! Image placement planning over word-boundary chunks.
//!
//! The content is split into chunks and the text service proposes at most
//! one placement per chunk. Placements are validated against the world's
//! entities, bounded, and their anchor phrases fuzzily resolved to offsets.

use crate::dispatcher::require_target;
use crate::{
    ChronicleDispatcher, ChronicleTask, CostRecorder, ImageRefsConfig, StepPayload, TextChunk,
    char_offset, chunk_count, chunk_text, parse_error, parse_response, resolve_anchor,
};
use chrono::Utc;
use chronicle_core::{
    CallType, ChronicleContext, ImagePlacement, ImageRef, ImageRefsRecord, ImageSize, ImageStatus,
    word_count,
};
use chronicle_error::ChronicleResult;
use chronicle_interface::{ChronicleRepository, CostSink, TextGenerator};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt::Write;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

const SYSTEM_PROMPT: &str = "You plan illustrations for a chronicle. Each placement either \
shows a portrait of a known entity or requests a scene. Respond with a single JSON object and \
nothing else.";

/// A placement as proposed by the text service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedPlacement {
    /// Chunk index the placement belongs to
    pub chunk: usize,
    /// `entity_ref` or `prompt_request`
    #[serde(rename = "type")]
    pub kind: String,
    /// Portrait subject for entity refs
    #[serde(default)]
    pub entity_id: Option<String>,
    /// Scene for prompt requests
    #[serde(default)]
    pub scene_description: Option<String>,
    /// Entities shown in a scene
    #[serde(default)]
    pub entity_ids: Vec<String>,
    /// Phrase in the chunk the image hangs from
    pub anchor_text: String,
    /// Size class
    #[serde(default)]
    pub size: Option<String>,
    /// Caption
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlacementsResponse {
    placements: Vec<ProposedPlacement>,
}

/// Validate proposals into placements.
///
/// Keeps the first proposal per chunk, drops proposals for unknown chunks or
/// entities, and drops scene requests that name no known entity.
pub fn validate_placements(
    proposals: Vec<ProposedPlacement>,
    chunk_total: usize,
    context: &ChronicleContext,
) -> Vec<(ProposedPlacement, ImagePlacement)> {
    let mut used_chunks = HashSet::new();
    let mut valid = Vec::new();

    for proposal in proposals {
        if proposal.chunk >= chunk_total || used_chunks.contains(&proposal.chunk) {
            debug!(chunk = proposal.chunk, "Dropping placement for unknown or used chunk");
            continue;
        }
        if proposal.anchor_text.trim().is_empty() {
            continue;
        }
        let placement = match proposal.kind.trim().to_lowercase().as_str() {
            "entity_ref" | "entityref" => {
                let entity = proposal
                    .entity_id
                    .as_deref()
                    .and_then(|id| context.entity(id));
                let Some(entity) = entity else {
                    debug!(entity_id = ?proposal.entity_id, "Dropping portrait of unknown entity");
                    continue;
                };
                ImagePlacement::EntityRef {
                    entity_id: entity.id.clone(),
                    entity_name: entity.name.clone(),
                }
            }
            "prompt_request" | "promptrequest" => {
                let scene = proposal.scene_description.as_deref().map(str::trim).unwrap_or("");
                let entity_ids: Vec<String> = proposal
                    .entity_ids
                    .iter()
                    .filter(|id| context.entity(id).is_some())
                    .cloned()
                    .collect();
                if scene.is_empty() || entity_ids.is_empty() {
                    debug!("Dropping scene request without a scene or known entity");
                    continue;
                }
                ImagePlacement::PromptRequest {
                    scene_description: scene.to_string(),
                    entity_ids,
                }
            }
            other => {
                debug!(kind = other, "Dropping placement of unknown type");
                continue;
            }
        };
        used_chunks.insert(proposal.chunk);
        valid.push((proposal, placement));
    }
    valid
}

fn planning_prompt(
    chunks: &[TextChunk<'_>],
    context: &ChronicleContext,
    bounds: &ImageRefsConfig,
) -> String {
    let mut prompt = String::from("## Entities\n");
    for entity in context.cast_entities() {
        let _ = writeln!(prompt, "- {} [{}] ({})", entity.name, entity.id, entity.kind);
    }
    prompt.push_str("\n## Chunks\n");
    for chunk in chunks {
        let _ = write!(prompt, "\n### Chunk {}\n{}\n", chunk.index, chunk.text.trim());
    }
    let _ = write!(
        prompt,
        "\nPropose between {} and {} placements, at most one per chunk. For each, copy a short \
         anchor phrase verbatim from its chunk. Portraits use an entity id from the list; scene \
         requests describe the scene and name at least one entity id.\n\
         Respond with JSON: {{\"placements\": [{{\"chunk\": 0, \"type\": \"entity_ref|prompt_request\", \
         \"entityId\": \"...\", \"sceneDescription\": \"...\", \"entityIds\": [\"...\"], \
         \"anchorText\": \"...\", \"size\": \"small|medium|large|full_width\", \"caption\": \"...\"}}]}}",
        bounds.min_refs, bounds.max_refs
    );
    prompt
}

impl<G, R, C> ChronicleDispatcher<G, R, C>
where
    G: TextGenerator,
    R: ChronicleRepository,
    C: CostSink,
{
    /// Plan image placements for the targeted version.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn image_refs(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let record = self.load_for(task).await?;
        let version = require_target(&record, task.version_id().as_deref())?;
        let content = version.content.as_str();
        let bounds = self.image_refs;

        let count = chunk_count(
            word_count(content),
            bounds.min_chunks,
            bounds.max_chunks,
            &mut rand::thread_rng(),
        );
        let chunks = chunk_text(content, count);
        debug!(chunks = chunks.len(), "Content chunked");

        let response = recorder
            .call(
                self.call(CallType::ImageRefs),
                SYSTEM_PROMPT,
                &planning_prompt(&chunks, &record.context, &bounds),
            )
            .await?;
        let parsed: PlacementsResponse = parse_response(&response.text, "image refs")?;

        let mut refs = Vec::new();
        let valid = validate_placements(parsed.placements, chunks.len(), &record.context);
        for (proposal, placement) in valid {
            let chunk = &chunks[proposal.chunk];
            let offset = resolve_anchor(
                content,
                &proposal.anchor_text,
                Some(chunk.start..chunk.end()),
                bounds.anchor_threshold,
            )
            .map(|byte| char_offset(content, byte));
            if offset.is_none() {
                if !bounds.keep_unresolved {
                    warn!(anchor = %proposal.anchor_text, "Dropping placement with unresolved anchor");
                    continue;
                }
                debug!(anchor = %proposal.anchor_text, "Keeping placement with unresolved anchor");
            }
            refs.push(ImageRef {
                id: uuid::Uuid::new_v4().to_string(),
                placement,
                anchor_text: proposal.anchor_text.trim().to_string(),
                anchor_offset: offset,
                chunk_index: proposal.chunk,
                size: proposal
                    .size
                    .as_deref()
                    .and_then(|s| ImageSize::from_str(s.trim()).ok())
                    .unwrap_or_default(),
                caption: proposal.caption.filter(|c| !c.trim().is_empty()),
                status: ImageStatus::Pending,
                image_id: None,
                error: None,
            });
        }

        if refs.len() < bounds.min_refs {
            return Err(parse_error(
                "image refs",
                &format!(
                    "{} usable placements, at least {} required",
                    refs.len(),
                    bounds.min_refs
                ),
                &response.text,
            ));
        }
        refs.truncate(bounds.max_refs);

        let stored = ImageRefsRecord {
            refs: refs.clone(),
            source_version_id: version.id.clone(),
            generated_at: Utc::now(),
        };
        self.repository.update_image_refs(&record.id, stored).await?;
        info!(refs = refs.len(), "Image refs stored");
        Ok(StepPayload::ImageRefs { refs })
    }
}
