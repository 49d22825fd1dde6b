//! Cover scene, scene-description rewrites, and cover image prompts.
//!
//! These steps stay available after acceptance.

use crate::dispatcher::{precondition, response_text};
use crate::prompts::visual_cast_block;
use crate::{
    ChronicleDispatcher, ChronicleTask, CostRecorder, StepPayload, byte_offset, extract_json,
    strip_wrapper,
};
use chrono::Utc;
use chronicle_core::{
    CallType, ChronicleContext, CoverImage, EntityRef, ImagePlacement, ImageStatus, NarrativeStyle,
};
use chronicle_error::{
    ChronicleError, ChronicleResult, GenerationError, GenerationErrorKind, StorageError,
    StorageErrorKind,
};
use chronicle_interface::{ChronicleRepository, CostSink, TextGenerator};
use serde::Deserialize;
use tracing::{info, instrument};

const SYSTEM_PROMPT: &str = "You describe single illustrated scenes for an artist. Write 100 \
to 150 words of concrete visual description: setting, light, figures, their poses and dress. \
No camera jargon, no text in the image.";

/// Characters of content shown around an anchor when rewriting a scene.
const ANCHOR_WINDOW: usize = 600;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneResponse {
    scene_description: String,
    #[serde(default)]
    entity_ids: Vec<String>,
}

/// Scene text and entity ids from a response, falling back to the stripped raw text.
fn parse_scene(response: &str) -> (String, Vec<String>) {
    extract_json(response)
        .and_then(|json| serde_json::from_str::<SceneResponse>(&json).ok())
        .map(|r| (r.scene_description.trim().to_string(), r.entity_ids))
        .filter(|(scene, _)| !scene.is_empty())
        .unwrap_or_else(|| (strip_wrapper(response), Vec::new()))
}

/// Compose the prompt handed to an image generator.
///
/// # Examples
///
/// ```
/// use chronicle_core::{EntityRef, NarrativeStyle};
/// use chronicle_pipeline::compose_image_prompt;
///
/// let style = NarrativeStyle { visual_framing: Some("Woodcut print".into()), ..Default::default() };
/// let mira = EntityRef {
///     id: "e1".into(),
///     name: "Mira Vale".into(),
///     kind: "person".into(),
///     visual_description: Some("tall, salt-grey braid".into()),
///     ..Default::default()
/// };
/// let prompt = compose_image_prompt(&style, "A harbor burns.", &[&mira]);
/// assert_eq!(prompt, "Woodcut print. A harbor burns. Featuring: Mira Vale (tall, salt-grey braid).");
/// ```
pub fn compose_image_prompt(
    style: &NarrativeStyle,
    scene: &str,
    entities: &[&EntityRef],
) -> String {
    let mut parts = Vec::new();
    if let Some(framing) = style.visual_framing.as_deref().map(str::trim)
        && !framing.is_empty()
    {
        parts.push(format!("{}.", framing.trim_end_matches('.')));
    }
    parts.push(scene.trim().to_string());
    let featured: Vec<String> = entities
        .iter()
        .map(|e| match e.visual_description.as_deref() {
            Some(look) if !look.trim().is_empty() => format!("{} ({})", e.name, look.trim()),
            _ => e.name.clone(),
        })
        .collect();
    if !featured.is_empty() {
        parts.push(format!("Featuring: {}.", featured.join(", ")));
    }
    parts.join(" ")
}

#[track_caller]
fn empty_scene(what: &str) -> ChronicleError {
    GenerationError::new(GenerationErrorKind::EmptyResponse(what.to_string())).into()
}

fn known_ids(ids: Vec<String>, context: &ChronicleContext) -> Vec<String> {
    ids.into_iter()
        .filter(|id| context.entity(id).is_some())
        .collect()
}

/// Up to [`ANCHOR_WINDOW`] characters of `content` centred on the character
/// offset `offset`.
fn window_around(content: &str, offset: usize) -> &str {
    let start = byte_offset(content, offset.saturating_sub(ANCHOR_WINDOW / 2));
    let end = byte_offset(content, offset.saturating_add(ANCHOR_WINDOW / 2));
    &content[start..end]
}

impl<G, R, C> ChronicleDispatcher<G, R, C>
where
    G: TextGenerator,
    R: ChronicleRepository,
    C: CostSink,
{
    /// Describe a cover scene for the current content.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn cover_image_scene(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let record = self.load_for(task).await?;
        let Some(content) = record.current_content() else {
            return Err(precondition(format!("chronicle {} has no content", record.id)));
        };

        let excerpt: String = content.chars().take(6000).collect();
        let prompt = format!(
            "## Visual framing\n{}\n\n## Cast\n{}\n## Chronicle\n{}\n\n\
             Describe one cover scene that captures the chronicle.\n\
             Respond with JSON: {{\"sceneDescription\": \"...\", \"entityIds\": [\"...\"]}}",
            record.context.style.visual_framing.as_deref().unwrap_or("None given"),
            visual_cast_block(&record.context),
            excerpt
        );
        let response = recorder
            .call(self.call(CallType::SceneDescription), SYSTEM_PROMPT, &prompt)
            .await?;
        response_text(&response, "cover scene")?;
        let (scene_description, entity_ids) = parse_scene(&response.text);
        if scene_description.is_empty() {
            return Err(empty_scene("cover scene"));
        }

        let cover = CoverImage {
            scene_description: scene_description.clone(),
            entity_ids: known_ids(entity_ids, &record.context),
            image_prompt: None,
            status: ImageStatus::Pending,
            image_id: None,
            generated_at: Utc::now(),
        };
        self.repository.update_cover_image(&record.id, cover).await?;
        info!("Cover scene stored");
        Ok(StepPayload::SceneDescription {
            scene_description,
            image_ref_id: None,
        })
    }

    /// Rewrite the scene description of one scene placement.
    #[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
    pub(crate) async fn regenerate_scene_description(
        &self,
        task: &ChronicleTask,
        recorder: &mut CostRecorder<'_, G, C>,
    ) -> ChronicleResult<StepPayload> {
        let record = self.load_for(task).await?;
        let Some(ref_id) = task.image_ref_id().as_deref() else {
            return Err(precondition(
                "scene description regeneration requires an image ref id",
            ));
        };
        let Some(mut refs) = record.image_refs.clone() else {
            return Err(precondition(format!("chronicle {} has no image refs", record.id)));
        };
        let Some(index) = refs.refs.iter().position(|r| r.id == ref_id) else {
            return Err(StorageError::new(StorageErrorKind::ImageRefNotFound {
                chronicle_id: record.id.clone(),
                ref_id: ref_id.to_string(),
            })
            .into());
        };
        let ImagePlacement::PromptRequest {
            scene_description: previous,
            entity_ids,
        } = &refs.refs[index].placement
        else {
            return Err(precondition(format!(
                "image ref {} is a portrait, not a scene request",
                ref_id
            )));
        };

        let featured: Vec<&EntityRef> = entity_ids
            .iter()
            .filter_map(|id| record.context.entity(id))
            .collect();
        let mut cast = String::new();
        for entity in &featured {
            cast.push_str(&format!(
                "- {} ({}): {}\n",
                entity.name,
                entity.kind,
                entity.visual_description.as_deref().unwrap_or(&entity.description)
            ));
        }
        // Offsets index the version the placements were planned against
        let content = record
            .version(&refs.source_version_id)
            .map(|v| v.content.as_str())
            .or(record.current_content())
            .unwrap_or_default();
        let passage = refs.refs[index]
            .anchor_offset
            .map(|offset| window_around(content, offset))
            .unwrap_or_default();
        let prompt = format!(
            "## Visual framing\n{}\n\n## Figures\n{}\n## Passage\n{}\n\n## Previous description\n{}\n\n\
             Write a fresh description of this scene.\n\
             Respond with JSON: {{\"sceneDescription\": \"...\"}}",
            record.context.style.visual_framing.as_deref().unwrap_or("None given"),
            cast,
            passage,
            previous
        );
        let response = recorder
            .call(self.call(CallType::SceneDescription), SYSTEM_PROMPT, &prompt)
            .await?;
        response_text(&response, "scene description")?;
        let (scene_description, _) = parse_scene(&response.text);
        if scene_description.is_empty() {
            return Err(empty_scene("scene description"));
        }

        let image_ref = &mut refs.refs[index];
        if let ImagePlacement::PromptRequest {
            scene_description: scene,
            ..
        } = &mut image_ref.placement
        {
            *scene = scene_description.clone();
        }
        image_ref.status = ImageStatus::Pending;
        image_ref.image_id = None;
        image_ref.error = None;
        self.repository.update_image_refs(&record.id, refs).await?;
        info!(image_ref_id = %ref_id, "Scene description rewritten");
        Ok(StepPayload::SceneDescription {
            scene_description,
            image_ref_id: Some(ref_id.to_string()),
        })
    }

    /// Compose and store the cover image prompt. Makes no external call.
    #[instrument(skip_all, fields(chronicle_id = ?task.chronicle_id()))]
    pub(crate) async fn cover_image(&self, task: &ChronicleTask) -> ChronicleResult<StepPayload> {
        let record = self.load_for(task).await?;
        let Some(mut cover) = record.cover_image.clone() else {
            return Err(precondition(format!("chronicle {} has no cover scene", record.id)));
        };

        let entities: Vec<&EntityRef> = if cover.entity_ids.is_empty() {
            record.context.cast_entities()
        } else {
            cover
                .entity_ids
                .iter()
                .filter_map(|id| record.context.entity(id))
                .collect()
        };
        let prompt =
            compose_image_prompt(&record.context.style, &cover.scene_description, &entities);

        cover.image_prompt = Some(prompt.clone());
        cover.status = ImageStatus::Pending;
        cover.image_id = None;
        self.repository.update_cover_image(&record.id, cover).await?;
        info!("Cover image prompt stored");
        Ok(StepPayload::ImagePrompt { prompt })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_counts_characters_around_the_anchor() {
        let lead = "é".repeat(400);
        let content = format!("{}Ørn stood on the quay{}", lead, "ü".repeat(400));
        let offset = 400;
        let window = window_around(&content, offset);
        assert_eq!(window.chars().count(), ANCHOR_WINDOW);
        assert!(window.contains("Ørn stood on the quay"));
        assert!(window.starts_with('é'));
    }

    #[test]
    fn window_clamps_at_the_edges() {
        let content = "Ćesar walked to the quay";
        assert_eq!(window_around(content, 6), content);
        assert_eq!(window_around(content, 500), "");
    }
}
