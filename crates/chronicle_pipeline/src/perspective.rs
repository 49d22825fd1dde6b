//! Perspective synthesis: turn raw facts and tone into an interpretive brief.

use crate::prompts::temporal_block;
use crate::{
    CostRecorder, Neighborhood, ResolvedCall, compute_constellation, parse_error, parse_response,
};
use chrono::Utc;
use chronicle_core::{
    ChronicleContext, PerspectiveInput, PerspectiveRecord, PerspectiveSynthesis, TemporalContext,
};
use chronicle_error::{ChronicleResult, JsonError};
use chronicle_interface::{CostSink, TextGenerator};
use tracing::{debug, instrument};

const SYSTEM_PROMPT: &str = "You are a narrative editor preparing a brief for a chronicle \
set in a generated fantasy world. Interpret the supplied facts from this chronicle's point \
of view rather than restating them. Respond with a single JSON object and nothing else.";

const RESPONSE_SHAPE: &str = r#"Respond with JSON of this shape:
{
  "brief": "one or two paragraphs describing what this chronicle is about and how it should feel",
  "faceted_facts": [{"fact_id": "...", "interpretation": "the fact as this chronicle frames it"}],
  "suggested_motifs": ["..."],
  "narrative_voice": {"register": "...", "distance": "...", "tempo": "..."},
  "entity_directives": [{"entity_id": "...", "entity_name": "...", "directive": "..."}],
  "temporal_narrative": "how the period should be conveyed, or null"
}"#;

/// Snapshot the inputs a synthesis call sees.
pub fn perspective_input(context: &ChronicleContext, hood: &Neighborhood) -> PerspectiveInput {
    PerspectiveInput {
        constellation: compute_constellation(hood),
        facts: context.facts.clone(),
        tone_fragments: context.tone_fragments.clone(),
        cultural_identities: context.cultural_identities.clone(),
        entities: hood.entities().cloned().collect(),
    }
}

fn user_prompt(
    input: &PerspectiveInput,
    context: &ChronicleContext,
    temporal: Option<&TemporalContext>,
) -> ChronicleResult<String> {
    let snapshot = serde_json::to_string_pretty(input)
        .map_err(|e| JsonError::new(format!("Failed to serialize perspective input: {}", e)))?;
    let mut prompt = format!(
        "## Style\n{} ({})\n\n## Inputs\n{}\n",
        context.style.name, context.style.format, snapshot
    );
    if let Some(direction) = &context.narrative_direction {
        prompt.push_str(&format!("\n## Author direction\n{}\n", direction));
    }
    if let Some(temporal) = temporal {
        prompt.push('\n');
        prompt.push_str(&temporal_block(temporal, context));
    }
    prompt.push('\n');
    prompt.push_str(RESPONSE_SHAPE);
    Ok(prompt)
}

/// Run the synthesis call.
///
/// The temporal narrative is cleared when no temporal context was given.
///
/// # Errors
///
/// Any call or parse failure is returned and is fatal to the enclosing step.
#[instrument(skip_all, fields(chronicle_id = %recorder.chronicle_id()))]
pub async fn synthesize_perspective<G, C>(
    recorder: &mut CostRecorder<'_, G, C>,
    call: &ResolvedCall,
    context: &ChronicleContext,
    temporal: Option<&TemporalContext>,
    hood: &Neighborhood,
) -> ChronicleResult<PerspectiveRecord>
where
    G: TextGenerator,
    C: CostSink,
{
    let input = perspective_input(context, hood);
    let prompt = user_prompt(&input, context, temporal)?;
    let response = recorder.call(call, SYSTEM_PROMPT, &prompt).await?;

    let mut output: PerspectiveSynthesis = parse_response(&response.text, "perspective")?;
    if output.brief.trim().is_empty() {
        return Err(parse_error("perspective", "brief is empty", &response.text));
    }
    if temporal.is_none() {
        output.temporal_narrative = None;
    }
    debug!(
        motifs = output.suggested_motifs.len(),
        directives = output.entity_directives.len(),
        "Perspective synthesized"
    );

    Ok(PerspectiveRecord {
        generated_at: Utc::now(),
        model: response.model,
        input,
        output,
    })
}
