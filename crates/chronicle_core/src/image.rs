//! Image placements inside content and the cover image.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relative display size of a placement.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ImageSize {
    /// Inline thumbnail
    Small,
    /// Standard inline image
    #[default]
    Medium,
    /// Large inline image
    Large,
    /// Full-width banner
    FullWidth,
}

/// Generation status of an image.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ImageStatus {
    /// Not yet requested from the image generator
    #[default]
    Pending,
    /// Image generation in progress
    Generating,
    /// Image available
    Complete,
    /// Image generation failed
    Error,
}

/// What an image placement shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImagePlacement {
    /// Portrait of an existing entity
    EntityRef {
        /// Entity id
        entity_id: String,
        /// Entity name
        entity_name: String,
    },
    /// A scene rendered from a prompt
    PromptRequest {
        /// Scene description handed to the image generator
        scene_description: String,
        /// Entities appearing in the scene (at least one)
        entity_ids: Vec<String>,
    },
}

/// One image placement anchored into the content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Placement id
    pub id: String,
    /// Placement kind
    pub placement: ImagePlacement,
    /// Phrase from the content the image attaches to
    pub anchor_text: String,
    /// Character offset of the anchor in the source version, when resolved
    #[serde(default)]
    pub anchor_offset: Option<usize>,
    /// Chunk the placement was planned for
    #[serde(default)]
    pub chunk_index: usize,
    /// Display size
    #[serde(default)]
    pub size: ImageSize,
    /// Optional caption
    #[serde(default)]
    pub caption: Option<String>,
    /// Generation status
    #[serde(default)]
    pub status: ImageStatus,
    /// Generated image identifier, once complete
    #[serde(default)]
    pub image_id: Option<String>,
    /// Failure detail when status is `error`
    #[serde(default)]
    pub error: Option<String>,
}

impl ImageRef {
    /// Whether this placement renders a scene prompt.
    pub fn is_prompt_request(&self) -> bool {
        matches!(self.placement, ImagePlacement::PromptRequest { .. })
    }
}

/// Image placements planned for one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRefsRecord {
    /// Placements in content order
    pub refs: Vec<ImageRef>,
    /// Version the placements were planned against
    pub source_version_id: String,
    /// When planning ran
    pub generated_at: DateTime<Utc>,
}

/// Cover image scene and prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverImage {
    /// Scene description
    pub scene_description: String,
    /// Entities appearing on the cover
    #[serde(default)]
    pub entity_ids: Vec<String>,
    /// Final prompt for the image generator, once composed
    #[serde(default)]
    pub image_prompt: Option<String>,
    /// Generation status
    #[serde(default)]
    pub status: ImageStatus,
    /// Generated image identifier, once complete
    #[serde(default)]
    pub image_id: Option<String>,
    /// When the scene was written
    pub generated_at: DateTime<Utc>,
}
