//! Step dispatcher, editorial stages and stores for chronicle generation.
//!
//! This crate turns a task naming a chronicle and a step into calls to a
//! text service and updates of the chronicle record.
//!
//! # Features
//!
//! - **Closed step set**: tasks parse into a [`Step`] and dispatch through one exhaustive match
//! - **Editorial stages**: perspective synthesis, generation and regeneration,
//!   compare and combine, copy edit, enrichment, consistency checks
//! - **Cost accounting**: every external call is priced and appended to a cost sink
//! - **Cooperative cancellation**: an [`AbortSignal`] checked after every external call
//! - **Stores**: in-memory and file-backed record stores with cost ledgers
//!
//! # Example
//!
//! ```rust,ignore
//! use chronicle_models::AnthropicClient;
//! use chronicle_pipeline::{
//!     AbortSignal, ChronicleDispatcher, ChronicleTask, FileChronicleRepository, JsonlCostSink,
//!     PipelineConfig, Step,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::load()?;
//! let dispatcher = ChronicleDispatcher::new(
//!     AnthropicClient::from_env()?,
//!     FileChronicleRepository::new(&config.storage.path)?,
//!     JsonlCostSink::new(&config.storage.path)?,
//!     &config,
//! )?;
//!
//! let task = ChronicleTask::for_chronicle(Step::Title, "chr-42");
//! let result = dispatcher.dispatch(&task, &AbortSignal::new()).await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod abort;
mod anchor;
mod checks;
mod chunking;
mod compare;
mod config;
mod constellation;
mod copy_edit;
mod cost;
mod cover;
mod dispatcher;
mod extraction;
mod generation;
mod image_refs;
mod lifecycle;
mod perspective;
mod prompts;
mod proper_nouns;
mod store;
mod summary;
mod task;
mod title;
mod title_case;

pub use abort::AbortSignal;
pub use anchor::{byte_offset, char_offset, resolve_anchor};
pub use checks::assess;
pub use chunking::{TextChunk, base_chunk_count, chunk_count, chunk_text};
pub use compare::{extract_combine_instructions, version_block};
pub use config::{
    CallProfile, CallSettings, ImageRefsConfig, NeighborhoodConfig, PipelineConfig,
    QuickCheckConfig, ResolvedCall, SamplingConfig, StorageConfig,
};
pub use constellation::{Neighborhood, compute_constellation, select_neighborhood};
pub use cost::{CostRecorder, estimate_tokens};
pub use cover::compose_image_prompt;
pub use dispatcher::ChronicleDispatcher;
pub use extraction::{extract_json, parse_error, parse_response, strip_wrapper};
pub use generation::generation_prompts;
pub use image_refs::{ProposedPlacement, validate_placements};
pub use lifecycle::ChronicleLifecycle;
pub use perspective::{perspective_input, synthesize_perspective};
pub use proper_nouns::{Candidate, is_known_name, name_tokens, scan_candidates};
pub use store::{
    FileChronicleRepository, InMemoryChronicleRepository, InMemoryCostSink, JsonlCostSink,
};
pub use summary::summary_text;
pub use task::{
    ChronicleTask, ChronicleTaskBuilder, Step, StepOutput, StepPayload, TaskRequest, TaskResult,
};
pub use title::{MAX_FRAGMENTS, TITLE_CANDIDATES, parse_fragments, shape_candidates};
pub use title_case::{normalize_titles, title_case};
