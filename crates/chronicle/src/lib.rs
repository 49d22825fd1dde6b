//! Chronicle - versioned, LLM-driven narrative generation
//!
//! Chronicle turns a snapshot of a generated world (a cast, the entities and
//! relationships around it, events and canonical facts) into short literary
//! chronicles or in-world documents. Every chronicle is a versioned record:
//! drafts are regenerated, compared, combined and copy-edited, then checked,
//! summarized, titled and illustrated before being accepted.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chronicle::{
//!     AbortSignal, AnthropicClient, ChronicleDispatcher, ChronicleTask, FileChronicleRepository,
//!     JsonlCostSink, PipelineConfig, Step,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::load()?;
//!     let client = AnthropicClient::from_env("claude-sonnet-4-5")?;
//!     let dispatcher = ChronicleDispatcher::new(
//!         client,
//!         FileChronicleRepository::new(&config.storage.path)?,
//!         JsonlCostSink::new(&config.storage.path)?,
//!         &config,
//!     )?;
//!
//!     let task = ChronicleTask::for_chronicle(Step::Summary, "chr-42");
//!     let result = dispatcher.dispatch(&task, &AbortSignal::new()).await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Chronicle is organized as a workspace with focused crates:
//!
//! - `chronicle_error` - Error types
//! - `chronicle_core` - Record, versions, reports and request types
//! - `chronicle_interface` - Text service, record store and cost sink traits
//! - `chronicle_models` - Anthropic text service with retry and metrics
//! - `chronicle_pipeline` - Step dispatcher, editorial stages and stores
//!
//! This crate (`chronicle`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use chronicle_core::*;
pub use chronicle_error::*;
pub use chronicle_interface::*;
pub use chronicle_models::*;
pub use chronicle_pipeline::*;

pub mod observability;
