//! Trait definitions for the chronicle generation pipeline.
//!
//! The pipeline talks to three collaborators through these seams: a text
//! service ([`TextGenerator`]), a record store ([`ChronicleRepository`]) and
//! an append-only cost sink ([`CostSink`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod repository;
mod traits;

pub use repository::{ChronicleRepository, ChronicleSummary, CostSink, RecordFilter};
pub use traits::TextGenerator;
