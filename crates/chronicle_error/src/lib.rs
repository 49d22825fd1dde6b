//! Error types for the chronicle generation pipeline.
//!
//! Every error follows the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enums name the specific condition
//! - `*Error` structs wrap the kind and record where it was raised
//! - constructors use `#[track_caller]` so the location is captured for free
//!
//! # Examples
//!
//! ```
//! use chronicle_error::{ChronicleResult, StepError, StepErrorKind};
//!
//! fn require_versions(count: usize) -> ChronicleResult<()> {
//!     if count < 2 {
//!         Err(StepError::new(StepErrorKind::Precondition(
//!             "comparison requires at least two versions".to_string(),
//!         )))?
//!     }
//!     Ok(())
//! }
//!
//! assert!(require_versions(1).is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod generation;
mod http;
mod json;
mod step;
mod storage;

pub use builder::BuilderError;
pub use config::ConfigError;
pub use error::{ChronicleError, ChronicleErrorKind, ChronicleResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use http::HttpError;
pub use json::JsonError;
pub use step::{StepError, StepErrorKind};
pub use storage::{StorageError, StorageErrorKind};
