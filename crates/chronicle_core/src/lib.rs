//! Core data types for the chronicle generation pipeline.
//!
//! This crate holds the versioned chronicle record and everything it is made
//! of: the generation context supplied by the caller, the perspective
//! synthesis record, reports, image placements, and cost accounting types.
//! It also defines the request/response pair exchanged with a text service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod cost;
mod enrichment;
mod image;
mod perspective;
mod record;
mod reports;
mod request;
mod temporal;
mod version;

pub use context::{
    ChronicleContext, CulturalIdentity, EntityAlias, EntityRef, EraRef, EventRef, NarrativeStyle,
    RelationshipRef, RoleAssignment, StyleFormat, WorldFact,
};
pub use cost::{CallType, CostAccumulator, CostRecord, CostTotals, ModelPricing};
pub use enrichment::{SummaryRecord, TitleRecord};
pub use image::{CoverImage, ImagePlacement, ImageRef, ImageRefsRecord, ImageSize, ImageStatus};
pub use perspective::{
    Constellation, EntityDirective, FacetedFact, PerspectiveInput, PerspectiveRecord,
    PerspectiveSynthesis,
};
pub use record::{
    CURRENT_SCHEMA_VERSION, ChronicleRecord, ChronicleStatus, FailureMarker, StoredPrompts,
    VersionSummary,
};
pub use reports::{
    ComparisonReport, QuickCheckAssessment, QuickCheckReport, Suspect, SuspectConfidence,
    TemporalAlignment, TemporalCheckReport,
};
pub use request::{
    GenerateRequest, GenerateRequestBuilder, GenerateResponse, SamplingParams, TokenUsage,
};
pub use temporal::{TemporalContext, TemporalScope};
pub use version::{ChronicleVersion, SamplingMode, VersionStep, word_count};
