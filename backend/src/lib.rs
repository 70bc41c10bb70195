//! # Survey Results - result composition and pivot engine
//!
//! Turns the flat, pre-sorted response rows of a mobile survey backend into
//! client-facing documents: row-based JSON, column-based JSON, column-based
//! CSV and the legacy data-point JSON.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Rows       │────▶│  Grouper    │────▶│  Pivot      │────▶│  JSON / CSV │
//! │  (sorted)   │     │  (instances)│     │  (columns)  │     │  (adapters) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use survey_results::{ResultComposer, RenderRequest, OutputFormat};
//!
//! let composer = ResultComposer::default();
//! let output = composer.render(&rows, &RenderRequest {
//!     format: OutputFormat::ColumnJson,
//!     columns: vec!["urn:ohmage:special:all".into()],
//!     ..Default::default()
//! })?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (ResponseRow, SurveyInstance, DataPointEntry)
//! - [`catalog`] - Column URNs, wildcards and resolution
//! - [`parser`] - Row loading with encoding auto-detection
//! - [`transform`] - Time, grouping, metadata attachment, pivot, pipeline
//! - [`output`] - Output adapters
//! - [`validation`] - Sort-order guard
//! - [`config`] - Environment configuration
//! - [`logs`] - Logging helpers

// Core modules
pub mod error;
pub mod models;

// Configuration and logging
pub mod config;
pub mod logs;

// Columns
pub mod catalog;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod output;

// Validation
pub mod validation;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ColumnError, ColumnResult, EngineError, EngineResult, LoadError, LoadResult, RenderError,
    RenderResult, TimeError, TimeResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CampaignIdentity, DataPointEntry, Location, MetadataItem, PromptValue, ResponseRow,
    SurveyInstance, SurveyInstanceKey,
};

// =============================================================================
// Re-exports - Catalog
// =============================================================================

pub use catalog::{ColumnCatalog, ColumnKey, OutputColumnSpec, PROMPT_ID_PREFIX, PROMPT_RESPONSE, SPECIAL_ALL};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{load_rows_file, parse_csv_bytes_auto, parse_json_rows, LoadedRows};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use config::EngineConfig;
pub use output::{OutputFormat, RenderedOutput};
pub use transform::pipeline::{DataPointOptions, RenderRequest, ResultComposer};
pub use transform::{attach, group_instances, pivot, to_utc};
