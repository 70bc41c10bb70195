//! Transformation module.
//!
//! - Time: local timestamp to UTC
//! - Embedded: location and launch-context blobs, typed values
//! - Grouper: flat rows to survey instances
//! - Attacher: flat rows to data points with group metadata
//! - Pivot: instances to columns
//! - Pipeline: end-to-end rendering

pub mod attacher;
pub mod embedded;
pub mod grouper;
pub mod pipeline;
pub mod pivot;
pub mod time;

pub use attacher::{attach, sort_rows, MetadataAttacher};
pub use grouper::group_instances;
pub use pipeline::*;
pub use pivot::{pivot, PivotColumn, PivotedColumns, PromptContext};
pub use time::to_utc;
