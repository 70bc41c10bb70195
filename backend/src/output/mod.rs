//! Output adapters.
//!
//! - [`row_json`] - one record per input row
//! - [`column_json`] - pivoted columns as a JSON envelope
//! - [`column_csv`] - pivoted columns as commented CSV
//! - [`data_points`] - legacy per-row output with attached metadata
//!
//! Every adapter builds the complete body in memory and returns it only when
//! the whole document was produced.

pub mod column_csv;
pub mod column_json;
pub mod data_points;
pub mod row_json;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RenderResult;

/// Value of the `result` envelope key on success.
pub const RESULT_SUCCESS: &str = "success";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_CSV: &str = "text/csv";

/// Wire format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    RowJson,
    ColumnJson,
    ColumnCsv,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::RowJson | Self::ColumnJson => CONTENT_TYPE_JSON,
            Self::ColumnCsv => CONTENT_TYPE_CSV,
        }
    }
}

/// A finished response body tagged with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOutput {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl RenderedOutput {
    pub fn json(body: Vec<u8>) -> Self {
        Self {
            content_type: CONTENT_TYPE_JSON,
            body,
        }
    }

    pub fn csv(body: Vec<u8>) -> Self {
        Self {
            content_type: CONTENT_TYPE_CSV,
            body,
        }
    }

    /// Body as text. Every adapter emits UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Serialize a JSON document, compact or pretty.
pub(crate) fn to_json_bytes(value: &Value, pretty: bool) -> RenderResult<Vec<u8>> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    Ok(bytes)
}
