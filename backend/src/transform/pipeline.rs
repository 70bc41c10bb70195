//! High-level API: rows in, finished response body out.
//!
//! [`ResultComposer`] combines every step: column resolution, the optional
//! sort-order guard, grouping, pivoting and the selected output adapter.
//!
//! # Example
//!
//! ```rust,ignore
//! use survey_results::{ResultComposer, RenderRequest, OutputFormat, ColumnCatalog};
//!
//! let composer = ResultComposer::new(ColumnCatalog::standard());
//! let request = RenderRequest {
//!     format: OutputFormat::ColumnCsv,
//!     columns: vec!["urn:ohmage:user:id".into(), "urn:ohmage:prompt:response".into()],
//!     ..Default::default()
//! };
//! let output = composer.render(&rows, &request)?;
//! assert_eq!(output.content_type, "text/csv");
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::{ColumnCatalog, OutputColumnSpec};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::logs::{log_info, log_success};
use crate::models::{CampaignIdentity, ResponseRow, SurveyInstance};
use crate::output::column_csv::{self, CsvOptions};
use crate::output::row_json::{self, RowJsonOptions};
use crate::output::{column_json, data_points, OutputFormat, RenderedOutput};
use crate::transform::attacher::{attach, sort_rows};
use crate::transform::grouper::group_instances;
use crate::transform::pivot::{pivot, PivotedColumns};
use crate::validation::{check_attach_order, check_contiguous};

/// Options for one render call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub format: OutputFormat,

    /// Requested column tokens, wildcards allowed.
    pub columns: Vec<String>,

    /// JSON formats only.
    pub pretty_print: bool,

    /// Row-JSON only: append `survey_key`.
    pub include_row_id: bool,

    /// Row-JSON only: drop duplicate records.
    pub collapse: bool,

    /// CSV only: drop every `#` line.
    pub suppress_metadata: bool,

    /// CSV only: abbreviated header names.
    pub short_headers: bool,

    pub campaign: CampaignIdentity,

    /// Fail instead of mis-grouping when rows are not contiguous.
    pub strict_order: bool,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            format: OutputFormat::ColumnJson,
            columns: Vec::new(),
            pretty_print: false,
            include_row_id: false,
            collapse: false,
            suppress_metadata: false,
            short_headers: false,
            campaign: CampaignIdentity::default(),
            strict_order: false,
        }
    }
}

impl RenderRequest {
    /// Request preloaded with deployment defaults.
    pub fn from_config(config: &EngineConfig, format: OutputFormat, columns: Vec<String>) -> Self {
        Self {
            format,
            columns,
            pretty_print: config.pretty_print,
            campaign: config.campaign.clone(),
            strict_order: config.strict_order,
            ..Default::default()
        }
    }
}

/// Options for the legacy data-point output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPointOptions {
    /// Sort rows by (survey id, UTC timestamp, display type) first.
    pub sort: bool,
    pub strict_order: bool,
    pub pretty_print: bool,
}

/// Stateless renderer bound to a column catalog.
#[derive(Debug, Clone, Default)]
pub struct ResultComposer {
    catalog: ColumnCatalog,
}

impl ResultComposer {
    pub fn new(catalog: ColumnCatalog) -> Self {
        Self { catalog }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.catalog.clone())
    }

    pub fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    /// Resolve the request's tokens against the catalog and the rows.
    pub fn resolve_columns(&self, rows: &[ResponseRow], request: &RenderRequest) -> EngineResult<Vec<OutputColumnSpec>> {
        Ok(self.catalog.resolve(request.columns.as_slice(), rows)?)
    }

    /// Group rows into survey instances, honoring `strict_order`.
    pub fn group(&self, rows: &[ResponseRow], strict_order: bool) -> EngineResult<Vec<SurveyInstance>> {
        if strict_order {
            check_contiguous(rows)?;
        }
        Ok(group_instances(rows)?)
    }

    /// Group and pivot without serializing.
    pub fn pivot(&self, rows: &[ResponseRow], request: &RenderRequest) -> EngineResult<PivotedColumns> {
        let columns = self.resolve_columns(rows, request)?;
        let instances = self.group(rows, request.strict_order)?;
        Ok(pivot(&instances, &columns, rows.len(), &request.campaign)?)
    }

    /// Render rows in the requested format.
    pub fn render(&self, rows: &[ResponseRow], request: &RenderRequest) -> EngineResult<RenderedOutput> {
        log_info(format!("Rendering {} rows as {:?}", rows.len(), request.format));

        let output = match request.format {
            OutputFormat::RowJson => {
                let columns = self.resolve_columns(rows, request)?;
                if request.strict_order {
                    check_contiguous(rows)?;
                }
                let options = RowJsonOptions {
                    include_row_id: request.include_row_id,
                    collapse: request.collapse,
                    pretty: request.pretty_print,
                };
                RenderedOutput::json(row_json::render(rows, &columns, &request.campaign, options)?)
            }
            OutputFormat::ColumnJson => {
                let pivoted = self.pivot(rows, request)?;
                log_info(format!("Grouped into {} survey instances", pivoted.instance_count));
                RenderedOutput::json(column_json::render(&pivoted, request.pretty_print)?)
            }
            OutputFormat::ColumnCsv => {
                let pivoted = self.pivot(rows, request)?;
                log_info(format!("Grouped into {} survey instances", pivoted.instance_count));
                let options = CsvOptions {
                    suppress_metadata: request.suppress_metadata,
                    short_headers: request.short_headers,
                };
                RenderedOutput::csv(column_csv::render(&pivoted, &request.campaign, options)?)
            }
        };

        log_success(format!("Rendered {} bytes ({})", output.body.len(), output.content_type));
        Ok(output)
    }

    /// Render the legacy data-point output.
    pub fn render_data_points(&self, rows: &[ResponseRow], options: DataPointOptions) -> EngineResult<RenderedOutput> {
        let sorted;
        let rows = if options.sort {
            sorted = sort_rows(rows.to_vec())?;
            sorted.as_slice()
        } else {
            rows
        };

        if options.strict_order {
            check_attach_order(rows)?;
        }

        let entries = attach(rows)?;
        log_success(format!("Attached metadata to {} data points", entries.len()));
        Ok(RenderedOutput::json(data_points::render(&entries, options.pretty_print)?))
    }
}
