//! Row-oriented JSON: one record per input row.
//!
//! Fixed columns map to short record keys (`user`, `latitude`, ...). When
//! prompt columns are requested, each record also carries a `responses`
//! object holding the row's own answer if its prompt was requested.

use serde_json::{json, Map, Value};
use std::collections::HashSet;

use super::{to_json_bytes, RESULT_SUCCESS};
use crate::catalog::{ColumnKey, OutputColumnSpec};
use crate::error::{EngineResult, TimeResult};
use crate::models::{CampaignIdentity, Location, ResponseRow};
use crate::transform::embedded::{flatten_location, float_value, launch_context_long, launch_context_short};
use crate::transform::time::to_utc;

/// Row-JSON switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowJsonOptions {
    /// Append the storage row id as `survey_key`.
    pub include_row_id: bool,
    /// Drop records identical to an earlier one.
    pub collapse: bool,
    pub pretty: bool,
}

/// Number of survey-id transitions while walking the rows in order.
pub fn survey_transitions(rows: &[ResponseRow]) -> usize {
    let mut count = 0;
    let mut previous: Option<&str> = None;
    for row in rows {
        if previous != Some(row.survey_id.as_str()) {
            count += 1;
            previous = Some(row.survey_id.as_str());
        }
    }
    count
}

/// Build one record.
pub fn record(
    row: &ResponseRow,
    columns: &[OutputColumnSpec],
    campaign: &CampaignIdentity,
    include_row_id: bool,
) -> EngineResult<Value> {
    let mut location: Option<Location> = None;
    let mut record = Map::new();

    for column in columns {
        match column {
            OutputColumnSpec::Metadata(key) => {
                let value = row_value(*key, row, campaign, &mut location)?;
                record.insert(key.row_key().to_string(), value);
            }
            OutputColumnSpec::Prompt(_) => {
                if !record.contains_key("responses") {
                    record.insert("responses".to_string(), responses(row, columns));
                }
            }
        }
    }

    if include_row_id {
        record.insert("survey_key".to_string(), json!(row.row_id));
    }

    Ok(Value::Object(record))
}

/// Value of one fixed column for a single row.
///
/// The UTC timestamp and the flattened location are derived only when a
/// column asks for them; the location is parsed at most once per row.
fn row_value(
    key: ColumnKey,
    row: &ResponseRow,
    campaign: &CampaignIdentity,
    location: &mut Option<Location>,
) -> TimeResult<Value> {
    Ok(match key {
        ColumnKey::UserId => json!(row.user),
        ColumnKey::ContextClient => json!(row.client),
        ColumnKey::ContextTimestamp => json!(row.timestamp),
        ColumnKey::ContextTimezone => json!(row.timezone),
        ColumnKey::ContextUtcTimestamp => json!(to_utc(&row.timestamp, &row.timezone)?),
        ColumnKey::ContextLaunchContextLong => launch_context_long(row.launch_context.as_deref()),
        ColumnKey::ContextLaunchContextShort => launch_context_short(row.launch_context.as_deref()),
        ColumnKey::LocationStatus => json!(row.effective_location_status()),
        ColumnKey::LocationLatitude => float_value(cached_location(location, row).latitude),
        ColumnKey::LocationLongitude => float_value(cached_location(location, row).longitude),
        ColumnKey::LocationAccuracy => float_value(cached_location(location, row).accuracy),
        ColumnKey::LocationTimestamp => json!(cached_location(location, row).timestamp),
        ColumnKey::LocationProvider => json!(cached_location(location, row).provider),
        ColumnKey::SurveyId => json!(row.survey_id),
        ColumnKey::SurveyTitle => json!(row.survey_title),
        ColumnKey::SurveyDescription => json!(row.survey_description),
        ColumnKey::SurveyPrivacyState => json!(row.privacy_state),
        ColumnKey::RepeatableSetId => json!(row.repeatable_set_id),
        ColumnKey::RepeatableSetIteration => json!(row.repeatable_set_iteration),
        ColumnKey::CampaignName => json!(campaign.name),
        ColumnKey::CampaignVersion => json!(campaign.version),
    })
}

fn cached_location<'a>(slot: &'a mut Option<Location>, row: &ResponseRow) -> &'a Location {
    slot.get_or_insert_with(|| flatten_location(row.effective_location_status(), row.location.as_deref()))
}

fn responses(row: &ResponseRow, columns: &[OutputColumnSpec]) -> Value {
    let mut responses = Map::new();
    let requested = columns
        .iter()
        .any(|c| c.prompt_id() == Some(row.prompt_id.as_str()));

    if requested {
        let mut response = Map::new();
        response.insert("prompt_response".to_string(), json!(row.display_value));
        response.insert("prompt_display_type".to_string(), json!(row.display_type));
        response.insert("prompt_unit".to_string(), json!(row.unit));
        response.insert("prompt_type".to_string(), json!(row.prompt_type));
        if let Some(glossary) = &row.choice_glossary {
            response.insert("prompt_choice_glossary".to_string(), glossary.clone());
        }
        responses.insert(row.prompt_id.clone(), Value::Object(response));
    }

    Value::Object(responses)
}

/// Build the envelope. There is no `data` key when there are no rows.
pub fn envelope(
    rows: &[ResponseRow],
    columns: &[OutputColumnSpec],
    campaign: &CampaignIdentity,
    options: RowJsonOptions,
) -> EngineResult<Value> {
    let items: Vec<String> = columns.iter().map(OutputColumnSpec::name).collect();
    let mut envelope = Map::new();
    envelope.insert("result".to_string(), json!(RESULT_SUCCESS));
    envelope.insert(
        "metadata".to_string(),
        json!({
            "number_of_prompts": rows.len(),
            "number_of_surveys": survey_transitions(rows),
            "items": items,
        }),
    );

    if !rows.is_empty() {
        let mut seen = HashSet::new();
        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let rec = record(row, columns, campaign, options.include_row_id)?;
            if options.collapse && !seen.insert(serde_json::to_string(&rec)?) {
                continue;
            }
            data.push(rec);
        }
        envelope.insert("data".to_string(), Value::Array(data));
    }

    Ok(Value::Object(envelope))
}

pub fn render(
    rows: &[ResponseRow],
    columns: &[OutputColumnSpec],
    campaign: &CampaignIdentity,
    options: RowJsonOptions,
) -> EngineResult<Vec<u8>> {
    let value = envelope(rows, columns, campaign, options)?;
    Ok(to_json_bytes(&value, options.pretty)?)
}
