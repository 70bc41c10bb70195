//! Instance-major to column-major pivot.
//!
//! Each resolved column becomes one value vector aligned with the instance
//! sequence: `values[i]` belongs to `instances[i]`. Missing prompt answers are
//! `null`; the CSV adapter renders them as `NA`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::catalog::{ColumnKey, OutputColumnSpec};
use crate::error::{ColumnError, ColumnResult};
use crate::models::{CampaignIdentity, PromptValue, SurveyInstance};
use crate::transform::embedded::{float_value, launch_context_long, launch_context_short};

/// Serialization context of a prompt column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptContext {
    pub unit: Option<String>,
    pub prompt_type: Option<String>,
    pub display_type: Option<String>,
    pub display_label: Option<String>,
    pub choice_glossary: Option<Value>,
}

impl From<&PromptValue> for PromptContext {
    fn from(p: &PromptValue) -> Self {
        Self {
            unit: p.unit.clone(),
            prompt_type: Some(p.prompt_type.clone()),
            display_type: Some(p.display_type.clone()),
            display_label: Some(p.display_label.clone()),
            choice_glossary: p.choice_glossary.clone(),
        }
    }
}

/// One pivoted column.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotColumn {
    pub spec: OutputColumnSpec,
    pub name: String,
    /// Present for prompt columns only.
    pub context: Option<PromptContext>,
    pub values: Vec<Value>,
}

impl PivotColumn {
    /// Whether this column holds a prompt of the given type.
    pub fn has_prompt_type(&self, prompt_type: &str) -> bool {
        self.context
            .as_ref()
            .and_then(|c| c.prompt_type.as_deref())
            .is_some_and(|t| t == prompt_type)
    }
}

/// Column-major result with its summary counts.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotedColumns {
    pub columns: Vec<PivotColumn>,
    /// Number of input rows.
    pub total_prompt_count: usize,
    /// Number of survey instances.
    pub instance_count: usize,
}

impl PivotedColumns {
    /// Column by wire name.
    pub fn get(&self, name: &str) -> Option<&PivotColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Wire names in output order.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Pivot `instances` over already-resolved `columns`.
///
/// `total_rows` is the length of the row sequence the instances were grouped
/// from and is reported as-is.
pub fn pivot(
    instances: &[SurveyInstance],
    columns: &[OutputColumnSpec],
    total_rows: usize,
    campaign: &CampaignIdentity,
) -> ColumnResult<PivotedColumns> {
    if columns.is_empty() && !instances.is_empty() {
        return Err(ColumnError::EmptyColumnList);
    }

    let columns = columns
        .iter()
        .map(|spec| {
            let values = instances
                .iter()
                .map(|instance| cell_value(spec, instance, campaign))
                .collect();
            let context = spec.prompt_id().map(|id| prompt_context(instances, id));
            PivotColumn {
                spec: spec.clone(),
                name: spec.name(),
                context,
                values,
            }
        })
        .collect();

    Ok(PivotedColumns {
        columns,
        total_prompt_count: total_rows,
        instance_count: instances.len(),
    })
}

/// Context from the first instance carrying the prompt; all-null otherwise.
fn prompt_context(instances: &[SurveyInstance], prompt_id: &str) -> PromptContext {
    instances
        .iter()
        .find_map(|i| i.prompt(prompt_id))
        .map(PromptContext::from)
        .unwrap_or_default()
}

/// Value of one column for one instance.
pub fn cell_value(spec: &OutputColumnSpec, instance: &SurveyInstance, campaign: &CampaignIdentity) -> Value {
    match spec {
        OutputColumnSpec::Prompt(id) => instance
            .prompt(id)
            .map(|p| Value::String(p.value.clone()))
            .unwrap_or(Value::Null),
        OutputColumnSpec::Metadata(key) => metadata_value(*key, instance, campaign),
    }
}

/// Value of a fixed metadata column for one instance.
pub fn metadata_value(key: ColumnKey, instance: &SurveyInstance, campaign: &CampaignIdentity) -> Value {
    let loc = &instance.location;
    match key {
        ColumnKey::UserId => json!(instance.key.user),
        ColumnKey::ContextClient => json!(instance.client),
        ColumnKey::ContextTimestamp => json!(instance.key.timestamp),
        ColumnKey::ContextTimezone => json!(instance.timezone),
        ColumnKey::ContextUtcTimestamp => json!(instance.utc_timestamp),
        ColumnKey::ContextLaunchContextLong => launch_context_long(instance.launch_context.as_deref()),
        ColumnKey::ContextLaunchContextShort => launch_context_short(instance.launch_context.as_deref()),
        ColumnKey::LocationStatus => json!(instance.location_status),
        ColumnKey::LocationLatitude => float_value(loc.latitude),
        ColumnKey::LocationLongitude => float_value(loc.longitude),
        ColumnKey::LocationAccuracy => float_value(loc.accuracy),
        ColumnKey::LocationTimestamp => json!(loc.timestamp),
        ColumnKey::LocationProvider => json!(loc.provider),
        ColumnKey::SurveyId => json!(instance.key.survey_id),
        ColumnKey::SurveyTitle => json!(instance.survey_title),
        ColumnKey::SurveyDescription => json!(instance.survey_description),
        ColumnKey::SurveyPrivacyState => json!(instance.privacy_state),
        ColumnKey::RepeatableSetId => json!(instance.key.repeatable_set_id),
        ColumnKey::RepeatableSetIteration => json!(instance.key.repeatable_set_iteration),
        ColumnKey::CampaignName => json!(campaign.name),
        ColumnKey::CampaignVersion => json!(campaign.version),
    }
}
