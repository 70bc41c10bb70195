//! Domain models for the survey result engine.
//!
//! - [`ResponseRow`] - one stored answer (or metadata item), the input unit
//! - [`SurveyInstanceKey`] - composite key identifying one submission
//! - [`SurveyInstance`] - rows squashed into one submission
//! - [`PromptValue`] - one prompt answer inside an instance
//! - [`Location`] - flattened location blob
//! - [`CampaignIdentity`] - campaign the rows belong to
//! - [`DataPointEntry`] / [`MetadataItem`] - legacy per-row output model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Location status meaning the location blob must be ignored.
pub const LOCATION_UNAVAILABLE: &str = "unavailable";

/// Location status assumed when a blob is present but no status was stored.
pub const LOCATION_VALID: &str = "valid";

/// Display type marking a row as instance metadata in the legacy API.
pub const DISPLAY_TYPE_METADATA: &str = "metadata";

/// Prompt type whose CSV cells are cleaned and quoted.
pub const PROMPT_TYPE_TEXT: &str = "text";

// =============================================================================
// Response Row
// =============================================================================

/// One row as returned by storage: a single answered prompt.
///
/// Rows are immutable input. The UTC timestamp is never read from input; it is
/// derived by [`crate::transform::time::to_utc`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseRow {
    pub user: String,
    pub client: String,
    /// Local wall-clock time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// IANA zone id the timestamp was recorded in.
    pub timezone: String,
    pub survey_id: String,
    #[serde(default)]
    pub survey_title: String,
    #[serde(default)]
    pub survey_description: String,
    #[serde(default)]
    pub privacy_state: String,
    #[serde(default)]
    pub repeatable_set_id: Option<String>,
    #[serde(default)]
    pub repeatable_set_iteration: Option<i64>,
    pub prompt_id: String,
    #[serde(default)]
    pub prompt_type: String,
    #[serde(default)]
    pub display_type: String,
    #[serde(default)]
    pub display_label: String,
    #[serde(default)]
    pub display_value: String,
    #[serde(default)]
    pub unit: Option<String>,
    /// Raw location JSON text.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub location_status: Option<String>,
    /// Raw launch-context JSON text.
    #[serde(default)]
    pub launch_context: Option<String>,
    #[serde(default)]
    pub choice_glossary: Option<Value>,
    #[serde(default)]
    pub row_id: Option<i64>,
}

impl ResponseRow {
    /// Key of the survey instance this row belongs to.
    pub fn instance_key(&self) -> SurveyInstanceKey {
        SurveyInstanceKey {
            user: self.user.clone(),
            timestamp: self.timestamp.clone(),
            survey_id: self.survey_id.clone(),
            repeatable_set_id: self.repeatable_set_id.clone(),
            repeatable_set_iteration: self.repeatable_set_iteration,
        }
    }

    /// Whether this row shares `key` without allocating a new key.
    pub fn matches_key(&self, key: &SurveyInstanceKey) -> bool {
        self.user == key.user
            && self.timestamp == key.timestamp
            && self.survey_id == key.survey_id
            && self.repeatable_set_id == key.repeatable_set_id
            && self.repeatable_set_iteration == key.repeatable_set_iteration
    }

    /// Stored location status, or one derived from the presence of a blob.
    pub fn effective_location_status(&self) -> &str {
        match (&self.location_status, &self.location) {
            (Some(status), _) => status,
            (None, Some(_)) => LOCATION_VALID,
            (None, None) => LOCATION_UNAVAILABLE,
        }
    }

    /// Whether the legacy API treats this row as instance metadata.
    pub fn is_metadata(&self) -> bool {
        self.display_type == DISPLAY_TYPE_METADATA
    }

    /// Answer carried by this row.
    pub fn prompt_value(&self) -> PromptValue {
        PromptValue {
            prompt_type: self.prompt_type.clone(),
            display_type: self.display_type.clone(),
            display_label: self.display_label.clone(),
            unit: self.unit.clone(),
            value: self.display_value.clone(),
            choice_glossary: self.choice_glossary.clone(),
        }
    }
}

// =============================================================================
// Survey Instances
// =============================================================================

/// Rows sharing this key belong to the same submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurveyInstanceKey {
    pub user: String,
    pub timestamp: String,
    pub survey_id: String,
    pub repeatable_set_id: Option<String>,
    pub repeatable_set_iteration: Option<i64>,
}

/// One answer inside a survey instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptValue {
    pub prompt_type: String,
    pub display_type: String,
    pub display_label: String,
    pub unit: Option<String>,
    pub value: String,
    pub choice_glossary: Option<Value>,
}

/// Flattened location blob. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub provider: Option<String>,
    pub timestamp: Option<String>,
}

/// One survey submission (or repeatable-set iteration).
///
/// Instance-level fields are copied from the first row of the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyInstance {
    pub key: SurveyInstanceKey,
    pub client: String,
    pub timezone: String,
    pub utc_timestamp: String,
    pub survey_title: String,
    pub survey_description: String,
    pub privacy_state: String,
    pub location_status: String,
    pub location: Location,
    pub launch_context: Option<String>,
    pub prompts: HashMap<String, PromptValue>,
}

impl SurveyInstance {
    /// Answer for `prompt_id`, if this instance has one.
    pub fn prompt(&self, prompt_id: &str) -> Option<&PromptValue> {
        self.prompts.get(prompt_id)
    }
}

// =============================================================================
// Campaign
// =============================================================================

/// Campaign the rows were read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignIdentity {
    pub urn: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

// =============================================================================
// Legacy Data Points
// =============================================================================

/// A compact metadata record attached to data-point entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub id: String,
    #[serde(rename = "type")]
    pub prompt_type: String,
    pub value: Value,
}

/// One non-metadata row of the legacy data-point output, with the metadata of
/// its (survey id, UTC timestamp) group attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPointEntry {
    pub metadata: Vec<MetadataItem>,
    pub label: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub timestamp: String,
    pub tz: String,
    pub utc_timestamp: String,
    pub location_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(rename = "type")]
    pub display_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration: Option<i64>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ResponseRow {
        ResponseRow {
            user: "u1".into(),
            timestamp: "2012-01-01 00:00:00".into(),
            timezone: "America/Los_Angeles".into(),
            survey_id: "s1".into(),
            prompt_id: "p1".into(),
            display_value: "3".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_instance_key_matches() {
        let a = row();
        let mut b = row();
        assert!(b.matches_key(&a.instance_key()));

        b.repeatable_set_iteration = Some(1);
        assert!(!b.matches_key(&a.instance_key()));
        assert_ne!(a.instance_key(), b.instance_key());
    }

    #[test]
    fn test_effective_location_status() {
        let mut r = row();
        assert_eq!(r.effective_location_status(), LOCATION_UNAVAILABLE);

        r.location = Some("{}".into());
        assert_eq!(r.effective_location_status(), LOCATION_VALID);

        r.location_status = Some("inaccurate".into());
        assert_eq!(r.effective_location_status(), "inaccurate");
    }

    #[test]
    fn test_row_deserialize_minimal() {
        let json = r#"{
            "user": "u1", "client": "android", "timestamp": "2012-01-01 00:00:00",
            "timezone": "UTC", "survey_id": "s1", "prompt_id": "p1"
        }"#;
        let r: ResponseRow = serde_json::from_str(json).unwrap();
        assert_eq!(r.prompt_id, "p1");
        assert!(r.unit.is_none());
        assert!(r.repeatable_set_iteration.is_none());
    }

    #[test]
    fn test_data_point_entry_omits_nulls() {
        let entry = DataPointEntry {
            metadata: vec![],
            label: "p1".into(),
            value: serde_json::json!(3),
            unit: None,
            timestamp: "2012-01-01 00:00:00".into(),
            tz: "UTC".into(),
            utc_timestamp: "2012-01-01 00:00:00".into(),
            location_status: "unavailable".into(),
            location: None,
            display_type: "count".into(),
            iteration: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("unit").is_none());
        assert!(json.get("location").is_none());
        assert!(json.get("iteration").is_none());
        assert_eq!(json["type"], "count");
    }
}
