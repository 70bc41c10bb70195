//! Squash flat response rows into survey instances.
//!
//! Storage returns one row per answered prompt. Consecutive rows sharing a
//! [`SurveyInstanceKey`] are one submission and become one [`SurveyInstance`].
//!
//! ```text
//! Rows (sorted)                         Instances
//! ┌───────────────────────────┐        ┌──────────────────────────┐
//! │ u1, s1, 10:00, p1 = 3     │        │ u1, s1, 10:00            │
//! │ u1, s1, 10:00, p2 = ok    │   →    │ { p1: 3, p2: ok }        │
//! │ u2, s1, 10:05, p1 = 5     │        ├──────────────────────────┤
//! └───────────────────────────┘        │ u2, s1, 10:05 { p1: 5 }  │
//!                                      └──────────────────────────┘
//! ```
//!
//! # Sort-order precondition
//!
//! Rows must arrive ordered by (user, instance key, prompt id). The grouper
//! does not sort and cannot tell when the order is wrong: a key that
//! reappears later simply opens another, smaller instance. Callers that want
//! a hard failure instead run [`crate::validation::check_contiguous`] first.

use std::collections::HashMap;

use crate::error::TimeResult;
use crate::models::{ResponseRow, SurveyInstance, SurveyInstanceKey};
use crate::transform::embedded::flatten_location;
use crate::transform::time::to_utc;

/// Group pre-sorted rows into instances in a single pass.
///
/// Fails only if a timestamp cannot be normalized to UTC.
pub fn group_instances(rows: &[ResponseRow]) -> TimeResult<Vec<SurveyInstance>> {
    let mut instances = Vec::new();
    let mut current: Option<InstanceBuilder> = None;

    for row in rows {
        match current.as_mut() {
            Some(builder) if row.matches_key(builder.key()) => builder.add_prompt(row),
            _ => {
                if let Some(done) = current.take() {
                    instances.push(done.build());
                }
                let mut builder = InstanceBuilder::new(row)?;
                builder.add_prompt(row);
                current = Some(builder);
            }
        }
    }

    if let Some(done) = current {
        instances.push(done.build());
    }

    Ok(instances)
}

/// Seed an instance, without prompts, from the metadata fields of `row`.
pub fn instance_from_row(row: &ResponseRow) -> TimeResult<SurveyInstance> {
    let location_status = row.effective_location_status().to_string();
    let location = flatten_location(&location_status, row.location.as_deref());

    Ok(SurveyInstance {
        key: row.instance_key(),
        client: row.client.clone(),
        timezone: row.timezone.clone(),
        utc_timestamp: to_utc(&row.timestamp, &row.timezone)?,
        survey_title: row.survey_title.clone(),
        survey_description: row.survey_description.clone(),
        privacy_state: row.privacy_state.clone(),
        location_status,
        location,
        launch_context: row.launch_context.clone(),
        prompts: HashMap::new(),
    })
}

/// Accumulates the prompts of one instance while grouping.
struct InstanceBuilder {
    instance: SurveyInstance,
}

impl InstanceBuilder {
    fn new(row: &ResponseRow) -> TimeResult<Self> {
        Ok(Self {
            instance: instance_from_row(row)?,
        })
    }

    fn key(&self) -> &SurveyInstanceKey {
        &self.instance.key
    }

    /// A later row with the same prompt id overwrites the earlier answer.
    fn add_prompt(&mut self, row: &ResponseRow) {
        self.instance
            .prompts
            .insert(row.prompt_id.clone(), row.prompt_value());
    }

    fn build(self) -> SurveyInstance {
        self.instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimeError;

    fn row(user: &str, ts: &str, survey: &str, prompt: &str, value: &str) -> ResponseRow {
        ResponseRow {
            user: user.into(),
            client: "android".into(),
            timestamp: ts.into(),
            timezone: "America/Los_Angeles".into(),
            survey_id: survey.into(),
            prompt_id: prompt.into(),
            prompt_type: "number".into(),
            display_value: value.into(),
            ..Default::default()
        }
    }

    const T1: &str = "2012-01-01 00:00:00";
    const T2: &str = "2012-01-02 00:00:00";

    #[test]
    fn test_empty_input() {
        assert!(group_instances(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_groups_consecutive_rows() {
        let rows = vec![
            row("u1", T1, "s1", "p1", "3"),
            row("u1", T1, "s1", "p2", "ok"),
            row("u2", T1, "s1", "p1", "5"),
        ];
        let instances = group_instances(&rows).unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].key.user, "u1");
        assert_eq!(instances[0].prompts.len(), 2);
        assert_eq!(instances[0].prompt("p2").unwrap().value, "ok");
        assert_eq!(instances[1].key.user, "u2");
        assert!(instances[1].prompt("p2").is_none());
    }

    #[test]
    fn test_instance_count_equals_key_boundaries() {
        let rows = vec![
            row("u1", T1, "s1", "p1", "1"),
            row("u1", T2, "s1", "p1", "2"),
            row("u1", T2, "s2", "p1", "3"),
            row("u1", T2, "s2", "p2", "4"),
            row("u2", T2, "s2", "p1", "5"),
        ];
        let boundaries = 1 + rows
            .windows(2)
            .filter(|w| w[0].instance_key() != w[1].instance_key())
            .count();
        assert_eq!(group_instances(&rows).unwrap().len(), boundaries);
        assert_eq!(boundaries, 4);
    }

    #[test]
    fn test_repeatable_set_iterations_split_instances() {
        let mut a = row("u1", T1, "s1", "p1", "1");
        a.repeatable_set_id = Some("rs".into());
        a.repeatable_set_iteration = Some(0);
        let mut b = a.clone();
        b.repeatable_set_iteration = Some(1);

        let instances = group_instances(&[a, b]).unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[1].key.repeatable_set_iteration, Some(1));
    }

    #[test]
    fn test_metadata_comes_from_first_row() {
        let mut first = row("u1", T1, "s1", "p1", "1");
        first.client = "first".into();
        first.location = Some(r#"{"latitude": 1.0, "longitude": 2.0}"#.into());
        let mut second = row("u1", T1, "s1", "p2", "2");
        second.client = "second".into();

        let instances = group_instances(&[first, second]).unwrap();
        assert_eq!(instances[0].client, "first");
        assert_eq!(instances[0].location_status, "valid");
        assert_eq!(instances[0].location.latitude, Some(1.0));
        assert_eq!(instances[0].utc_timestamp, "2012-01-01 08:00:00");
    }

    #[test]
    fn test_duplicate_prompt_overwrites() {
        let rows = vec![row("u1", T1, "s1", "p1", "old"), row("u1", T1, "s1", "p1", "new")];
        let instances = group_instances(&rows).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].prompt("p1").unwrap().value, "new");
    }

    #[test]
    fn test_unsorted_input_silently_splits() {
        // Inherited behavior: no sort, no detection.
        let rows = vec![
            row("u1", T1, "s1", "p1", "1"),
            row("u2", T1, "s1", "p1", "2"),
            row("u1", T1, "s1", "p2", "3"),
        ];
        let instances = group_instances(&rows).unwrap();
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[0].key, instances[2].key);
    }

    #[test]
    fn test_unknown_timezone_fails() {
        let mut r = row("u1", T1, "s1", "p1", "1");
        r.timezone = "Nowhere/Special".into();
        assert!(matches!(group_instances(&[r]), Err(TimeError::UnknownTimezone(_))));
    }
}
