//! Legacy per-row grouping: attach each group's metadata to its data entries.
//!
//! Rows are grouped by (survey id, UTC timestamp). Rows whose display type is
//! `metadata` contribute a compact [`MetadataItem`] to their group; every
//! other row becomes one [`DataPointEntry`]. An entry must end up carrying
//! the group's complete metadata list, including items that appear after the
//! entry in the input.
//!
//! Metadata lists live in an arena indexed by group id. Entries are built as
//! [`PendingEntry`] values carrying only the group id and are resolved once
//! the whole input has been consumed.

use serde_json::Value;
use std::cmp::Ordering;

use crate::error::TimeResult;
use crate::models::{DataPointEntry, MetadataItem, ResponseRow, LOCATION_UNAVAILABLE};
use crate::transform::embedded::{location_object, typed_value};
use crate::transform::time::to_utc;

/// Entry waiting for its group's metadata list.
#[derive(Debug)]
struct PendingEntry {
    group: usize,
    label: String,
    value: Value,
    unit: Option<String>,
    timestamp: String,
    tz: String,
    utc_timestamp: String,
    location_status: String,
    location: Option<Value>,
    display_type: String,
    iteration: Option<i64>,
}

impl PendingEntry {
    fn resolve(self, metadata: Vec<MetadataItem>) -> DataPointEntry {
        DataPointEntry {
            metadata,
            label: self.label,
            value: self.value,
            unit: self.unit,
            timestamp: self.timestamp,
            tz: self.tz,
            utc_timestamp: self.utc_timestamp,
            location_status: self.location_status,
            location: self.location,
            display_type: self.display_type,
            iteration: self.iteration,
        }
    }
}

/// Arena of metadata lists, one per (survey id, UTC timestamp) group.
#[derive(Debug, Default)]
pub struct MetadataAttacher {
    groups: Vec<Vec<MetadataItem>>,
    pending: Vec<PendingEntry>,
    current: Option<(String, String)>,
}

impl MetadataAttacher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one row. Rows must arrive sorted by (survey id, UTC timestamp).
    pub fn push(&mut self, row: &ResponseRow) -> TimeResult<()> {
        let utc_timestamp = to_utc(&row.timestamp, &row.timezone)?;
        let group = self.group_for(&row.survey_id, &utc_timestamp);

        if row.is_metadata() {
            self.groups[group].push(MetadataItem {
                id: row.prompt_id.clone(),
                prompt_type: row.prompt_type.clone(),
                value: typed_value(&row.display_value),
            });
            return Ok(());
        }

        let location_status = row.effective_location_status().to_string();
        let location = if location_status == LOCATION_UNAVAILABLE {
            None
        } else {
            location_object(row.location.as_deref())
        };

        self.pending.push(PendingEntry {
            group,
            label: row.prompt_id.clone(),
            value: typed_value(&row.display_value),
            unit: row.unit.clone(),
            timestamp: row.timestamp.clone(),
            tz: row.timezone.clone(),
            utc_timestamp,
            location_status,
            location,
            display_type: row.display_type.clone(),
            iteration: row.repeatable_set_iteration,
        });
        Ok(())
    }

    /// Group id for this row, opening a fresh empty list when the group changes.
    fn group_for(&mut self, survey_id: &str, utc_timestamp: &str) -> usize {
        let same = matches!(
            &self.current,
            Some((s, u)) if s == survey_id && u == utc_timestamp
        );
        if !same || self.groups.is_empty() {
            self.groups.push(Vec::new());
            self.current = Some((survey_id.to_string(), utc_timestamp.to_string()));
        }
        self.groups.len() - 1
    }

    /// Number of groups opened so far.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Attach the final metadata lists and return entries in input order.
    pub fn finish(self) -> Vec<DataPointEntry> {
        let groups = self.groups;
        self.pending
            .into_iter()
            .map(|entry| {
                let metadata = groups.get(entry.group).cloned().unwrap_or_default();
                entry.resolve(metadata)
            })
            .collect()
    }
}

/// Run the attacher over a whole row sequence.
pub fn attach(rows: &[ResponseRow]) -> TimeResult<Vec<DataPointEntry>> {
    let mut attacher = MetadataAttacher::new();
    for row in rows {
        attacher.push(row)?;
    }
    Ok(attacher.finish())
}

/// Stable sort by (survey id, UTC timestamp, display type).
pub fn sort_rows(rows: Vec<ResponseRow>) -> TimeResult<Vec<ResponseRow>> {
    let mut keyed = rows
        .into_iter()
        .map(|row| -> TimeResult<(String, ResponseRow)> {
            Ok((to_utc(&row.timestamp, &row.timezone)?, row))
        })
        .collect::<TimeResult<Vec<_>>>()?;

    keyed.sort_by(|(utc_a, a), (utc_b, b)| compare(a, utc_a, b, utc_b));
    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

fn compare(a: &ResponseRow, utc_a: &str, b: &ResponseRow, utc_b: &str) -> Ordering {
    a.survey_id
        .cmp(&b.survey_id)
        .then_with(|| utc_a.cmp(utc_b))
        .then_with(|| a.display_type.cmp(&b.display_type))
}
