//! Output column catalog.
//!
//! Every wire token the engine understands lives here: the fixed metadata
//! columns ([`ColumnKey`]), the prompt-id prefix and the two wildcards.
//!
//! ```text
//! requested tokens                     resolved columns
//! ┌─────────────────────────────┐      ┌──────────────────────────────┐
//! │ urn:ohmage:user:id          │      │ Metadata(UserId)             │
//! │ urn:ohmage:prompt:response  │  →   │ Prompt("p1")                 │
//! └─────────────────────────────┘      │ Prompt("p2")   (seen in rows)│
//!                                      └──────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ColumnError, ColumnResult};
use crate::models::ResponseRow;

/// Prefix of dynamic prompt columns.
pub const PROMPT_ID_PREFIX: &str = "urn:ohmage:prompt:id:";

/// Catalog-driven wildcard: every allowed column plus every prompt present.
pub const SPECIAL_ALL: &str = "urn:ohmage:special:all";

/// Data-driven wildcard: every prompt id actually present in the rows.
pub const PROMPT_RESPONSE: &str = "urn:ohmage:prompt:response";

// =============================================================================
// Column Keys
// =============================================================================

/// Fixed metadata columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKey {
    UserId,
    ContextClient,
    ContextTimestamp,
    ContextTimezone,
    ContextUtcTimestamp,
    ContextLaunchContextLong,
    ContextLaunchContextShort,
    LocationStatus,
    LocationLatitude,
    LocationLongitude,
    LocationTimestamp,
    LocationAccuracy,
    LocationProvider,
    SurveyId,
    SurveyTitle,
    SurveyDescription,
    SurveyPrivacyState,
    RepeatableSetId,
    RepeatableSetIteration,
    CampaignName,
    CampaignVersion,
}

impl ColumnKey {
    /// Every metadata column, in catalog order.
    pub const ALL: [ColumnKey; 21] = [
        ColumnKey::UserId,
        ColumnKey::ContextClient,
        ColumnKey::ContextTimestamp,
        ColumnKey::ContextTimezone,
        ColumnKey::ContextUtcTimestamp,
        ColumnKey::ContextLaunchContextLong,
        ColumnKey::ContextLaunchContextShort,
        ColumnKey::LocationStatus,
        ColumnKey::LocationLatitude,
        ColumnKey::LocationLongitude,
        ColumnKey::LocationTimestamp,
        ColumnKey::LocationAccuracy,
        ColumnKey::LocationProvider,
        ColumnKey::SurveyId,
        ColumnKey::SurveyTitle,
        ColumnKey::SurveyDescription,
        ColumnKey::SurveyPrivacyState,
        ColumnKey::RepeatableSetId,
        ColumnKey::RepeatableSetIteration,
        ColumnKey::CampaignName,
        ColumnKey::CampaignVersion,
    ];

    /// Wire token (URN) of this column.
    pub fn urn(&self) -> &'static str {
        match self {
            Self::UserId => "urn:ohmage:user:id",
            Self::ContextClient => "urn:ohmage:context:client",
            Self::ContextTimestamp => "urn:ohmage:context:timestamp",
            Self::ContextTimezone => "urn:ohmage:context:timezone",
            Self::ContextUtcTimestamp => "urn:ohmage:context:utc_timestamp",
            Self::ContextLaunchContextLong => "urn:ohmage:context:launch_context_long",
            Self::ContextLaunchContextShort => "urn:ohmage:context:launch_context_short",
            Self::LocationStatus => "urn:ohmage:context:location:status",
            Self::LocationLatitude => "urn:ohmage:context:location:latitude",
            Self::LocationLongitude => "urn:ohmage:context:location:longitude",
            Self::LocationTimestamp => "urn:ohmage:context:location:timestamp",
            Self::LocationAccuracy => "urn:ohmage:context:location:accuracy",
            Self::LocationProvider => "urn:ohmage:context:location:provider",
            Self::SurveyId => "urn:ohmage:survey:id",
            Self::SurveyTitle => "urn:ohmage:survey:title",
            Self::SurveyDescription => "urn:ohmage:survey:description",
            Self::SurveyPrivacyState => "urn:ohmage:survey:privacy_state",
            Self::RepeatableSetId => "urn:ohmage:repeatable_set:id",
            Self::RepeatableSetIteration => "urn:ohmage:repeatable_set:iteration",
            Self::CampaignName => "urn:ohmage:campaign:name",
            Self::CampaignVersion => "urn:ohmage:campaign:version",
        }
    }

    /// Parse a URN into a column key.
    pub fn from_urn(urn: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.urn() == urn)
    }

    /// Record key used by the row-based JSON output.
    pub fn row_key(&self) -> &'static str {
        match self {
            Self::UserId => "user",
            Self::ContextClient => "client",
            Self::ContextTimestamp => "timestamp",
            Self::ContextTimezone => "timezone",
            Self::ContextUtcTimestamp => "utc_timestamp",
            Self::ContextLaunchContextLong => "launch_context_long",
            Self::ContextLaunchContextShort => "launch_context_short",
            Self::LocationStatus => "location_status",
            Self::LocationLatitude => "latitude",
            Self::LocationLongitude => "longitude",
            Self::LocationTimestamp => "location_timestamp",
            Self::LocationAccuracy => "location_accuracy",
            Self::LocationProvider => "location_provider",
            Self::SurveyId => "survey_id",
            Self::SurveyTitle => "survey_title",
            Self::SurveyDescription => "survey_description",
            Self::SurveyPrivacyState => "privacy_state",
            Self::RepeatableSetId => "repeatable_set_id",
            Self::RepeatableSetIteration => "repeatable_set_iteration",
            Self::CampaignName => "campaign_name",
            Self::CampaignVersion => "campaign_version",
        }
    }
}

// =============================================================================
// Output Column Spec
// =============================================================================

/// A resolved output column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OutputColumnSpec {
    /// Fixed metadata field from the catalog.
    Metadata(ColumnKey),
    /// Answer to the prompt with this id.
    Prompt(String),
}

impl OutputColumnSpec {
    /// Column name as it appears on the wire.
    pub fn name(&self) -> String {
        match self {
            Self::Metadata(key) => key.urn().to_string(),
            Self::Prompt(id) => format!("{}{}", PROMPT_ID_PREFIX, id),
        }
    }

    /// Prompt id if this is a prompt column.
    pub fn prompt_id(&self) -> Option<&str> {
        match self {
            Self::Prompt(id) => Some(id),
            Self::Metadata(_) => None,
        }
    }

    /// Abbreviated header used by CSV output when short headers are requested.
    pub fn short_name(&self) -> String {
        match self {
            Self::Prompt(id) => id.clone(),
            Self::Metadata(key) => {
                let urn = key.urn();
                if let Some(rest) = urn.strip_prefix("urn:ohmage:context:") {
                    format!("sys:{}", rest)
                } else {
                    urn.trim_start_matches("urn:ohmage:").to_string()
                }
            }
        }
    }
}

// =============================================================================
// Column Catalog
// =============================================================================

/// The metadata columns a deployment allows clients to request.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnCatalog {
    allowed: Vec<ColumnKey>,
}

impl ColumnCatalog {
    /// Build a catalog. An empty list is a fatal configuration error.
    pub fn new(allowed: Vec<ColumnKey>) -> ColumnResult<Self> {
        if allowed.is_empty() {
            return Err(ColumnError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        let allowed = allowed.into_iter().filter(|k| seen.insert(*k)).collect();
        Ok(Self { allowed })
    }

    /// Catalog containing every known metadata column.
    pub fn standard() -> Self {
        Self {
            allowed: ColumnKey::ALL.to_vec(),
        }
    }

    /// Build a catalog from URN tokens (e.g. from configuration).
    pub fn from_urns<S: AsRef<str>>(urns: &[S]) -> ColumnResult<Self> {
        let keys = urns
            .iter()
            .map(|u| {
                let u = u.as_ref().trim();
                ColumnKey::from_urn(u).ok_or_else(|| ColumnError::UnknownToken(u.to_string()))
            })
            .collect::<ColumnResult<Vec<_>>>()?;
        Self::new(keys)
    }

    /// Allowed columns, in catalog order.
    pub fn columns(&self) -> &[ColumnKey] {
        &self.allowed
    }

    /// Whether `key` may be requested.
    pub fn allows(&self, key: ColumnKey) -> bool {
        self.allowed.contains(&key)
    }

    /// Resolve requested tokens into concrete columns.
    ///
    /// Wildcards are expanded here, strictly before pivoting. [`SPECIAL_ALL`]
    /// is only recognized as the first token; anywhere else it is an unknown
    /// token. The result never contains the same column twice, so resolving an
    /// already-resolved list yields the same list.
    pub fn resolve<S: AsRef<str>>(
        &self,
        tokens: &[S],
        rows: &[ResponseRow],
    ) -> ColumnResult<Vec<OutputColumnSpec>> {
        let mut resolved: Vec<OutputColumnSpec> = Vec::new();
        let mut seen: HashSet<OutputColumnSpec> = HashSet::new();
        let mut push = |spec: OutputColumnSpec, out: &mut Vec<OutputColumnSpec>| {
            if seen.insert(spec.clone()) {
                out.push(spec);
            }
        };

        let catalog_all = tokens
            .first()
            .is_some_and(|t| t.as_ref() == SPECIAL_ALL);

        if catalog_all {
            for key in &self.allowed {
                push(OutputColumnSpec::Metadata(*key), &mut resolved);
            }
            for id in prompt_ids_present(rows) {
                push(OutputColumnSpec::Prompt(id), &mut resolved);
            }
        }

        let rest = if catalog_all { &tokens[1..] } else { tokens };
        for token in rest {
            let token = token.as_ref();
            if token == PROMPT_RESPONSE {
                for id in prompt_ids_present(rows) {
                    push(OutputColumnSpec::Prompt(id), &mut resolved);
                }
                continue;
            }
            push(self.parse_token(token)?, &mut resolved);
        }

        Ok(resolved)
    }

    /// Parse one non-wildcard token.
    pub fn parse_token(&self, token: &str) -> ColumnResult<OutputColumnSpec> {
        if let Some(id) = token.strip_prefix(PROMPT_ID_PREFIX) {
            if id.is_empty() {
                return Err(ColumnError::UnknownToken(token.to_string()));
            }
            return Ok(OutputColumnSpec::Prompt(id.to_string()));
        }
        let key = ColumnKey::from_urn(token).ok_or_else(|| ColumnError::UnknownToken(token.to_string()))?;
        if !self.allows(key) {
            return Err(ColumnError::NotAllowed(token.to_string()));
        }
        Ok(OutputColumnSpec::Metadata(key))
    }
}

impl Default for ColumnCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Distinct prompt ids in `rows`, in first-seen order.
pub fn prompt_ids_present(rows: &[ResponseRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|r| seen.insert(r.prompt_id.as_str()))
        .map(|r| r.prompt_id.clone())
        .collect()
}

/// Wire names of resolved columns.
pub fn column_names(columns: &[OutputColumnSpec]) -> Vec<String> {
    columns.iter().map(OutputColumnSpec::name).collect()
}

// =============================================================================
// Tests
// =============================================================================
