//! Engine configuration from the environment.
//!
//! A `.env` file in the working directory is loaded first when present.
//!
//! | variable | meaning |
//! |---|---|
//! | `SURVEY_RESULTS_CAMPAIGN_URN` | default campaign URN |
//! | `SURVEY_RESULTS_CAMPAIGN_NAME` | default campaign name |
//! | `SURVEY_RESULTS_CAMPAIGN_VERSION` | default campaign version |
//! | `SURVEY_RESULTS_ALLOWED_COLUMNS` | comma-separated catalog restriction |
//! | `SURVEY_RESULTS_PRETTY` | pretty-print JSON by default |
//! | `SURVEY_RESULTS_STRICT_ORDER` | fail on non-contiguous input |

use std::env;

use crate::catalog::ColumnCatalog;
use crate::error::ColumnResult;
use crate::logs::log_warning;
use crate::models::CampaignIdentity;

pub const ENV_CAMPAIGN_URN: &str = "SURVEY_RESULTS_CAMPAIGN_URN";
pub const ENV_CAMPAIGN_NAME: &str = "SURVEY_RESULTS_CAMPAIGN_NAME";
pub const ENV_CAMPAIGN_VERSION: &str = "SURVEY_RESULTS_CAMPAIGN_VERSION";
pub const ENV_ALLOWED_COLUMNS: &str = "SURVEY_RESULTS_ALLOWED_COLUMNS";
pub const ENV_PRETTY: &str = "SURVEY_RESULTS_PRETTY";
pub const ENV_STRICT_ORDER: &str = "SURVEY_RESULTS_STRICT_ORDER";

/// Deployment-level defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub campaign: CampaignIdentity,
    pub catalog: ColumnCatalog,
    pub pretty_print: bool,
    pub strict_order: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            campaign: CampaignIdentity::default(),
            catalog: ColumnCatalog::standard(),
            pretty_print: false,
            strict_order: false,
        }
    }
}

impl EngineConfig {
    /// Read configuration from `.env` and the process environment.
    pub fn from_env() -> ColumnResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// An allowed-column list that is set but names no column is a fatal
    /// configuration error.
    pub fn from_lookup<F>(lookup: F) -> ColumnResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let catalog = match lookup(ENV_ALLOWED_COLUMNS).filter(|v| !v.trim().is_empty()) {
            None => ColumnCatalog::standard(),
            Some(list) => {
                let urns: Vec<&str> = list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
                ColumnCatalog::from_urns(urns.as_slice())?
            }
        };

        Ok(Self {
            campaign: CampaignIdentity {
                urn: non_empty(ENV_CAMPAIGN_URN),
                name: non_empty(ENV_CAMPAIGN_NAME),
                version: non_empty(ENV_CAMPAIGN_VERSION),
            },
            catalog,
            pretty_print: flag(ENV_PRETTY, lookup(ENV_PRETTY)),
            strict_order: flag(ENV_STRICT_ORDER, lookup(ENV_STRICT_ORDER)),
        })
    }
}

/// Boolean variable; unrecognized values count as false.
fn flag(key: &str, value: Option<String>) -> bool {
    let Some(value) = value else {
        return false;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "" | "0" | "false" | "no" | "off" => false,
        other => {
            log_warning(format!("{}: unrecognized boolean '{}', using false", key, other));
            false
        }
    }
}
