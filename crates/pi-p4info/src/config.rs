//! Catalog configuration.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// What to do with dangling table references when a catalog is sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceCheck {
    /// Skip validation; references are the loader's responsibility.
    #[default]
    Off,
    /// Validate and log each dangling reference.
    Warn,
    /// Validate and refuse to seal.
    Deny,
}

impl fmt::Display for ReferenceCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferenceCheck::Off => "off",
            ReferenceCheck::Warn => "warn",
            ReferenceCheck::Deny => "deny",
        };
        write!(f, "{}", s)
    }
}

/// Catalog configuration.
///
/// Missing keys take their defaults; unknown keys are rejected.
///
/// ```
/// use pi_p4info::{CatalogConfig, ReferenceCheck};
///
/// let config = CatalogConfig::from_json_str(r#"{"reference_check": "deny"}"#).unwrap();
/// assert_eq!(config.reference_check, ReferenceCheck::Deny);
/// assert!(!config.check_match_field_consistency);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Referential validation run by `P4Info::finish`
    pub reference_check: ReferenceCheck,
    /// Also require a match field's name and bitwidth to equal the field's
    pub check_match_field_consistency: bool,
}

impl CatalogConfig {
    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        serde_json::from_str(json).map_err(|source| CatalogError::Json {
            what: "catalog config",
            source,
        })
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Strict configuration: dangling or inconsistent references fail sealing.
    pub fn strict() -> Self {
        Self {
            reference_check: ReferenceCheck::Deny,
            check_match_field_consistency: true,
        }
    }
}
