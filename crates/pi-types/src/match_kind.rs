//! Match kinds of table key fields.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison semantics applied to a field within a table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Header validity bit.
    Valid,
    /// Exact value match.
    Exact,
    /// Longest-prefix match.
    Lpm,
    /// Value and mask.
    Ternary,
    /// Inclusive low/high bounds.
    Range,
    /// Exact match or wildcard.
    Optional,
}

impl MatchKind {
    /// Every match kind, in declaration order.
    pub const ALL: [MatchKind; 6] = [
        MatchKind::Valid,
        MatchKind::Exact,
        MatchKind::Lpm,
        MatchKind::Ternary,
        MatchKind::Range,
        MatchKind::Optional,
    ];

    /// Returns the lowercase name used in configuration files.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Valid => "valid",
            MatchKind::Exact => "exact",
            MatchKind::Lpm => "lpm",
            MatchKind::Ternary => "ternary",
            MatchKind::Range => "range",
            MatchKind::Optional => "optional",
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "valid" => Ok(MatchKind::Valid),
            "exact" => Ok(MatchKind::Exact),
            "lpm" | "longest_prefix_match" => Ok(MatchKind::Lpm),
            "ternary" => Ok(MatchKind::Ternary),
            "range" => Ok(MatchKind::Range),
            "optional" => Ok(MatchKind::Optional),
            _ => Err(ParseError::InvalidMatchKind(s.to_string())),
        }
    }
}
