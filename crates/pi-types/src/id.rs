//! P4 resource identifier.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a P4 resource (field, action, table, counter, ...).
///
/// Identifiers are assigned by the program loader and are unique within
/// their resource kind. They are not required to be contiguous or to be
/// issued in sorted order; the catalog never allocates or revokes them.
///
/// # Examples
///
/// ```
/// use pi_types::P4Id;
///
/// let id = P4Id::new(0x0100_0001);
/// assert_eq!(id.as_u32(), 0x0100_0001);
/// assert_eq!("0x01000001".parse::<P4Id>().unwrap(), id);
/// assert_eq!("16777217".parse::<P4Id>().unwrap(), id);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct P4Id(u32);

impl P4Id {
    /// Creates an identifier from its raw value.
    pub const fn new(raw: u32) -> Self {
        P4Id(raw)
    }

    /// Returns the raw identifier value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for P4Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::LowerHex for P4Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl FromStr for P4Id {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => s.parse::<u32>(),
        };
        parsed
            .map(P4Id)
            .map_err(|_| ParseError::InvalidId(s.to_string()))
    }
}

impl From<u32> for P4Id {
    fn from(raw: u32) -> Self {
        P4Id(raw)
    }
}

impl From<P4Id> for u32 {
    fn from(id: P4Id) -> u32 {
        id.0
    }
}
