//! Error types for catalog operations.
//!
//! Every misuse the catalog can detect (unknown ids or names, duplicate
//! insertion, out-of-range positions, queries before the registry is
//! sealed) is reported as a typed [`CatalogError`] instead of returning
//! stale or garbage data.

use std::collections::TryReserveError;
use std::fmt;
use std::io;

use pi_types::P4Id;
use thiserror::Error;

use crate::state::RegistryState;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Kind of catalog resource an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Field,
    Action,
    ActionParam,
    Table,
    MatchField,
    TableAction,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Field => "field",
            ResourceKind::Action => "action",
            ResourceKind::ActionParam => "action param",
            ResourceKind::Table => "table",
            ResourceKind::MatchField => "match field",
            ResourceKind::TableAction => "table action",
        };
        write!(f, "{}", s)
    }
}

/// A table reference to a field or action that the catalog does not hold,
/// or that disagrees with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    /// The referencing table.
    pub table: P4Id,
    /// Kind of the referenced resource.
    pub kind: ResourceKind,
    /// The referenced id.
    pub id: P4Id,
    /// What is wrong with the reference.
    pub problem: ReferenceProblem,
}

/// Why a table reference failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceProblem {
    /// The referenced id was never added.
    Missing,
    /// The match field's copy of the field name differs from the Field Registry.
    NameMismatch { expected: String, actual: String },
    /// The match field's copy of the bitwidth differs from the Field Registry.
    BitwidthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table {} references {} id {}", self.table, self.kind, self.id)?;
        match &self.problem {
            ReferenceProblem::Missing => write!(f, " which does not exist"),
            ReferenceProblem::NameMismatch { expected, actual } => {
                write!(f, " as '{}' but it is named '{}'", actual, expected)
            }
            ReferenceProblem::BitwidthMismatch { expected, actual } => {
                write!(f, " as bit<{}> but it is bit<{}>", actual, expected)
            }
        }
    }
}

/// Errors that can occur while building or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No resource with this id was added.
    #[error("{kind} id {id} not found")]
    IdNotFound { kind: ResourceKind, id: P4Id },

    /// No resource with this name was added.
    #[error("{kind} '{name}' not found")]
    NameNotFound { kind: ResourceKind, name: String },

    /// No member with this name was added to the owning resource.
    #[error("{kind} '{name}' not found in {owner}")]
    MemberNameNotFound {
        kind: ResourceKind,
        owner: P4Id,
        name: String,
    },

    /// A resource with this id was already added.
    #[error("{kind} id {id} already exists")]
    IdAlreadyExists { kind: ResourceKind, id: P4Id },

    /// A resource with this name was already added in the same scope.
    #[error("{kind} '{name}' already exists")]
    NameAlreadyExists { kind: ResourceKind, name: String },

    /// A positional index is outside the owner's declared list.
    #[error("{kind} index {index} out of range for {owner} (len {len})")]
    IndexOutOfRange {
        kind: ResourceKind,
        owner: P4Id,
        index: usize,
        len: usize,
    },

    /// A positional slot was already filled.
    #[error("{kind} index {index} of {owner} already added")]
    PositionTaken {
        kind: ResourceKind,
        owner: P4Id,
        index: usize,
    },

    /// More members were added than the owner declared.
    #[error("{kind} list of {owner} is full ({declared} declared)")]
    ListFull {
        kind: ResourceKind,
        owner: P4Id,
        declared: usize,
    },

    /// The same field or action was added twice to one table.
    #[error("{kind} {member} already added to table {table}")]
    DuplicateMember {
        kind: ResourceKind,
        table: P4Id,
        member: P4Id,
    },

    /// Bitwidths must be at least 1.
    #[error("{kind} {id} has invalid bitwidth {bitwidth}")]
    InvalidBitwidth {
        kind: ResourceKind,
        id: P4Id,
        bitwidth: usize,
    },

    /// Not every declared member was added before sealing.
    #[error("{kind} list of {owner} incomplete: {added} of {declared} added")]
    IncompletePopulation {
        kind: ResourceKind,
        owner: P4Id,
        declared: usize,
        added: usize,
    },

    /// The operation is not valid in the registry's lifecycle state.
    #[error("{registry} registry cannot {operation} while {state}")]
    InvalidState {
        registry: ResourceKind,
        state: RegistryState,
        operation: &'static str,
    },

    /// Storage for the catalog could not be allocated.
    #[error("failed to reserve storage for {requested} {kind} entries: {source}")]
    ResourceExhausted {
        kind: ResourceKind,
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    /// Referential validation found table references the catalog cannot resolve.
    #[error("{count} dangling table reference(s), first: {first}")]
    DanglingReferences {
        count: usize,
        first: DanglingReference,
    },

    /// Configuration or program description JSON could not be decoded
    /// or encoded.
    #[error("invalid {what} JSON: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration or description file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl CatalogError {
    /// Creates an id-not-found error.
    pub fn id_not_found(kind: ResourceKind, id: P4Id) -> Self {
        CatalogError::IdNotFound { kind, id }
    }

    /// Creates a name-not-found error.
    pub fn name_not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        CatalogError::NameNotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates an index-out-of-range error.
    pub fn index_out_of_range(kind: ResourceKind, owner: P4Id, index: usize, len: usize) -> Self {
        CatalogError::IndexOutOfRange {
            kind,
            owner,
            index,
            len,
        }
    }

    /// Returns true if this error is a caller contract violation rather
    /// than an environmental failure.
    pub fn is_caller_error(&self) -> bool {
        !matches!(
            self,
            CatalogError::ResourceExhausted { .. } | CatalogError::Io { .. }
        )
    }
}

/// Reserves room for `additional` more elements, mapping allocation
/// failure to [`CatalogError::ResourceExhausted`].
pub(crate) fn try_reserve<T>(
    vec: &mut Vec<T>,
    additional: usize,
    kind: ResourceKind,
) -> CatalogResult<()> {
    vec.try_reserve(additional)
        .map_err(|source| CatalogError::ResourceExhausted {
            kind,
            requested: additional,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display() {
        let err = CatalogError::id_not_found(ResourceKind::Field, P4Id::new(7));
        assert_eq!(err.to_string(), "field id 7 not found");

        let err = CatalogError::name_not_found(ResourceKind::Table, "ingress.fwd");
        assert_eq!(err.to_string(), "table 'ingress.fwd' not found");

        let err =
            CatalogError::index_out_of_range(ResourceKind::ActionParam, P4Id::new(3), 2, 2);
        assert_eq!(err.to_string(), "action param index 2 out of range for 3 (len 2)");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = CatalogError::InvalidState {
            registry: ResourceKind::Action,
            state: RegistryState::Building,
            operation: "query",
        };
        assert_eq!(err.to_string(), "action registry cannot query while building");
    }

    #[test]
    fn test_dangling_reference_display() {
        let missing = DanglingReference {
            table: P4Id::new(1),
            kind: ResourceKind::Action,
            id: P4Id::new(9),
            problem: ReferenceProblem::Missing,
        };
        assert_eq!(
            missing.to_string(),
            "table 1 references action id 9 which does not exist"
        );

        let width = DanglingReference {
            table: P4Id::new(1),
            kind: ResourceKind::Field,
            id: P4Id::new(4),
            problem: ReferenceProblem::BitwidthMismatch {
                expected: 16,
                actual: 12,
            },
        };
        assert_eq!(
            width.to_string(),
            "table 1 references field id 4 as bit<12> but it is bit<16>"
        );
    }

    #[test]
    fn test_is_caller_error() {
        assert!(CatalogError::id_not_found(ResourceKind::Table, P4Id::new(1)).is_caller_error());
        let io = CatalogError::Io {
            path: "/nonexistent".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(!io.is_caller_error());
    }

    #[test]
    fn test_try_reserve_overflow() {
        let mut v: Vec<u64> = Vec::new();
        let err = try_reserve(&mut v, usize::MAX, ResourceKind::Field).unwrap_err();
        assert!(matches!(err, CatalogError::ResourceExhausted { .. }));
        assert!(!err.is_caller_error());
    }
}
