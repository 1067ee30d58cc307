//! Registry lifecycle.

use std::fmt;

use crate::error::{CatalogError, CatalogResult, ResourceKind};

/// Lifecycle state shared by the field, action and table registries.
///
/// ```text
/// Uninitialized --init--> Building --finish--> Populated
///       ^                    |                     |
///       |                    +------free-----------+--> Freed --init--> Building
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegistryState {
    /// Never initialized.
    #[default]
    Uninitialized,
    /// Accepting `add*` calls.
    Building,
    /// Sealed and read-only; accepting queries.
    Populated,
    /// Storage released; may be initialized again.
    Freed,
}

impl RegistryState {
    pub(crate) fn ensure_can_init(self, registry: ResourceKind) -> CatalogResult<()> {
        match self {
            RegistryState::Uninitialized | RegistryState::Freed => Ok(()),
            state => Err(CatalogError::InvalidState {
                registry,
                state,
                operation: "init",
            }),
        }
    }

    pub(crate) fn ensure_building(
        self,
        registry: ResourceKind,
        operation: &'static str,
    ) -> CatalogResult<()> {
        if self == RegistryState::Building {
            Ok(())
        } else {
            Err(CatalogError::InvalidState {
                registry,
                state: self,
                operation,
            })
        }
    }

    pub(crate) fn ensure_populated(self, registry: ResourceKind) -> CatalogResult<()> {
        if self == RegistryState::Populated {
            Ok(())
        } else {
            Err(CatalogError::InvalidState {
                registry,
                state: self,
                operation: "query",
            })
        }
    }

    pub(crate) fn ensure_can_free(self, registry: ResourceKind) -> CatalogResult<()> {
        if self == RegistryState::Uninitialized {
            Err(CatalogError::InvalidState {
                registry,
                state: self,
                operation: "free",
            })
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for RegistryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegistryState::Uninitialized => "uninitialized",
            RegistryState::Building => "building",
            RegistryState::Populated => "populated",
            RegistryState::Freed => "freed",
        };
        write!(f, "{}", s)
    }
}
