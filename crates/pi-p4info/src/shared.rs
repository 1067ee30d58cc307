//! Atomically swappable handle to a sealed catalog.
//!
//! Readers call [`SharedP4Info::load`] and keep the returned `Arc` for as
//! long as they need a consistent view. Publishing a catalog for a new
//! program version swaps the pointer; readers holding the previous `Arc`
//! keep using it until they drop it. A published catalog is never mutated.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::error::{CatalogError, CatalogResult, ResourceKind};
use crate::p4info::P4Info;
use crate::state::RegistryState;

/// Shared, swappable reference to a sealed [`P4Info`].
#[derive(Debug)]
pub struct SharedP4Info {
    current: ArcSwap<P4Info>,
}

impl SharedP4Info {
    /// Publishes `p4info`, which must be sealed.
    pub fn new(p4info: P4Info) -> CatalogResult<Self> {
        ensure_sealed(&p4info, "publish")?;
        Ok(Self {
            current: ArcSwap::from_pointee(p4info),
        })
    }

    /// Returns the current catalog.
    pub fn load(&self) -> Arc<P4Info> {
        self.current.load_full()
    }

    /// Publishes `p4info` in place of the current catalog and returns the
    /// previous one.
    pub fn replace(&self, p4info: P4Info) -> CatalogResult<Arc<P4Info>> {
        ensure_sealed(&p4info, "publish")?;
        let previous = self.current.swap(Arc::new(p4info));
        info!(
            "Replaced P4 catalog ({} tables -> {} tables)",
            previous.tables().len(),
            self.current.load().tables().len()
        );
        Ok(previous)
    }
}

fn ensure_sealed(p4info: &P4Info, operation: &'static str) -> CatalogResult<()> {
    if p4info.is_sealed() {
        return Ok(());
    }
    let (registry, state) = [
        (ResourceKind::Field, p4info.fields().state()),
        (ResourceKind::Action, p4info.actions().state()),
        (ResourceKind::Table, p4info.tables().state()),
    ]
    .into_iter()
    .find(|(_, state)| *state != RegistryState::Populated)
    // All registries populated but the reference check failed.
    .unwrap_or((ResourceKind::Table, RegistryState::Building));
    Err(CatalogError::InvalidState {
        registry,
        state,
        operation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use pi_types::P4Id;
    use pretty_assertions::assert_eq;

    fn sealed_with_table(name: &str) -> P4Info {
        let mut p4info = P4Info::default();
        p4info.init(0, 0, 1).unwrap();
        p4info.tables_mut().add(P4Id::new(1), name, 0, 0).unwrap();
        p4info.finish().unwrap();
        p4info
    }

    #[test]
    fn test_load_and_replace() {
        let shared = SharedP4Info::new(sealed_with_table("v1")).unwrap();
        let v1 = shared.load();
        assert_eq!(v1.tables().name_from_id(P4Id::new(1)).unwrap(), "v1");

        let previous = shared.replace(sealed_with_table("v2")).unwrap();
        assert!(Arc::ptr_eq(&previous, &v1));

        // The old snapshot stays readable.
        assert_eq!(v1.tables().name_from_id(P4Id::new(1)).unwrap(), "v1");
        assert_eq!(
            shared.load().tables().name_from_id(P4Id::new(1)).unwrap(),
            "v2"
        );
    }

    #[test]
    fn test_unsealed_rejected() {
        let mut building = P4Info::new(CatalogConfig::default());
        building.init(0, 0, 0).unwrap();
        assert!(matches!(
            SharedP4Info::new(building.clone()),
            Err(CatalogError::InvalidState {
                registry: ResourceKind::Field,
                state: RegistryState::Building,
                operation: "publish",
            })
        ));

        let shared = SharedP4Info::new(sealed_with_table("v1")).unwrap();
        assert!(shared.replace(P4Info::default()).is_err());
        assert_eq!(
            shared.load().tables().name_from_id(P4Id::new(1)).unwrap(),
            "v1"
        );
    }
}
