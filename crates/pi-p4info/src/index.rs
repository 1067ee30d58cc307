//! Id and name indexes shared by the registries.

use pi_types::P4Id;

use crate::error::{CatalogError, CatalogResult, ResourceKind};
use crate::id_map::SparseIdMap;
use crate::name_map::NameMap;

/// Pairs a [`SparseIdMap`] (id to storage slot) with a [`NameMap`]
/// (name to id) for one resource kind.
///
/// Both indexes are updated together by [`ResourceIndex::register`] after
/// [`ResourceIndex::check_new`] has verified that neither the id nor the
/// name is taken, so a rejected add leaves both untouched.
#[derive(Debug, Clone)]
pub(crate) struct ResourceIndex {
    kind: ResourceKind,
    by_id: SparseIdMap<P4Id>,
    by_name: NameMap<P4Id>,
}

impl ResourceIndex {
    pub(crate) fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            by_id: SparseIdMap::new(),
            by_name: NameMap::new(),
        }
    }

    /// Creates an index sized for `capacity` resources.
    pub(crate) fn try_with_capacity(kind: ResourceKind, capacity: usize) -> CatalogResult<Self> {
        let mut by_name = NameMap::new();
        by_name
            .try_reserve(capacity)
            .map_err(|source| CatalogError::ResourceExhausted {
                kind,
                requested: capacity,
                source,
            })?;
        Ok(Self {
            kind,
            by_id: SparseIdMap::with_capacity(capacity),
            by_name,
        })
    }

    pub(crate) fn check_new(&self, id: P4Id, name: &str) -> CatalogResult<()> {
        if self.by_id.contains_key(id) {
            return Err(CatalogError::IdAlreadyExists {
                kind: self.kind,
                id,
            });
        }
        if self.by_name.contains(name) {
            return Err(CatalogError::NameAlreadyExists {
                kind: self.kind,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn register(&mut self, id: P4Id, name: &str, slot: usize) -> CatalogResult<()> {
        self.check_new(id, name)?;
        self.by_name
            .insert(name, id)
            .map_err(|dup| CatalogError::NameAlreadyExists {
                kind: self.kind,
                name: dup.0,
            })?;
        self.by_id
            .insert(id, slot)
            .map_err(|_| CatalogError::IdAlreadyExists {
                kind: self.kind,
                id,
            })
    }

    pub(crate) fn slot(&self, id: P4Id) -> CatalogResult<usize> {
        self.by_id
            .get(id)
            .ok_or_else(|| CatalogError::id_not_found(self.kind, id))
    }

    pub(crate) fn id_of(&self, name: &str) -> CatalogResult<P4Id> {
        self.by_name
            .get(name)
            .ok_or_else(|| CatalogError::name_not_found(self.kind, name))
    }

    /// Slots in ascending id order.
    pub(crate) fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_id.iter().map(|(_, slot)| slot)
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.by_id.memory_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_and_resolve() {
        let mut index = ResourceIndex::new(ResourceKind::Field);
        index.register(P4Id::new(5), "f5", 0).unwrap();
        index.register(P4Id::new(2), "f2", 1).unwrap();

        assert_eq!(index.slot(P4Id::new(5)).unwrap(), 0);
        assert_eq!(index.id_of("f2").unwrap(), P4Id::new(2));
        assert_eq!(index.slots().collect::<Vec<_>>(), vec![1, 0]);
    }

    #[test]
    fn test_rejected_add_leaves_indexes_untouched() {
        let mut index = ResourceIndex::try_with_capacity(ResourceKind::Table, 2).unwrap();
        index.register(P4Id::new(1), "t1", 0).unwrap();

        // Same name under a new id must not leak the new id into the id map.
        let err = index.register(P4Id::new(2), "t1", 1).unwrap_err();
        assert!(matches!(err, CatalogError::NameAlreadyExists { .. }));
        assert!(index.slot(P4Id::new(2)).is_err());

        let err = index.register(P4Id::new(1), "t9", 1).unwrap_err();
        assert!(matches!(err, CatalogError::IdAlreadyExists { .. }));
        assert!(index.id_of("t9").is_err());
    }
}
