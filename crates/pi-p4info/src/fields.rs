//! Field Registry.
//!
//! Holds every header field a P4 program can match on, keyed by id and by
//! name. Each field carries its bitwidth and the `byte0_mask` derived from
//! it at insertion time.

use pi_types::{byte0_mask, bytes_for_bitwidth, P4Id};
use tracing::{debug, trace};

use crate::error::{try_reserve, CatalogError, CatalogResult, ResourceKind};
use crate::index::ResourceIndex;
use crate::state::RegistryState;

const KIND: ResourceKind = ResourceKind::Field;

/// A header field known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    id: P4Id,
    name: String,
    bitwidth: usize,
    byte0_mask: u8,
}

impl FieldInfo {
    fn new(id: P4Id, name: &str, bitwidth: usize) -> Self {
        Self {
            id,
            name: name.to_string(),
            bitwidth,
            byte0_mask: byte0_mask(bitwidth),
        }
    }

    pub fn id(&self) -> P4Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bitwidth(&self) -> usize {
        self.bitwidth
    }

    /// Mask of the meaningful bits in the first byte of a big-endian value
    /// `ceil(bitwidth / 8)` bytes wide.
    pub fn byte0_mask(&self) -> u8 {
        self.byte0_mask
    }

    /// Width in bytes of a value for this field.
    pub fn byte_width(&self) -> usize {
        bytes_for_bitwidth(self.bitwidth)
    }
}

/// Registry of header fields.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    state: RegistryState,
    fields: Vec<FieldInfo>,
    index: ResourceIndex,
}

impl FieldRegistry {
    /// Creates an uninitialized registry.
    pub fn new() -> Self {
        Self {
            state: RegistryState::Uninitialized,
            fields: Vec::new(),
            index: ResourceIndex::new(KIND),
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// Number of fields added so far.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Prepares the registry for `num_fields` additions.
    ///
    /// Allowed on a new or freed registry. Storage for `num_fields`
    /// entries is reserved up front, so an impossible capacity fails here
    /// with [`CatalogError::ResourceExhausted`] rather than mid-population.
    pub fn init(&mut self, num_fields: usize) -> CatalogResult<()> {
        self.state.ensure_can_init(KIND)?;

        let mut fields = Vec::new();
        try_reserve(&mut fields, num_fields, KIND)?;
        self.index = ResourceIndex::try_with_capacity(KIND, num_fields)?;
        self.fields = fields;
        self.state = RegistryState::Building;

        debug!("Initialized field registry for {} fields", num_fields);
        Ok(())
    }

    /// Adds a field.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidBitwidth`] if `bitwidth` is 0
    /// - [`CatalogError::IdAlreadyExists`] / [`CatalogError::NameAlreadyExists`]
    ///   if the id or name is taken
    /// - [`CatalogError::InvalidState`] unless the registry is building
    pub fn add(&mut self, id: P4Id, name: &str, bitwidth: usize) -> CatalogResult<()> {
        self.state.ensure_building(KIND, "add")?;
        if bitwidth == 0 {
            return Err(CatalogError::InvalidBitwidth {
                kind: KIND,
                id,
                bitwidth,
            });
        }
        self.index.check_new(id, name)?;
        try_reserve(&mut self.fields, 1, KIND)?;

        self.index.register(id, name, self.fields.len())?;
        self.fields.push(FieldInfo::new(id, name, bitwidth));

        trace!("Added field {} '{}' bit<{}>", id, name, bitwidth);
        Ok(())
    }

    /// Fails if [`finish`](Self::finish) would fail.
    pub(crate) fn check_finish(&self) -> CatalogResult<()> {
        self.state.ensure_building(KIND, "finish")
    }

    /// Seals the registry. Queries are accepted from now on.
    pub fn finish(&mut self) -> CatalogResult<()> {
        self.check_finish()?;
        self.state = RegistryState::Populated;
        debug!("Sealed field registry with {} fields", self.fields.len());
        Ok(())
    }

    /// Releases all storage. The registry may be initialized again.
    pub fn free(&mut self) -> CatalogResult<()> {
        self.state.ensure_can_free(KIND)?;
        self.fields = Vec::new();
        self.index = ResourceIndex::new(KIND);
        self.state = RegistryState::Freed;
        debug!("Freed field registry");
        Ok(())
    }

    /// Looks up a field in any lifecycle state.
    pub(crate) fn lookup(&self, id: P4Id) -> Option<&FieldInfo> {
        self.index.slot(id).ok().map(|slot| &self.fields[slot])
    }

    /// Returns the field with the given id.
    pub fn get(&self, id: P4Id) -> CatalogResult<&FieldInfo> {
        self.state.ensure_populated(KIND)?;
        let slot = self.index.slot(id)?;
        Ok(&self.fields[slot])
    }

    pub fn id_from_name(&self, name: &str) -> CatalogResult<P4Id> {
        self.state.ensure_populated(KIND)?;
        self.index.id_of(name)
    }

    pub fn name_from_id(&self, id: P4Id) -> CatalogResult<&str> {
        self.get(id).map(FieldInfo::name)
    }

    pub fn bitwidth(&self, id: P4Id) -> CatalogResult<usize> {
        self.get(id).map(FieldInfo::bitwidth)
    }

    pub fn byte0_mask(&self, id: P4Id) -> CatalogResult<u8> {
        self.get(id).map(FieldInfo::byte0_mask)
    }

    /// Iterates all fields in ascending id order.
    pub fn iter(&self) -> CatalogResult<impl Iterator<Item = &FieldInfo> + '_> {
        self.state.ensure_populated(KIND)?;
        Ok(self.index.slots().map(move |slot| &self.fields[slot]))
    }

    /// Approximate heap bytes held by the registry.
    pub fn memory_usage(&self) -> usize {
        self.fields.capacity() * std::mem::size_of::<FieldInfo>()
            + self.fields.iter().map(|f| f.name.capacity()).sum::<usize>()
            + self.index.memory_usage()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}
