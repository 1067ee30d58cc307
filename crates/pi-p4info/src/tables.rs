//! Table Registry.
//!
//! A table references an ordered list of match fields and an ordered
//! list of eligible actions. Each relation is stored once, as the list in
//! the order members were added; positional queries read that list
//! directly. Each push also records the member in a sparse id map, so
//! duplicate checks while building and membership queries after sealing
//! do not scan the list.

use pi_types::{MatchKind, P4Id};
use tracing::{debug, trace};

use crate::error::{try_reserve, CatalogError, CatalogResult, ResourceKind};
use crate::id_map::SparseIdMap;
use crate::index::ResourceIndex;
use crate::state::RegistryState;

const KIND: ResourceKind = ResourceKind::Table;

/// A match field of one table.
///
/// The name and bitwidth are the values supplied when the match field was
/// added; they are not read back from the Field Registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFieldInfo {
    field_id: P4Id,
    name: String,
    match_kind: MatchKind,
    bitwidth: usize,
}

impl MatchFieldInfo {
    pub fn field_id(&self) -> P4Id {
        self.field_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn match_kind(&self) -> MatchKind {
        self.match_kind
    }

    pub fn bitwidth(&self) -> usize {
        self.bitwidth
    }
}

/// Ordered member list plus a position index keyed by member id.
#[derive(Debug, Clone)]
struct MemberList {
    kind: ResourceKind,
    declared: usize,
    ids: Vec<P4Id>,
    positions: SparseIdMap<P4Id>,
}

impl MemberList {
    fn new(kind: ResourceKind, declared: usize) -> CatalogResult<Self> {
        let mut ids = Vec::new();
        try_reserve(&mut ids, declared, kind)?;
        Ok(Self {
            kind,
            declared,
            ids,
            positions: SparseIdMap::with_capacity(declared),
        })
    }

    fn check_push(&self, table: P4Id, member: P4Id) -> CatalogResult<()> {
        if self.ids.len() >= self.declared {
            return Err(CatalogError::ListFull {
                kind: self.kind,
                owner: table,
                declared: self.declared,
            });
        }
        if self.positions.contains_key(member) {
            return Err(CatalogError::DuplicateMember {
                kind: self.kind,
                table,
                member,
            });
        }
        Ok(())
    }

    /// Appends `member`, returning its position.
    fn push(&mut self, table: P4Id, member: P4Id) -> CatalogResult<usize> {
        let pos = self.ids.len();
        self.positions
            .insert(member, pos)
            .map_err(|_| CatalogError::DuplicateMember {
                kind: self.kind,
                table,
                member,
            })?;
        self.ids.push(member);
        Ok(pos)
    }

    fn check_complete(&self, table: P4Id) -> CatalogResult<()> {
        if self.ids.len() == self.declared {
            Ok(())
        } else {
            Err(CatalogError::IncompletePopulation {
                kind: self.kind,
                owner: table,
                declared: self.declared,
                added: self.ids.len(),
            })
        }
    }

    fn position(&self, member: P4Id) -> Option<usize> {
        self.positions.get(member)
    }

    fn heap_bytes(&self) -> usize {
        self.ids.capacity() * std::mem::size_of::<P4Id>() + self.positions.memory_usage()
    }
}

/// A table known to the catalog.
#[derive(Debug, Clone)]
pub struct TableInfo {
    id: P4Id,
    name: String,
    match_fields: MemberList,
    match_field_info: Vec<MatchFieldInfo>,
    actions: MemberList,
}

impl TableInfo {
    pub fn id(&self) -> P4Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_match_fields(&self) -> usize {
        self.match_fields.declared
    }

    /// Match field ids in the order they were added.
    pub fn match_fields(&self) -> &[P4Id] {
        &self.match_fields.ids
    }

    /// Match fields in the order they were added.
    pub fn match_field_infos(&self) -> &[MatchFieldInfo] {
        &self.match_field_info
    }

    /// Returns the `index`-th match field.
    pub fn match_field(&self, index: usize) -> CatalogResult<&MatchFieldInfo> {
        self.match_field_info.get(index).ok_or_else(|| {
            CatalogError::index_out_of_range(
                ResourceKind::MatchField,
                self.id,
                index,
                self.match_field_info.len(),
            )
        })
    }

    /// Position of `field_id` in the match key, or `None` if the table
    /// does not match on it.
    pub fn match_field_index(&self, field_id: P4Id) -> Option<usize> {
        self.match_fields.position(field_id)
    }

    pub fn is_match_field(&self, field_id: P4Id) -> bool {
        self.match_field_index(field_id).is_some()
    }

    pub fn match_field_by_id(&self, field_id: P4Id) -> Option<&MatchFieldInfo> {
        self.match_field_index(field_id)
            .map(|pos| &self.match_field_info[pos])
    }

    pub fn num_actions(&self) -> usize {
        self.actions.declared
    }

    /// Action ids in the order they were added.
    pub fn actions(&self) -> &[P4Id] {
        &self.actions.ids
    }

    pub fn action_index(&self, action_id: P4Id) -> Option<usize> {
        self.actions.position(action_id)
    }

    pub fn has_action(&self, action_id: P4Id) -> bool {
        self.action_index(action_id).is_some()
    }

    fn heap_bytes(&self) -> usize {
        self.name.capacity()
            + self.match_fields.heap_bytes()
            + self.actions.heap_bytes()
            + self.match_field_info.capacity() * std::mem::size_of::<MatchFieldInfo>()
            + self
                .match_field_info
                .iter()
                .map(|m| m.name.capacity())
                .sum::<usize>()
    }
}

/// Registry of tables.
#[derive(Debug, Clone)]
pub struct TableRegistry {
    state: RegistryState,
    tables: Vec<TableInfo>,
    index: ResourceIndex,
}

impl TableRegistry {
    /// Creates an uninitialized registry.
    pub fn new() -> Self {
        Self {
            state: RegistryState::Uninitialized,
            tables: Vec::new(),
            index: ResourceIndex::new(KIND),
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// Number of tables added so far.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Prepares the registry for `num_tables` additions.
    pub fn init(&mut self, num_tables: usize) -> CatalogResult<()> {
        self.state.ensure_can_init(KIND)?;

        let mut tables = Vec::new();
        try_reserve(&mut tables, num_tables, KIND)?;
        self.index = ResourceIndex::try_with_capacity(KIND, num_tables)?;
        self.tables = tables;
        self.state = RegistryState::Building;

        debug!("Initialized table registry for {} tables", num_tables);
        Ok(())
    }

    /// Adds a table declaring its number of match fields and actions.
    pub fn add(
        &mut self,
        id: P4Id,
        name: &str,
        num_match_fields: usize,
        num_actions: usize,
    ) -> CatalogResult<()> {
        self.state.ensure_building(KIND, "add")?;
        self.index.check_new(id, name)?;
        try_reserve(&mut self.tables, 1, KIND)?;

        let match_fields = MemberList::new(ResourceKind::MatchField, num_match_fields)?;
        let actions = MemberList::new(ResourceKind::TableAction, num_actions)?;
        let mut match_field_info = Vec::new();
        try_reserve(&mut match_field_info, num_match_fields, ResourceKind::MatchField)?;

        self.index.register(id, name, self.tables.len())?;
        self.tables.push(TableInfo {
            id,
            name: name.to_string(),
            match_fields,
            match_field_info,
            actions,
        });

        trace!(
            "Added table {} '{}' with {} match fields and {} actions",
            id,
            name,
            num_match_fields,
            num_actions
        );
        Ok(())
    }

    /// Appends a match field to `table_id`'s match key.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::IdNotFound`] if the table was never added
    /// - [`CatalogError::ListFull`] if all declared match fields were added
    /// - [`CatalogError::DuplicateMember`] if `field_id` is already a match
    ///   field of the table
    /// - [`CatalogError::InvalidBitwidth`] if `bitwidth` is 0
    pub fn add_match_field(
        &mut self,
        table_id: P4Id,
        field_id: P4Id,
        name: &str,
        match_kind: MatchKind,
        bitwidth: usize,
    ) -> CatalogResult<()> {
        self.state.ensure_building(KIND, "add_match_field")?;
        let slot = self.index.slot(table_id)?;
        let table = &mut self.tables[slot];

        table.match_fields.check_push(table_id, field_id)?;
        if bitwidth == 0 {
            return Err(CatalogError::InvalidBitwidth {
                kind: ResourceKind::MatchField,
                id: field_id,
                bitwidth,
            });
        }
        let pos = table.match_fields.push(table_id, field_id)?;
        table.match_field_info.push(MatchFieldInfo {
            field_id,
            name: name.to_string(),
            match_kind,
            bitwidth,
        });

        trace!(
            "Added match field {} '{}' {} bit<{}> at {} of table {}",
            field_id,
            name,
            match_kind,
            bitwidth,
            pos,
            table_id
        );
        Ok(())
    }

    /// Appends `action_id` to the actions eligible for `table_id`.
    pub fn add_action(&mut self, table_id: P4Id, action_id: P4Id) -> CatalogResult<()> {
        self.state.ensure_building(KIND, "add_action")?;
        let slot = self.index.slot(table_id)?;
        let table = &mut self.tables[slot];

        table.actions.check_push(table_id, action_id)?;
        let pos = table.actions.push(table_id, action_id)?;

        trace!("Added action {} at {} of table {}", action_id, pos, table_id);
        Ok(())
    }

    /// Fails if [`finish`](Self::finish) would fail.
    pub(crate) fn check_finish(&self) -> CatalogResult<()> {
        self.state.ensure_building(KIND, "finish")?;
        for table in &self.tables {
            table.match_fields.check_complete(table.id)?;
            table.actions.check_complete(table.id)?;
        }
        Ok(())
    }

    /// Seals the registry.
    ///
    /// Fails with [`CatalogError::IncompletePopulation`] if a table is
    /// missing declared match fields or actions; the registry then stays
    /// building.
    pub fn finish(&mut self) -> CatalogResult<()> {
        self.check_finish()?;
        self.state = RegistryState::Populated;
        debug!("Sealed table registry with {} tables", self.tables.len());
        Ok(())
    }

    /// Releases all storage. The registry may be initialized again.
    pub fn free(&mut self) -> CatalogResult<()> {
        self.state.ensure_can_free(KIND)?;
        self.tables = Vec::new();
        self.index = ResourceIndex::new(KIND);
        self.state = RegistryState::Freed;
        debug!("Freed table registry");
        Ok(())
    }

    /// Returns the table with the given id.
    pub fn get(&self, id: P4Id) -> CatalogResult<&TableInfo> {
        self.state.ensure_populated(KIND)?;
        let slot = self.index.slot(id)?;
        Ok(&self.tables[slot])
    }

    pub fn id_from_name(&self, name: &str) -> CatalogResult<P4Id> {
        self.state.ensure_populated(KIND)?;
        self.index.id_of(name)
    }

    pub fn name_from_id(&self, id: P4Id) -> CatalogResult<&str> {
        self.get(id).map(TableInfo::name)
    }

    pub fn num_match_fields(&self, table_id: P4Id) -> CatalogResult<usize> {
        self.get(table_id).map(TableInfo::num_match_fields)
    }

    /// Match field ids of `table_id` in the order they were added.
    pub fn get_match_fields(&self, table_id: P4Id) -> CatalogResult<&[P4Id]> {
        self.get(table_id).map(TableInfo::match_fields)
    }

    pub fn is_match_field_of(&self, table_id: P4Id, field_id: P4Id) -> CatalogResult<bool> {
        Ok(self.get(table_id)?.is_match_field(field_id))
    }

    /// Position of `field_id` in `table_id`'s match key.
    ///
    /// `Ok(None)` is the not-a-member sentinel; an unknown table is an
    /// error.
    pub fn match_field_index(
        &self,
        table_id: P4Id,
        field_id: P4Id,
    ) -> CatalogResult<Option<usize>> {
        Ok(self.get(table_id)?.match_field_index(field_id))
    }

    /// The `index`-th match field of `table_id`.
    pub fn match_field_info(&self, table_id: P4Id, index: usize) -> CatalogResult<&MatchFieldInfo> {
        self.get(table_id)?.match_field(index)
    }

    pub fn match_field_by_id(
        &self,
        table_id: P4Id,
        field_id: P4Id,
    ) -> CatalogResult<Option<&MatchFieldInfo>> {
        Ok(self.get(table_id)?.match_field_by_id(field_id))
    }

    pub fn num_actions(&self, table_id: P4Id) -> CatalogResult<usize> {
        self.get(table_id).map(TableInfo::num_actions)
    }

    /// Action ids of `table_id` in the order they were added.
    pub fn get_actions(&self, table_id: P4Id) -> CatalogResult<&[P4Id]> {
        self.get(table_id).map(TableInfo::actions)
    }

    pub fn is_action_of(&self, table_id: P4Id, action_id: P4Id) -> CatalogResult<bool> {
        Ok(self.get(table_id)?.has_action(action_id))
    }

    pub fn action_index(&self, table_id: P4Id, action_id: P4Id) -> CatalogResult<Option<usize>> {
        Ok(self.get(table_id)?.action_index(action_id))
    }

    /// Iterates all tables in ascending id order.
    pub fn iter(&self) -> CatalogResult<impl Iterator<Item = &TableInfo> + '_> {
        self.state.ensure_populated(KIND)?;
        Ok(self.entries())
    }

    /// Tables in ascending id order, in any lifecycle state.
    pub(crate) fn entries(&self) -> impl Iterator<Item = &TableInfo> + '_ {
        self.index.slots().map(move |slot| &self.tables[slot])
    }

    /// Approximate heap bytes held by the registry.
    pub fn memory_usage(&self) -> usize {
        self.tables.capacity() * std::mem::size_of::<TableInfo>()
            + self.tables.iter().map(TableInfo::heap_bytes).sum::<usize>()
            + self.index.memory_usage()
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}
