//! Action Registry.
//!
//! Actions own an ordered parameter list. Parameters are identified by
//! their position in that list, and may be supplied in any order while
//! the registry is building: the caller states the index of each one.
//! Sealing checks that every declared position was filled.

use pi_types::{byte0_mask, P4Id};
use tracing::{debug, trace};

use crate::error::{try_reserve, CatalogError, CatalogResult, ResourceKind};
use crate::index::ResourceIndex;
use crate::name_map::NameMap;
use crate::state::RegistryState;

const KIND: ResourceKind = ResourceKind::Action;

/// One action parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    index: usize,
    name: String,
    bitwidth: usize,
    byte0_mask: u8,
}

impl ParamInfo {
    /// Position in the owning action's parameter list.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bitwidth(&self) -> usize {
        self.bitwidth
    }

    pub fn byte0_mask(&self) -> u8 {
        self.byte0_mask
    }
}

/// An action known to the catalog.
#[derive(Debug, Clone)]
pub struct ActionInfo {
    id: P4Id,
    name: String,
    num_params: usize,
    params: Vec<ParamInfo>,
    param_names: NameMap<usize>,
    // Filled by position while building, drained into `params` on finish.
    pending: Vec<Option<ParamInfo>>,
}

impl ActionInfo {
    pub fn id(&self) -> P4Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared number of parameters.
    pub fn num_params(&self) -> usize {
        self.num_params
    }

    /// Parameters in positional order.
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// Returns the parameter at `index`.
    pub fn param(&self, index: usize) -> CatalogResult<&ParamInfo> {
        self.params.get(index).ok_or_else(|| {
            CatalogError::index_out_of_range(
                ResourceKind::ActionParam,
                self.id,
                index,
                self.params.len(),
            )
        })
    }

    /// Returns the position of the parameter called `name`.
    pub fn param_index(&self, name: &str) -> CatalogResult<usize> {
        self.param_names
            .get(name)
            .ok_or_else(|| CatalogError::MemberNameNotFound {
                kind: ResourceKind::ActionParam,
                owner: self.id,
                name: name.to_string(),
            })
    }

    fn missing_params(&self) -> usize {
        self.pending.iter().filter(|p| p.is_none()).count()
    }

    fn seal(&mut self) {
        self.params = std::mem::take(&mut self.pending)
            .into_iter()
            .flatten()
            .collect();
    }
}

/// Registry of actions and their parameters.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    state: RegistryState,
    actions: Vec<ActionInfo>,
    index: ResourceIndex,
}

impl ActionRegistry {
    /// Creates an uninitialized registry.
    pub fn new() -> Self {
        Self {
            state: RegistryState::Uninitialized,
            actions: Vec::new(),
            index: ResourceIndex::new(KIND),
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// Number of actions added so far.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Prepares the registry for `num_actions` additions.
    pub fn init(&mut self, num_actions: usize) -> CatalogResult<()> {
        self.state.ensure_can_init(KIND)?;

        let mut actions = Vec::new();
        try_reserve(&mut actions, num_actions, KIND)?;
        self.index = ResourceIndex::try_with_capacity(KIND, num_actions)?;
        self.actions = actions;
        self.state = RegistryState::Building;

        debug!("Initialized action registry for {} actions", num_actions);
        Ok(())
    }

    /// Adds an action declaring `num_params` parameters.
    pub fn add(&mut self, id: P4Id, name: &str, num_params: usize) -> CatalogResult<()> {
        self.state.ensure_building(KIND, "add")?;
        self.index.check_new(id, name)?;
        try_reserve(&mut self.actions, 1, KIND)?;

        let mut pending = Vec::new();
        try_reserve(&mut pending, num_params, ResourceKind::ActionParam)?;
        pending.resize(num_params, None);
        let mut param_names = NameMap::new();
        param_names
            .try_reserve(num_params)
            .map_err(|source| CatalogError::ResourceExhausted {
                kind: ResourceKind::ActionParam,
                requested: num_params,
                source,
            })?;

        self.index.register(id, name, self.actions.len())?;
        self.actions.push(ActionInfo {
            id,
            name: name.to_string(),
            num_params,
            params: Vec::new(),
            param_names,
            pending,
        });

        trace!("Added action {} '{}' with {} params", id, name, num_params);
        Ok(())
    }

    /// Adds the parameter at position `index` of `action_id`.
    ///
    /// Positions may be filled in any order; each exactly once.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::IdNotFound`] if the action was never added
    /// - [`CatalogError::IndexOutOfRange`] if `index >= num_params`
    /// - [`CatalogError::PositionTaken`] if `index` was already filled
    /// - [`CatalogError::NameAlreadyExists`] if the action already has a
    ///   parameter called `name`
    ///
    /// Zero-width parameters are accepted.
    pub fn add_param(
        &mut self,
        action_id: P4Id,
        index: usize,
        name: &str,
        bitwidth: usize,
    ) -> CatalogResult<()> {
        self.state.ensure_building(KIND, "add_param")?;
        let slot = self.index.slot(action_id)?;
        let action = &mut self.actions[slot];

        let declared = action.num_params;
        let entry = action.pending.get(index).ok_or_else(|| {
            CatalogError::index_out_of_range(ResourceKind::ActionParam, action_id, index, declared)
        })?;
        if entry.is_some() {
            return Err(CatalogError::PositionTaken {
                kind: ResourceKind::ActionParam,
                owner: action_id,
                index,
            });
        }
        action
            .param_names
            .insert(name, index)
            .map_err(|dup| CatalogError::NameAlreadyExists {
                kind: ResourceKind::ActionParam,
                name: dup.0,
            })?;
        action.pending[index] = Some(ParamInfo {
            index,
            name: name.to_string(),
            bitwidth,
            byte0_mask: byte0_mask(bitwidth),
        });

        trace!(
            "Added param {} '{}' bit<{}> to action {}",
            index,
            name,
            bitwidth,
            action_id
        );
        Ok(())
    }

    /// Fails if [`finish`](Self::finish) would fail.
    pub(crate) fn check_finish(&self) -> CatalogResult<()> {
        self.state.ensure_building(KIND, "finish")?;
        match self.actions.iter().find(|a| a.missing_params() > 0) {
            Some(action) => Err(CatalogError::IncompletePopulation {
                kind: ResourceKind::ActionParam,
                owner: action.id,
                declared: action.num_params,
                added: action.num_params - action.missing_params(),
            }),
            None => Ok(()),
        }
    }

    /// Seals the registry.
    ///
    /// Fails with [`CatalogError::IncompletePopulation`] if any action is
    /// missing a declared parameter; the registry then stays building.
    pub fn finish(&mut self) -> CatalogResult<()> {
        self.check_finish()?;
        for action in &mut self.actions {
            action.seal();
        }
        self.state = RegistryState::Populated;
        debug!("Sealed action registry with {} actions", self.actions.len());
        Ok(())
    }

    /// Releases all storage. The registry may be initialized again.
    pub fn free(&mut self) -> CatalogResult<()> {
        self.state.ensure_can_free(KIND)?;
        self.actions = Vec::new();
        self.index = ResourceIndex::new(KIND);
        self.state = RegistryState::Freed;
        debug!("Freed action registry");
        Ok(())
    }

    /// Returns the action with the given id.
    pub(crate) fn contains(&self, id: P4Id) -> bool {
        self.index.slot(id).is_ok()
    }

    pub fn get(&self, id: P4Id) -> CatalogResult<&ActionInfo> {
        self.state.ensure_populated(KIND)?;
        let slot = self.index.slot(id)?;
        Ok(&self.actions[slot])
    }

    pub fn id_from_name(&self, name: &str) -> CatalogResult<P4Id> {
        self.state.ensure_populated(KIND)?;
        self.index.id_of(name)
    }

    pub fn name_from_id(&self, id: P4Id) -> CatalogResult<&str> {
        self.get(id).map(ActionInfo::name)
    }

    pub fn num_params(&self, id: P4Id) -> CatalogResult<usize> {
        self.get(id).map(ActionInfo::num_params)
    }

    /// Parameters of `id` in positional order.
    pub fn params(&self, id: P4Id) -> CatalogResult<&[ParamInfo]> {
        self.get(id).map(ActionInfo::params)
    }

    /// Position of the parameter called `param_name` within `action_id`.
    pub fn param_id_from_name(&self, action_id: P4Id, param_name: &str) -> CatalogResult<usize> {
        self.get(action_id)?.param_index(param_name)
    }

    pub fn param_name_from_id(&self, action_id: P4Id, index: usize) -> CatalogResult<&str> {
        Ok(self.get(action_id)?.param(index)?.name())
    }

    pub fn param_bitwidth(&self, action_id: P4Id, index: usize) -> CatalogResult<usize> {
        Ok(self.get(action_id)?.param(index)?.bitwidth())
    }

    pub fn param_byte0_mask(&self, action_id: P4Id, index: usize) -> CatalogResult<u8> {
        Ok(self.get(action_id)?.param(index)?.byte0_mask())
    }

    /// Iterates all actions in ascending id order.
    pub fn iter(&self) -> CatalogResult<impl Iterator<Item = &ActionInfo> + '_> {
        self.state.ensure_populated(KIND)?;
        Ok(self.index.slots().map(move |slot| &self.actions[slot]))
    }

    /// Approximate heap bytes held by the registry.
    pub fn memory_usage(&self) -> usize {
        let per_action: usize = self
            .actions
            .iter()
            .map(|a| {
                a.name.capacity()
                    + a.params.capacity() * std::mem::size_of::<ParamInfo>()
                    + a.pending.capacity() * std::mem::size_of::<Option<ParamInfo>>()
                    + a.params.iter().map(|p| p.name.capacity()).sum::<usize>()
            })
            .sum();
        self.actions.capacity() * std::mem::size_of::<ActionInfo>()
            + per_action
            + self.index.memory_usage()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
