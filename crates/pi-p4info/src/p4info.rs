//! The `P4Info` catalog: the three registries of one P4 program.

use tracing::{info, instrument, warn};

use crate::actions::ActionRegistry;
use crate::config::{CatalogConfig, ReferenceCheck};
use crate::error::{
    CatalogError, CatalogResult, DanglingReference, ReferenceProblem, ResourceKind,
};
use crate::fields::FieldRegistry;
use crate::tables::TableRegistry;

/// Metadata catalog of one P4 program.
///
/// Owned exclusively by the loader while building. Once [`P4Info::finish`]
/// succeeds the catalog is read-only and may be shared freely, e.g.
/// through [`crate::SharedP4Info`].
///
/// # Example
///
/// ```
/// use pi_p4info::{CatalogConfig, P4Info};
/// use pi_types::{MatchKind, P4Id};
///
/// let mut p4info = P4Info::new(CatalogConfig::default());
/// p4info.init(1, 1, 1).unwrap();
/// p4info.fields_mut().add(P4Id::new(1), "ipv4.dstAddr", 32).unwrap();
/// p4info.actions_mut().add(P4Id::new(2), "drop", 0).unwrap();
/// let tables = p4info.tables_mut();
/// tables.add(P4Id::new(3), "ipv4_lpm", 1, 1).unwrap();
/// tables
///     .add_match_field(P4Id::new(3), P4Id::new(1), "ipv4.dstAddr", MatchKind::Lpm, 32)
///     .unwrap();
/// tables.add_action(P4Id::new(3), P4Id::new(2)).unwrap();
/// p4info.finish().unwrap();
///
/// let table = p4info.tables().id_from_name("ipv4_lpm").unwrap();
/// assert!(p4info.tables().is_action_of(table, P4Id::new(2)).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct P4Info {
    config: CatalogConfig,
    fields: FieldRegistry,
    actions: ActionRegistry,
    tables: TableRegistry,
    sealed: bool,
}

impl P4Info {
    /// Creates an empty, uninitialized catalog.
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config,
            fields: FieldRegistry::new(),
            actions: ActionRegistry::new(),
            tables: TableRegistry::new(),
            sealed: false,
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Initializes all three registries for the given counts.
    ///
    /// Either every registry is initialized or none is: on error the
    /// catalog is left as it was.
    #[instrument(skip(self))]
    pub fn init(
        &mut self,
        num_fields: usize,
        num_actions: usize,
        num_tables: usize,
    ) -> CatalogResult<()> {
        self.fields.state().ensure_can_init(ResourceKind::Field)?;
        self.actions.state().ensure_can_init(ResourceKind::Action)?;
        self.tables.state().ensure_can_init(ResourceKind::Table)?;

        let mut fields = FieldRegistry::new();
        fields.init(num_fields)?;
        let mut actions = ActionRegistry::new();
        actions.init(num_actions)?;
        let mut tables = TableRegistry::new();
        tables.init(num_tables)?;

        self.fields = fields;
        self.actions = actions;
        self.tables = tables;
        self.sealed = false;
        Ok(())
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    pub fn fields_mut(&mut self) -> &mut FieldRegistry {
        &mut self.fields
    }

    pub fn actions_mut(&mut self) -> &mut ActionRegistry {
        &mut self.actions
    }

    pub fn tables_mut(&mut self) -> &mut TableRegistry {
        &mut self.tables
    }

    /// Returns true once [`P4Info::finish`] has succeeded.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Runs the configured reference check, then seals every registry.
    ///
    /// Every check runs before any registry is sealed, so a failure
    /// leaves all three registries building: the missing entries can
    /// still be added and `finish` retried. With [`ReferenceCheck::Deny`],
    /// a dangling reference fails with [`CatalogError::DanglingReferences`].
    #[instrument(skip(self))]
    pub fn finish(&mut self) -> CatalogResult<()> {
        self.fields.check_finish()?;
        self.actions.check_finish()?;
        self.tables.check_finish()?;

        match self.config.reference_check {
            ReferenceCheck::Off => {}
            ReferenceCheck::Warn => {
                for dangling in self.collect_dangling() {
                    warn!("Dangling reference: {}", dangling);
                }
            }
            ReferenceCheck::Deny => {
                let dangling = self.collect_dangling();
                let count = dangling.len();
                if let Some(first) = dangling.into_iter().next() {
                    return Err(CatalogError::DanglingReferences { count, first });
                }
            }
        }

        self.fields.finish()?;
        self.actions.finish()?;
        self.tables.finish()?;
        self.sealed = true;
        info!(
            "Sealed P4 catalog: {} fields, {} actions, {} tables",
            self.fields.len(),
            self.actions.len(),
            self.tables.len()
        );
        Ok(())
    }

    /// Releases every registry. The catalog may be initialized again.
    pub fn free(&mut self) -> CatalogResult<()> {
        self.fields.state().ensure_can_free(ResourceKind::Field)?;
        self.actions.state().ensure_can_free(ResourceKind::Action)?;
        self.tables.state().ensure_can_free(ResourceKind::Table)?;
        self.sealed = false;
        self.fields.free()?;
        self.actions.free()?;
        self.tables.free()
    }

    /// Checks every table's match fields and actions against the Field
    /// and Action registries.
    ///
    /// Returns the dangling references in table id order; an empty list
    /// means every reference resolves. With
    /// `check_match_field_consistency` set, a match field whose name or
    /// bitwidth differs from the field's is reported as well.
    pub fn validate_references(&self) -> CatalogResult<Vec<DanglingReference>> {
        self.fields.state().ensure_populated(ResourceKind::Field)?;
        self.actions.state().ensure_populated(ResourceKind::Action)?;
        self.tables.state().ensure_populated(ResourceKind::Table)?;
        Ok(self.collect_dangling())
    }

    fn collect_dangling(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        let check_consistency = self.config.check_match_field_consistency;

        for table in self.tables.entries() {
            for mf in table.match_field_infos() {
                let field = match self.fields.lookup(mf.field_id()) {
                    Some(field) => field,
                    None => {
                        dangling.push(DanglingReference {
                            table: table.id(),
                            kind: ResourceKind::Field,
                            id: mf.field_id(),
                            problem: ReferenceProblem::Missing,
                        });
                        continue;
                    }
                };
                if !check_consistency {
                    continue;
                }
                if field.name() != mf.name() {
                    dangling.push(DanglingReference {
                        table: table.id(),
                        kind: ResourceKind::Field,
                        id: mf.field_id(),
                        problem: ReferenceProblem::NameMismatch {
                            expected: field.name().to_string(),
                            actual: mf.name().to_string(),
                        },
                    });
                }
                if field.bitwidth() != mf.bitwidth() {
                    dangling.push(DanglingReference {
                        table: table.id(),
                        kind: ResourceKind::Field,
                        id: mf.field_id(),
                        problem: ReferenceProblem::BitwidthMismatch {
                            expected: field.bitwidth(),
                            actual: mf.bitwidth(),
                        },
                    });
                }
            }

            for &action_id in table.actions() {
                if !self.actions.contains(action_id) {
                    dangling.push(DanglingReference {
                        table: table.id(),
                        kind: ResourceKind::Action,
                        id: action_id,
                        problem: ReferenceProblem::Missing,
                    });
                }
            }
        }

        dangling
    }

    /// Approximate heap bytes held by the catalog.
    pub fn memory_usage(&self) -> usize {
        self.fields.memory_usage() + self.actions.memory_usage() + self.tables.memory_usage()
    }
}

impl Default for P4Info {
    fn default() -> Self {
        Self::new(CatalogConfig::default())
    }
}
