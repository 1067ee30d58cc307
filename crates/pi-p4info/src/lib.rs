//! P4 runtime metadata catalog.
//!
//! The catalog holds the static description of one P4 program: its
//! header fields, actions (with ordered parameters) and match-action
//! tables (with ordered match fields and eligible actions). It translates
//! between externally assigned ids and names and answers the positional
//! and membership queries the runtime needs to validate and encode table
//! entries.
//!
//! # Lifecycle
//!
//! Every registry goes through `init` -> `add*` -> `finish` -> queries ->
//! `free`. Adds are only accepted while building, queries only once
//! sealed; every misuse returns a [`CatalogError`].
//!
//! # Components
//!
//! - [`SparseIdMap`]: ordered map from sparse integer ids to storage slots
//! - [`NameMap`]: name to id map that never overwrites
//! - [`FieldRegistry`], [`ActionRegistry`], [`TableRegistry`]
//! - [`P4Info`]: the three registries of one program
//! - [`ProgramDescription`]: serde model replayed by [`P4Info::from_description`]
//! - [`SharedP4Info`]: atomically swappable handle for concurrent readers

mod actions;
mod config;
mod description;
mod error;
mod fields;
mod id_map;
mod index;
mod name_map;
mod p4info;
mod shared;
mod state;
mod tables;

pub use actions::{ActionInfo, ActionRegistry, ParamInfo};
pub use config::{CatalogConfig, ReferenceCheck};
pub use description::{
    ActionDescription, FieldDescription, MatchFieldDescription, ParamDescription,
    ProgramDescription, TableDescription,
};
pub use error::{
    CatalogError, CatalogResult, DanglingReference, ReferenceProblem, ResourceKind,
};
pub use fields::{FieldInfo, FieldRegistry};
pub use id_map::{DuplicateKey, Iter as SparseIdIter, SparseIdMap, SparseKey};
pub use name_map::{DuplicateName, NameMap};
pub use p4info::P4Info;
pub use shared::SharedP4Info;
pub use state::RegistryState;
pub use tables::{MatchFieldInfo, TableInfo, TableRegistry};
