//! Program description: the decoded resource tuples a loader feeds into
//! the catalog.
//!
//! The description is a plain serde model, so a loader that has already
//! decoded a compiled program can hand it over as JSON or build it in
//! code. [`P4Info::from_description`] replays it as the usual
//! `init` / `add*` / `finish` sequence.

use std::path::Path;

use pi_types::{MatchKind, P4Id};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::p4info::P4Info;

/// Every resource of one P4 program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramDescription {
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
    #[serde(default)]
    pub actions: Vec<ActionDescription>,
    #[serde(default)]
    pub tables: Vec<TableDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDescription {
    pub id: P4Id,
    pub name: String,
    pub bitwidth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDescription {
    pub id: P4Id,
    pub name: String,
    /// Parameters in any order; each names its own position.
    #[serde(default)]
    pub params: Vec<ParamDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDescription {
    pub index: usize,
    pub name: String,
    pub bitwidth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDescription {
    pub id: P4Id,
    pub name: String,
    /// Match key in wire order.
    #[serde(default)]
    pub match_fields: Vec<MatchFieldDescription>,
    #[serde(default)]
    pub actions: Vec<P4Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchFieldDescription {
    pub field_id: P4Id,
    pub name: String,
    pub match_kind: MatchKind,
    pub bitwidth: usize,
}

impl ProgramDescription {
    /// Parses a description from JSON.
    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        serde_json::from_str(json).map_err(|source| CatalogError::Json {
            what: "program description",
            source,
        })
    }

    /// Reads and parses a JSON description file.
    pub fn from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Serializes the description to pretty-printed JSON.
    pub fn to_json_string(&self) -> CatalogResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| CatalogError::Json {
            what: "program description",
            source,
        })
    }
}

impl P4Info {
    /// Builds and seals a catalog from a program description.
    pub fn from_description(
        desc: &ProgramDescription,
        config: CatalogConfig,
    ) -> CatalogResult<Self> {
        let mut p4info = P4Info::new(config);
        p4info.load_description(desc)?;
        Ok(p4info)
    }

    /// Populates and seals this catalog from a program description.
    ///
    /// The catalog must be new or freed. Reusing a freed catalog this way
    /// yields the same contents as [`P4Info::from_description`].
    #[instrument(skip_all, fields(
        fields = desc.fields.len(),
        actions = desc.actions.len(),
        tables = desc.tables.len(),
    ))]
    pub fn load_description(&mut self, desc: &ProgramDescription) -> CatalogResult<()> {
        self.init(desc.fields.len(), desc.actions.len(), desc.tables.len())?;

        let fields = self.fields_mut();
        for field in &desc.fields {
            fields.add(field.id, &field.name, field.bitwidth)?;
        }

        let actions = self.actions_mut();
        for action in &desc.actions {
            actions.add(action.id, &action.name, action.params.len())?;
            for param in &action.params {
                actions.add_param(action.id, param.index, &param.name, param.bitwidth)?;
            }
        }

        let tables = self.tables_mut();
        for table in &desc.tables {
            tables.add(
                table.id,
                &table.name,
                table.match_fields.len(),
                table.actions.len(),
            )?;
            for mf in &table.match_fields {
                tables.add_match_field(
                    table.id,
                    mf.field_id,
                    &mf.name,
                    mf.match_kind,
                    mf.bitwidth,
                )?;
            }
            for &action_id in &table.actions {
                tables.add_action(table.id, action_id)?;
            }
        }

        self.finish()
    }

    /// Describes a sealed catalog.
    ///
    /// Resources are listed in ascending id order; params in positional
    /// order and table members in the order they were added.
    pub fn to_description(&self) -> CatalogResult<ProgramDescription> {
        let fields = self
            .fields()
            .iter()?
            .map(|f| FieldDescription {
                id: f.id(),
                name: f.name().to_string(),
                bitwidth: f.bitwidth(),
            })
            .collect();

        let actions = self
            .actions()
            .iter()?
            .map(|a| ActionDescription {
                id: a.id(),
                name: a.name().to_string(),
                params: a
                    .params()
                    .iter()
                    .map(|p| ParamDescription {
                        index: p.index(),
                        name: p.name().to_string(),
                        bitwidth: p.bitwidth(),
                    })
                    .collect(),
            })
            .collect();

        let tables = self
            .tables()
            .iter()?
            .map(|t| TableDescription {
                id: t.id(),
                name: t.name().to_string(),
                match_fields: t
                    .match_field_infos()
                    .iter()
                    .map(|mf| MatchFieldDescription {
                        field_id: mf.field_id(),
                        name: mf.name().to_string(),
                        match_kind: mf.match_kind(),
                        bitwidth: mf.bitwidth(),
                    })
                    .collect(),
                actions: t.actions().to_vec(),
            })
            .collect();

        Ok(ProgramDescription {
            fields,
            actions,
            tables,
        })
    }
}
