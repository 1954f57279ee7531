//! Table definitions.

use super::column::ColumnDef;
use super::index::IndexDef;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Engine-level table options, passed through to dialects that understand them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    /// Storage engine (e.g. `InnoDB`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Default character set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// Default collation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collate: Option<String>,
    /// Table comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A table definition: ordered columns, indexes created with the table, and options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDef {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Indexes created after the table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexDef>,
    /// Engine-level options.
    #[serde(default)]
    pub options: TableOptions,
}

impl TableDef {
    /// Create an empty table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            options: TableOptions::default(),
        }
    }

    /// Append a column.
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Append several columns.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnDef>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Declare an index; its table is set to this table.
    pub fn with_index(mut self, mut index: IndexDef) -> Self {
        index.table = self.name.clone();
        self.indexes.push(index);
        self
    }

    /// Set engine-level options.
    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Look up a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns that are stored (VIRTUAL columns excluded), in order.
    pub fn stored_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.is_stored())
    }

    /// Stored primary-key columns, in order.
    pub fn primary_key(&self) -> Vec<&ColumnDef> {
        self.stored_columns().filter(|c| c.primary_key).collect()
    }

    /// Indexes with their table filled in from this definition.
    pub fn resolved_indexes(&self) -> Vec<IndexDef> {
        self.indexes
            .iter()
            .map(|index| {
                let mut index = index.clone();
                if index.table.is_empty() {
                    index.table = self.name.clone();
                }
                index
            })
            .collect()
    }

    /// Check the table invariants and those of every column and index.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("table name must not be empty"));
        }
        if self.stored_columns().next().is_none() {
            return Err(Error::validation(format!(
                "table `{}` must have at least one stored column",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            column.validate()?;
            if !seen.insert(column.name.as_str()) {
                return Err(Error::validation(format!(
                    "table `{}` declares column `{}` more than once",
                    self.name, column.name
                )));
            }
        }

        if self.columns.iter().filter(|c| c.auto_increment).count() > 1 {
            return Err(Error::validation(format!(
                "table `{}` has more than one autoIncrement column",
                self.name
            )));
        }

        for index in self.resolved_indexes() {
            if index.table != self.name {
                return Err(Error::validation(format!(
                    "index `{}` belongs to `{}`, not `{}`",
                    index.resolved_name(),
                    index.table,
                    self.name
                )));
            }
            index.validate()?;
            for column in index.column_names() {
                if self.get_column(column).map_or(true, |c| !c.is_stored()) {
                    return Err(Error::validation(format!(
                        "index `{}` names unknown column `{}`",
                        index.resolved_name(),
                        column
                    )));
                }
            }
        }
        Ok(())
    }
}
