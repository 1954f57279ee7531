//! DDL operation set.

use crate::catalog::{ColumnDef, IndexDef, TableDef};
use crate::error::{Error, Result};

/// A structured schema change. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum DdlOperation {
    CreateTable {
        table: TableDef,
        if_not_exists: bool,
    },
    DropTable {
        name: String,
        if_exists: bool,
        cascade: bool,
    },
    /// Drop every listed table; the list is expected children-first.
    DropAllTables {
        tables: Vec<String>,
    },
    RenameTable {
        from: String,
        to: String,
    },
    AddColumn {
        table: String,
        column: ColumnDef,
    },
    RemoveColumn {
        table: String,
        column: String,
    },
    /// Replace the definition of an existing column, matched by name.
    ChangeColumn {
        table: String,
        column: ColumnDef,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    AddIndex {
        index: IndexDef,
    },
    RemoveIndex {
        table: String,
        name: String,
    },
}

impl DdlOperation {
    /// Stable operation name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            DdlOperation::CreateTable { .. } => "createTable",
            DdlOperation::DropTable { .. } => "dropTable",
            DdlOperation::DropAllTables { .. } => "dropAllTables",
            DdlOperation::RenameTable { .. } => "renameTable",
            DdlOperation::AddColumn { .. } => "addColumn",
            DdlOperation::RemoveColumn { .. } => "removeColumn",
            DdlOperation::ChangeColumn { .. } => "changeColumn",
            DdlOperation::RenameColumn { .. } => "renameColumn",
            DdlOperation::AddIndex { .. } => "addIndex",
            DdlOperation::RemoveIndex { .. } => "removeIndex",
        }
    }

    /// Name of the table the operation targets, if it targets exactly one.
    pub fn table(&self) -> Option<&str> {
        match self {
            DdlOperation::CreateTable { table, .. } => Some(&table.name),
            DdlOperation::DropTable { name, .. } => Some(name),
            DdlOperation::DropAllTables { .. } => None,
            DdlOperation::RenameTable { from, .. } => Some(from),
            DdlOperation::AddColumn { table, .. }
            | DdlOperation::RemoveColumn { table, .. }
            | DdlOperation::ChangeColumn { table, .. }
            | DdlOperation::RenameColumn { table, .. }
            | DdlOperation::RemoveIndex { table, .. } => Some(table),
            DdlOperation::AddIndex { index } => Some(&index.table),
        }
    }

    /// Check operand shape without consulting any backend.
    pub fn validate(&self) -> Result<()> {
        match self {
            DdlOperation::CreateTable { table, .. } => table.validate(),
            DdlOperation::DropTable { name, .. } => non_empty("table name", name),
            DdlOperation::DropAllTables { tables } => {
                tables.iter().try_for_each(|t| non_empty("table name", t))
            }
            DdlOperation::RenameTable { from, to } => {
                non_empty("table name", from)?;
                non_empty("new table name", to)
            }
            DdlOperation::AddColumn { table, column }
            | DdlOperation::ChangeColumn { table, column } => {
                non_empty("table name", table)?;
                column.validate()
            }
            DdlOperation::RemoveColumn { table, column } => {
                non_empty("table name", table)?;
                non_empty("column name", column)
            }
            DdlOperation::RenameColumn { table, from, to } => {
                non_empty("table name", table)?;
                non_empty("column name", from)?;
                non_empty("new column name", to)
            }
            DdlOperation::AddIndex { index } => index.validate(),
            DdlOperation::RemoveIndex { table, name } => {
                non_empty("table name", table)?;
                non_empty("index name", name)
            }
        }
    }
}

fn non_empty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{} must not be empty", what)));
    }
    Ok(())
}
