//! Backend seam: statement execution and schema introspection.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Failure reported by a database backend, with its native code and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{message}", .code.as_ref().map(|c| format!("[{}] ", c)).unwrap_or_default())]
pub struct BackendError {
    /// Native error code, when the backend reports one.
    pub code: Option<String>,
    /// Native error message.
    pub message: String,
}

impl BackendError {
    /// Create an error without a code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Attach a native error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Result of executing one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    /// Rows affected, as reported by the backend.
    pub rows_affected: u64,
}

/// Column as reported by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSnapshot {
    pub name: String,
    /// Type string exactly as the backend reports it.
    pub data_type: String,
    pub allow_null: bool,
    /// Default expression as SQL text.
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Foreign key as reported by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeySnapshot {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    /// ON DELETE action, when not the default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    /// ON UPDATE action, when not the default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

/// Index as reported by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    /// Statement that created the index, when the backend keeps it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

/// One table as reported by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub name: String,
    /// Columns in table order.
    pub columns: Vec<ColumnSnapshot>,
    pub foreign_keys: Vec<ForeignKeySnapshot>,
    /// User-created indexes (not those backing constraints).
    pub indexes: Vec<IndexSnapshot>,
    /// Statement that created the table, when the backend keeps it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

impl TableSnapshot {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSnapshot> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up an index by name.
    pub fn index(&self, name: &str) -> Option<&IndexSnapshot> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

/// The schema as reported by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableSnapshot>,
}

impl SchemaSnapshot {
    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableSnapshot> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Whether any table owns an index called `name`.
    pub fn has_index(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.index(name).is_some())
    }
}

/// A database the query interface submits statements to.
///
/// Implementations must be safe to share across tasks; the query interface
/// never issues two statements of one call concurrently.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Execute one statement.
    async fn execute(&self, sql: &str) -> Result<ExecOutcome, BackendError>;

    /// Read the current schema.
    async fn introspect_schema(&self) -> Result<SchemaSnapshot, BackendError>;

    /// Read one table, or `None` when it does not exist.
    async fn introspect_table(&self, name: &str) -> Result<Option<TableSnapshot>, BackendError> {
        let schema = self.introspect_schema().await?;
        Ok(schema.tables.into_iter().find(|t| t.name == name))
    }
}
