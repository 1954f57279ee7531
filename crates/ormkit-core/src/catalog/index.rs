//! Index definitions.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Derive the default index name: `<table>_<col1>_..._<coln>`, lower-cased.
pub fn derive_index_name<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    let mut parts = Vec::with_capacity(columns.len() + 1);
    parts.push(table);
    parts.extend(columns.iter().map(|c| c.as_ref()));
    parts.join("_").to_lowercase()
}

/// Kind of index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Plain lookup index.
    #[default]
    Plain,
    /// Unique index.
    Unique,
    /// Full-text index.
    Fulltext,
    /// Spatial index.
    Spatial,
}

/// Storage method hint for an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMethod {
    Btree,
    Hash,
    Gist,
    Gin,
}

impl IndexMethod {
    /// Lower-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexMethod::Btree => "btree",
            IndexMethod::Hash => "hash",
            IndexMethod::Gist => "gist",
            IndexMethod::Gin => "gin",
        }
    }
}

/// Sort direction of an index column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    /// SQL keyword.
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// One column of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexColumnSpec", into = "IndexColumnSpec")]
pub struct IndexColumn {
    /// Column name.
    pub name: String,
    /// Sort direction.
    pub order: Option<OrderDirection>,
    /// Prefix length.
    pub length: Option<u32>,
}

impl IndexColumn {
    /// An index column without order or prefix length.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: None,
            length: None,
        }
    }

    /// Set the sort direction.
    pub fn with_order(mut self, order: OrderDirection) -> Self {
        self.order = Some(order);
        self
    }

    /// Set the prefix length.
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }
}

impl From<&str> for IndexColumn {
    fn from(name: &str) -> Self {
        IndexColumn::new(name)
    }
}

impl From<String> for IndexColumn {
    fn from(name: String) -> Self {
        IndexColumn::new(name)
    }
}

/// Index columns are written either as a bare name or as an object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum IndexColumnSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        order: Option<OrderDirection>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<u32>,
    },
}

impl From<IndexColumnSpec> for IndexColumn {
    fn from(spec: IndexColumnSpec) -> Self {
        match spec {
            IndexColumnSpec::Name(name) => IndexColumn::new(name),
            IndexColumnSpec::Detailed {
                name,
                order,
                length,
            } => IndexColumn {
                name,
                order,
                length,
            },
        }
    }
}

impl From<IndexColumn> for IndexColumnSpec {
    fn from(column: IndexColumn) -> Self {
        if column.order.is_none() && column.length.is_none() {
            IndexColumnSpec::Name(column.name)
        } else {
            IndexColumnSpec::Detailed {
                name: column.name,
                order: column.order,
                length: column.length,
            }
        }
    }
}

/// An index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDef {
    /// Indexed table. Filled in from the owning table when declared with it.
    #[serde(default)]
    pub table: String,
    /// Indexed columns, in order.
    #[serde(alias = "fields")]
    pub columns: Vec<IndexColumn>,
    /// Explicit name; derived from table and columns when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Index kind.
    #[serde(default)]
    pub kind: IndexKind,
    /// Full-text parser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    /// Storage method hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using: Option<IndexMethod>,
}

impl IndexDef {
    /// Create a plain index over `columns`.
    pub fn new<I, C>(table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<IndexColumn>,
    {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            name: None,
            kind: IndexKind::Plain,
            parser: None,
            using: None,
        }
    }

    /// Set an explicit name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Make the index unique.
    pub fn unique(mut self) -> Self {
        self.kind = IndexKind::Unique;
        self
    }

    /// Set the index kind.
    pub fn with_kind(mut self, kind: IndexKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the full-text parser.
    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }

    /// Set the storage method hint.
    pub fn using(mut self, method: IndexMethod) -> Self {
        self.using = Some(method);
        self
    }

    /// Names of the indexed columns, in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// The explicit name, or the one derived from table and columns.
    pub fn resolved_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => derive_index_name(&self.table, &self.column_names()),
        }
    }

    /// Check operand shape.
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(Error::validation("index table must not be empty"));
        }
        if self.columns.is_empty() {
            return Err(Error::validation(format!(
                "index on `{}` must list at least one column",
                self.table
            )));
        }
        if self.columns.iter().any(|c| c.name.trim().is_empty()) {
            return Err(Error::validation("index column names must not be empty"));
        }
        if self.parser.is_some() && self.kind != IndexKind::Fulltext {
            return Err(Error::validation(format!(
                "index `{}`: a parser is only valid for fulltext indexes",
                self.resolved_name()
            )));
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::validation("index name must not be empty"));
        }
        Ok(())
    }
}

/// Identifies an index to remove: by name, or by the columns it was created over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexTarget {
    Name(String),
    Columns(Vec<String>),
}

impl IndexTarget {
    /// Resolve to an index name, deriving it from the columns when needed.
    pub fn resolve(&self, table: &str) -> String {
        match self {
            IndexTarget::Name(name) => name.clone(),
            IndexTarget::Columns(columns) => derive_index_name(table, columns),
        }
    }
}

impl From<&str> for IndexTarget {
    fn from(name: &str) -> Self {
        IndexTarget::Name(name.to_string())
    }
}

impl<S: Into<String>> From<Vec<S>> for IndexTarget {
    fn from(columns: Vec<S>) -> Self {
        IndexTarget::Columns(columns.into_iter().map(Into::into).collect())
    }
}
