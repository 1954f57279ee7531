//! Column definitions.

use super::types::TypeDescriptor;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Referential action applied to a foreign key on update or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    /// Propagate the change to referencing rows.
    Cascade,
    /// Reject the change while referencing rows exist.
    Restrict,
    /// Set referencing columns to NULL.
    SetNull,
    /// Defer the check to the end of the statement.
    NoAction,
}

impl ReferentialAction {
    /// SQL spelling of the action.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

/// Foreign-key reference from a column to a key of another table.
///
/// The target table is named, not linked; its existence is checked by the
/// backend when the statement runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    #[serde(default = "default_reference_key")]
    pub key: String,
    /// Action on update of the referenced key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
    /// Action on delete of the referenced row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
}

fn default_reference_key() -> String {
    "id".to_string()
}

impl Reference {
    /// Reference `table.id`.
    pub fn to(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key: default_reference_key(),
            on_update: None,
            on_delete: None,
        }
    }

    /// Set the referenced column.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the update action.
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Set the delete action.
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }
}

/// Functions usable as column defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefaultFunction {
    /// The current timestamp at insert time.
    Now,
}

/// Default value of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// `{"function": "now"}`
    Function { function: DefaultFunction },
    /// `{"raw": "<sql expression>"}`, emitted verbatim.
    Raw { raw: String },
}

impl DefaultValue {
    /// The current timestamp.
    pub fn now() -> Self {
        DefaultValue::Function {
            function: DefaultFunction::Now,
        }
    }

    /// A raw SQL expression.
    pub fn raw(sql: impl Into<String>) -> Self {
        DefaultValue::Raw { raw: sql.into() }
    }
}

impl From<bool> for DefaultValue {
    fn from(v: bool) -> Self {
        DefaultValue::Bool(v)
    }
}

impl From<i64> for DefaultValue {
    fn from(v: i64) -> Self {
        DefaultValue::Int(v)
    }
}

impl From<&str> for DefaultValue {
    fn from(v: &str) -> Self {
        DefaultValue::Text(v.to_string())
    }
}

/// A column definition within a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    /// Column name (unique within its table).
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub data_type: TypeDescriptor,
    /// Whether NULL is allowed.
    #[serde(default = "default_allow_null")]
    pub allow_null: bool,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<DefaultValue>,
    /// Part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Value generated by the database.
    #[serde(default)]
    pub auto_increment: bool,
    /// Single-column uniqueness constraint.
    #[serde(default)]
    pub unique: bool,
    /// Column comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Foreign-key reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Reference>,
}

fn default_allow_null() -> bool {
    true
}

impl ColumnDef {
    /// Create a nullable column.
    pub fn new(name: impl Into<String>, data_type: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            data_type,
            allow_null: true,
            default_value: None,
            primary_key: false,
            auto_increment: false,
            unique: false,
            comment: None,
            references: None,
        }
    }

    /// Disallow NULL.
    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    /// Mark as (part of) the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.allow_null = false;
        self
    }

    /// Mark as auto-incrementing.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Add a uniqueness constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the column comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Add a foreign-key reference.
    pub fn references(mut self, reference: Reference) -> Self {
        self.references = Some(reference);
        self
    }

    /// Whether the column is stored (not VIRTUAL).
    pub fn is_stored(&self) -> bool {
        !self.data_type.is_virtual()
    }

    /// Effective nullability; primary-key columns are never nullable.
    pub fn is_nullable(&self) -> bool {
        self.allow_null && !self.primary_key
    }

    /// Check the column invariants.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("column name must not be empty"));
        }
        if self.auto_increment {
            if !self.data_type.name().is_integer() {
                return Err(Error::validation(format!(
                    "column `{}`: autoIncrement requires an integer type, got {}",
                    self.name, self.data_type
                )));
            }
            if !self.primary_key {
                return Err(Error::validation(format!(
                    "column `{}`: autoIncrement requires primaryKey",
                    self.name
                )));
            }
        }
        if let Some(reference) = &self.references {
            if reference.table.trim().is_empty() || reference.key.trim().is_empty() {
                return Err(Error::validation(format!(
                    "column `{}`: reference must name a table and a key",
                    self.name
                )));
            }
            let sets_null = [reference.on_update, reference.on_delete]
                .contains(&Some(ReferentialAction::SetNull));
            if sets_null && !self.is_nullable() {
                return Err(Error::validation(format!(
                    "column `{}`: SET NULL action requires a nullable column",
                    self.name
                )));
            }
        }
        if let Some(DefaultValue::Float(f)) = &self.default_value {
            if !f.is_finite() {
                return Err(Error::validation(format!(
                    "column `{}`: default {} is not a finite number",
                    self.name, f
                )));
            }
        }
        if !self.is_stored()
            && (self.default_value.is_some()
                || self.primary_key
                || self.unique
                || self.references.is_some())
        {
            return Err(Error::validation(format!(
                "column `{}`: virtual columns cannot carry defaults, keys or references",
                self.name
            )));
        }
        Ok(())
    }
}
