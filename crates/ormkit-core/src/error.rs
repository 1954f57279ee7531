//! Core error types.

use crate::dialect::Dialect;
use crate::query::BackendError;
use thiserror::Error;

/// Kind of schema object named by an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A table.
    Table,
    /// A column of a table.
    Column,
    /// An index on a table.
    Index,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Table => write!(f, "table"),
            ObjectKind::Column => write!(f, "column"),
            ObjectKind::Index => write!(f, "index"),
        }
    }
}

/// Errors produced by the catalog, the dialect adapter and the query interface.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed definition or operation operands.
    #[error("validation error: {0}")]
    Validation(String),

    /// An option that is unknown or not applicable to a type.
    #[error("invalid option `{option}` for {type_name}: {reason}")]
    InvalidOption {
        /// Type the option was given for.
        type_name: String,
        /// The offending option key.
        option: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The type has no mapping on the active dialect.
    #[error("type {type_name} is not supported by the {dialect} dialect")]
    UnsupportedType {
        /// Rendered notation of the rejected type.
        type_name: String,
        /// Active dialect.
        dialect: Dialect,
    },

    /// The operation (or one of its options) has no mapping on the active dialect.
    #[error("{operation} is not supported by the {dialect} dialect")]
    UnsupportedOperation {
        /// Description of the rejected operation.
        operation: String,
        /// Active dialect.
        dialect: Dialect,
    },

    /// A referenced table, column or index does not exist.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// What was looked up.
        kind: ObjectKind,
        /// Name that was looked up.
        name: String,
    },

    /// The table to create already exists.
    #[error("table already exists: {0}")]
    DuplicateTable(String),

    /// A new name collides with an existing object.
    #[error("{kind} already exists: {name}")]
    Conflict {
        /// Kind of the colliding object.
        kind: ObjectKind,
        /// The colliding name.
        name: String,
    },

    /// Failure reported by the backend.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The call was cancelled and nothing it submitted took effect.
    #[error("{operation} cancelled, no changes applied")]
    Cancelled {
        /// Operation that was cancelled.
        operation: String,
    },

    /// The deadline passed and nothing the call submitted took effect.
    #[error("{operation} exceeded its deadline, no changes applied")]
    DeadlineExceeded {
        /// Operation that timed out.
        operation: String,
    },

    /// The call was interrupted while a statement was in flight; its effect is unknown.
    #[error("outcome of {operation} is indeterminate: interrupted while executing `{statement}`")]
    Indeterminate {
        /// Operation that was interrupted.
        operation: String,
        /// Statement that had been submitted.
        statement: String,
    },

    /// A multi-step operation failed part way through.
    #[error("{operation} failed after {} completed step(s): {source}", completed.len())]
    Batch {
        /// Operation the batch belongs to.
        operation: String,
        /// Steps that completed before the failure, in order.
        completed: Vec<String>,
        /// The failure that interrupted the batch.
        source: Box<Error>,
    },
}

impl Error {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(kind: ObjectKind, name: impl Into<String>) -> Self {
        Error::Conflict {
            kind,
            name: name.into(),
        }
    }

    /// The innermost error, looking through batch wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Batch { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the backend state after this error is unknown.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self.root_cause(), Error::Indeterminate { .. })
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
