//! Query interface configuration.

use crate::dialect::Dialect;
use std::time::Duration;

/// Configuration of a [`QueryInterface`](super::QueryInterface).
#[derive(Debug, Clone)]
pub struct QueryInterfaceConfig {
    /// Dialect statements are rendered for.
    pub dialect: Dialect,

    /// Wrap multi-statement operations in a transaction.
    ///
    /// MySQL commits DDL implicitly, so on that dialect the wrapper only
    /// groups the statements.
    pub transactional: bool,

    /// Timeout applied to calls whose context carries no deadline.
    pub statement_timeout: Option<Duration>,
}

impl QueryInterfaceConfig {
    /// Create a non-transactional configuration without a timeout.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            transactional: false,
            statement_timeout: None,
        }
    }

    /// Set whether multi-statement operations run in a transaction.
    pub fn with_transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    /// Set the default timeout for each call.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = Some(timeout);
        self
    }
}
