//! Dialect adapter.
//!
//! Renders type descriptors and DDL operations into the SQL accepted by one
//! database engine. Rendering is a pure function of its inputs and the dialect
//! passed in; there is no process-wide default dialect.
//!
//! | Dialect | Identifiers | Enums | Unsigned | Spatial | Ranges/arrays |
//! |---------|-------------|-------|----------|---------|---------------|
//! | postgres | `"x"` | CHECK | no | PostGIS | yes |
//! | mysql | `` `x` `` | native | yes | GEOMETRY | no |
//! | sqlite | `"x"` | CHECK | no | no | no |
//! | mssql | `[x]` | CHECK | no | no | no |

mod ddl;
mod types;

pub use ddl::{render_column, render_operation, render_table_rebuild, render_value};
pub use types::render_type;

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Database engines the adapter renders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
    Mssql,
}

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Dialect; 4] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::Mssql,
    ];

    /// Lower-case dialect identifier.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::Mssql => "mssql",
        }
    }

    /// Quote an identifier, doubling embedded quote characters.
    pub fn quote_ident(&self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
            Dialect::Mssql => format!("[{}]", name.replace(']', "]]")),
        }
    }

    /// Quote a string literal.
    pub fn quote_literal(&self, value: &str) -> String {
        match self {
            Dialect::Mssql => format!("N'{}'", value.replace('\'', "''")),
            Dialect::MySql => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''")),
            Dialect::Postgres | Dialect::Sqlite => format!("'{}'", value.replace('\'', "''")),
        }
    }

    /// Whether ENUM columns map to a native type (otherwise a CHECK constraint).
    pub fn has_native_enum(&self) -> bool {
        matches!(self, Dialect::MySql)
    }

    /// Whether columns can be altered in place (sqlite rebuilds the table).
    pub fn supports_alter_column(&self) -> bool {
        !matches!(self, Dialect::Sqlite)
    }

    /// Statement turning foreign-key enforcement on or off for the session, if any.
    pub fn constraint_checks(&self, enabled: bool) -> Option<String> {
        let flag = if enabled { 1 } else { 0 };
        match self {
            Dialect::MySql => Some(format!("SET FOREIGN_KEY_CHECKS = {}", flag)),
            Dialect::Sqlite => Some(format!(
                "PRAGMA foreign_keys = {}",
                if enabled { "ON" } else { "OFF" }
            )),
            Dialect::Postgres | Dialect::Mssql => None,
        }
    }

    /// Whether DROP TABLE can cascade to dependent constraints.
    pub fn supports_drop_cascade(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Statement opening a transaction.
    pub fn begin_transaction(&self) -> &'static str {
        match self {
            Dialect::Postgres | Dialect::Sqlite => "BEGIN",
            Dialect::MySql => "START TRANSACTION",
            Dialect::Mssql => "BEGIN TRANSACTION",
        }
    }

    /// Statement committing a transaction.
    pub fn commit_transaction(&self) -> &'static str {
        match self {
            Dialect::Mssql => "COMMIT TRANSACTION",
            _ => "COMMIT",
        }
    }

    /// Statement rolling a transaction back.
    pub fn rollback_transaction(&self) -> &'static str {
        match self {
            Dialect::Mssql => "ROLLBACK TRANSACTION",
            _ => "ROLLBACK",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "mssql" => Ok(Dialect::Mssql),
            other => Err(Error::validation(format!("unknown dialect `{}`", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(Dialect::Postgres.quote_ident("user"), "\"user\"");
        assert_eq!(Dialect::Sqlite.quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::MySql.quote_ident("a`b"), "`a``b`");
        assert_eq!(Dialect::Mssql.quote_ident("a]b"), "[a]]b]");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(Dialect::Postgres.quote_literal("it's"), "'it''s'");
        assert_eq!(Dialect::Mssql.quote_literal("x"), "N'x'");
        assert_eq!(Dialect::MySql.quote_literal("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_dialect_parse() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.name().parse::<Dialect>().unwrap(), dialect);
        }
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_constraint_checks() {
        assert_eq!(
            Dialect::MySql.constraint_checks(false).unwrap(),
            "SET FOREIGN_KEY_CHECKS = 0"
        );
        assert_eq!(
            Dialect::Sqlite.constraint_checks(true).unwrap(),
            "PRAGMA foreign_keys = ON"
        );
        assert!(Dialect::Postgres.constraint_checks(false).is_none());
    }
}
