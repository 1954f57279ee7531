//! ormkit Core - Type catalog, dialect adapter, and schema query interface.
//!
//! Column types are described once with [`TypeDescriptor`], tables with
//! [`TableDef`], and schema changes with [`DdlOperation`]. The [`dialect`]
//! module renders them for PostgreSQL, MySQL, SQLite, or SQL Server, and
//! [`QueryInterface`] applies them to a [`Backend`](query::Backend).

pub mod catalog;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod query;

pub use catalog::{
    ColumnDef, DefaultValue, IndexDef, IndexKind, IndexTarget, Reference, ReferentialAction,
    TableDef, TableOptions, TypeDescriptor, TypeName, TypeOptions,
};
pub use ddl::DdlOperation;
pub use dialect::Dialect;
pub use error::{Error, ObjectKind, Result};
pub use query::{
    Backend, BackendError, CallContext, CreateTableOptions, DropTableOptions, QueryInterface,
    QueryInterfaceConfig, TableDescription,
};

#[cfg(feature = "sqlite")]
pub use query::SqliteBackend;
