//! Query interface and the backends it drives.

mod backend;
mod config;
mod context;
mod interface;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use backend::{
    Backend, BackendError, ColumnSnapshot, ExecOutcome, ForeignKeySnapshot, IndexSnapshot,
    SchemaSnapshot, TableSnapshot,
};
pub use config::QueryInterfaceConfig;
pub use context::CallContext;
pub use interface::{
    ColumnDescription, CreateTableOptions, DropTableOptions, QueryInterface, TableDescription,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
