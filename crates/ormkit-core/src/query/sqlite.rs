//! SQLite backend on a single rusqlite connection.

use super::backend::{
    Backend, BackendError, ColumnSnapshot, ExecOutcome, ForeignKeySnapshot, IndexSnapshot,
    SchemaSnapshot, TableSnapshot,
};
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// SQLite database behind a shared connection.
///
/// Statements run on the blocking thread pool; a call whose future is dropped
/// still runs to completion there. The connection lock is taken in call order
/// and held by the blocking task, so a later call never overtakes an
/// abandoned one.
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening sqlite database");
        Self::from_connection(Connection::open(path).map_err(backend_error)?)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, BackendError> {
        Self::from_connection(Connection::open_in_memory().map_err(backend_error)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, BackendError> {
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(backend_error)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn).lock_owned().await;
        tokio::task::spawn_blocking(move || f(&conn))
        .await
        .map_err(|e| BackendError::new(format!("sqlite task failed: {}", e)))?
        .map_err(backend_error)
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn execute(&self, sql: &str) -> Result<ExecOutcome, BackendError> {
        let sql = sql.to_string();
        let rows = self.with_conn(move |conn| conn.execute(&sql, [])).await?;
        Ok(ExecOutcome {
            rows_affected: rows as u64,
        })
    }

    async fn introspect_schema(&self) -> Result<SchemaSnapshot, BackendError> {
        self.with_conn(|conn| {
            let names = table_names(conn)?;
            let tables = names
                .iter()
                .map(|name| read_table(conn, name))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(SchemaSnapshot { tables })
        })
        .await
    }

    async fn introspect_table(&self, name: &str) -> Result<Option<TableSnapshot>, BackendError> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            if table_names(conn)?.contains(&name) {
                read_table(conn, &name).map(Some)
            } else {
                Ok(None)
            }
        })
        .await
    }
}

fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt.query_map([], |row| row.get(0))?;
    names.collect()
}

fn read_table(conn: &Connection, name: &str) -> rusqlite::Result<TableSnapshot> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let columns = stmt
        .query_map([name], |row| {
            Ok(ColumnSnapshot {
                name: row.get(0)?,
                data_type: row.get(1)?,
                allow_null: row.get::<_, i64>(2)? == 0,
                default_value: row.get(3)?,
                primary_key: row.get::<_, i64>(4)? > 0,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    // A NULL target column means the parent's primary key.
    let mut stmt = conn.prepare(
        "SELECT \"from\", \"table\", \"to\", on_delete, on_update \
         FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )?;
    let foreign_keys = stmt
        .query_map([name], |row| {
            Ok(ForeignKeySnapshot {
                column: row.get(0)?,
                referenced_table: row.get(1)?,
                referenced_column: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                on_delete: action(row.get(3)?),
                on_update: action(row.get(4)?),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT l.name, l.\"unique\", m.sql FROM pragma_index_list(?1) AS l \
         LEFT JOIN sqlite_master AS m ON m.type = 'index' AND m.name = l.name \
         WHERE l.origin = 'c' ORDER BY l.name",
    )?;
    let listed = stmt
        .query_map([name], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)? != 0,
                row.get::<_, Option<String>>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut indexes = Vec::with_capacity(listed.len());
    let mut stmt =
        conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
    for (index, unique, sql) in listed {
        let columns = stmt
            .query_map([&index], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        indexes.push(IndexSnapshot {
            name: index,
            columns,
            unique,
            sql,
        });
    }

    let sql = conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;

    Ok(TableSnapshot {
        name: name.to_string(),
        columns,
        foreign_keys,
        indexes,
        sql,
    })
}

/// Referential action as reported by sqlite; NO ACTION is the default.
fn action(reported: String) -> Option<String> {
    (reported != "NO ACTION").then_some(reported)
}

fn backend_error(err: rusqlite::Error) -> BackendError {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => BackendError {
            code: Some(failure.extended_code.to_string()),
            message: message.unwrap_or_else(|| failure.to_string()),
        },
        other => BackendError::new(other.to_string()),
    }
}
