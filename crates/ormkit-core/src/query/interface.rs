//! Schema-migration query interface.
//!
//! Each operation validates its operands, renders statements for the
//! configured dialect, checks existence through introspection, and submits
//! the statements one at a time.

use super::backend::{Backend, ExecOutcome, SchemaSnapshot, TableSnapshot};
use super::config::QueryInterfaceConfig;
use super::context::{CallContext, Interruption};
use crate::catalog::{ColumnDef, IndexDef, IndexTarget, TableDef};
use crate::ddl::DdlOperation;
use crate::dialect::{render_operation, render_table_rebuild, Dialect};
use crate::error::{Error, ObjectKind, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Options for [`QueryInterface::create_table`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateTableOptions {
    /// Succeed without changes when the table already exists.
    pub if_not_exists: bool,
}

/// Options for [`QueryInterface::drop_table`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DropTableOptions {
    /// Succeed without changes when the table does not exist.
    pub if_exists: bool,
    /// Drop dependent constraints too (postgres).
    pub cascade: bool,
}

/// Column metadata returned by [`QueryInterface::describe_table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescription {
    pub name: String,
    /// Type as the backend reports it.
    #[serde(rename = "type")]
    pub data_type: String,
    pub allow_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// Table metadata returned by [`QueryInterface::describe_table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescription {
    pub name: String,
    /// Columns in table order.
    pub columns: Vec<ColumnDescription>,
}

impl TableDescription {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescription> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl From<TableSnapshot> for TableDescription {
    fn from(table: TableSnapshot) -> Self {
        Self {
            name: table.name,
            columns: table
                .columns
                .into_iter()
                .map(|c| ColumnDescription {
                    name: c.name,
                    data_type: c.data_type,
                    allow_null: c.allow_null,
                    default_value: c.default_value,
                    primary_key: c.primary_key,
                })
                .collect(),
        }
    }
}

/// Issues schema changes against one backend in one dialect.
///
/// Holds no state between calls; clones share the backend.
#[derive(Clone)]
pub struct QueryInterface {
    backend: Arc<dyn Backend>,
    config: QueryInterfaceConfig,
}

impl std::fmt::Debug for QueryInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryInterface")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl QueryInterface {
    /// Create a query interface over `backend`.
    pub fn new(backend: Arc<dyn Backend>, config: QueryInterfaceConfig) -> Self {
        Self { backend, config }
    }

    /// The active dialect.
    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    /// The configuration.
    pub fn config(&self) -> &QueryInterfaceConfig {
        &self.config
    }

    /// Create a table and then its declared indexes.
    #[instrument(skip(self, table, ctx), fields(dialect = %self.dialect(), table = %table.name))]
    pub async fn create_table(
        &self,
        table: &TableDef,
        options: CreateTableOptions,
        ctx: &CallContext,
    ) -> Result<()> {
        const OP: &str = "createTable";
        table.validate()?;
        let statements = render_operation(
            self.dialect(),
            &DdlOperation::CreateTable {
                table: table.clone(),
                if_not_exists: options.if_not_exists,
            },
        )?;

        let ctx = self.effective(ctx);
        if self.introspect_table(OP, &table.name, &ctx).await?.is_some() {
            if options.if_not_exists {
                warn!("Table already exists, skipping create");
                return Ok(());
            }
            return Err(Error::DuplicateTable(table.name.clone()));
        }

        self.run_steps(OP, labelled(statements), &ctx).await?;
        info!(columns = table.columns.len(), indexes = table.indexes.len(), "Created table");
        Ok(())
    }

    /// Drop one table.
    #[instrument(skip(self, ctx), fields(dialect = %self.dialect()))]
    pub async fn drop_table(
        &self,
        name: &str,
        options: DropTableOptions,
        ctx: &CallContext,
    ) -> Result<()> {
        const OP: &str = "dropTable";
        let op = DdlOperation::DropTable {
            name: name.to_string(),
            if_exists: options.if_exists,
            cascade: options.cascade,
        };
        op.validate()?;
        let statements = render_operation(self.dialect(), &op)?;

        let ctx = self.effective(ctx);
        if self.introspect_table(OP, name, &ctx).await?.is_none() {
            if options.if_exists {
                debug!("Table does not exist, nothing to drop");
                return Ok(());
            }
            return Err(Error::not_found(ObjectKind::Table, name));
        }

        self.run_steps(OP, labelled(statements), &ctx).await?;
        info!("Dropped table");
        Ok(())
    }

    /// Drop every table, children before the tables they reference.
    ///
    /// Returns the dropped table names in drop order. When a drop fails the
    /// error is [`Error::Batch`] listing the tables dropped before it.
    #[instrument(skip(self, ctx), fields(dialect = %self.dialect()))]
    pub async fn drop_all_tables(&self, ctx: &CallContext) -> Result<Vec<String>> {
        const OP: &str = "dropAllTables";
        let ctx = self.effective(ctx);
        let schema = self.introspect(OP, &ctx).await?;
        let order = drop_order(&schema);
        if order.is_empty() {
            debug!("No tables to drop");
            return Ok(order);
        }
        self.drop_tables(OP, order, &ctx).await
    }

    /// Rename a table.
    #[instrument(skip(self, ctx), fields(dialect = %self.dialect()))]
    pub async fn rename_table(&self, from: &str, to: &str, ctx: &CallContext) -> Result<()> {
        const OP: &str = "renameTable";
        let op = DdlOperation::RenameTable {
            from: from.to_string(),
            to: to.to_string(),
        };
        op.validate()?;
        let statements = render_operation(self.dialect(), &op)?;

        let ctx = self.effective(ctx);
        let schema = self.introspect(OP, &ctx).await?;
        if schema.table(from).is_none() {
            return Err(Error::not_found(ObjectKind::Table, from));
        }
        if schema.table(to).is_some() {
            return Err(Error::conflict(ObjectKind::Table, to));
        }

        self.run_steps(OP, labelled(statements), &ctx).await?;
        info!("Renamed table");
        Ok(())
    }

    /// Add a column to an existing table.
    #[instrument(skip(self, column, ctx), fields(dialect = %self.dialect(), column = %column.name))]
    pub async fn add_column(&self, table: &str, column: &ColumnDef, ctx: &CallContext) -> Result<()> {
        const OP: &str = "addColumn";
        let op = DdlOperation::AddColumn {
            table: table.to_string(),
            column: column.clone(),
        };
        op.validate()?;
        let statements = render_operation(self.dialect(), &op)?;

        let ctx = self.effective(ctx);
        let snapshot = self.require_table(OP, table, &ctx).await?;
        if snapshot.column(&column.name).is_some() {
            return Err(Error::conflict(
                ObjectKind::Column,
                qualified(table, &column.name),
            ));
        }

        self.run_steps(OP, labelled(statements), &ctx).await?;
        info!("Added column");
        Ok(())
    }

    /// Remove a column.
    #[instrument(skip(self, ctx), fields(dialect = %self.dialect()))]
    pub async fn remove_column(&self, table: &str, column: &str, ctx: &CallContext) -> Result<()> {
        const OP: &str = "removeColumn";
        let op = DdlOperation::RemoveColumn {
            table: table.to_string(),
            column: column.to_string(),
        };
        op.validate()?;
        let statements = render_operation(self.dialect(), &op)?;

        let ctx = self.effective(ctx);
        let snapshot = self.require_table(OP, table, &ctx).await?;
        if snapshot.column(column).is_none() {
            return Err(Error::not_found(ObjectKind::Column, qualified(table, column)));
        }

        self.run_steps(OP, labelled(statements), &ctx).await?;
        info!("Removed column");
        Ok(())
    }

    /// Replace the definition of an existing column, matched by name.
    ///
    /// On sqlite the table is rebuilt from its introspected definition.
    #[instrument(skip(self, column, ctx), fields(dialect = %self.dialect(), column = %column.name))]
    pub async fn change_column(
        &self,
        table: &str,
        column: &ColumnDef,
        ctx: &CallContext,
    ) -> Result<()> {
        const OP: &str = "changeColumn";
        let op = DdlOperation::ChangeColumn {
            table: table.to_string(),
            column: column.clone(),
        };
        op.validate()?;

        let ctx = self.effective(ctx);
        let snapshot = self.require_table(OP, table, &ctx).await?;
        if snapshot.column(&column.name).is_none() {
            return Err(Error::not_found(
                ObjectKind::Column,
                qualified(table, &column.name),
            ));
        }

        if self.dialect().supports_alter_column() {
            let statements = render_operation(self.dialect(), &op)?;
            self.run_steps(OP, labelled(statements), &ctx).await?;
        } else {
            let statements = render_table_rebuild(&snapshot, column)?;
            debug!(statements = statements.len(), "Rebuilding table");
            self.run_unchecked(OP, labelled(statements), &ctx).await?;
        }
        info!("Changed column");
        Ok(())
    }

    /// Rename a column.
    #[instrument(skip(self, ctx), fields(dialect = %self.dialect()))]
    pub async fn rename_column(
        &self,
        table: &str,
        from: &str,
        to: &str,
        ctx: &CallContext,
    ) -> Result<()> {
        const OP: &str = "renameColumn";
        let op = DdlOperation::RenameColumn {
            table: table.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        };
        op.validate()?;
        let statements = render_operation(self.dialect(), &op)?;

        let ctx = self.effective(ctx);
        let snapshot = self.require_table(OP, table, &ctx).await?;
        if snapshot.column(from).is_none() {
            return Err(Error::not_found(ObjectKind::Column, qualified(table, from)));
        }
        if snapshot.column(to).is_some() {
            return Err(Error::conflict(ObjectKind::Column, qualified(table, to)));
        }

        self.run_steps(OP, labelled(statements), &ctx).await?;
        info!("Renamed column");
        Ok(())
    }

    /// Create an index and return its resolved name.
    #[instrument(skip(self, index, ctx), fields(dialect = %self.dialect(), table = %index.table))]
    pub async fn add_index(&self, index: &IndexDef, ctx: &CallContext) -> Result<String> {
        const OP: &str = "addIndex";
        let op = DdlOperation::AddIndex {
            index: index.clone(),
        };
        op.validate()?;
        let statements = render_operation(self.dialect(), &op)?;
        let name = index.resolved_name();

        let ctx = self.effective(ctx);
        let schema = self.introspect(OP, &ctx).await?;
        let snapshot = schema
            .table(&index.table)
            .ok_or_else(|| Error::not_found(ObjectKind::Table, &index.table))?;
        for column in index.column_names() {
            if snapshot.column(column).is_none() {
                return Err(Error::not_found(
                    ObjectKind::Column,
                    qualified(&index.table, column),
                ));
            }
        }
        let taken = match self.dialect() {
            // Index names are scoped to their table.
            Dialect::MySql | Dialect::Mssql => snapshot.index(&name).is_some(),
            Dialect::Postgres | Dialect::Sqlite => schema.has_index(&name),
        };
        if taken {
            return Err(Error::conflict(ObjectKind::Index, name));
        }

        self.run_steps(OP, labelled(statements), &ctx).await?;
        info!(index = %name, "Created index");
        Ok(name)
    }

    /// Remove an index named explicitly or by the columns it covers.
    #[instrument(skip(self, target, ctx), fields(dialect = %self.dialect()))]
    pub async fn remove_index(
        &self,
        table: &str,
        target: impl Into<IndexTarget>,
        ctx: &CallContext,
    ) -> Result<()> {
        const OP: &str = "removeIndex";
        let name = target.into().resolve(table);
        let op = DdlOperation::RemoveIndex {
            table: table.to_string(),
            name: name.clone(),
        };
        op.validate()?;
        let statements = render_operation(self.dialect(), &op)?;

        let ctx = self.effective(ctx);
        let snapshot = self.require_table(OP, table, &ctx).await?;
        if snapshot.index(&name).is_none() {
            return Err(Error::not_found(ObjectKind::Index, name));
        }

        self.run_steps(OP, labelled(statements), &ctx).await?;
        info!(index = %name, "Removed index");
        Ok(())
    }

    /// Describe the columns of a table, in table order.
    #[instrument(skip(self, ctx), fields(dialect = %self.dialect()))]
    pub async fn describe_table(&self, name: &str, ctx: &CallContext) -> Result<TableDescription> {
        let ctx = self.effective(ctx);
        let snapshot = self.require_table("describeTable", name, &ctx).await?;
        Ok(snapshot.into())
    }

    /// List table names, sorted and de-duplicated.
    #[instrument(skip(self, ctx), fields(dialect = %self.dialect()))]
    pub async fn show_all_tables(&self, ctx: &CallContext) -> Result<Vec<String>> {
        let ctx = self.effective(ctx);
        let schema = self.introspect("showAllTables", &ctx).await?;
        let names: BTreeSet<String> = schema.tables.into_iter().map(|t| t.name).collect();
        Ok(names.into_iter().collect())
    }

    /// Run one structured operation through the matching method.
    pub async fn apply(&self, op: &DdlOperation, ctx: &CallContext) -> Result<()> {
        match op {
            DdlOperation::CreateTable {
                table,
                if_not_exists,
            } => {
                self.create_table(
                    table,
                    CreateTableOptions {
                        if_not_exists: *if_not_exists,
                    },
                    ctx,
                )
                .await
            }
            DdlOperation::DropTable {
                name,
                if_exists,
                cascade,
            } => {
                self.drop_table(
                    name,
                    DropTableOptions {
                        if_exists: *if_exists,
                        cascade: *cascade,
                    },
                    ctx,
                )
                .await
            }
            DdlOperation::DropAllTables { tables } => {
                op.validate()?;
                if tables.is_empty() {
                    return Ok(());
                }
                let ctx = self.effective(ctx);
                self.drop_tables(op.name(), tables.clone(), &ctx).await.map(|_| ())
            }
            DdlOperation::RenameTable { from, to } => self.rename_table(from, to, ctx).await,
            DdlOperation::AddColumn { table, column } => self.add_column(table, column, ctx).await,
            DdlOperation::RemoveColumn { table, column } => {
                self.remove_column(table, column, ctx).await
            }
            DdlOperation::ChangeColumn { table, column } => {
                self.change_column(table, column, ctx).await
            }
            DdlOperation::RenameColumn { table, from, to } => {
                self.rename_column(table, from, to, ctx).await
            }
            DdlOperation::AddIndex { index } => self.add_index(index, ctx).await.map(|_| ()),
            DdlOperation::RemoveIndex { table, name } => {
                self.remove_index(table, IndexTarget::Name(name.clone()), ctx)
                    .await
            }
        }
    }

    /// Run operations in order, stopping at the first failure.
    ///
    /// A failure after at least one applied operation is reported as
    /// [`Error::Batch`] listing the applied ones.
    #[instrument(skip(self, ops, ctx), fields(dialect = %self.dialect(), operations = ops.len()))]
    pub async fn apply_all(&self, ops: &[DdlOperation], ctx: &CallContext) -> Result<()> {
        let mut completed = Vec::with_capacity(ops.len());
        for op in ops {
            if let Err(err) = self.apply(op, ctx).await {
                return Err(batch_error("applyAll", completed, err));
            }
            completed.push(match op.table() {
                Some(table) => format!("{} {}", op.name(), table),
                None => op.name().to_string(),
            });
        }
        Ok(())
    }

    fn effective(&self, ctx: &CallContext) -> CallContext {
        ctx.or_timeout(self.config.statement_timeout)
    }

    async fn drop_tables(
        &self,
        operation: &str,
        tables: Vec<String>,
        ctx: &CallContext,
    ) -> Result<Vec<String>> {
        let mut steps = Vec::with_capacity(tables.len());
        for table in tables {
            let op = DdlOperation::DropTable {
                name: table.clone(),
                if_exists: true,
                cascade: self.dialect().supports_drop_cascade(),
            };
            for sql in render_operation(self.dialect(), &op)? {
                steps.push((table.clone(), sql));
            }
        }

        let dropped = self.run_unchecked(operation, steps, ctx).await?;
        info!(tables = dropped.len(), "Dropped tables");
        Ok(dropped)
    }

    /// Run steps with foreign-key checks turned off where the dialect allows it,
    /// restoring them afterwards whatever the outcome.
    async fn run_unchecked(
        &self,
        operation: &str,
        steps: Vec<(String, String)>,
        ctx: &CallContext,
    ) -> Result<Vec<String>> {
        let (Some(off), Some(on)) = (
            self.dialect().constraint_checks(false),
            self.dialect().constraint_checks(true),
        ) else {
            return self.run_steps(operation, steps, ctx).await;
        };

        let result = match self.submit(operation, &off, ctx).await {
            Ok(_) => self.run_steps(operation, steps, ctx).await,
            // Nothing reached the backend.
            Err(err @ (Error::Cancelled { .. } | Error::DeadlineExceeded { .. })) => {
                return Err(err)
            }
            // The backend may still apply it, so checks are restored below.
            Err(err) => Err(err),
        };

        // Restored even when the call was interrupted.
        debug!(sql = %on, "Restoring constraint checks");
        match (self.backend.execute(&on).await, result) {
            (Ok(_), Ok(completed)) => Ok(completed),
            (Ok(_), Err(err)) => {
                warn!(error = %err, "Restored constraint checks after failure");
                Err(err)
            }
            (Err(restore), Ok(_)) => Err(restore.into()),
            (Err(restore), Err(err)) => {
                warn!(error = %restore, "Failed to restore constraint checks");
                Err(err)
            }
        }
    }

    /// Submit `(label, statement)` steps in order and return the labels of the
    /// completed steps, de-duplicated in order.
    async fn run_steps(
        &self,
        operation: &str,
        steps: Vec<(String, String)>,
        ctx: &CallContext,
    ) -> Result<Vec<String>> {
        let transactional = self.config.transactional && steps.len() > 1;
        if transactional {
            self.submit(operation, self.dialect().begin_transaction(), ctx)
                .await?;
        }

        let mut completed: Vec<String> = Vec::with_capacity(steps.len());
        for (label, sql) in steps {
            if let Err(err) = self.submit(operation, &sql, ctx).await {
                if transactional && self.rollback(operation).await {
                    return Err(rolled_back(operation, err, ctx));
                }
                return Err(batch_error(operation, completed, err));
            }
            if completed.last() != Some(&label) {
                completed.push(label);
            }
        }

        if transactional {
            if let Err(err) = self
                .submit(operation, self.dialect().commit_transaction(), ctx)
                .await
            {
                // An interrupted COMMIT may have landed before the rollback.
                if self.rollback(operation).await && !err.is_indeterminate() {
                    return Err(err);
                }
                return Err(batch_error(operation, completed, err));
            }
        }
        Ok(completed)
    }

    /// Roll back an open transaction; true when that undid the batch.
    async fn rollback(&self, operation: &str) -> bool {
        let sql = self.dialect().rollback_transaction();
        debug!(sql, "Rolling back");
        match self.backend.execute(sql).await {
            // MySQL commits DDL implicitly, so nothing was undone.
            Ok(_) => self.dialect() != Dialect::MySql,
            Err(err) => {
                warn!(operation, error = %err, "Rollback failed");
                false
            }
        }
    }

    /// Submit one statement, racing it against cancellation and the deadline.
    async fn submit(&self, operation: &str, sql: &str, ctx: &CallContext) -> Result<ExecOutcome> {
        if let Some(interruption) = ctx.check() {
            return Err(before_submission(operation, interruption));
        }
        debug!(sql, "Submitting statement");
        tokio::select! {
            biased;
            result = self.backend.execute(sql) => Ok(result?),
            _ = ctx.interrupted() => Err(Error::Indeterminate {
                operation: operation.to_string(),
                statement: sql.to_string(),
            }),
        }
    }

    async fn introspect(&self, operation: &str, ctx: &CallContext) -> Result<SchemaSnapshot> {
        if let Some(interruption) = ctx.check() {
            return Err(before_submission(operation, interruption));
        }
        tokio::select! {
            biased;
            result = self.backend.introspect_schema() => Ok(result?),
            interruption = ctx.interrupted() => Err(before_submission(operation, interruption)),
        }
    }

    async fn introspect_table(
        &self,
        operation: &str,
        name: &str,
        ctx: &CallContext,
    ) -> Result<Option<TableSnapshot>> {
        if let Some(interruption) = ctx.check() {
            return Err(before_submission(operation, interruption));
        }
        tokio::select! {
            biased;
            result = self.backend.introspect_table(name) => Ok(result?),
            interruption = ctx.interrupted() => Err(before_submission(operation, interruption)),
        }
    }

    async fn require_table(
        &self,
        operation: &str,
        name: &str,
        ctx: &CallContext,
    ) -> Result<TableSnapshot> {
        self.introspect_table(operation, name, ctx)
            .await?
            .ok_or_else(|| Error::not_found(ObjectKind::Table, name))
    }
}

/// Order tables so that every table is dropped before the tables it references.
///
/// Tables caught in reference cycles, and the tables they reference, come last
/// in name order.
pub(crate) fn drop_order(schema: &SchemaSnapshot) -> Vec<String> {
    let mut remaining: BTreeSet<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    let mut order = Vec::with_capacity(remaining.len());
    loop {
        let ready: Vec<&str> = remaining
            .iter()
            .copied()
            .filter(|name| {
                !schema.tables.iter().any(|t| {
                    t.name != *name
                        && remaining.contains(t.name.as_str())
                        && t.foreign_keys.iter().any(|fk| fk.referenced_table == *name)
                })
            })
            .collect();
        if ready.is_empty() {
            break;
        }
        for name in ready {
            remaining.remove(name);
            order.push(name.to_string());
        }
    }
    order.extend(remaining.into_iter().map(str::to_string));
    order
}

fn labelled(statements: Vec<String>) -> Vec<(String, String)> {
    statements.into_iter().map(|s| (s.clone(), s)).collect()
}

fn qualified(table: &str, name: &str) -> String {
    format!("{}.{}", table, name)
}

fn before_submission(operation: &str, interruption: Interruption) -> Error {
    let operation = operation.to_string();
    match interruption {
        Interruption::Cancelled => Error::Cancelled { operation },
        Interruption::DeadlineExceeded => Error::DeadlineExceeded { operation },
    }
}

/// The error for a failed step whose transaction was rolled back.
///
/// An interrupted statement left no trace once rolled back, so it is
/// reported as the interruption itself.
fn rolled_back(operation: &str, err: Error, ctx: &CallContext) -> Error {
    match (err, ctx.check()) {
        (Error::Indeterminate { .. }, Some(interruption)) => {
            before_submission(operation, interruption)
        }
        (err, _) => err,
    }
}

fn batch_error(operation: &str, completed: Vec<String>, err: Error) -> Error {
    if completed.is_empty() {
        return err;
    }
    Error::Batch {
        operation: operation.to_string(),
        completed,
        source: Box::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ForeignKeySnapshot;

    fn table(name: &str, references: &[&str]) -> TableSnapshot {
        TableSnapshot {
            name: name.to_string(),
            columns: vec![],
            foreign_keys: references
                .iter()
                .map(|r| ForeignKeySnapshot {
                    column: format!("{}Id", r),
                    referenced_table: r.to_string(),
                    referenced_column: "id".to_string(),
                    on_delete: None,
                    on_update: None,
                })
                .collect(),
            indexes: vec![],
            sql: None,
        }
    }

    #[test]
    fn test_drop_order_children_first() {
        let schema = SchemaSnapshot {
            tables: vec![table("A", &[]), table("B", &["A"]), table("C", &["B", "A"])],
        };
        assert_eq!(drop_order(&schema), ["C", "B", "A"]);
    }

    #[test]
    fn test_drop_order_self_reference_and_cycles() {
        let schema = SchemaSnapshot {
            tables: vec![
                table("Tree", &["Tree"]),
                table("X", &["Y"]),
                table("Y", &["X"]),
                table("Z", &["X"]),
            ],
        };
        assert_eq!(drop_order(&schema), ["Tree", "Z", "X", "Y"]);
    }

    #[test]
    fn test_batch_error_only_wraps_after_progress() {
        let err = batch_error("dropAllTables", vec![], Error::validation("x"));
        assert!(matches!(err, Error::Validation(_)));

        let err = batch_error("dropAllTables", vec!["B".into()], Error::validation("x"));
        match err {
            Error::Batch { completed, .. } => assert_eq!(completed, ["B"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
