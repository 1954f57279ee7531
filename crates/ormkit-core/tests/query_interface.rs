//! Integration tests for the query interface against SQLite.

#![cfg(feature = "sqlite")]

use std::sync::Arc;

use async_trait::async_trait;
use ormkit_core::catalog::{IndexDef, TypeName};
use ormkit_core::query::{
    Backend, BackendError, CallContext, CreateTableOptions, DropTableOptions, ExecOutcome,
    QueryInterface, QueryInterfaceConfig, SchemaSnapshot, SqliteBackend,
};
use ormkit_core::{
    ColumnDef, DdlOperation, DefaultValue, Dialect, Error, ObjectKind, Reference,
    ReferentialAction, TableDef, TypeDescriptor,
};
use tokio_util::sync::CancellationToken;

struct TestContext {
    backend: Arc<SqliteBackend>,
    qi: QueryInterface,
    ctx: CallContext,
}

impl TestContext {
    fn new() -> Self {
        Self::with_config(QueryInterfaceConfig::new(Dialect::Sqlite))
    }

    fn with_config(config: QueryInterfaceConfig) -> Self {
        let backend = Arc::new(SqliteBackend::open_in_memory().unwrap());
        let qi = QueryInterface::new(backend.clone(), config);
        Self {
            backend,
            qi,
            ctx: CallContext::new(),
        }
    }

    async fn create(&self, table: &TableDef) {
        self.qi
            .create_table(table, CreateTableOptions::default(), &self.ctx)
            .await
            .unwrap();
    }

    async fn tables(&self) -> Vec<String> {
        self.qi.show_all_tables(&self.ctx).await.unwrap()
    }
}

fn id_column() -> ColumnDef {
    ColumnDef::new("id", TypeDescriptor::integer())
        .primary_key()
        .auto_increment()
}

fn person() -> TableDef {
    TableDef::new("Person")
        .with_column(id_column())
        .with_column(ColumnDef::new("name", TypeDescriptor::string(255).unwrap()))
        .with_column(ColumnDef::new("signature", TypeDescriptor::text()))
}

fn table_a() -> TableDef {
    TableDef::new("A").with_column(id_column())
}

fn table_b() -> TableDef {
    TableDef::new("B")
        .with_column(id_column())
        .with_column(ColumnDef::new("aId", TypeDescriptor::integer()).references(Reference::to("A")))
}

#[tokio::test]
async fn test_describe_table_after_create() {
    let t = TestContext::new();
    let table = TableDef::new("Person")
        .with_column(id_column())
        .with_column(ColumnDef::new("name", TypeDescriptor::string(255).unwrap()));
    t.create(&table).await;

    let description = t.qi.describe_table("Person", &t.ctx).await.unwrap();
    assert_eq!(description.columns.len(), 2);

    let id = &description.columns[0];
    assert_eq!(id.name, "id");
    assert_eq!(id.data_type, "INTEGER");
    assert!(id.primary_key);
    assert!(!id.allow_null);
    assert_eq!(id.default_value, None);

    let name = &description.columns[1];
    assert_eq!(name.name, "name");
    assert_eq!(name.data_type, "VARCHAR(255)");
    assert!(!name.primary_key);
    assert!(name.allow_null);
}

#[tokio::test]
async fn test_create_table_duplicate_and_if_not_exists() {
    let t = TestContext::new();
    t.create(&person()).await;

    let err = t
        .qi
        .create_table(&person(), CreateTableOptions::default(), &t.ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateTable(ref name) if name == "Person"));

    t.qi
        .create_table(
            &person(),
            CreateTableOptions {
                if_not_exists: true,
            },
            &t.ctx,
        )
        .await
        .unwrap();
    assert_eq!(t.tables().await, ["Person"]);
}

#[tokio::test]
async fn test_create_table_with_indexes_and_defaults() {
    let t = TestContext::new();
    let table = TableDef::new("Post")
        .with_column(id_column())
        .with_column(
            ColumnDef::new("title", TypeDescriptor::string(120).unwrap())
                .not_null()
                .with_default("untitled"),
        )
        .with_column(ColumnDef::new("published", TypeDescriptor::boolean()).with_default(false))
        .with_column(ColumnDef::new("createdAt", TypeDescriptor::date()).with_default(DefaultValue::now()))
        .with_index(IndexDef::new("", ["title"]).unique());
    t.create(&table).await;

    let description = t.qi.describe_table("Post", &t.ctx).await.unwrap();
    let title = description.column("title").unwrap();
    assert_eq!(title.default_value.as_deref(), Some("'untitled'"));
    assert!(!title.allow_null);
    assert_eq!(
        description.column("published").unwrap().default_value.as_deref(),
        Some("0")
    );
    assert_eq!(
        description.column("createdAt").unwrap().default_value.as_deref(),
        Some("CURRENT_TIMESTAMP")
    );

    let snapshot = t.backend.introspect_table("Post").await.unwrap().unwrap();
    assert_eq!(snapshot.indexes[0].name, "post_title");
    assert!(snapshot.indexes[0].unique);
}

#[tokio::test]
async fn test_drop_all_tables_respects_references() {
    let t = TestContext::new();
    t.create(&table_a()).await;
    t.create(&table_b()).await;

    let dropped = t.qi.drop_all_tables(&t.ctx).await.unwrap();
    assert_eq!(dropped, ["B", "A"]);
    assert!(t.tables().await.is_empty());
}

#[tokio::test]
async fn test_drop_all_tables_with_cycle() {
    let t = TestContext::new();
    t.backend
        .execute("CREATE TABLE \"X\" (\"id\" INTEGER PRIMARY KEY, \"yId\" INTEGER REFERENCES \"Y\" (\"id\"))")
        .await
        .unwrap();
    t.backend
        .execute("CREATE TABLE \"Y\" (\"id\" INTEGER PRIMARY KEY, \"xId\" INTEGER REFERENCES \"X\" (\"id\"))")
        .await
        .unwrap();
    t.create(&table_a()).await;

    let dropped = t.qi.drop_all_tables(&t.ctx).await.unwrap();
    assert_eq!(dropped, ["A", "X", "Y"]);
    assert!(t.tables().await.is_empty());

    // Nothing left is not an error.
    assert!(t.qi.drop_all_tables(&t.ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_drop_table() {
    let t = TestContext::new();
    t.create(&table_a()).await;

    let err = t
        .qi
        .drop_table("Missing", DropTableOptions::default(), &t.ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound {
            kind: ObjectKind::Table,
            ..
        }
    ));

    let options = DropTableOptions {
        if_exists: true,
        cascade: false,
    };
    t.qi.drop_table("Missing", options, &t.ctx).await.unwrap();
    t.qi.drop_table("A", options, &t.ctx).await.unwrap();
    assert!(t.tables().await.is_empty());
}

#[tokio::test]
async fn test_rename_table() {
    let t = TestContext::new();
    t.create(&table_a()).await;
    t.create(&person()).await;

    let err = t.qi.rename_table("A", "Person", &t.ctx).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { kind: ObjectKind::Table, .. }));
    let err = t.qi.rename_table("Nope", "Other", &t.ctx).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));

    t.qi.rename_table("A", "Alpha", &t.ctx).await.unwrap();
    assert_eq!(t.tables().await, ["Alpha", "Person"]);
}

#[tokio::test]
async fn test_rename_column() {
    let t = TestContext::new();
    t.create(&person()).await;

    t.qi
        .rename_column("Person", "signature", "sig", &t.ctx)
        .await
        .unwrap();

    let description = t.qi.describe_table("Person", &t.ctx).await.unwrap();
    assert!(description.column("sig").is_some());
    assert!(description.column("signature").is_none());

    let err = t
        .qi
        .rename_column("Person", "signature", "other", &t.ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: ObjectKind::Column, .. }));
    let err = t
        .qi
        .rename_column("Person", "sig", "name", &t.ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { kind: ObjectKind::Column, .. }));
}

#[tokio::test]
async fn test_add_and_remove_column() {
    let t = TestContext::new();
    t.create(&person()).await;

    t.qi
        .add_column("Person", &ColumnDef::new("age", TypeDescriptor::integer()), &t.ctx)
        .await
        .unwrap();
    let err = t
        .qi
        .add_column("Person", &ColumnDef::new("age", TypeDescriptor::integer()), &t.ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));

    t.qi.remove_column("Person", "signature", &t.ctx).await.unwrap();
    let names: Vec<String> = t
        .qi
        .describe_table("Person", &t.ctx)
        .await
        .unwrap()
        .columns
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["id", "name", "age"]);

    let err = t.qi.remove_column("Person", "signature", &t.ctx).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn test_add_column_with_unsupported_type_leaves_table_unchanged() {
    let t = TestContext::new();
    t.create(&person()).await;
    let before = t.qi.describe_table("Person", &t.ctx).await.unwrap();

    let column = ColumnDef::new("doc", TypeDescriptor::of(TypeName::Jsonb).unwrap());
    let err = t.qi.add_column("Person", &column, &t.ctx).await.unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedType {
            dialect: Dialect::Sqlite,
            ..
        }
    ));

    let after = t.qi.describe_table("Person", &t.ctx).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_add_index_and_remove_by_columns() {
    let t = TestContext::new();
    let table = TableDef::new("Person")
        .with_column(id_column())
        .with_column(ColumnDef::new("firstName", TypeDescriptor::string(64).unwrap()))
        .with_column(ColumnDef::new("lastName", TypeDescriptor::string(64).unwrap()));
    t.create(&table).await;

    let index = IndexDef::new("Person", ["firstName", "lastName"]);
    let name = t.qi.add_index(&index, &t.ctx).await.unwrap();
    assert_eq!(name, "person_firstname_lastname");

    let err = t.qi.add_index(&index, &t.ctx).await.unwrap_err();
    assert!(matches!(err, Error::Conflict { kind: ObjectKind::Index, .. }));

    let err = t
        .qi
        .add_index(&IndexDef::new("Person", ["missing"]), &t.ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: ObjectKind::Column, .. }));

    t.qi
        .remove_index("Person", vec!["firstName", "lastName"], &t.ctx)
        .await
        .unwrap();
    let snapshot = t.backend.introspect_table("Person").await.unwrap().unwrap();
    assert!(snapshot.indexes.is_empty());

    let err = t
        .qi
        .remove_index("Person", "person_firstname_lastname", &t.ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: ObjectKind::Index, .. }));
}

#[tokio::test]
async fn test_change_column_rebuilds_sqlite_table() {
    let t = TestContext::new();
    let table = person()
        .with_column(ColumnDef::new("age", TypeDescriptor::integer()))
        .with_index(IndexDef::new("", ["name"]));
    t.create(&table).await;
    t.backend
        .execute("INSERT INTO \"Person\" (\"name\", \"age\") VALUES ('Ada', 36)")
        .await
        .unwrap();

    let changed = ColumnDef::new("age", TypeDescriptor::big_int())
        .not_null()
        .with_default(0i64);
    t.qi.change_column("Person", &changed, &t.ctx).await.unwrap();

    let description = t.qi.describe_table("Person", &t.ctx).await.unwrap();
    let age = description.column("age").unwrap();
    assert_eq!(age.data_type, "BIGINT");
    assert!(!age.allow_null);
    assert_eq!(age.default_value.as_deref(), Some("0"));
    assert_eq!(description.columns.len(), 4);

    let snapshot = t.backend.introspect_table("Person").await.unwrap().unwrap();
    assert_eq!(snapshot.indexes[0].name, "person_name");
    assert_eq!(t.tables().await, ["Person"]);

    let outcome = t
        .backend
        .execute("UPDATE \"Person\" SET \"age\" = \"age\" + 1")
        .await
        .unwrap();
    assert_eq!(outcome.rows_affected, 1);

    let err = t
        .qi
        .change_column("Person", &ColumnDef::new("nope", TypeDescriptor::text()), &t.ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { kind: ObjectKind::Column, .. }));
}

#[tokio::test]
async fn test_change_column_keeps_constraints_of_other_columns() {
    let t = TestContext::new();
    t.create(&table_a()).await;
    let table = TableDef::new("B")
        .with_column(id_column())
        .with_column(
            ColumnDef::new("aId", TypeDescriptor::integer())
                .references(Reference::to("A").on_delete(ReferentialAction::Cascade)),
        )
        .with_column(ColumnDef::new("email", TypeDescriptor::string(64).unwrap()).unique())
        .with_column(ColumnDef::new(
            "status",
            TypeDescriptor::enumeration(["on", "off"]).unwrap(),
        ))
        .with_column(ColumnDef::new("note", TypeDescriptor::string(10).unwrap()));
    t.create(&table).await;
    t.backend.execute("INSERT INTO \"A\" (\"id\") VALUES (1)").await.unwrap();
    t.backend
        .execute("INSERT INTO \"B\" (\"aId\", \"email\", \"status\") VALUES (1, 'x', 'on')")
        .await
        .unwrap();

    t.qi.change_column("B", &ColumnDef::new("note", TypeDescriptor::text()), &t.ctx)
        .await
        .unwrap();
    let description = t.qi.describe_table("B", &t.ctx).await.unwrap();
    assert_eq!(description.column("note").unwrap().data_type, "TEXT");

    // UNIQUE and the enum domain still hold.
    assert!(t
        .backend
        .execute("INSERT INTO \"B\" (\"email\", \"status\") VALUES ('x', 'off')")
        .await
        .is_err());
    assert!(t
        .backend
        .execute("INSERT INTO \"B\" (\"email\", \"status\") VALUES ('y', 'maybe')")
        .await
        .is_err());

    // Deleting the parent still cascades.
    t.backend.execute("DELETE FROM \"A\"").await.unwrap();
    let remaining = t.backend.execute("UPDATE \"B\" SET \"note\" = 'n'").await.unwrap();
    assert_eq!(remaining.rows_affected, 0);

    let snapshot = t.backend.introspect_table("B").await.unwrap().unwrap();
    assert_eq!(snapshot.foreign_keys[0].on_delete.as_deref(), Some("CASCADE"));
    assert!(snapshot.sql.unwrap().contains("AUTOINCREMENT"));
}

/// Applies the checks-off toggle, then stops answering as if the caller gave up.
struct AbandonedChecksOff {
    inner: SqliteBackend,
    token: CancellationToken,
}

#[async_trait]
impl Backend for AbandonedChecksOff {
    async fn execute(&self, sql: &str) -> Result<ExecOutcome, BackendError> {
        let outcome = self.inner.execute(sql).await?;
        if sql == "PRAGMA foreign_keys = OFF" {
            self.token.cancel();
            std::future::pending::<()>().await;
        }
        Ok(outcome)
    }

    async fn introspect_schema(&self) -> Result<SchemaSnapshot, BackendError> {
        self.inner.introspect_schema().await
    }
}

#[tokio::test]
async fn test_interrupted_checks_off_still_restores_foreign_keys() {
    let t = TestContext::new();
    t.create(&table_a()).await;
    t.create(&table_b()).await;

    let token = CancellationToken::new();
    let backend = Arc::new(AbandonedChecksOff {
        inner: (*t.backend).clone(),
        token: token.clone(),
    });
    let qi = QueryInterface::new(backend, QueryInterfaceConfig::new(Dialect::Sqlite));

    let err = qi
        .drop_all_tables(&CallContext::new().with_cancellation(token))
        .await
        .unwrap_err();
    match &err {
        Error::Indeterminate { statement, .. } => assert_eq!(statement, "PRAGMA foreign_keys = OFF"),
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(t.tables().await, ["A", "B"]);
    assert!(t
        .backend
        .execute("INSERT INTO \"B\" (\"aId\") VALUES (999)")
        .await
        .is_err());
}

#[tokio::test]
async fn test_cancelled_before_submission() {
    let t = TestContext::new();
    let token = CancellationToken::new();
    token.cancel();
    let ctx = CallContext::new().with_cancellation(token);

    let err = t
        .qi
        .create_table(&person(), CreateTableOptions::default(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled { .. }));
    assert!(t.tables().await.is_empty());
}

#[tokio::test]
async fn test_transactional_create_table() {
    let t = TestContext::with_config(
        QueryInterfaceConfig::new(Dialect::Sqlite).with_transactional(true),
    );
    t.create(&person().with_index(IndexDef::new("", ["name"]))).await;

    let snapshot = t.backend.introspect_table("Person").await.unwrap().unwrap();
    assert_eq!(snapshot.indexes.len(), 1);
}

#[tokio::test]
async fn test_apply_all_reports_completed_operations() {
    let t = TestContext::new();
    let ops = vec![
        DdlOperation::CreateTable {
            table: table_a(),
            if_not_exists: false,
        },
        DdlOperation::CreateTable {
            table: table_b(),
            if_not_exists: false,
        },
        DdlOperation::CreateTable {
            table: table_a(),
            if_not_exists: false,
        },
    ];

    let err = t.qi.apply_all(&ops, &t.ctx).await.unwrap_err();
    match &err {
        Error::Batch {
            operation,
            completed,
            ..
        } => {
            assert_eq!(operation, "applyAll");
            assert_eq!(completed, &["createTable A", "createTable B"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(err.root_cause(), Error::DuplicateTable(_)));
    assert_eq!(t.tables().await, ["A", "B"]);

    t.qi
        .apply(
            &DdlOperation::DropAllTables {
                tables: vec!["B".into(), "A".into()],
            },
            &t.ctx,
        )
        .await
        .unwrap();
    assert!(t.tables().await.is_empty());
}

#[tokio::test]
async fn test_on_disk_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.db");

    {
        let backend = Arc::new(SqliteBackend::open(&path).unwrap());
        let qi = QueryInterface::new(backend, QueryInterfaceConfig::new(Dialect::Sqlite));
        qi.create_table(&person(), CreateTableOptions::default(), &CallContext::new())
            .await
            .unwrap();
    }

    let backend = Arc::new(SqliteBackend::open(&path).unwrap());
    let qi = QueryInterface::new(backend, QueryInterfaceConfig::new(Dialect::Sqlite));
    let tables = qi.show_all_tables(&CallContext::new()).await.unwrap();
    assert_eq!(tables, ["Person"]);
}
