//! Subcommand implementations.

use crate::schema::SchemaFile;
use ormkit_core::dialect::render_operation;
use ormkit_core::{CallContext, DdlOperation, Dialect, QueryInterface};

type CommandResult = Result<String, Box<dyn std::error::Error>>;

fn create_ops(schema: &SchemaFile, if_not_exists: bool) -> Vec<DdlOperation> {
    schema
        .tables
        .iter()
        .map(|table| DdlOperation::CreateTable {
            table: table.clone(),
            if_not_exists,
        })
        .collect()
}

/// Render CREATE statements for every table in the schema.
pub fn render(schema: &SchemaFile, dialect: Dialect, if_not_exists: bool) -> CommandResult {
    let mut out = String::new();
    for op in create_ops(schema, if_not_exists) {
        for statement in render_operation(dialect, &op)? {
            out.push_str(&statement);
            out.push_str(";\n");
        }
    }
    Ok(out)
}

/// Create every table in the schema.
pub async fn apply(
    qi: &QueryInterface,
    schema: &SchemaFile,
    if_not_exists: bool,
    ctx: &CallContext,
) -> CommandResult {
    qi.apply_all(&create_ops(schema, if_not_exists), ctx).await?;
    tracing::info!(tables = schema.tables.len(), "schema applied");
    Ok(format!("Applied {} table(s)", schema.tables.len()))
}

/// List tables, one per line.
pub async fn tables(qi: &QueryInterface, ctx: &CallContext) -> CommandResult {
    Ok(qi.show_all_tables(ctx).await?.join("\n"))
}

/// Describe a table as JSON.
pub async fn describe(qi: &QueryInterface, table: &str, ctx: &CallContext) -> CommandResult {
    let description = qi.describe_table(table, ctx).await?;
    Ok(serde_json::to_string_pretty(&description)?)
}

/// Drop every table.
pub async fn drop_all(qi: &QueryInterface, ctx: &CallContext) -> CommandResult {
    let dropped = qi.drop_all_tables(ctx).await?;
    tracing::info!(tables = dropped.len(), "tables dropped");
    Ok(format!("Dropped {} table(s): {}", dropped.len(), dropped.join(", ")))
}
