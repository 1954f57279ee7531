//! DDL statement rendering per dialect.

use super::{render_type, Dialect};
use crate::catalog::{
    ColumnDef, DefaultFunction, DefaultValue, IndexDef, IndexKind, IndexMethod, Reference,
    TableDef, TypeKind, TypeName,
};
use crate::ddl::DdlOperation;
use crate::error::{Error, ObjectKind, Result};
use crate::query::{ForeignKeySnapshot, TableSnapshot};

/// Render a default value as a SQL literal or expression.
pub fn render_value(dialect: Dialect, value: &DefaultValue) -> String {
    match value {
        DefaultValue::Bool(b) => match (dialect, b) {
            (Dialect::Postgres, true) => "TRUE".to_string(),
            (Dialect::Postgres, false) => "FALSE".to_string(),
            (_, true) => "1".to_string(),
            (_, false) => "0".to_string(),
        },
        DefaultValue::Int(i) => i.to_string(),
        DefaultValue::Float(f) => f.to_string(),
        DefaultValue::Text(s) => dialect.quote_literal(s),
        DefaultValue::Function {
            function: DefaultFunction::Now,
        } => "CURRENT_TIMESTAMP".to_string(),
        DefaultValue::Raw { raw } => raw.clone(),
    }
}

/// Render a column definition of `table` as it appears in CREATE TABLE or
/// ADD COLUMN.
///
/// Foreign-key references are not part of the fragment; table-level and
/// inline forms are added by the statement renderers.
pub fn render_column(dialect: Dialect, table: &str, column: &ColumnDef) -> Result<String> {
    if !column.is_stored() {
        return Err(Error::UnsupportedType {
            type_name: column.data_type.to_string(),
            dialect,
        });
    }

    let mut sql = format!(
        "{} {}",
        dialect.quote_ident(&column.name),
        column_type(dialect, column)?
    );

    if !column.is_nullable() {
        sql.push_str(" NOT NULL");
    }
    if column.auto_increment {
        match dialect {
            Dialect::MySql => sql.push_str(" AUTO_INCREMENT"),
            Dialect::Sqlite => sql.push_str(" PRIMARY KEY AUTOINCREMENT"),
            Dialect::Mssql => sql.push_str(" IDENTITY(1,1)"),
            Dialect::Postgres => {}
        }
    }
    if let Some(default) = &column.default_value {
        sql.push_str(" DEFAULT ");
        sql.push_str(&render_value(dialect, default));
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(check) = domain_check(dialect, table, column)? {
        sql.push(' ');
        sql.push_str(&check);
    }
    if let (Dialect::MySql, Some(comment)) = (dialect, &column.comment) {
        sql.push_str(&format!(" COMMENT {}", dialect.quote_literal(comment)));
    }
    Ok(sql)
}

/// Column type including the auto-increment spelling of dialects that fold it into the type.
fn column_type(dialect: Dialect, column: &ColumnDef) -> Result<String> {
    if column.auto_increment {
        match dialect {
            Dialect::Postgres => {
                return Ok(match column.data_type.name() {
                    TypeName::BigInt => "BIGSERIAL",
                    TypeName::TinyInt | TypeName::SmallInt => "SMALLSERIAL",
                    _ => "SERIAL",
                }
                .to_string())
            }
            // Only an INTEGER primary key aliases the rowid.
            Dialect::Sqlite => return Ok("INTEGER".to_string()),
            Dialect::MySql | Dialect::Mssql => {}
        }
    }
    render_type(dialect, &column.data_type)
}

/// Name of the CHECK constraint holding an enum column's value domain.
pub(crate) fn domain_check_name(table: &str, column: &str) -> String {
    format!("{}_{}_check", table, column)
}

/// Named CHECK constraint restricting an enum column, or an array of enums,
/// to its values on dialects without a native enum type.
fn domain_check(dialect: Dialect, table: &str, column: &ColumnDef) -> Result<Option<String>> {
    let literals = |values: &[String]| {
        values
            .iter()
            .map(|v| dialect.quote_literal(v))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let name = dialect.quote_ident(&column.name);
    let condition = match column.data_type.kind() {
        TypeKind::Enum(values) if !dialect.has_native_enum() => {
            format!("{} IN ({})", name, literals(values))
        }
        TypeKind::Array(element) => match element.enum_values() {
            Some(values) => format!(
                "{} <@ ARRAY[{}]::{}",
                name,
                literals(values),
                render_type(dialect, &column.data_type)?
            ),
            None => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok(Some(format!(
        "CONSTRAINT {} CHECK ({})",
        dialect.quote_ident(&domain_check_name(table, &column.name)),
        condition
    )))
}

fn render_reference(dialect: Dialect, reference: &Reference) -> String {
    let mut sql = format!(
        "REFERENCES {} ({})",
        dialect.quote_ident(&reference.table),
        dialect.quote_ident(&reference.key)
    );
    if let Some(action) = reference.on_delete {
        sql.push_str(&format!(" ON DELETE {}", action.as_sql()));
    }
    if let Some(action) = reference.on_update {
        sql.push_str(&format!(" ON UPDATE {}", action.as_sql()));
    }
    sql
}

fn quote_list<S: AsRef<str>>(dialect: Dialect, names: &[S]) -> String {
    names
        .iter()
        .map(|n| dialect.quote_ident(n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn unsupported(dialect: Dialect, operation: impl Into<String>) -> Error {
    Error::UnsupportedOperation {
        operation: operation.into(),
        dialect,
    }
}

/// Render a DDL operation into the ordered statements that perform it.
pub fn render_operation(dialect: Dialect, op: &DdlOperation) -> Result<Vec<String>> {
    match op {
        DdlOperation::CreateTable {
            table,
            if_not_exists,
        } => render_create_table(dialect, table, *if_not_exists),
        DdlOperation::DropTable {
            name,
            if_exists,
            cascade,
        } => Ok(vec![render_drop_table(dialect, name, *if_exists, *cascade)]),
        DdlOperation::DropAllTables { tables } => {
            let mut statements = Vec::with_capacity(tables.len() + 2);
            statements.extend(dialect.constraint_checks(false));
            for table in tables {
                statements.push(render_drop_table(
                    dialect,
                    table,
                    true,
                    dialect.supports_drop_cascade(),
                ));
            }
            statements.extend(dialect.constraint_checks(true));
            Ok(statements)
        }
        DdlOperation::RenameTable { from, to } => {
            let sql = match dialect {
                Dialect::Postgres | Dialect::Sqlite => format!(
                    "ALTER TABLE {} RENAME TO {}",
                    dialect.quote_ident(from),
                    dialect.quote_ident(to)
                ),
                Dialect::MySql => format!(
                    "ALTER TABLE {} RENAME {}",
                    dialect.quote_ident(from),
                    dialect.quote_ident(to)
                ),
                Dialect::Mssql => format!(
                    "EXEC sp_rename {}, {}",
                    dialect.quote_literal(from),
                    dialect.quote_literal(to)
                ),
            };
            Ok(vec![sql])
        }
        DdlOperation::AddColumn { table, column } => {
            render_add_column(dialect, table, column).map(|sql| vec![sql])
        }
        DdlOperation::RemoveColumn { table, column } => Ok(vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            dialect.quote_ident(table),
            dialect.quote_ident(column)
        )]),
        DdlOperation::ChangeColumn { table, column } => {
            render_change_column(dialect, table, column)
        }
        DdlOperation::RenameColumn { table, from, to } => {
            let sql = match dialect {
                Dialect::Mssql => format!(
                    "EXEC sp_rename {}, {}, 'COLUMN'",
                    dialect.quote_literal(&format!("{}.{}", table, from)),
                    dialect.quote_literal(to)
                ),
                _ => format!(
                    "ALTER TABLE {} RENAME COLUMN {} TO {}",
                    dialect.quote_ident(table),
                    dialect.quote_ident(from),
                    dialect.quote_ident(to)
                ),
            };
            Ok(vec![sql])
        }
        DdlOperation::AddIndex { index } => render_create_index(dialect, index).map(|sql| vec![sql]),
        DdlOperation::RemoveIndex { table, name } => {
            let sql = match dialect {
                Dialect::MySql | Dialect::Mssql => format!(
                    "DROP INDEX {} ON {}",
                    dialect.quote_ident(name),
                    dialect.quote_ident(table)
                ),
                Dialect::Postgres | Dialect::Sqlite => {
                    format!("DROP INDEX {}", dialect.quote_ident(name))
                }
            };
            Ok(vec![sql])
        }
    }
}

fn render_create_table(dialect: Dialect, table: &TableDef, if_not_exists: bool) -> Result<Vec<String>> {
    let name = dialect.quote_ident(&table.name);
    let mut clauses = Vec::new();
    for column in table.stored_columns() {
        clauses.push(render_column(dialect, &table.name, column)?);
    }

    let primary_key: Vec<&str> = table.primary_key().iter().map(|c| c.name.as_str()).collect();
    let inline_key = dialect == Dialect::Sqlite && table.columns.iter().any(|c| c.auto_increment);
    if inline_key && primary_key.len() > 1 {
        return Err(unsupported(
            dialect,
            format!("autoIncrement in composite primary key of `{}`", table.name),
        ));
    }
    if !primary_key.is_empty() && !inline_key {
        clauses.push(format!("PRIMARY KEY ({})", quote_list(dialect, &primary_key)));
    }

    for column in table.stored_columns() {
        if let Some(reference) = &column.references {
            clauses.push(format!(
                "FOREIGN KEY ({}) {}",
                dialect.quote_ident(&column.name),
                render_reference(dialect, reference)
            ));
        }
    }

    let body = format!("({})", clauses.join(", "));
    let mut sql = match (dialect, if_not_exists) {
        (Dialect::Mssql, true) => format!(
            "IF OBJECT_ID({}, N'U') IS NULL CREATE TABLE {} {}",
            dialect.quote_literal(&name),
            name,
            body
        ),
        (_, true) => format!("CREATE TABLE IF NOT EXISTS {} {}", name, body),
        (_, false) => format!("CREATE TABLE {} {}", name, body),
    };

    if dialect == Dialect::MySql {
        let options = &table.options;
        if let Some(engine) = &options.engine {
            sql.push_str(&format!(" ENGINE={}", engine));
        }
        if let Some(charset) = &options.charset {
            sql.push_str(&format!(" DEFAULT CHARSET={}", charset));
        }
        if let Some(collate) = &options.collate {
            sql.push_str(&format!(" COLLATE={}", collate));
        }
        if let Some(comment) = &options.comment {
            sql.push_str(&format!(" COMMENT={}", dialect.quote_literal(comment)));
        }
    }

    let mut statements = vec![sql];
    if dialect == Dialect::Postgres {
        if let Some(comment) = &table.options.comment {
            statements.push(format!(
                "COMMENT ON TABLE {} IS {}",
                name,
                dialect.quote_literal(comment)
            ));
        }
        for column in table.stored_columns() {
            if let Some(comment) = &column.comment {
                statements.push(format!(
                    "COMMENT ON COLUMN {}.{} IS {}",
                    name,
                    dialect.quote_ident(&column.name),
                    dialect.quote_literal(comment)
                ));
            }
        }
    }
    for index in table.resolved_indexes() {
        statements.push(render_create_index(dialect, &index)?);
    }
    Ok(statements)
}

fn render_drop_table(dialect: Dialect, name: &str, if_exists: bool, cascade: bool) -> String {
    let mut sql = String::from("DROP TABLE ");
    if if_exists {
        sql.push_str("IF EXISTS ");
    }
    sql.push_str(&dialect.quote_ident(name));
    if cascade && dialect.supports_drop_cascade() {
        sql.push_str(" CASCADE");
    }
    sql
}

fn render_add_column(dialect: Dialect, table: &str, column: &ColumnDef) -> Result<String> {
    if dialect == Dialect::Sqlite && (column.primary_key || column.unique) {
        return Err(unsupported(
            dialect,
            format!("adding key column `{}` to existing table", column.name),
        ));
    }

    let definition = render_column(dialect, table, column)?;
    let table = dialect.quote_ident(table);
    let mut sql = match dialect {
        Dialect::Mssql => format!("ALTER TABLE {} ADD {}", table, definition),
        _ => format!("ALTER TABLE {} ADD COLUMN {}", table, definition),
    };
    if let Some(reference) = &column.references {
        match dialect {
            Dialect::MySql => sql.push_str(&format!(
                ", ADD FOREIGN KEY ({}) {}",
                dialect.quote_ident(&column.name),
                render_reference(dialect, reference)
            )),
            _ => {
                sql.push(' ');
                sql.push_str(&render_reference(dialect, reference));
            }
        }
    }
    Ok(sql)
}

fn render_change_column(dialect: Dialect, table: &str, column: &ColumnDef) -> Result<Vec<String>> {
    let quoted_table = dialect.quote_ident(table);
    let name = dialect.quote_ident(&column.name);
    let alter = match dialect {
        Dialect::Postgres => {
            let mut parts = vec![format!(
                "ALTER COLUMN {} TYPE {}",
                name,
                render_type(dialect, &column.data_type)?
            )];
            parts.push(if column.is_nullable() {
                format!("ALTER COLUMN {} DROP NOT NULL", name)
            } else {
                format!("ALTER COLUMN {} SET NOT NULL", name)
            });
            parts.push(match &column.default_value {
                Some(default) => format!(
                    "ALTER COLUMN {} SET DEFAULT {}",
                    name,
                    render_value(dialect, default)
                ),
                None => format!("ALTER COLUMN {} DROP DEFAULT", name),
            });
            format!("ALTER TABLE {} {}", quoted_table, parts.join(", "))
        }
        Dialect::MySql => {
            let mut sql = format!(
                "ALTER TABLE {} MODIFY {}",
                quoted_table,
                render_column(dialect, table, column)?
            );
            if let Some(reference) = &column.references {
                sql.push_str(&format!(
                    ", ADD FOREIGN KEY ({}) {}",
                    name,
                    render_reference(dialect, reference)
                ));
            }
            return Ok(vec![sql]);
        }
        Dialect::Mssql => format!(
            "ALTER TABLE {} ALTER COLUMN {} {} {}",
            quoted_table,
            name,
            render_type(dialect, &column.data_type)?,
            if column.is_nullable() { "NULL" } else { "NOT NULL" }
        ),
        Dialect::Sqlite => {
            return Err(unsupported(
                dialect,
                format!("changeColumn `{}` in place (requires a table rebuild)", column.name),
            ))
        }
    };

    // The old domain goes first so the type change is not checked against it.
    let mut statements = vec![
        format!(
            "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}",
            quoted_table,
            dialect.quote_ident(&domain_check_name(table, &column.name))
        ),
        alter,
    ];
    if let Some(check) = domain_check(dialect, table, column)? {
        statements.push(format!("ALTER TABLE {} ADD {}", quoted_table, check));
    }
    Ok(statements)
}

fn render_create_index(dialect: Dialect, index: &IndexDef) -> Result<String> {
    let keyword = match index.kind {
        IndexKind::Plain => "INDEX",
        IndexKind::Unique => "UNIQUE INDEX",
        IndexKind::Fulltext | IndexKind::Spatial if dialect != Dialect::MySql => {
            return Err(unsupported(
                dialect,
                format!("{:?} index `{}`", index.kind, index.resolved_name()).to_lowercase(),
            ));
        }
        IndexKind::Fulltext => "FULLTEXT INDEX",
        IndexKind::Spatial => "SPATIAL INDEX",
    };

    let columns: Vec<String> = index
        .columns
        .iter()
        .map(|c| {
            let mut sql = dialect.quote_ident(&c.name);
            if let (Dialect::MySql, Some(length)) = (dialect, c.length) {
                sql.push_str(&format!("({})", length));
            }
            if let Some(order) = c.order {
                sql.push(' ');
                sql.push_str(order.as_sql());
            }
            sql
        })
        .collect();

    let mut sql = format!(
        "CREATE {} {} ON {}",
        keyword,
        dialect.quote_ident(&index.resolved_name()),
        dialect.quote_ident(&index.table)
    );
    match (dialect, index.using) {
        (Dialect::Postgres, Some(method)) => {
            sql.push_str(&format!(" USING {} ({})", method.as_str(), columns.join(", ")));
        }
        (Dialect::MySql, Some(method @ (IndexMethod::Btree | IndexMethod::Hash))) => {
            sql.push_str(&format!(
                " ({}) USING {}",
                columns.join(", "),
                method.as_str().to_uppercase()
            ));
        }
        (Dialect::MySql, Some(method)) => {
            return Err(unsupported(
                dialect,
                format!("index method {}", method.as_str()),
            ));
        }
        _ => sql.push_str(&format!(" ({})", columns.join(", "))),
    }
    if let (Dialect::MySql, Some(parser)) = (dialect, &index.parser) {
        sql.push_str(&format!(" WITH PARSER {}", parser));
    }
    Ok(sql)
}

/// Statements rebuilding a sqlite table with one column redefined.
///
/// SQLite cannot alter a column in place, so the table is recreated under a
/// backup name with the new definition, rows are copied, the original is
/// dropped, the backup renamed back, and the indexes recreated. When the
/// snapshot carries the table's CREATE statement only the target column's
/// clause is replaced; every other column and table constraint is kept as
/// written.
pub fn render_table_rebuild(table: &TableSnapshot, column: &ColumnDef) -> Result<Vec<String>> {
    let dialect = Dialect::Sqlite;
    if !table.columns.iter().any(|c| c.name == column.name) {
        return Err(Error::not_found(
            ObjectKind::Column,
            format!("{}.{}", table.name, column.name),
        ));
    }

    let backup = dialect.quote_ident(&format!("{}_backup", table.name));
    let body = match &table.sql {
        Some(sql) => redefine_in_place(table, sql, column)?,
        None => redefine_from_columns(table, column)?,
    };

    let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    let columns = quote_list(dialect, &names);
    let mut statements = vec![
        format!("CREATE TABLE {} {}", backup, body),
        format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            backup,
            columns,
            columns,
            dialect.quote_ident(&table.name)
        ),
        format!("DROP TABLE {}", dialect.quote_ident(&table.name)),
        format!(
            "ALTER TABLE {} RENAME TO {}",
            backup,
            dialect.quote_ident(&table.name)
        ),
    ];
    for index in &table.indexes {
        statements.push(match &index.sql {
            Some(sql) => sql.clone(),
            None => format!(
                "CREATE {}INDEX {} ON {} ({})",
                if index.unique { "UNIQUE " } else { "" },
                dialect.quote_ident(&index.name),
                dialect.quote_ident(&table.name),
                quote_list(dialect, &index.columns)
            ),
        });
    }
    Ok(statements)
}

/// Table body from the stored CREATE statement with one column clause replaced.
fn redefine_in_place(table: &TableSnapshot, sql: &str, column: &ColumnDef) -> Result<String> {
    let dialect = Dialect::Sqlite;
    let malformed = || {
        Error::validation(format!(
            "cannot locate column `{}` in the definition of `{}`",
            column.name, table.name
        ))
    };
    let (clauses, tail) = split_table_body(sql).ok_or_else(malformed)?;

    let constraints: Vec<&str> = clauses.iter().copied().filter(|c| is_table_constraint(c)).collect();
    let table_key = constraints
        .iter()
        .any(|c| c.to_ascii_uppercase().contains("PRIMARY KEY"));
    let table_reference = constraints
        .iter()
        .any(|c| foreign_key_column(c).as_deref() == Some(column.name.as_str()));

    let mut definition = render_column(dialect, &table.name, column)?;
    if column.primary_key && !column.auto_increment && !table_key {
        definition.push_str(" PRIMARY KEY");
    }
    if let Some(reference) = &column.references {
        definition.push(' ');
        definition.push_str(&render_reference(dialect, reference));
    }

    let mut rebuilt = Vec::with_capacity(clauses.len() + 1);
    let mut replaced = false;
    for clause in clauses {
        if is_table_constraint(clause) {
            // A new reference supersedes the old one.
            if column.references.is_some()
                && foreign_key_column(clause).as_deref() == Some(column.name.as_str())
            {
                continue;
            }
            rebuilt.push(clause.to_string());
        } else if leading_name(clause).as_deref() == Some(column.name.as_str()) {
            rebuilt.push(definition.clone());
            replaced = true;
        } else {
            rebuilt.push(clause.to_string());
        }
    }
    if !replaced {
        return Err(malformed());
    }
    // Inline references of the replaced clause carry over unless redefined.
    if column.references.is_none() && !table_reference {
        for fk in table.foreign_keys.iter().filter(|fk| fk.column == column.name) {
            rebuilt.push(foreign_key_clause(fk));
        }
    }
    Ok(format!("({}){}", rebuilt.join(", "), tail))
}

/// Table body assembled from introspected columns, for snapshots without SQL.
fn redefine_from_columns(table: &TableSnapshot, column: &ColumnDef) -> Result<String> {
    let dialect = Dialect::Sqlite;
    let mut clauses = Vec::with_capacity(table.columns.len() + 1);
    let mut primary_key = Vec::new();
    for existing in &table.columns {
        if existing.name == column.name {
            clauses.push(render_column(dialect, &table.name, column)?);
            if column.primary_key && !column.auto_increment {
                primary_key.push(existing.name.as_str());
            }
            continue;
        }
        let mut sql = format!("{} {}", dialect.quote_ident(&existing.name), existing.data_type);
        if !existing.allow_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &existing.default_value {
            sql.push_str(&format!(" DEFAULT {}", default));
        }
        clauses.push(sql);
        if existing.primary_key {
            primary_key.push(existing.name.as_str());
        }
    }
    if !primary_key.is_empty() {
        clauses.push(format!("PRIMARY KEY ({})", quote_list(dialect, &primary_key)));
    }
    for fk in &table.foreign_keys {
        if fk.column == column.name && column.references.is_some() {
            continue;
        }
        clauses.push(foreign_key_clause(fk));
    }
    if let Some(reference) = &column.references {
        clauses.push(format!(
            "FOREIGN KEY ({}) {}",
            dialect.quote_ident(&column.name),
            render_reference(dialect, reference)
        ));
    }
    Ok(format!("({})", clauses.join(", ")))
}

fn foreign_key_clause(fk: &ForeignKeySnapshot) -> String {
    let dialect = Dialect::Sqlite;
    let mut sql = format!(
        "FOREIGN KEY ({}) REFERENCES {}",
        dialect.quote_ident(&fk.column),
        dialect.quote_ident(&fk.referenced_table)
    );
    // An empty target column means the parent's primary key.
    if !fk.referenced_column.is_empty() {
        sql.push_str(&format!(" ({})", dialect.quote_ident(&fk.referenced_column)));
    }
    if let Some(action) = &fk.on_delete {
        sql.push_str(&format!(" ON DELETE {}", action));
    }
    if let Some(action) = &fk.on_update {
        sql.push_str(&format!(" ON UPDATE {}", action));
    }
    sql
}

/// Split the parenthesized body of a CREATE TABLE statement into its
/// top-level clauses, returning them with the text after the body.
fn split_table_body(sql: &str) -> Option<(Vec<&str>, &str)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut clauses = Vec::new();
    for (i, c) in sql.char_indices() {
        if let Some(close) = quote {
            if c == close {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '[' => quote = Some(']'),
            '(' => {
                depth += 1;
                if depth == 1 {
                    start = i + 1;
                }
            }
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    clauses.push(sql[start..i].trim());
                    return Some((clauses, &sql[i + 1..]));
                }
            }
            ',' if depth == 1 => {
                clauses.push(sql[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    None
}

fn is_table_constraint(clause: &str) -> bool {
    let keyword: String = clause
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    ["CONSTRAINT", "PRIMARY", "UNIQUE", "CHECK", "FOREIGN"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

/// The identifier a clause starts with, unquoted.
fn leading_name(clause: &str) -> Option<String> {
    let close = match clause.chars().next()? {
        '"' => '"',
        '`' => '`',
        '\'' => '\'',
        '[' => ']',
        _ => {
            let word: String = clause
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
                .collect();
            return (!word.is_empty()).then_some(word);
        }
    };
    let mut name = String::new();
    let mut chars = clause[1..].chars().peekable();
    while let Some(c) = chars.next() {
        if c == close {
            if close != ']' && chars.peek() == Some(&close) {
                chars.next();
                name.push(c);
                continue;
            }
            return Some(name);
        }
        name.push(c);
    }
    None
}

/// The single column of a FOREIGN KEY table constraint.
fn foreign_key_column(clause: &str) -> Option<String> {
    let at = clause.to_ascii_uppercase().find("FOREIGN KEY")?;
    let rest = clause[at + "FOREIGN KEY".len()..].trim_start();
    let list = rest.strip_prefix('(')?;
    let list = &list[..list.find(')')?];
    if list.contains(',') {
        return None;
    }
    leading_name(list.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{OrderDirection, ReferentialAction, TableOptions, TypeDescriptor};
    use crate::query::{ColumnSnapshot, ForeignKeySnapshot, IndexSnapshot};

    fn person() -> TableDef {
        TableDef::new("Person")
            .with_column(
                ColumnDef::new("id", TypeDescriptor::integer())
                    .primary_key()
                    .auto_increment(),
            )
            .with_column(ColumnDef::new("name", TypeDescriptor::string(255).unwrap()).not_null())
    }

    fn create(dialect: Dialect, table: TableDef, if_not_exists: bool) -> Vec<String> {
        render_operation(
            dialect,
            &DdlOperation::CreateTable {
                table,
                if_not_exists,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(Dialect::Postgres, &DefaultValue::Bool(true)), "TRUE");
        assert_eq!(render_value(Dialect::MySql, &DefaultValue::Bool(false)), "0");
        assert_eq!(render_value(Dialect::Sqlite, &"it's".into()), "'it''s'");
        assert_eq!(render_value(Dialect::Mssql, &DefaultValue::now()), "CURRENT_TIMESTAMP");
        assert_eq!(render_value(Dialect::Postgres, &DefaultValue::raw("gen_random_uuid()")), "gen_random_uuid()");
    }

    #[test]
    fn test_create_table_auto_increment() {
        assert_eq!(
            create(Dialect::Postgres, person(), false),
            [r#"CREATE TABLE "Person" ("id" SERIAL NOT NULL, "name" VARCHAR(255) NOT NULL, PRIMARY KEY ("id"))"#]
        );
        assert_eq!(
            create(Dialect::MySql, person(), false),
            ["CREATE TABLE `Person` (`id` INTEGER NOT NULL AUTO_INCREMENT, `name` VARCHAR(255) NOT NULL, PRIMARY KEY (`id`))"]
        );
        assert_eq!(
            create(Dialect::Sqlite, person(), true),
            [r#"CREATE TABLE IF NOT EXISTS "Person" ("id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, "name" VARCHAR(255) NOT NULL)"#]
        );
        assert_eq!(
            create(Dialect::Mssql, person(), true),
            ["IF OBJECT_ID(N'[Person]', N'U') IS NULL CREATE TABLE [Person] ([id] INT NOT NULL IDENTITY(1,1), [name] NVARCHAR(255) NOT NULL, PRIMARY KEY ([id]))"]
        );
    }

    #[test]
    fn test_create_table_foreign_keys_options_and_indexes() {
        let table = TableDef::new("Task")
            .with_column(ColumnDef::new("id", TypeDescriptor::big_int()).primary_key())
            .with_column(
                ColumnDef::new("ownerId", TypeDescriptor::big_int())
                    .references(Reference::to("User").on_delete(ReferentialAction::Cascade)),
            )
            .with_index(IndexDef::new("", ["ownerId"]))
            .with_options(TableOptions {
                engine: Some("InnoDB".into()),
                charset: Some("utf8mb4".into()),
                collate: None,
                comment: Some("tasks".into()),
            });

        let statements = create(Dialect::MySql, table, false);
        assert_eq!(
            statements,
            [
                "CREATE TABLE `Task` (`id` BIGINT NOT NULL, `ownerId` BIGINT, PRIMARY KEY (`id`), FOREIGN KEY (`ownerId`) REFERENCES `User` (`id`) ON DELETE CASCADE) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COMMENT='tasks'",
                "CREATE INDEX `task_ownerid` ON `Task` (`ownerId`)",
            ]
        );
    }

    #[test]
    fn test_virtual_columns_skipped_and_enum_check() {
        let table = TableDef::new("Person")
            .with_column(ColumnDef::new("id", TypeDescriptor::integer()).primary_key())
            .with_column(ColumnDef::new(
                "status",
                TypeDescriptor::enumeration(["active", "gone"]).unwrap(),
            ))
            .with_column(ColumnDef::new(
                "display",
                TypeDescriptor::of(TypeName::Virtual).unwrap(),
            ));
        assert_eq!(
            create(Dialect::Postgres, table.clone(), false),
            [r#"CREATE TABLE "Person" ("id" INTEGER NOT NULL, "status" VARCHAR(255) CONSTRAINT "Person_status_check" CHECK ("status" IN ('active', 'gone')), PRIMARY KEY ("id"))"#]
        );
        assert_eq!(
            create(Dialect::MySql, table, false),
            ["CREATE TABLE `Person` (`id` INTEGER NOT NULL, `status` ENUM('active', 'gone'), PRIMARY KEY (`id`))"]
        );
    }

    #[test]
    fn test_drop_all_tables_toggles_checks() {
        let op = DdlOperation::DropAllTables {
            tables: vec!["B".into(), "A".into()],
        };
        assert_eq!(
            render_operation(Dialect::MySql, &op).unwrap(),
            [
                "SET FOREIGN_KEY_CHECKS = 0",
                "DROP TABLE IF EXISTS `B`",
                "DROP TABLE IF EXISTS `A`",
                "SET FOREIGN_KEY_CHECKS = 1",
            ]
        );
        assert_eq!(
            render_operation(Dialect::Postgres, &op).unwrap(),
            [r#"DROP TABLE IF EXISTS "B" CASCADE"#, r#"DROP TABLE IF EXISTS "A" CASCADE"#]
        );
    }

    #[test]
    fn test_rename_statements() {
        let op = DdlOperation::RenameTable {
            from: "a".into(),
            to: "b".into(),
        };
        assert_eq!(render_operation(Dialect::MySql, &op).unwrap(), ["ALTER TABLE `a` RENAME `b`"]);
        assert_eq!(render_operation(Dialect::Mssql, &op).unwrap(), ["EXEC sp_rename N'a', N'b'"]);

        let op = DdlOperation::RenameColumn {
            table: "Person".into(),
            from: "signature".into(),
            to: "sig".into(),
        };
        assert_eq!(
            render_operation(Dialect::Sqlite, &op).unwrap(),
            [r#"ALTER TABLE "Person" RENAME COLUMN "signature" TO "sig""#]
        );
        assert_eq!(
            render_operation(Dialect::Mssql, &op).unwrap(),
            ["EXEC sp_rename N'Person.signature', N'sig', 'COLUMN'"]
        );
    }

    #[test]
    fn test_add_column_with_reference() {
        let op = DdlOperation::AddColumn {
            table: "Task".into(),
            column: ColumnDef::new("ownerId", TypeDescriptor::integer()).references(Reference::to("User")),
        };
        assert_eq!(
            render_operation(Dialect::Postgres, &op).unwrap(),
            [r#"ALTER TABLE "Task" ADD COLUMN "ownerId" INTEGER REFERENCES "User" ("id")"#]
        );
        assert_eq!(
            render_operation(Dialect::MySql, &op).unwrap(),
            ["ALTER TABLE `Task` ADD COLUMN `ownerId` INTEGER, ADD FOREIGN KEY (`ownerId`) REFERENCES `User` (`id`)"]
        );
        assert_eq!(
            render_operation(Dialect::Mssql, &op).unwrap(),
            ["ALTER TABLE [Task] ADD [ownerId] INT REFERENCES [User] ([id])"]
        );
    }

    #[test]
    fn test_change_column() {
        let op = DdlOperation::ChangeColumn {
            table: "Person".into(),
            column: ColumnDef::new("age", TypeDescriptor::big_int()).not_null().with_default(0i64),
        };
        assert_eq!(
            render_operation(Dialect::Postgres, &op).unwrap(),
            [
                r#"ALTER TABLE "Person" DROP CONSTRAINT IF EXISTS "Person_age_check""#,
                r#"ALTER TABLE "Person" ALTER COLUMN "age" TYPE BIGINT, ALTER COLUMN "age" SET NOT NULL, ALTER COLUMN "age" SET DEFAULT 0"#,
            ]
        );
        assert_eq!(
            render_operation(Dialect::MySql, &op).unwrap(),
            ["ALTER TABLE `Person` MODIFY `age` BIGINT NOT NULL DEFAULT 0"]
        );
        assert_eq!(
            render_operation(Dialect::Mssql, &op).unwrap(),
            [
                "ALTER TABLE [Person] DROP CONSTRAINT IF EXISTS [Person_age_check]",
                "ALTER TABLE [Person] ALTER COLUMN [age] BIGINT NOT NULL",
            ]
        );
        assert!(matches!(
            render_operation(Dialect::Sqlite, &op),
            Err(Error::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_change_column_to_enum_keeps_value_domain() {
        let op = DdlOperation::ChangeColumn {
            table: "T".into(),
            column: ColumnDef::new("status", TypeDescriptor::enumeration(["on", "off"]).unwrap()),
        };
        assert_eq!(
            render_operation(Dialect::Postgres, &op).unwrap(),
            [
                r#"ALTER TABLE "T" DROP CONSTRAINT IF EXISTS "T_status_check""#,
                r#"ALTER TABLE "T" ALTER COLUMN "status" TYPE VARCHAR(255), ALTER COLUMN "status" DROP NOT NULL, ALTER COLUMN "status" DROP DEFAULT"#,
                r#"ALTER TABLE "T" ADD CONSTRAINT "T_status_check" CHECK ("status" IN ('on', 'off'))"#,
            ]
        );
        assert_eq!(
            render_operation(Dialect::Mssql, &op).unwrap(),
            [
                "ALTER TABLE [T] DROP CONSTRAINT IF EXISTS [T_status_check]",
                "ALTER TABLE [T] ALTER COLUMN [status] NVARCHAR(255) NULL",
                "ALTER TABLE [T] ADD CONSTRAINT [T_status_check] CHECK ([status] IN (N'on', N'off'))",
            ]
        );
        // Native enums carry their own domain.
        assert_eq!(
            render_operation(Dialect::MySql, &op).unwrap(),
            ["ALTER TABLE `T` MODIFY `status` ENUM('on', 'off')"]
        );
    }

    #[test]
    fn test_enum_array_constrained_on_postgres() {
        let tags = TypeDescriptor::array(TypeDescriptor::enumeration(["a", "b"]).unwrap()).unwrap();
        let table = TableDef::new("T").with_column(ColumnDef::new("tags", tags.clone()));
        assert_eq!(
            create(Dialect::Postgres, table, false),
            [r#"CREATE TABLE "T" ("tags" VARCHAR(255)[] CONSTRAINT "T_tags_check" CHECK ("tags" <@ ARRAY['a', 'b']::VARCHAR(255)[]))"#]
        );

        let op = DdlOperation::ChangeColumn {
            table: "T".into(),
            column: ColumnDef::new("tags", tags),
        };
        let statements = render_operation(Dialect::Postgres, &op).unwrap();
        assert_eq!(
            statements.last().map(String::as_str),
            Some(r#"ALTER TABLE "T" ADD CONSTRAINT "T_tags_check" CHECK ("tags" <@ ARRAY['a', 'b']::VARCHAR(255)[])"#)
        );
    }

    #[test]
    fn test_create_index_variants() {
        let index = IndexDef::new("Person", ["name"]).using(IndexMethod::Btree);
        let op = DdlOperation::AddIndex { index };
        assert_eq!(
            render_operation(Dialect::Postgres, &op).unwrap(),
            [r#"CREATE INDEX "person_name" ON "Person" USING btree ("name")"#]
        );
        assert_eq!(
            render_operation(Dialect::MySql, &op).unwrap(),
            ["CREATE INDEX `person_name` ON `Person` (`name`) USING BTREE"]
        );

        let index = IndexDef::new(
            "Post",
            [crate::catalog::IndexColumn::new("body")
                .with_length(64)
                .with_order(OrderDirection::Desc)],
        )
        .with_kind(IndexKind::Fulltext)
        .with_parser("ngram");
        let op = DdlOperation::AddIndex { index };
        assert_eq!(
            render_operation(Dialect::MySql, &op).unwrap(),
            ["CREATE FULLTEXT INDEX `post_body` ON `Post` (`body`(64) DESC) WITH PARSER ngram"]
        );
        assert!(matches!(
            render_operation(Dialect::Postgres, &op),
            Err(Error::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_drop_index() {
        let op = DdlOperation::RemoveIndex {
            table: "Person".into(),
            name: "person_name".into(),
        };
        assert_eq!(
            render_operation(Dialect::MySql, &op).unwrap(),
            ["DROP INDEX `person_name` ON `Person`"]
        );
        assert_eq!(
            render_operation(Dialect::Sqlite, &op).unwrap(),
            [r#"DROP INDEX "person_name""#]
        );
    }

    #[test]
    fn test_table_rebuild() {
        let snapshot = TableSnapshot {
            name: "Task".into(),
            columns: vec![
                ColumnSnapshot {
                    name: "id".into(),
                    data_type: "INTEGER".into(),
                    allow_null: false,
                    default_value: None,
                    primary_key: true,
                },
                ColumnSnapshot {
                    name: "title".into(),
                    data_type: "VARCHAR(50)".into(),
                    allow_null: true,
                    default_value: Some("'untitled'".into()),
                    primary_key: false,
                },
                ColumnSnapshot {
                    name: "ownerId".into(),
                    data_type: "INTEGER".into(),
                    allow_null: true,
                    default_value: None,
                    primary_key: false,
                },
            ],
            foreign_keys: vec![ForeignKeySnapshot {
                column: "ownerId".into(),
                referenced_table: "User".into(),
                referenced_column: "id".into(),
                on_delete: Some("CASCADE".into()),
                on_update: None,
            }],
            indexes: vec![IndexSnapshot {
                name: "task_title".into(),
                columns: vec!["title".into()],
                unique: false,
                sql: None,
            }],
            sql: None,
        };
        let changed = ColumnDef::new("title", TypeDescriptor::text()).not_null();
        let statements = render_table_rebuild(&snapshot, &changed).unwrap();
        assert_eq!(
            statements,
            [
                r#"CREATE TABLE "Task_backup" ("id" INTEGER NOT NULL, "title" TEXT NOT NULL, "ownerId" INTEGER, PRIMARY KEY ("id"), FOREIGN KEY ("ownerId") REFERENCES "User" ("id") ON DELETE CASCADE)"#,
                r#"INSERT INTO "Task_backup" ("id", "title", "ownerId") SELECT "id", "title", "ownerId" FROM "Task""#,
                r#"DROP TABLE "Task""#,
                r#"ALTER TABLE "Task_backup" RENAME TO "Task""#,
                r#"CREATE INDEX "task_title" ON "Task" ("title")"#,
            ]
        );

        let missing = ColumnDef::new("nope", TypeDescriptor::text());
        assert!(matches!(
            render_table_rebuild(&snapshot, &missing),
            Err(Error::NotFound { .. })
        ));
    }

    fn column(name: &str, data_type: &str, primary_key: bool) -> ColumnSnapshot {
        ColumnSnapshot {
            name: name.into(),
            data_type: data_type.into(),
            allow_null: !primary_key,
            default_value: None,
            primary_key,
        }
    }

    #[test]
    fn test_table_rebuild_keeps_stored_constraints() {
        let snapshot = TableSnapshot {
            name: "B".into(),
            columns: vec![
                column("id", "INTEGER", true),
                column("aId", "INTEGER", false),
                column("email", "VARCHAR(64)", false),
                column("status", "TEXT", false),
                column("note", "VARCHAR(10)", false),
                column("ref", "INTEGER", false),
            ],
            foreign_keys: vec![
                ForeignKeySnapshot {
                    column: "aId".into(),
                    referenced_table: "A".into(),
                    referenced_column: "id".into(),
                    on_delete: Some("CASCADE".into()),
                    on_update: None,
                },
                ForeignKeySnapshot {
                    column: "ref".into(),
                    referenced_table: "A".into(),
                    referenced_column: String::new(),
                    on_delete: Some("SET NULL".into()),
                    on_update: None,
                },
            ],
            indexes: vec![IndexSnapshot {
                name: "b_note".into(),
                columns: vec!["note".into()],
                unique: false,
                sql: Some(r#"CREATE INDEX "b_note" ON "B" ("note" DESC)"#.into()),
            }],
            sql: Some(
                r#"CREATE TABLE "B" ("id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, "aId" INTEGER, "email" VARCHAR(64) UNIQUE, "status" TEXT CONSTRAINT "B_status_check" CHECK ("status" IN ('on', 'off')), "note" VARCHAR(10), "ref" INTEGER REFERENCES "A" ON DELETE SET NULL, FOREIGN KEY ("aId") REFERENCES "A" ("id") ON DELETE CASCADE)"#
                    .into(),
            ),
        };

        let statements =
            render_table_rebuild(&snapshot, &ColumnDef::new("note", TypeDescriptor::text())).unwrap();
        assert_eq!(
            statements[0],
            r#"CREATE TABLE "B_backup" ("id" INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT, "aId" INTEGER, "email" VARCHAR(64) UNIQUE, "status" TEXT CONSTRAINT "B_status_check" CHECK ("status" IN ('on', 'off')), "note" TEXT, "ref" INTEGER REFERENCES "A" ON DELETE SET NULL, FOREIGN KEY ("aId") REFERENCES "A" ("id") ON DELETE CASCADE)"#
        );
        assert_eq!(statements[4], r#"CREATE INDEX "b_note" ON "B" ("note" DESC)"#);

        // An inline reference on the redefined column is carried over.
        let statements =
            render_table_rebuild(&snapshot, &ColumnDef::new("ref", TypeDescriptor::big_int())).unwrap();
        assert!(statements[0].ends_with(
            r#""ref" BIGINT, FOREIGN KEY ("aId") REFERENCES "A" ("id") ON DELETE CASCADE, FOREIGN KEY ("ref") REFERENCES "A" ON DELETE SET NULL)"#
        ));

        // A new reference replaces the table-level one.
        let retarget = ColumnDef::new("aId", TypeDescriptor::integer()).references(Reference::to("C"));
        let statements = render_table_rebuild(&snapshot, &retarget).unwrap();
        assert!(statements[0].contains(r#""aId" INTEGER REFERENCES "C" ("id")"#));
        assert!(!statements[0].contains(r#"REFERENCES "A" ("id")"#));
    }

    #[test]
    fn test_split_table_body() {
        let (clauses, tail) = split_table_body(
            r#"CREATE TABLE "t(1)" ("a" TEXT DEFAULT 'x, y', "b" DECIMAL(10, 2), [c d] INT) STRICT"#,
        )
        .unwrap();
        assert_eq!(
            clauses,
            [r#""a" TEXT DEFAULT 'x, y'"#, r#""b" DECIMAL(10, 2)"#, "[c d] INT"]
        );
        assert_eq!(tail, " STRICT");
        assert_eq!(leading_name(r#""we""ird" TEXT"#).as_deref(), Some(r#"we"ird"#));
        assert_eq!(leading_name("[c d] INT").as_deref(), Some("c d"));
        assert!(is_table_constraint("primary key (a)"));
        assert!(!is_table_constraint(r#""check" TEXT"#));
        assert_eq!(
            foreign_key_column(r#"CONSTRAINT fk FOREIGN KEY ("aId") REFERENCES "A""#).as_deref(),
            Some("aId")
        );
    }
}
