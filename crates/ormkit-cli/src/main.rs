//! ormkit Command-Line Client
//!
//! Renders schema files to DDL and applies them to SQLite databases.

mod commands;
mod schema;

use clap::{Parser, Subcommand};
use ormkit_core::{CallContext, Dialect, QueryInterface, QueryInterfaceConfig, SqliteBackend};
use schema::SchemaFile;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// ormkit Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "ormkit")]
#[command(version, about = "Render and apply ormkit schemas")]
pub struct Args {
    /// SQL dialect (postgres, mysql, sqlite, mssql)
    #[arg(short, long, default_value = "sqlite", global = true)]
    pub dialect: Dialect,

    /// SQLite database file
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Per-call timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Wrap multi-statement operations in a transaction
    #[arg(long, global = true)]
    pub transactional: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print DDL for every table in a schema file
    Render {
        /// Schema file (JSON)
        #[arg(short, long)]
        schema: PathBuf,
        /// Render CREATE TABLE IF NOT EXISTS
        #[arg(long)]
        if_not_exists: bool,
    },
    /// Create every table in a schema file
    Apply {
        /// Schema file (JSON)
        #[arg(short, long)]
        schema: PathBuf,
        /// Skip tables that already exist
        #[arg(long)]
        if_not_exists: bool,
    },
    /// List tables
    Tables,
    /// Describe a table as JSON
    Describe {
        /// Table name
        table: String,
    },
    /// Drop every table
    DropAll,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ormkit=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        dialect = %args.dialect,
        "starting ormkit"
    );

    match run(args).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> Result<String, Box<dyn std::error::Error>> {
    let ctx = CallContext::new();
    match &args.command {
        Command::Render {
            schema,
            if_not_exists,
        } => {
            let schema = SchemaFile::load(schema)?;
            commands::render(&schema, args.dialect, *if_not_exists)
        }
        Command::Apply {
            schema,
            if_not_exists,
        } => {
            let schema = SchemaFile::load(schema)?;
            commands::apply(&connect(&args)?, &schema, *if_not_exists, &ctx).await
        }
        Command::Tables => commands::tables(&connect(&args)?, &ctx).await,
        Command::Describe { table } => commands::describe(&connect(&args)?, table, &ctx).await,
        Command::DropAll => commands::drop_all(&connect(&args)?, &ctx).await,
    }
}

/// Open the database named on the command line.
fn connect(args: &Args) -> Result<QueryInterface, Box<dyn std::error::Error>> {
    if args.dialect != Dialect::Sqlite {
        return Err(format!(
            "only sqlite databases can be opened, got dialect {}",
            args.dialect
        )
        .into());
    }
    let path = args
        .database
        .as_ref()
        .ok_or("--database is required for this command")?;
    tracing::info!(database = %path.display(), "opening database");
    let backend = Arc::new(SqliteBackend::open(path)?);

    let mut config = QueryInterfaceConfig::new(args.dialect).with_transactional(args.transactional);
    if let Some(ms) = args.timeout_ms {
        config = config.with_statement_timeout(Duration::from_millis(ms));
    }
    Ok(QueryInterface::new(backend, config))
}
