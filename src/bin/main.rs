//! litemeta CLI - Inspect the catalog of a SQLite database
//!
//! Usage:
//!   litemeta [--database <file>] <command> [args] [--format table|json] [--sql]
//!
//! Examples:
//!   litemeta --database app.db tables
//!   litemeta --database app.db columns orders --format json
//!   litemeta --database app.db primary-keys orders --sql --dialect ansi

use clap::{Parser, Subcommand, ValueEnum};
use litemeta::config::Settings;
use litemeta::sql::Dialect;
use litemeta::{BestRowScope, Connection, MetaError, MetadataCursor, MetadataRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "litemeta")]
#[command(about = "litemeta - Catalog metadata for SQLite databases")]
#[command(version)]
struct Cli {
    /// Database file (defaults to the configured database)
    #[arg(short = 'D', long, global = true)]
    database: Option<PathBuf>,

    /// Config file (defaults to LITEMETA_CONFIG, ./litemeta.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Print the synthesized SQL instead of running it
    #[arg(long, global = true)]
    sql: bool,

    /// SQL dialect used with --sql
    #[arg(long, global = true, default_value = "sqlite")]
    dialect: DialectArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tables and views
    Tables {
        /// LIKE pattern on the table name
        pattern: Option<String>,

        /// Table type to include (repeatable)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,
    },

    /// List table types
    TableTypes,

    /// List the columns of the first table matching a pattern
    Columns {
        /// LIKE pattern on the table name
        table: Option<String>,

        /// LIKE pattern on the column name
        column: Option<String>,
    },

    /// List primary key columns of a table
    PrimaryKeys { table: String },

    /// List foreign keys declared by a table
    ImportedKeys { table: String },

    /// List foreign keys referencing a table
    ExportedKeys { table: String },

    /// List foreign keys from one table to another
    CrossReference { primary: String, foreign: String },

    /// List index columns of a table
    Indexes {
        table: String,

        /// Only unique indexes
        #[arg(long)]
        unique: bool,
    },

    /// Show the column set that best identifies a row
    BestRow {
        table: String,

        #[arg(long, default_value = "transaction")]
        scope: ScopeArg,

        /// Admit primary key columns that accept NULL
        #[arg(long)]
        nullable: bool,
    },

    /// List the storage types
    TypeInfo,
}

impl From<Commands> for MetadataRequest {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Tables { pattern, types } => MetadataRequest::Tables {
                pattern,
                types: Some(types),
            },
            Commands::TableTypes => MetadataRequest::TableTypes,
            Commands::Columns { table, column } => MetadataRequest::Columns {
                table_pattern: table,
                column_pattern: column,
            },
            Commands::PrimaryKeys { table } => MetadataRequest::PrimaryKeys { table: Some(table) },
            Commands::ImportedKeys { table } => MetadataRequest::ImportedKeys { table: Some(table) },
            Commands::ExportedKeys { table } => MetadataRequest::ExportedKeys { table: Some(table) },
            Commands::CrossReference { primary, foreign } => MetadataRequest::CrossReference {
                primary: Some(primary),
                foreign: Some(foreign),
            },
            Commands::Indexes { table, unique } => MetadataRequest::IndexInfo {
                table: Some(table),
                unique_only: unique,
            },
            Commands::BestRow {
                table,
                scope,
                nullable,
            } => MetadataRequest::BestRowIdentifier {
                table: Some(table),
                scope: scope.into(),
                nullable,
            },
            Commands::TypeInfo => MetadataRequest::TypeInfo,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Sqlite,
    Ansi,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Ansi => Dialect::Ansi,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum ScopeArg {
    Temporary,
    Transaction,
    Session,
}

impl From<ScopeArg> for BestRowScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Temporary => BestRowScope::Temporary,
            ScopeArg::Transaction => BestRowScope::Transaction,
            ScopeArg::Session => BestRowScope::Session,
        }
    }
}

/// Failures surfaced by the CLI.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Meta(#[from] MetaError),

    #[error("encoding JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Tab-separated rows with a header line
    Table,
    /// A JSON array of objects keyed by column name
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&settings);

    match run(cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(settings: &Settings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn run(cli: Cli, settings: &Settings) -> Result<(), CliError> {
    let conn = Connection::open_with(settings, cli.database.as_deref())?;
    let metadata = conn.metadata()?;
    let request = MetadataRequest::from(cli.command);

    if cli.sql {
        println!("{}", metadata.explain(&request, cli.dialect.into())?);
    } else {
        let mut cursor = metadata.query(&request)?;
        match cli.format {
            OutputFormat::Table => print_table(&mut cursor)?,
            OutputFormat::Json => print_json(&mut cursor)?,
        }
        cursor.close();
    }

    Ok(conn.close()?)
}

fn print_table(cursor: &mut MetadataCursor) -> Result<(), MetaError> {
    println!("{}", cursor.column_names()?.join("\t"));
    for row in cursor.collect_rows()? {
        let cells: Vec<String> = row.iter().map(|value| value.to_string()).collect();
        println!("{}", cells.join("\t"));
    }
    Ok(())
}

fn print_json(cursor: &mut MetadataCursor) -> Result<(), CliError> {
    println!("{}", render_json(cursor)?);
    Ok(())
}

/// The cursor's remaining rows as a JSON array of objects keyed by column name.
fn render_json(cursor: &mut MetadataCursor) -> Result<String, CliError> {
    let columns = cursor.column_names()?.to_vec();
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = cursor
        .collect_rows()?
        .into_iter()
        .map(|row| {
            columns
                .iter()
                .cloned()
                .zip(row.into_iter().map(|value| serde_json::json!(value)))
                .collect()
        })
        .collect();

    Ok(serde_json::to_string_pretty(&rows)?)
}
