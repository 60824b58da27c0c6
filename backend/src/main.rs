//! PharmPlus bulk CLI - validate CSV imports and render CSV exports
//!
//! # Commands
//!
//! ```bash
//! pharmplus-bulk serve                          # Start HTTP server (port 3000)
//! pharmplus-bulk import members.csv -e members  # Validate a CSV import
//! pharmplus-bulk export claims.json -e claims   # Render JSON records as CSV
//! pharmplus-bulk template claims                # Print an import template
//! ```

use clap::{Parser, Subcommand};
use pharmplus_bulk::{
    export_batch, import_batch_with, import_template, logger, read_csv_file, EntityKind,
    ExportSpec, InMemoryStore, Record, RecordStore, RowValidator, Settings,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pharmplus-bulk")]
#[command(about = "Bulk CSV import validation and export for PharmPlus", long_about = None)]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a CSV file and report per-row results
    Import {
        /// Input CSV file
        input: PathBuf,

        /// Entity kind (members, applications, claims, transactions)
        #[arg(short, long)]
        entity: EntityKind,

        /// CSV delimiter
        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Output file for the batch result (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write accepted, normalized records to this JSON file
        #[arg(long)]
        accepted: Option<PathBuf>,
    },

    /// Render a JSON array of records as CSV
    Export {
        /// Input JSON file (array of records)
        input: PathBuf,

        /// Entity kind (members, applications, claims, transactions)
        #[arg(short, long)]
        entity: EntityKind,

        /// Comma-separated columns (default: the entity's natural columns)
        #[arg(short, long)]
        columns: Option<String>,

        /// Keep records dated on or after this day (YYYY-MM-DD)
        #[arg(long)]
        date_from: Option<String>,

        /// Keep records dated on or before this day (YYYY-MM-DD)
        #[arg(long)]
        date_to: Option<String>,

        /// Keep records with this status
        #[arg(long)]
        status: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the import template of an entity
    Template {
        /// Entity kind (members, applications, claims, transactions)
        entity: EntityKind,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (overrides PHARMPLUS_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    logger::init_logger(cli.verbose, settings.log_json);

    let result = match cli.command {
        Commands::Import {
            input,
            entity,
            delimiter,
            output,
            accepted,
        } => cmd_import(&input, entity, delimiter, output.as_deref(), accepted.as_deref()),

        Commands::Export {
            input,
            entity,
            columns,
            date_from,
            date_to,
            status,
            output,
        } => {
            let spec = ExportSpec {
                entity,
                columns: columns.as_deref().map(pharmplus_bulk::api::split_columns),
                date_from,
                date_to,
                status,
            };
            cmd_export(&input, &spec, output.as_deref())
        }

        Commands::Template { entity, output } => {
            write_output(import_template(entity).trim_end(), output.as_deref())
        }

        Commands::Serve { port } => cmd_serve(settings, port).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn cmd_import(
    input: &Path,
    entity: EntityKind,
    delimiter: char,
    output: Option<&Path>,
    accepted: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %input.display(), %entity, "Validating import");

    let text = read_csv_file(input)?;
    let result = import_batch_with(&text, delimiter, &RowValidator::new(entity));

    for error in result.errors.iter().take(10) {
        tracing::warn!(row = error.row, field = %error.field, "{}", error.message);
    }
    if result.errors.len() > 10 {
        tracing::warn!("... and {} more errors", result.errors.len() - 10);
    }
    tracing::info!("{}", result.summary());

    if let Some(path) = accepted {
        fs::write(path, serde_json::to_string_pretty(&result.records)?)?;
        tracing::info!(path = %path.display(), "Accepted records written");
    }

    let json = serde_json::to_string_pretty(&result)?;
    write_output(&json, output)?;

    if result.failed_count > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_export(
    input: &Path,
    spec: &ExportSpec,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(input)?;
    let records: Vec<Record> = serde_json::from_str(&content)?;
    tracing::info!(count = records.len(), entity = %spec.entity, "Loaded records");

    // Filters are applied the same way the server applies them.
    let store = InMemoryStore::new();
    store.persist(spec.entity, records)?;
    let selected = store.fetch(spec)?;

    let csv = export_batch(&selected, spec)?;
    tracing::info!(count = selected.len(), "Exported records");
    write_output(&csv, output)
}

async fn cmd_serve(
    mut settings: Settings,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        settings.port = port;
    }
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new());
    pharmplus_bulk::server::start_server(settings, store).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            tracing::info!(path = %p.display(), "Output written");
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
