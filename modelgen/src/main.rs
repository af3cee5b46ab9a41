//! CLI entry point for modelgen

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use modelgen::config::GeneratorConfig;
use modelgen::introspect::{DdlIntrospector, SchemaIntrospector};

#[derive(Parser)]
#[command(name = "modelgen")]
#[command(about = "Generate Rust model structs from SQL schema metadata")]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to SQL schema file (overrides config)
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Dry run - show what would be generated without writing files
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate models (and query interfaces when configured)
    Generate,
    /// Inspect schema (show introspected tables for debugging)
    Inspect,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (before logging, so we can use config.log_level)
    let mut config = GeneratorConfig::load(cli.config.as_deref())?;

    // Initialize logging
    // Priority: RUST_LOG env var > config.log_level > default (debug for dev, info for release)
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let log_level = config.log_level.as_deref().unwrap_or(default_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    // Apply CLI overrides
    if let Some(schema) = cli.schema {
        config.schema_file = schema;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if cli.dry_run {
        config.dry_run = true;
    }

    if let Some(Commands::Inspect) = &cli.command {
        return inspect_schema(&config);
    }

    info!("Generating code from schema: {:?}", config.schema_file);
    let report = modelgen::generate(&config)?;

    if config.dry_run {
        println!("Dry run mode - would write:");
        for path in &report.execute.files {
            println!("  {}", path.display());
        }
    }

    for failure in &report.failures {
        warn!("Table {} not generated: {}", failure.table, failure.message);
    }
    for failure in &report.execute.failures {
        warn!("{} not rendered: {}", failure.artifact, failure.message);
    }

    if report.is_success() {
        info!("Code generation completed successfully");
        Ok(())
    } else {
        anyhow::bail!(
            "code generation finished with {} failure(s)",
            report.failures.len() + report.execute.failures.len()
        )
    }
}

fn inspect_schema(config: &GeneratorConfig) -> Result<()> {
    let introspector = DdlIntrospector::from_file(&config.schema_file, config.dialect)?;
    let tables = introspector.tables()?;

    println!("Introspected {} tables:\n", tables.len());
    for table in &tables {
        println!("Table: {}", table.table_ref());
        if let Some(comment) = &table.comment {
            println!("  Comment: {}", comment);
        }
        println!("  Columns:");
        for col in &table.columns {
            let nullable = match col.nullable {
                Some(true) => "NULL",
                Some(false) => "NOT NULL",
                None => "NULL?",
            };
            let pk = if col.is_primary_key { " PK" } else { "" };
            let auto_inc = if col.is_auto_increment {
                " AUTO_INCREMENT"
            } else {
                ""
            };
            println!(
                "    - {} {} ({} -> {}) {}{}{}",
                col.name,
                col.full_type,
                col.database_type_name,
                col.scan_type,
                nullable,
                pk,
                auto_inc
            );
            for index in &col.indexes {
                let unique = if index.unique { "UNIQUE " } else { "" };
                println!("      {}INDEX {}", unique, index.name);
            }
        }
        if !table.foreign_keys.is_empty() {
            println!("  Foreign Keys:");
            for fk in &table.foreign_keys {
                println!(
                    "    - {} -> {}.{}",
                    fk.column_name, fk.referenced_table, fk.referenced_column
                );
            }
        }
        println!();
    }

    Ok(())
}
