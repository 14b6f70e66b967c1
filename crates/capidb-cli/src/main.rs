//! capidb CLI - schema-driven SQL generator

mod args;
mod config;
mod output;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use capidb_core::compiler::{resolve_view, select_statement, validate_query};
use capidb_core::schema::migration;
use capidb_core::schema::DeclarationHeader;
use capidb_core::{Catalog, Query, SchemaBuilder, SchemaError, SqlDialect};
use clap::Parser;
use miette::{IntoDiagnostic, Result};

use crate::args::{Args, Command};
use crate::config::{Config, SchemaFile};
use crate::output::{FileError, OutputFormatter, TablePlan};

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match (args.quiet, args.verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::WARN,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    match args.command {
        Command::Ddl {
            source,
            previous,
            table,
        } => {
            let config = Config::resolve(&source)?;
            let agent = dialect(&config)?.agent();
            let formatter = OutputFormatter::new(config.output_format());

            let Some(next) = load_catalog(&config.schema_files()?, &formatter)? else {
                return Ok(true);
            };
            let previous = if previous.is_empty() {
                None
            } else {
                let files: Vec<SchemaFile> = previous.into_iter().map(SchemaFile::named).collect();
                match load_catalog(&files, &formatter)? {
                    Some(catalog) => Some(catalog),
                    None => return Ok(true),
                }
            };

            if let Some(name) = &table {
                if !next.table_exists(name) {
                    miette::bail!("Table '{}' is not declared", name);
                }
            }

            let mut plans = Vec::new();
            if previous.is_none() {
                plans.push(TablePlan {
                    table: "(meta)".to_string(),
                    statements: vec![agent.create_meta_table()],
                });
            }
            for next_table in next.tables.values() {
                if table.as_ref().is_some_and(|t| *t != next_table.name) {
                    continue;
                }
                let old = previous.as_ref().and_then(|p| p.get_table(&next_table.name));
                let statements = migration::plan(agent, old, next_table);
                if !statements.is_empty() {
                    plans.push(TablePlan {
                        table: next_table.name.clone(),
                        statements,
                    });
                }
            }

            if let Some(previous) = &previous {
                for name in previous.table_names() {
                    if !next.table_exists(name) {
                        tracing::warn!(table = name, "Table no longer declared; it is left in place");
                    }
                }
            }

            formatter.print_ddl(&plans)?;
            Ok(false)
        }

        Command::Schema { source } => {
            let config = Config::resolve(&source)?;
            let formatter = OutputFormatter::new(config.output_format());

            match load_catalog(&config.schema_files()?, &formatter)? {
                Some(catalog) => {
                    formatter.print_schema(&catalog)?;
                    Ok(false)
                }
                None => Ok(true),
            }
        }

        Command::Compile {
            query,
            source,
            table,
            view,
        } => {
            let config = Config::resolve(&source)?;
            let agent = dialect(&config)?.agent();
            let formatter = OutputFormatter::new(config.output_format());

            let Some(catalog) = load_catalog(&config.schema_files()?, &formatter)? else {
                return Ok(true);
            };

            let content = fs::read_to_string(&query).into_diagnostic()?;
            let query = Query::from_json_str(&content).into_diagnostic()?;

            let (table_def, view_def) = resolve_view(&catalog, &table, &view)?;
            validate_query(&catalog, &table_def.name, &query)?;
            let statement = select_statement(agent, &table_def.name, view_def, &query)?;

            formatter.print_statement(&statement)?;
            Ok(false)
        }
    }
}

fn dialect(config: &Config) -> Result<SqlDialect> {
    match &config.dialect {
        Some(name) => name.parse().map_err(|e: String| miette::miette!(e)),
        None => Ok(SqlDialect::default()),
    }
}

/// Load declaration files into a catalog.
///
/// Declaration errors are printed and yield `None`; I/O failures are returned.
fn load_catalog(files: &[SchemaFile], formatter: &OutputFormatter) -> Result<Option<Catalog>> {
    if files.is_empty() {
        miette::bail!(
            "No schema files specified. Use --schema, --schema-dir, or configure in {}",
            config::CONFIG_FILE_NAME
        );
    }

    let mut builder = SchemaBuilder::new();
    let mut errors = Vec::new();

    for SchemaFile { path: file, discovered } in files {
        let content = fs::read_to_string(file).into_diagnostic()?;
        if *discovered && !is_table_declaration(file, &content) {
            tracing::debug!(path = %file.display(), "Skipping file without a table declaration version");
            continue;
        }
        let added = if is_toml(file) {
            builder.add_toml(&content).map(|_| ())
        } else {
            builder.add_json(&content).map(|_| ())
        };
        if let Err(error) = added {
            errors.push(FileError {
                file: file.display().to_string(),
                error,
            });
        }
    }

    if errors.is_empty() {
        match builder.build() {
            Ok(catalog) => {
                tracing::info!(tables = catalog.tables.len(), "Loaded schema");
                return Ok(Some(catalog));
            }
            Err(link_errors) => errors.extend(link_errors.into_iter().map(|error: SchemaError| {
                FileError {
                    file: "(schema)".to_string(),
                    error,
                }
            })),
        }
    }

    formatter.print_schema_errors(&errors)?;
    Ok(None)
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// Whether a discovered file declares a table this crate reads
fn is_table_declaration(path: &Path, content: &str) -> bool {
    let header = if is_toml(path) {
        DeclarationHeader::from_toml_str(content)
    } else {
        DeclarationHeader::from_json_str(content)
    };
    header.is_some_and(|h| h.is_table_declaration())
}
