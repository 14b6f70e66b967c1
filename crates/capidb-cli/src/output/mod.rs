//! Output formatting

use capidb_core::compiler::Statement;
use capidb_core::{Catalog, SchemaError};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::args::OutputFormat;

/// DDL planned for one table
#[derive(Debug, Serialize)]
pub struct TablePlan {
    pub table: String,
    pub statements: Vec<String>,
}

/// A declaration error together with the file it came from
#[derive(Debug)]
pub struct FileError {
    pub file: String,
    pub error: SchemaError,
}

/// Output formatter for command results
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print declaration errors in the configured format
    pub fn print_schema_errors(&self, errors: &[FileError]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                for err in errors {
                    eprintln!("  --> {}", err.file);
                    eprintln!("{:?}", miette::Report::new(err.error.clone()));
                }
                eprintln!("Found {} error(s) in table declarations", errors.len());
                Ok(())
            }
            OutputFormat::Json => {
                let diagnostics: Vec<serde_json::Value> = errors
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "file": e.file,
                            "code": miette::Diagnostic::code(&e.error).map(|c| c.to_string()),
                            "message": e.error.to_string(),
                        })
                    })
                    .collect();
                print_json(&serde_json::json!({ "errors": diagnostics }))
            }
        }
    }

    pub fn print_ddl(&self, plans: &[TablePlan]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                for plan in plans {
                    println!("-- {}", plan.table);
                    for statement in &plan.statements {
                        println!("{}", statement);
                    }
                    println!();
                }
                Ok(())
            }
            OutputFormat::Json => print_json(plans),
        }
    }

    pub fn print_schema(&self, catalog: &Catalog) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("Schema Information:");
                println!("==================");
                for table in catalog.tables.values() {
                    println!("\nTable: {} ({})", table.name, table.namespace);
                    for column in table.columns.values() {
                        let mut flags = Vec::new();
                        if column.required {
                            flags.push("required");
                        }
                        if column.unique {
                            flags.push("unique");
                        }
                        if column.indexed {
                            flags.push("index");
                        }
                        if column.orderable {
                            flags.push("order");
                        }
                        let link = column
                            .linked_table
                            .as_deref()
                            .map(|t| format!(" -> {}", t))
                            .unwrap_or_default();
                        let operators: Vec<&str> =
                            column.queryable.iter().map(|op| op.as_str()).collect();
                        println!(
                            "  - {} {}{} [{}] query({})",
                            column.name,
                            column.semantic_type,
                            link,
                            flags.join(","),
                            operators.join(" ")
                        );
                    }
                    for view in table.views.values() {
                        let columns: Vec<String> =
                            view.columns.iter().map(|c| c.signature()).collect();
                        println!(
                            "  view {} ttl={}s hash={}: {}",
                            view.name,
                            view.cache_ttl_seconds,
                            view.identity_hash,
                            columns.join(", ")
                        );
                    }
                }
                Ok(())
            }
            OutputFormat::Json => print_json(catalog),
        }
    }

    pub fn print_statement(&self, statement: &Statement) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("{}", statement.sql);
                for (i, arg) in statement.args.iter().enumerate() {
                    println!("  ${} = {}", i + 1, arg);
                }
                Ok(())
            }
            OutputFormat::Json => print_json(statement),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", text);
    Ok(())
}
