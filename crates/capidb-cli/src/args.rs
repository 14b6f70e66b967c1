//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "capidb")]
#[command(author, version, about = "Schema-driven SQL generator")]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Where table declarations come from
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct SchemaArgs {
    /// Table declaration files (.json or .toml)
    #[arg(short, long = "schema", value_name = "FILE")]
    pub schema: Vec<PathBuf>,

    /// Directory searched recursively for declaration files
    #[arg(long = "schema-dir", value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Configuration file (defaults to the nearest capidb.toml)
    #[arg(short, long, value_name = "FILE", env = "CAPIDB_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQL dialect
    #[arg(short, long)]
    pub dialect: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the DDL that creates or migrates the declared tables
    Ddl {
        #[command(flatten)]
        source: SchemaArgs,

        /// Previous declaration files; DDL migrates from these instead of creating
        #[arg(long, value_name = "FILE")]
        previous: Vec<PathBuf>,

        /// Only emit DDL for this table
        #[arg(short, long)]
        table: Option<String>,
    },

    /// Display the loaded tables, columns and views
    Schema {
        #[command(flatten)]
        source: SchemaArgs,
    },

    /// Compile a JSON query file into a SELECT statement
    Compile {
        /// JSON query file
        query: PathBuf,

        #[command(flatten)]
        source: SchemaArgs,

        /// Table the query runs against
        #[arg(short, long)]
        table: String,

        /// View whose columns are selected
        #[arg(long)]
        view: String,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
}
