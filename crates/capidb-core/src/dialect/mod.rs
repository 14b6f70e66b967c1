//! SQL dialect support
//!
//! Every dialect implements [`SqlAgent`]. The schema model and query
//! representation never look at the dialect; they only go through the agent.

mod placeholder;
mod postgres;

use std::borrow::Cow;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::compiler::{self, CompiledWhere};
use crate::error::{CompileError, DdlError};
use crate::query::{Ordering, Query};
use crate::types::SemanticType;

pub use placeholder::{dollar_placeholder, PRECOMPUTED_PLACEHOLDERS};
pub use postgres::PostgresAgent;

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    PostgreSQL,
}

impl SqlDialect {
    /// Get the agent producing SQL text for this dialect
    pub fn agent(&self) -> &'static dyn SqlAgent {
        match self {
            SqlDialect::PostgreSQL => &PostgresAgent,
        }
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(SqlDialect::PostgreSQL),
            "mysql" | "sqlite" => Err(format!(
                "{} dialect is not yet supported. Supported dialects: postgresql.",
                s
            )),
            _ => Err(format!(
                "Unknown dialect: '{}'. Supported dialects: postgresql.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::PostgreSQL => write!(f, "postgresql"),
        }
    }
}

/// Produces DDL, DML and compiled predicates for one SQL dialect.
///
/// Implementors provide the dialect primitives and statement templates;
/// the `compile_*` methods are shared and built on top of those primitives.
pub trait SqlAgent: Send + Sync {
    fn dialect(&self) -> SqlDialect;

    /// Bind-parameter token for a 1-based position
    fn placeholder(&self, position: NonZeroUsize) -> Cow<'static, str>;

    fn quote_identifier(&self, name: &str) -> String;

    fn quote_literal(&self, value: &str) -> String;

    /// Pattern-match fragment wrapping the bound value in wildcards
    fn like_operand(&self, placeholder: &str) -> String;

    /// Physical column type and default literal for a semantic type
    fn column_type(&self, semantic_type: SemanticType) -> (&'static str, &'static str);

    fn data_source(
        &self,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        db_name: Option<&str>,
    ) -> String;

    fn has_database(&self, db_name: &str) -> String;

    fn create_database(&self, db_name: &str) -> String;

    fn drop_database(&self, db_name: &str) -> String;

    fn create_meta_table(&self) -> String;

    fn query_meta_table(&self) -> String;

    fn insert_meta_table(&self, id: &str, meta: &str) -> String;

    fn update_meta_table(&self, id: &str, meta: &str) -> String;

    fn create_service_table(&self, table: &str) -> String;

    fn add_column(&self, table: &str, column: &str, semantic_type: SemanticType) -> String;

    /// Like [`SqlAgent::add_column`], taking the stored type tag
    fn add_column_by_name(
        &self,
        table: &str,
        column: &str,
        type_name: &str,
    ) -> Result<String, DdlError> {
        let semantic_type =
            type_name
                .parse::<SemanticType>()
                .map_err(|_| DdlError::UnsupportedType {
                    table: table.to_string(),
                    column: column.to_string(),
                    type_name: type_name.to_string(),
                })?;
        Ok(self.add_column(table, column, semantic_type))
    }

    fn drop_column(&self, table: &str, column: &str) -> String;

    fn create_index(&self, table: &str, column: &str) -> String;

    fn drop_index(&self, table: &str, column: &str) -> String;

    fn create_unique(&self, table: &str, column: &str) -> String;

    fn drop_unique(&self, table: &str, column: &str) -> String;

    /// INSERT with one placeholder per column
    fn insert(&self, table: &str, columns: &[&str]) -> String;

    /// UPDATE by id; the id placeholder follows the column placeholders
    fn update(&self, table: &str, columns: &[&str]) -> String;

    /// DELETE by id
    fn delete(&self, table: &str) -> String;

    fn compile_order_by(&self, orders: &[Ordering]) -> String {
        compiler::compile_order_by(self, orders)
    }

    fn compile_select_columns(&self, columns: &[&str]) -> String {
        compiler::compile_select_columns(self, columns)
    }

    fn compile_where(
        &self,
        start_position: usize,
        query: &Query,
    ) -> Result<CompiledWhere, CompileError> {
        compiler::compile_where(self, start_position, query)
    }
}

/// Index identifier for `(table, column)`
pub fn index_name(table: &str, column: &str) -> String {
    format!("{}__index__{}", table, column)
}

/// Unique constraint identifier for `(table, column)`
pub fn unique_name(table: &str, column: &str) -> String {
    format!("{}__unique__{}", table, column)
}
