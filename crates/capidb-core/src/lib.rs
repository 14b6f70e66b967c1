//! capidb-core: schema-driven SQL generation
//!
//! This library loads table declarations into a catalog, produces DDL and
//! DML for them, and compiles structured queries into parameterized SQL
//! without requiring a database connection.

pub mod compiler;
pub mod dialect;
pub mod error;
pub mod query;
pub mod schema;
pub mod types;

pub use compiler::{select_statement, validate_query, CompiledWhere, Statement};
pub use dialect::{PostgresAgent, SqlAgent, SqlDialect};
pub use error::{CompileError, DdlError, SchemaError};
pub use query::{Concat, Operator, Ordering, Predicate, Query};
pub use schema::{Catalog, ColumnDef, SchemaBuilder, TableDef, ViewColumn, ViewDef};
pub use types::SemanticType;
