//! Error types
//!
//! Every error carries a stable diagnostic code so the CLI (and anything
//! else rendering through miette) can point users at the failing rule.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while loading table declarations into a catalog.
///
/// A table that fails with any of these is never registered.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SchemaError {
    #[error("failed to parse declaration: {message}")]
    #[diagnostic(code(E0100))]
    Parse { message: String },

    #[error("{table}: column '{column}' has invalid type '{type_name}'")]
    #[diagnostic(
        code(E0101),
        help("valid types are PK, Bool, Int64, Float64, Bytes, String, String16, String32, String64, String256, List<String>, Map<String>, DB.<table>, List<DB.<table>> and Map<DB.<table>>")
    )]
    InvalidColumnType {
        table: String,
        column: String,
        type_name: String,
    },

    #[error("{table}: column '{column}' cannot use the primary key type")]
    #[diagnostic(code(E0102), help("only the 'id' column may be declared as PK"))]
    MisplacedPrimaryKey { table: String, column: String },

    #[error("{table}: column 'id' must be declared as PK, found '{type_name}'")]
    #[diagnostic(code(E0103))]
    InvalidIdColumn { table: String, type_name: String },

    #[error("{table}: column '{column}' lists unknown query operator '{operator}'")]
    #[diagnostic(code(E0104))]
    UnknownQueryOperator {
        table: String,
        column: String,
        operator: String,
    },

    #[error("{table}: unsupported declaration version '{version}'")]
    #[diagnostic(code(E0105), help("table declarations use version \"rt.db.v1\""))]
    UnsupportedVersion { table: String, version: String },

    #[error("{table}: views.{view} has no columns")]
    #[diagnostic(code(E0110))]
    EmptyView { table: String, view: String },

    #[error("{table}: views.{view} column '{column}' not found")]
    #[diagnostic(code(E0111))]
    ViewColumnNotFound {
        table: String,
        view: String,
        column: String,
    },

    #[error("{table}: views.{view} column entry '{entry}' is invalid")]
    #[diagnostic(code(E0112), help("use 'column' or 'column@linkedView'"))]
    InvalidViewColumn {
        table: String,
        view: String,
        entry: String,
    },

    #[error("{table}: views.{view} column '{column}' is not a linked key and cannot follow a view")]
    #[diagnostic(code(E0113))]
    LinkOnPlainColumn {
        table: String,
        view: String,
        column: String,
    },

    #[error("{table}: views.{view} cache '{value}' is invalid")]
    #[diagnostic(code(E0114), help("use a duration such as '30s', '5m', '1h30m' or '1d'"))]
    InvalidCacheDuration {
        table: String,
        view: String,
        value: String,
    },

    #[error("duplicate table '{name}'")]
    #[diagnostic(code(E0120))]
    DuplicateTable { name: String },

    #[error("{table}: column '{column}' links to unknown table '{linked_table}'")]
    #[diagnostic(code(E0121))]
    DanglingLinkTable {
        table: String,
        column: String,
        linked_table: String,
    },

    #[error("{table}: views.{view} column '{column}' links to unknown view '{linked_table}.{linked_view}'")]
    #[diagnostic(code(E0122))]
    DanglingLinkView {
        table: String,
        view: String,
        column: String,
        linked_table: String,
        linked_view: String,
    },
}

/// Errors raised while compiling or validating a query.
///
/// A failed compilation never yields partial SQL or arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CompileError {
    #[error("placeholder positions start at 1")]
    #[diagnostic(code(E0200))]
    ZeroStartPosition,

    #[error("invalid {operator} value for column '{column}': expected an array, found {found}")]
    #[diagnostic(code(E0201))]
    InvalidInValue {
        column: String,
        operator: String,
        found: String,
    },

    #[error("invalid {operator} element for column '{column}': expected a scalar, found {found}")]
    #[diagnostic(code(E0202))]
    NonScalarInElement {
        column: String,
        operator: String,
        found: String,
    },

    #[error("empty {operator} list for column '{column}'")]
    #[diagnostic(code(E0203), help("an empty list never matches; drop the predicate instead"))]
    EmptyInList { column: String, operator: String },

    #[error("child predicate on '{table}' has no child query")]
    #[diagnostic(code(E0204))]
    MissingChildQuery { table: String },

    #[error("predicate on '{column}' uses operator {operator} but carries a child query")]
    #[diagnostic(code(E0205))]
    UnexpectedChildQuery { column: String, operator: String },

    #[error("child query on '{table}' has no predicates")]
    #[diagnostic(code(E0206))]
    EmptyChildQuery { table: String },

    #[error("child queries nested deeper than {max} levels")]
    #[diagnostic(code(E0207))]
    NestingTooDeep { max: usize },

    #[error("unknown table '{table}'")]
    #[diagnostic(code(E0210))]
    UnknownTable { table: String },

    #[error("{table}: unknown column '{column}'")]
    #[diagnostic(code(E0211))]
    UnknownColumn { table: String, column: String },

    #[error("{table}: column '{column}' does not allow operator {operator}")]
    #[diagnostic(code(E0212))]
    OperatorNotAllowed {
        table: String,
        column: String,
        operator: String,
    },

    #[error("{table}: column '{column}' is not orderable")]
    #[diagnostic(code(E0213))]
    NotOrderable { table: String, column: String },

    #[error("{table}: unknown view '{view}'")]
    #[diagnostic(code(E0214))]
    UnknownView { table: String, view: String },
}

/// Errors raised while producing DDL text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum DdlError {
    #[error("unsupported column type '{type_name}' for {table}.{column}")]
    #[diagnostic(code(E0300))]
    UnsupportedType {
        table: String,
        column: String,
        type_name: String,
    },
}
