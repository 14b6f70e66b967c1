//! Schema catalog - stores table, column and view definitions

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::query::Operator;
use crate::types::SemanticType;

/// Name of the primary key column every table carries.
pub const ID_COLUMN: &str = "id";

/// Catalog of loaded tables, keyed by physical table name
///
/// Built once by [`SchemaBuilder`](crate::schema::SchemaBuilder) and never
/// mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub tables: IndexMap<String, TableDef>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a table by name
    pub fn get_table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Look up a view on a table
    pub fn get_view(&self, table: &str, view: &str) -> Option<&ViewDef> {
        self.get_table(table).and_then(|t| t.views.get(view))
    }

    /// Get all table names
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }
}

/// Table definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    /// Physical table name
    pub name: String,
    /// Namespace the table was declared under (e.g. `DB.shop.orders`)
    pub namespace: String,
    pub columns: IndexMap<String, ColumnDef>,
    pub views: IndexMap<String, ViewDef>,
}

impl TableDef {
    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.get(name)
    }

    /// Get all column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|s| s.as_str()).collect()
    }

    /// Get a view by name
    pub fn get_view(&self, name: &str) -> Option<&ViewDef> {
        self.views.get(name)
    }

    /// Columns other than the primary key, in declaration order
    pub fn data_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns
            .values()
            .filter(|c| c.semantic_type != SemanticType::PrimaryKey)
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub semantic_type: SemanticType,
    /// Operators a query may apply to this column
    pub queryable: BTreeSet<Operator>,
    pub unique: bool,
    pub indexed: bool,
    pub orderable: bool,
    pub required: bool,
    /// Referenced table, set iff `semantic_type` is a linked-key variant
    pub linked_table: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            queryable: BTreeSet::new(),
            unique: false,
            indexed: false,
            orderable: false,
            required: false,
            linked_table: None,
        }
    }

    /// The implicit `id` column
    pub fn primary_key() -> Self {
        Self::new(ID_COLUMN, SemanticType::PrimaryKey)
            .with_queryable([Operator::Eq, Operator::In, Operator::NotIn])
            .unique()
            .required()
    }

    pub fn linked_to(mut self, table: impl Into<String>) -> Self {
        self.linked_table = Some(table.into());
        self
    }

    pub fn with_queryable(mut self, operators: impl IntoIterator<Item = Operator>) -> Self {
        self.queryable.extend(operators);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn orderable(mut self) -> Self {
        self.orderable = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn allows(&self, operator: Operator) -> bool {
        self.queryable.contains(&operator)
    }
}

/// A projected column of a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewColumn {
    pub name: String,
    /// Table the column links into when a linked view is followed
    pub linked_table: Option<String>,
    /// View of `linked_table` used to expand the linked key
    pub linked_view: Option<String>,
}

impl ViewColumn {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            linked_table: None,
            linked_view: None,
        }
    }

    pub fn linked(
        name: impl Into<String>,
        table: impl Into<String>,
        view: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            linked_table: Some(table.into()),
            linked_view: Some(view.into()),
        }
    }

    /// Entry used in the view identity signature
    pub fn signature(&self) -> String {
        match (&self.linked_table, &self.linked_view) {
            (Some(table), Some(view)) => format!("{}@{}@{}", self.name, table, view),
            _ => self.name.clone(),
        }
    }
}

/// View definition: a named, ordered projection of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDef {
    pub name: String,
    pub columns: Vec<ViewColumn>,
    /// Projected column names joined with `,`
    pub select_list: String,
    pub cache_ttl_seconds: i64,
    pub identity_hash: String,
}

impl ViewDef {
    /// Projected column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Columns that follow a link into another table's view
    pub fn links(&self) -> impl Iterator<Item = &ViewColumn> {
        self.columns.iter().filter(|c| c.linked_view.is_some())
    }
}
