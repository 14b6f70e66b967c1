//! Schema builder - converts table declarations into a Catalog

use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::query::Operator;
use crate::schema::declaration::{
    parse_cache_duration, ColumnDeclaration, TableDeclaration, DECLARATION_VERSION,
};
use crate::schema::hash::view_identity_hash;
use crate::schema::{Catalog, ColumnDef, TableDef, ViewColumn, ViewDef, ID_COLUMN};
use crate::types::{namespace_to_table_name, SemanticType};

/// Builder for constructing a Catalog from table declarations
///
/// Each declaration is validated on its own when added; links between
/// tables are checked once every declaration is in, by [`SchemaBuilder::build`].
pub struct SchemaBuilder {
    tables: IndexMap<String, TableDef>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            tables: IndexMap::new(),
        }
    }

    /// Parse a JSON declaration and add it
    pub fn add_json(&mut self, source: &str) -> Result<&TableDef, SchemaError> {
        let decl = TableDeclaration::from_json_str(source)?;
        self.add_declaration(&decl)
    }

    /// Parse a TOML declaration and add it
    pub fn add_toml(&mut self, source: &str) -> Result<&TableDef, SchemaError> {
        let decl = TableDeclaration::from_toml_str(source)?;
        self.add_declaration(&decl)
    }

    /// Validate a declaration and register the resulting table.
    ///
    /// Nothing is registered when validation fails.
    pub fn add_declaration(&mut self, decl: &TableDeclaration) -> Result<&TableDef, SchemaError> {
        let table = build_table(decl)?;

        if self.tables.contains_key(&table.name) {
            return Err(SchemaError::DuplicateTable { name: table.name });
        }

        tracing::debug!(
            table = %table.name,
            columns = table.columns.len(),
            views = table.views.len(),
            "Registered table"
        );

        let name = table.name.clone();
        Ok(self.tables.entry(name).or_insert(table))
    }

    /// Check links between tables and produce the catalog
    pub fn build(self) -> Result<Catalog, Vec<SchemaError>> {
        let errors: Vec<SchemaError> = self
            .tables
            .values()
            .flat_map(|table| check_links(table, &self.tables))
            .collect();

        if errors.is_empty() {
            Ok(Catalog {
                tables: self.tables,
            })
        } else {
            Err(errors)
        }
    }

    /// Get the tables registered so far
    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.values()
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a single table from its declaration
fn build_table(decl: &TableDeclaration) -> Result<TableDef, SchemaError> {
    let name = namespace_to_table_name(&decl.table);
    if name.is_empty() {
        return Err(SchemaError::Parse {
            message: "table name is empty".to_string(),
        });
    }

    if let Some(version) = decl.version.as_deref().filter(|v| *v != DECLARATION_VERSION) {
        return Err(SchemaError::UnsupportedVersion {
            table: name,
            version: version.to_string(),
        });
    }

    let mut columns = IndexMap::new();
    if !decl.columns.contains_key(ID_COLUMN) {
        columns.insert(ID_COLUMN.to_string(), ColumnDef::primary_key());
    }
    for (column_name, column_decl) in &decl.columns {
        let column = build_column(&name, column_name, column_decl)?;
        columns.insert(column_name.clone(), column);
    }

    // Ordinals follow sorted view names so reordering views in a file keeps
    // every hash stable.
    let mut view_names: Vec<&String> = decl.views.keys().collect();
    view_names.sort();

    let mut views = IndexMap::new();
    for (view_name, view_decl) in &decl.views {
        let ordinal = view_names
            .iter()
            .position(|n| *n == view_name)
            .map_or(1, |i| i + 1);

        let mut view_columns = Vec::with_capacity(view_decl.columns.len());
        for entry in &view_decl.columns {
            view_columns.push(build_view_column(&name, view_name, entry, &columns)?);
        }

        if view_columns.is_empty() {
            return Err(SchemaError::EmptyView {
                table: name,
                view: view_name.clone(),
            });
        }

        let cache_ttl_seconds =
            parse_cache_duration(&view_decl.cache).ok_or_else(|| {
                SchemaError::InvalidCacheDuration {
                    table: name.clone(),
                    view: view_name.clone(),
                    value: view_decl.cache.clone(),
                }
            })?;

        let select_list = view_columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let identity_hash = view_identity_hash(ordinal, &view_columns);

        tracing::trace!(table = %name, view = %view_name, ordinal, hash = %identity_hash, "Built view");

        views.insert(
            view_name.clone(),
            ViewDef {
                name: view_name.clone(),
                columns: view_columns,
                select_list,
                cache_ttl_seconds,
                identity_hash,
            },
        );
    }

    Ok(TableDef {
        name,
        namespace: decl.table.clone(),
        columns,
        views,
    })
}

fn build_column(
    table: &str,
    name: &str,
    decl: &ColumnDeclaration,
) -> Result<ColumnDef, SchemaError> {
    let (semantic_type, linked_table) = SemanticType::parse_declaration(&decl.type_name)
        .ok_or_else(|| SchemaError::InvalidColumnType {
            table: table.to_string(),
            column: name.to_string(),
            type_name: decl.type_name.clone(),
        })?;

    if name == ID_COLUMN && semantic_type != SemanticType::PrimaryKey {
        return Err(SchemaError::InvalidIdColumn {
            table: table.to_string(),
            type_name: decl.type_name.clone(),
        });
    }
    if name != ID_COLUMN && semantic_type == SemanticType::PrimaryKey {
        return Err(SchemaError::MisplacedPrimaryKey {
            table: table.to_string(),
            column: name.to_string(),
        });
    }

    // A declared `id` keeps the primary key capabilities and may add to them.
    let mut column = if name == ID_COLUMN {
        ColumnDef::primary_key()
    } else {
        ColumnDef::new(name, semantic_type)
    };
    if let Some(linked_table) = linked_table {
        column = column.linked_to(linked_table);
    }
    column.unique |= decl.unique;
    column.indexed |= decl.index;
    column.orderable |= decl.order;
    column.required |= decl.required;

    for token in &decl.query {
        let operator = token
            .parse::<Operator>()
            .ok()
            .filter(|op| *op != Operator::Child)
            .ok_or_else(|| SchemaError::UnknownQueryOperator {
                table: table.to_string(),
                column: name.to_string(),
                operator: token.clone(),
            })?;
        column.queryable.insert(operator);
    }

    Ok(column)
}

fn build_view_column(
    table: &str,
    view: &str,
    entry: &str,
    columns: &IndexMap<String, ColumnDef>,
) -> Result<ViewColumn, SchemaError> {
    let invalid = || SchemaError::InvalidViewColumn {
        table: table.to_string(),
        view: view.to_string(),
        entry: entry.to_string(),
    };

    let parts: Vec<&str> = entry.split('@').collect();
    if parts.len() > 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }

    let column = columns
        .get(parts[0])
        .ok_or_else(|| SchemaError::ViewColumnNotFound {
            table: table.to_string(),
            view: view.to_string(),
            column: parts[0].to_string(),
        })?;

    match parts.get(1) {
        None => Ok(ViewColumn::plain(parts[0])),
        Some(linked_view) => match &column.linked_table {
            Some(linked_table) if column.semantic_type.is_linked() => {
                Ok(ViewColumn::linked(parts[0], linked_table, *linked_view))
            }
            _ => Err(SchemaError::LinkOnPlainColumn {
                table: table.to_string(),
                view: view.to_string(),
                column: parts[0].to_string(),
            }),
        },
    }
}

/// Collect dangling link errors for one table
fn check_links(table: &TableDef, tables: &IndexMap<String, TableDef>) -> Vec<SchemaError> {
    let mut errors = Vec::new();

    for column in table.columns.values() {
        if let Some(linked_table) = &column.linked_table {
            if !tables.contains_key(linked_table) {
                errors.push(SchemaError::DanglingLinkTable {
                    table: table.name.clone(),
                    column: column.name.clone(),
                    linked_table: linked_table.clone(),
                });
            }
        }
    }

    for view in table.views.values() {
        for link in view.links() {
            let (Some(linked_table), Some(linked_view)) = (&link.linked_table, &link.linked_view)
            else {
                continue;
            };
            // A missing table is already reported against the column.
            if let Some(target) = tables.get(linked_table) {
                if !target.views.contains_key(linked_view) {
                    errors.push(SchemaError::DanglingLinkView {
                        table: table.name.clone(),
                        view: view.name.clone(),
                        column: link.name.clone(),
                        linked_table: linked_table.clone(),
                        linked_view: linked_view.clone(),
                    });
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const USERS: &str = r#"{
        "version": "rt.db.v1",
        "table": "DB.users",
        "columns": {
            "name": { "type": "String64", "query": ["=", "LIKE"], "order": true, "required": true },
            "age": { "type": "Int64", "query": [">", "<"], "index": true }
        },
        "views": {
            "brief": { "cache": "1m", "columns": ["id", "name"] },
            "full": { "columns": ["id", "name", "age"] }
        }
    }"#;

    const ORDERS: &str = r#"{
        "table": "DB.orders",
        "columns": {
            "owner": { "type": "DB.users", "query": ["="], "index": true },
            "watchers": { "type": "List<DB.users>" }
        },
        "views": {
            "detail": { "cache": "30s", "columns": ["id", "owner@brief", "watchers"] }
        }
    }"#;

    #[test]
    fn test_build_simple_table() {
        let mut builder = SchemaBuilder::new();
        builder.add_json(USERS).unwrap();
        let catalog = builder.build().unwrap();

        let users = catalog.get_table("users").unwrap();
        assert_eq!(users.column_names(), vec!["id", "name", "age"]);
        assert_eq!(
            users.get_column("id").unwrap().semantic_type,
            SemanticType::PrimaryKey
        );

        let name = users.get_column("name").unwrap();
        assert!(name.allows(Operator::Like));
        assert!(name.orderable && name.required);

        let brief = users.get_view("brief").unwrap();
        assert_eq!(brief.select_list, "id,name");
        assert_eq!(brief.cache_ttl_seconds, 60);
        assert_eq!(users.get_view("full").unwrap().cache_ttl_seconds, 0);
    }

    #[test]
    fn test_build_linked_tables() {
        let mut builder = SchemaBuilder::new();
        builder.add_json(ORDERS).unwrap();
        builder.add_json(USERS).unwrap();
        let catalog = builder.build().unwrap();

        let orders = catalog.get_table("orders").unwrap();
        let owner = orders.get_column("owner").unwrap();
        assert_eq!(owner.semantic_type, SemanticType::LinkedKey);
        assert_eq!(owner.linked_table.as_deref(), Some("users"));

        let detail = orders.get_view("detail").unwrap();
        assert_eq!(
            detail.columns[1],
            ViewColumn::linked("owner", "users", "brief")
        );
        assert_eq!(detail.links().count(), 1);
    }

    #[test]
    fn test_dangling_links() {
        let mut builder = SchemaBuilder::new();
        builder.add_json(ORDERS).unwrap();
        let errors = builder.build().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, SchemaError::DanglingLinkTable { .. })));

        let users = USERS.replace("\"brief\"", "\"short\"");
        let mut builder = SchemaBuilder::new();
        builder.add_json(ORDERS).unwrap();
        builder.add_json(&users).unwrap();
        let errors = builder.build().unwrap_err();
        assert_eq!(
            errors,
            vec![SchemaError::DanglingLinkView {
                table: "orders".to_string(),
                view: "detail".to_string(),
                column: "owner".to_string(),
                linked_table: "users".to_string(),
                linked_view: "brief".to_string(),
            }]
        );
    }

    #[test]
    fn test_failed_declaration_is_not_registered() {
        let mut builder = SchemaBuilder::new();
        let bad = r#"{
            "table": "DB.users",
            "columns": { "name": { "type": "String64" } },
            "views": { "brief": { "columns": ["id", "missing"] } }
        }"#;
        let err = builder.add_json(bad).unwrap_err();
        assert!(matches!(err, SchemaError::ViewColumnNotFound { .. }));
        assert_eq!(builder.tables().count(), 0);

        builder.add_json(USERS).unwrap();
        assert!(matches!(
            builder.add_json(USERS),
            Err(SchemaError::DuplicateTable { .. })
        ));
    }

    #[test]
    fn test_invalid_declarations() {
        let cases = [
            (
                r#"{"table": "DB.t", "columns": {"a": {"type": "Int32"}}}"#,
                "E0101",
            ),
            (
                r#"{"table": "DB.t", "columns": {"a": {"type": "PK"}}}"#,
                "E0102",
            ),
            (
                r#"{"table": "DB.t", "columns": {"id": {"type": "String"}}}"#,
                "E0103",
            ),
            (
                r#"{"table": "DB.t", "columns": {"a": {"type": "Bool", "query": ["~"]}}}"#,
                "E0104",
            ),
            (
                r#"{"version": "rt.db.v9", "table": "DB.t"}"#,
                "E0105",
            ),
            (
                r#"{"table": "DB.t", "views": {"v": {"columns": []}}}"#,
                "E0110",
            ),
            (
                r#"{"table": "DB.t", "views": {"v": {"columns": ["id@x@y"]}}}"#,
                "E0112",
            ),
            (
                r#"{"table": "DB.t", "views": {"v": {"columns": ["id@brief"]}}}"#,
                "E0113",
            ),
            (
                r#"{"table": "DB.t", "views": {"v": {"cache": "soon", "columns": ["id"]}}}"#,
                "E0114",
            ),
        ];

        for (source, code) in cases {
            let err = SchemaBuilder::new().add_json(source).unwrap_err();
            let actual = miette::Diagnostic::code(&err).map(|c| c.to_string());
            assert_eq!(actual.as_deref(), Some(code), "{source}");
        }
    }

    #[test]
    fn test_declared_id_keeps_primary_key_capabilities() {
        let mut builder = SchemaBuilder::new();
        let users = builder
            .add_json(
                r#"{
                    "table": "DB.users",
                    "columns": {
                        "id": { "type": "PK", "order": true },
                        "name": { "type": "String" }
                    }
                }"#,
            )
            .unwrap();

        let id = users.get_column("id").unwrap();
        assert_eq!(id.queryable, ColumnDef::primary_key().queryable);
        assert!(id.unique && id.required && id.orderable);

        let catalog = builder.build().unwrap();
        let by_id = crate::query::Query::new().and(Operator::Eq, "id", "a");
        assert_eq!(crate::compiler::validate_query(&catalog, "users", &by_id), Ok(()));
        let by_ids =
            crate::query::Query::new().and(Operator::In, "id", serde_json::json!(["a", "b"]));
        assert_eq!(crate::compiler::validate_query(&catalog, "users", &by_ids), Ok(()));
    }

    #[test]
    fn test_unversioned_declaration_is_accepted() {
        let mut builder = SchemaBuilder::new();
        assert!(builder.add_json(r#"{"table": "DB.t"}"#).is_ok());
    }

    #[test]
    fn test_view_hash_stable_across_declaration_order() {
        let reordered = r#"{
            "table": "DB.users",
            "columns": {
                "age": { "type": "Int64" },
                "name": { "type": "String64" }
            },
            "views": {
                "full": { "cache": "1h", "columns": ["age", "id", "name"] },
                "brief": { "columns": ["name", "id"] }
            }
        }"#;

        let mut a = SchemaBuilder::new();
        let hashes_a: Vec<String> = {
            let users = a.add_json(USERS).unwrap();
            vec![
                users.views["brief"].identity_hash.clone(),
                users.views["full"].identity_hash.clone(),
            ]
        };
        let mut b = SchemaBuilder::new();
        let users = b.add_json(reordered).unwrap();

        assert_eq!(hashes_a[0], users.views["brief"].identity_hash);
        assert_eq!(hashes_a[1], users.views["full"].identity_hash);
        assert_ne!(hashes_a[0], hashes_a[1]);
    }
}
