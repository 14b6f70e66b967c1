//! Query validation against a catalog

use super::MAX_NESTING_DEPTH;
use crate::error::CompileError;
use crate::query::{Operator, Query};
use crate::schema::{Catalog, TableDef, ViewDef};

/// Check that every predicate and ordering in `query` is permitted on `table`.
///
/// Child predicates name their table in the column slot and are checked
/// against that table. Predicate shapes are checked the same way the
/// compiler checks them, so a query that passes also compiles.
pub fn validate_query(catalog: &Catalog, table: &str, query: &Query) -> Result<(), CompileError> {
    let table_def = lookup_table(catalog, table)?;
    validate_level(catalog, table_def, query, 0)?;
    tracing::debug!(table, predicates = query.predicates.len(), "Query validated");
    Ok(())
}

/// Find a table and one of its views
pub fn resolve_view<'a>(
    catalog: &'a Catalog,
    table: &str,
    view: &str,
) -> Result<(&'a TableDef, &'a ViewDef), CompileError> {
    let table_def = lookup_table(catalog, table)?;
    let view_def = table_def
        .get_view(view)
        .ok_or_else(|| CompileError::UnknownView {
            table: table.to_string(),
            view: view.to_string(),
        })?;
    Ok((table_def, view_def))
}

fn lookup_table<'a>(catalog: &'a Catalog, table: &str) -> Result<&'a TableDef, CompileError> {
    catalog
        .get_table(table)
        .ok_or_else(|| CompileError::UnknownTable {
            table: table.to_string(),
        })
}

fn validate_level(
    catalog: &Catalog,
    table: &TableDef,
    query: &Query,
    depth: usize,
) -> Result<(), CompileError> {
    for predicate in &query.predicates {
        if predicate.operator == Operator::Child {
            if depth + 1 > MAX_NESTING_DEPTH {
                return Err(CompileError::NestingTooDeep {
                    max: MAX_NESTING_DEPTH,
                });
            }
            let child_table = lookup_table(catalog, &predicate.column)?;
            let child = predicate
                .child
                .as_deref()
                .ok_or_else(|| CompileError::MissingChildQuery {
                    table: predicate.column.clone(),
                })?;
            if child.predicates.is_empty() {
                return Err(CompileError::EmptyChildQuery {
                    table: predicate.column.clone(),
                });
            }
            validate_level(catalog, child_table, child, depth + 1)?;
            continue;
        }

        if predicate.child.is_some() {
            return Err(CompileError::UnexpectedChildQuery {
                column: predicate.column.clone(),
                operator: predicate.operator.to_string(),
            });
        }

        let column = table
            .get_column(&predicate.column)
            .ok_or_else(|| CompileError::UnknownColumn {
                table: table.name.clone(),
                column: predicate.column.clone(),
            })?;
        if !column.allows(predicate.operator) {
            return Err(CompileError::OperatorNotAllowed {
                table: table.name.clone(),
                column: predicate.column.clone(),
                operator: predicate.operator.to_string(),
            });
        }
    }

    for order in &query.orders {
        let column = table
            .get_column(&order.column)
            .ok_or_else(|| CompileError::UnknownColumn {
                table: table.name.clone(),
                column: order.column.clone(),
            })?;
        if !column.orderable {
            return Err(CompileError::NotOrderable {
                table: table.name.clone(),
                column: order.column.clone(),
            });
        }
    }

    Ok(())
}
