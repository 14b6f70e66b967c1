//! Migration planning
//!
//! Diffs two versions of a table and lists the DDL statements that move the
//! database from the first to the second. The `id` column is created with the
//! table and never altered.

use crate::dialect::SqlAgent;
use crate::schema::{ColumnDef, TableDef};

/// DDL taking `previous` (or nothing) to `next`
pub fn plan<A: SqlAgent + ?Sized>(
    agent: &A,
    previous: Option<&TableDef>,
    next: &TableDef,
) -> Vec<String> {
    let mut statements = Vec::new();
    let table = next.name.as_str();

    let Some(previous) = previous else {
        statements.push(agent.create_service_table(table));
        for column in next.data_columns() {
            add_column(agent, table, column, &mut statements);
        }
        tracing::debug!(table, statements = statements.len(), "Planned new table");
        return statements;
    };

    for old in previous.data_columns() {
        if next.get_column(&old.name).is_none() {
            drop_column(agent, table, old, &mut statements);
        }
    }

    for column in next.data_columns() {
        match previous.get_column(&column.name) {
            None => add_column(agent, table, column, &mut statements),
            Some(old) if old.semantic_type != column.semantic_type => {
                drop_column(agent, table, old, &mut statements);
                add_column(agent, table, column, &mut statements);
            }
            Some(old) => {
                if old.unique != column.unique {
                    statements.push(if column.unique {
                        agent.create_unique(table, &column.name)
                    } else {
                        agent.drop_unique(table, &column.name)
                    });
                }
                if old.indexed != column.indexed {
                    statements.push(if column.indexed {
                        agent.create_index(table, &column.name)
                    } else {
                        agent.drop_index(table, &column.name)
                    });
                }
            }
        }
    }

    tracing::debug!(table, statements = statements.len(), "Planned table changes");
    statements
}

fn add_column<A: SqlAgent + ?Sized>(
    agent: &A,
    table: &str,
    column: &ColumnDef,
    out: &mut Vec<String>,
) {
    out.push(agent.add_column(table, &column.name, column.semantic_type));
    if column.unique {
        out.push(agent.create_unique(table, &column.name));
    }
    if column.indexed {
        out.push(agent.create_index(table, &column.name));
    }
}

fn drop_column<A: SqlAgent + ?Sized>(
    agent: &A,
    table: &str,
    column: &ColumnDef,
    out: &mut Vec<String>,
) {
    if column.unique {
        out.push(agent.drop_unique(table, &column.name));
    }
    if column.indexed {
        out.push(agent.drop_index(table, &column.name));
    }
    out.push(agent.drop_column(table, &column.name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PostgresAgent;
    use crate::schema::SchemaBuilder;
    use pretty_assertions::assert_eq;

    fn table(source: &str) -> TableDef {
        SchemaBuilder::new().add_json(source).unwrap().clone()
    }

    #[test]
    fn test_plan_new_table() {
        let next = table(
            r#"{"table": "DB.users", "columns": {
                "email": {"type": "String256", "unique": true},
                "age": {"type": "Int64", "index": true}
            }}"#,
        );
        assert_eq!(
            plan(&PostgresAgent, None, &next),
            vec![
                "CREATE TABLE IF NOT EXISTS \"users\" (\"id\" varchar(64) NOT NULL PRIMARY KEY);",
                "ALTER TABLE \"users\" ADD COLUMN \"email\" varchar(256) NOT NULL DEFAULT '';",
                "ALTER TABLE \"users\" ADD CONSTRAINT \"users__unique__email\" UNIQUE (\"email\");",
                "ALTER TABLE \"users\" ADD COLUMN \"age\" bigint NOT NULL DEFAULT 0;",
                "CREATE INDEX \"users__index__age\" ON \"users\" (\"age\");",
            ]
        );
    }

    #[test]
    fn test_plan_changes() {
        let previous = table(
            r#"{"table": "DB.users", "columns": {
                "nick": {"type": "String16", "index": true},
                "age": {"type": "Int64"},
                "email": {"type": "String256", "unique": true}
            }}"#,
        );
        let next = table(
            r#"{"table": "DB.users", "columns": {
                "age": {"type": "Float64"},
                "email": {"type": "String256", "index": true},
                "tags": {"type": "List<String>"}
            }}"#,
        );
        assert_eq!(
            plan(&PostgresAgent, Some(&previous), &next),
            vec![
                "DROP INDEX \"users__index__nick\";",
                "ALTER TABLE \"users\" DROP COLUMN \"nick\";",
                "ALTER TABLE \"users\" DROP COLUMN \"age\";",
                "ALTER TABLE \"users\" ADD COLUMN \"age\" double precision NOT NULL DEFAULT 0;",
                "ALTER TABLE \"users\" DROP CONSTRAINT \"users__unique__email\";",
                "CREATE INDEX \"users__index__email\" ON \"users\" (\"email\");",
                "ALTER TABLE \"users\" ADD COLUMN \"tags\" text NOT NULL DEFAULT '[]';",
            ]
        );
    }

    #[test]
    fn test_plan_unchanged_table_is_empty() {
        let source = r#"{"table": "DB.users", "columns": {"name": {"type": "String"}}}"#;
        assert!(plan(&PostgresAgent, Some(&table(source)), &table(source)).is_empty());
    }
}
