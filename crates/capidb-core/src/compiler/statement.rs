//! Full statement assembly

use serde::Serialize;
use serde_json::Value;

use super::compile_where;
use crate::dialect::SqlAgent;
use crate::error::CompileError;
use crate::query::Query;
use crate::schema::ViewDef;

/// SQL text with its positional arguments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

/// `SELECT <view columns> FROM <table> [WHERE ..] [ORDER BY ..];`
pub fn select_statement<A: SqlAgent + ?Sized>(
    agent: &A,
    table: &str,
    view: &ViewDef,
    query: &Query,
) -> Result<Statement, CompileError> {
    let compiled = compile_where(agent, 1, query)?;

    let mut sql = format!(
        "SELECT {} FROM {}",
        agent.compile_select_columns(&view.column_names()),
        agent.quote_identifier(table)
    );
    if !compiled.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&compiled.sql);
    }
    let order_by = agent.compile_order_by(&query.orders);
    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&order_by);
    }
    sql.push(';');

    Ok(Statement {
        sql,
        args: compiled.args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PostgresAgent;
    use crate::query::Operator;
    use crate::schema::ViewColumn;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn view() -> ViewDef {
        ViewDef {
            name: "brief".to_string(),
            columns: vec![ViewColumn::plain("id"), ViewColumn::plain("name")],
            select_list: "id,name".to_string(),
            cache_ttl_seconds: 0,
            identity_hash: String::new(),
        }
    }

    #[test]
    fn test_select_without_filter() {
        let stmt = select_statement(&PostgresAgent, "users", &view(), &Query::new()).unwrap();
        assert_eq!(stmt.sql, "SELECT \"id\",\"name\" FROM \"users\";");
        assert!(stmt.args.is_empty());
    }

    #[test]
    fn test_select_with_filter_and_order() {
        let query = Query::new()
            .and(Operator::Eq, "status", "active")
            .order_by("name", true);
        let stmt = select_statement(&PostgresAgent, "users", &view(), &query).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT \"id\",\"name\" FROM \"users\" WHERE (\"status\" = $1) ORDER BY \"name\" ASC;"
        );
        assert_eq!(stmt.args, vec![json!("active")]);
    }
}
