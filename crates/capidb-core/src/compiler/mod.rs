//! Query compiler
//!
//! Lowers a [`Query`] into SQL text plus a flat argument list whose order
//! matches the placeholder numbering left to right, depth first. The
//! compiler keeps no state between calls: the placeholder cursor is threaded
//! through the recursion and handed back as [`CompiledWhere::next_position`].

mod statement;
mod validate;

use std::num::NonZeroUsize;

use serde_json::Value;

use crate::dialect::SqlAgent;
use crate::error::CompileError;
use crate::query::{Operator, Ordering, Predicate, Query};

pub use statement::{select_statement, Statement};
pub use validate::{resolve_view, validate_query};

/// Deepest chain of child queries accepted.
pub const MAX_NESTING_DEPTH: usize = 16;

/// Compiled WHERE body
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWhere {
    /// Parenthesized condition, empty when the query has no predicates
    pub sql: String,
    /// Bound values, `args[k]` belongs to placeholder `start_position + k`
    pub args: Vec<Value>,
    /// First placeholder position not used by this fragment
    pub next_position: usize,
}

impl CompiledWhere {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// `"col" ASC, "other" DESC`, or empty without orderings
pub fn compile_order_by<A: SqlAgent + ?Sized>(agent: &A, orders: &[Ordering]) -> String {
    orders
        .iter()
        .map(|order| {
            let direction = if order.asc { "ASC" } else { "DESC" };
            format!("{} {}", agent.quote_identifier(&order.column), direction)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `"a","b","c"`
pub fn compile_select_columns<A: SqlAgent + ?Sized>(agent: &A, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| agent.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(",")
}

/// Compile the predicates of `query`, numbering placeholders from `start_position`.
pub fn compile_where<A: SqlAgent + ?Sized>(
    agent: &A,
    start_position: usize,
    query: &Query,
) -> Result<CompiledWhere, CompileError> {
    let start = NonZeroUsize::new(start_position).ok_or(CompileError::ZeroStartPosition)?;
    let compiled = compile_level(agent, start, query, 0)?;

    tracing::debug!(
        dialect = %agent.dialect(),
        predicates = query.predicates.len(),
        start_position,
        args = compiled.args.len(),
        "Compiled WHERE"
    );

    Ok(compiled)
}

fn compile_level<A: SqlAgent + ?Sized>(
    agent: &A,
    start: NonZeroUsize,
    query: &Query,
    depth: usize,
) -> Result<CompiledWhere, CompileError> {
    let mut fragments = Vec::with_capacity(query.predicates.len());
    let mut args = Vec::new();
    let mut pos = start;

    for (i, predicate) in query.predicates.iter().enumerate() {
        let mut sql = String::new();
        if i > 0 {
            sql.push_str(predicate.concat.as_str());
            sql.push(' ');
        }

        if predicate.operator != Operator::Child && predicate.child.is_some() {
            return Err(CompileError::UnexpectedChildQuery {
                column: predicate.column.clone(),
                operator: predicate.operator.to_string(),
            });
        }

        let column = agent.quote_identifier(&predicate.column);

        match predicate.operator {
            Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Lt
            | Operator::Ge
            | Operator::Le => {
                sql.push_str(&format!(
                    "{} {} {}",
                    column,
                    predicate.operator,
                    agent.placeholder(pos)
                ));
                args.push(predicate.value.clone());
                pos = pos.saturating_add(1);
            }
            Operator::Like => {
                let operand = agent.like_operand(&agent.placeholder(pos));
                sql.push_str(&format!("{} LIKE {}", column, operand));
                args.push(predicate.value.clone());
                pos = pos.saturating_add(1);
            }
            Operator::In | Operator::NotIn => {
                let items = membership_items(predicate)?;
                let mut tokens = Vec::with_capacity(items.len());
                for item in items {
                    tokens.push(agent.placeholder(pos));
                    args.push(item.clone());
                    pos = pos.saturating_add(1);
                }
                sql.push_str(&format!(
                    "{} {} ({})",
                    column,
                    predicate.operator,
                    tokens.join(",")
                ));
            }
            Operator::Child => {
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
                if depth + 1 > MAX_NESTING_DEPTH {
                    return Err(CompileError::NestingTooDeep {
                        max: MAX_NESTING_DEPTH,
                    });
                }

                let compiled = compile_level(agent, pos, child, depth + 1)?;
                sql.push_str(&compiled.sql);
                args.extend(compiled.args);
                pos = NonZeroUsize::new(compiled.next_position).unwrap_or(pos);
            }
        }

        fragments.push(sql);
    }

    let sql = if fragments.is_empty() {
        String::new()
    } else {
        format!("({})", fragments.join(" "))
    };

    Ok(CompiledWhere {
        sql,
        args,
        next_position: pos.get(),
    })
}

/// The scalars bound by an IN / NOT IN predicate
fn membership_items(predicate: &Predicate) -> Result<&[Value], CompileError> {
    let operator = predicate.operator.to_string();
    let items: &[Value] = match &predicate.value {
        Value::Array(items) => items.as_slice(),
        other => {
            return Err(CompileError::InvalidInValue {
                column: predicate.column.clone(),
                operator,
                found: json_kind(other).to_string(),
            })
        }
    };

    if items.is_empty() {
        return Err(CompileError::EmptyInList {
            column: predicate.column.clone(),
            operator,
        });
    }
    if let Some(bad) = items
        .iter()
        .find(|v| matches!(v, Value::Array(_) | Value::Object(_)))
    {
        return Err(CompileError::NonScalarInElement {
            column: predicate.column.clone(),
            operator,
            found: json_kind(bad).to_string(),
        });
    }

    Ok(items)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PostgresAgent;
    use crate::query::Concat;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_empty_query() {
        let compiled = compile_where(&PostgresAgent, 4, &Query::new()).unwrap();
        assert!(compiled.is_empty());
        assert!(compiled.args.is_empty());
        assert_eq!(compiled.next_position, 4);
    }

    #[test]
    fn test_comparison_operators() {
        let query = Query::new()
            .and(Operator::Ne, "a", 1)
            .and(Operator::Gt, "b", 2)
            .or(Operator::Le, "c", 3);
        let compiled = compile_where(&PostgresAgent, 1, &query).unwrap();
        assert_eq!(compiled.sql, "(\"a\" != $1 AND \"b\" > $2 OR \"c\" <= $3)");
        assert_eq!(compiled.args, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(compiled.next_position, 4);
    }

    #[test]
    fn test_like_binds_raw_value() {
        let query = Query::new().and(Operator::Like, "name", "bob");
        let compiled = compile_where(&PostgresAgent, 3, &query).unwrap();
        assert_eq!(compiled.sql, "(\"name\" LIKE '%' || $3 || '%')");
        assert_eq!(compiled.args, vec![json!("bob")]);
    }

    #[test]
    fn test_first_concat_is_ignored() {
        let query = Query::new().push(Predicate::new(Operator::Eq, "a", 1).with_concat(Concat::Or));
        let compiled = compile_where(&PostgresAgent, 1, &query).unwrap();
        assert_eq!(compiled.sql, "(\"a\" = $1)");
    }

    #[test]
    fn test_not_in_heterogeneous() {
        let query = Query::new().and(Operator::NotIn, "v", json!([1, "two", null, true]));
        let compiled = compile_where(&PostgresAgent, 2, &query).unwrap();
        assert_eq!(compiled.sql, "(\"v\" NOT IN ($2,$3,$4,$5))");
        assert_eq!(compiled.args, vec![json!(1), json!("two"), json!(null), json!(true)]);
        assert_eq!(compiled.next_position, 6);
    }

    #[test]
    fn test_membership_errors() {
        let not_array = Query::new().and(Operator::In, "id", "a");
        assert!(matches!(
            compile_where(&PostgresAgent, 1, &not_array),
            Err(CompileError::InvalidInValue { .. })
        ));

        let empty = Query::new().and(Operator::In, "id", json!([]));
        assert!(matches!(
            compile_where(&PostgresAgent, 1, &empty),
            Err(CompileError::EmptyInList { .. })
        ));

        let nested = Query::new().and(Operator::In, "id", json!([[1]]));
        assert!(matches!(
            compile_where(&PostgresAgent, 1, &nested),
            Err(CompileError::NonScalarInElement { .. })
        ));
    }

    #[test]
    fn test_child_shape_errors() {
        let mut missing = Predicate::child("orders", Query::new());
        missing.child = None;
        assert_eq!(
            compile_where(&PostgresAgent, 1, &Query::new().push(missing)),
            Err(CompileError::MissingChildQuery {
                table: "orders".to_string()
            })
        );

        let empty = Query::new().and_child("orders", Query::new());
        assert_eq!(
            compile_where(&PostgresAgent, 1, &empty),
            Err(CompileError::EmptyChildQuery {
                table: "orders".to_string()
            })
        );

        let mut stray = Predicate::new(Operator::Eq, "a", 1);
        stray.child = Some(Box::new(Query::new().and(Operator::Eq, "b", 2)));
        assert!(matches!(
            compile_where(&PostgresAgent, 1, &Query::new().push(stray)),
            Err(CompileError::UnexpectedChildQuery { .. })
        ));
    }

    #[test]
    fn test_zero_start_position() {
        let query = Query::new().and(Operator::Eq, "a", 1);
        assert_eq!(
            compile_where(&PostgresAgent, 0, &query),
            Err(CompileError::ZeroStartPosition)
        );
    }

    #[test]
    fn test_nesting_limit() {
        fn nested(levels: usize) -> Query {
            let mut query = Query::new().and(Operator::Eq, "leaf", 0);
            for _ in 0..levels {
                query = Query::new().and_child("t", query);
            }
            query
        }

        let compiled = compile_where(&PostgresAgent, 1, &nested(MAX_NESTING_DEPTH)).unwrap();
        assert_eq!(compiled.args.len(), 1);
        assert!(compiled.sql.contains("\"leaf\" = $1"));

        assert_eq!(
            compile_where(&PostgresAgent, 1, &nested(MAX_NESTING_DEPTH + 1)),
            Err(CompileError::NestingTooDeep {
                max: MAX_NESTING_DEPTH
            })
        );
    }

    #[test]
    fn test_order_by_and_select() {
        let orders = [
            Ordering {
                column: "b".to_string(),
                asc: false,
            },
            Ordering {
                column: "a".to_string(),
                asc: true,
            },
        ];
        assert_eq!(compile_order_by(&PostgresAgent, &orders), "\"b\" DESC, \"a\" ASC");
        assert_eq!(compile_order_by(&PostgresAgent, &[]), "");
        assert_eq!(
            compile_select_columns(&PostgresAgent, &["id", "name"]),
            "\"id\",\"name\""
        );
    }
}
