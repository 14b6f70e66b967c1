//! Dialect-independent query representation
//!
//! A [`Query`] is an ordered list of predicates plus an ordering. Callers
//! build one per request (in code or from JSON) and hand it to a
//! [`SqlAgent`](crate::dialect::SqlAgent) to compile.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Predicate operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    /// Nested query against a related table
    #[serde(rename = "CHILD")]
    Child,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Child => "CHILD",
        }
    }

}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "=" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::Ne),
            ">" => Ok(Operator::Gt),
            "<" => Ok(Operator::Lt),
            ">=" => Ok(Operator::Ge),
            "<=" => Ok(Operator::Le),
            "LIKE" => Ok(Operator::Like),
            "IN" => Ok(Operator::In),
            "NOT IN" => Ok(Operator::NotIn),
            "CHILD" => Ok(Operator::Child),
            _ => Err(format!("unknown operator: '{}'", s)),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connective joining a predicate to the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Concat {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl Concat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Concat::And => "AND",
            Concat::Or => "OR",
        }
    }
}

/// One filter condition
///
/// `value` is used by every operator except [`Operator::Child`], which uses
/// `child` instead; for child predicates `column` names the related table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    #[serde(rename = "op")]
    pub operator: Operator,
    pub column: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    #[serde(default)]
    pub concat: Concat,
    #[serde(default, rename = "query", skip_serializing_if = "Option::is_none")]
    pub child: Option<Box<Query>>,
}

impl Predicate {
    pub fn new(operator: Operator, column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            operator,
            column: column.into(),
            value: value.into(),
            concat: Concat::And,
            child: None,
        }
    }

    /// Predicate scoped to a related table
    pub fn child(table: impl Into<String>, query: Query) -> Self {
        Self {
            operator: Operator::Child,
            column: table.into(),
            value: Value::Null,
            concat: Concat::And,
            child: Some(Box::new(query)),
        }
    }

    pub fn with_concat(mut self, concat: Concat) -> Self {
        self.concat = concat;
        self
    }
}

/// One ORDER BY entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub column: String,
    #[serde(default = "default_ascending")]
    pub asc: bool,
}

fn default_ascending() -> bool {
    true
}

/// Filter and ordering for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default, rename = "where")]
    pub predicates: Vec<Predicate>,
    #[serde(default, rename = "order")]
    pub orders: Vec<Ordering>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }

    /// Append a predicate joined with AND
    pub fn and(mut self, operator: Operator, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::new(operator, column, value));
        self
    }

    /// Append a predicate joined with OR
    pub fn or(mut self, operator: Operator, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates
            .push(Predicate::new(operator, column, value).with_concat(Concat::Or));
        self
    }

    /// Append a child query on `table` joined with AND
    pub fn and_child(mut self, table: impl Into<String>, query: Query) -> Self {
        self.predicates.push(Predicate::child(table, query));
        self
    }

    /// Append a child query on `table` joined with OR
    pub fn or_child(mut self, table: impl Into<String>, query: Query) -> Self {
        self.predicates
            .push(Predicate::child(table, query).with_concat(Concat::Or));
        self
    }

    pub fn push(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, asc: bool) -> Self {
        self.orders.push(Ordering {
            column: column.into(),
            asc,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
