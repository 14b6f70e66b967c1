//! Table declarations as written by users (JSON or TOML)

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Declaration format version understood by this crate.
pub const DECLARATION_VERSION: &str = "rt.db.v1";

/// One table declaration file
///
/// ```json
/// {
///   "version": "rt.db.v1",
///   "table": "DB.shop.orders",
///   "columns": {
///     "title": { "type": "String64", "query": ["=", "LIKE"], "order": true },
///     "owner": { "type": "DB.shop.users", "index": true }
///   },
///   "views": {
///     "brief": { "cache": "5m", "columns": ["id", "title", "owner@brief"] }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDeclaration {
    #[serde(default)]
    pub version: Option<String>,
    /// Namespace of the table, e.g. `DB.shop.orders`
    pub table: String,
    #[serde(default)]
    pub columns: IndexMap<String, ColumnDeclaration>,
    #[serde(default)]
    pub views: IndexMap<String, ViewDeclaration>,
}

impl TableDeclaration {
    pub fn from_json_str(source: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(source).map_err(|e| SchemaError::Parse {
            message: e.to_string(),
        })
    }

    pub fn from_toml_str(source: &str) -> Result<Self, SchemaError> {
        toml::from_str(source).map_err(|e| SchemaError::Parse {
            message: e.to_string(),
        })
    }
}

/// The `version` field alone, read before committing to a full parse
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeclarationHeader {
    #[serde(default)]
    pub version: Option<String>,
}

impl DeclarationHeader {
    /// `None` when the source is not a JSON object
    pub fn from_json_str(source: &str) -> Option<Self> {
        serde_json::from_str(source).ok()
    }

    /// `None` when the source is not a TOML table
    pub fn from_toml_str(source: &str) -> Option<Self> {
        toml::from_str(source).ok()
    }

    /// Whether the header marks a table declaration this crate reads
    pub fn is_table_declaration(&self) -> bool {
        self.version.as_deref() == Some(DECLARATION_VERSION)
    }
}

/// Column declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnDeclaration {
    #[serde(rename = "type")]
    pub type_name: String,
    /// Allowed query operators (`=`, `!=`, `>`, `<`, `>=`, `<=`, `LIKE`, `IN`, `NOT IN`)
    #[serde(default)]
    pub query: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub index: bool,
    #[serde(default)]
    pub order: bool,
    #[serde(default)]
    pub required: bool,
}

/// View declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewDeclaration {
    /// Cache lifetime such as `30s`, `5m` or `1h30m`; empty means no caching
    #[serde(default)]
    pub cache: String,
    /// Projected columns; `column@view` follows a linked key into `view`
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Parse a cache lifetime into whole seconds.
///
/// Accepts an empty string (0), a bare number of seconds, or a sequence of
/// `<n><unit>` pairs with units `s`, `m`, `h` and `d`.
pub fn parse_cache_duration(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Some(0);
    }
    if let Ok(seconds) = value.parse::<i64>() {
        return (seconds >= 0).then_some(seconds);
    }

    let mut total: i64 = 0;
    let mut digits = String::new();
    for ch in value.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let scale = match ch {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            _ => return None,
        };
        let amount: i64 = digits.parse().ok()?;
        digits.clear();
        total = total.checked_add(amount.checked_mul(scale)?)?;
    }

    // Trailing digits without a unit
    digits.is_empty().then_some(total)
}
