//! Semantic column types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Prefix marking a declaration type as a reference to another table.
pub const LINK_PREFIX: &str = "DB.";

/// The fixed set of column value kinds a table declaration may use.
///
/// The three linked-key variants reference another table's primary key;
/// the referenced table lives on the column, not on the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticType {
    PrimaryKey,
    Bool,
    Int64,
    Float64,
    Bytes,
    String16,
    String32,
    String64,
    String256,
    String,
    StringList,
    StringMap,
    LinkedKey,
    LinkedKeyList,
    LinkedKeyMap,
}

impl SemanticType {
    pub const ALL: [SemanticType; 15] = [
        SemanticType::PrimaryKey,
        SemanticType::Bool,
        SemanticType::Int64,
        SemanticType::Float64,
        SemanticType::Bytes,
        SemanticType::String16,
        SemanticType::String32,
        SemanticType::String64,
        SemanticType::String256,
        SemanticType::String,
        SemanticType::StringList,
        SemanticType::StringMap,
        SemanticType::LinkedKey,
        SemanticType::LinkedKeyList,
        SemanticType::LinkedKeyMap,
    ];

    /// Short tag used in stored metadata and by `SqlAgent::add_column_by_name`
    pub fn tag(&self) -> &'static str {
        match self {
            SemanticType::PrimaryKey => "PK",
            SemanticType::Bool => "Bool",
            SemanticType::Int64 => "Int64",
            SemanticType::Float64 => "Float64",
            SemanticType::Bytes => "Bytes",
            SemanticType::String16 => "String16",
            SemanticType::String32 => "String32",
            SemanticType::String64 => "String64",
            SemanticType::String256 => "String256",
            SemanticType::String => "String",
            SemanticType::StringList => "List<String>",
            SemanticType::StringMap => "Map<String>",
            SemanticType::LinkedKey => "LK",
            SemanticType::LinkedKeyList => "LKList",
            SemanticType::LinkedKeyMap => "LKMap",
        }
    }

    pub fn is_linked(&self) -> bool {
        matches!(
            self,
            SemanticType::LinkedKey | SemanticType::LinkedKeyList | SemanticType::LinkedKeyMap
        )
    }

    /// Parse a declaration type string.
    ///
    /// Returns the semantic type together with the linked table name for the
    /// linked-key variants (`DB.users`, `List<DB.users>`, `Map<DB.users>`).
    /// `None` means the string is not a valid type.
    pub fn parse_declaration(s: &str) -> Option<(SemanticType, Option<String>)> {
        if let Ok(ty) = s.parse::<SemanticType>() {
            // Link tags only make sense with a target table.
            return (!ty.is_linked()).then_some((ty, None));
        }

        if s.starts_with(LINK_PREFIX) {
            return link_target(s).map(|t| (SemanticType::LinkedKey, Some(t)));
        }
        if let Some(inner) = s.strip_prefix("List<").and_then(|r| r.strip_suffix('>')) {
            return link_target(inner).map(|t| (SemanticType::LinkedKeyList, Some(t)));
        }
        if let Some(inner) = s.strip_prefix("Map<").and_then(|r| r.strip_suffix('>')) {
            return link_target(inner).map(|t| (SemanticType::LinkedKeyMap, Some(t)));
        }
        None
    }
}

impl FromStr for SemanticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SemanticType::ALL
            .iter()
            .find(|ty| ty.tag() == s)
            .copied()
            .ok_or_else(|| format!("unknown semantic type: '{}'", s))
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

fn link_target(s: &str) -> Option<String> {
    let namespace = s.strip_prefix(LINK_PREFIX)?;
    if namespace.is_empty() || namespace.split('.').any(str::is_empty) {
        return None;
    }
    Some(namespace_to_table_name(s))
}

/// Convert a declaration namespace such as `DB.shop.orders` into the
/// physical table name `shop_orders`.
pub fn namespace_to_table_name(namespace: &str) -> String {
    namespace
        .strip_prefix(LINK_PREFIX)
        .unwrap_or(namespace)
        .replace('.', "_")
}
