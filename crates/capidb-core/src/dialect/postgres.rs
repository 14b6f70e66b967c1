//! PostgreSQL agent

use std::borrow::Cow;
use std::num::NonZeroUsize;

use super::placeholder::dollar_placeholder;
use super::{index_name, unique_name, SqlAgent, SqlDialect};
use crate::schema::ID_COLUMN;
use crate::types::SemanticType;

/// Internal key/value table holding one metadata document per service.
pub const META_TABLE_NAME: &str = "__capidb_meta__";

/// SQL agent for PostgreSQL
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresAgent;

impl PostgresAgent {
    fn placeholders(&self, count: usize) -> impl Iterator<Item = Cow<'static, str>> + '_ {
        (1..=count)
            .filter_map(NonZeroUsize::new)
            .map(|p| self.placeholder(p))
    }
}

impl SqlAgent for PostgresAgent {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSQL
    }

    fn placeholder(&self, position: NonZeroUsize) -> Cow<'static, str> {
        dollar_placeholder(position)
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn like_operand(&self, placeholder: &str) -> String {
        format!("'%' || {} || '%'", placeholder)
    }

    fn column_type(&self, semantic_type: SemanticType) -> (&'static str, &'static str) {
        match semantic_type {
            SemanticType::PrimaryKey | SemanticType::LinkedKey | SemanticType::String64 => {
                ("varchar(64)", "''")
            }
            SemanticType::Bool => ("boolean", "false"),
            SemanticType::Int64 => ("bigint", "0"),
            SemanticType::Float64 => ("double precision", "0"),
            SemanticType::Bytes => ("bytea", "''"),
            SemanticType::String16 => ("varchar(16)", "''"),
            SemanticType::String32 => ("varchar(32)", "''"),
            SemanticType::String256 => ("varchar(256)", "''"),
            SemanticType::String => ("text", "''"),
            SemanticType::StringList | SemanticType::LinkedKeyList => ("text", "'[]'"),
            SemanticType::StringMap | SemanticType::LinkedKeyMap => ("text", "'{}'"),
        }
    }

    fn data_source(
        &self,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        db_name: Option<&str>,
    ) -> String {
        match db_name.filter(|n| !n.is_empty()) {
            Some(db_name) => format!(
                "host={} port={} user={} password={} dbname={} sslmode=disable",
                host, port, user, password, db_name
            ),
            None => format!(
                "host={} port={} user={} password={} sslmode=disable",
                host, port, user, password
            ),
        }
    }

    fn has_database(&self, db_name: &str) -> String {
        format!(
            "SELECT 1 FROM pg_database WHERE datname = {};",
            self.quote_literal(db_name)
        )
    }

    fn create_database(&self, db_name: &str) -> String {
        format!("CREATE DATABASE {};", self.quote_identifier(db_name))
    }

    fn drop_database(&self, db_name: &str) -> String {
        format!("DROP DATABASE {};", self.quote_identifier(db_name))
    }

    fn create_meta_table(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\"id\" text NOT NULL PRIMARY KEY, \"meta\" text);",
            self.quote_identifier(META_TABLE_NAME)
        )
    }

    fn query_meta_table(&self) -> String {
        format!(
            "SELECT \"meta\" FROM {} WHERE \"id\" = $1;",
            self.quote_identifier(META_TABLE_NAME)
        )
    }

    fn insert_meta_table(&self, id: &str, meta: &str) -> String {
        format!(
            "INSERT INTO {} (\"id\", \"meta\") VALUES ({}, {});",
            self.quote_identifier(META_TABLE_NAME),
            self.quote_literal(id),
            self.quote_literal(meta)
        )
    }

    fn update_meta_table(&self, id: &str, meta: &str) -> String {
        format!(
            "UPDATE {} SET \"meta\" = {} WHERE \"id\" = {};",
            self.quote_identifier(META_TABLE_NAME),
            self.quote_literal(meta),
            self.quote_literal(id)
        )
    }

    fn create_service_table(&self, table: &str) -> String {
        let (id_type, _) = self.column_type(SemanticType::PrimaryKey);
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({} {} NOT NULL PRIMARY KEY);",
            self.quote_identifier(table),
            self.quote_identifier(ID_COLUMN),
            id_type
        )
    }

    fn add_column(&self, table: &str, column: &str, semantic_type: SemanticType) -> String {
        let (column_type, default) = self.column_type(semantic_type);
        format!(
            "ALTER TABLE {} ADD COLUMN {} {} NOT NULL DEFAULT {};",
            self.quote_identifier(table),
            self.quote_identifier(column),
            column_type,
            default
        )
    }

    fn drop_column(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {};",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }

    fn create_index(&self, table: &str, column: &str) -> String {
        format!(
            "CREATE INDEX {} ON {} ({});",
            self.quote_identifier(&index_name(table, column)),
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }

    fn drop_index(&self, table: &str, column: &str) -> String {
        format!(
            "DROP INDEX {};",
            self.quote_identifier(&index_name(table, column))
        )
    }

    fn create_unique(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({});",
            self.quote_identifier(table),
            self.quote_identifier(&unique_name(table, column)),
            self.quote_identifier(column)
        )
    }

    fn drop_unique(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {};",
            self.quote_identifier(table),
            self.quote_identifier(&unique_name(table, column))
        )
    }

    fn insert(&self, table: &str, columns: &[&str]) -> String {
        if columns.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES;", self.quote_identifier(table));
        }

        let values: Vec<Cow<'static, str>> = self.placeholders(columns.len()).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({});",
            self.quote_identifier(table),
            self.compile_select_columns(columns),
            values.join(",")
        )
    }

    fn update(&self, table: &str, columns: &[&str]) -> String {
        let mut sets: Vec<String> = columns
            .iter()
            .zip(self.placeholders(columns.len()))
            .map(|(column, p)| format!("{} = {}", self.quote_identifier(column), p))
            .collect();

        // Without columns the statement still matches by id and changes nothing.
        if sets.is_empty() {
            let id = self.quote_identifier(ID_COLUMN);
            sets.push(format!("{} = {}", id, id));
        }

        let id_position = NonZeroUsize::MIN.saturating_add(columns.len());
        format!(
            "UPDATE {} SET {} WHERE {} = {};",
            self.quote_identifier(table),
            sets.join(","),
            self.quote_identifier(ID_COLUMN),
            self.placeholder(id_position)
        )
    }

    fn delete(&self, table: &str) -> String {
        format!(
            "DELETE FROM {} WHERE {} = {};",
            self.quote_identifier(table),
            self.quote_identifier(ID_COLUMN),
            self.placeholder(NonZeroUsize::MIN)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_data_source() {
        let agent = PostgresAgent;
        assert_eq!(
            agent.data_source("localhost", 5432, "admin", "secret", None),
            "host=localhost port=5432 user=admin password=secret sslmode=disable"
        );
        assert_eq!(
            agent.data_source("localhost", 5432, "admin", "secret", Some("shop")),
            "host=localhost port=5432 user=admin password=secret dbname=shop sslmode=disable"
        );
        assert_eq!(
            agent.data_source("db", 1, "u", "p", Some("")),
            "host=db port=1 user=u password=p sslmode=disable"
        );
    }

    #[test]
    fn test_meta_table() {
        let agent = PostgresAgent;
        assert_eq!(
            agent.create_meta_table(),
            "CREATE TABLE IF NOT EXISTS \"__capidb_meta__\" (\"id\" text NOT NULL PRIMARY KEY, \"meta\" text);"
        );
        assert_eq!(
            agent.query_meta_table(),
            "SELECT \"meta\" FROM \"__capidb_meta__\" WHERE \"id\" = $1;"
        );
        assert_eq!(
            agent.insert_meta_table("shop", "{\"a\":\"it's\"}"),
            "INSERT INTO \"__capidb_meta__\" (\"id\", \"meta\") VALUES ('shop', '{\"a\":\"it''s\"}');"
        );
        assert_eq!(
            agent.update_meta_table("shop", "{}"),
            "UPDATE \"__capidb_meta__\" SET \"meta\" = '{}' WHERE \"id\" = 'shop';"
        );
    }

    #[test]
    fn test_service_table_and_columns() {
        let agent = PostgresAgent;
        assert_eq!(
            agent.create_service_table("users"),
            "CREATE TABLE IF NOT EXISTS \"users\" (\"id\" varchar(64) NOT NULL PRIMARY KEY);"
        );
        assert_eq!(
            agent.add_column("users", "tags", SemanticType::StringList),
            "ALTER TABLE \"users\" ADD COLUMN \"tags\" text NOT NULL DEFAULT '[]';"
        );
        assert_eq!(
            agent.add_column("users", "active", SemanticType::Bool),
            "ALTER TABLE \"users\" ADD COLUMN \"active\" boolean NOT NULL DEFAULT false;"
        );
        assert_eq!(
            agent.drop_column("users", "tags"),
            "ALTER TABLE \"users\" DROP COLUMN \"tags\";"
        );
    }

    #[test]
    fn test_index_and_unique() {
        let agent = PostgresAgent;
        assert_eq!(
            agent.create_index("users", "age"),
            "CREATE INDEX \"users__index__age\" ON \"users\" (\"age\");"
        );
        assert_eq!(agent.drop_index("users", "age"), "DROP INDEX \"users__index__age\";");
        assert_eq!(
            agent.create_unique("users", "email"),
            "ALTER TABLE \"users\" ADD CONSTRAINT \"users__unique__email\" UNIQUE (\"email\");"
        );
        assert_eq!(
            agent.drop_unique("users", "email"),
            "ALTER TABLE \"users\" DROP CONSTRAINT \"users__unique__email\";"
        );
    }

    #[test]
    fn test_dml_templates() {
        let agent = PostgresAgent;
        assert_eq!(
            agent.insert("users", &["id", "name", "age"]),
            "INSERT INTO \"users\" (\"id\",\"name\",\"age\") VALUES ($1,$2,$3);"
        );
        assert_eq!(
            agent.insert("users", &[]),
            "INSERT INTO \"users\" DEFAULT VALUES;"
        );
        assert_eq!(
            agent.update("users", &["name", "age"]),
            "UPDATE \"users\" SET \"name\" = $1,\"age\" = $2 WHERE \"id\" = $3;"
        );
        assert_eq!(
            agent.update("users", &[]),
            "UPDATE \"users\" SET \"id\" = \"id\" WHERE \"id\" = $1;"
        );
        assert_eq!(agent.delete("users"), "DELETE FROM \"users\" WHERE \"id\" = $1;");
    }

    #[test]
    fn test_quoting() {
        let agent = PostgresAgent;
        assert_eq!(agent.quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(agent.quote_literal("o'clock"), "'o''clock'");
    }
}
