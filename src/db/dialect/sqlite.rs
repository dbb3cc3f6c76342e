//! SQLite dialect.

use super::{Dialect, required_text, row_int, row_text};
use crate::db::query::QueryFeatures;
use crate::error::{DbError, DbResult};
use crate::models::{ColumnMetadata, ConnectionConfig, DriverKind, Row};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn kind(&self) -> DriverKind {
        DriverKind::Sqlite
    }

    fn null_date(&self) -> &'static str {
        "0000-00-00 00:00:00"
    }

    // RETURNING arrived in 3.35.
    fn min_version(&self) -> &'static str {
        "3.35.0"
    }

    fn connection_target(&self, config: &ConnectionConfig) -> String {
        config.database.clone()
    }

    fn query_features(&self) -> DbResult<QueryFeatures> {
        Ok(QueryFeatures {
            name_quote: self.name_quote(),
            returning: true,
        })
    }

    fn table_list_sql(&self) -> String {
        "SELECT name AS \"name\" FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
         ORDER BY name"
            .to_string()
    }

    fn table_columns_sql(&self, table: &str) -> String {
        format!(
            "SELECT name AS \"column_name\", type AS \"type\", \"notnull\" AS \"notnull\", \
             dflt_value AS \"default\" \
             FROM pragma_table_info({}) ORDER BY cid",
            self.quote(table)
        )
    }

    fn column_from_row(&self, row: &Row) -> DbResult<ColumnMetadata> {
        let name = required_text(row, "column_name")?;
        let type_name = row_text(row, "type").unwrap_or_default().to_uppercase();
        let nullable = row_int(row, "notnull").unwrap_or_default() == 0;

        let mut column = ColumnMetadata::new(name, type_name, nullable);
        if let Some(default) = row_text(row, "default") {
            column = column.with_default(default);
        }
        Ok(column)
    }

    fn table_keys_sql(&self, table: &str) -> String {
        format!(
            "SELECT name AS \"field_name\" FROM pragma_table_info({}) WHERE pk > 0 ORDER BY pk",
            self.quote(table)
        )
    }

    fn version_sql(&self) -> String {
        "SELECT sqlite_version() AS \"version\"".to_string()
    }

    // instr() takes the haystack first.
    fn string_position_sql(&self, substring: &str, string: &str) -> String {
        format!(
            "SELECT instr({}, {}) AS \"position\"",
            self.quote(string),
            self.quote(substring)
        )
    }

    fn random_sql(&self) -> String {
        "SELECT (abs(random()) % 1000000) / 1000000.0 AS \"random\"".to_string()
    }

    fn table_create_sql(&self, table: &str) -> DbResult<String> {
        Ok(format!(
            "SELECT sql AS \"sql\" FROM sqlite_master WHERE type = 'table' AND name = {}",
            self.quote(table)
        ))
    }

    fn rename_table_sql(&self, old_table: &str, new_table: &str) -> DbResult<String> {
        Ok(format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_name(old_table),
            self.quote_name(new_table)
        ))
    }

    /// A database is a file; it is created by connecting, not by a statement.
    fn create_database_sql(&self, _name: &str) -> DbResult<String> {
        Err(DbError::unsupported_operation("create database", self.name()))
    }

    fn alter_db_character_set_sql(&self, _database: &str) -> String {
        "PRAGMA encoding = 'UTF-8'".to_string()
    }
}
