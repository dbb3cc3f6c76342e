//! SQL dialects.
//!
//! A `Dialect` is the strategy a `DatabaseDriver` is built with: it knows how one
//! engine spells its catalog queries, DDL, literals and type names. Drivers hold a
//! dialect behind an `Arc<dyn Dialect>` chosen from the configured `DriverKind`.

mod firebird;
mod sqlite;

pub use firebird::Firebird;
pub use sqlite::Sqlite;

use crate::db::prefix;
use crate::db::query::QueryFeatures;
use crate::db::types::{TypeCategory, categorize_type};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnMetadata, ConnectionConfig, DriverKind, Row};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Engine-specific SQL knowledge.
pub trait Dialect: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> DriverKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Character used to quote identifiers.
    fn name_quote(&self) -> char {
        '"'
    }

    /// Sentinel written for empty date values.
    fn null_date(&self) -> &'static str;

    /// Oldest server version the dialect's SQL is written for.
    fn min_version(&self) -> &'static str;

    /// Target string handed to the native client.
    fn connection_target(&self, config: &ConnectionConfig) -> String;

    /// Classify a normalized type name for literal serialization.
    fn type_category(&self, type_name: &str) -> TypeCategory {
        categorize_type(type_name)
    }

    fn escape(&self, text: &str) -> String {
        prefix::escape(text)
    }

    fn quote(&self, text: &str) -> String {
        prefix::quote(text)
    }

    fn quote_name(&self, name: &str) -> String {
        prefix::quote_name(name, self.name_quote())
    }

    /// Capabilities of this dialect's query object.
    fn query_features(&self) -> DbResult<QueryFeatures> {
        Err(DbError::unsupported_operation("query builder", self.name()))
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// User tables only: no system relations, no views. One `name` column.
    fn table_list_sql(&self) -> String;

    /// Column catalog query for an already prefix-resolved table name.
    fn table_columns_sql(&self, table: &str) -> String;

    /// Map one row of `table_columns_sql` into column metadata.
    fn column_from_row(&self, row: &Row) -> DbResult<ColumnMetadata>;

    /// Primary-key columns in key order. One `field_name` column.
    fn table_keys_sql(&self, table: &str) -> String;

    /// Single row, single `version` column.
    fn version_sql(&self) -> String;

    /// Single row holding the 1-based position of `substring` in `string`.
    fn string_position_sql(&self, substring: &str, string: &str) -> String;

    /// Single row holding a random number in `[0, 1)`.
    fn random_sql(&self) -> String;

    fn table_create_sql(&self, _table: &str) -> DbResult<String> {
        Err(DbError::unsupported_operation("table create statement", self.name()))
    }

    fn rename_table_sql(&self, _old_table: &str, _new_table: &str) -> DbResult<String> {
        Err(DbError::unsupported_operation("table rename", self.name()))
    }

    fn table_sequences_sql(&self, _table: &str) -> DbResult<String> {
        Err(DbError::unsupported_operation("table sequences", self.name()))
    }

    // -------------------------------------------------------------------------
    // DDL and transaction statements
    // -------------------------------------------------------------------------

    fn drop_table_sql(&self, table: &str, if_exists: bool) -> String {
        if if_exists {
            format!("DROP TABLE IF EXISTS {}", self.quote_name(table))
        } else {
            format!("DROP TABLE {}", self.quote_name(table))
        }
    }

    fn create_database_sql(&self, name: &str) -> DbResult<String> {
        Ok(format!("CREATE DATABASE {}", self.quote_name(name)))
    }

    fn alter_db_character_set_sql(&self, database: &str) -> String;

    fn savepoint_sql(&self, name: &str) -> String {
        format!("SAVEPOINT {}", self.quote_name(name))
    }

    fn release_savepoint_sql(&self, name: &str) -> String {
        format!("RELEASE SAVEPOINT {}", self.quote_name(name))
    }

    fn rollback_to_savepoint_sql(&self, name: &str) -> String {
        format!("ROLLBACK TO SAVEPOINT {}", self.quote_name(name))
    }
}

/// Dialect for a driver kind.
pub fn for_kind(kind: DriverKind) -> Arc<dyn Dialect> {
    match kind {
        DriverKind::Firebird => Arc::new(Firebird),
        DriverKind::Sqlite => Arc::new(Sqlite),
    }
}

// =============================================================================
// Row helpers shared by the catalog mappers
// =============================================================================

/// Text value of a column, trimmed. Catalog CHAR columns come back space padded.
pub(crate) fn row_text(row: &Row, key: &str) -> Option<String> {
    match row.get(key)? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn row_int(row: &Row, key: &str) -> Option<i64> {
    match row.get(key)? {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        JsonValue::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub(crate) fn required_text(row: &Row, key: &str) -> DbResult<String> {
    row_text(row, key)
        .ok_or_else(|| DbError::internal(format!("Catalog row is missing column '{}'", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_for_kind() {
        assert_eq!(for_kind(DriverKind::Firebird).name(), "firebird");
        assert_eq!(for_kind(DriverKind::Sqlite).name(), "sqlite");
    }

    #[test]
    fn test_savepoint_statements() {
        let dialect = for_kind(DriverKind::Firebird);
        assert_eq!(dialect.savepoint_sql("a"), "SAVEPOINT \"a\"");
        assert_eq!(dialect.release_savepoint_sql("a"), "RELEASE SAVEPOINT \"a\"");
        assert_eq!(dialect.rollback_to_savepoint_sql("a"), "ROLLBACK TO SAVEPOINT \"a\"");
    }

    #[test]
    fn test_row_helpers() {
        let row: Row = json!({"name": "USERS   ", "flag": 1, "code": "16", "none": null})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(row_text(&row, "name"), Some("USERS".to_string()));
        assert_eq!(row_int(&row, "flag"), Some(1));
        assert_eq!(row_int(&row, "code"), Some(16));
        assert_eq!(row_text(&row, "none"), None);
        assert!(required_text(&row, "missing").is_err());
    }
}
