//! Firebird dialect.

use super::{Dialect, required_text, row_int, row_text};
use crate::db::query::QueryFeatures;
use crate::db::types::TypeCategory;
use crate::error::DbResult;
use crate::models::{ColumnMetadata, ConnectionConfig, DriverKind, Row, base_type_name};

/// Firebird 2.5+ dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Firebird;

/// `RDB$FIELDS.RDB$FIELD_TYPE` codes to type names.
pub(crate) fn type_name_for_code(code: i64) -> Option<&'static str> {
    let name = match code {
        7 => "SMALLINT",
        8 => "INTEGER",
        10 => "FLOAT",
        12 => "DATE",
        13 => "TIME",
        14 => "CHAR",
        16 => "BIGINT",
        23 => "BOOLEAN",
        27 => "DOUBLE PRECISION",
        35 => "TIMESTAMP",
        37 => "VARCHAR",
        261 => "BLOB",
        _ => return None,
    };
    Some(name)
}

const TABLE_LIST: &str = r#"select rdb$relation_name as "name"
        from rdb$relations
        where rdb$view_blr is null
        and (rdb$system_flag is null or rdb$system_flag = 0)
        order by 1"#;

const TABLE_COLUMNS: &str = r#"select f.rdb$description as "description",
        f.rdb$null_flag as "null",
        f.rdb$default_source as "default",
        f.rdb$field_name as "column_name",
        field.rdb$field_type as "typeindex",
        field.rdb$field_length as "field_length",
        field.rdb$field_precision as "field_precision",
        field.rdb$field_scale as "field_scale"
        from rdb$relation_fields f
        join rdb$fields field on field.rdb$field_name = f.rdb$field_source
        join rdb$relations r on f.rdb$relation_name = r.rdb$relation_name
        and r.rdb$view_blr is null
        and (r.rdb$system_flag is null or r.rdb$system_flag = 0)
        where f.rdb$relation_name = {table}
        order by f.rdb$field_position"#;

const TABLE_KEYS: &str = r#"select sg.rdb$field_name as "field_name"
        from rdb$indices ix
        left join rdb$index_segments sg on ix.rdb$index_name = sg.rdb$index_name
        left join rdb$relation_constraints rc on rc.rdb$index_name = ix.rdb$index_name
        where rc.rdb$relation_name = {table}
        and rc.rdb$constraint_type = 'PRIMARY KEY'
        order by sg.rdb$field_position"#;

impl Dialect for Firebird {
    fn kind(&self) -> DriverKind {
        DriverKind::Firebird
    }

    fn null_date(&self) -> &'static str {
        "1970-01-01 00:00:00"
    }

    fn min_version(&self) -> &'static str {
        "2.5"
    }

    /// `host[/port]:database`
    fn connection_target(&self, config: &ConnectionConfig) -> String {
        match config.port {
            Some(port) => format!("{}/{}:{}", config.host, port, config.database),
            None => format!("{}:{}", config.host, config.database),
        }
    }

    fn type_category(&self, type_name: &str) -> TypeCategory {
        match base_type_name(type_name).as_str() {
            "boolean" => TypeCategory::Boolean,
            "smallint" | "integer" | "bigint" | "serial" | "bigserial" => TypeCategory::Integer,
            "real" | "float" | "double precision" => TypeCategory::Float,
            "numeric" | "decimal" | "money" => TypeCategory::Decimal,
            "date" | "timestamp" | "timestamp without time zone" => TypeCategory::Date,
            "blob" => TypeCategory::Binary,
            "char" | "varchar" => TypeCategory::Text,
            _ => TypeCategory::Unknown,
        }
    }

    fn query_features(&self) -> DbResult<QueryFeatures> {
        Ok(QueryFeatures {
            name_quote: self.name_quote(),
            returning: true,
        })
    }

    fn table_list_sql(&self) -> String {
        TABLE_LIST.to_string()
    }

    fn table_columns_sql(&self, table: &str) -> String {
        TABLE_COLUMNS.replace("{table}", &self.quote(table))
    }

    fn column_from_row(&self, row: &Row) -> DbResult<ColumnMetadata> {
        let name = required_text(row, "column_name")?;
        let code = row_int(row, "typeindex").unwrap_or_default();
        let scale = row_int(row, "field_scale").unwrap_or_default();
        let base = type_name_for_code(code).unwrap_or("UNKNOWN");

        // Exact numerics are stored as integer types with a negative scale.
        let type_name = if scale < 0 && matches!(code, 7 | 8 | 16) {
            let precision = row_int(row, "field_precision").unwrap_or_default();
            format!("NUMERIC({},{})", precision, -scale)
        } else if matches!(code, 14 | 37) {
            match row_int(row, "field_length") {
                Some(length) => format!("{}({})", base, length),
                None => base.to_string(),
            }
        } else {
            base.to_string()
        };

        let nullable = row_int(row, "null").unwrap_or_default() == 0;
        let mut column = ColumnMetadata::new(name, type_name, nullable);
        if let Some(default) = row_text(row, "default") {
            let default = match default.get(..8) {
                Some(head) if head.eq_ignore_ascii_case("default ") => default[8..].trim().to_string(),
                _ => default,
            };
            column = column.with_default(default);
        }
        if let Some(comment) = row_text(row, "description") {
            column = column.with_comment(comment);
        }
        Ok(column)
    }

    fn table_keys_sql(&self, table: &str) -> String {
        TABLE_KEYS.replace("{table}", &self.quote(table))
    }

    fn version_sql(&self) -> String {
        r#"SELECT rdb$get_context('SYSTEM', 'ENGINE_VERSION') as "version" from rdb$database"#
            .to_string()
    }

    fn string_position_sql(&self, substring: &str, string: &str) -> String {
        format!(
            r#"select position({}, {}) as "position" from rdb$database"#,
            self.quote(substring),
            self.quote(string)
        )
    }

    fn random_sql(&self) -> String {
        r#"select rand() as "random" from rdb$database"#.to_string()
    }

    /// Firebird has no `IF EXISTS` for tables.
    fn drop_table_sql(&self, table: &str, _if_exists: bool) -> String {
        format!("DROP TABLE {}", self.quote_name(table))
    }

    fn alter_db_character_set_sql(&self, _database: &str) -> String {
        "SET NAMES UTF8".to_string()
    }
}
