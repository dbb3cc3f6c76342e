//! Type categories, value decoding and SQL literal serialization.
//!
//! # Architecture
//!
//! Type handling uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories. Each dialect
//!    owns its classification table (see `Dialect::type_category`).
//! 2. Category-specific code does the actual work: decoding native values into
//!    JSON on the way out, and rendering SQL literals on the way in.

use crate::db::dialect::Dialect;
use crate::models::ColumnTypes;
use serde_json::Value as JsonValue;

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    Text,
    Binary,
    Unknown,
}

impl TypeCategory {
    /// Whether values of this category are written as bare numerals.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Decimal)
    }
}

/// Classify a type name into a logical category using generic SQL naming rules.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") || lower == "money" {
        return TypeCategory::Decimal;
    }

    if lower.contains("int") || lower.contains("serial") {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "date" || lower.starts_with("timestamp") || lower == "datetime" {
        return TypeCategory::Date;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    if lower.contains("char") || lower.contains("text") || lower.contains("clob") {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Encode binary column data as a JSON value.
///
/// Valid UTF-8 is returned as text, anything else as base64.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

// =============================================================================
// Value Serialization
// =============================================================================

/// Render an application value as a SQL literal for `field_name`.
///
/// The literal policy depends on the column's category as classified by the dialect:
/// - boolean: `'t'`/`true` become `TRUE`, `'f'`/`false` become `FALSE`, anything else `NULL`
/// - numeric: empty becomes `NULL`, otherwise the bare numeral
/// - date/timestamp: empty becomes the dialect's null date, then quoted
/// - everything else: quoted string
///
/// A JSON `null` is always `NULL`.
pub fn sql_value(
    dialect: &dyn Dialect,
    columns: &ColumnTypes,
    field_name: &str,
    value: &JsonValue,
) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }

    let category = columns
        .get(field_name)
        .map(|t| dialect.type_category(t))
        .unwrap_or(TypeCategory::Unknown);

    match category {
        TypeCategory::Boolean => match value {
            JsonValue::Bool(true) => "TRUE".to_string(),
            JsonValue::Bool(false) => "FALSE".to_string(),
            JsonValue::String(s) if s == "t" => "TRUE".to_string(),
            JsonValue::String(s) if s == "f" => "FALSE".to_string(),
            _ => "NULL".to_string(),
        },
        c if c.is_numeric() => {
            let raw = raw_text(value);
            if raw.is_empty() {
                "NULL".to_string()
            } else if is_numeral(&raw) {
                raw
            } else {
                dialect.quote(&raw)
            }
        }
        TypeCategory::Date => {
            let raw = raw_text(value);
            if raw.is_empty() {
                dialect.quote(dialect.null_date())
            } else {
                dialect.quote(&raw)
            }
        }
        _ => dialect.quote(&raw_text(value)),
    }
}

/// Scalar JSON value as the text the database should see.
pub fn raw_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::Bool(true) => "1".to_string(),
        JsonValue::Bool(false) => "0".to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_numeral(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(|v| v.is_finite())
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

pub(crate) mod sqlite {
    use super::*;
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Row, TypeInfo, ValueRef};

    /// Decode every column of a row, using the storage class of each value.
    pub fn decode_row(row: &SqliteRow) -> Vec<JsonValue> {
        (0..row.len()).map(|idx| decode_column(row, idx)).collect()
    }

    fn decode_column(row: &SqliteRow, idx: usize) -> JsonValue {
        let category = match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => return JsonValue::Null,
            Ok(raw) => categorize_type(raw.type_info().name()),
            Err(_) => return JsonValue::Null,
        };

        match category {
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float | TypeCategory::Decimal => decode_float(row, idx),
            TypeCategory::Binary => decode_binary_col(row, idx),
            _ => decode_text(row, idx),
        }
    }

    fn decode_integer(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<i64>, _>(idx)
            .ok()
            .flatten()
            .map(|v| JsonValue::Number(v.into()))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_boolean(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<bool>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::Bool)
            .unwrap_or(JsonValue::Null)
    }

    fn decode_float(row: &SqliteRow, idx: usize) -> JsonValue {
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
            return serde_json::Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string()));
        }
        JsonValue::Null
    }

    fn decode_binary_col(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<Vec<u8>>, _>(idx)
            .ok()
            .flatten()
            .map(|v| decode_binary_value(&v))
            .unwrap_or(JsonValue::Null)
    }

    fn decode_text(row: &SqliteRow, idx: usize) -> JsonValue {
        row.try_get::<Option<String>, _>(idx)
            .ok()
            .flatten()
            .map(JsonValue::String)
            .unwrap_or(JsonValue::Null)
    }
}
