//! Object persistence helpers.
//!
//! Any struct that serializes to a JSON object can be written as a row. Fields are
//! taken in declaration order; nested values (arrays, maps) and fields whose name
//! starts with `_` are never written. Values are rendered with the table's column
//! types so numbers, booleans and dates get the literal form the dialect expects.

use crate::db::driver::DatabaseDriver;
use crate::db::types::sql_value;
use crate::error::{DbError, DbResult};
use crate::models::ColumnTypes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

/// Field-name prefix marking values that are never persisted.
pub const INTERNAL_FIELD_PREFIX: char = '_';

fn is_internal(field: &str) -> bool {
    field.starts_with(INTERNAL_FIELD_PREFIX)
}

fn is_scalar(value: &JsonValue) -> bool {
    !matches!(value, JsonValue::Array(_) | JsonValue::Object(_))
}

/// Numeric zero or the string `"0"`: an unassigned generated key.
fn is_zero_key(value: &JsonValue) -> bool {
    match value {
        JsonValue::Number(n) => n.as_f64() == Some(0.0),
        JsonValue::String(s) => s == "0",
        _ => false,
    }
}

fn object_fields<T: Serialize>(object: &T) -> DbResult<Map<String, JsonValue>> {
    match serde_json::to_value(object)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(DbError::invalid_input(format!(
            "Expected an object with named fields, got {}",
            other
        ))),
    }
}

impl DatabaseDriver {
    /// Insert `object` as a new row of `table`.
    ///
    /// Null fields are left to the column default. When `key` is given the key
    /// field is skipped while it is zero, the insert asks for the generated key
    /// with RETURNING, and the returned value is written back onto `object`.
    /// Returns false when a key was requested but none came back.
    pub async fn insert_object<T>(&mut self, table: &str, object: &mut T, key: Option<&str>) -> DbResult<bool>
    where
        T: Serialize + DeserializeOwned,
    {
        let columns = self.table_column_types(table).await?;
        let mut fields = object_fields(object)?;

        let mut names = Vec::new();
        let mut values = Vec::new();
        for (name, value) in &fields {
            if value.is_null() || !is_scalar(value) || is_internal(name) {
                continue;
            }
            if key == Some(name.as_str()) && is_zero_key(value) {
                continue;
            }
            names.push(self.quote_name(name));
            values.push(sql_value(self.dialect(), &columns, name, value));
        }

        let table_name = self.quote_name(table);
        let query = self.new_query()?;
        query.insert(table_name);
        if !names.is_empty() {
            query.columns(names).values(values.join(","));
        }
        if let Some(key) = key {
            query.returning(key);
        }
        let sql = query.to_string();
        self.set_query(sql);

        let Some(key) = key else {
            let cursor = self.execute().await?;
            self.free_result(Some(cursor))?;
            return Ok(true);
        };

        match self.load_result().await? {
            Some(id) if !id.is_null() => {
                debug!(table = %table, key = %key, id = %id, "Inserted object");
                fields.insert(key.to_string(), id);
                *object = serde_json::from_value(JsonValue::Object(fields))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Update the row of `table` identified by the `keys` fields of `object`.
    ///
    /// Key fields go to the WHERE clause with their current values; every other
    /// scalar field goes to SET. Null fields are written as `NULL` only when
    /// `include_nulls` is set. Nothing to set is a successful no-op.
    pub async fn update_object<T: Serialize>(
        &mut self,
        table: &str,
        object: &T,
        keys: &[&str],
        include_nulls: bool,
    ) -> DbResult<bool> {
        if keys.is_empty() {
            return Err(DbError::invalid_input("update_object needs at least one key field"));
        }

        let columns = self.table_column_types(table).await?;
        let fields = object_fields(object)?;
        let (assignments, conditions) = self.update_clauses(&columns, &fields, keys, include_nulls);

        if assignments.is_empty() {
            debug!(table = %table, "Nothing to update");
            return Ok(true);
        }
        if conditions.is_empty() {
            return Err(DbError::invalid_input(format!(
                "None of the key fields {:?} is present on the object",
                keys
            )));
        }

        let table_name = self.quote_name(table);
        let query = self.new_query()?;
        query.update(table_name);
        for assignment in assignments {
            query.set(assignment);
        }
        for condition in conditions {
            query.and_where(condition);
        }
        let sql = query.to_string();
        self.run(sql).await?;
        Ok(true)
    }

    fn update_clauses(
        &self,
        columns: &ColumnTypes,
        fields: &Map<String, JsonValue>,
        keys: &[&str],
        include_nulls: bool,
    ) -> (Vec<String>, Vec<String>) {
        let mut assignments = Vec::new();
        let mut conditions = Vec::new();

        for (name, value) in fields {
            if !is_scalar(value) || is_internal(name) {
                continue;
            }
            let quoted = self.quote_name(name);
            if keys.contains(&name.as_str()) {
                conditions.push(format!("{}={}", quoted, sql_value(self.dialect(), columns, name, value)));
                continue;
            }
            let literal = if value.is_null() {
                if !include_nulls {
                    continue;
                }
                "NULL".to_string()
            } else {
                sql_value(self.dialect(), columns, name, value)
            };
            assignments.push(format!("{}={}", quoted, literal));
        }

        (assignments, conditions)
    }
}
