//! Schema introspection.
//!
//! Catalog queries come from the driver's dialect; this module runs them and maps
//! the rows. Table names given by the caller may carry the `#__` token and are
//! resolved to the physical prefix before they are placed in a catalog query.
//!
//! Introspection that finds nothing returns an empty collection, never an error.

use crate::db::dialect::row_text;
use crate::db::driver::DatabaseDriver;
use crate::error::DbResult;
use crate::models::{ColumnMetadata, ColumnTypes, Row};
use tracing::debug;

impl DatabaseDriver {
    /// User tables, excluding system relations and views, in catalog order.
    pub async fn table_list(&mut self) -> DbResult<Vec<String>> {
        let sql = self.dialect().table_list_sql();
        self.set_query(sql);
        let rows = self.load_assoc_list().await?;
        Ok(rows.iter().filter_map(|row| row_text(row, "name")).collect())
    }

    /// Full column metadata in catalog order.
    pub async fn table_columns(&mut self, table: &str) -> DbResult<Vec<ColumnMetadata>> {
        let table = self.replace_prefix(table);
        let sql = self.dialect().table_columns_sql(&table);
        self.set_query(sql);
        let rows = self.load_assoc_list().await?;

        let columns = rows
            .iter()
            .map(|row| self.dialect().column_from_row(row))
            .collect::<DbResult<Vec<_>>>()?;
        debug!(table = %table, columns = columns.len(), "Loaded table columns");
        Ok(columns)
    }

    /// Column name to base type name, e.g. `title -> varchar`.
    pub async fn table_column_types(&mut self, table: &str) -> DbResult<ColumnTypes> {
        let columns = self.table_columns(table).await?;
        Ok(ColumnTypes::from(columns.as_slice()))
    }

    /// Primary-key columns in key order.
    ///
    /// The table must appear in `table_list()` before its name is placed in the
    /// catalog query; an unknown table yields an empty list and no key query runs.
    pub async fn table_keys(&mut self, table: &str) -> DbResult<Vec<String>> {
        let table = self.replace_prefix(table);
        let tables = self.table_list().await?;
        if !tables.iter().any(|t| *t == table) {
            debug!(table = %table, "Table not found, no keys loaded");
            return Ok(Vec::new());
        }

        let sql = self.dialect().table_keys_sql(&table);
        self.set_query(sql);
        let rows = self.load_assoc_list().await?;
        Ok(rows
            .iter()
            .filter_map(|row| row_text(row, "field_name"))
            .collect())
    }

    /// CREATE statements of the given tables, in the order asked for.
    pub async fn table_create(&mut self, tables: &[&str]) -> DbResult<Vec<String>> {
        let mut statements = Vec::with_capacity(tables.len());
        for table in tables {
            let table = self.replace_prefix(table);
            let sql = self.dialect().table_create_sql(&table)?;
            self.set_query(sql);
            if let Some(statement) = self.load_result().await?.and_then(|v| v.as_str().map(String::from)) {
                statements.push(statement);
            }
        }
        Ok(statements)
    }

    pub async fn rename_table(&mut self, old_table: &str, new_table: &str) -> DbResult<()> {
        let sql = self.dialect().rename_table_sql(old_table, new_table)?;
        self.run(sql).await
    }

    /// Sequences owned by a table.
    pub async fn table_sequences(&mut self, table: &str) -> DbResult<Vec<Row>> {
        let table = self.replace_prefix(table);
        let sql = self.dialect().table_sequences_sql(&table)?;
        self.set_query(sql);
        self.load_assoc_list().await
    }
}
