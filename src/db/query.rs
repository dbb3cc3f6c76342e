//! Query builder.
//!
//! `Query` accumulates the clauses of one INSERT or UPDATE statement and renders
//! it with `to_string()`. Names and values are passed in already quoted; the
//! builder only quotes the RETURNING column, since that one is always a bare name.

use crate::db::driver::DatabaseDriver;
use crate::db::prefix;
use crate::error::DbResult;
use std::fmt;
use tracing::debug;

/// What a dialect's query object can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryFeatures {
    pub name_quote: char,
    /// Whether `INSERT ... RETURNING` is understood.
    pub returning: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Statement {
    Insert(String),
    Update(String),
}

/// Builder for a single INSERT or UPDATE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    features: QueryFeatures,
    statement: Option<Statement>,
    columns: Vec<String>,
    values: Vec<String>,
    set: Vec<String>,
    conditions: Vec<String>,
    returning: Option<String>,
}

impl Query {
    pub fn new(features: QueryFeatures) -> Self {
        Self {
            features,
            statement: None,
            columns: Vec::new(),
            values: Vec::new(),
            set: Vec::new(),
            conditions: Vec::new(),
            returning: None,
        }
    }

    pub fn features(&self) -> QueryFeatures {
        self.features
    }

    pub fn insert(&mut self, table: impl Into<String>) -> &mut Self {
        self.statement = Some(Statement::Insert(table.into()));
        self
    }

    pub fn update(&mut self, table: impl Into<String>) -> &mut Self {
        self.statement = Some(Statement::Update(table.into()));
        self
    }

    /// Append column names to the INSERT column list.
    pub fn columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append one row of comma-separated, already serialized values.
    pub fn values(&mut self, row: impl Into<String>) -> &mut Self {
        self.values.push(row.into());
        self
    }

    /// Append a `name=value` assignment to the SET clause.
    pub fn set(&mut self, assignment: impl Into<String>) -> &mut Self {
        self.set.push(assignment.into());
        self
    }

    /// Append a condition; conditions are joined with AND.
    pub fn and_where(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    /// Ask the INSERT to return the generated value of `column`.
    pub fn returning(&mut self, column: impl Into<String>) -> &mut Self {
        self.returning = Some(column.into());
        self
    }

    pub fn returning_column(&self) -> Option<&str> {
        self.returning.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.statement.is_none()
    }

    /// Reset every clause, keeping the dialect features.
    pub fn clear(&mut self) -> &mut Self {
        *self = Self::new(self.features);
        self
    }

    fn write_insert(&self, f: &mut fmt::Formatter<'_>, table: &str) -> fmt::Result {
        write!(f, "INSERT INTO {}", table)?;
        if self.columns.is_empty() && self.values.is_empty() {
            f.write_str(" DEFAULT VALUES")?;
        } else {
            if !self.columns.is_empty() {
                write!(f, " ({})", self.columns.join(","))?;
            }
            let rows: Vec<String> = self.values.iter().map(|row| format!("({})", row)).collect();
            write!(f, " VALUES {}", rows.join(","))?;
        }
        if let Some(column) = self.returning.as_deref().filter(|_| self.features.returning) {
            write!(
                f,
                " RETURNING {}",
                prefix::quote_name(column, self.features.name_quote)
            )?;
        }
        Ok(())
    }

    fn write_update(&self, f: &mut fmt::Formatter<'_>, table: &str) -> fmt::Result {
        write!(f, "UPDATE {} SET {}", table, self.set.join(","))?;
        if !self.conditions.is_empty() {
            write!(f, " WHERE {}", self.conditions.join(" AND "))?;
        }
        Ok(())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.statement {
            Some(Statement::Insert(table)) => self.write_insert(f, table),
            Some(Statement::Update(table)) => self.write_update(f, table),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Driver-level statement helpers
// =============================================================================

impl DatabaseDriver {
    /// Replace the driver's query object with a fresh one and return it.
    pub fn new_query(&mut self) -> DbResult<&mut Query> {
        let features = self.dialect().query_features()?;
        Ok(self.query_object.insert(Query::new(features)))
    }

    /// The current query object, if `new_query` has been called.
    pub fn query(&self) -> Option<&Query> {
        self.query_object.as_ref()
    }

    pub async fn drop_table(&mut self, table: &str, if_exists: bool) -> DbResult<()> {
        let sql = self.dialect().drop_table_sql(table, if_exists);
        debug!(table = %table, "Dropping table");
        self.run(sql).await
    }

    pub async fn create_database(&mut self, name: &str) -> DbResult<()> {
        let sql = self.dialect().create_database_sql(name)?;
        self.run(sql).await
    }

    /// Statement that switches the database to UTF-8.
    pub fn alter_db_character_set_sql(&self, database: &str) -> String {
        self.dialect().alter_db_character_set_sql(database)
    }

    pub async fn alter_db_character_set(&mut self, database: &str) -> DbResult<()> {
        let sql = self.alter_db_character_set_sql(database);
        self.run(sql).await
    }

    /// Per-table character set statements. Neither dialect stores a per-table charset.
    pub fn alter_table_character_set_sql(&self, _table: &str) -> Vec<String> {
        Vec::new()
    }
}
