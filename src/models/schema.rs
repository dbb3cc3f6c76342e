//! Schema-related data models.
//!
//! This module defines types produced by schema introspection.

use serde::{Deserialize, Serialize};

/// Column description in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub name: String,
    /// Dialect-independent type label, e.g. `INTEGER`, `VARCHAR`, `TIMESTAMP`.
    pub type_name: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnMetadata {
    /// Create a new column description.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable,
            default: None,
            comment: None,
        }
    }

    /// Set the default expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the column comment.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Base type name: lower-cased with any parenthesised length/precision removed.
    pub fn base_type(&self) -> String {
        base_type_name(&self.type_name)
    }
}

/// Strip a `(length[,scale])` suffix and lower-case a type name.
pub fn base_type_name(type_name: &str) -> String {
    let base = match type_name.find('(') {
        Some(idx) => {
            let tail = type_name[idx..]
                .find(')')
                .map(|end| &type_name[idx + end + 1..])
                .unwrap_or("");
            format!("{}{}", &type_name[..idx], tail)
        }
        None => type_name.to_string(),
    };
    base.trim().to_lowercase()
}

/// Ordered column name to base type mapping, as returned by type-only introspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnTypes(Vec<(String, String)>);

impl ColumnTypes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert or replace a column's type, keeping first-seen order.
    pub fn insert(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        let name = name.into();
        let type_name = type_name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = type_name,
            None => self.0.push((name, type_name)),
        }
    }

    /// Look up the type of a column.
    ///
    /// Falls back to an ASCII case-insensitive match: Firebird stores unquoted
    /// names upper-cased while object fields are usually lower-case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .or_else(|| self.0.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
            .map(|(_, t)| t.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }
}

impl<N: Into<String>, T: Into<String>> FromIterator<(N, T)> for ColumnTypes {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        let mut types = Self::new();
        for (name, type_name) in iter {
            types.insert(name, type_name);
        }
        types
    }
}

impl From<&[ColumnMetadata]> for ColumnTypes {
    fn from(columns: &[ColumnMetadata]) -> Self {
        columns
            .iter()
            .map(|c| (c.name.clone(), c.base_type()))
            .collect()
    }
}
