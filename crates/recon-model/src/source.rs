//! Typed table abstraction handed over by the file readers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::profile::{DataType, SemanticTag};

/// One column of a parsed source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceColumn {
    /// Normalized header text.
    pub name: String,
    /// Physical type label reported by the reader (e.g. `int64`, `object`).
    #[serde(rename = "dtype", default)]
    pub physical_type: String,
    /// Cell values in row order; `None` is a null cell.
    #[serde(default)]
    pub values: Vec<Option<String>>,
    #[serde(default)]
    pub semantic_tags: BTreeSet<String>,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, physical_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            physical_type: physical_type.into(),
            values: Vec::new(),
            semantic_tags: BTreeSet::new(),
        }
    }

    /// Builds a column from non-null values.
    pub fn with_values<I, S>(name: impl Into<String>, physical_type: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut column = Self::new(name, physical_type);
        column.values = values.into_iter().map(|v| Some(v.into())).collect();
        column
    }

    #[must_use]
    pub fn with_tag(mut self, tag: SemanticTag) -> Self {
        self.semantic_tags.insert(tag.as_str().to_string());
        self
    }

    /// Simplified kind of the physical type.
    pub fn kind(&self) -> DataType {
        DataType::from_label(&self.physical_type)
    }

    /// Non-null values in row order.
    pub fn non_null(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(Option::as_deref)
    }

    pub fn known_tags(&self) -> impl Iterator<Item = SemanticTag> + '_ {
        self.semantic_tags.iter().filter_map(|t| SemanticTag::parse(t))
    }
}

/// A parsed source table: ordered columns with their sampled values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<SourceColumn>,
}

impl SourceTable {
    pub fn new(name: impl Into<String>, columns: Vec<SourceColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&SourceColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
