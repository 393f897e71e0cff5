use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// Column type tag, resolved once when the table is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Text,
    DateTime,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::DateTime => write!(f, "datetime"),
        }
    }
}

/// Cell storage for one column. `None` is the missing marker; a
/// `Some(f64::NAN)` is a real value and never counted as missing.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Numeric(_) => ColumnKind::Numeric,
            ColumnData::Text(_) => ColumnKind::Text,
            ColumnData::DateTime(_) => ColumnKind::DateTime,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Text(v) => v[row].is_none(),
            ColumnData::DateTime(v) => v[row].is_none(),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Display form of a cell, `None` when missing.
    pub fn display(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Numeric(v) => v[row].map(|n| n.to_string()),
            ColumnData::Text(v) => v[row].clone(),
            ColumnData::DateTime(v) => v[row].map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }

    /// JSON form of a cell for previews: numbers stay numbers.
    pub fn json_value(&self, row: usize) -> serde_json::Value {
        match self {
            ColumnData::Numeric(v) => v[row].map_or(serde_json::Value::Null, serde_json::Value::from),
            _ => self.display(row).map_or(serde_json::Value::Null, serde_json::Value::String),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self { name: name.into(), data }
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&[Option<NaiveDateTime>]> {
        match &self.data {
            ColumnData::DateTime(v) => Some(v),
            _ => None,
        }
    }
}

/// An immutable, fully materialised table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Builds a table; every column must have `row_count` cells.
    pub fn new(columns: Vec<Column>, row_count: usize) -> Result<Self, crate::error::AppError> {
        if let Some(bad) = columns.iter().find(|c| c.data.len() != row_count) {
            return Err(crate::error::AppError::Internal(format!(
                "Column {} has {} cells, expected {}",
                bad.name,
                bad.data.len(),
                row_count
            )));
        }
        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.kind() == ColumnKind::Numeric)
    }

    pub fn missing_total(&self) -> usize {
        self.columns.iter().map(|c| c.data.missing_count()).sum()
    }
}
