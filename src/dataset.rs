//! In-memory tabular dataset handed to the comparison engine

use crate::error::{Result, TabcompareError};
use crate::value::{DataType, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column information for a dataset schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }
}

/// Ordered schema plus rows. Every row holds exactly one value per column,
/// with missing cells materialized as `Value::Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawDataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = TabcompareError;

    fn try_from(raw: RawDataset) -> Result<Self> {
        Dataset::new(raw.columns, raw.rows)
    }
}

impl Dataset {
    /// Build a dataset from an explicit schema, validating the row invariant
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let dataset = Self { columns, rows };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Build a dataset from column names and rows, inferring declared types
    /// and nullability from the values
    pub fn from_rows<S: Into<String>>(names: Vec<S>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        check_row_widths(names.len(), &rows)?;

        let columns = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let data_type = DataType::infer(rows.iter().map(|row| &row[idx]));
                let nullable = rows.iter().any(|row| row[idx].is_null());
                Column::new(name, data_type, nullable)
            })
            .collect();

        Self::new(columns, rows)
    }

    /// An empty dataset with the given schema
    pub fn empty(columns: Vec<Column>) -> Result<Self> {
        Self::new(columns, Vec::new())
    }

    /// Check the schema/row invariant: unique column names and full-width rows
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TabcompareError::schema_incompatible(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        check_row_widths(self.columns.len(), &self.rows)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Number of null cells in a column
    pub fn null_count(&self, column: usize) -> usize {
        self.rows.iter().filter(|row| row[column].is_null()).count()
    }

    /// A row as a column-name keyed map, in schema order
    pub fn row_map(&self, index: usize) -> IndexMap<String, Value> {
        let mut map = IndexMap::with_capacity(self.columns.len());
        if let Some(row) = self.rows.get(index) {
            for (column, value) in self.columns.iter().zip(row.iter()) {
                map.insert(column.name.clone(), value.clone());
            }
        }
        map
    }
}

fn check_row_widths(width: usize, rows: &[Vec<Value>]) -> Result<()> {
    for (idx, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(TabcompareError::schema_incompatible(format!(
                "row {} has {} values but the schema has {} columns",
                idx,
                row.len(),
                width
            )));
        }
    }
    Ok(())
}
