use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    sql::types::{DataType, Row, Value},
};

/// Column-oriented table: every column holds one value per row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// Tracked on its own, a table may have no columns
    num_rows: usize,
}

/// Typed column and its values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        Self {
            name: name.into(),
            datatype,
            values: Vec::new(),
        }
    }
}

impl Table {
    /// Creates an empty table, column names must be unique
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let name = name.into();
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::DuplicateColumn {
                    table: name,
                    column: column.name.clone(),
                });
            }
        }
        Ok(Self {
            name,
            columns,
            num_rows: 0,
        })
    }

    pub fn row_count(&self) -> usize {
        self.num_rows
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Returns the column index for a given column name
    pub fn get_col_index(&self, col_name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == col_name)
            .ok_or_else(|| Error::ColumnDoesNotExist {
                table: self.name.clone(),
                column: col_name.to_string(),
            })
    }

    /// Row at `index` as a mapping from column name to value
    pub fn row(&self, index: usize) -> Option<BTreeMap<String, Value>> {
        if index >= self.row_count() {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.values[index].clone()))
                .collect(),
        )
    }

    /// Row at `index` in column order
    pub fn row_values(&self, index: usize) -> Option<Row> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index].clone()).collect())
    }

    /// All rows in insertion order
    pub fn rows(&self) -> Vec<Row> {
        (0..self.row_count())
            .filter_map(|i| self.row_values(i))
            .collect()
    }

    /// Appends a row in lock-step across all columns
    pub fn append_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::InvalidNumberOfParameters {
                expected: self.columns.len(),
                actual: row.len(),
                command: "INSERT".into(),
            });
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.values.push(value);
        }
        self.num_rows += 1;
        Ok(())
    }

    /// Overwrites one cell
    pub fn set_value(&mut self, row: usize, col: usize, value: Value) {
        self.columns[col].values[row] = value;
    }

    /// Removes the rows at the given (ascending) indexes from every column
    pub fn delete_rows(&mut self, indexes: &[usize]) {
        self.num_rows -= indexes.iter().filter(|&&i| i < self.num_rows).count();
        for column in self.columns.iter_mut() {
            let mut i = 0;
            column.values.retain(|_| {
                let keep = indexes.binary_search(&i).is_err();
                i += 1;
                keep
            });
        }
    }
}
