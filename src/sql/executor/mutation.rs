use crate::{
    error::{Error, Result},
    sql::{
        engine::Catalog,
        executor::{
            query::{check_columns, evaluate_predicate},
            ResultSet,
        },
        parser::{ast::Expression, lexer::Token},
        schema::Table,
        types::Value,
    },
};

use super::Executor;

/// INSERT executor
pub struct Insert {
    table_name: String,
    values: Vec<Token>,
}

impl Insert {
    pub fn new(table_name: String, values: Vec<Token>) -> Box<Self> {
        Box::new(Self { table_name, values })
    }
}

/// Maps a value token and checks it against the column's declared type
fn typed_value(table: &Table, col: usize, token: &Token, command: &str) -> Result<Value> {
    let value = Value::from_token(token)?;
    let datatype = table.columns[col].datatype;
    if !value.fits(datatype) {
        return Err(Error::InvalidValueType {
            expected: datatype.to_string(),
            actual: value.type_name(),
            command: command.into(),
        });
    }
    Ok(value)
}

/// Indexes of the rows `predicate` holds for, all rows without one
fn matching_rows(table: &Table, predicate: Option<&Expression>) -> Result<Vec<usize>> {
    let Some(predicate) = predicate else {
        return Ok((0..table.row_count()).collect());
    };
    let columns = table.column_names();
    check_columns(&table.name, &columns, predicate)?;

    let mut indexes = Vec::new();
    for (i, row) in table.rows().iter().enumerate() {
        if evaluate_predicate(predicate, &table.name, &columns, row)? {
            indexes.push(i);
        }
    }
    Ok(indexes)
}

impl<C: Catalog> Executor<C> for Insert {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let table = catalog.must_get_table_mut(&self.table_name)?;
        if self.values.len() != table.columns.len() {
            return Err(Error::InvalidNumberOfParameters {
                expected: table.columns.len(),
                actual: self.values.len(),
                command: "INSERT".into(),
            });
        }

        // The whole row is checked before any column grows
        let row = self
            .values
            .iter()
            .enumerate()
            .map(|(i, token)| typed_value(table, i, token, "INSERT"))
            .collect::<Result<Vec<_>>>()?;
        table.append_row(row)?;

        Ok(ResultSet::Insert {
            table_name: table.name.clone(),
        })
    }
}

/// UPDATE executor
pub struct Update {
    table_name: String,
    assignments: Vec<(String, Token)>,
    predicate: Option<Expression>,
}

impl Update {
    pub fn new(
        table_name: String,
        assignments: Vec<(String, Token)>,
        predicate: Option<Expression>,
    ) -> Box<Self> {
        Box::new(Self {
            table_name,
            assignments,
            predicate,
        })
    }
}

impl<C: Catalog> Executor<C> for Update {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let table = catalog.must_get_table_mut(&self.table_name)?;

        let mut assignments = Vec::with_capacity(self.assignments.len());
        for (column, token) in &self.assignments {
            let col = table.get_col_index(column)?;
            assignments.push((col, typed_value(table, col, token, "UPDATE")?));
        }

        let rows = matching_rows(table, self.predicate.as_ref())?;
        for &row in &rows {
            for (col, value) in &assignments {
                table.set_value(row, *col, value.clone());
            }
        }

        Ok(ResultSet::Update {
            table_name: table.name.clone(),
            count: rows.len(),
        })
    }
}

/// DELETE executor, WHERE is mandatory
pub struct Delete {
    table_name: String,
    predicate: Expression,
}

impl Delete {
    pub fn new(table_name: String, predicate: Expression) -> Box<Self> {
        Box::new(Self {
            table_name,
            predicate,
        })
    }
}

impl<C: Catalog> Executor<C> for Delete {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let table = catalog.must_get_table_mut(&self.table_name)?;
        let rows = matching_rows(table, Some(&self.predicate))?;
        table.delete_rows(&rows);

        Ok(ResultSet::Delete {
            table_name: table.name.clone(),
            count: rows.len(),
        })
    }
}
