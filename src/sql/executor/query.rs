use std::{cmp::Ordering, collections::HashSet};

use crate::{
    error::{Error, Result},
    sql::{
        engine::Catalog,
        executor::ResultSet,
        parser::ast::{CompareOperator, Expression, OrderDirection, SetOperator},
        types::{Row, Value},
    },
};

use super::Executor;

/// Table scan executor (SELECT), rows in insertion order
pub struct Scan {
    table_name: String,
}

impl Scan {
    pub fn new(table_name: String) -> Box<Self> {
        Box::new(Self { table_name })
    }
}

impl<C: Catalog> Executor<C> for Scan {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let table = catalog.must_get_table(&self.table_name)?;
        Ok(ResultSet::Scan {
            columns: table.column_names(),
            rows: table.rows(),
        })
    }
}

/// WHERE executor - keeps the rows the predicate holds for
pub struct Filter<C: Catalog> {
    source: Box<dyn Executor<C>>,
    table_name: String,
    predicate: Expression,
}

impl<C: Catalog> Filter<C> {
    pub fn new(
        source: Box<dyn Executor<C>>,
        table_name: String,
        predicate: Expression,
    ) -> Box<Self> {
        Box::new(Self {
            source,
            table_name,
            predicate,
        })
    }
}

impl<C: Catalog> Executor<C> for Filter<C> {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let (columns, rows) = self.source.execute(catalog)?.into_scan()?;
        // Unknown columns fail even when there are no rows to test
        check_columns(&self.table_name, &columns, &self.predicate)?;

        let mut filtered = Vec::new();
        for row in rows {
            if evaluate_predicate(&self.predicate, &self.table_name, &columns, &row)? {
                filtered.push(row);
            }
        }
        Ok(ResultSet::Scan {
            columns,
            rows: filtered,
        })
    }
}

/// ORDER BY executor - stable multi-key sort
pub struct Order<C: Catalog> {
    source: Box<dyn Executor<C>>,
    table_name: String,
    order_by: Vec<(String, OrderDirection)>,
}

impl<C: Catalog> Order<C> {
    pub fn new(
        source: Box<dyn Executor<C>>,
        table_name: String,
        order_by: Vec<(String, OrderDirection)>,
    ) -> Box<Self> {
        Box::new(Self {
            source,
            table_name,
            order_by,
        })
    }
}

impl<C: Catalog> Executor<C> for Order<C> {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let (columns, mut rows) = self.source.execute(catalog)?.into_scan()?;
        let keys = self
            .order_by
            .iter()
            .map(|(name, direction)| {
                Ok((column_index(&self.table_name, &columns, name)?, *direction))
            })
            .collect::<Result<Vec<_>>>()?;

        // sort_by can't fail, so the first incomparable pair is kept aside
        let mut error = None;
        rows.sort_by(|a, b| {
            for (index, direction) in &keys {
                let (x, y) = (&a[*index], &b[*index]);
                match x.partial_cmp(y) {
                    Some(Ordering::Equal) => {}
                    Some(o) if *direction == OrderDirection::Asc => return o,
                    Some(o) => return o.reverse(),
                    None => {
                        error.get_or_insert_with(|| Error::InvalidValueType {
                            expected: x.type_name(),
                            actual: y.type_name(),
                            command: "ORDER BY".into(),
                        });
                    }
                }
            }
            Ordering::Equal
        });

        match error {
            Some(err) => Err(err),
            None => Ok(ResultSet::Scan { columns, rows }),
        }
    }
}

/// Projection executor - keeps the listed columns in the listed order
pub struct Projection<C: Catalog> {
    source: Box<dyn Executor<C>>,
    table_name: String,
    columns: Vec<String>,
}

impl<C: Catalog> Projection<C> {
    pub fn new(
        source: Box<dyn Executor<C>>,
        table_name: String,
        columns: Vec<String>,
    ) -> Box<Self> {
        Box::new(Self {
            source,
            table_name,
            columns,
        })
    }
}

impl<C: Catalog> Executor<C> for Projection<C> {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let (columns, rows) = self.source.execute(catalog)?.into_scan()?;
        let indexes = self
            .columns
            .iter()
            .map(|name| column_index(&self.table_name, &columns, name))
            .collect::<Result<Vec<_>>>()?;

        let rows = rows
            .into_iter()
            .map(|row| indexes.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(ResultSet::Scan {
            columns: self.columns,
            rows,
        })
    }
}

/// OFFSET executor
pub struct Offset<C: Catalog> {
    source: Box<dyn Executor<C>>,
    offset: usize,
}

impl<C: Catalog> Offset<C> {
    pub fn new(source: Box<dyn Executor<C>>, offset: usize) -> Box<Self> {
        Box::new(Self { source, offset })
    }
}

impl<C: Catalog> Executor<C> for Offset<C> {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let (columns, rows) = self.source.execute(catalog)?.into_scan()?;
        Ok(ResultSet::Scan {
            columns,
            rows: rows.into_iter().skip(self.offset).collect(),
        })
    }
}

/// LIMIT executor
pub struct Limit<C: Catalog> {
    source: Box<dyn Executor<C>>,
    limit: usize,
}

impl<C: Catalog> Limit<C> {
    pub fn new(source: Box<dyn Executor<C>>, limit: usize) -> Box<Self> {
        Box::new(Self { source, limit })
    }
}

impl<C: Catalog> Executor<C> for Limit<C> {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let (columns, rows) = self.source.execute(catalog)?.into_scan()?;
        Ok(ResultSet::Scan {
            columns,
            rows: rows.into_iter().take(self.limit).collect(),
        })
    }
}

/// DISTINCT executor - drops repeated rows, first occurrence wins
pub struct Distinct<C: Catalog> {
    source: Box<dyn Executor<C>>,
}

impl<C: Catalog> Distinct<C> {
    pub fn new(source: Box<dyn Executor<C>>) -> Box<Self> {
        Box::new(Self { source })
    }
}

impl<C: Catalog> Executor<C> for Distinct<C> {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let (columns, rows) = self.source.execute(catalog)?.into_scan()?;
        let mut seen = HashSet::new();
        let rows = rows
            .into_iter()
            .filter(|row| seen.insert(row.clone()))
            .collect();
        Ok(ResultSet::Scan { columns, rows })
    }
}

/// Position of `name` among `columns`
pub(super) fn column_index(table_name: &str, columns: &[String], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| Error::ColumnDoesNotExist {
            table: table_name.to_string(),
            column: name.to_string(),
        })
}

/// Fails on the first column the predicate references that isn't in `columns`
pub(super) fn check_columns(
    table_name: &str,
    columns: &[String],
    predicate: &Expression,
) -> Result<()> {
    for name in predicate.columns() {
        column_index(table_name, columns, name)?;
    }
    Ok(())
}

/// Evaluates a WHERE expression against one row
///
/// Any comparison involving NULL is false, for `NOT` and `NOTIN` too.
pub(super) fn evaluate_predicate(
    expr: &Expression,
    table_name: &str,
    columns: &[String],
    row: &Row,
) -> Result<bool> {
    Ok(match expr {
        Expression::And(left, right) => {
            evaluate_predicate(left, table_name, columns, row)?
                && evaluate_predicate(right, table_name, columns, row)?
        }
        Expression::Or(left, right) => {
            evaluate_predicate(left, table_name, columns, row)?
                || evaluate_predicate(right, table_name, columns, row)?
        }
        Expression::Bool(b) => *b,
        Expression::Compare {
            column,
            operator,
            value,
        } => {
            let cell = &row[column_index(table_name, columns, column)?];
            let value = Value::from_token(value)?;
            match equals(cell, &value, "WHERE")? {
                None => false,
                Some(eq) => match operator {
                    CompareOperator::Equal => eq,
                    CompareOperator::NotEqual => !eq,
                },
            }
        }
        Expression::InSet {
            column,
            operator,
            values,
        } => {
            let cell = &row[column_index(table_name, columns, column)?];
            if *cell == Value::Null {
                return Ok(false);
            }
            let mut found = false;
            for token in values {
                if equals(cell, &Value::from_token(token)?, "WHERE")? == Some(true) {
                    found = true;
                }
            }
            match operator {
                SetOperator::In => found,
                SetOperator::NotIn => !found,
            }
        }
    })
}

/// Typed equality, None when either side is NULL
pub(super) fn equals(cell: &Value, value: &Value, command: &str) -> Result<Option<bool>> {
    match (cell.datatype(), value.datatype()) {
        (Some(a), Some(b)) if a != b => Err(Error::InvalidValueType {
            expected: a.to_string(),
            actual: b.to_string(),
            command: command.into(),
        }),
        (Some(_), Some(_)) => Ok(Some(cell == value)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::evaluate_predicate;
    use crate::{
        error::{Error, Result},
        sql::{
            engine::Engine,
            executor::ResultSet,
            parser::ast::{CompareOperator, Expression, SetOperator},
            parser::lexer::{Keyword, Token},
            types::Value,
        },
    };

    fn columns() -> Vec<String> {
        vec!["A".into(), "B".into()]
    }

    fn compare(column: &str, operator: CompareOperator, value: Token) -> Expression {
        Expression::Compare {
            column: column.into(),
            operator,
            value,
        }
    }

    #[test]
    fn test_predicate_null_is_never_true() -> Result<()> {
        let row = vec![Value::Null, Value::String("X".into())];
        let equal = compare("A", CompareOperator::Equal, Token::literal("1"));
        let not = compare("A", CompareOperator::NotEqual, Token::literal("1"));
        assert!(!evaluate_predicate(&equal, "T", &columns(), &row)?);
        assert!(!evaluate_predicate(&not, "T", &columns(), &row)?);

        let null_literal = compare("B", CompareOperator::NotEqual, Token::keyword(Keyword::Null));
        assert!(!evaluate_predicate(&null_literal, "T", &columns(), &row)?);

        let not_in = Expression::InSet {
            column: "A".into(),
            operator: SetOperator::NotIn,
            values: vec![Token::literal("2")],
        };
        assert!(!evaluate_predicate(&not_in, "T", &columns(), &row)?);
        Ok(())
    }

    #[test]
    fn test_predicate_sets_and_logic() -> Result<()> {
        let row = vec![Value::Integer(2), Value::String("X".into())];
        let in_set = Expression::InSet {
            column: "A".into(),
            operator: SetOperator::In,
            values: vec![
                Token::literal("1"),
                Token::keyword(Keyword::Null),
                Token::literal("2"),
            ],
        };
        assert!(evaluate_predicate(&in_set, "T", &columns(), &row)?);

        let either = Expression::Or(
            Box::new(compare("B", CompareOperator::Equal, Token::ident("Y"))),
            Box::new(Expression::And(
                Box::new(Expression::Bool(true)),
                Box::new(compare("B", CompareOperator::NotEqual, Token::ident("Y"))),
            )),
        );
        assert!(evaluate_predicate(&either, "T", &columns(), &row)?);
        Ok(())
    }

    #[test]
    fn test_predicate_type_mismatch() {
        let row = vec![Value::Integer(2), Value::String("X".into())];
        assert_eq!(
            evaluate_predicate(
                &compare("A", CompareOperator::Equal, Token::ident("X")),
                "T",
                &columns(),
                &row
            ),
            Err(Error::InvalidValueType {
                expected: "INT".into(),
                actual: "TEXT".into(),
                command: "WHERE".into(),
            })
        );
    }

    #[test]
    fn test_order_is_stable() -> Result<()> {
        let mut engine = Engine::new();
        engine
            .execute(
                "create table t (k int, v text);
                 insert into t values(2, 'a'); insert into t values(1, 'b');
                 insert into t values(2, 'c'); insert into t values(null, 'd');
                 insert into t values(1, 'e');",
            )
            .into_result()?;

        let evaluation = engine.execute("select v from t order by k desc;");
        let values: Vec<Value> = ["A", "C", "B", "E", "D"]
            .into_iter()
            .map(|v| Value::String(v.into()))
            .collect();
        assert_eq!(
            evaluation.results,
            vec![ResultSet::Scan {
                columns: vec!["V".into()],
                rows: values.into_iter().map(|v| vec![v]).collect(),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_offset_then_limit_then_distinct() -> Result<()> {
        let mut engine = Engine::new();
        engine
            .execute("create table t (a int);")
            .into_result()?;
        for a in [1, 1, 2, 2, 3, 1] {
            engine
                .execute(&format!("insert into t values({});", a))
                .into_result()?;
        }

        let evaluation = engine.execute("select distinct a from t offset 1 limit 4;");
        assert_eq!(
            evaluation.results,
            vec![ResultSet::Scan {
                columns: vec!["A".into()],
                rows: vec![
                    vec![Value::Integer(1)],
                    vec![Value::Integer(2)],
                    vec![Value::Integer(3)],
                ],
            }]
        );
        Ok(())
    }

    #[test]
    fn test_unknown_column_on_empty_table() -> Result<()> {
        let mut engine = Engine::new();
        engine.execute("create table t (a int);").into_result()?;
        assert_eq!(
            engine.execute("select * from t where b equal 1;").error,
            Some(Error::ColumnDoesNotExist {
                table: "T".into(),
                column: "B".into(),
            })
        );
        assert_eq!(
            engine.execute("select b from t;").error,
            Some(Error::ColumnDoesNotExist {
                table: "T".into(),
                column: "B".into(),
            })
        );
        Ok(())
    }
}
