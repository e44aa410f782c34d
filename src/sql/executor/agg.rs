use crate::{
    error::{Error, Result},
    sql::{
        engine::Catalog,
        executor::query::column_index,
        parser::ast::AggregateFunction,
        types::{DataType, Value},
    },
};

use super::{Executor, ResultSet};

/// Aggregate executor - computes aggregate functions (COUNT, SUM, MIN, MAX, AVG)
///
/// Collapses its source into a single row with one column per aggregate.
pub struct Aggregate<C: Catalog> {
    source: Box<dyn Executor<C>>,
    table_name: String,
    exprs: Vec<(AggregateFunction, String)>,
}

impl<C: Catalog> Aggregate<C> {
    pub fn new(
        source: Box<dyn Executor<C>>,
        table_name: String,
        exprs: Vec<(AggregateFunction, String)>,
    ) -> Box<Self> {
        Box::new(Self {
            source,
            table_name,
            exprs,
        })
    }
}

impl<C: Catalog> Executor<C> for Aggregate<C> {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let (columns, rows) = self.source.execute(catalog)?.into_scan()?;

        let mut new_cols = Vec::with_capacity(self.exprs.len());
        let mut new_row = Vec::with_capacity(self.exprs.len());
        for (func, col_name) in &self.exprs {
            let pos = column_index(&self.table_name, &columns, col_name)?;
            // Nulls never take part in an aggregate
            let values: Vec<&Value> = rows
                .iter()
                .map(|row| &row[pos])
                .filter(|v| **v != Value::Null)
                .collect();

            new_row.push(<dyn Calculator>::build(*func).calc(&values)?);
            new_cols.push(format!("{}({})", func.to_str(), col_name));
        }

        Ok(ResultSet::Scan {
            columns: new_cols,
            rows: vec![new_row],
        })
    }
}

/// Trait for aggregate function calculations over non-null values
pub trait Calculator {
    fn calc(&self, values: &[&Value]) -> Result<Value>;
}

impl dyn Calculator {
    pub fn build(func: AggregateFunction) -> Box<dyn Calculator> {
        match func {
            AggregateFunction::Count => Box::new(Count),
            AggregateFunction::Sum => Box::new(Sum),
            AggregateFunction::Min => Box::new(Min),
            AggregateFunction::Max => Box::new(Max),
            AggregateFunction::Avg => Box::new(Avg),
        }
    }
}

/// Picks the extreme value, `keep` decides whether a candidate replaces the current one
fn extreme(values: &[&Value], command: &str, keep: fn(&Value, &Value) -> bool) -> Result<Value> {
    let mut best: Option<&Value> = None;
    for &value in values {
        match best {
            None => best = Some(value),
            Some(current) => {
                if value.partial_cmp(current).is_none() {
                    return Err(Error::InvalidValueType {
                        expected: current.type_name(),
                        actual: value.type_name(),
                        command: command.into(),
                    });
                }
                if keep(value, current) {
                    best = Some(value);
                }
            }
        }
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

/// Integer sum, None when there is nothing to add
fn integer_sum(values: &[&Value], command: &str) -> Result<Option<i64>> {
    let mut sum: Option<i64> = None;
    for value in values {
        match value {
            Value::Integer(v) => {
                sum = Some(sum.unwrap_or(0).checked_add(*v).ok_or_else(|| {
                    Error::UnsupportedValueType(format!("{} overflows INT", command))
                })?)
            }
            other => {
                return Err(Error::InvalidValueType {
                    expected: DataType::Integer.to_string(),
                    actual: other.type_name(),
                    command: command.into(),
                })
            }
        }
    }
    Ok(sum)
}

/// COUNT - counts non-null values in a column
pub struct Count;

impl Calculator for Count {
    fn calc(&self, values: &[&Value]) -> Result<Value> {
        Ok(Value::Integer(values.len() as i64))
    }
}

/// MIN - finds minimum value in a column
pub struct Min;

impl Calculator for Min {
    fn calc(&self, values: &[&Value]) -> Result<Value> {
        extreme(values, "MIN", |a, b| a < b)
    }
}

/// MAX - finds maximum value in a column
pub struct Max;

impl Calculator for Max {
    fn calc(&self, values: &[&Value]) -> Result<Value> {
        extreme(values, "MAX", |a, b| a > b)
    }
}

/// SUM - integer columns only
pub struct Sum;

impl Calculator for Sum {
    fn calc(&self, values: &[&Value]) -> Result<Value> {
        Ok(integer_sum(values, "SUM")?.map_or(Value::Null, Value::Integer))
    }
}

/// AVG - truncating integer division of SUM by COUNT
pub struct Avg;

impl Calculator for Avg {
    fn calc(&self, values: &[&Value]) -> Result<Value> {
        Ok(match integer_sum(values, "AVG")? {
            Some(sum) => Value::Integer(sum / values.len() as i64),
            None => Value::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{Error, Result},
        sql::{engine::Engine, executor::ResultSet, types::Value},
    };

    #[test]
    fn test_aggregates() -> Result<()> {
        let mut engine = Engine::new();
        engine
            .execute(
                "create table t (name text, n int);
                 insert into t values('b', 3); insert into t values('a', 4);
                 insert into t values('c', null); insert into t values(null, 0);",
            )
            .into_result()?;

        let evaluation =
            engine.execute("select count(name), min(name), max(n), sum(n), avg(n) from t;");
        assert_eq!(
            evaluation.results,
            vec![ResultSet::Scan {
                columns: vec![
                    "COUNT(NAME)".into(),
                    "MIN(NAME)".into(),
                    "MAX(N)".into(),
                    "SUM(N)".into(),
                    "AVG(N)".into(),
                ],
                rows: vec![vec![
                    Value::Integer(3),
                    Value::String("A".into()),
                    Value::Integer(4),
                    Value::Integer(7),
                    Value::Integer(2),
                ]],
            }]
        );
        Ok(())
    }

    #[test]
    fn test_aggregates_over_nothing() -> Result<()> {
        let mut engine = Engine::new();
        engine.execute("create table t (n int);").into_result()?;
        let evaluation = engine.execute("select count(n), sum(n), min(n), avg(n) from t;");
        assert_eq!(
            evaluation.results,
            vec![ResultSet::Scan {
                columns: vec![
                    "COUNT(N)".into(),
                    "SUM(N)".into(),
                    "MIN(N)".into(),
                    "AVG(N)".into(),
                ],
                rows: vec![vec![Value::Integer(0), Value::Null, Value::Null, Value::Null]],
            }]
        );
        Ok(())
    }

    #[test]
    fn test_sum_requires_integers() -> Result<()> {
        let mut engine = Engine::new();
        engine
            .execute("create table t (s text); insert into t values('x');")
            .into_result()?;
        assert_eq!(
            engine.execute("select sum(s) from t;").error,
            Some(Error::InvalidValueType {
                expected: "INT".into(),
                actual: "TEXT".into(),
                command: "SUM".into(),
            })
        );
        assert_eq!(
            engine.execute("select avg(s) from t where s equal 'x';").error,
            Some(Error::InvalidValueType {
                expected: "INT".into(),
                actual: "TEXT".into(),
                command: "AVG".into(),
            })
        );
        Ok(())
    }
}
