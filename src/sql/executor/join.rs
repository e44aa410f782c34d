use crate::{
    error::{Error, Result},
    sql::{
        engine::Catalog,
        parser::ast::JoinType,
        types::{Row, Value},
    },
};

use super::{query::equals, Executor, ResultSet};

/// Nested Loop Join executor - compares every left row with every right row
///
/// Output columns are the left table's followed by the right table's, each
/// qualified as `TABLE.COLUMN`.
pub struct NestedLoopJoin<C: Catalog> {
    left: Box<dyn Executor<C>>,
    left_table: String,
    right: Box<dyn Executor<C>>,
    right_table: String,
    join_type: JoinType,
    predicate: (String, String),
}

impl<C: Catalog> NestedLoopJoin<C> {
    pub fn new(
        left: Box<dyn Executor<C>>,
        left_table: String,
        right: Box<dyn Executor<C>>,
        right_table: String,
        join_type: JoinType,
        predicate: (String, String),
    ) -> Box<Self> {
        Box::new(Self {
            left,
            left_table,
            right,
            right_table,
            join_type,
            predicate,
        })
    }
}

/// Resolves an `ON` operand against the joined columns
fn resolve(
    columns: &[String],
    name: &str,
    left_table: &str,
    right_table: &str,
) -> Result<usize> {
    columns.iter().position(|c| c == name).ok_or_else(|| {
        let table = match name.split_once('.') {
            Some((table, _)) if table == right_table => right_table,
            _ => left_table,
        };
        Error::ColumnDoesNotExist {
            table: table.to_string(),
            column: name.to_string(),
        }
    })
}

fn qualify(table: &str, columns: Vec<String>) -> Vec<String> {
    columns
        .into_iter()
        .map(|c| format!("{}.{}", table, c))
        .collect()
}

fn joined(left: &Row, right: &Row) -> Row {
    left.iter().chain(right).cloned().collect()
}

impl<C: Catalog> Executor<C> for NestedLoopJoin<C> {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet> {
        let Self {
            left,
            left_table,
            right,
            right_table,
            join_type,
            predicate,
        } = *self;
        let (lcols, lrows) = left.execute(catalog)?.into_scan()?;
        let (rcols, rrows) = right.execute(catalog)?.into_scan()?;
        let (lwidth, rwidth) = (lcols.len(), rcols.len());

        let mut columns = qualify(&left_table, lcols);
        columns.extend(qualify(&right_table, rcols));
        let (a, b) = (
            resolve(&columns, &predicate.0, &left_table, &right_table)?,
            resolve(&columns, &predicate.1, &left_table, &right_table)?,
        );
        // NULL never joins, values of different types fail
        let matches = |row: &Row| -> Result<bool> {
            Ok(equals(&row[a], &row[b], "JOIN")? == Some(true))
        };

        let mut rows = Vec::new();
        let mut right_matched = vec![false; rrows.len()];
        match join_type {
            JoinType::Inner | JoinType::Left | JoinType::Full => {
                for lrow in &lrows {
                    let mut matched = false;
                    for (i, rrow) in rrows.iter().enumerate() {
                        let row = joined(lrow, rrow);
                        if matches(&row)? {
                            matched = true;
                            right_matched[i] = true;
                            rows.push(row);
                        }
                    }
                    if !matched && join_type != JoinType::Inner {
                        rows.push(joined(lrow, &vec![Value::Null; rwidth]));
                    }
                }
                if join_type == JoinType::Full {
                    for (rrow, _) in rrows.iter().zip(&right_matched).filter(|(_, m)| !**m) {
                        rows.push(joined(&vec![Value::Null; lwidth], rrow));
                    }
                }
            }
            JoinType::Right => {
                for rrow in &rrows {
                    let mut matched = false;
                    for lrow in &lrows {
                        let row = joined(lrow, rrow);
                        if matches(&row)? {
                            matched = true;
                            rows.push(row);
                        }
                    }
                    if !matched {
                        rows.push(joined(&vec![Value::Null; lwidth], rrow));
                    }
                }
            }
        }

        Ok(ResultSet::Scan { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{Error, Result},
        sql::{engine::Engine, executor::ResultSet, types::Value},
    };

    fn engine() -> Result<Engine> {
        let mut engine = Engine::new();
        engine
            .execute(
                "create table a (id int, x text); create table b (id int, y text);
                 insert into a values(1, 'a1'); insert into a values(2, 'a2');
                 insert into b values(2, 'b2'); insert into b values(3, 'b3');",
            )
            .into_result()?;
        Ok(engine)
    }

    fn rows(engine: &mut Engine, sql: &str) -> Result<Vec<Vec<Value>>> {
        let (_, rows) = engine
            .execute(sql)
            .results
            .pop()
            .ok_or_else(|| Error::UnsupportedCommandTypeFromParser(sql.into()))?
            .into_scan()?;
        Ok(rows)
    }

    fn int(v: i64) -> Value {
        Value::Integer(v)
    }

    fn text(v: &str) -> Value {
        Value::String(v.into())
    }

    #[test]
    fn test_inner_join() -> Result<()> {
        let mut engine = engine()?;
        let evaluation = engine.execute("select * from a join b on a.id equal b.id;");
        assert_eq!(
            evaluation.results,
            vec![ResultSet::Scan {
                columns: vec!["A.ID".into(), "A.X".into(), "B.ID".into(), "B.Y".into()],
                rows: vec![vec![int(2), text("A2"), int(2), text("B2")]],
            }]
        );
        Ok(())
    }

    #[test]
    fn test_outer_joins() -> Result<()> {
        let mut engine = engine()?;
        assert_eq!(
            rows(&mut engine, "select * from a left join b on a.id equal b.id;")?,
            vec![
                vec![int(1), text("A1"), Value::Null, Value::Null],
                vec![int(2), text("A2"), int(2), text("B2")],
            ]
        );
        assert_eq!(
            rows(&mut engine, "select * from a right join b on a.id equal b.id;")?,
            vec![
                vec![int(2), text("A2"), int(2), text("B2")],
                vec![Value::Null, Value::Null, int(3), text("B3")],
            ]
        );
        assert_eq!(
            rows(&mut engine, "select * from a full join b on b.id equal a.id;")?,
            vec![
                vec![int(1), text("A1"), Value::Null, Value::Null],
                vec![int(2), text("A2"), int(2), text("B2")],
                vec![Value::Null, Value::Null, int(3), text("B3")],
            ]
        );
        Ok(())
    }

    #[test]
    fn test_join_with_where_and_projection() -> Result<()> {
        let mut engine = engine()?;
        assert_eq!(
            rows(
                &mut engine,
                "select b.y from a left join b on a.id equal b.id where a.x equal 'a2';"
            )?,
            vec![vec![text("B2")]]
        );
        Ok(())
    }

    #[test]
    fn test_join_type_mismatch() -> Result<()> {
        let mut engine = Engine::new();
        engine
            .execute(
                "create table c (id int); create table d (id text);
                 insert into c values(1); insert into d values('x');",
            )
            .into_result()?;
        assert_eq!(
            engine.execute("select * from c join d on c.id equal d.id;").error,
            Some(Error::InvalidValueType {
                expected: "INT".into(),
                actual: "TEXT".into(),
                command: "JOIN".into(),
            })
        );
        Ok(())
    }

    #[test]
    fn test_join_unknown_column() -> Result<()> {
        let mut engine = engine()?;
        assert_eq!(
            engine.execute("select * from a join b on a.id equal b.z;").error,
            Some(Error::ColumnDoesNotExist {
                table: "B".into(),
                column: "B.Z".into(),
            })
        );
        Ok(())
    }
}
