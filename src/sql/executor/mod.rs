use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    sql::{
        engine::Catalog,
        executor::{
            agg::Aggregate,
            join::NestedLoopJoin,
            mutation::{Delete, Insert, Update},
            query::{Distinct, Filter, Limit, Offset, Order, Projection, Scan},
            schema::{CreateTable, DropTable},
        },
        plan::Node,
        types::Row,
    },
};

mod agg;
mod join;
mod mutation;
mod query;
mod schema;

/// Executor trait
pub trait Executor<C: Catalog> {
    fn execute(self: Box<Self>, catalog: &mut C) -> Result<ResultSet>;
}

/// Builds an executor from a plan node
///
/// The `'static` bound is required for trait object usage in recursive executor building.
impl<C: Catalog + 'static> dyn Executor<C> {
    pub fn build(node: Node) -> Box<dyn Executor<C>> {
        match node {
            Node::CreateTable { schema } => CreateTable::new(schema),
            Node::DropTable { table_name } => DropTable::new(table_name),
            Node::Insert { table_name, values } => Insert::new(table_name, values),
            Node::Scan { table_name } => Scan::new(table_name),
            Node::NestedLoopJoin {
                left,
                left_table,
                right,
                right_table,
                join_type,
                predicate,
            } => NestedLoopJoin::new(
                Self::build(*left),
                left_table,
                Self::build(*right),
                right_table,
                join_type,
                predicate,
            ),
            Node::Filter {
                source,
                table_name,
                predicate,
            } => Filter::new(Self::build(*source), table_name, predicate),
            Node::Order {
                source,
                table_name,
                order_by,
            } => Order::new(Self::build(*source), table_name, order_by),
            Node::Projection {
                source,
                table_name,
                columns,
            } => Projection::new(Self::build(*source), table_name, columns),
            Node::Aggregate {
                source,
                table_name,
                exprs,
            } => Aggregate::new(Self::build(*source), table_name, exprs),
            Node::Offset { source, offset } => Offset::new(Self::build(*source), offset),
            Node::Limit { source, limit } => Limit::new(Self::build(*source), limit),
            Node::Distinct { source } => Distinct::new(Self::build(*source)),
            Node::Update {
                table_name,
                assignments,
                predicate,
            } => Update::new(table_name, assignments, predicate),
            Node::Delete {
                table_name,
                predicate,
            } => Delete::new(table_name, predicate),
        }
    }
}

/// Execution result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResultSet {
    CreateTable { table_name: String },
    DropTable { table_name: String },
    Insert { table_name: String },
    Scan { columns: Vec<String>, rows: Vec<Row> },
    Update { table_name: String, count: usize },
    Delete { table_name: String, count: usize },
}

impl ResultSet {
    /// Columns and rows of a row-producing result
    pub fn into_scan(self) -> Result<(Vec<String>, Vec<Row>)> {
        match self {
            ResultSet::Scan { columns, rows } => Ok((columns, rows)),
            other => Err(Error::UnsupportedCommandTypeFromParser(format!(
                "{} is not a row source",
                other
            ))),
        }
    }
}

impl Display for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultSet::CreateTable { table_name } => {
                write!(f, "Table '{}' has been created", table_name)
            }
            ResultSet::DropTable { table_name } => {
                write!(f, "Table '{}' has been dropped", table_name)
            }
            ResultSet::Insert { .. } => f.write_str("Data Inserted"),
            ResultSet::Scan { columns, rows } => f.write_str(&render_table(columns, rows)),
            ResultSet::Update { table_name, .. } => {
                write!(f, "Data in '{}' has been updated", table_name)
            }
            ResultSet::Delete { table_name, .. } => {
                write!(f, "Data from '{}' has been deleted", table_name)
            }
        }
    }
}

/// Renders rows as an ASCII box: bar, header, bar, rows, bar
///
/// Each column is as wide as its widest header or rendered value.
pub fn render_table(columns: &[String], rows: &[Row]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain([name.chars().count()])
                .max()
                .unwrap_or_default()
        })
        .collect();

    let bar = widths.iter().fold(String::from("+"), |mut bar, w| {
        bar.push_str(&"-".repeat(w + 2));
        bar.push('+');
        bar
    });
    let line = |values: &[String]| {
        values
            .iter()
            .zip(&widths)
            .fold(String::from("|"), |mut line, (value, w)| {
                line.push_str(&format!(" {:<width$} |", value, width = w));
                line
            })
    };

    let mut lines = vec![bar.clone(), line(columns), bar.clone()];
    lines.extend(cells.iter().map(|row| line(row.as_slice())));
    lines.push(bar);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{render_table, ResultSet};
    use crate::sql::types::Value;

    #[test]
    fn test_render_table() {
        let rendered = render_table(
            &["ONE".to_string(), "TWO".to_string()],
            &[
                vec![Value::String("HELLO".into()), Value::Integer(10)],
                vec![Value::String("GOODBYE".into()), Value::Null],
            ],
        );
        assert_eq!(
            rendered,
            [
                "+-----------+------+",
                "| ONE       | TWO  |",
                "+-----------+------+",
                "| 'HELLO'   | 10   |",
                "| 'GOODBYE' | NULL |",
                "+-----------+------+",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_render_empty_result() {
        assert_eq!(
            render_table(&["A".to_string()], &[]),
            "+---+\n| A |\n+---+\n+---+"
        );
    }

    #[test]
    fn test_result_messages() {
        assert_eq!(
            ResultSet::CreateTable {
                table_name: "T".into()
            }
            .to_string(),
            "Table 'T' has been created"
        );
        assert_eq!(
            ResultSet::Insert {
                table_name: "T".into()
            }
            .to_string(),
            "Data Inserted"
        );
        assert_eq!(
            ResultSet::Update {
                table_name: "T".into(),
                count: 2
            }
            .to_string(),
            "Data in 'T' has been updated"
        );
        assert_eq!(
            ResultSet::Delete {
                table_name: "T".into(),
                count: 0
            }
            .to_string(),
            "Data from 'T' has been deleted"
        );
        assert_eq!(
            ResultSet::DropTable {
                table_name: "T".into()
            }
            .to_string(),
            "Table 'T' has been dropped"
        );
    }

    #[test]
    fn test_result_set_is_wire_serializable() {
        let result = ResultSet::Scan {
            columns: vec!["A".into()],
            rows: vec![vec![Value::Integer(1)], vec![Value::Null]],
        };
        let bytes = bincode::serialize(&result).unwrap();
        assert_eq!(bincode::deserialize::<ResultSet>(&bytes).unwrap(), result);
    }
}
