use tracing::trace;

use crate::{
    error::{Error, Result},
    sql::{
        parser::ast::{self, Projection, SelectItem},
        plan::{Node, Plan},
        schema::{self, Table},
    },
};

/// Query planner - converts normalised statements into execution plan nodes
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self {}
    }

    /// Builds an execution plan from a statement
    pub fn build(&mut self, stmt: ast::Statement) -> Result<Plan> {
        let node = self.build_statement(stmt)?;
        trace!(?node, "planned");
        Ok(Plan(node))
    }

    pub fn build_statement(&self, stmt: ast::Statement) -> Result<Node> {
        Ok(match stmt {
            ast::Statement::CreateTable { name, columns } => Node::CreateTable {
                schema: Table::new(
                    name,
                    columns
                        .into_iter()
                        .map(|c| schema::Column::new(c.name, c.datatype))
                        .collect(),
                )?,
            },
            ast::Statement::DropTable { name } => Node::DropTable { table_name: name },
            ast::Statement::Insert { table_name, values } => Node::Insert { table_name, values },
            ast::Statement::Select {
                select,
                where_clause,
                order_by,
                limit,
                offset,
            } => {
                let table_name = select.table_name.clone();
                // Scan node from FROM clause (single table or join result)
                let mut node = self.build_from_item(&select)?;

                if let Some(predicate) = where_clause {
                    node = Node::Filter {
                        source: Box::new(node),
                        table_name: table_name.clone(),
                        predicate,
                    }
                }

                if !order_by.is_empty() {
                    node = Node::Order {
                        source: Box::new(node),
                        table_name: table_name.clone(),
                        order_by,
                    }
                }

                node = self.build_projection(node, table_name, select.projection)?;

                // OFFSET - applied before LIMIT whichever order they were written in
                if let Some(offset) = offset {
                    node = Node::Offset {
                        source: Box::new(node),
                        offset,
                    }
                }

                if let Some(limit) = limit {
                    node = Node::Limit {
                        source: Box::new(node),
                        limit,
                    }
                }

                if select.distinct {
                    node = Node::Distinct {
                        source: Box::new(node),
                    }
                }

                node
            }
            ast::Statement::Update {
                table_name,
                assignments,
                where_clause,
            } => Node::Update {
                table_name,
                assignments,
                predicate: where_clause,
            },
            ast::Statement::Delete {
                table_name,
                where_clause,
            } => Node::Delete {
                table_name,
                predicate: where_clause,
            },
        })
    }

    fn build_from_item(&self, select: &ast::SelectCommand) -> Result<Node> {
        let scan = Node::Scan {
            table_name: select.table_name.clone(),
        };
        Ok(match &select.join {
            None => scan,
            Some(join) => Node::NestedLoopJoin {
                left: Box::new(scan),
                left_table: select.table_name.clone(),
                right: Box::new(Node::Scan {
                    table_name: join.table_name.clone(),
                }),
                right_table: join.table_name.clone(),
                join_type: join.join_type,
                predicate: join.on.clone(),
            },
        })
    }

    /// Plain column list or aggregate list; the two cannot be mixed
    fn build_projection(
        &self,
        source: Node,
        table_name: String,
        projection: Projection,
    ) -> Result<Node> {
        let items = match projection {
            Projection::All => return Ok(source),
            Projection::Items(items) => items,
        };

        let mut columns = Vec::new();
        let mut exprs = Vec::new();
        for item in items {
            match item {
                SelectItem::Column(name) => columns.push(name),
                SelectItem::Aggregate(func, name) => exprs.push((func, name)),
            }
        }

        match (columns.is_empty(), exprs.is_empty()) {
            (false, false) => Err(Error::UnsupportedExpressionType(
                "aggregate functions mixed with plain columns".into(),
            )),
            (true, false) => Ok(Node::Aggregate {
                source: Box::new(source),
                table_name,
                exprs,
            }),
            _ => Ok(Node::Projection {
                source: Box::new(source),
                table_name,
                columns,
            }),
        }
    }
}
