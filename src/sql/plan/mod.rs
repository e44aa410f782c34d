//! Planning: attaches continuation commands to their anchor and turns each
//! resulting statement into a tree of executor nodes.

use tracing::trace;

use crate::{
    error::{Error, Result},
    sql::{
        engine::Catalog,
        executor::{Executor, ResultSet},
        parser::{
            ast::{
                AggregateFunction, Command, Expression, JoinType, OrderDirection, Sequence,
                Statement,
            },
            lexer::Token,
        },
        schema::Table,
    },
};

mod planner;

pub use planner::Planner;

/// Execution plan node
#[derive(Debug, PartialEq)]
pub enum Node {
    CreateTable {
        schema: Table,
    },
    DropTable {
        table_name: String,
    },
    Insert {
        table_name: String,
        values: Vec<Token>,
    },
    /// Full table scan in insertion order
    Scan {
        table_name: String,
    },
    NestedLoopJoin {
        left: Box<Node>,
        left_table: String,
        right: Box<Node>,
        right_table: String,
        join_type: JoinType,
        /// Qualified column names compared for equality
        predicate: (String, String),
    },
    /// WHERE
    Filter {
        source: Box<Node>,
        table_name: String,
        predicate: Expression,
    },
    Order {
        source: Box<Node>,
        table_name: String,
        order_by: Vec<(String, OrderDirection)>,
    },
    Projection {
        source: Box<Node>,
        table_name: String,
        columns: Vec<String>,
    },
    Aggregate {
        source: Box<Node>,
        table_name: String,
        exprs: Vec<(AggregateFunction, String)>,
    },
    Offset {
        source: Box<Node>,
        offset: usize,
    },
    Limit {
        source: Box<Node>,
        limit: usize,
    },
    Distinct {
        source: Box<Node>,
    },
    Update {
        table_name: String,
        assignments: Vec<(String, Token)>,
        predicate: Option<Expression>,
    },
    Delete {
        table_name: String,
        predicate: Expression,
    },
}

/// Execution plan
#[derive(Debug, PartialEq)]
pub struct Plan(pub Node);

impl Plan {
    /// Builds an execution plan from a normalised statement
    pub fn build(stmt: Statement) -> Result<Self> {
        Planner::new().build(stmt)
    }

    /// Executes the plan against a catalog
    pub fn execute<C: Catalog + 'static>(self, catalog: &mut C) -> Result<ResultSet> {
        <dyn Executor<C>>::build(self.0).execute(catalog)
    }
}

/// Attaches every continuation command to the anchor in front of it
///
/// The parser already rejects continuations in the wrong place; sequences
/// assembled by hand are checked again here.
pub fn normalize(seq: Sequence) -> Result<Vec<Statement>> {
    let mut statements: Vec<Statement> = Vec::new();
    // DELETE waiting for its mandatory WHERE
    let mut pending_delete: Option<String> = None;

    for command in seq.commands {
        trace!(command = %command, "normalizing");
        if let Some(table_name) = pending_delete.take() {
            match command {
                Command::Where(where_clause) => {
                    statements.push(Statement::Delete {
                        table_name,
                        where_clause,
                    });
                    continue;
                }
                _ => return Err(delete_without_where()),
            }
        }

        let keyword = command.keyword().to_string();
        match command {
            Command::Create {
                table_name,
                columns,
            } => statements.push(Statement::CreateTable {
                name: table_name,
                columns,
            }),
            Command::Drop { table_name } => {
                statements.push(Statement::DropTable { name: table_name })
            }
            Command::Insert { table_name, values } => {
                statements.push(Statement::Insert { table_name, values })
            }
            Command::Select(select) => statements.push(Statement::Select {
                select,
                where_clause: None,
                order_by: Vec::new(),
                limit: None,
                offset: None,
            }),
            Command::Update {
                table_name,
                assignments,
            } => statements.push(Statement::Update {
                table_name,
                assignments,
                where_clause: None,
            }),
            Command::Delete { table_name } => pending_delete = Some(table_name),
            continuation => {
                let anchor = match statements.last_mut() {
                    Some(anchor)
                        if matches!(
                            anchor,
                            Statement::Select { .. }
                                | Statement::Update { .. }
                                | Statement::Delete { .. }
                        ) =>
                    {
                        anchor
                    }
                    _ => return Err(Error::NoPredecessor(keyword)),
                };
                attach(anchor, continuation)?;
            }
        }
    }

    if pending_delete.is_some() {
        return Err(delete_without_where());
    }
    Ok(statements)
}

/// Moves one continuation into its anchor statement
fn attach(anchor: &mut Statement, continuation: Command) -> Result<()> {
    let keyword = continuation.keyword().to_string();
    match (anchor, continuation) {
        (Statement::Select { where_clause, .. }, Command::Where(expr))
        | (Statement::Update { where_clause, .. }, Command::Where(expr))
            if where_clause.is_none() =>
        {
            *where_clause = Some(expr)
        }
        (Statement::Select { order_by, .. }, Command::OrderBy(keys)) if order_by.is_empty() => {
            *order_by = keys
        }
        (Statement::Select { limit, .. }, Command::Limit(n)) if limit.is_none() => {
            *limit = Some(n)
        }
        (Statement::Select { offset, .. }, Command::Offset(n)) if offset.is_none() => {
            *offset = Some(n)
        }
        _ => return Err(Error::UnsupportedCommandTypeFromParser(keyword)),
    }
    Ok(())
}

fn delete_without_where() -> Error {
    Error::SyntaxCommandMissing {
        command: "DELETE".into(),
        successors: vec!["WHERE".into()],
    }
}
