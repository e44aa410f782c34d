use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::sql::{
    parser::lexer::{Keyword, Token, TokenKind},
    types::DataType,
};

/// Ordered list of commands parsed from one input buffer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    pub commands: Vec<Command>,
}

impl Display for Sequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", command)?;
        }
        Ok(())
    }
}

/// Abstract Syntax Tree (AST) node for one top-level command
///
/// `Where`, `OrderBy`, `Limit` and `Offset` are continuation commands: they
/// modify the `Select`, `Update` or `Delete` in front of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// CREATE TABLE statement
    Create {
        table_name: String,
        columns: Vec<Column>,
    },
    /// INSERT statement, one value token per column in declared order
    Insert {
        table_name: String,
        values: Vec<Token>,
    },
    Select(SelectCommand),
    Where(Expression),
    OrderBy(Vec<(String, OrderDirection)>),
    Limit(usize),
    Offset(usize),
    /// UPDATE statement, its WHERE follows as the next command
    Update {
        table_name: String,
        assignments: Vec<(String, Token)>,
    },
    /// DELETE statement, its WHERE follows as the next command
    Delete {
        table_name: String,
    },
    Drop {
        table_name: String,
    },
}

impl Command {
    /// Leading keyword of the command, used in diagnostics
    pub fn keyword(&self) -> Keyword {
        match self {
            Command::Create { .. } => Keyword::Create,
            Command::Insert { .. } => Keyword::Insert,
            Command::Select(_) => Keyword::Select,
            Command::Where(_) => Keyword::Where,
            Command::OrderBy(_) => Keyword::Order,
            Command::Limit(_) => Keyword::Limit,
            Command::Offset(_) => Keyword::Offset,
            Command::Update { .. } => Keyword::Update,
            Command::Delete { .. } => Keyword::Delete,
            Command::Drop { .. } => Keyword::Drop,
        }
    }

    pub fn is_continuation(&self) -> bool {
        matches!(
            self,
            Command::Where(_) | Command::OrderBy(_) | Command::Limit(_) | Command::Offset(_)
        )
    }
}

/// Command with its continuations attached, produced by normalisation
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable {
        name: String,
        columns: Vec<Column>,
    },
    DropTable {
        name: String,
    },
    Insert {
        table_name: String,
        values: Vec<Token>,
    },
    Select {
        select: SelectCommand,
        where_clause: Option<Expression>,
        order_by: Vec<(String, OrderDirection)>,
        limit: Option<usize>,
        offset: Option<usize>,
    },
    Update {
        table_name: String,
        assignments: Vec<(String, Token)>,
        where_clause: Option<Expression>,
    },
    Delete {
        table_name: String,
        where_clause: Expression,
    },
}

/// SELECT command without its continuations
#[derive(Debug, Clone, PartialEq)]
pub struct SelectCommand {
    pub table_name: String,
    pub projection: Projection,
    pub distinct: bool,
    pub join: Option<Join>,
}

/// Columns (or aggregates) a SELECT emits
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`
    All,
    Items(Vec<SelectItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Column(String),
    Aggregate(AggregateFunction, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Min,
    Max,
    Count,
    Sum,
    Avg,
}

impl AggregateFunction {
    pub fn from_keyword(keyword: Keyword) -> Option<Self> {
        Some(match keyword {
            Keyword::Min => Self::Min,
            Keyword::Max => Self::Max,
            Keyword::Count => Self::Count,
            Keyword::Sum => Self::Sum,
            Keyword::Avg => Self::Avg,
            _ => return None,
        })
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }
}

/// JOIN clause embedded in a SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table_name: String,
    /// `ON left EQUAL right`, both sides in `table.column` form
    pub on: (String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// Plain `JOIN` or `INNER JOIN`
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

/// Sort direction (ascending or descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Column definition for CREATE TABLE statements
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
}

/// Logical expression tree of a WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Bool(bool),
    /// `column EQUAL value` / `column NOT value`
    Compare {
        column: String,
        operator: CompareOperator,
        value: Token,
    },
    /// `column IN (values)` / `column NOTIN (values)`
    InSet {
        column: String,
        operator: SetOperator,
        values: Vec<Token>,
    },
}

impl Expression {
    /// Column names referenced anywhere in the tree, in order of appearance
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Expression::And(left, right) | Expression::Or(left, right) => {
                let mut columns = left.columns();
                columns.extend(right.columns());
                columns
            }
            Expression::Bool(_) => Vec::new(),
            Expression::Compare { column, .. } | Expression::InSet { column, .. } => {
                vec![column.as_str()]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equal,
    /// Spelled `NOT` in the dialect
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    In,
    NotIn,
}

/// Writes a value token the way it is spelled in the dialect
fn fmt_value(f: &mut Formatter<'_>, token: &Token) -> FmtResult {
    match token.kind {
        TokenKind::Literal | TokenKind::Keyword(Keyword::Null) => f.write_str(&token.literal),
        _ => write!(f, "'{}'", token.literal),
    }
}

fn fmt_values(f: &mut Formatter<'_>, tokens: &[Token]) -> FmtResult {
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        fmt_value(f, token)?;
    }
    Ok(())
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Command::Create {
                table_name,
                columns,
            } => {
                write!(f, "CREATE TABLE {}(", table_name)?;
                for (i, column) in columns.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {}", column.name, column.datatype)?;
                }
                f.write_str(");")
            }
            Command::Insert { table_name, values } => {
                write!(f, "INSERT INTO {} VALUES(", table_name)?;
                fmt_values(f, values)?;
                f.write_str(");")
            }
            Command::Select(select) => write!(f, "{};", select),
            Command::Where(expr) => write!(f, "WHERE {};", expr),
            Command::OrderBy(order_by) => {
                f.write_str("ORDER BY ")?;
                for (i, (column, direction)) in order_by.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let direction = match direction {
                        OrderDirection::Asc => "ASC",
                        OrderDirection::Desc => "DESC",
                    };
                    write!(f, "{} {}", column, direction)?;
                }
                f.write_str(";")
            }
            Command::Limit(limit) => write!(f, "LIMIT {};", limit),
            Command::Offset(offset) => write!(f, "OFFSET {};", offset),
            Command::Update {
                table_name,
                assignments,
            } => {
                write!(f, "UPDATE {} SET ", table_name)?;
                for (i, (column, value)) in assignments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} TO ", column)?;
                    fmt_value(f, value)?;
                }
                f.write_str(";")
            }
            Command::Delete { table_name } => write!(f, "DELETE FROM {};", table_name),
            Command::Drop { table_name } => write!(f, "DROP TABLE {};", table_name),
        }
    }
}

impl Display for SelectCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        match &self.projection {
            Projection::All => f.write_str("*")?,
            Projection::Items(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        SelectItem::Column(name) => f.write_str(name)?,
                        SelectItem::Aggregate(func, name) => {
                            write!(f, "{}({})", func.to_str(), name)?
                        }
                    }
                }
            }
        }
        write!(f, " FROM {}", self.table_name)?;
        if let Some(join) = &self.join {
            let prefix = match join.join_type {
                JoinType::Inner => "",
                JoinType::Left => "LEFT ",
                JoinType::Right => "RIGHT ",
                JoinType::Full => "FULL ",
            };
            write!(
                f,
                " {}JOIN {} ON {} EQUAL {}",
                prefix, join.table_name, join.on.0, join.on.1
            )?;
        }
        Ok(())
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            // OR is left-associative, so a nested OR on the right needs parentheses
            Expression::Or(left, right) => {
                write!(f, "{} OR ", left)?;
                match right.as_ref() {
                    Expression::Or(..) => write!(f, "({})", right),
                    _ => write!(f, "{}", right),
                }
            }
            Expression::And(left, right) => {
                match left.as_ref() {
                    Expression::Or(..) => write!(f, "({})", left)?,
                    _ => write!(f, "{}", left)?,
                }
                f.write_str(" AND ")?;
                match right.as_ref() {
                    Expression::Or(..) | Expression::And(..) => write!(f, "({})", right),
                    _ => write!(f, "{}", right),
                }
            }
            Expression::Bool(true) => f.write_str("TRUE"),
            Expression::Bool(false) => f.write_str("FALSE"),
            Expression::Compare {
                column,
                operator,
                value,
            } => {
                let operator = match operator {
                    CompareOperator::Equal => "EQUAL",
                    CompareOperator::NotEqual => "NOT",
                };
                write!(f, "{} {} ", column, operator)?;
                fmt_value(f, value)
            }
            Expression::InSet {
                column,
                operator,
                values,
            } => {
                let operator = match operator {
                    SetOperator::In => "IN",
                    SetOperator::NotIn => "NOTIN",
                };
                write!(f, "{} {} (", column, operator)?;
                fmt_values(f, values)?;
                f.write_str(")")
            }
        }
    }
}
