use tracing::trace;

use crate::error::{Error, Result};
use crate::sql::parser::ast::{
    AggregateFunction, Column, Command, CompareOperator, Expression, Join, JoinType,
    OrderDirection, Projection, SelectCommand, SelectItem, Sequence, SetOperator,
};
use crate::sql::parser::lexer::{Keyword, Lexer, Token, TokenKind};
use crate::sql::types::DataType;

pub mod ast;
pub mod lexer;

/// Parses query text into a command sequence
pub fn parse(input: &str) -> Result<Sequence> {
    Parser::new(input).parse()
}

/// Keywords a chainable statement may be directly followed by instead of `;`
const CONTINUATIONS: [Keyword; 4] = [
    Keyword::Where,
    Keyword::Order,
    Keyword::Limit,
    Keyword::Offset,
];

/// Parser - Converts tokens into a flat sequence of commands
///
/// Recursive descent with one token of look-ahead. Continuation commands
/// are checked against the commands already parsed in front of them.
pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
    commands: Vec<Command>,
    /// Most recent AND/OR consumed, reported by expression errors
    last_operator: Option<Keyword>,
}

impl Parser {
    /// Creates a new parser for the given input
    pub fn new(input: &str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Parser {
            lexer,
            current,
            peek,
            commands: Vec::new(),
            last_operator: None,
        }
    }

    /// Parses the whole input, stopping at the first error
    pub fn parse(mut self) -> Result<Sequence> {
        while self.current.kind != TokenKind::Eof {
            let command = self.parse_command()?;
            trace!(command = %command, "parsed command");

            if let Some(Command::Delete { .. }) = self.commands.last() {
                if !matches!(command, Command::Where(_)) {
                    return Err(Self::delete_without_where());
                }
            }
            self.commands.push(command);
        }

        if let Some(Command::Delete { .. }) = self.commands.last() {
            return Err(Self::delete_without_where());
        }
        Ok(Sequence {
            commands: self.commands,
        })
    }

    /// Selects a sub-parser based on the leading keyword
    fn parse_command(&mut self) -> Result<Command> {
        match self.current.kind {
            TokenKind::Keyword(Keyword::Create) => self.parse_create(),
            TokenKind::Keyword(Keyword::Drop) => self.parse_drop(),
            TokenKind::Keyword(Keyword::Insert) => self.parse_insert(),
            TokenKind::Keyword(Keyword::Select) => self.parse_select(),
            TokenKind::Keyword(Keyword::Update) => self.parse_update(),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete(),
            TokenKind::Keyword(Keyword::Where) => self.parse_where(),
            TokenKind::Keyword(Keyword::Order) => self.parse_order_by(),
            TokenKind::Keyword(Keyword::Limit) => self.parse_limit(),
            TokenKind::Keyword(Keyword::Offset) => self.parse_offset(),
            TokenKind::Illegal => Err(Error::IllegalCharacter(self.current.literal.clone())),
            kind => Err(Error::SyntaxInvalidCommand(kind.to_string())),
        }
    }

    /// Parses CREATE TABLE statement
    fn parse_create(&mut self) -> Result<Command> {
        self.next_expect(TokenKind::Keyword(Keyword::Create))?;
        self.next_expect(TokenKind::Keyword(Keyword::Table))?;
        let table_name = self.next_plain_ident()?;
        self.next_expect(TokenKind::OpenParen)?;

        let mut columns = Vec::new();
        if self.current.kind != TokenKind::CloseParen {
            loop {
                columns.push(self.parse_column()?);
                if self.next_if(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.next_expect(TokenKind::CloseParen)?;
        self.next_expect(TokenKind::Semicolon)?;
        Ok(Command::Create {
            table_name,
            columns,
        })
    }

    /// Parses column definition in CREATE TABLE
    fn parse_column(&mut self) -> Result<Column> {
        let name = self.next_plain_ident()?;
        let datatype = match self.current.kind {
            TokenKind::Keyword(Keyword::Int) => DataType::Integer,
            TokenKind::Keyword(Keyword::Text) => DataType::String,
            _ => return Err(self.unexpected(&[
                TokenKind::Keyword(Keyword::Text),
                TokenKind::Keyword(Keyword::Int),
            ])),
        };
        self.advance();
        Ok(Column { name, datatype })
    }

    fn parse_drop(&mut self) -> Result<Command> {
        self.next_expect(TokenKind::Keyword(Keyword::Drop))?;
        self.next_expect(TokenKind::Keyword(Keyword::Table))?;
        let table_name = self.next_ident()?;
        self.next_expect(TokenKind::Semicolon)?;
        Ok(Command::Drop { table_name })
    }

    /// Parses INSERT statement
    fn parse_insert(&mut self) -> Result<Command> {
        self.next_expect(TokenKind::Keyword(Keyword::Insert))?;
        self.next_expect(TokenKind::Keyword(Keyword::Into))?;
        let table_name = self.next_ident()?;
        self.next_expect(TokenKind::Keyword(Keyword::Values))?;
        self.next_expect(TokenKind::OpenParen)?;

        let mut values = Vec::new();
        if self.current.kind != TokenKind::CloseParen {
            loop {
                values.push(self.parse_value()?);
                if self.next_if(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.next_expect(TokenKind::CloseParen)?;
        self.next_expect(TokenKind::Semicolon)?;
        Ok(Command::Insert { table_name, values })
    }

    /// Parses SELECT statement, its continuations are parsed as separate commands
    fn parse_select(&mut self) -> Result<Command> {
        self.next_expect(TokenKind::Keyword(Keyword::Select))?;
        let distinct = self.next_if(TokenKind::Keyword(Keyword::Distinct)).is_some();

        let projection = if self.next_if(TokenKind::Asterisk).is_some() {
            Projection::All
        } else {
            let mut items = Vec::new();
            loop {
                items.push(self.parse_select_item()?);
                if self.next_if(TokenKind::Comma).is_none() {
                    break;
                }
            }
            Projection::Items(items)
        };

        self.next_expect(TokenKind::Keyword(Keyword::From))?;
        let table_name = self.next_ident()?;
        let join = self.parse_join()?;
        self.next_statement_end()?;

        Ok(Command::Select(SelectCommand {
            table_name,
            projection,
            distinct,
            join,
        }))
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        if let TokenKind::Keyword(keyword) = self.current.kind {
            if let Some(func) = AggregateFunction::from_keyword(keyword) {
                self.advance();
                self.next_expect(TokenKind::OpenParen)?;
                let column = self.next_ident()?;
                self.next_expect(TokenKind::CloseParen)?;
                return Ok(SelectItem::Aggregate(func, column));
            }
        }
        match self.current.kind {
            TokenKind::Ident => Ok(SelectItem::Column(self.next_ident()?)),
            _ => Err(self.unexpected(&[
                TokenKind::Asterisk,
                TokenKind::Ident,
                TokenKind::Keyword(Keyword::Min),
                TokenKind::Keyword(Keyword::Max),
                TokenKind::Keyword(Keyword::Count),
                TokenKind::Keyword(Keyword::Sum),
                TokenKind::Keyword(Keyword::Avg),
            ])),
        }
    }

    /// Parses optional `[INNER|LEFT|RIGHT|FULL] JOIN table ON a EQUAL b`
    fn parse_join(&mut self) -> Result<Option<Join>> {
        let join_type = match self.current.kind {
            TokenKind::Keyword(Keyword::Join) => JoinType::Inner,
            TokenKind::Keyword(Keyword::Inner) => JoinType::Inner,
            TokenKind::Keyword(Keyword::Left) => JoinType::Left,
            TokenKind::Keyword(Keyword::Right) => JoinType::Right,
            TokenKind::Keyword(Keyword::Full) => JoinType::Full,
            _ => return Ok(None),
        };
        if self.next_if(TokenKind::Keyword(Keyword::Join)).is_none() {
            self.advance();
            self.next_expect(TokenKind::Keyword(Keyword::Join))?;
        }
        let table_name = self.next_ident()?;
        self.next_expect(TokenKind::Keyword(Keyword::On))?;
        let left = self.next_ident()?;
        self.next_expect(TokenKind::Keyword(Keyword::Equal))?;
        let right = self.next_ident()?;
        Ok(Some(Join {
            join_type,
            table_name,
            on: (left, right),
        }))
    }

    fn parse_where(&mut self) -> Result<Command> {
        self.check_predecessor(Keyword::Where)?;
        self.next_expect(TokenKind::Keyword(Keyword::Where))?;
        self.last_operator = None;
        let expr = self.parse_or_expression()?;
        self.next_statement_end()?;
        Ok(Command::Where(expr))
    }

    /// `and_expr (OR and_expr)*`
    fn parse_or_expression(&mut self) -> Result<Expression> {
        let mut expr = self.parse_and_expression()?;
        while self.next_if(TokenKind::Keyword(Keyword::Or)).is_some() {
            self.last_operator = Some(Keyword::Or);
            let right = self.parse_and_expression()?;
            expr = Expression::Or(Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    /// `unit (AND unit)*`
    fn parse_and_expression(&mut self) -> Result<Expression> {
        let mut expr = self.parse_expression_unit()?;
        while self.next_if(TokenKind::Keyword(Keyword::And)).is_some() {
            self.last_operator = Some(Keyword::And);
            let right = self.parse_expression_unit()?;
            expr = Expression::And(Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_expression_unit(&mut self) -> Result<Expression> {
        match self.current.kind {
            TokenKind::OpenParen => {
                self.advance();
                let expr = self.parse_or_expression()?;
                if self.next_if(TokenKind::CloseParen).is_none() {
                    return Err(self.expression_error());
                }
                Ok(expr)
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expression::Bool(true))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expression::Bool(false))
            }
            TokenKind::Ident => {
                let column = self.next_ident()?;
                match self.current.kind {
                    TokenKind::Keyword(Keyword::Equal) | TokenKind::Keyword(Keyword::Not) => {
                        let operator = if self.current.is_keyword(Keyword::Equal) {
                            CompareOperator::Equal
                        } else {
                            CompareOperator::NotEqual
                        };
                        self.advance();
                        let value = self.parse_value()?;
                        Ok(Expression::Compare {
                            column,
                            operator,
                            value,
                        })
                    }
                    TokenKind::Keyword(Keyword::In) | TokenKind::Keyword(Keyword::NotIn) => {
                        let operator = if self.current.is_keyword(Keyword::In) {
                            SetOperator::In
                        } else {
                            SetOperator::NotIn
                        };
                        self.advance();
                        self.next_expect(TokenKind::OpenParen)?;
                        let mut values = vec![self.parse_value()?];
                        while self.next_if(TokenKind::Comma).is_some() {
                            values.push(self.parse_value()?);
                        }
                        self.next_expect(TokenKind::CloseParen)?;
                        Ok(Expression::InSet {
                            column,
                            operator,
                            values,
                        })
                    }
                    _ => Err(self.unexpected(&[
                        TokenKind::Keyword(Keyword::Equal),
                        TokenKind::Keyword(Keyword::Not),
                        TokenKind::Keyword(Keyword::In),
                        TokenKind::Keyword(Keyword::NotIn),
                    ])),
                }
            }
            TokenKind::Illegal => Err(Error::IllegalCharacter(self.current.literal.clone())),
            _ => Err(self.expression_error()),
        }
    }

    fn expression_error(&self) -> Error {
        Error::LogicalExpressionParsing {
            after_token: self.last_operator.map(|k| k.to_string()),
        }
    }

    /// Parses `ORDER BY col (ASC|DESC) (, col (ASC|DESC))*`
    fn parse_order_by(&mut self) -> Result<Command> {
        self.check_predecessor(Keyword::Order)?;
        self.next_expect(TokenKind::Keyword(Keyword::Order))?;
        self.next_expect(TokenKind::Keyword(Keyword::By))?;

        let mut order_by = Vec::new();
        loop {
            let column = self.next_ident()?;
            let direction = match self.current.kind {
                TokenKind::Keyword(Keyword::Asc) => OrderDirection::Asc,
                TokenKind::Keyword(Keyword::Desc) => OrderDirection::Desc,
                _ => return Err(self.unexpected(&[
                    TokenKind::Keyword(Keyword::Asc),
                    TokenKind::Keyword(Keyword::Desc),
                ])),
            };
            self.advance();
            order_by.push((column, direction));
            if self.next_if(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.next_statement_end()?;
        Ok(Command::OrderBy(order_by))
    }

    fn parse_limit(&mut self) -> Result<Command> {
        self.check_predecessor(Keyword::Limit)?;
        self.next_expect(TokenKind::Keyword(Keyword::Limit))?;
        let limit = self.next_count("limit")?;
        self.next_statement_end()?;
        Ok(Command::Limit(limit))
    }

    fn parse_offset(&mut self) -> Result<Command> {
        self.check_predecessor(Keyword::Offset)?;
        self.next_expect(TokenKind::Keyword(Keyword::Offset))?;
        let offset = self.next_count("offset")?;
        self.next_statement_end()?;
        Ok(Command::Offset(offset))
    }

    /// Parses a non-negative integer; a leading minus is lexed as ILLEGAL
    fn next_count(&mut self, variable: &str) -> Result<usize> {
        match self.current.kind {
            TokenKind::Literal => {
                let token = self.next_expect(TokenKind::Literal)?;
                token
                    .literal
                    .parse()
                    .map_err(|_| Error::UnsupportedValueType(token.literal))
            }
            TokenKind::Illegal if self.current.literal == "-" => {
                Err(Error::ArithmeticLessThanZero(variable.to_string()))
            }
            _ => Err(self.unexpected(&[TokenKind::Literal])),
        }
    }

    /// Parses UPDATE statement, the WHERE is parsed as the next command
    fn parse_update(&mut self) -> Result<Command> {
        self.next_expect(TokenKind::Keyword(Keyword::Update))?;
        let table_name = self.next_ident()?;
        self.next_expect(TokenKind::Keyword(Keyword::Set))?;

        let mut assignments = Vec::new();
        loop {
            let column = self.next_ident()?;
            self.next_expect(TokenKind::Keyword(Keyword::To))?;
            let value = self.parse_value()?;
            assignments.push((column, value));
            if self.next_if(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.next_statement_end()?;
        Ok(Command::Update {
            table_name,
            assignments,
        })
    }

    /// Parses DELETE statement, a WHERE command must follow
    fn parse_delete(&mut self) -> Result<Command> {
        self.next_expect(TokenKind::Keyword(Keyword::Delete))?;
        self.next_expect(TokenKind::Keyword(Keyword::From))?;
        let table_name = self.next_ident()?;
        self.next_statement_end()?;
        Ok(Command::Delete { table_name })
    }

    /// Parses `LITERAL | NULL | ' token '`
    ///
    /// Any token kind between apostrophes is a string; it comes back as
    /// an IDENT-kind token.
    fn parse_value(&mut self) -> Result<Token> {
        match self.current.kind {
            TokenKind::Literal | TokenKind::Keyword(Keyword::Null) => {
                let token = self.current.clone();
                self.advance();
                Ok(token)
            }
            TokenKind::Apostrophe => {
                self.advance();
                if self.current.kind == TokenKind::Eof {
                    return Err(self.unexpected(&[TokenKind::Ident]));
                }
                let inner = self.current.clone();
                self.advance();
                if self.next_if(TokenKind::Apostrophe).is_none() {
                    return Err(Error::NoApostropheOnRight(inner.literal));
                }
                Ok(Token::ident(inner.literal))
            }
            TokenKind::Ident => Err(Error::NoApostropheOnLeft(self.current.literal.clone())),
            TokenKind::Illegal => Err(Error::IllegalCharacter(self.current.literal.clone())),
            _ => Err(self.unexpected(&[
                TokenKind::Literal,
                TokenKind::Keyword(Keyword::Null),
                TokenKind::Apostrophe,
            ])),
        }
    }

    /// Validates a continuation command against the commands in front of it
    fn check_predecessor(&self, command: Keyword) -> Result<()> {
        let Some(last) = self.commands.last() else {
            return Err(Error::NoPredecessor(command.to_string()));
        };
        // Continuations are only ever pushed behind an anchor
        let Some(anchor_pos) = self.commands.iter().rposition(|c| !c.is_continuation()) else {
            return Err(Error::NoPredecessor(command.to_string()));
        };
        let anchor = &self.commands[anchor_pos];
        let chain = &self.commands[anchor_pos + 1..];
        if !matches!(
            anchor,
            Command::Select(_) | Command::Update { .. } | Command::Delete { .. }
        ) {
            return Err(Error::NoPredecessor(command.to_string()));
        }

        let in_chain = |keyword: Keyword| chain.iter().any(|c| c.keyword() == keyword);
        let is_select = matches!(anchor, Command::Select(_));
        let (valid, predecessors): (bool, &[Keyword]) = match command {
            Keyword::Where => (
                !last.is_continuation(),
                &[Keyword::Select, Keyword::Update, Keyword::Delete],
            ),
            Keyword::Order => (
                is_select && matches!(last, Command::Select(_) | Command::Where(_)),
                &[Keyword::Select, Keyword::Where],
            ),
            Keyword::Limit => (
                is_select
                    && !in_chain(Keyword::Limit)
                    && !matches!(last, Command::Limit(_)),
                &[Keyword::Select, Keyword::Where, Keyword::Order, Keyword::Offset],
            ),
            Keyword::Offset => (
                is_select
                    && !in_chain(Keyword::Offset)
                    && !matches!(last, Command::Offset(_)),
                &[Keyword::Select, Keyword::Where, Keyword::Order, Keyword::Limit],
            ),
            other => return Err(Error::UnsupportedCommandTypeFromParser(other.to_string())),
        };

        if valid {
            Ok(())
        } else {
            Err(Error::SyntaxCommandExpected {
                command: command.to_string(),
                predecessors: predecessors.iter().map(|k| k.to_string()).collect(),
            })
        }
    }

    fn delete_without_where() -> Error {
        Error::SyntaxCommandMissing {
            command: Keyword::Delete.to_string(),
            successors: vec![Keyword::Where.to_string()],
        }
    }

    /// Ends a chainable statement: `;`, or a continuation keyword left in place
    fn next_statement_end(&mut self) -> Result<()> {
        if self.next_if(TokenKind::Semicolon).is_some() {
            return Ok(());
        }
        if CONTINUATIONS.iter().any(|k| self.current.is_keyword(*k)) {
            return Ok(());
        }
        let mut expecting = vec![TokenKind::Semicolon];
        expecting.extend(CONTINUATIONS.iter().map(|k| TokenKind::Keyword(*k)));
        Err(self.unexpected(&expecting))
    }

    /// Moves the look-ahead window one token forward
    fn advance(&mut self) {
        let next = self.lexer.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    /// Error for the current token, given what would have been accepted
    fn unexpected(&self, expecting: &[TokenKind]) -> Error {
        if self.current.kind == TokenKind::Illegal {
            return Error::IllegalCharacter(self.current.literal.clone());
        }
        Error::Syntax {
            expecting: expecting.iter().map(|k| k.to_string()).collect(),
            got: self.current.kind.to_string(),
        }
    }

    /// Expects and consumes an identifier
    fn next_ident(&mut self) -> Result<String> {
        Ok(self.next_expect(TokenKind::Ident)?.literal)
    }

    /// Expects an identifier without `.`, as table and column names in CREATE
    fn next_plain_ident(&mut self) -> Result<String> {
        let ident = self.next_ident()?;
        if ident.contains('.') {
            return Err(Error::IllegalPeriodInIdent(ident));
        }
        Ok(ident)
    }

    /// Expects a specific token kind, returns error if different
    fn next_expect(&mut self, expect: TokenKind) -> Result<Token> {
        if self.current.kind != expect {
            return Err(self.unexpected(&[expect]));
        }
        let token = self.current.clone();
        self.advance();
        Ok(token)
    }

    /// Consumes the current token if it is of the given kind
    fn next_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.current.kind != kind {
            return None;
        }
        let token = self.current.clone();
        self.advance();
        Some(token)
    }
}
