//! SQL Lexer - Tokenizes query text into a stream of `(kind, literal)` tokens

use std::fmt::Display;

/// Represents a single lexical token in the query text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Original (upper-cased) text of the token
    pub literal: String,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>) -> Self {
        Self {
            kind,
            literal: literal.into(),
        }
    }

    pub fn keyword(keyword: Keyword) -> Self {
        Self::new(TokenKind::Keyword(keyword), keyword.to_str())
    }

    pub fn ident(literal: impl Into<String>) -> Self {
        Self::new(TokenKind::Ident, literal)
    }

    pub fn literal(literal: impl Into<String>) -> Self {
        Self::new(TokenKind::Literal, literal)
    }

    pub fn eof() -> Self {
        Self::new(TokenKind::Eof, "")
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

/// Token categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Asterisk,
    Comma,
    Semicolon,
    OpenParen,
    CloseParen,
    Apostrophe,
    /// Identifier such as table name or column name
    Ident,
    /// Numeric literal
    Literal,
    Eof,
    Illegal,
    /// Reserved keyword
    Keyword(Keyword),
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TokenKind::Asterisk => "ASTERISK",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::OpenParen => "LPAREN",
            TokenKind::CloseParen => "RPAREN",
            TokenKind::Apostrophe => "APOSTROPHE",
            TokenKind::Ident => "IDENT",
            TokenKind::Literal => "LITERAL",
            TokenKind::Eof => "EOF",
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Keyword(keyword) => keyword.to_str(),
        })
    }
}

/// Reserved keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // DDL keywords
    Create,
    Table,
    Drop,
    // Data type keywords
    Text,
    Int,
    // DML keywords
    Insert,
    Into,
    Values,
    Null,
    Select,
    Distinct,
    From,
    Update,
    Set,
    To,
    Delete,
    // Condition keywords
    Where,
    And,
    Or,
    Not,
    Equal,
    In,
    NotIn,
    True,
    False,
    // Continuation keywords
    Order,
    By,
    Asc,
    Desc,
    Limit,
    Offset,
    // Join keywords
    Join,
    Inner,
    Left,
    Right,
    Full,
    On,
    // Aggregate functions
    Min,
    Max,
    Count,
    Sum,
    Avg,
}

impl Keyword {
    /// Looks up an (already upper-cased) identifier run in the keyword table
    pub fn from_str(ident: &str) -> Option<Keyword> {
        Some(match ident {
            "CREATE" => Keyword::Create,
            "TABLE" => Keyword::Table,
            "DROP" => Keyword::Drop,
            "TEXT" => Keyword::Text,
            "INT" => Keyword::Int,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "VALUES" => Keyword::Values,
            "NULL" => Keyword::Null,
            "SELECT" => Keyword::Select,
            "DISTINCT" => Keyword::Distinct,
            "FROM" => Keyword::From,
            "UPDATE" => Keyword::Update,
            "SET" => Keyword::Set,
            "TO" => Keyword::To,
            "DELETE" => Keyword::Delete,
            "WHERE" => Keyword::Where,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "EQUAL" => Keyword::Equal,
            "IN" => Keyword::In,
            "NOTIN" => Keyword::NotIn,
            "TRUE" => Keyword::True,
            "FALSE" => Keyword::False,
            "ORDER" => Keyword::Order,
            "BY" => Keyword::By,
            "ASC" => Keyword::Asc,
            "DESC" => Keyword::Desc,
            "LIMIT" => Keyword::Limit,
            "OFFSET" => Keyword::Offset,
            "JOIN" => Keyword::Join,
            "INNER" => Keyword::Inner,
            "LEFT" => Keyword::Left,
            "RIGHT" => Keyword::Right,
            "FULL" => Keyword::Full,
            "ON" => Keyword::On,
            "MIN" => Keyword::Min,
            "MAX" => Keyword::Max,
            "COUNT" => Keyword::Count,
            "SUM" => Keyword::Sum,
            "AVG" => Keyword::Avg,
            _ => return None,
        })
    }

    /// Returns the uppercase string representation of the keyword
    pub fn to_str(&self) -> &'static str {
        match self {
            Keyword::Create => "CREATE",
            Keyword::Table => "TABLE",
            Keyword::Drop => "DROP",
            Keyword::Text => "TEXT",
            Keyword::Int => "INT",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Null => "NULL",
            Keyword::Select => "SELECT",
            Keyword::Distinct => "DISTINCT",
            Keyword::From => "FROM",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::To => "TO",
            Keyword::Delete => "DELETE",
            Keyword::Where => "WHERE",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::Equal => "EQUAL",
            Keyword::In => "IN",
            Keyword::NotIn => "NOTIN",
            Keyword::True => "TRUE",
            Keyword::False => "FALSE",
            Keyword::Order => "ORDER",
            Keyword::By => "BY",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Limit => "LIMIT",
            Keyword::Offset => "OFFSET",
            Keyword::Join => "JOIN",
            Keyword::Inner => "INNER",
            Keyword::Left => "LEFT",
            Keyword::Right => "RIGHT",
            Keyword::Full => "FULL",
            Keyword::On => "ON",
            Keyword::Min => "MIN",
            Keyword::Max => "MAX",
            Keyword::Count => "COUNT",
            Keyword::Sum => "SUM",
            Keyword::Avg => "AVG",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Lexical analyzer over an upper-cased copy of the input
///
/// `next_token` is total: once the input is exhausted (or a zero byte is
/// met) it keeps returning `EOF`. As an `Iterator` the lexer yields the
/// first `EOF` and then stops.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    done: bool,
}

impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.done = true;
        }
        Some(token)
    }
}

impl Lexer {
    /// Creates a new lexer for the given text
    ///
    /// The whole buffer is folded to upper case, including the contents of
    /// apostrophe-delimited values.
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.to_uppercase().chars().collect(),
            pos: 0,
            done: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Consumes the next character if it satisfies the predicate
    fn next_if<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<char> {
        let c = self.peek().filter(|&c| predicate(c))?;
        self.pos += 1;
        Some(c)
    }

    /// Consumes consecutive characters while they satisfy the predicate
    fn next_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> String {
        let mut value = String::new();
        while let Some(c) = self.next_if(&predicate) {
            value.push(c);
        }
        value
    }

    /// Removes whitespace from the input stream
    fn erase_whitespace(&mut self) {
        self.next_while(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    }

    /// Scans and returns the next token
    pub fn next_token(&mut self) -> Token {
        self.erase_whitespace();
        match self.peek() {
            None | Some('\0') => Token::eof(),
            Some(c) if c.is_ascii_digit() => self.scan_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.scan_ident(),
            Some(c) => {
                self.pos += 1;
                Self::scan_symbol(c)
            }
        }
    }

    /// Scans a numeric literal (digits only)
    fn scan_number(&mut self) -> Token {
        Token::literal(self.next_while(|c| c.is_ascii_digit()))
    }

    /// Scans an identifier or keyword; `.` is allowed after the first character
    fn scan_ident(&mut self) -> Token {
        let val = self.next_while(|c| c.is_alphanumeric() || c == '_' || c == '.');
        match Keyword::from_str(&val) {
            Some(keyword) => Token::new(TokenKind::Keyword(keyword), val),
            None => Token::ident(val),
        }
    }

    /// Maps a single-character symbol to its token
    fn scan_symbol(c: char) -> Token {
        let kind = match c {
            '*' => TokenKind::Asterisk,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            '\'' => TokenKind::Apostrophe,
            _ => TokenKind::Illegal,
        };
        Token::new(kind, c.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{Keyword, Lexer, Token, TokenKind};

    fn kinds(text: &str) -> Vec<TokenKind> {
        Lexer::new(text).map(|t| t.kind).collect()
    }

    #[test]
    fn test_lexer_create_table() {
        let tokens = Lexer::new(
            "CREATE table tbl
                (
                    one TEXT,
                    two int
                );
                ",
        )
        .collect::<Vec<_>>();

        assert_eq!(
            tokens,
            vec![
                Token::keyword(Keyword::Create),
                Token::keyword(Keyword::Table),
                Token::ident("TBL"),
                Token::new(TokenKind::OpenParen, "("),
                Token::ident("ONE"),
                Token::keyword(Keyword::Text),
                Token::new(TokenKind::Comma, ","),
                Token::ident("TWO"),
                Token::keyword(Keyword::Int),
                Token::new(TokenKind::CloseParen, ")"),
                Token::new(TokenKind::Semicolon, ";"),
                Token::eof(),
            ]
        );
    }

    #[test]
    fn test_lexer_insert_into() {
        let tokens = Lexer::new("insert into tbl values ('hello', 10, NULL);").collect::<Vec<_>>();

        assert_eq!(
            tokens,
            vec![
                Token::keyword(Keyword::Insert),
                Token::keyword(Keyword::Into),
                Token::ident("TBL"),
                Token::keyword(Keyword::Values),
                Token::new(TokenKind::OpenParen, "("),
                Token::new(TokenKind::Apostrophe, "'"),
                Token::ident("HELLO"),
                Token::new(TokenKind::Apostrophe, "'"),
                Token::new(TokenKind::Comma, ","),
                Token::literal("10"),
                Token::new(TokenKind::Comma, ","),
                Token::keyword(Keyword::Null),
                Token::new(TokenKind::CloseParen, ")"),
                Token::new(TokenKind::Semicolon, ";"),
                Token::eof(),
            ]
        );
    }

    #[test]
    fn test_lexer_quoted_keyword_stays_keyword() {
        assert_eq!(
            kinds("'create'"),
            vec![
                TokenKind::Apostrophe,
                TokenKind::Keyword(Keyword::Create),
                TokenKind::Apostrophe,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_qualified_ident() {
        let tokens = Lexer::new("books.author_id EQUAL authors.id").collect::<Vec<_>>();
        assert_eq!(tokens[0], Token::ident("BOOKS.AUTHOR_ID"));
        assert_eq!(tokens[1], Token::keyword(Keyword::Equal));
        assert_eq!(tokens[2], Token::ident("AUTHORS.ID"));
    }

    #[test]
    fn test_lexer_illegal_and_negative() {
        let tokens = Lexer::new("LIMIT -1;").collect::<Vec<_>>();
        assert_eq!(tokens[1], Token::new(TokenKind::Illegal, "-"));
        assert_eq!(tokens[2], Token::literal("1"));

        assert_eq!(kinds("a = b")[1], TokenKind::Illegal);
    }

    #[test]
    fn test_lexer_is_total() {
        let mut lexer = Lexer::new("SELECT");
        assert!(lexer.next_token().is_keyword(Keyword::Select));
        for _ in 0..3 {
            assert_eq!(lexer.next_token(), Token::eof());
        }

        // A zero byte ends the stream
        let mut lexer = Lexer::new("DROP\0TABLE");
        assert!(lexer.next_token().is_keyword(Keyword::Drop));
        assert_eq!(lexer.next_token(), Token::eof());
        assert_eq!(lexer.next_token(), Token::eof());

        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds(" \t\r\n"), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_lexer_keywords_case_insensitive() {
        assert_eq!(
            kinds("select DiStInCt min(a) from t notin"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Keyword(Keyword::Distinct),
                TokenKind::Keyword(Keyword::Min),
                TokenKind::OpenParen,
                TokenKind::Ident,
                TokenKind::CloseParen,
                TokenKind::Keyword(Keyword::From),
                TokenKind::Ident,
                TokenKind::Keyword(Keyword::NotIn),
                TokenKind::Eof,
            ]
        );
    }
}
