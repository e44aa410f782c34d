use std::{cmp::Ordering, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    sql::parser::lexer::{Keyword, Token, TokenKind},
};

/// Supported column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    String,
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DataType::Integer => "INT",
            DataType::String => "TEXT",
        })
    }
}

/// Runtime value stored in a column cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    String(String),
}

impl Value {
    /// Maps a value token to a Value
    ///
    /// `LITERAL` becomes an integer, an apostrophe-delimited value (an
    /// `IDENT`-kind token after parsing) a string and `NULL` a null.
    pub fn from_token(token: &Token) -> Result<Self> {
        match token.kind {
            TokenKind::Literal => token
                .literal
                .parse()
                .map(Value::Integer)
                .map_err(|_| Error::UnsupportedValueType(token.literal.clone())),
            TokenKind::Ident => Ok(Value::String(token.literal.clone())),
            TokenKind::Keyword(Keyword::Null) => Ok(Value::Null),
            kind => Err(Error::UnsupportedValueType(kind.to_string())),
        }
    }

    /// Returns the data type of the value, or None if it's Null
    pub fn datatype(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Integer(_) => Some(DataType::Integer),
            Self::String(_) => Some(DataType::String),
        }
    }

    /// Type name used in diagnostics
    pub fn type_name(&self) -> String {
        self.datatype()
            .map_or_else(|| "NULL".to_string(), |dt| dt.to_string())
    }

    /// Whether the value may be stored in a column of `datatype`
    pub fn fits(&self, datatype: DataType) -> bool {
        self.datatype().is_none_or(|dt| dt == datatype)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "'{}'", v),
        }
    }
}

/// Null sorts equal to Null and before everything else; values of
/// different types are incomparable.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (_, _) => None,
        }
    }
}

/// A row is a vector of values
pub type Row = Vec<Value>;

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::{DataType, Value};
    use crate::{
        error::{Error, Result},
        sql::parser::lexer::{Keyword, Token, TokenKind},
    };

    #[test]
    fn test_value_from_token() -> Result<()> {
        assert_eq!(Value::from_token(&Token::literal("10"))?, Value::Integer(10));
        assert_eq!(
            Value::from_token(&Token::ident("HELLO"))?,
            Value::String("HELLO".into())
        );
        assert_eq!(Value::from_token(&Token::keyword(Keyword::Null))?, Value::Null);
        assert_eq!(
            Value::from_token(&Token::new(TokenKind::Asterisk, "*")),
            Err(Error::UnsupportedValueType("ASTERISK".into()))
        );
        assert_eq!(
            Value::from_token(&Token::literal("99999999999999999999")),
            Err(Error::UnsupportedValueType("99999999999999999999".into()))
        );
        Ok(())
    }

    #[test]
    fn test_value_ordering() {
        assert_eq!(
            Value::Null.partial_cmp(&Value::Null),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::Null.partial_cmp(&Value::Integer(-5)),
            Some(Ordering::Less)
        );
        assert!(Value::Integer(1) < Value::Integer(2));
        assert!(Value::String("B".into()) > Value::String("A".into()));
        assert_eq!(
            Value::Integer(1).partial_cmp(&Value::String("1".into())),
            None
        );
    }

    #[test]
    fn test_value_rendering_and_types() {
        assert_eq!(Value::String("HELLO".into()).to_string(), "'HELLO'");
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Null.to_string(), "NULL");

        assert!(Value::Null.fits(DataType::Integer));
        assert!(Value::Integer(1).fits(DataType::Integer));
        assert!(!Value::Integer(1).fits(DataType::String));
        assert_eq!(Value::Null.type_name(), "NULL");
        assert_eq!(Value::String("x".into()).type_name(), "TEXT");
    }
}
