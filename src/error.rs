/// Custom Result type for memdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for memdb
///
/// Messages are stable: hosts and tests match on the rendered text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    // Lexical
    /// A character the tokenizer does not recognise
    #[error("syntax error, illegal character: {{{0}}}")]
    IllegalCharacter(String),

    // Syntactic
    /// Unexpected token, with the set of tokens that would have been accepted
    #[error("syntax error, expecting: {{{}}}, got: {{{got}}}", .expecting.join(", "))]
    Syntax { expecting: Vec<String>, got: String },
    /// A statement starts with a token that begins no command
    #[error("syntax error, invalid command found: {{{0}}}")]
    SyntaxInvalidCommand(String),
    /// A continuation command follows the wrong kind of command
    #[error("syntax error, {{{command}}} command needs {{{}}} before", .predecessors.join(", "))]
    SyntaxCommandExpected {
        command: String,
        predecessors: Vec<String>,
    },
    /// A command is missing a mandatory continuation
    #[error("syntax error, {{{command}}} command needs {{{}}} after", .successors.join(", "))]
    SyntaxCommandMissing {
        command: String,
        successors: Vec<String>,
    },
    /// A continuation command with no anchor command in front of it
    #[error("syntax error, {{{0}}} command can't be used without predecessor")]
    NoPredecessor(String),
    #[error("syntax error, {{{0}}} shouldn't contain '.'")]
    IllegalPeriodInIdent(String),
    #[error("syntax error, identifier: {{{0}}} has no apostrophe on the left")]
    NoApostropheOnLeft(String),
    #[error("syntax error, identifier: {{{0}}} has no apostrophe on the right")]
    NoApostropheOnRight(String),
    /// Incomplete logical expression, annotated with the last binary operator seen
    #[error("syntax error, logical expression error{}", .after_token.as_ref().map(|t| format!(" after {{{t}}}")).unwrap_or_default())]
    LogicalExpressionParsing { after_token: Option<String> },
    #[error("syntax error, {{{0}}} value should be more than 0")]
    ArithmeticLessThanZero(String),

    // Semantic
    #[error("table with the name of {0} already exists")]
    TableAlreadyExists(String),
    #[error("table with the name of {0} doesn't exist")]
    TableDoesNotExist(String),
    #[error("column with the name of {column} doesn't exist in table {table}")]
    ColumnDoesNotExist { table: String, column: String },
    #[error("column with the name of {column} is declared twice in table {table}")]
    DuplicateColumn { table: String, column: String },
    #[error("invalid number of parameters in {command} command, should be: {expected}, but got: {actual}")]
    InvalidNumberOfParameters {
        expected: usize,
        actual: usize,
        command: String,
    },
    #[error("invalid value type in {command} command, should be: {expected}, but got: {actual}")]
    InvalidValueType {
        expected: String,
        actual: String,
        command: String,
    },
    #[error("unsupported value type found: {0}")]
    UnsupportedValueType(String),
    #[error("unsupported operation token: {0}")]
    UnsupportedOperationToken(String),
    #[error("unsupported conditional token: {0}")]
    UnsupportedConditionalToken(String),
    #[error("unsupported expression type: {0}")]
    UnsupportedExpressionType(String),
    #[error("unsupported command type from parser: {0}")]
    UnsupportedCommandTypeFromParser(String),

    // Driver
    /// Reading a script or a stream failed
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}
