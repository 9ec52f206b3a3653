use thiserror::Error;

// パーサートレイト
pub trait Parser<I, O> {
    fn parse(&self, input: &[I], pos: usize) -> ParseResult<O>;
}

pub type ParseResult<O> = Result<(usize, O), ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error: {message}, found `{found}` at token {position}")]
    ParseError {
        message: String,
        found: String,
        position: usize,
    },
    #[error("Unexpected end of expression")]
    EOF,
    #[error("Unexpected token at {0}")]
    Unexpected(usize),
    #[error("No alternative")]
    NoAlternative,
    #[error("Fail: {0}")]
    Fail(String),
    #[error("{message}: {inner}")]
    WithContext {
        message: String,
        inner: Box<ParseError>,
    },
}

impl ParseError {
    /// Innermost error beneath any context wrappers.
    pub fn root(&self) -> &ParseError {
        match self {
            ParseError::WithContext { inner, .. } => inner.root(),
            other => other,
        }
    }
}
