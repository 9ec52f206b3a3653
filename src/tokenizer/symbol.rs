//! # Symbol Token Handling
//!
//! The expression language has exactly four operators and three delimiters. Any other
//! punctuation (`%`, `<`, `=`, `&`, ...) fails to tokenize, which rejects the expression.

use strum_macros::{AsRefStr, Display, EnumString};

use nom::{
    branch::alt,
    combinator::{map, value},
    character::complete::char,
    error::context,
};

use super::token::{ParserResult, Token};

/// Arithmetic operators. `+` and `-` are also the unary sign operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Operator {
    /// Addition or unary plus (`+`)
    #[strum(serialize = "+")]
    Plus,
    /// Subtraction or negation (`-`)
    #[strum(serialize = "-")]
    Minus,
    /// Multiplication (`*`)
    #[strum(serialize = "*")]
    Multiply,
    /// Division (`/`)
    #[strum(serialize = "/")]
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr)]
pub enum Delimiter {
    /// Opening parenthesis (`(`) for grouping and calls
    #[strum(serialize = "(")]
    OpenParen,
    /// Closing parenthesis (`)`)
    #[strum(serialize = ")")]
    CloseParen,
    /// Argument separator (`,`)
    #[strum(serialize = ",")]
    Comma,
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        map(
            alt((
                value(Operator::Plus, char('+')),
                value(Operator::Minus, char('-')),
                value(Operator::Multiply, char('*')),
                value(Operator::Divide, char('/')),
            )),
            Token::Operator,
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        map(
            alt((
                value(Delimiter::OpenParen, char('(')),
                value(Delimiter::CloseParen, char(')')),
                value(Delimiter::Comma, char(',')),
            )),
            Token::Delimiter,
        ),
    )(input)
}
