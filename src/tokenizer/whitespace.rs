//! # Whitespace Token Handling
//!
//! Whitespace is kept as a token so error spans point at the right column; the
//! analyzer drops it before parsing.

use nom::{bytes::complete::take_while1, combinator::map, error::context};

use super::token::{ParserResult, Token};

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<Token> {
    context(
        "whitespace",
        map(take_while1(char::is_whitespace), |ws: &str| {
            Token::Whitespace(ws.to_string())
        }),
    )(input)
}
