//! # Literal Token Handling
//!
//! Numeric literals are kept exact: the matched text is converted straight into a
//! [`Decimal`], never through a binary float. Accepted forms are `42`, `3.14`, `.5`,
//! `5.`, `1e3`, `2.5E-2` and `1_000` (underscores separate digit groups).
//!
//! A literal written with a point or an exponent is fractional and prints in its
//! shortest form with at least one decimal (`5.` is `5.0`, `1e3` is `1000.0`, `2.50` is
//! `2.5`); integer literals print as written. The value is the same either way; only
//! `len()` of a literal can tell.
//!
//! String literals are quoted with `"` or `'` and support the escapes `\\`, `\"`,
//! `\'`, `\n` and `\t`.

use nom::{
    branch::alt,
    bytes::complete::is_not,
    character::complete::{char, digit1, one_of},
    combinator::{map, map_opt, opt, recognize, value},
    error::context,
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
};
use rust_decimal::Decimal;

use super::token::{ParserResult, Token};
use crate::numeric::parse_decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(Decimal),
    String(String),
}

fn digits(input: &str) -> ParserResult<&str> {
    recognize(pair(digit1, many0(pair(opt(char('_')), digit1))))(input)
}

fn exponent(input: &str) -> ParserResult<&str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn number_from_text(text: &str) -> Option<Decimal> {
    let value = parse_decimal(&text.replace('_', ""))?;
    if !text.contains(['.', 'e', 'E']) {
        return Some(value);
    }
    let mut value = value.normalize();
    if value.scale() == 0 {
        value.rescale(1);
    }
    Some(value)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_number_literal(input: &str) -> ParserResult<Literal> {
    context(
        "number literal",
        map_opt(
            alt((
                recognize(tuple((
                    digits,
                    opt(pair(char('.'), opt(digits))),
                    opt(exponent),
                ))),
                recognize(tuple((char('.'), digits, opt(exponent)))),
            )),
            |text: &str| number_from_text(text).map(Literal::Number),
        ),
    )(input)
}

fn escape(input: &str) -> ParserResult<&str> {
    preceded(
        char('\\'),
        alt((
            value("\\", char('\\')),
            value("\"", char('"')),
            value("'", char('\'')),
            value("\n", char('n')),
            value("\t", char('t')),
        )),
    )(input)
}

fn quoted(quote: char, stop: &'static str) -> impl FnMut(&str) -> ParserResult<String> {
    move |input| {
        map(
            delimited(char(quote), many0(alt((is_not(stop), escape))), char(quote)),
            |parts: Vec<&str>| parts.concat(),
        )(input)
    }
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_string_literal(input: &str) -> ParserResult<Literal> {
    context(
        "string literal",
        map(
            alt((quoted('"', "\"\\"), quoted('\'', "'\\"))),
            Literal::String,
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((parse_string_literal, parse_number_literal)),
            Token::Literal,
        ),
    )(input)
}
