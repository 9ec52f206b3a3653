//! Expression grammar over [`Token`]s.
//!
//! ```text
//! expression     := additive
//! additive       := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := unary (("*" | "/") unary)*
//! unary          := ("+" | "-") unary | primary
//! primary        := call | literal | identifier | "(" expression ")"
//! call           := identifier "(" (expression ("," expression)*)? ")"
//! ```
//!
//! Binary operators are left-associative. Call names are not checked here; the
//! evaluator decides which calls exist.

use crate::tokenizer::{
    literal::Literal,
    symbol::{Delimiter, Operator},
    token::Token,
};

use super::{ast, prelude::*, ParseError, Parser};

/// Parses a whole token stream as a single expression.
///
/// Tokens left over after the expression are an error, so `x y` or `(1))` are
/// rejected rather than truncated.
#[tracing::instrument(level = "debug", skip(tokens))]
pub fn parse(tokens: &[Token]) -> Result<ast::Expression, ParseError> {
    let (pos, expr) = parse_expression().parse(tokens, 0)?;
    match tokens.get(pos) {
        None => Ok(expr),
        Some(token) => Err(ParseError::ParseError {
            message: "unexpected trailing token".to_string(),
            found: token.to_string(),
            position: pos,
        }),
    }
}

pub fn parse_expression() -> impl Parser<Token, ast::Expression> {
    with_context(parse_additive(), "expression")
}

fn fold_binary(
    (first, rest): (ast::Expression, Vec<(ast::BinaryOperator, ast::Expression)>),
) -> ast::Expression {
    rest.into_iter()
        .fold(first, |left, (op, right)| ast::Expression::binary(op, left, right))
}

fn parse_additive() -> impl Parser<Token, ast::Expression> {
    with_context(
        map(
            tuple2(
                parse_multiplicative(),
                many(tuple2(
                    choice(vec![
                        Box::new(parse_operator_add()),
                        Box::new(parse_operator_subtract()),
                    ]),
                    parse_multiplicative(),
                )),
            ),
            fold_binary,
        ),
        "additive",
    )
}

// 乗除算 (*, /)
fn parse_multiplicative() -> impl Parser<Token, ast::Expression> {
    with_context(
        map(
            tuple2(
                parse_unary(),
                many(tuple2(
                    choice(vec![
                        Box::new(parse_operator_multiply()),
                        Box::new(parse_operator_divide()),
                    ]),
                    parse_unary(),
                )),
            ),
            fold_binary,
        ),
        "multiplicative",
    )
}

fn parse_unary() -> impl Parser<Token, ast::Expression> {
    with_context(
        choice(vec![
            Box::new(map(
                tuple2(parse_operator_sign(), lazy(parse_unary)),
                |(op, operand)| ast::Expression::unary(op, operand),
            )),
            Box::new(parse_primary()),
        ]),
        "unary",
    )
}

fn parse_operator_sign() -> impl Parser<Token, ast::UnaryOperator> {
    satisfy(|token| match token {
        Token::Operator(Operator::Plus) => Some(ast::UnaryOperator::Plus),
        Token::Operator(Operator::Minus) => Some(ast::UnaryOperator::Minus),
        _ => None,
    })
}

fn parse_primary() -> impl Parser<Token, ast::Expression> {
    with_context(
        choice(vec![
            Box::new(parse_function_call()),
            Box::new(map(parse_literal(), ast::Expression::Literal)),
            Box::new(map(parse_identifier(), ast::Expression::Variable)),
            Box::new(parse_parenthesized()),
        ]),
        "primary",
    )
}

fn parse_parenthesized() -> impl Parser<Token, ast::Expression> {
    with_context(
        delimited(
            parse_open_paren(),
            lazy(parse_expression),
            parse_close_paren(),
        ),
        "parenthesized expression",
    )
}

fn parse_function_call() -> impl Parser<Token, ast::Expression> {
    with_context(
        map(
            tuple2(
                parse_identifier(),
                delimited(
                    parse_open_paren(),
                    separated_list(lazy(parse_expression), parse_comma()),
                    parse_close_paren(),
                ),
            ),
            |(function, arguments)| ast::Expression::FunctionCall {
                function,
                arguments,
            },
        ),
        "function call",
    )
}

fn parse_literal() -> impl Parser<Token, ast::Literal> {
    satisfy(|token| match token {
        Token::Literal(Literal::Number(n)) => Some(ast::Literal::Number(*n)),
        Token::Literal(Literal::String(s)) => Some(ast::Literal::String(s.clone())),
        _ => None,
    })
}

fn parse_identifier() -> impl Parser<Token, String> {
    with_context(
        satisfy(|token| match token {
            Token::Identifier(s) => Some(s.clone()),
            _ => None,
        }),
        "identifier",
    )
}

fn parse_operator_add() -> impl Parser<Token, ast::BinaryOperator> {
    map(equal(Token::Operator(Operator::Plus)), |_| {
        ast::BinaryOperator::Add
    })
}

fn parse_operator_subtract() -> impl Parser<Token, ast::BinaryOperator> {
    map(equal(Token::Operator(Operator::Minus)), |_| {
        ast::BinaryOperator::Subtract
    })
}

fn parse_operator_multiply() -> impl Parser<Token, ast::BinaryOperator> {
    map(equal(Token::Operator(Operator::Multiply)), |_| {
        ast::BinaryOperator::Multiply
    })
}

fn parse_operator_divide() -> impl Parser<Token, ast::BinaryOperator> {
    map(equal(Token::Operator(Operator::Divide)), |_| {
        ast::BinaryOperator::Divide
    })
}

fn parse_open_paren() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::OpenParen))
}

fn parse_close_paren() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::CloseParen))
}

fn parse_comma() -> impl Parser<Token, Token> {
    equal(Token::Delimiter(Delimiter::Comma))
}
