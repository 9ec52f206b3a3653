use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use tracing::debug;

use super::value::{Bindings, Value};
use crate::analyzer::{self, ParseError};
use crate::ast::{BinaryOperator, Expression, Literal, UnaryOperator};
use crate::tokenizer::{tokenize, TokenizerError};

/// Fractional digits of a reported answer.
pub const ANSWER_SCALE: u32 = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

impl From<TokenizerError> for EvalError {
    fn from(err: TokenizerError) -> Self {
        EvalError::UnsupportedExpression(err.to_string())
    }
}

impl From<ParseError> for EvalError {
    fn from(err: ParseError) -> Self {
        EvalError::UnsupportedExpression(err.to_string())
    }
}

/// Tree-walking interpreter over the closed expression grammar.
///
/// Numbers stay exact throughout. `len` is the only callable name; every other
/// call is rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn eval_expression(&self, expr: &Expression, bindings: &Bindings) -> EvalResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(Self::eval_literal(lit)),
            Expression::Variable(name) => Self::eval_variable(name, bindings),
            Expression::FunctionCall {
                function,
                arguments,
            } => self.eval_function_call(function, arguments, bindings),
            Expression::BinaryOp { op, left, right } => {
                self.eval_binary_op(op, left, right, bindings)
            }
            Expression::UnaryOp { op, operand } => self.eval_unary_op(op, operand, bindings),
        }
    }

    fn eval_literal(lit: &Literal) -> Value {
        match lit {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::Text(s.clone()),
        }
    }

    fn eval_variable(name: &str, bindings: &Bindings) -> EvalResult<Value> {
        bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownVariable(name.to_string()))
    }

    // 関数呼び出しの評価
    fn eval_function_call(
        &self,
        function: &str,
        arguments: &[Expression],
        bindings: &Bindings,
    ) -> EvalResult<Value> {
        match (function, arguments) {
            ("len", [argument]) => {
                let value = self.eval_expression(argument, bindings)?;
                Ok(Value::Number(value.char_count()))
            }
            ("len", _) => Err(EvalError::UnsupportedExpression(format!(
                "len takes exactly one argument, got {}",
                arguments.len()
            ))),
            _ => Err(EvalError::UnsupportedExpression(format!(
                "unknown function: {}",
                function
            ))),
        }
    }

    // 二項演算の評価
    fn eval_binary_op(
        &self,
        op: &BinaryOperator,
        left: &Expression,
        right: &Expression,
        bindings: &Bindings,
    ) -> EvalResult<Value> {
        let l = self.eval_expression(left, bindings)?.to_decimal();
        let r = self.eval_expression(right, bindings)?.to_decimal();

        let result = match op {
            BinaryOperator::Add => l.checked_add(r),
            BinaryOperator::Subtract => l.checked_sub(r),
            BinaryOperator::Multiply => l.checked_mul(r),
            BinaryOperator::Divide => {
                if r.is_zero() {
                    return Err(EvalError::DivisionByZero);
                }
                l.checked_div(r)
            }
        };

        result
            .map(Value::Number)
            .ok_or_else(|| EvalError::Overflow(format!("{} {} {}", l, op, r)))
    }

    fn eval_unary_op(
        &self,
        op: &UnaryOperator,
        operand: &Expression,
        bindings: &Bindings,
    ) -> EvalResult<Value> {
        let value = self.eval_expression(operand, bindings)?.to_decimal();
        Ok(Value::Number(match op {
            UnaryOperator::Plus => value,
            UnaryOperator::Minus => -value,
        }))
    }
}

/// Rounds to [`ANSWER_SCALE`] places, ties away from zero, always carrying
/// exactly that many fractional digits.
pub fn round_answer(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(ANSWER_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(ANSWER_SCALE);
    rounded
}

/// Tokenizes, parses and evaluates `expression` without the final rounding.
pub fn evaluate_unrounded(expression: &str, bindings: &Bindings) -> EvalResult<Decimal> {
    let tokens = tokenize(expression)?;
    let ast = analyzer::parse(&tokens)?;
    let value = ExpressionEvaluator::new().eval_expression(&ast, bindings)?;
    Ok(value.to_decimal())
}

/// Evaluates `expression` against `bindings` and rounds the result once.
#[tracing::instrument(level = "debug", skip(bindings))]
pub fn evaluate(expression: &str, bindings: &Bindings) -> EvalResult<Decimal> {
    let raw = evaluate_unrounded(expression, bindings)?;
    let answer = round_answer(raw);
    debug!(%raw, %answer, "evaluated");
    Ok(answer)
}
