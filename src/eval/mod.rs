//! Exact-decimal evaluation of restricted arithmetic expressions.

pub mod evaluator;
pub mod value;

pub use evaluator::{
    evaluate, evaluate_unrounded, round_answer, EvalError, EvalResult, ExpressionEvaluator,
    ANSWER_SCALE,
};
pub use value::{Bindings, Value};
