//! # Tokenizer
//!
//! Lexical analysis of arithmetic expressions with `nom`. The token set is closed:
//! identifiers, exact numeric literals, quoted strings, `+ - * /`, parentheses and
//! commas. Anything else is a [`TokenizerError`].

pub mod literal;
pub mod symbol;
pub mod token;
pub mod whitespace;

pub use token::{tokenize, Token, TokenSpan, Tokenizer, TokenizerError, TokenizerResult};
