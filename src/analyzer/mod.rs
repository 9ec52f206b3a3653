//! Token-level parser combinators and the expression grammar built from them.

pub mod combinators;
pub mod core;
pub mod parsers;
pub mod prelude;

pub use core::ParseError;
pub use core::ParseResult;
pub use core::Parser;
pub use parsers::parse;

pub use crate::ast;
