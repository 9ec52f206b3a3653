//! # galactic: attribute-driven arithmetic answers
//!
//! `galactic` answers trivia questions whose operands are attributes of external
//! entities (characters, planets, creatures). A language-model collaborator turns the
//! question into a structured intent; this crate does the rest.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Intent → Entity fetch → Normalizer → Resolver → Tokenizer → Analyzer → Evaluator → Answer
//! ```
//!
//! ### Stage 1: Intent
//!
//! The [`intent`] module decodes the collaborator's reply into a [`intent::ParsedIntent`]:
//! the entities mentioned, a variable-to-attribute binding per operand and an expression.
//!
//! ### Stage 2: Entity fetch
//!
//! The [`source`] module looks each entity up through one [`source::EntitySource`] per
//! entity kind, optionally through a shared [`source::EntityCache`].
//!
//! ### Stage 3: Normalization and resolution
//!
//! [`numeric`] turns external values into exact decimals (or absence) and [`resolver`]
//! repairs wrong variable bindings before anything is evaluated.
//!
//! ### Stage 4: Evaluation
//!
//! The [`tokenizer`] and [`analyzer`] modules turn the expression into an [`ast`], and
//! [`eval`] walks it with exact decimal arithmetic, rounding once at the end.
//!
//! ## Orchestration
//!
//! [`pipeline`] wires the stages together for one statement; [`session`] runs a batch of
//! statements against a wall-clock budget, answering failed statements with a default.

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod entity;
pub mod error;
pub mod eval;
pub mod intent;
pub mod numeric;
pub mod pipeline;
pub mod resolver;
pub mod session;
pub mod source;
pub mod tokenizer;

// Re-exports
pub use ast::*;
pub use entity::*;
pub use error::*;
pub use eval::*;
