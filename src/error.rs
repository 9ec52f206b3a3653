use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eval::EvalError;
use crate::intent::IntentError;
use crate::resolver::ResolveError;
use crate::source::SourceError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Intent error: {0}")]
    Intent(#[from] IntentError),
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Config error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }

    /// The outcome category reported for a failed statement.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Intent(_) => FailureKind::InvalidParse,
            Error::Resolve(ResolveError::InvalidSpec { .. }) => FailureKind::InvalidSpec,
            Error::Resolve(ResolveError::MissingAttribute { .. }) => FailureKind::MissingAttribute,
            Error::Eval(EvalError::UnknownVariable(_)) => FailureKind::UnknownVariable,
            Error::Eval(EvalError::DivisionByZero) => FailureKind::DivisionByZero,
            Error::Eval(EvalError::UnsupportedExpression(_)) => FailureKind::UnsupportedExpression,
            Error::Eval(EvalError::Overflow(_)) => FailureKind::Overflow,
            Error::Source(_) | Error::Config(_) | Error::Internal(_) => FailureKind::Internal,
        }
    }
}

/// Why a statement produced no answer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    InvalidParse,
    InvalidSpec,
    MissingAttribute,
    UnknownVariable,
    DivisionByZero,
    UnsupportedExpression,
    Overflow,
    Timeout,
    Internal,
}

impl FailureKind {
    /// Defects point at a broken collaborator or at this crate, not at the data.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            FailureKind::UnsupportedExpression | FailureKind::Internal
        )
    }
}
