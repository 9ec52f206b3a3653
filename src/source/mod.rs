//! # Entity sources
//!
//! Entities are looked up by name through one [`EntitySource`] per [`EntityKind`]. A
//! source answers with a record, with `None` when nothing matches, or with an error
//! when it could not answer at all. Sources are grouped in a [`SourceRegistry`] and may
//! share an [`EntityCache`] so repeated names are looked up once per run.

pub mod cache;
pub mod fixture;
pub mod registry;

use async_trait::async_trait;
use thiserror::Error;

use crate::entity::{Entity, EntityKind};

pub use cache::{CachedSource, EntityCache};
pub use fixture::{FixtureSet, FixtureSource};
pub use registry::SourceRegistry;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("No source registered for {0}")]
    NotRegistered(EntityKind),
    #[error("Source unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("I/O error: {0}")]
    Io(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Looks up entities of one kind by name.
#[mockall::automock]
#[async_trait]
pub trait EntitySource: Send + Sync {
    fn kind(&self) -> EntityKind;

    async fn fetch(&self, name: &str) -> SourceResult<Option<Entity>>;
}
