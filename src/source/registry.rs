use std::{collections::HashMap, sync::Arc};

use super::{CachedSource, EntityCache, EntitySource, SourceError, SourceResult};
use crate::entity::{Entity, EntityKind, EntityRef};

/// One [`EntitySource`] per entity kind.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: HashMap<EntityKind, Arc<dyn EntitySource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `source` for its kind, replacing any earlier source for that kind.
    pub fn register(&mut self, source: Arc<dyn EntitySource>) {
        self.sources.insert(source.kind(), source);
    }

    pub fn with_sources(sources: impl IntoIterator<Item = Arc<dyn EntitySource>>) -> Self {
        let mut registry = Self::new();
        for source in sources {
            registry.register(source);
        }
        registry
    }

    /// Wraps every registered source in a [`CachedSource`] sharing `cache`.
    pub fn cached(self, cache: Arc<EntityCache>) -> Self {
        let sources = self
            .sources
            .into_values()
            .map(|source| Arc::new(CachedSource::new(source, cache.clone())) as Arc<dyn EntitySource>);
        Self::with_sources(sources)
    }

    pub fn get(&self, kind: EntityKind) -> Option<&Arc<dyn EntitySource>> {
        self.sources.get(&kind)
    }

    pub async fn fetch(&self, entity: &EntityRef) -> SourceResult<Option<Entity>> {
        let source = self
            .get(entity.kind)
            .ok_or(SourceError::NotRegistered(entity.kind))?;
        source.fetch(&entity.name).await
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.sources.keys().collect();
        kinds.sort();
        f.debug_struct("SourceRegistry").field("kinds", &kinds).finish()
    }
}
