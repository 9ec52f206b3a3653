use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use super::{EntitySource, SourceResult};
use crate::entity::{Entity, EntityKind};

/// Read-through cache of lookups, keyed by kind and case-folded name.
///
/// Misses are remembered too, so a name nobody knows is only asked for once. Entries
/// are never evicted; a cache lives as long as one run.
#[derive(Debug, Default)]
pub struct EntityCache {
    entries: DashMap<String, Option<Entity>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(kind: EntityKind, name: &str) -> String {
        format!("{}:{}", kind, name.trim().to_lowercase())
    }

    /// `None` when the lookup was never made; `Some(None)` for a remembered miss.
    pub fn get(&self, kind: EntityKind, name: &str) -> Option<Option<Entity>> {
        self.entries
            .get(&Self::key(kind, name))
            .map(|entry| entry.value().clone())
    }

    pub fn insert(&self, kind: EntityKind, name: &str, entity: Option<Entity>) {
        self.entries.insert(Self::key(kind, name), entity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Puts an [`EntityCache`] in front of another source. Errors are passed through and
/// not remembered.
pub struct CachedSource {
    inner: Arc<dyn EntitySource>,
    cache: Arc<EntityCache>,
}

impl CachedSource {
    pub fn new(inner: Arc<dyn EntitySource>, cache: Arc<EntityCache>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl EntitySource for CachedSource {
    fn kind(&self) -> EntityKind {
        self.inner.kind()
    }

    async fn fetch(&self, name: &str) -> SourceResult<Option<Entity>> {
        let kind = self.kind();
        if let Some(hit) = self.cache.get(kind, name) {
            debug!(%kind, name, found = hit.is_some(), "cache hit");
            return Ok(hit);
        }
        let fetched = self.inner.fetch(name).await?;
        self.cache.insert(kind, name, fetched.clone());
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MockEntitySource, SourceError};

    fn mock_planets() -> MockEntitySource {
        let mut source = MockEntitySource::new();
        source.expect_kind().return_const(EntityKind::Planet);
        source
    }

    #[tokio::test]
    async fn test_hit_skips_inner_source() {
        let mut source = mock_planets();
        source
            .expect_fetch()
            .times(1)
            .returning(|name| Ok(Some(Entity::new(EntityKind::Planet, name))));

        let cache = Arc::new(EntityCache::new());
        let cached = CachedSource::new(Arc::new(source), cache.clone());

        let first = cached.fetch("Tatooine").await.unwrap().unwrap();
        let second = cached.fetch("  TATOOINE ").await.unwrap().unwrap();
        assert_eq!(first.name, "Tatooine");
        assert_eq!(second, first);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_miss_is_remembered() {
        let mut source = mock_planets();
        source.expect_fetch().times(1).returning(|_| Ok(None));

        let cache = Arc::new(EntityCache::new());
        let cached = CachedSource::new(Arc::new(source), cache.clone());

        assert_eq!(cached.fetch("Krypton").await.unwrap(), None);
        assert_eq!(cached.fetch("krypton").await.unwrap(), None);
        assert_eq!(cache.get(EntityKind::Planet, "KRYPTON"), Some(None));
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let mut source = mock_planets();
        source
            .expect_fetch()
            .times(2)
            .returning(|_| Err(SourceError::Unavailable("timeout".to_string())));

        let cache = Arc::new(EntityCache::new());
        let cached = CachedSource::new(Arc::new(source), cache.clone());

        assert!(cached.fetch("Hoth").await.is_err());
        assert!(cached.fetch("Hoth").await.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_separate_kinds() {
        let cache = EntityCache::new();
        cache.insert(
            EntityKind::Creature,
            "Pikachu",
            Some(Entity::new(EntityKind::Creature, "Pikachu")),
        );
        assert!(cache.get(EntityKind::Creature, "pikachu").is_some());
        assert_eq!(cache.get(EntityKind::Character, "pikachu"), None);
    }
}
