use std::{collections::BTreeMap, path::Path, sync::Arc};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{EntitySource, SourceError, SourceResult};
use crate::entity::{Entity, EntityKind};

/// Serves entities of one kind from in-memory records.
///
/// Lookup follows a search endpoint: the record whose `name` equals the query
/// (compared by [`EntityKind::canonical_name`]) wins, otherwise the first record whose
/// name contains it.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    kind: EntityKind,
    records: Vec<serde_json::Value>,
}

impl FixtureSource {
    pub fn new(kind: EntityKind, records: Vec<serde_json::Value>) -> Self {
        Self { kind, records }
    }

    fn record_name(&self, record: &serde_json::Value) -> Option<String> {
        record
            .get("name")
            .and_then(|name| name.as_str())
            .map(|name| self.kind.canonical_name(name))
    }

    fn find(&self, name: &str) -> Option<&serde_json::Value> {
        let query = self.kind.canonical_name(name);
        if query.is_empty() {
            return None;
        }
        self.records
            .iter()
            .find(|record| self.record_name(record).as_deref() == Some(query.as_str()))
            .or_else(|| {
                self.records.iter().find(|record| {
                    self.record_name(record).is_some_and(|n| n.contains(query.as_str()))
                })
            })
    }
}

#[async_trait]
impl EntitySource for FixtureSource {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn fetch(&self, name: &str) -> SourceResult<Option<Entity>> {
        let record = self.find(name);
        debug!(kind = %self.kind, name, found = record.is_some(), "fixture lookup");
        Ok(record.map(|record| Entity::from_record(self.kind, name, record)))
    }
}

/// Records for every kind, as read from a fixture document:
///
/// ```json
/// {"sw_planet": [{"name": "Tatooine", "diameter": "10465"}], "pokemon": []}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FixtureSet {
    records: BTreeMap<EntityKind, Vec<serde_json::Value>>,
}

impl FixtureSet {
    pub fn from_json_str(s: &str) -> SourceResult<Self> {
        serde_json::from_str(s).map_err(|e| SourceError::InvalidRecord(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SourceError::Io(format!(
                "Failed to read fixtures {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json_str(&content)
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.records.keys().copied()
    }

    /// One source per kind present in the document.
    pub fn into_sources(self) -> Vec<Arc<dyn EntitySource>> {
        self.records
            .into_iter()
            .map(|(kind, records)| Arc::new(FixtureSource::new(kind, records)) as Arc<dyn EntitySource>)
            .collect()
    }
}
