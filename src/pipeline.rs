//! Solving one statement: fetch entities, resolve variables, evaluate, round.

use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::SolverConfig;
use crate::entity::{Entity, EntityRef};
use crate::error::{FailureKind, InternalResult};
use crate::eval::evaluate;
use crate::intent::ParsedIntent;
use crate::resolver::{AttributeResolver, VariableSpec};
use crate::source::{EntityCache, SourceRegistry};

/// The single result of solving one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Solved { answer: Decimal },
    Failed { kind: FailureKind, message: String },
}

impl Outcome {
    pub fn answer(&self) -> Option<Decimal> {
        match self {
            Outcome::Solved { answer } => Some(*answer),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Outcome::Solved { .. } => None,
            Outcome::Failed { kind, .. } => Some(*kind),
        }
    }

    /// The answer, or `default` for a failed statement.
    pub fn answer_or(&self, default: Decimal) -> Decimal {
        self.answer().unwrap_or(default)
    }
}

/// Resolves `specs` against `entities` and evaluates `expression`, rounding once.
pub fn solve_resolved(
    entities: &[Entity],
    specs: &[(String, VariableSpec)],
    expression: &str,
) -> InternalResult<Decimal> {
    let bindings = AttributeResolver::new().resolve(entities, specs)?;
    debug!(variables = bindings.len(), expression, "bindings resolved");
    Ok(evaluate(expression, &bindings)?)
}

pub struct AnswerPipeline {
    sources: SourceRegistry,
}

impl AnswerPipeline {
    pub fn new(sources: SourceRegistry) -> Self {
        Self { sources }
    }

    /// Builds a pipeline, putting a fresh [`EntityCache`] in front of `sources` when
    /// the config asks for shared lookups.
    pub fn from_config(sources: SourceRegistry, config: &SolverConfig) -> Self {
        if config.cache_lookups {
            Self::new(sources.cached(Arc::new(EntityCache::new())))
        } else {
            Self::new(sources)
        }
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// Looks every referenced entity up concurrently, keeping statement order.
    ///
    /// An entity nobody knows, or whose source failed, comes back as [`Entity::absent`];
    /// it only matters if a variable points at it.
    pub async fn fetch_entities(&self, refs: &[EntityRef]) -> Vec<Entity> {
        let lookups = refs.iter().map(|entity| async move {
            match self.sources.fetch(entity).await {
                Ok(Some(found)) => found,
                Ok(None) => {
                    debug!(kind = %entity.kind, name = %entity.name, "entity not found");
                    Entity::absent(entity.kind, entity.name.clone())
                }
                Err(e) => {
                    warn!(kind = %entity.kind, name = %entity.name, "entity lookup failed: {}", e);
                    Entity::absent(entity.kind, entity.name.clone())
                }
            }
        });
        join_all(lookups).await
    }

    #[tracing::instrument(level = "debug", skip(self, intent), fields(expression = %intent.expression))]
    pub async fn solve(&self, intent: &ParsedIntent) -> InternalResult<Decimal> {
        let specs = intent.specs()?;
        let entities = self.fetch_entities(&intent.entities).await;
        solve_resolved(&entities, &specs, &intent.expression)
    }

    /// Like [`AnswerPipeline::solve`], with every failure folded into the outcome.
    pub async fn solve_outcome(&self, intent: &ParsedIntent) -> Outcome {
        match self.solve(intent).await {
            Ok(answer) => Outcome::Solved { answer },
            Err(e) => {
                let kind = e.kind();
                if kind.is_defect() {
                    error!(%kind, expression = %intent.expression, "statement failed: {}", e);
                } else {
                    warn!(%kind, "statement skipped: {}", e);
                }
                Outcome::Failed {
                    kind,
                    message: e.to_string(),
                }
            }
        }
    }
}
