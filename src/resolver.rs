//! # Variable resolution
//!
//! A parsed statement binds each expression variable to an `(entity, attribute)` pair.
//! Those bindings come from a language model and are sometimes wrong: the attribute
//! belongs to another entity kind, the entity has no value for it, or the model used
//! the wrong word for "weight". [`AttributeResolver`] validates every binding and,
//! where it can do so unambiguously, moves it to the entity that actually carries the
//! attribute.
//!
//! Resolution is all or nothing: the first variable that cannot be resolved aborts the
//! statement and no partial bindings are returned.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::entity::{Entity, EntityKind};
use crate::eval::{Bindings, Value};
use crate::numeric::{normalize, RawValue};

/// Attribute names the parser confuses between two vocabularies, per target kind:
/// `(kind, wrong name, right name)`.
const SYNONYMS: [(EntityKind, &str, &str); 2] = [
    (EntityKind::Creature, "mass", "weight"),
    (EntityKind::Character, "weight", "mass"),
];

/// Where a variable points: an index into the statement's entity list and an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSpec {
    #[serde(alias = "entity")]
    pub entity_index: i64,
    pub attribute: String,
}

impl VariableSpec {
    pub fn new(entity_index: i64, attribute: impl Into<String>) -> Self {
        Self {
            entity_index,
            attribute: attribute.into(),
        }
    }

    /// Decodes a spec from the parser payload. Shape errors are reported as `InvalidSpec`.
    pub fn from_value(variable: &str, value: &serde_json::Value) -> ResolveResult<Self> {
        serde_json::from_value(value.clone()).map_err(|e| ResolveError::InvalidSpec {
            variable: variable.to_string(),
            reason: e.to_string(),
        })
    }
}

/// The final binding of one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariable {
    pub entity_index: usize,
    pub attribute: String,
    pub value: Value,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("Invalid spec for `{variable}`: {reason}")]
    InvalidSpec { variable: String, reason: String },
    #[error("No value for `{variable}`: attribute `{attribute}` missing on entity {entity_index}")]
    MissingAttribute {
        variable: String,
        attribute: String,
        entity_index: usize,
    },
}

pub type ResolveResult<T> = Result<T, ResolveError>;

#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeResolver;

impl AttributeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves every variable, in declaration order, into a flat binding map.
    pub fn resolve(
        &self,
        entities: &[Entity],
        specs: &[(String, VariableSpec)],
    ) -> ResolveResult<Bindings> {
        let mut bindings = Bindings::with_capacity(specs.len());
        for (variable, spec) in specs {
            let resolved = self.resolve_variable(entities, variable, spec)?;
            bindings.insert(variable.clone(), resolved.value);
        }
        Ok(bindings)
    }

    pub fn resolve_variable(
        &self,
        entities: &[Entity],
        variable: &str,
        spec: &VariableSpec,
    ) -> ResolveResult<ResolvedVariable> {
        let mut index = Self::validate(entities, variable, spec)?;
        let target = &entities[index];
        let attribute = Self::correct_synonym(target.kind, &spec.attribute);

        // An entity that was never found is not repaired with another one.
        if !target.is_found() {
            return Err(ResolveError::MissingAttribute {
                variable: variable.to_string(),
                attribute,
                entity_index: index,
            });
        }

        if !(target.kind.allows(&attribute) && target.has_value(&attribute)) {
            let candidate = Self::reassign(entities, variable, &attribute, target.kind)
                .ok_or_else(|| ResolveError::MissingAttribute {
                    variable: variable.to_string(),
                    attribute: attribute.clone(),
                    entity_index: index,
                })?;
            if candidate != index {
                warn!(
                    variable,
                    attribute = %attribute,
                    from = index,
                    from_kind = %target.kind,
                    to = candidate,
                    to_kind = %entities[candidate].kind,
                    "reassigning variable"
                );
                index = candidate;
            }
        }

        let missing = || ResolveError::MissingAttribute {
            variable: variable.to_string(),
            attribute: attribute.clone(),
            entity_index: index,
        };
        let raw = entities[index].value(&attribute).ok_or_else(missing)?;
        let value = match raw {
            RawValue::Text(s) => Value::Text(s.clone()),
            other => Value::Number(normalize(other).ok_or_else(missing)?),
        };

        debug!(variable, entity = index, attribute = %attribute, value = %value, "bound variable");
        Ok(ResolvedVariable {
            entity_index: index,
            attribute,
            value,
        })
    }

    fn validate(entities: &[Entity], variable: &str, spec: &VariableSpec) -> ResolveResult<usize> {
        let invalid = |reason: String| ResolveError::InvalidSpec {
            variable: variable.to_string(),
            reason,
        };
        if spec.attribute.trim().is_empty() {
            return Err(invalid("attribute is empty".to_string()));
        }
        usize::try_from(spec.entity_index)
            .ok()
            .filter(|index| *index < entities.len())
            .ok_or_else(|| {
                invalid(format!(
                    "entity index {} out of range (0..{})",
                    spec.entity_index,
                    entities.len()
                ))
            })
    }

    fn correct_synonym(kind: EntityKind, attribute: &str) -> String {
        SYNONYMS
            .iter()
            .find(|(k, wrong, _)| *k == kind && *wrong == attribute)
            .map(|(_, _, right)| right.to_string())
            .unwrap_or_else(|| attribute.to_string())
    }

    /// Picks the entity that should carry `attribute` instead of the declared one.
    fn reassign(
        entities: &[Entity],
        variable: &str,
        attribute: &str,
        declared_kind: EntityKind,
    ) -> Option<usize> {
        let wanted = EntityKind::owner_of(attribute).unwrap_or(declared_kind);
        let candidates: Vec<usize> = entities
            .iter()
            .enumerate()
            .filter(|(_, entity)| {
                entity.is_found() && entity.kind == wanted && entity.has_value(attribute)
            })
            .map(|(i, _)| i)
            .collect();

        match candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            [first, ..] => {
                let variable = variable.to_lowercase();
                candidates
                    .iter()
                    .copied()
                    .find(|&i| {
                        let name = entities[i].name.to_lowercase();
                        !name.is_empty() && variable.contains(&name)
                    })
                    .or(Some(*first))
            }
        }
    }
}

/// Resolves `specs` against `entities` with a default [`AttributeResolver`].
pub fn resolve(entities: &[Entity], specs: &[(String, VariableSpec)]) -> ResolveResult<Bindings> {
    AttributeResolver::new().resolve(entities, specs)
}
