//! Entity kinds, their fixed attribute vocabularies and fetched entity records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::numeric::{normalize, RawValue};

/// The kinds of external entity a statement can mention.
///
/// Declaration order doubles as the ownership priority used when an attribute name
/// appears in more than one vocabulary (see [`EntityKind::owner_of`]).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(try_from = "String", into = "String")]
#[strum(ascii_case_insensitive)]
pub enum EntityKind {
    #[strum(to_string = "planet", serialize = "sw_planet")]
    Planet,
    #[strum(to_string = "character", serialize = "sw_character")]
    Character,
    #[strum(to_string = "creature", serialize = "pokemon")]
    Creature,
}

impl TryFrom<String> for EntityKind {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().parse()
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Numeric,
    Text,
}

const PLANET_ATTRIBUTES: &[(&str, AttributeKind)] = &[
    ("rotation_period", AttributeKind::Numeric),
    ("orbital_period", AttributeKind::Numeric),
    ("diameter", AttributeKind::Numeric),
    ("surface_water", AttributeKind::Numeric),
    ("population", AttributeKind::Numeric),
    ("name", AttributeKind::Text),
];

const CHARACTER_ATTRIBUTES: &[(&str, AttributeKind)] = &[
    ("height", AttributeKind::Numeric),
    ("mass", AttributeKind::Numeric),
    ("homeworld", AttributeKind::Text),
    ("name", AttributeKind::Text),
];

const CREATURE_ATTRIBUTES: &[(&str, AttributeKind)] = &[
    ("base_experience", AttributeKind::Numeric),
    ("height", AttributeKind::Numeric),
    ("weight", AttributeKind::Numeric),
    ("name", AttributeKind::Text),
];

/// Creature names as a search endpoint spells them.
const CREATURE_ALIASES: &[(&str, &str)] = &[
    ("nidoran♀", "nidoran-f"),
    ("nidoran♂", "nidoran-m"),
    ("farfetch'd", "farfetchd"),
    ("mr. mime", "mr-mime"),
];

impl EntityKind {
    /// The lookup key for `name`: trimmed and lowercased; creature names also go
    /// through the alias table and use `-` for spaces (`"Mr. Mime"` is `mr-mime`).
    pub fn canonical_name(&self, name: &str) -> String {
        let name = name.trim().to_lowercase();
        match self {
            EntityKind::Creature => CREATURE_ALIASES
                .iter()
                .find(|(alias, _)| *alias == name)
                .map(|(_, canonical)| canonical.to_string())
                .unwrap_or(name)
                .replace(' ', "-"),
            _ => name,
        }
    }

    /// The allow-list of attributes for this kind.
    pub fn attributes(&self) -> &'static [(&'static str, AttributeKind)] {
        match self {
            EntityKind::Planet => PLANET_ATTRIBUTES,
            EntityKind::Character => CHARACTER_ATTRIBUTES,
            EntityKind::Creature => CREATURE_ATTRIBUTES,
        }
    }

    pub fn allows(&self, attribute: &str) -> bool {
        self.attribute_kind(attribute).is_some()
    }

    pub fn attribute_kind(&self, attribute: &str) -> Option<AttributeKind> {
        self.attributes()
            .iter()
            .find(|(name, _)| *name == attribute)
            .map(|(_, kind)| *kind)
    }

    /// The kind that owns `attribute`: the first kind, in declaration order, whose
    /// vocabulary contains it.
    pub fn owner_of(attribute: &str) -> Option<EntityKind> {
        EntityKind::iter().find(|kind| kind.allows(attribute))
    }
}

/// An entity as referenced by a parsed statement, before anything is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub name: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// A fetched entity.
///
/// `name` is the name the statement used; the record's own name, if the source
/// provided one, is the `name` attribute. An entity nobody could find is
/// [`Entity::absent`]: it has no attributes and never stands in for another entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub name: String,
    found: bool,
    attributes: BTreeMap<String, RawValue>,
}

impl Entity {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            found: true,
            attributes: BTreeMap::new(),
        }
    }

    /// Placeholder for a lookup that came back empty or failed.
    pub fn absent(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            found: false,
            ..Self::new(kind, name)
        }
    }

    pub fn is_found(&self) -> bool {
        self.found
    }

    pub fn with_attribute(mut self, attribute: &str, value: impl Into<RawValue>) -> Self {
        self.attributes.insert(attribute.to_string(), value.into());
        self
    }

    /// Builds an entity from a source record, keeping only the kind's vocabulary.
    /// Numeric attributes are normalized here; text attributes are kept verbatim.
    pub fn from_record(kind: EntityKind, name: &str, record: &serde_json::Value) -> Self {
        let mut entity = Entity::new(kind, name);
        for (attribute, attribute_kind) in kind.attributes() {
            let raw = match record.get(*attribute) {
                Some(value) => RawValue::from(value),
                None => continue,
            };
            let value = match attribute_kind {
                AttributeKind::Numeric => normalize(&raw).map(RawValue::Decimal),
                AttributeKind::Text => match raw {
                    RawValue::Null => None,
                    other => Some(other),
                },
            };
            entity
                .attributes
                .insert(attribute.to_string(), value.unwrap_or_default());
        }
        entity
    }

    /// The attribute's value, if present and not null.
    pub fn value(&self, attribute: &str) -> Option<&RawValue> {
        self.attributes.get(attribute).filter(|v| !v.is_null())
    }

    pub fn has_value(&self, attribute: &str) -> bool {
        self.value(attribute).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
