//! # Parsed intents
//!
//! A language model turns each statement into a JSON payload naming the entities,
//! binding every expression variable to an entity attribute and giving the expression:
//!
//! ```json
//! {
//!   "entities": [{"type": "sw_planet", "name": "Tatooine"}],
//!   "vars": {"x1": {"entity": 0, "attribute": "diameter"}},
//!   "expression": "x1 / 2",
//!   "notes": "optional"
//! }
//! ```
//!
//! The payload shape is checked here; the individual variable bindings are checked by
//! the resolver.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::entity::{EntityKind, EntityRef};
use crate::resolver::{ResolveResult, VariableSpec};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntentError {
    #[error("Invalid parse: {0}")]
    InvalidParse(String),
    #[error("Parser collaborator failed: {0}")]
    Completion(String),
}

pub type IntentResult<T> = Result<T, IntentError>;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"^```[A-Za-z]*\s*([\s\S]*?)\s*```$").unwrap();
}

/// Structured form of one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub entities: Vec<EntityRef>,
    /// Raw variable bindings in declaration order.
    pub vars: serde_json::Map<String, serde_json::Value>,
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ParsedIntent {
    pub fn from_json_str(payload: &str) -> IntentResult<Self> {
        serde_json::from_str(payload).map_err(|e| IntentError::InvalidParse(e.to_string()))
    }

    pub fn from_value(payload: serde_json::Value) -> IntentResult<Self> {
        serde_json::from_value(payload).map_err(|e| IntentError::InvalidParse(e.to_string()))
    }

    /// Decodes a model reply, tolerating a surrounding code fence.
    pub fn from_completion(content: &str) -> IntentResult<Self> {
        let payload = strip_code_fence(content);
        if payload.is_empty() {
            return Err(IntentError::InvalidParse("empty completion".to_string()));
        }
        Self::from_json_str(payload)
    }

    /// Variable specs in declaration order.
    pub fn specs(&self) -> ResolveResult<Vec<(String, VariableSpec)>> {
        self.vars
            .iter()
            .map(|(name, value)| Ok((name.clone(), VariableSpec::from_value(name, value)?)))
            .collect()
    }
}

/// Removes a Markdown code fence (optionally tagged, e.g. ```` ```json ````) around `content`.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match CODE_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

/// The natural-language collaborator: statement in, raw model reply out.
///
/// `strict` is set when the previous reply could not be decoded; a model-backed
/// implementation should then send [`instructions`]`(true)`.
#[mockall::automock]
#[async_trait]
pub trait IntentParser: Send + Sync {
    async fn complete(&self, statement: &str, strict: bool) -> IntentResult<String>;
}

/// Runs `parser` on `statement` and decodes its reply, asking once more in strict
/// mode when the first reply is not a valid payload.
#[tracing::instrument(level = "debug", skip(parser))]
pub async fn parse_statement(
    parser: &dyn IntentParser,
    statement: &str,
) -> IntentResult<ParsedIntent> {
    let content = parser.complete(statement, false).await?;
    debug!(%content, "completion received");
    match ParsedIntent::from_completion(&content) {
        Ok(intent) => Ok(intent),
        Err(e) => {
            warn!("undecodable completion, retrying strictly: {}", e);
            let content = parser.complete(statement, true).await?;
            debug!(%content, "strict completion received");
            ParsedIntent::from_completion(&content)
        }
    }
}

/// Replays a reply captured earlier, whatever the statement.
#[derive(Debug, Clone)]
pub struct RecordedIntentParser {
    content: String,
}

impl RecordedIntentParser {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

#[async_trait]
impl IntentParser for RecordedIntentParser {
    async fn complete(&self, _statement: &str, _strict: bool) -> IntentResult<String> {
        Ok(self.content.clone())
    }
}

/// Instructions for a model-backed [`IntentParser`]: the payload schema and each kind's
/// attribute vocabulary.
pub fn schema_prompt() -> String {
    use strum::IntoEnumIterator;

    let vocabulary = EntityKind::iter()
        .map(|kind| {
            let names = kind
                .attributes()
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ");
            format!("- {}: {}", kind, names)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let kinds = EntityKind::iter()
        .map(|kind| format!("\"{}\"", kind))
        .collect::<Vec<_>>()
        .join(" | ");

    format!(
        r#"Convert the statement into an arithmetic expression over entity attributes.
Reply with JSON only, exactly in this shape:
{{
  "entities": [{{"type": {kinds}, "name": string}}],
  "vars": {{"<variable>": {{"entity": <index into entities>, "attribute": string}}}},
  "expression": string,
  "notes": string
}}
Valid attributes:
{vocabulary}
The expression may use + - * / and parentheses. To use the length of a text attribute,
bind it to a variable and write len(variable)."#
    )
}

/// Reminder appended on the strict retry.
pub const STRICT_REMINDER: &str = "JSON ONLY. No text before or after the object.";

/// The [`schema_prompt`], with the [`STRICT_REMINDER`] when `strict`.
pub fn instructions(strict: bool) -> String {
    let prompt = schema_prompt();
    if strict {
        format!("{}\n{}", prompt, STRICT_REMINDER)
    } else {
        prompt
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::resolver::ResolveError;

    const TATOOINE_LUKE: &str = r#"{
        "entities": [
            {"type": "sw_planet", "name": "Tatooine"},
            {"type": "sw_character", "name": "Luke Skywalker"}
        ],
        "vars": {
            "x1": {"entity": 0, "attribute": "diameter"},
            "x2": {"entity": 1, "attribute": "height"}
        },
        "expression": "x1 / x2",
        "notes": "diameter over height"
    }"#;

    #[test]
    fn test_decode_payload() {
        let intent = ParsedIntent::from_json_str(TATOOINE_LUKE).unwrap();
        assert_eq!(
            intent.entities,
            vec![
                EntityRef::new(EntityKind::Planet, "Tatooine"),
                EntityRef::new(EntityKind::Character, "Luke Skywalker"),
            ]
        );
        assert_eq!(intent.expression, "x1 / x2");
        assert_eq!(intent.notes.as_deref(), Some("diameter over height"));

        let specs = intent.specs().unwrap();
        assert_eq!(
            specs,
            vec![
                ("x1".to_string(), VariableSpec::new(0, "diameter")),
                ("x2".to_string(), VariableSpec::new(1, "height")),
            ]
        );
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let intent = ParsedIntent::from_value(json!({
            "entities": [],
            "vars": {
                "zeta": {"entity_index": 0, "attribute": "mass"},
                "alpha": {"entity_index": 0, "attribute": "height"}
            },
            "expression": "zeta + alpha"
        }))
        .unwrap();
        let names: Vec<_> = intent.specs().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(intent.notes, None);
    }

    #[test]
    fn test_structurally_invalid_payloads() {
        let cases = [
            json!({"vars": {}, "expression": "1"}),
            json!({"entities": [], "expression": "1"}),
            json!({"entities": [], "vars": {}}),
            json!({"entities": {}, "vars": {}, "expression": "1"}),
            json!({"entities": [], "vars": [], "expression": "1"}),
            json!({"entities": [], "vars": {}, "expression": 42}),
            json!({"entities": [{"type": "starship", "name": "X"}], "vars": {}, "expression": "1"}),
            json!({"entities": [{"name": "X"}], "vars": {}, "expression": "1"}),
            json!([1, 2, 3]),
        ];
        for payload in cases {
            let result = ParsedIntent::from_value(payload.clone());
            assert!(
                matches!(result, Err(IntentError::InvalidParse(_))),
                "{}",
                payload
            );
        }
    }

    #[test]
    fn test_bad_variable_spec_is_invalid_spec() {
        let intent = ParsedIntent::from_value(json!({
            "entities": [{"type": "planet", "name": "Hoth"}],
            "vars": {"x": {"entity": "zero", "attribute": "diameter"}},
            "expression": "x"
        }))
        .unwrap();
        assert!(matches!(
            intent.specs(),
            Err(ResolveError::InvalidSpec { variable, .. }) if variable == "x"
        ));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_from_completion() {
        let fenced = format!("```json\n{}\n```", TATOOINE_LUKE);
        let intent = ParsedIntent::from_completion(&fenced).unwrap();
        assert_eq!(intent.entities.len(), 2);

        assert!(matches!(
            ParsedIntent::from_completion("Sure! Here is the JSON you asked for."),
            Err(IntentError::InvalidParse(_))
        ));
        assert!(matches!(
            ParsedIntent::from_completion("   "),
            Err(IntentError::InvalidParse(_))
        ));
    }

    #[tokio::test]
    async fn test_parse_statement_with_mock() {
        let mut parser = MockIntentParser::new();
        parser
            .expect_complete()
            .withf(|statement, strict| statement.contains("Tatooine") && !*strict)
            .times(1)
            .returning(|_, _| Ok(format!("```json\n{}\n```", TATOOINE_LUKE)));

        let intent = parse_statement(&parser, "Divide Tatooine's diameter by Luke's height")
            .await
            .unwrap();
        assert_eq!(intent.expression, "x1 / x2");
    }

    #[tokio::test]
    async fn test_parse_statement_propagates_collaborator_failure() {
        let mut parser = MockIntentParser::new();
        parser
            .expect_complete()
            .times(1)
            .returning(|_, _| Err(IntentError::Completion("rate limited".to_string())));

        let err = parse_statement(&parser, "anything").await.unwrap_err();
        assert_eq!(err, IntentError::Completion("rate limited".to_string()));
    }

    #[tokio::test]
    async fn test_parse_statement_retries_strictly_once() {
        let mut parser = MockIntentParser::new();
        let mut seq = mockall::Sequence::new();
        parser
            .expect_complete()
            .withf(|_, strict| !*strict)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("Sure! Here is the expression you asked for.".to_string()));
        parser
            .expect_complete()
            .withf(|_, strict| *strict)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(TATOOINE_LUKE.to_string()));

        let intent = parse_statement(&parser, "Tatooine over Luke").await.unwrap();
        assert_eq!(intent.expression, "x1 / x2");
    }

    #[tokio::test]
    async fn test_parse_statement_gives_up_after_retry() {
        let mut parser = MockIntentParser::new();
        parser
            .expect_complete()
            .times(2)
            .returning(|_, _| Ok(r#"{"entities": [], "vars": {}}"#.to_string()));

        let err = parse_statement(&parser, "anything").await.unwrap_err();
        assert!(matches!(err, IntentError::InvalidParse(_)));
    }

    #[test]
    fn test_strict_instructions() {
        assert!(!instructions(false).contains(STRICT_REMINDER));
        assert!(instructions(true).ends_with(STRICT_REMINDER));
        assert!(instructions(true).starts_with(&schema_prompt()));
    }

    #[tokio::test]
    async fn test_recorded_parser() {
        let parser = RecordedIntentParser::new(TATOOINE_LUKE);
        let intent = parse_statement(&parser, "ignored").await.unwrap();
        assert_eq!(intent.specs().unwrap().len(), 2);
    }

    #[test]
    fn test_schema_prompt_lists_vocabulary() {
        let prompt = schema_prompt();
        assert!(prompt.contains("- planet: rotation_period, orbital_period, diameter"));
        assert!(prompt.contains("- character: height, mass, homeworld, name"));
        assert!(prompt.contains("- creature: base_experience, height, weight, name"));
        assert!(prompt.contains(r#""planet" | "character" | "creature""#));
    }
}
