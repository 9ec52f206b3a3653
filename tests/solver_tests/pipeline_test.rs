use std::{str::FromStr, sync::Arc};

use galactic::{
    config::SolverConfig,
    error::FailureKind,
    intent::ParsedIntent,
    pipeline::{AnswerPipeline, Outcome},
    source::{EntityCache, FixtureSet, SourceRegistry},
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::json;

use super::fixture_file;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn registry() -> SourceRegistry {
    let file = fixture_file();
    let set = FixtureSet::from_file(file.path()).unwrap();
    SourceRegistry::with_sources(set.into_sources())
}

async fn solve(payload: serde_json::Value) -> Outcome {
    let intent = ParsedIntent::from_value(payload).unwrap();
    AnswerPipeline::new(registry()).solve_outcome(&intent).await
}

#[tokio::test]
async fn it_divides_planet_diameter_by_character_height() {
    let completion = r#"```json
    {
        "entities": [
            {"type": "sw_planet", "name": "Tatooine"},
            {"type": "sw_character", "name": "Luke Skywalker"}
        ],
        "vars": {
            "x1": {"entity": 0, "attribute": "diameter"},
            "x2": {"entity": 1, "attribute": "height"}
        },
        "expression": "x1 / x2"
    }
    ```"#;
    let intent = ParsedIntent::from_completion(completion).unwrap();
    let answer = AnswerPipeline::new(registry()).solve(&intent).await.unwrap();

    assert_eq!(answer, dec("60.8430232558"));
    assert_eq!(answer.to_string(), "60.8430232558");
}

#[tokio::test]
async fn it_moves_height_from_planet_to_character() {
    let outcome = solve(json!({
        "entities": [
            {"type": "planet", "name": "Tatooine"},
            {"type": "character", "name": "Luke Skywalker"}
        ],
        "vars": {
            "h": {"entity": 0, "attribute": "height"},
            "d": {"entity": 0, "attribute": "diameter"}
        },
        "expression": "d - h"
    }))
    .await;
    assert_eq!(outcome, Outcome::Solved { answer: dec("10293") });
}

#[tokio::test]
async fn it_picks_the_creature_named_in_the_variable() {
    let outcome = solve(json!({
        "entities": [
            {"type": "planet", "name": "Hoth"},
            {"type": "pokemon", "name": "pikachu"},
            {"type": "pokemon", "name": "bulbasaur"}
        ],
        "vars": {
            "bulbasaur_weight": {"entity": 0, "attribute": "weight"},
            "w": {"entity": 0, "attribute": "weight"}
        },
        "expression": "bulbasaur_weight - w"
    }))
    .await;
    // bulbasaur (69) minus the first creature carrying a weight, pikachu (60)
    assert_eq!(outcome.answer(), Some(dec("9")));
}

#[tokio::test]
async fn it_fails_when_the_declared_creature_is_unknown() {
    let outcome = solve(json!({
        "entities": [
            {"type": "pokemon", "name": "mewtwo"},
            {"type": "pokemon", "name": "pikachu"}
        ],
        "vars": {"mewtwo_weight": {"entity": 0, "attribute": "weight"}},
        "expression": "mewtwo_weight * 2"
    }))
    .await;
    assert_eq!(outcome.failure_kind(), Some(FailureKind::MissingAttribute));
}

#[tokio::test]
async fn it_corrects_mass_and_weight_synonyms() {
    let outcome = solve(json!({
        "entities": [
            {"type": "pokemon", "name": "pikachu"},
            {"type": "sw_character", "name": "Jabba"}
        ],
        "vars": {
            "p": {"entity": 0, "attribute": "mass"},
            "j": {"entity": 1, "attribute": "weight"}
        },
        "expression": "j / p"
    }))
    .await;
    assert_eq!(outcome.answer(), Some(dec("22.6333333333")));
}

#[tokio::test]
async fn it_counts_characters_of_text_attributes() {
    let outcome = solve(json!({
        "entities": [{"type": "sw_character", "name": "Luke Skywalker"}],
        "vars": {"home": {"entity": 0, "attribute": "homeworld"}},
        "expression": "len(home) * 2 + len(\"ab\")"
    }))
    .await;
    assert_eq!(outcome.answer(), Some(dec("18")));
}

#[tokio::test]
async fn it_reports_failures_by_kind() {
    let cases = [
        (
            json!({"p": {"entity": 0, "attribute": "population"}}),
            "p * 2",
            FailureKind::MissingAttribute,
        ),
        (
            json!({"d": {"entity": 0, "attribute": "diameter"}}),
            "d / (d - 7200)",
            FailureKind::DivisionByZero,
        ),
        (
            json!({"d": {"entity": 3, "attribute": "diameter"}}),
            "d",
            FailureKind::InvalidSpec,
        ),
        (
            json!({"d": {"entity": 0, "attribute": "diameter"}}),
            "abs(d)",
            FailureKind::UnsupportedExpression,
        ),
    ];
    for (vars, expression, expected) in cases {
        let outcome = solve(json!({
            "entities": [{"type": "planet", "name": "Hoth"}],
            "vars": vars,
            "expression": expression
        }))
        .await;
        assert_eq!(outcome.failure_kind(), Some(expected), "{}", expression);
    }
}

#[tokio::test]
async fn it_shares_one_cache_across_statements() {
    let cache = Arc::new(EntityCache::new());
    let pipeline = AnswerPipeline::new(registry().cached(cache.clone()));
    let intent = ParsedIntent::from_value(json!({
        "entities": [
            {"type": "planet", "name": "Tatooine"},
            {"type": "character", "name": "Luke Skywalker"},
            {"type": "character", "name": "Leia Organa"}
        ],
        "vars": {"o": {"entity": 0, "attribute": "orbital_period"}},
        "expression": "o + 0.5"
    }))
    .unwrap();

    assert_eq!(pipeline.solve(&intent).await.unwrap(), dec("304.5"));
    assert_eq!(pipeline.solve(&intent).await.unwrap(), dec("304.5"));
    assert_eq!(cache.len(), 3);
    assert_eq!(
        cache.get(galactic::EntityKind::Character, "leia organa"),
        Some(None)
    );
}

#[tokio::test]
async fn it_builds_a_pipeline_from_config() {
    let config = SolverConfig::from_json_str(r#"{"cache_lookups": false}"#).unwrap();
    let pipeline = AnswerPipeline::from_config(registry(), &config);
    let intent = ParsedIntent::from_value(json!({
        "entities": [{"type": "planet", "name": "tatooine"}],
        "vars": {"r": {"entity": 0, "attribute": "rotation_period"}},
        "expression": "r / 24"
    }))
    .unwrap();
    assert_eq!(pipeline.solve(&intent).await.unwrap(), dec("0.9583333333"));
}
