use std::{str::FromStr, sync::Arc, time::Duration};

use galactic::{
    config::SolverConfig,
    error::FailureKind,
    intent::{IntentParser, RecordedIntentParser},
    pipeline::AnswerPipeline,
    session::{Problem, Session},
    source::{FixtureSet, SourceRegistry},
};
use rust_decimal::Decimal;

use super::FIXTURES;

const TATOOINE_OVER_LUKE: &str = r#"{
    "entities": [
        {"type": "sw_planet", "name": "Tatooine"},
        {"type": "sw_character", "name": "Luke Skywalker"}
    ],
    "vars": {
        "x1": {"entity": 0, "attribute": "diameter"},
        "x2": {"entity": 1, "attribute": "height"}
    },
    "expression": "x1 / x2"
}"#;

fn session(parser: Arc<dyn IntentParser>, config: SolverConfig) -> Session {
    let sources = SourceRegistry::with_sources(FixtureSet::from_json_str(FIXTURES).unwrap().into_sources());
    let pipeline = AnswerPipeline::from_config(sources, &config);
    Session::new(pipeline, parser, config)
}

#[tokio::test]
async fn it_answers_every_problem() {
    let config = SolverConfig {
        default_answer: Decimal::from(-1),
        ..SolverConfig::default()
    };
    let session = session(Arc::new(RecordedIntentParser::new(TATOOINE_OVER_LUKE)), config);

    let problems = vec![
        Problem::new("What is Tatooine's diameter divided by Luke's height?"),
        Problem::new("What is Hoth's population doubled?").with_completion(
            r#"{"entities": [{"type": "planet", "name": "Hoth"}],
                "vars": {"p": {"entity": 0, "attribute": "population"}},
                "expression": "p * 2"}"#,
        ),
        Problem::new("Garbage").with_completion("I cannot answer that."),
    ];
    let report = session.run(problems).await;

    let submitted: Vec<_> = report.answers.iter().map(|a| a.submitted).collect();
    assert_eq!(
        submitted,
        vec![
            Some(Decimal::from_str("60.8430232558").unwrap()),
            Some(Decimal::from(-1)),
            Some(Decimal::from(-1)),
        ]
    );
    let counts = report.failure_counts();
    assert_eq!(counts.get(&FailureKind::MissingAttribute), Some(&1));
    assert_eq!(counts.get(&FailureKind::InvalidParse), Some(&1));
    assert_eq!(report.not_attempted(), 0);
}

#[tokio::test]
async fn it_serializes_the_report() {
    let session = session(
        Arc::new(RecordedIntentParser::new(TATOOINE_OVER_LUKE)),
        SolverConfig::default(),
    );
    let mut problem = Problem::new("diameter over height");
    problem.id = Some("q-1".to_string());

    let report = session.run(vec![problem]).await;
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["answers"][0]["id"], "q-1");
    assert_eq!(json["answers"][0]["submitted"], "60.8430232558");
    assert_eq!(json["answers"][0]["outcome"]["status"], "solved");
}

#[tokio::test(start_paused = true)]
async fn it_stops_when_the_batch_budget_is_spent() {
    let config = SolverConfig {
        batch_time_limit: Duration::ZERO,
        ..SolverConfig::default()
    };
    let session = session(Arc::new(RecordedIntentParser::new(TATOOINE_OVER_LUKE)), config);

    let report = session
        .run(vec![Problem::new("one"), Problem::new("two")])
        .await;
    assert_eq!(report.not_attempted(), 2);
    assert!(report.answers.iter().all(|a| a.submitted.is_none()));
}
