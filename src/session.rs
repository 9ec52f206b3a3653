//! # Timed batches
//!
//! A [`Session`] answers a list of problems against a wall-clock budget. Every problem
//! gets an answer: the computed one, or the configured default when the statement
//! failed or ran out of time. Once the batch budget is spent no new problem is started
//! and the rest are reported as not attempted.

use std::{collections::HashMap, path::Path, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SolverConfig;
use crate::error::{Error, FailureKind, InternalResult};
use crate::intent::{parse_statement, IntentParser, ParsedIntent};
use crate::pipeline::{AnswerPipeline, Outcome};

/// One statement to answer. A problem may carry the parser reply already, in which
/// case the [`IntentParser`] is not asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(default)]
    pub id: Option<String>,
    pub statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,
}

impl Problem {
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            id: None,
            statement: statement.into(),
            completion: None,
        }
    }

    pub fn with_completion(mut self, completion: impl Into<String>) -> Self {
        self.completion = Some(completion.into());
        self
    }

    pub fn load_all<P: AsRef<Path>>(path: P) -> InternalResult<Vec<Problem>> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read problems {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse problems: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRecord {
    pub id: String,
    pub statement: String,
    /// What was submitted; `None` for a problem that was never started.
    pub submitted: Option<Decimal>,
    pub outcome: Option<Outcome>,
    pub elapsed_ms: u64,
}

impl AnswerRecord {
    pub fn attempted(&self) -> bool {
        self.outcome.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub answers: Vec<AnswerRecord>,
}

impl BatchReport {
    pub fn solved(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| matches!(a.outcome, Some(Outcome::Solved { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| matches!(a.outcome, Some(Outcome::Failed { .. })))
            .count()
    }

    pub fn not_attempted(&self) -> usize {
        self.answers.iter().filter(|a| !a.attempted()).count()
    }

    pub fn failure_counts(&self) -> HashMap<FailureKind, usize> {
        let mut counts = HashMap::new();
        for kind in self
            .answers
            .iter()
            .filter_map(|a| a.outcome.as_ref().and_then(Outcome::failure_kind))
        {
            *counts.entry(kind).or_insert(0) += 1;
        }
        counts
    }
}

pub struct Session {
    pipeline: AnswerPipeline,
    parser: Arc<dyn IntentParser>,
    config: SolverConfig,
}

impl Session {
    pub fn new(pipeline: AnswerPipeline, parser: Arc<dyn IntentParser>, config: SolverConfig) -> Self {
        Self {
            pipeline,
            parser,
            config,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    async fn intent_for(&self, problem: &Problem) -> InternalResult<ParsedIntent> {
        let intent = match &problem.completion {
            Some(content) => ParsedIntent::from_completion(content)?,
            None => parse_statement(self.parser.as_ref(), &problem.statement).await?,
        };
        Ok(intent)
    }

    async fn attempt(&self, problem: &Problem) -> Outcome {
        match self.intent_for(problem).await {
            Ok(intent) => self.pipeline.solve_outcome(&intent).await,
            Err(e) => {
                warn!(statement = %problem.statement, "could not parse statement: {}", e);
                Outcome::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        }
    }

    /// Answers one problem within `budget`.
    pub async fn answer(&self, problem: &Problem, budget: Duration) -> Outcome {
        match timeout(budget, self.attempt(problem)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(statement = %problem.statement, ?budget, "statement timed out");
                Outcome::Failed {
                    kind: FailureKind::Timeout,
                    message: format!("no answer within {} ms", budget.as_millis()),
                }
            }
        }
    }

    #[tracing::instrument(level = "info", skip_all, fields(problems = problems.len()))]
    pub async fn run(&self, problems: Vec<Problem>) -> BatchReport {
        let started_at = Utc::now();
        let deadline = Instant::now() + self.config.batch_time_limit;
        let mut answers = Vec::with_capacity(problems.len());

        for problem in problems {
            let id = problem
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let now = Instant::now();

            if now >= deadline {
                debug!(%id, "batch budget spent, skipping");
                answers.push(AnswerRecord {
                    id,
                    statement: problem.statement,
                    submitted: None,
                    outcome: None,
                    elapsed_ms: 0,
                });
                continue;
            }

            let budget = self.config.statement_timeout.min(deadline - now);
            let outcome = self.answer(&problem, budget).await;
            let submitted = outcome.answer_or(self.config.default_answer);
            debug!(%id, %submitted, "answered");

            answers.push(AnswerRecord {
                id,
                statement: problem.statement,
                submitted: Some(submitted),
                outcome: Some(outcome),
                elapsed_ms: now.elapsed().as_millis() as u64,
            });
        }

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            answers,
        };
        info!(
            solved = report.solved(),
            failed = report.failed(),
            not_attempted = report.not_attempted(),
            "batch finished"
        );
        report
    }
}
