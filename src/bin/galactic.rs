use async_trait::async_trait;
use clap::{command, Parser, Subcommand};
use galactic::{
    config::SolverConfig,
    intent::{instructions, IntentError, IntentParser, IntentResult, ParsedIntent, RecordedIntentParser},
    pipeline::{AnswerPipeline, Outcome},
    session::{Problem, Session},
    source::{FixtureSet, SourceRegistry},
    Error,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value = "galactic.json")]
    config: PathBuf,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer one statement from a recorded intent
    Solve {
        /// File holding the parser reply (JSON, optionally fenced)
        #[arg(short, long)]
        intent: PathBuf,

        #[arg(short, long, default_value = "data/fixtures.json")]
        fixtures: PathBuf,
    },
    /// Answer a list of problems against the batch budget
    Batch {
        #[arg(short, long)]
        problems: PathBuf,

        #[arg(short, long, default_value = "data/fixtures.json")]
        fixtures: PathBuf,

        /// Reply to use for problems that carry none
        #[arg(long)]
        completion: Option<PathBuf>,
    },
    /// Print the instructions a model-backed parser is given
    Prompt {
        /// Include the reminder sent when a reply could not be decoded
        #[arg(long)]
        strict: bool,
    },
}

/// Stand-in when no model is wired up: only problems with their own completion get
/// answered.
struct OfflineParser;

#[async_trait]
impl IntentParser for OfflineParser {
    async fn complete(&self, _statement: &str, _strict: bool) -> IntentResult<String> {
        Err(IntentError::Completion("no parser configured".to_string()))
    }
}

fn read(path: &Path, what: &str) -> Result<String, Error> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {} file {:?}: {}", what, path, e)))
}

fn pipeline(fixtures: &Path, config: &SolverConfig) -> Result<AnswerPipeline, Error> {
    let set = FixtureSet::from_file(fixtures)?;
    debug!(kinds = ?set.kinds().collect::<Vec<_>>(), "fixtures loaded");
    let sources = SourceRegistry::with_sources(set.into_sources());
    Ok(AnswerPipeline::from_config(sources, config))
}

async fn run(cli: &Cli) -> Result<(), Error> {
    let config = if cli.config.exists() {
        SolverConfig::from_file(&cli.config)?
    } else {
        SolverConfig::default()
    };
    info!("config loaded.");
    debug!("config: {:?}", config);

    match &cli.command {
        Command::Solve { intent, fixtures } => {
            let intent = ParsedIntent::from_completion(&read(intent, "intent")?)?;
            let pipeline = pipeline(fixtures, &config)?;
            match pipeline.solve_outcome(&intent).await {
                Outcome::Solved { answer } => println!("{}", answer),
                Outcome::Failed { kind, message } => {
                    println!("{} ({})", config.default_answer, kind);
                    debug!("failure: {}", message);
                }
            }
        }
        Command::Batch {
            problems,
            fixtures,
            completion,
        } => {
            let problems = Problem::load_all(problems)?;
            let parser: Arc<dyn IntentParser> = match completion {
                Some(path) => Arc::new(RecordedIntentParser::new(read(path, "completion")?)),
                None => Arc::new(OfflineParser),
            };
            let session = Session::new(pipeline(fixtures, &config)?, parser, config);
            let report = session.run(problems).await;
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| Error::internal(format!("Failed to render report: {}", e)))?;
            println!("{}", json);
        }
        Command::Prompt { strict } => println!("{}", instructions(*strict)),
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
