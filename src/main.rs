//! talk-to-data: ask questions about tourism statistics in plain language.

use std::io::IsTerminal;

use talk_to_data::cli::{Cli, OutputFormat};
use talk_to_data::config::Config;
use talk_to_data::db::FixtureStore;
use talk_to_data::error::{AppError, Result};
use talk_to_data::llm::{create_client, LlmProvider, SqlGenerator};
use talk_to_data::logging::init_logging;
use talk_to_data::output::{format_answer, format_preview};
use talk_to_data::pipeline::Pipeline;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Returns false when a question could not be answered.
async fn run(cli: Cli) -> Result<bool> {
    let format = cli.parse_output_format().map_err(AppError::config)?;

    let config = load_config(&cli)?;

    let store = FixtureStore::new(config.store.path.clone());
    if cli.reset {
        store.reset().await?;
    } else {
        store.ensure_initialized().await?;
    }

    if let Some(limit) = cli.preview {
        let preview = store.preview(limit).await?;
        print!("{}", format_preview(&preview, format)?);
    }

    // Maintenance flags on their own do not start a session.
    if cli.question.is_none() && (cli.preview.is_some() || cli.reset) {
        return Ok(true);
    }

    let provider: LlmProvider = config.llm.provider.parse().map_err(AppError::config)?;
    let client = create_client(provider, None, &config.llm)?;
    let pipeline = Pipeline::new(SqlGenerator::new(client), Box::new(store.client()))
        .with_max_attempts(config.pipeline.max_attempts);

    info!(
        provider = %provider,
        model = %config.llm.model,
        store = %config.store.path.display(),
        max_attempts = pipeline.max_attempts(),
        "Ready"
    );

    match cli.question {
        Some(ref question) => answer(&pipeline, question, format).await,
        None => answer_stdin(&pipeline, format).await,
    }
}

/// Layers config file, environment and flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());

    let mut config = Config::load_from_file(&config_path)?;
    config.llm.apply_env_overrides();
    let config = cli.apply_overrides(config);
    config.validate()?;
    Ok(config)
}

async fn answer(pipeline: &Pipeline, question: &str, format: OutputFormat) -> Result<bool> {
    let result = pipeline.ask(question).await;
    print!("{}", format_answer(&result, format)?);
    Ok(result.is_success())
}

/// Answers one question per non-blank stdin line until EOF.
async fn answer_stdin(pipeline: &Pipeline, format: OutputFormat) -> Result<bool> {
    if std::io::stdin().is_terminal() {
        eprintln!("Ask a question about the data (Ctrl-D to quit).");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut all_answered = true;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| AppError::internal(format!("Failed to read stdin: {e}")))?
    {
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        all_answered &= answer(pipeline, question, format).await?;
    }

    Ok(all_answered)
}
