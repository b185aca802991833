//! Command-line argument parsing for talk-to-data.
//!
//! Uses clap derive. Flags override the config file, which overrides the
//! built-in defaults.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Output format for answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// SQL, aligned table and optional bar chart.
    #[default]
    Text,
    /// The full attempt result as JSON.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Ask questions about tourism statistics in plain language.
#[derive(Parser, Debug)]
#[command(name = "talk-to-data")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Question to answer. Without it, questions are read from stdin, one per line.
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// SQLite database file holding the fixture table
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// LLM provider to use: openai or mock (overrides config)
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Model name (overrides config and OPENAI_MODEL)
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Retries allowed after the first attempt (overrides config)
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Print the first N rows of the table and the column guide
    #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "10")]
    pub preview: Option<usize>,

    /// Drop and reload the fixture table before doing anything else
    #[arg(long)]
    pub reset: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Applies flag overrides on top of a loaded config.
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(ref path) = self.db {
            config.store.path = path.clone();
        }
        if let Some(ref provider) = self.llm {
            config.llm.provider = provider.clone();
        }
        if let Some(ref model) = self.model {
            config.llm.model = model.clone();
        }
        if let Some(max_attempts) = self.max_attempts {
            config.pipeline.max_attempts = max_attempts;
        }
        config
    }
}
