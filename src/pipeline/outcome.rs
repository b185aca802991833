//! Per-stage failures and the result of one pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::QueryResult;
use crate::error::AppError;

/// Pipeline stage that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Generation,
    Validation,
    Execution,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generation => write!(f, "generation"),
            Self::Validation => write!(f, "validation"),
            Self::Execution => write!(f, "execution"),
        }
    }
}

/// A failed attempt, tagged with the stage it failed in.
///
/// The feedback text is the bare message of the underlying error, without the
/// category prefix, because it goes back into the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageFailure {
    Generation(String),
    Validation(String),
    Execution(String),
}

impl StageFailure {
    pub fn generation(error: &AppError) -> Self {
        Self::Generation(error.message().to_string())
    }

    pub fn validation(error: &AppError) -> Self {
        Self::Validation(error.message().to_string())
    }

    pub fn execution(error: &AppError) -> Self {
        Self::Execution(error.message().to_string())
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Generation(_) => Stage::Generation,
            Self::Validation(_) => Stage::Validation,
            Self::Execution(_) => Stage::Execution,
        }
    }

    /// Text handed to the next generation call as corrective context.
    pub fn feedback(&self) -> &str {
        match self {
            Self::Generation(msg) | Self::Validation(msg) | Self::Execution(msg) => msg,
        }
    }
}

/// Outcome of one question.
///
/// Either `query` and `rows` are set and `error` is not, or the reverse.
/// `attempts` counts failed attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub query: Option<String>,
    pub rows: Option<QueryResult>,
    pub error: Option<String>,
    pub attempts: u32,
}

impl AttemptResult {
    pub fn success(query: String, rows: QueryResult, attempts: u32) -> Self {
        Self {
            query: Some(query),
            rows: Some(rows),
            error: None,
            attempts,
        }
    }

    pub fn exhausted(error: impl Into<String>, attempts: u32) -> Self {
        Self {
            query: None,
            rows: None,
            error: Some(error.into()),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
