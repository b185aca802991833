//! Text-to-SQL pipeline: generate, validate, execute, retry with feedback.
//!
//! Each question walks a small state machine. Any stage failure becomes a
//! typed [`StageFailure`] whose feedback text is handed to the next generation
//! call. Once the failures exceed the retry budget the run is exhausted.
//!
//! ```text
//! Idle -> Generating -> Validating -> Executing -> Success
//!             ^             |             |
//!             |             v             v
//!             +-------- Retrying <--------+ -> Exhausted
//! ```

mod outcome;

pub use outcome::{AttemptResult, Stage, StageFailure};

use tracing::{debug, info, warn};

use crate::db::DatabaseClient;
use crate::llm::SqlGenerator;
use crate::safety::{classify_sql, sanitize_sql};

/// Retries allowed after the first attempt, unless configured otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Where a run currently is.
#[derive(Debug)]
enum PipelineState {
    Generating,
    Validating(String),
    Executing(String),
    Retrying(StageFailure),
}

/// Composes generator, safety gate and executor.
pub struct Pipeline {
    generator: SqlGenerator,
    db: Box<dyn DatabaseClient>,
    max_attempts: u32,
}

impl Pipeline {
    /// Creates a pipeline with the default retry budget.
    pub fn new(generator: SqlGenerator, db: Box<dyn DatabaseClient>) -> Self {
        Self {
            generator,
            db,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets the retry budget used by [`Pipeline::ask`].
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Returns the configured retry budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Answers `question` with the configured retry budget.
    pub async fn ask(&self, question: &str) -> AttemptResult {
        self.run_text_to_sql(question, self.max_attempts).await
    }

    /// Answers `question`, allowing `max_attempts` retries after the first try.
    ///
    /// At most `max_attempts + 1` completions and executions happen, strictly
    /// one after another.
    pub async fn run_text_to_sql(&self, question: &str, max_attempts: u32) -> AttemptResult {
        let mut attempts: u32 = 0;
        let mut last_error: Option<StageFailure> = None;
        let mut state = PipelineState::Generating;

        loop {
            state = match state {
                PipelineState::Generating => {
                    let feedback = last_error.as_ref().map(StageFailure::feedback);
                    match self.generator.generate(question, feedback).await {
                        Ok(raw) => PipelineState::Validating(raw),
                        Err(e) => PipelineState::Retrying(StageFailure::generation(&e)),
                    }
                }

                PipelineState::Validating(raw) => match sanitize_sql(&raw) {
                    Ok(sql) => {
                        audit(&sql);
                        PipelineState::Executing(sql)
                    }
                    Err(e) => {
                        debug!(raw_len = raw.len(), "Completion rejected by read-only gate");
                        PipelineState::Retrying(StageFailure::validation(&e))
                    }
                },

                PipelineState::Executing(sql) => match self.db.execute_query(&sql).await {
                    Ok(rows) => {
                        info!(
                            attempts,
                            row_count = rows.row_count,
                            "Question answered"
                        );
                        return AttemptResult::success(sql, rows, attempts);
                    }
                    Err(e) => PipelineState::Retrying(StageFailure::execution(&e)),
                },

                PipelineState::Retrying(failure) => {
                    attempts += 1;
                    warn!(
                        attempt = attempts,
                        stage = %failure.stage(),
                        "Attempt failed: {}",
                        failure.feedback()
                    );

                    if attempts > max_attempts {
                        warn!(attempts, "Retry budget exhausted");
                        return AttemptResult::exhausted(failure.feedback(), attempts);
                    }

                    last_error = Some(failure);
                    PipelineState::Generating
                }
            };
        }
    }
}

/// Logs what the parser thinks of a query the textual gate accepted.
fn audit(sql: &str) {
    let classification = classify_sql(sql);
    if classification.is_read_only() {
        return;
    }

    match classification.parse_error {
        Some(ref parse_error) => debug!("Accepted query did not parse: {}", parse_error),
        None => warn!(
            level = %classification.level,
            statement = %classification.statement_type,
            "Accepted query contains a non-read-only statement"
        ),
    }
}
