//! SQL generator: question in, raw completion text out.
//!
//! One call to [`SqlGenerator::generate`] is one request to the completion
//! provider. The text comes back trimmed but otherwise untouched; sanitizing
//! it is the safety gate's job and retrying is the pipeline's.

use std::time::Instant;

use crate::error::Result;

use super::{build_messages, LlmClient};

/// Turns questions into candidate SQL text through a completion provider.
pub struct SqlGenerator {
    client: Box<dyn LlmClient>,
}

impl SqlGenerator {
    /// Creates a generator over the given client.
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Asks the provider for SQL answering `question`.
    ///
    /// `previous_error` is appended to the prompt verbatim when present.
    pub async fn generate(&self, question: &str, previous_error: Option<&str>) -> Result<String> {
        let messages = build_messages(question, previous_error);

        tracing::debug!(
            question_len = question.len(),
            has_previous_error = previous_error.is_some(),
            prompt_len = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "Requesting SQL completion"
        );

        let start = Instant::now();
        let raw = self.client.complete(&messages).await?;

        tracing::debug!(
            llm_duration_ms = start.elapsed().as_millis(),
            response_len = raw.len(),
            "Received SQL completion"
        );

        Ok(raw.trim().to_string())
    }
}
