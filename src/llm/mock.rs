//! Mock LLM client for testing.
//!
//! Provides deterministic responses: a script consumed in order, patterns
//! matched against the question, or a built-in default per question shape.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{AppError, Result};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// One scripted reply.
#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Failure(String),
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Scripted>,
    /// Last scripted reply, repeated once the script runs dry.
    last: Option<Scripted>,
    prompts: Vec<String>,
}

/// Mock LLM client that returns canned responses.
///
/// Clones share state, so a test can keep a handle to inspect the prompts
/// after handing the client to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    state: Arc<Mutex<MockState>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that replies with `responses` in order.
    ///
    /// After the last one it keeps repeating it.
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for response in responses {
            client.push(Scripted::Text(response.into()));
        }
        client
    }

    /// Appends a scripted text reply.
    pub fn then_respond(self, response: impl Into<String>) -> Self {
        self.push(Scripted::Text(response.into()));
        self
    }

    /// Appends a scripted provider failure.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Failure(message.into()));
        self
    }

    /// Adds a custom response mapping.
    ///
    /// When the question contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Returns every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    /// Returns how many completions were requested.
    pub fn call_count(&self) -> usize {
        self.lock().prompts.len()
    }

    fn push(&self, reply: Scripted) {
        self.lock().script.push_back(reply);
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded prompts from others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Generates a reply for questions with no scripted or custom response.
    fn default_response(&self, prompt: &str) -> String {
        let question = extract_question(prompt).to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if question.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if question.contains("revenue") {
            return "```sql\nSELECT country, SUM(tourism_revenue_usd) AS total_revenue\nFROM tourism_stats\nGROUP BY country\nORDER BY total_revenue DESC\n```"
                .to_string();
        }

        if question.contains("visitor") {
            return "```sql\nSELECT country, visitors_millions FROM tourism_stats WHERE year = 2023\n```"
                .to_string();
        }

        if question.contains("count") || question.contains("how many") {
            return "SELECT COUNT(*) AS records FROM tourism_stats".to_string();
        }

        if question.contains("delete") || question.contains("remove") {
            return "DELETE FROM tourism_stats".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }
}

/// Pulls the question back out of the instruction prompt.
fn extract_question(prompt: &str) -> &str {
    let Some((_, rest)) = prompt.split_once("Question:\n") else {
        return prompt;
    };
    rest.split_once("\nPrevious error:")
        .map(|(question, _)| question)
        .unwrap_or(rest)
        .trim()
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let scripted = {
            let mut state = self.lock();
            state.prompts.push(prompt.clone());
            match state.script.pop_front() {
                Some(next) => {
                    state.last = Some(next.clone());
                    Some(next)
                }
                None => state.last.clone(),
            }
        };

        match scripted {
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Failure(message)) => Err(AppError::generation(message)),
            None => Ok(self.default_response(&prompt)),
        }
    }
}
