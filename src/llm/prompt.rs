//! Prompt construction for SQL generation.
//!
//! The prompt is fixed apart from the question and, on retries, the previous
//! failure message which is appended verbatim so the model can correct itself.

use crate::llm::types::Message;

/// Instruction template. `{question}` and `{error_context}` are substituted.
const SQL_PROMPT_TEMPLATE: &str = r#"
You are a senior data analyst.

Generate a READ-ONLY SQLite SQL query for the table:

tourism_stats(
    country TEXT,
    year INTEGER,
    visitors_millions REAL,
    tourism_revenue_usd REAL
)

Rules:
- ONLY SELECT statements
- NO INSERT, UPDATE, DELETE
- Return ONLY raw SQL
- Do NOT use markdown
- Do NOT add explanations or comments
- The response MUST start with SELECT
- Use valid SQLite syntax

Question:
{question}
{error_context}
"#;

/// Builds the instruction prompt for one generation attempt.
pub fn build_sql_prompt(question: &str, previous_error: Option<&str>) -> String {
    let error_context = previous_error
        .map(|error| format!("\nPrevious error: {error}"))
        .unwrap_or_default();

    // Substitute the error first so a question containing the placeholder text
    // is left alone.
    SQL_PROMPT_TEMPLATE
        .replace("{error_context}", &error_context)
        .replacen("{question}", question, 1)
}

/// Builds the message list for one generation attempt.
///
/// The whole prompt travels as a single user message.
pub fn build_messages(question: &str, previous_error: Option<&str>) -> Vec<Message> {
    vec![Message::user(build_sql_prompt(question, previous_error))]
}
