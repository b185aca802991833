//! End-to-end pipeline tests against a real SQLite file.

use pretty_assertions::assert_eq;
use talk_to_data::db::{DatabaseClient, FixtureStore, Value, MULTIPLE_STATEMENTS};
use talk_to_data::llm::{MockLlmClient, SqlGenerator};
use talk_to_data::pipeline::Pipeline;
use tempfile::{tempdir, TempDir};

const REJECTION: &str = "Only SELECT queries are allowed";

async fn create_store() -> (FixtureStore, TempDir) {
    let dir = tempdir().unwrap();
    let store = FixtureStore::new(dir.path().join("data.db"));
    store.ensure_initialized().await.unwrap();
    (store, dir)
}

fn pipeline(mock: &MockLlmClient, store: &FixtureStore) -> Pipeline {
    Pipeline::new(
        SqlGenerator::new(Box::new(mock.clone())),
        Box::new(store.client()),
    )
}

async fn record_count(store: &FixtureStore) -> Value {
    let result = store
        .client()
        .execute_query("SELECT COUNT(*) FROM tourism_stats")
        .await
        .unwrap();
    result.rows[0][0].clone()
}

#[tokio::test]
async fn test_fenced_visitors_query_answers_first_time() {
    let (store, _dir) = create_store().await;
    let mock = MockLlmClient::scripted([
        "```sql\nSELECT country, visitors_millions FROM tourism_stats WHERE year = 2023\n```",
    ]);

    let result = pipeline(&mock, &store)
        .ask("How many visitors did each country have in 2023?")
        .await;

    assert_eq!(result.error, None);
    assert_eq!(result.attempts, 0);
    assert_eq!(
        result.query.as_deref(),
        Some("SELECT country, visitors_millions FROM tourism_stats WHERE year = 2023")
    );
    let rows = result.rows.unwrap();
    assert_eq!(rows.column_names(), vec!["country", "visitors_millions"]);
    assert_eq!(rows.row_count, 7);
    assert_eq!(rows.rows[0], vec![Value::from("Japan"), Value::Float(32.0)]);
}

#[tokio::test]
async fn test_rejected_delete_is_fed_back_and_retried() {
    let (store, _dir) = create_store().await;
    let mock = MockLlmClient::scripted([
        "DELETE FROM tourism_stats",
        "SELECT COUNT(*) AS records FROM tourism_stats",
    ]);

    let result = pipeline(&mock, &store).ask("Remove everything").await;

    assert_eq!(result.attempts, 1);
    assert_eq!(result.rows.unwrap().rows, vec![vec![Value::Int(21)]]);

    let prompts = mock.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains(&format!("Previous error: {REJECTION}\n")));
    assert_eq!(record_count(&store).await, Value::Int(21));
}

#[tokio::test]
async fn test_prose_every_time_exhausts_budget() {
    let (store, _dir) = create_store().await;
    let mock = MockLlmClient::scripted(["I'm sorry, I can only talk about tourism."]);

    let result = pipeline(&mock, &store).run_text_to_sql("Tell me a joke", 2).await;

    assert_eq!(result.attempts, 3);
    assert_eq!(result.error.as_deref(), Some(REJECTION));
    assert_eq!(result.query, None);
    assert_eq!(result.rows, None);
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn test_database_error_text_is_fed_back() {
    let (store, _dir) = create_store().await;
    let mock = MockLlmClient::scripted([
        "SELECT country, revenue FROM tourism_stats",
        "SELECT country, tourism_revenue_usd FROM tourism_stats WHERE year = 2022",
    ]);

    let result = pipeline(&mock, &store).ask("Revenue per country in 2022").await;

    assert_eq!(result.attempts, 1);
    assert_eq!(result.rows.unwrap().row_count, 7);
    assert!(mock.prompts()[1].contains("Previous error: no such column: revenue"));
}

#[tokio::test]
async fn test_provider_failure_is_retried() {
    let (store, _dir) = create_store().await;
    let mock = MockLlmClient::new()
        .then_fail("Request timed out. Try again.")
        .then_respond("SELECT DISTINCT country FROM tourism_stats");

    let result = pipeline(&mock, &store).ask("Which countries are there?").await;

    assert_eq!(result.attempts, 1);
    assert_eq!(result.rows.unwrap().row_count, 7);
}

#[tokio::test]
async fn test_empty_completion_is_rejected() {
    let (store, _dir) = create_store().await;
    let mock = MockLlmClient::scripted(["   "]);

    let result = pipeline(&mock, &store).run_text_to_sql("", 0).await;

    assert_eq!(result.attempts, 1);
    assert_eq!(result.error.as_deref(), Some(REJECTION));
}

#[tokio::test]
async fn test_write_behind_select_cannot_touch_fixture() {
    let (store, _dir) = create_store().await;
    let mock = MockLlmClient::scripted([
        "SELECT 1; DROP TABLE tourism_stats",
        "SELECT COUNT(*) FROM tourism_stats",
    ]);

    let result = pipeline(&mock, &store).ask("Count the rows").await;

    assert!(result.is_success());
    assert_eq!(record_count(&store).await, Value::Int(21));
}

#[tokio::test]
async fn test_multiple_statements_are_fed_back() {
    let (store, _dir) = create_store().await;
    let mock = MockLlmClient::scripted([
        "SELECT country FROM tourism_stats WHERE year = 2023; \
         SELECT year, visitors_millions FROM tourism_stats WHERE year = 2019",
        "SELECT country, visitors_millions FROM tourism_stats WHERE year = 2019",
    ]);

    let result = pipeline(&mock, &store).ask("Visitors in 2019").await;

    assert_eq!(result.attempts, 1);
    let rows = result.rows.unwrap();
    assert_eq!(rows.column_names(), vec!["country", "visitors_millions"]);
    assert!(rows.rows.iter().all(|row| row.len() == 2));
    assert!(mock.prompts()[1].contains(&format!("Previous error: {MULTIPLE_STATEMENTS}")));
}

#[tokio::test]
async fn test_default_mock_answers_revenue_question() {
    let (store, _dir) = create_store().await;
    let mock = MockLlmClient::new();

    let result = pipeline(&mock, &store)
        .ask("Which country earned the most tourism revenue?")
        .await;

    let rows = result.rows.unwrap();
    assert_eq!(result.attempts, 0);
    assert_eq!(rows.column_names(), vec!["country", "total_revenue"]);
    assert_eq!(rows.rows[0], vec![Value::from("Spain"), Value::Float(600.0)]);
}
