//! Fixture store integration tests.

use pretty_assertions::assert_eq;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use talk_to_data::db::{DatabaseClient, FixtureStore, Value, FIXTURE_RECORDS, TABLE_NAME};
use tempfile::{tempdir, TempDir};

const ALL_ROWS: &str = "SELECT * FROM tourism_stats";

fn create_store() -> (FixtureStore, TempDir) {
    let dir = tempdir().unwrap();
    let store = FixtureStore::new(dir.path().join("data.db"));
    (store, dir)
}

async fn count(store: &FixtureStore) -> Value {
    let result = store
        .client()
        .execute_query("SELECT COUNT(*) AS n FROM tourism_stats")
        .await
        .unwrap();
    result.rows[0][0].clone()
}

#[tokio::test]
async fn test_initialize_twice_leaves_same_records() {
    let (store, _dir) = create_store();

    assert!(store.ensure_initialized().await.unwrap());
    let first = store.client().execute_query(ALL_ROWS).await.unwrap();

    assert!(!store.ensure_initialized().await.unwrap());
    let second = store.client().execute_query(ALL_ROWS).await.unwrap();

    assert_eq!(first.rows, second.rows);
    assert_eq!(second.row_count, 21);
}

#[tokio::test]
async fn test_loaded_rows_match_fixture() {
    let (store, _dir) = create_store();
    store.ensure_initialized().await.unwrap();

    let result = store.client().execute_query(ALL_ROWS).await.unwrap();

    let expected: Vec<Vec<Value>> = FIXTURE_RECORDS
        .iter()
        .map(|r| {
            vec![
                Value::from(r.country),
                Value::Int(r.year),
                Value::Float(r.visitors_millions),
                Value::Float(r.tourism_revenue_usd),
            ]
        })
        .collect();
    assert_eq!(result.rows, expected);
    assert_eq!(
        result.column_names(),
        vec!["country", "year", "visitors_millions", "tourism_revenue_usd"]
    );
}

#[tokio::test]
async fn test_no_matching_rows_is_empty_table() {
    let (store, _dir) = create_store();
    store.ensure_initialized().await.unwrap();

    let result = store
        .client()
        .execute_query("SELECT * FROM tourism_stats WHERE year = 1900")
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.columns.len(), 4);
}

#[tokio::test]
async fn test_existing_table_is_not_reloaded_until_reset() {
    let (store, _dir) = create_store();
    store.ensure_initialized().await.unwrap();

    let mut conn = SqliteConnectOptions::new()
        .filename(store.path())
        .connect()
        .await
        .unwrap();
    sqlx::query("DELETE FROM tourism_stats WHERE country = 'Ukraine'")
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();

    assert!(!store.ensure_initialized().await.unwrap());
    assert_eq!(count(&store).await, Value::Int(18));

    store.reset().await.unwrap();
    assert_eq!(count(&store).await, Value::Int(21));
}

#[tokio::test]
async fn test_table_exists_tracks_initialization() {
    let (store, _dir) = create_store();

    assert!(!store.table_exists(TABLE_NAME).await.unwrap());
    store.ensure_initialized().await.unwrap();
    assert!(store.table_exists(TABLE_NAME).await.unwrap());
    assert!(!store.table_exists("visitors").await.unwrap());
}
