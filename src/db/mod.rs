//! Database layer for talk-to-data.
//!
//! Owns the fixture store (the single `tourism_stats` table) and the query
//! executor that runs validated queries against it. Every operation opens its
//! own SQLite connection and closes it when done; nothing holds a pool.

mod fixture;
mod sqlite;
mod types;

pub use fixture::{FixtureStore, Record, FIXTURE_RECORDS, TABLE_NAME};
pub use sqlite::{SqliteClient, MULTIPLE_STATEMENTS};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::ConnectOptions;
use std::path::Path;
use std::time::Duration;

/// How long SQLite waits on a locked database file before giving up.
const BUSY_TIMEOUT_SECS: u64 = 5;

/// Trait for clients that can run a read-only query and materialize its rows.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;
}

/// Connection mode for a single-use SQLite connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpenMode {
    /// Read-only; fails if the file does not exist.
    ReadOnly,
    /// Read-write; creates the file if missing.
    ReadWriteCreate,
}

/// Opens a fresh connection to the SQLite file at `path`.
pub(crate) async fn open_connection(
    path: &Path,
    mode: OpenMode,
) -> std::result::Result<SqliteConnection, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

    let options = match mode {
        OpenMode::ReadOnly => options.read_only(true),
        OpenMode::ReadWriteCreate => options.create_if_missing(true),
    };

    options.disable_statement_logging().connect().await
}

/// Extracts the database's own message from a sqlx error when there is one.
pub(crate) fn error_message(error: &sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
