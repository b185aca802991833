//! SQLite query executor.
//!
//! Runs already-validated queries against the fixture store over a read-only
//! connection and converts rows into [`QueryResult`].

use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Either, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef};
use tracing::debug;

use super::{error_message, open_connection, ColumnInfo, DatabaseClient, OpenMode, QueryResult};
use super::{Row, Value};
use crate::error::{AppError, Result};

/// Reported when a query string holds more than one statement.
pub const MULTIPLE_STATEMENTS: &str = "You can only execute one statement at a time.";

/// Query executor bound to one SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteClient {
    path: PathBuf,
}

impl SqliteClient {
    /// Creates an executor for the database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Describes the result columns of `sql` without needing a row.
    async fn describe_columns(conn: &mut SqliteConnection, sql: &str) -> Result<Vec<ColumnInfo>> {
        let statement = (&mut *conn)
            .prepare(sql)
            .await
            .map_err(|e| AppError::execution(error_message(&e)))?;

        Ok(statement
            .columns()
            .iter()
            .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
            .collect())
    }

    /// Runs `sql` and collects the rows of its only statement.
    ///
    /// Anything the engine reports after the first statement completes means
    /// the string held a second statement.
    async fn fetch_single_statement(
        conn: &mut SqliteConnection,
        sql: &str,
    ) -> Result<Vec<SqliteRow>> {
        let mut steps = sqlx::raw_sql(sql).fetch_many(&mut *conn);
        let mut rows = Vec::new();
        let mut completed = false;

        while let Some(step) = steps
            .try_next()
            .await
            .map_err(|e| AppError::execution(error_message(&e)))?
        {
            if completed {
                return Err(AppError::execution(MULTIPLE_STATEMENTS));
            }
            match step {
                Either::Left(_) => completed = true,
                Either::Right(row) => rows.push(row),
            }
        }

        Ok(rows)
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let mut conn = open_connection(&self.path, OpenMode::ReadOnly)
            .await
            .map_err(|e| AppError::execution(error_message(&e)))?;

        let fetched = Self::fetch_single_statement(&mut conn, sql).await;

        let result = match fetched {
            Ok(rows) => {
                let columns = match rows.first() {
                    Some(first) => first
                        .columns()
                        .iter()
                        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                        .collect(),
                    None => match Self::describe_columns(&mut conn, sql).await {
                        Ok(columns) => columns,
                        Err(e) => {
                            debug!("Describing empty result failed: {}", e);
                            Vec::new()
                        }
                    },
                };
                let rows: Vec<Row> = rows.iter().map(convert_row).collect();
                Ok(QueryResult::with_data(columns, rows).with_execution_time(start.elapsed()))
            }
            Err(e) => Err(e),
        };

        // The query outcome matters more than a failed close.
        if let Err(e) = conn.close().await {
            debug!("Closing executor connection failed: {}", e);
        }

        if let Ok(ref qr) = result {
            debug!(
                row_count = qr.row_count,
                execution_ms = qr.execution_time.as_millis(),
                "Query executed"
            );
        }

        result
    }
}

/// Converts a SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts one cell using the storage class of the value itself.
///
/// SQLite is dynamically typed, so the declared column type is only a hint.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
