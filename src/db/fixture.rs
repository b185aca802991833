//! The fixture store: one hardcoded table loaded on first run.

use std::path::{Path, PathBuf};

use sqlx::Connection;
use tracing::{debug, info};

use super::{error_message, open_connection, DatabaseClient, OpenMode, QueryResult, SqliteClient};
use crate::error::{AppError, Result};

/// Name of the only table the pipeline knows about.
pub const TABLE_NAME: &str = "tourism_stats";

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE tourism_stats (
    country TEXT,
    year INTEGER,
    visitors_millions REAL,
    tourism_revenue_usd REAL
)
"#;

const INSERT_SQL: &str = "INSERT INTO tourism_stats \
     (country, year, visitors_millions, tourism_revenue_usd) VALUES (?, ?, ?, ?)";

/// One row of tourism statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub country: &'static str,
    pub year: i64,
    pub visitors_millions: f64,
    /// Billions of USD.
    pub tourism_revenue_usd: f64,
}

const fn record(
    country: &'static str,
    year: i64,
    visitors_millions: f64,
    tourism_revenue_usd: f64,
) -> Record {
    Record {
        country,
        year,
        visitors_millions,
        tourism_revenue_usd,
    }
}

/// Fixture data, in load order.
pub const FIXTURE_RECORDS: [Record; 21] = [
    record("Japan", 2019, 31.0, 190.0),
    record("Japan", 2022, 25.0, 170.0),
    record("Japan", 2023, 32.0, 210.0),
    record("France", 2019, 90.0, 210.0),
    record("France", 2022, 75.0, 185.0),
    record("France", 2023, 79.0, 190.0),
    record("Italy", 2019, 65.0, 175.0),
    record("Italy", 2022, 60.0, 170.0),
    record("Italy", 2023, 65.0, 180.0),
    record("Spain", 2019, 83.0, 205.0),
    record("Spain", 2022, 80.0, 195.0),
    record("Spain", 2023, 83.0, 200.0),
    record("Ukraine", 2019, 14.0, 12.0),
    record("Ukraine", 2022, 4.0, 3.0),
    record("Ukraine", 2023, 14.0, 8.0),
    record("Germany", 2019, 39.0, 150.0),
    record("Germany", 2022, 33.0, 135.0),
    record("Germany", 2023, 35.0, 140.0),
    record("United Kingdom", 2019, 41.0, 155.0),
    record("United Kingdom", 2022, 37.0, 145.0),
    record("United Kingdom", 2023, 39.0, 150.0),
];

/// Handle to the SQLite file holding the fixture table.
///
/// Holds only the location; connections are opened per operation.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    path: PathBuf,
}

impl FixtureStore {
    /// Creates a store handle for the database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a read-only query client over this store.
    pub fn client(&self) -> SqliteClient {
        SqliteClient::new(self.path.clone())
    }

    /// Returns true if `table` exists in the store.
    ///
    /// A missing database file counts as "no table" and is left uncreated.
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }

        let mut conn = open_connection(&self.path, OpenMode::ReadOnly)
            .await
            .map_err(storage_error)?;

        let found: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name=?")
                .bind(table)
                .fetch_optional(&mut conn)
                .await
                .map_err(storage_error)?;

        conn.close().await.map_err(storage_error)?;
        Ok(found.is_some())
    }

    /// Creates and loads the fixture table unless it already exists.
    ///
    /// Returns true when the table was (re)built by this call.
    pub async fn ensure_initialized(&self) -> Result<bool> {
        if self.table_exists(TABLE_NAME).await? {
            debug!("Fixture table already present in {}", self.path.display());
            return Ok(false);
        }

        self.load().await?;
        Ok(true)
    }

    /// Drops and reloads the fixture table unconditionally.
    pub async fn reset(&self) -> Result<()> {
        self.load().await
    }

    /// Returns the first `limit` rows of the fixture table.
    pub async fn preview(&self, limit: usize) -> Result<QueryResult> {
        let sql = format!("SELECT * FROM {TABLE_NAME} LIMIT {limit}");
        self.client()
            .execute_query(&sql)
            .await
            .map_err(|e| AppError::storage(e.message()))
    }

    /// Replaces the table with the fixture records in one transaction.
    async fn load(&self) -> Result<()> {
        self.ensure_parent_dirs()?;

        let mut conn = open_connection(&self.path, OpenMode::ReadWriteCreate)
            .await
            .map_err(storage_error)?;

        let mut tx = conn.begin().await.map_err(storage_error)?;

        sqlx::query("DROP TABLE IF EXISTS tourism_stats")
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        sqlx::query(CREATE_TABLE_SQL)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        for record in &FIXTURE_RECORDS {
            sqlx::query(INSERT_SQL)
                .bind(record.country)
                .bind(record.year)
                .bind(record.visitors_millions)
                .bind(record.tourism_revenue_usd)
                .execute(&mut *tx)
                .await
                .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        conn.close().await.map_err(storage_error)?;

        info!(
            "Loaded {} fixture records into {}",
            FIXTURE_RECORDS.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Ensures parent directories exist for the database path.
    fn ensure_parent_dirs(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if parent.as_os_str().is_empty() {
                return Ok(());
            }
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::storage(format!(
                    "Failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        Ok(())
    }
}

fn storage_error(error: sqlx::Error) -> AppError {
    AppError::storage(error_message(&error))
}
