//! Read-only gate for generated SQL.
//!
//! [`sanitize_sql`] is the gate every generated query passes through before it
//! reaches the executor. It is textual: it strips markdown fences, cuts any
//! preamble before the first `select`, and insists the remainder starts with
//! `select`. [`classify_sql`] is advisory only and never changes the verdict.

mod classifier;

pub use classifier::{classify_sql, SqlClassifier};

use std::fmt;

use crate::error::{AppError, Result};

/// Message returned when the gate rejects a candidate query.
pub const READ_ONLY_VIOLATION: &str = "Only SELECT queries are allowed";

const SQL_FENCE: &str = "```sql";
const FENCE: &str = "```";
const SELECT_KEYWORD: &str = "select";

/// Turns raw completion text into a query that begins with `SELECT`.
///
/// Steps, in order: remove every "```sql" then every "```"; trim; cut
/// everything before the first case-insensitive `select`; reject unless what
/// remains starts with `select`.
pub fn sanitize_sql(raw: &str) -> Result<String> {
    let unfenced = raw.replace(SQL_FENCE, "").replace(FENCE, "");
    let mut sql = unfenced.trim();

    // ASCII lowercasing keeps byte offsets aligned with the input.
    if let Some(start) = sql.to_ascii_lowercase().find(SELECT_KEYWORD) {
        sql = &sql[start..];
    }

    let sql = sql.trim();
    if !sql.to_ascii_lowercase().starts_with(SELECT_KEYWORD) {
        return Err(AppError::validation(READ_ONLY_VIOLATION));
    }

    Ok(sql.to_string())
}

/// Safety level of a parsed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SafetyLevel {
    /// Read-only (SELECT, EXPLAIN, VALUES).
    Safe,
    /// Changes data (INSERT, UPDATE, REPLACE).
    Mutating,
    /// Loses data or changes schema (DELETE, DROP, ALTER, CREATE, ...).
    Destructive,
}

impl SafetyLevel {
    /// Higher is more dangerous.
    pub(crate) fn priority(self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::Mutating => 1,
            Self::Destructive => 2,
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Mutating => write!(f, "Mutating"),
            Self::Destructive => write!(f, "Destructive"),
        }
    }
}

/// The type of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementType {
    Select,
    Insert,
    Update,
    Delete,
    Drop,
    Alter,
    Create,
    Explain,
    Pragma,
    Attach,
    /// Multiple statements detected; contains the most dangerous type.
    Multiple(Box<StatementType>),
    /// Statement could not be parsed or is not recognized.
    Unknown,
}

impl fmt::Display for StatementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Drop => write!(f, "DROP"),
            Self::Alter => write!(f, "ALTER"),
            Self::Create => write!(f, "CREATE"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Pragma => write!(f, "PRAGMA"),
            Self::Attach => write!(f, "ATTACH"),
            Self::Multiple(inner) => write!(f, "Multiple ({})", inner),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying a SQL query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub level: SafetyLevel,
    pub statement_type: StatementType,
    /// Set when the text could not be parsed.
    pub parse_error: Option<String>,
}

impl Classification {
    pub fn new(level: SafetyLevel, statement_type: StatementType) -> Self {
        Self {
            level,
            statement_type,
            parse_error: None,
        }
    }

    pub fn unparsed(message: impl Into<String>) -> Self {
        Self {
            level: SafetyLevel::Destructive,
            statement_type: StatementType::Unknown,
            parse_error: Some(message.into()),
        }
    }

    /// Returns true if the query is read-only as far as the parser can tell.
    pub fn is_read_only(&self) -> bool {
        self.level == SafetyLevel::Safe
    }
}
