//! Advisory classification of validated SQL.
//!
//! Uses sqlparser-rs with the SQLite dialect to spot statements the textual
//! gate lets through, such as a `DROP` chained after a leading `SELECT`.
//! Results feed logging only.

use sqlparser::ast::{Query, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use super::{Classification, SafetyLevel, StatementType};

/// SQL classifier that parses and classifies SQL queries.
#[derive(Debug)]
pub struct SqlClassifier {
    dialect: SQLiteDialect,
}

impl Default for SqlClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlClassifier {
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// Classifies a SQL string. Unparseable input is reported as destructive.
    pub fn classify(&self, sql: &str) -> Classification {
        let statements = match Parser::parse_sql(&self.dialect, sql) {
            Ok(statements) => statements,
            Err(e) => return Classification::unparsed(e.to_string()),
        };

        match statements.as_slice() {
            [] => Classification::unparsed("Empty SQL statement"),
            [single] => {
                let (level, stmt_type) = classify_statement(single);
                Classification::new(level, stmt_type)
            }
            many => {
                let (level, stmt_type) = many
                    .iter()
                    .map(classify_statement)
                    .fold((SafetyLevel::Safe, StatementType::Select), most_dangerous);
                Classification::new(level, StatementType::Multiple(Box::new(stmt_type)))
            }
        }
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str) -> Classification {
    SqlClassifier::new().classify(sql)
}

fn most_dangerous(
    current: (SafetyLevel, StatementType),
    candidate: (SafetyLevel, StatementType),
) -> (SafetyLevel, StatementType) {
    if candidate.0.priority() > current.0.priority() {
        candidate
    } else {
        current
    }
}

fn classify_statement(statement: &Statement) -> (SafetyLevel, StatementType) {
    match statement {
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            if *analyze {
                let (inner_level, _) = classify_statement(statement);
                (inner_level, StatementType::Explain)
            } else {
                (SafetyLevel::Safe, StatementType::Explain)
            }
        }
        Statement::ExplainTable { .. } => (SafetyLevel::Safe, StatementType::Explain),

        Statement::Insert { .. } => (SafetyLevel::Mutating, StatementType::Insert),
        Statement::Update { .. } => (SafetyLevel::Mutating, StatementType::Update),

        Statement::Delete { .. } => (SafetyLevel::Destructive, StatementType::Delete),
        Statement::Drop { .. } => (SafetyLevel::Destructive, StatementType::Drop),
        Statement::AlterTable { .. } => (SafetyLevel::Destructive, StatementType::Alter),
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateVirtualTable { .. } => {
            (SafetyLevel::Destructive, StatementType::Create)
        }
        Statement::Pragma { .. } => (SafetyLevel::Destructive, StatementType::Pragma),
        Statement::AttachDatabase { .. } => (SafetyLevel::Destructive, StatementType::Attach),

        _ => (SafetyLevel::Destructive, StatementType::Unknown),
    }
}

/// Inspects CTEs and the body for data-modifying operations.
fn classify_query(query: &Query) -> (SafetyLevel, StatementType) {
    let ctes = query
        .with
        .iter()
        .flat_map(|with| with.cte_tables.iter())
        .map(|cte| classify_query(&cte.query));

    ctes.chain(std::iter::once(classify_set_expr(&query.body)))
        .fold((SafetyLevel::Safe, StatementType::Select), most_dangerous)
}

fn classify_set_expr(set_expr: &SetExpr) -> (SafetyLevel, StatementType) {
    match set_expr {
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::Select(select) => select
            .from
            .iter()
            .map(classify_table_with_joins)
            .fold((SafetyLevel::Safe, StatementType::Select), most_dangerous),
        SetExpr::SetOperation { left, right, .. } => {
            most_dangerous(classify_set_expr(left), classify_set_expr(right))
        }
        _ => (SafetyLevel::Safe, StatementType::Select),
    }
}

fn classify_table_with_joins(twj: &TableWithJoins) -> (SafetyLevel, StatementType) {
    std::iter::once(&twj.relation)
        .chain(twj.joins.iter().map(|join| &join.relation))
        .map(classify_table_factor)
        .fold((SafetyLevel::Safe, StatementType::Select), most_dangerous)
}

fn classify_table_factor(factor: &TableFactor) -> (SafetyLevel, StatementType) {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (SafetyLevel::Safe, StatementType::Select),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_classification(sql: &str, expected_level: SafetyLevel, expected_type: StatementType) {
        let result = classify_sql(sql);
        assert_eq!(
            result.level, expected_level,
            "SQL: '{}' - expected level {:?}, got {:?}",
            sql, expected_level, result.level
        );
        assert_eq!(
            result.statement_type, expected_type,
            "SQL: '{}' - expected type {:?}, got {:?}",
            sql, expected_type, result.statement_type
        );
    }

    #[test]
    fn test_select_is_safe() {
        assert_classification(
            "SELECT country, visitors_millions FROM tourism_stats WHERE year = 2023",
            SafetyLevel::Safe,
            StatementType::Select,
        );
    }

    #[test]
    fn test_aggregate_with_subquery_is_safe() {
        assert_classification(
            "SELECT country FROM (SELECT country, SUM(tourism_revenue_usd) AS r FROM tourism_stats GROUP BY country) t ORDER BY r DESC",
            SafetyLevel::Safe,
            StatementType::Select,
        );
    }

    #[test]
    fn test_cte_select_is_safe() {
        assert_classification(
            "WITH recent AS (SELECT * FROM tourism_stats WHERE year = 2023) SELECT * FROM recent",
            SafetyLevel::Safe,
            StatementType::Select,
        );
    }

    #[test]
    fn test_union_is_safe() {
        assert_classification(
            "SELECT country FROM tourism_stats WHERE year = 2019 UNION SELECT country FROM tourism_stats WHERE year = 2023",
            SafetyLevel::Safe,
            StatementType::Select,
        );
    }

    #[test]
    fn test_insert_is_mutating() {
        assert_classification(
            "INSERT INTO tourism_stats VALUES ('Poland', 2023, 19, 15)",
            SafetyLevel::Mutating,
            StatementType::Insert,
        );
    }

    #[test]
    fn test_delete_is_destructive() {
        assert_classification(
            "DELETE FROM tourism_stats",
            SafetyLevel::Destructive,
            StatementType::Delete,
        );
    }

    #[test]
    fn test_drop_is_destructive() {
        assert_classification(
            "DROP TABLE tourism_stats",
            SafetyLevel::Destructive,
            StatementType::Drop,
        );
    }

    #[test]
    fn test_select_then_drop_is_flagged() {
        let result = classify_sql("SELECT 1; DROP TABLE tourism_stats");
        assert_eq!(result.level, SafetyLevel::Destructive);
        assert_eq!(
            result.statement_type,
            StatementType::Multiple(Box::new(StatementType::Drop))
        );
        assert!(!result.is_read_only());
    }

    #[test]
    fn test_multi_statement_all_safe() {
        let result = classify_sql("SELECT 1; SELECT 2");
        assert!(result.is_read_only());
        assert_eq!(
            result.statement_type,
            StatementType::Multiple(Box::new(StatementType::Select))
        );
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let result = classify_sql("SELEC country FRM tourism_stats");
        assert_eq!(result.level, SafetyLevel::Destructive);
        assert_eq!(result.statement_type, StatementType::Unknown);
        assert!(result.parse_error.is_some());
    }

    #[test]
    fn test_empty_sql_is_reported() {
        let result = classify_sql("   ");
        assert!(result.parse_error.is_some());
    }
}
