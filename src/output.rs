//! Output formatting for answers and the table preview.
//!
//! Text output draws results as boxed tables with auto-sized columns, plus a
//! horizontal bar chart when the second column is numeric. JSON output is the
//! serialized [`AttemptResult`].

use crate::cli::OutputFormat;
use crate::db::{QueryResult, Value, TABLE_NAME};
use crate::error::{AppError, Result};
use crate::pipeline::AttemptResult;

/// Maximum width for any column.
const MAX_COLUMN_WIDTH: usize = 40;

/// Minimum width for any column.
const MIN_COLUMN_WIDTH: usize = 4;

/// Width of the longest bar in the chart.
const BAR_WIDTH: usize = 40;

/// Shown when no query could be produced.
pub const FAILURE_HEADLINE: &str = "Could not generate a valid SQL query.";

/// Column descriptions printed with the preview.
const COLUMN_GUIDE: [(&str, &str); 4] = [
    ("country", "Country name"),
    ("year", "Year"),
    ("visitors_millions", "Number of visitors (in millions)"),
    ("tourism_revenue_usd", "Tourism revenue (USD, billions)"),
];

/// Formats one answer in the requested format.
pub fn format_answer(result: &AttemptResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_answer(result)),
        OutputFormat::Json => render_json(result),
    }
}

/// Renders an answer as human-readable text.
pub fn render_answer(result: &AttemptResult) -> String {
    let (Some(sql), Some(rows)) = (&result.query, &result.rows) else {
        return format!(
            "{}\n{}\n",
            FAILURE_HEADLINE,
            result.error.as_deref().unwrap_or_default()
        );
    };

    let mut out = String::new();
    match result.attempts {
        0 => out.push_str("Query executed successfully\n\n"),
        1 => out.push_str("Query executed successfully after 1 failed attempt\n\n"),
        n => out.push_str(&format!(
            "Query executed successfully after {n} failed attempts\n\n"
        )),
    }

    out.push_str("Generated SQL:\n");
    for line in sql.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }

    out.push_str("\nResult:\n");
    out.push_str(&render_table(rows));

    if let Some(chart) = render_bar_chart(rows) {
        out.push_str("\nVisualization:\n");
        out.push_str(&chart);
    }

    out
}

/// Serializes an answer as pretty-printed JSON.
pub fn render_json(result: &AttemptResult) -> Result<String> {
    serde_json::to_string_pretty(result)
        .map(|json| format!("{json}\n"))
        .map_err(|e| AppError::internal(format!("Failed to serialize result: {e}")))
}

/// Formats the table preview in the requested format.
///
/// JSON keeps stdout machine-readable, so the column guide is left out.
pub fn format_preview(preview: &QueryResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_preview(preview)),
        OutputFormat::Json => serde_json::to_string_pretty(preview)
            .map(|json| format!("{json}\n"))
            .map_err(|e| AppError::internal(format!("Failed to serialize preview: {e}"))),
    }
}

/// Renders the table preview followed by the column guide.
pub fn render_preview(preview: &QueryResult) -> String {
    let mut out = format!("Table preview ({TABLE_NAME}):\n");
    out.push_str(&render_table(preview));
    out.push_str("\nAvailable columns:\n");
    for (name, description) in COLUMN_GUIDE {
        out.push_str(&format!("  - {name}: {description}\n"));
    }
    out
}

/// Renders a result as a boxed table with a row-count footer.
pub fn render_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return "(empty result)\n".to_string();
    }

    let widths = column_widths(result);
    let mut lines = Vec::with_capacity(result.rows.len() + 5);

    lines.push(border(&widths, '┌', '┬', '┐'));

    let header: Vec<String> = result.columns.iter().map(|c| c.name.clone()).collect();
    lines.push(cells_line(&header, &widths));

    lines.push(border(&widths, '├', '┼', '┤'));

    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(Value::to_display_string).collect();
        lines.push(cells_line(&cells, &widths));
    }

    lines.push(border(&widths, '└', '┴', '┘'));

    lines.push(format!(
        "{} row{} returned ({}ms)",
        result.row_count,
        if result.row_count == 1 { "" } else { "s" },
        result.execution_time.as_millis()
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Renders the second column as bars labelled by the first.
///
/// Returns `None` unless there are rows, at least two columns, and every
/// value in the second column is numeric.
pub fn render_bar_chart(result: &QueryResult) -> Option<String> {
    if result.columns.len() < 2 || result.rows.is_empty() {
        return None;
    }

    let points = result
        .rows
        .iter()
        .map(|row| {
            let label = row.first().map(Value::to_display_string).unwrap_or_default();
            let value = row.get(1)?;
            value
                .as_f64()
                .map(|v| (truncate(&label, MAX_COLUMN_WIDTH), v, value.to_display_string()))
        })
        .collect::<Option<Vec<_>>>()?;

    let max = points.iter().map(|(_, v, _)| *v).fold(0.0_f64, f64::max);
    let label_width = points
        .iter()
        .map(|(label, _, _)| label.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (label, value, shown) in &points {
        let len = if max > 0.0 && *value > 0.0 {
            ((value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "{label:<label_width$} │{} {shown}\n",
            "█".repeat(len)
        ));
    }
    Some(out)
}

fn column_widths(result: &QueryResult) -> Vec<usize> {
    let mut widths: Vec<usize> = result
        .columns
        .iter()
        .map(|col| col.name.chars().count().max(MIN_COLUMN_WIDTH))
        .collect();

    for row in &result.rows {
        for (i, value) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(value.to_display_string().chars().count());
            }
        }
    }

    widths.iter().map(|&w| w.min(MAX_COLUMN_WIDTH)).collect()
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let inner: Vec<String> = widths.iter().map(|&w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}", inner.join(mid.to_string().as_str()))
}

fn cells_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("│");
    for (i, &width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        line.push_str(&format!(" {:width$} │", truncate(cell, width)));
    }
    line
}

/// Truncates to `max_width` characters, ending in "..." when cut.
fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{kept}...")
    }
}
