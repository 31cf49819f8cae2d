//! Common utilities shared across report generators.

use crate::metrics::{MetricValue, Table};
use chrono::{DateTime, Utc};

/// Format a scalar metric value using consistent formatting rules.
///
/// `DateTime` values are formatted as date-only (YYYY-MM-DD) for readability.
/// Maps and tables are summarized; generators lay them out themselves.
pub fn format_metric_value(value: &MetricValue) -> String {
    match value {
        MetricValue::UInt(u) => u.to_string(),
        MetricValue::Float(f) => format!("{f:.2}"),
        MetricValue::Boolean(b) => b.to_string(),
        MetricValue::String(s) => s.to_string(),
        MetricValue::DateTime(dt) => dt.format("%Y-%m-%d").to_string(),
        MetricValue::Map(map) => format!("{} entries", map.len()),
        MetricValue::Table(table) => format!("{} rows", table.rows.len()),
    }
}

/// Format an optional window bound.
pub fn format_bound(bound: Option<DateTime<Utc>>) -> String {
    bound.map_or_else(|| "*".to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Render a table as aligned text lines, header first.
pub fn table_lines(table: &Table) -> Vec<String> {
    let cells: Vec<Vec<String>> = table.rows.iter().map(|row| row.iter().map(format_metric_value).collect()).collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| cells.iter().filter_map(|r| r.get(i)).map(String::len).chain([c.len()]).max().unwrap_or(0))
        .collect();

    let render = |row: Vec<&str>| {
        row.iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(cells.len() + 1);
    lines.push(render(table.columns.iter().map(|c| c.as_str()).collect()));
    for row in &cells {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_scalars() {
        assert_eq!(format_metric_value(&MetricValue::UInt(3)), "3");
        assert_eq!(format_metric_value(&MetricValue::Float(1.2345)), "1.23");
        assert_eq!(format_metric_value(&MetricValue::Boolean(true)), "true");
    }

    #[test]
    fn test_table_lines_are_aligned() {
        let mut table = Table::new(["actor", "events"]);
        table.push_row(vec!["alice".into(), MetricValue::UInt(12)]);
        table.push_row(vec!["bo".into(), MetricValue::UInt(3)]);

        let lines = table_lines(&table);
        assert_eq!(lines, vec!["actor  events", "alice  12", "bo     3"]);
    }
}
