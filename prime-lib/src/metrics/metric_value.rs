use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Serialize;
use std::collections::BTreeMap;

/// The payload of a computed metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    UInt(u64),
    Float(f64),
    String(CompactString),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Map(BTreeMap<CompactString, Self>),
    Table(Table),
}

/// Tabular metric output. Every row has one cell per column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    pub columns: Vec<CompactString>,
    pub rows: Vec<Vec<MetricValue>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<MetricValue>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width must match the column count");
        self.rows.push(row);
    }
}

impl From<u64> for MetricValue {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<usize> for MetricValue {
    fn from(value: usize) -> Self {
        Self::UInt(u64::try_from(value).unwrap_or(u64::MAX))
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<CompactString> for MetricValue {
    fn from(value: CompactString) -> Self {
        Self::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_untagged() {
        let mut map = BTreeMap::new();
        let _ = map.insert(CompactString::from("count"), MetricValue::UInt(3));
        let _ = map.insert(CompactString::from("avg"), MetricValue::Float(1.5));

        let json = serde_json::to_value(MetricValue::Map(map)).unwrap();
        assert_eq!(json, serde_json::json!({ "avg": 1.5, "count": 3 }));
    }

    #[test]
    fn test_serialize_table() {
        let mut table = Table::new(["actor", "events"]);
        table.push_row(vec!["alice".into(), 4_u64.into()]);

        let json = serde_json::to_value(MetricValue::Table(table)).unwrap();
        assert_eq!(json, serde_json::json!({ "columns": ["actor", "events"], "rows": [["alice", 4]] }));
    }
}
