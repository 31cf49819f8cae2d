//! Pre-normalized activity exported by some other tool.

use super::{EventStream, Source, SourceError, SourceFamily};
use crate::events::{AttributeValue, EventDraft, EventKind, TimeWindow};
use chrono::{DateTime, Utc};
use compact_str::{CompactString, format_compact};
use futures::{StreamExt, stream};
use ohno::IntoAppError;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

const LOG_TARGET: &str = "      file";

/// One entry of an export file.
///
/// Every field is optional at this level so that a single bad entry surfaces as a
/// malformed event rather than making the whole file unreadable.
/// Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ExportRecord {
    kind: Option<String>,
    id: Option<Value>,
    timestamp: Option<String>,
    actor: Option<String>,
    #[serde(default)]
    attributes: serde_json::Map<String, Value>,
}

/// Reads a JSON array of activity records from a file.
///
/// Attribute keys without a namespace are placed in the namespace of the record's kind,
/// so `closed_at` on an issue becomes `issue.closed_at`.
#[derive(Debug, Clone)]
pub struct EventsFileSource {
    name: CompactString,
    family: SourceFamily,
    path: PathBuf,
}

impl EventsFileSource {
    pub fn new(name: impl Into<CompactString>, family: SourceFamily, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            family,
            path: path.into(),
        }
    }

    async fn read(&self, window: TimeWindow) -> Vec<Result<EventDraft, SourceError>> {
        log::info!(target: LOG_TARGET, "Reading events from '{}'", self.path.display());

        let bytes = match tokio::fs::read(&self.path).await.into_app_err_with(|| format!("could not read '{}'", self.path.display())) {
            Ok(bytes) => bytes,
            Err(e) => return vec![Err(SourceError::Unavailable(e))],
        };

        let entries: Vec<Value> = match serde_json::from_slice(&bytes).into_app_err_with(|| format!("could not parse '{}'", self.path.display())) {
            Ok(entries) => entries,
            Err(e) => return vec![Err(SourceError::Parse(e))],
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| match serde_json::from_value::<ExportRecord>(entry) {
                Ok(record) => to_draft(record, &self.name),
                Err(e) => {
                    log::debug!(target: LOG_TARGET, "Entry {index} of '{}' is not a valid record: {e}", self.path.display());
                    EventDraft::new().source_system(self.name.as_str())
                }
            })
            // keep drafts without a usable timestamp so they are reported as malformed
            .filter(|d| d.get_timestamp().is_none_or(|ts| window.contains(ts)))
            .map(Ok)
            .collect()
    }
}

impl Source for EventsFileSource {
    fn identity(&self) -> &str {
        &self.name
    }

    fn family(&self) -> SourceFamily {
        self.family
    }

    fn fetch(&self, window: TimeWindow) -> EventStream<'_> {
        stream::once(self.read(window)).flat_map(stream::iter).boxed()
    }
}

fn to_draft(record: ExportRecord, source_name: &str) -> EventDraft {
    let mut draft = EventDraft::new().source_system(source_name).actor_opt(record.actor);

    let kind = record.kind.as_deref().map(EventKind::from);
    if let Some(kind) = &kind {
        draft = draft.kind(kind.clone());
    }

    match record.id {
        Some(Value::String(s)) => draft = draft.source_id(s),
        Some(Value::Number(n)) => draft = draft.source_id(n.to_string()),
        _ => {}
    }

    if let Some(ts) = record.timestamp.as_deref().and_then(parse_timestamp) {
        draft = draft.timestamp(ts);
    }

    let namespace = kind.as_ref().map_or("", EventKind::namespace);
    for (key, value) in record.attributes {
        let Some(value) = to_attribute(value) else {
            log::debug!(target: LOG_TARGET, "Ignoring attribute '{key}' with unsupported value");
            continue;
        };

        let key = if key.contains('.') { CompactString::from(key) } else { format_compact!("{namespace}.{key}") };
        draft = draft.attribute(key, value);
    }

    draft
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc))
}

fn to_attribute(value: Value) -> Option<AttributeValue> {
    match value {
        Value::Bool(b) => Some(AttributeValue::Boolean(b)),
        Value::Number(n) => n.as_f64().map(AttributeValue::Number),
        Value::String(s) => Some(parse_timestamp(&s).map_or_else(|| AttributeValue::from(s), AttributeValue::Timestamp)),
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(",");
            Some(AttributeValue::from(joined))
        }
        Value::Null | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventField, ValidationPolicy};
    use chrono::TimeZone;
    use core::time::Duration;
    use std::io::Write;

    fn policy() -> ValidationPolicy {
        ValidationPolicy::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), Duration::from_secs(300))
    }

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_reads_records() {
        let file = write_file(
            r#"[
                {"kind": "issue", "id": 7, "timestamp": "2024-01-01T00:00:00Z", "actor": "alice",
                 "attributes": {"closed_at": "2024-01-02T00:00:00Z", "labels": ["bug", "ui"], "comments": 3}},
                {"kind": "issue", "id": "8", "timestamp": "2024-01-05T00:00:00Z"}
            ]"#,
        );

        let source = EventsFileSource::new("export", SourceFamily::IssueTracker, file.path());
        let drafts: Vec<_> = source.fetch(TimeWindow::unbounded()).collect().await;
        assert_eq!(drafts.len(), 2);

        let first = drafts.into_iter().next().unwrap().unwrap().build(&policy()).unwrap();
        assert_eq!(first.source_id(), "7");
        assert_eq!(first.source_system(), "export");
        assert_eq!(
            first.attribute("issue.closed_at"),
            Some(&AttributeValue::Timestamp(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()))
        );
        assert_eq!(first.attribute("issue.labels"), Some(&AttributeValue::from("bug,ui")));
        assert_eq!(first.attribute("issue.comments"), Some(&AttributeValue::Number(3.0)));
    }

    #[tokio::test]
    async fn test_bad_timestamp_yields_malformed_draft() {
        let file = write_file(r#"[{"kind": "commit", "id": "abc", "timestamp": "last tuesday"}]"#);

        let source = EventsFileSource::new("export", SourceFamily::Vcs, file.path());
        let drafts: Vec<_> = source.fetch(TimeWindow::unbounded()).collect().await;
        assert_eq!(drafts.len(), 1);

        let err = drafts.into_iter().next().unwrap().unwrap().build(&policy()).unwrap_err();
        assert_eq!(err.field, EventField::Timestamp);
    }

    #[tokio::test]
    async fn test_bad_entry_does_not_spoil_the_file() {
        let file = write_file(
            r#"[
                {"kind": "commit", "id": "a", "timestamp": "2024-01-01T00:00:00Z"},
                {"kind": "commit", "id": "b", "timestamp": "2024-01-02T00:00:00Z", "url": "x"},
                {"kind": 5, "id": "c", "timestamp": "2024-01-03T00:00:00Z"}
            ]"#,
        );

        let source = EventsFileSource::new("export", SourceFamily::Vcs, file.path());
        let drafts: Vec<_> = source.fetch(TimeWindow::unbounded()).collect().await;
        assert_eq!(drafts.len(), 3);

        let built: Vec<_> = drafts.into_iter().map(|d| d.unwrap().build(&policy())).collect();
        assert_eq!(built[0].as_ref().unwrap().source_id(), "a");
        assert_eq!(built[1].as_ref().unwrap().source_id(), "b");
        let _ = built[2].as_ref().unwrap_err();
    }

    #[tokio::test]
    async fn test_window_filters_records() {
        let file = write_file(
            r#"[
                {"kind": "commit", "id": "a", "timestamp": "2024-01-01T00:00:00Z"},
                {"kind": "commit", "id": "b", "timestamp": "2024-03-01T00:00:00Z"}
            ]"#,
        );

        let window = TimeWindow::new(Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()), None).unwrap();
        let source = EventsFileSource::new("export", SourceFamily::Vcs, file.path());
        let drafts: Vec<_> = source.fetch(window).collect().await;
        assert_eq!(drafts.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let file = write_file("{ not json");
        let source = EventsFileSource::new("export", SourceFamily::Vcs, file.path());
        let items: Vec<_> = source.fetch(TimeWindow::unbounded()).collect().await;
        assert!(matches!(items.as_slice(), [Err(SourceError::Parse(_))]));
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = EventsFileSource::new("export", SourceFamily::Vcs, dir.path().join("missing.json"));
        let items: Vec<_> = source.fetch(TimeWindow::unbounded()).collect().await;
        assert!(matches!(items.as_slice(), [Err(SourceError::Unavailable(_))]));
    }
}
