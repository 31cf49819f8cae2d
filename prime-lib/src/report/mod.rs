//! Analysis reports
//!
//! A [`Report`] is the immutable outcome of a run: the resolved analysis window, what
//! every source adapter contributed, the shape of the corpus, and one [`MetricResult`](crate::metrics::MetricResult)
//! per metric. Two generators render it:
//! - **Console**: Human-readable terminal output with optional ANSI colors
//! - **JSON**: Machine-readable structured data

mod analysis_report;
mod common;
mod console;
mod json;

pub use analysis_report::Report;
pub use console::generate as generate_console;
pub use json::generate as generate_json;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Corpus, SourceProvenance, SourceStatus};
    use crate::events::{EventKind, TimeWindow};
    use crate::metrics::test_support::{day, event};
    use crate::metrics::{InsufficientDataWarning, MetricComputationError, MetricOutcome, MetricResult, MetricValue, Table};
    use crate::sources::SourceFamily;
    use std::collections::{BTreeMap, BTreeSet};

    fn sample_report() -> Report {
        let events = vec![
            event(EventKind::Commit, "c1", day(2), "alice"),
            event(EventKind::Commit, "c2", day(5), "bob"),
        ];
        let keys = events.iter().map(|e| e.key().clone()).collect();
        let corpus = Corpus::merge([events]).unwrap();

        let sources = vec![
            SourceProvenance {
                name: "test".into(),
                family: SourceFamily::Vcs,
                status: SourceStatus::Succeeded,
                attempts: 1,
                events_accepted: 2,
                events_rejected: 1,
            },
            SourceProvenance {
                name: "tracker".into(),
                family: SourceFamily::IssueTracker,
                status: SourceStatus::Failed {
                    reason: "connection refused".into(),
                },
                attempts: 4,
                events_accepted: 0,
                events_rejected: 0,
            },
        ];

        let mut churn = BTreeMap::new();
        let _ = churn.insert("lines_added".into(), MetricValue::UInt(12));
        let _ = churn.insert("net_lines".into(), MetricValue::Float(7.5));

        let mut table = Table::new(["actor", "events"]);
        table.push_row(vec!["alice".into(), 1_u64.into()]);
        table.push_row(vec!["bob".into(), 1_u64.into()]);

        let metrics = vec![
            MetricResult {
                name: "commit_count".into(),
                description: "Number of commit events".into(),
                outcome: MetricOutcome::Computed {
                    value: MetricValue::UInt(2),
                    events_used: keys,
                },
            },
            MetricResult {
                name: "code_churn".into(),
                description: "Lines changed by commits".into(),
                outcome: MetricOutcome::Computed {
                    value: MetricValue::Map(churn),
                    events_used: Vec::new(),
                },
            },
            MetricResult {
                name: "events_per_actor".into(),
                description: "Events per actor".into(),
                outcome: MetricOutcome::Computed {
                    value: MetricValue::Table(table),
                    events_used: Vec::new(),
                },
            },
            MetricResult {
                name: "issue_count".into(),
                description: "Number of issue events".into(),
                outcome: MetricOutcome::Skipped(InsufficientDataWarning {
                    missing_kinds: BTreeSet::from([EventKind::Issue]),
                }),
            },
            MetricResult {
                name: "broken".into(),
                description: "Always fails".into(),
                outcome: MetricOutcome::Failed(MetricComputationError::new("division by zero")),
            },
        ];

        Report::new(day(20), TimeWindow::unbounded(), sources, &corpus, metrics)
    }

    #[test]
    fn test_report_resolves_open_window_from_corpus() {
        let report = sample_report();
        assert_eq!(report.window().since, Some(day(2)));
        assert_eq!(report.window().until, Some(day(5)));
        assert_eq!(report.event_count(), 2);
        assert_eq!(report.contributing_sources().count(), 1);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_console_without_colors() {
        let report = sample_report();
        let mut out = String::new();
        generate_console(&report, false, &mut out).unwrap();

        assert!(out.starts_with("Activity report\n"));
        assert!(out.contains("  Window    : 2024-01-02 00:00:00 UTC .. 2024-01-05 00:00:00 UTC\n"));
        assert!(out.contains("  Events    : 2 (commit)\n"));
        assert!(out.contains("  ✔ test (vcs): 2 events, 1 rejected, 1 attempt\n"));
        assert!(out.contains("  🗙 tracker (issue_tracker): failed after 4 attempts, kept 0 events: connection refused\n"));
        assert!(out.contains("  commit_count : 2\n"));
        assert!(out.contains("      lines_added : 12\n"));
        assert!(out.contains("      net_lines   : 7.50\n"));
        assert!(out.contains("      actor  events\n"));
        assert!(out.contains("      alice  1\n"));
        assert!(out.contains("  issue_count : skipped, no issue events\n"));
        assert!(out.contains("  broken : failed: division by zero\n"));
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn test_console_with_colors() {
        let report = sample_report();
        let mut out = String::new();
        generate_console(&report, true, &mut out).unwrap();
        assert!(out.contains('\u{1b}'));
    }

    #[test]
    fn test_json_structure() {
        let report = sample_report();
        let mut out = String::new();
        generate_json(&report, &mut out).unwrap();

        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["event_count"], 2);
        assert_eq!(json["kinds_present"], serde_json::json!(["commit"]));
        assert_eq!(json["sources"][0]["status"], "succeeded");
        assert_eq!(json["sources"][1]["status"], "failed");
        assert_eq!(json["sources"][1]["reason"], "connection refused");

        let metrics = &json["metrics"];
        assert_eq!(metrics["commit_count"]["status"], "computed");
        assert_eq!(metrics["commit_count"]["value"], 2);
        assert_eq!(metrics["commit_count"]["events_used"].as_array().map(Vec::len), Some(2));
        assert_eq!(metrics["code_churn"]["value"]["net_lines"], 7.5);
        assert_eq!(metrics["events_per_actor"]["value"]["columns"], serde_json::json!(["actor", "events"]));
        assert_eq!(metrics["issue_count"]["status"], "skipped");
        assert_eq!(metrics["issue_count"]["missing_kinds"], serde_json::json!(["issue"]));
        assert_eq!(metrics["broken"]["status"], "failed");
        assert_eq!(metrics["broken"]["message"], "division by zero");
    }
}
