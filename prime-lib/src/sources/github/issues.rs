use super::client::Client;
use super::{DEFAULT_GITHUB_API_URL, GitHubRecord, paged_stream};
use crate::events::{EventDraft, EventKind, TimeWindow};
use crate::sources::{EventStream, Source, SourceFamily};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::Deserialize;
use serde::de::IgnoredAny;

#[derive(Debug, Deserialize)]
pub(super) struct User {
    pub login: String,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

/// An entry of the issues list endpoint, which also returns pull requests.
#[derive(Debug, Deserialize)]
struct IssueRecord {
    number: u64,
    title: String,
    state: String,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    comments: u64,
    user: Option<User>,
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(default)]
    pull_request: Option<IgnoredAny>,
}

impl GitHubRecord for IssueRecord {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn into_draft(self, source_name: &str) -> Option<EventDraft> {
        if self.pull_request.is_some() {
            return None;
        }

        let labels = self.labels.iter().map(|l| l.name.as_str()).collect::<Vec<_>>().join(",");

        Some(
            EventDraft::new()
                .kind(EventKind::Issue)
                .source_id(self.number.to_string())
                .source_system(source_name)
                .timestamp(self.created_at)
                .actor_opt(self.user.map(|u| u.login))
                .attribute("issue.title", self.title)
                .attribute("issue.state", self.state)
                .attribute_opt("issue.closed_at", self.closed_at)
                .attribute("issue.comments", self.comments)
                .attribute("issue.labels", labels),
        )
    }
}

/// Produces an `issue` event for every issue of a GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHubIssuesSource {
    name: CompactString,
    repo: CompactString,
    client: Client,
}

impl GitHubIssuesSource {
    /// `repo` is in `owner/name` form. `base_url` defaults to the public GitHub API.
    pub fn new(name: impl Into<CompactString>, repo: impl Into<CompactString>, token: Option<&str>, base_url: Option<&str>) -> crate::Result<Self> {
        Ok(Self {
            name: name.into(),
            repo: repo.into(),
            client: Client::new(token, base_url.unwrap_or(DEFAULT_GITHUB_API_URL))?,
        })
    }
}

impl Source for GitHubIssuesSource {
    fn identity(&self) -> &str {
        &self.name
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::IssueTracker
    }

    fn fetch(&self, window: TimeWindow) -> EventStream<'_> {
        // `since` filters on last update, which is a superset of what was created since then
        let since = window.since.map_or_else(String::new, |s| format!("&since={}", s.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)));
        let path = format!("/repos/{}/issues?state=all&sort=created&direction=asc{since}", self.repo);
        paged_stream::<IssueRecord>(&self.client, &self.name, path, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_record_deserialize() {
        let json = r#"{
            "number": 12,
            "title": "Crash on startup",
            "state": "closed",
            "created_at": "2024-01-01T00:00:00Z",
            "closed_at": "2024-01-03T12:00:00Z",
            "comments": 4,
            "user": { "login": "alice" },
            "labels": [{ "name": "bug" }, { "name": "p1" }]
        }"#;

        let record: IssueRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.number, 12);
        assert!(record.pull_request.is_none());

        let draft = record.into_draft("tracker").unwrap();
        assert_eq!(draft.get_source_system(), Some("tracker"));
    }

    #[test]
    fn test_pull_requests_are_skipped() {
        let json = r#"{
            "number": 13,
            "title": "Fix crash",
            "state": "open",
            "created_at": "2024-01-02T00:00:00Z",
            "closed_at": null,
            "user": null,
            "pull_request": { "url": "https://api.github.com/repos/o/r/pulls/13", "merged_at": null }
        }"#;

        let record: IssueRecord = serde_json::from_str(json).unwrap();
        assert!(record.into_draft("tracker").is_none());
    }
}
