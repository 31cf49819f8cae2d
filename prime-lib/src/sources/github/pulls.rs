use super::client::Client;
use super::issues::User;
use super::{DEFAULT_GITHUB_API_URL, GitHubRecord, paged_stream};
use crate::events::{EventDraft, EventKind, TimeWindow};
use crate::sources::{EventStream, Source, SourceFamily};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static CLOSING_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:close[sd]?|fix(?:e[sd])?|resolve[sd]?)\s+#(\d+)\b").expect("closing keyword pattern is valid")
});

#[derive(Debug, Deserialize)]
struct PullRecord {
    number: u64,
    title: String,
    state: String,
    #[serde(default)]
    draft: bool,
    body: Option<String>,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    merged_at: Option<DateTime<Utc>>,
    user: Option<User>,
}

impl GitHubRecord for PullRecord {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn into_draft(self, source_name: &str) -> Option<EventDraft> {
        let closes_issue = self.body.as_deref().and_then(closed_issue);

        Some(
            EventDraft::new()
                .kind(EventKind::PullRequest)
                .source_id(self.number.to_string())
                .source_system(source_name)
                .timestamp(self.created_at)
                .actor_opt(self.user.map(|u| u.login))
                .attribute("pull_request.title", self.title)
                .attribute("pull_request.state", self.state)
                .attribute("pull_request.draft", self.draft)
                .attribute_opt("pull_request.closed_at", self.closed_at)
                .attribute_opt("pull_request.merged_at", self.merged_at)
                .attribute_opt("pull_request.closes_issue", closes_issue),
        )
    }
}

/// The first issue a pull request body declares it closes.
fn closed_issue(body: &str) -> Option<u64> {
    CLOSING_KEYWORD.captures(body)?.get(1)?.as_str().parse().ok()
}

/// Produces a `pull_request` event for every pull request of a GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHubPullsSource {
    name: CompactString,
    repo: CompactString,
    client: Client,
}

impl GitHubPullsSource {
    /// `repo` is in `owner/name` form. `base_url` defaults to the public GitHub API.
    pub fn new(name: impl Into<CompactString>, repo: impl Into<CompactString>, token: Option<&str>, base_url: Option<&str>) -> crate::Result<Self> {
        Ok(Self {
            name: name.into(),
            repo: repo.into(),
            client: Client::new(token, base_url.unwrap_or(DEFAULT_GITHUB_API_URL))?,
        })
    }
}

impl Source for GitHubPullsSource {
    fn identity(&self) -> &str {
        &self.name
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::PullRequestTracker
    }

    fn fetch(&self, window: TimeWindow) -> EventStream<'_> {
        let path = format!("/repos/{}/pulls?state=all&sort=created&direction=asc", self.repo);
        paged_stream::<PullRecord>(&self.client, &self.name, path, window)
    }
}
