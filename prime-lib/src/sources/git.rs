//! Commits from a local git repository.

use super::{EventStream, Source, SourceError, SourceFamily};
use crate::events::{EventDraft, EventKind, TimeWindow};
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use core::time::Duration;
use futures::{StreamExt, stream};
use ohno::{IntoAppError, app_err};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::sync::LazyLock;
use tokio::process::Command;

const LOG_TARGET: &str = "       git";
const GIT_TIMEOUT: Duration = Duration::from_mins(5);

// Each commit starts with a record separator, fields are split by unit separators.
const RECORD_SEPARATOR: char = '\x1e';
const FIELD_SEPARATOR: char = '\x1f';
const LOG_FORMAT: &str = "--pretty=format:%x1e%H%x1f%ae%x1f%an%x1f%aI%x1f%s";

static ISSUE_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\d+)\b").expect("issue reference pattern is valid"));

/// Produces a `commit` event for every commit reachable from `HEAD`.
#[derive(Debug, Clone)]
pub struct GitSource {
    name: CompactString,
    repo_path: PathBuf,
}

impl GitSource {
    pub fn new(name: impl Into<CompactString>, repo_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            repo_path: repo_path.into(),
        }
    }

    async fn read_log(&self, window: TimeWindow) -> Vec<Result<EventDraft, SourceError>> {
        let start_time = std::time::Instant::now();

        let output = match run_git_log(&self.repo_path, window).await {
            Ok(output) => output,
            Err(e) => return vec![Err(e)],
        };

        if !output.status.success() {
            if is_unborn_repository(&self.repo_path).await {
                log::info!(target: LOG_TARGET, "Repository '{}' has no commits yet", self.repo_path.display());
                return Vec::new();
            }

            let stderr = String::from_utf8_lossy(&output.stderr);
            return vec![Err(SourceError::parse(app_err!(
                "git log in '{}' failed: {}",
                self.repo_path.display(),
                stderr.trim()
            )))];
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_log(&stdout, &self.name, window) {
            Ok(drafts) => {
                log::debug!(target: LOG_TARGET, "Read {} commits from '{}' in {:.3}s", drafts.len(), self.repo_path.display(), start_time.elapsed().as_secs_f64());
                drafts.into_iter().map(Ok).collect()
            }
            Err(e) => vec![Err(SourceError::Parse(e))],
        }
    }
}

impl Source for GitSource {
    fn identity(&self) -> &str {
        &self.name
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::Vcs
    }

    fn fetch(&self, window: TimeWindow) -> EventStream<'_> {
        stream::once(self.read_log(window)).flat_map(stream::iter).boxed()
    }
}

async fn run_git_log(repo_path: &Path, window: TimeWindow) -> Result<Output, SourceError> {
    let mut args: Vec<String> = vec![
        "-C".into(),
        repo_path.to_string_lossy().into_owned(),
        "log".into(),
        "--no-color".into(),
        "--numstat".into(),
        LOG_FORMAT.into(),
    ];

    // git filters on committer date; the author date is checked while parsing
    if let Some(since) = window.since {
        args.push(format!("--since={}", since.to_rfc3339()));
    }

    log::info!(target: LOG_TARGET, "Reading commit history of '{}'", repo_path.display());
    run_git(&args).await
}

/// A repository whose `HEAD` doesn't point at a commit yet.
async fn is_unborn_repository(repo_path: &Path) -> bool {
    let path = repo_path.to_string_lossy().into_owned();
    let succeeded = |output: Result<Output, SourceError>| output.is_ok_and(|o| o.status.success());

    let is_repo = succeeded(run_git(&["-C".into(), path.clone(), "rev-parse".into(), "--git-dir".into()]).await);
    is_repo && !succeeded(run_git(&["-C".into(), path, "rev-parse".into(), "--verify".into(), "--quiet".into(), "HEAD".into()]).await)
}

async fn run_git(args: &[String]) -> Result<Output, SourceError> {
    let child = Command::new("git")
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .into_app_err("could not spawn git command")
        .map_err(SourceError::Unavailable)?;

    match tokio::time::timeout(GIT_TIMEOUT, child.wait_with_output()).await {
        Ok(result) => result
            .into_app_err_with(|| format!("'git {}' failed to run", args.join(" ")))
            .map_err(SourceError::Unavailable),
        Err(_) => Err(SourceError::unavailable(app_err!(
            "'git {}' timed out after {} seconds",
            args.join(" "),
            GIT_TIMEOUT.as_secs()
        ))),
    }
}

fn parse_log(output: &str, source_name: &str, window: TimeWindow) -> crate::Result<Vec<EventDraft>> {
    let mut drafts = Vec::new();

    for record in output.split(RECORD_SEPARATOR).filter(|r| !r.trim().is_empty()) {
        let mut lines = record.lines();
        let header = lines.next().unwrap_or_default();

        let fields: Vec<&str> = header.splitn(5, FIELD_SEPARATOR).collect();
        let [hash, email, name, date, subject] = fields.as_slice() else {
            return Err(app_err!("malformed git log header: '{header}'"));
        };

        let timestamp = DateTime::parse_from_rfc3339(date)
            .into_app_err_with(|| format!("invalid author date '{date}' on commit {hash}"))?
            .with_timezone(&Utc);

        if !window.contains(timestamp) {
            continue;
        }

        let mut lines_added = 0_u64;
        let mut lines_deleted = 0_u64;
        let mut files_changed = 0_u64;
        for line in lines.filter(|l| !l.trim().is_empty()) {
            let (added, deleted) = parse_numstat_line(line).ok_or_else(|| app_err!("malformed numstat line '{line}' on commit {hash}"))?;
            lines_added += added;
            lines_deleted += deleted;
            files_changed += 1;
        }

        let issue_ref = ISSUE_REF
            .captures(subject)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok());

        drafts.push(
            EventDraft::new()
                .kind(EventKind::Commit)
                .source_id(*hash)
                .source_system(source_name)
                .timestamp(timestamp)
                .actor(email.to_lowercase())
                .attribute("commit.message", *subject)
                .attribute("commit.author_name", *name)
                .attribute("commit.lines_added", lines_added)
                .attribute("commit.lines_deleted", lines_deleted)
                .attribute("commit.files_changed", files_changed)
                .attribute_opt("commit.issue_ref", issue_ref),
        );
    }

    Ok(drafts)
}

/// Parses `added<TAB>deleted<TAB>path`. Binary files report `-` for both counts.
fn parse_numstat_line(line: &str) -> Option<(u64, u64)> {
    let mut parts = line.splitn(3, '\t');
    let added = parts.next()?;
    let deleted = parts.next()?;
    let _path = parts.next()?;

    let parse_count = |s: &str| if s == "-" { Some(0) } else { s.parse::<u64>().ok() };
    Some((parse_count(added)?, parse_count(deleted)?))
}
