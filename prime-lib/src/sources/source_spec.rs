use super::{EventsFileSource, GitHubIssuesSource, GitHubPullsSource, GitSource, Source, SourceFamily};
use crate::Result;
use camino::Utf8PathBuf;
use compact_str::{CompactString, format_compact};
use ohno::bail;
use serde::Deserialize;
use std::sync::Arc;

/// Configuration of one source adapter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum SourceSpec {
    Git {
        name: Option<CompactString>,
        path: Utf8PathBuf,
    },

    GithubIssues {
        name: Option<CompactString>,
        repo: CompactString,
        base_url: Option<String>,
    },

    GithubPulls {
        name: Option<CompactString>,
        repo: CompactString,
        base_url: Option<String>,
    },

    EventsFile {
        name: CompactString,
        family: SourceFamily,
        path: Utf8PathBuf,
    },
}

impl SourceSpec {
    /// The adapter identity, either configured or derived from what the adapter reads.
    #[must_use]
    pub fn name(&self) -> CompactString {
        match self {
            Self::Git { name, path } => name.clone().unwrap_or_else(|| format_compact!("git:{path}")),
            Self::GithubIssues { name, repo, .. } => name.clone().unwrap_or_else(|| format_compact!("github-issues:{repo}")),
            Self::GithubPulls { name, repo, .. } => name.clone().unwrap_or_else(|| format_compact!("github-pulls:{repo}")),
            Self::EventsFile { name, .. } => name.clone(),
        }
    }

    #[must_use]
    pub const fn family(&self) -> SourceFamily {
        match self {
            Self::Git { .. } => SourceFamily::Vcs,
            Self::GithubIssues { .. } => SourceFamily::IssueTracker,
            Self::GithubPulls { .. } => SourceFamily::PullRequestTracker,
            Self::EventsFile { family, .. } => *family,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name().trim().is_empty() {
            bail!("source names must not be empty");
        }

        if let Self::GithubIssues { repo, .. } | Self::GithubPulls { repo, .. } = self {
            let mut parts = repo.split('/');
            let valid = matches!((parts.next(), parts.next(), parts.next()), (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty());
            if !valid {
                bail!("GitHub repository '{repo}' must be in the form 'owner/name'");
            }
        }

        Ok(())
    }

    /// Instantiates the adapter described by this spec.
    pub fn build(&self, github_token: Option<&str>) -> Result<Arc<dyn Source>> {
        let name = self.name();
        Ok(match self {
            Self::Git { path, .. } => Arc::new(GitSource::new(name, path.as_std_path())),
            Self::GithubIssues { repo, base_url, .. } => Arc::new(GitHubIssuesSource::new(name, repo.clone(), github_token, base_url.as_deref())?),
            Self::GithubPulls { repo, base_url, .. } => Arc::new(GitHubPullsSource::new(name, repo.clone(), github_token, base_url.as_deref())?),
            Self::EventsFile { family, path, .. } => Arc::new(EventsFileSource::new(name, *family, path.as_std_path())),
        })
    }
}
