use compact_str::CompactString;
use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// The kind of activity an [`Event`](super::Event) records.
///
/// The three built-in kinds cover the three adapter families. Adapters for other
/// systems can introduce additional kinds through [`EventKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Commit,
    Issue,
    PullRequest,
    Other(CompactString),
}

impl EventKind {
    /// The attribute namespace used by events of this kind.
    ///
    /// Attribute keys of an event must be prefixed with this namespace followed by a dot.
    #[must_use]
    pub fn namespace(&self) -> &str {
        match self {
            Self::Commit => "commit",
            Self::Issue => "issue",
            Self::PullRequest => "pull_request",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.namespace())
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "commit" => Self::Commit,
            "issue" => Self::Issue,
            "pull_request" | "pr" | "merge_request" => Self::PullRequest,
            _ => Self::Other(normalized.into()),
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        value.namespace().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builtin_kinds() {
        assert_eq!(EventKind::from("commit"), EventKind::Commit);
        assert_eq!(EventKind::from("Issue"), EventKind::Issue);
        assert_eq!(EventKind::from("pull-request"), EventKind::PullRequest);
        assert_eq!(EventKind::from("merge_request"), EventKind::PullRequest);
    }

    #[test]
    fn test_parse_custom_kind() {
        assert_eq!(EventKind::from("Code Review"), EventKind::Other("code_review".into()));
    }

    #[test]
    fn test_display_matches_namespace() {
        assert_eq!(EventKind::PullRequest.to_string(), "pull_request");
        assert_eq!(EventKind::Other("build".into()).to_string(), "build");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&EventKind::PullRequest).unwrap();
        assert_eq!(json, "\"pull_request\"");

        let kind: EventKind = serde_json::from_str("\"issue\"").unwrap();
        assert_eq!(kind, EventKind::Issue);
    }

    #[test]
    fn test_ordering_is_stable() {
        let mut kinds = vec![EventKind::PullRequest, EventKind::Commit, EventKind::Issue];
        kinds.sort();
        assert_eq!(kinds, vec![EventKind::Commit, EventKind::Issue, EventKind::PullRequest]);
    }
}
