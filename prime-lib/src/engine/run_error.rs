use super::CorpusConflict;
use core::fmt::{Display, Formatter};

/// Conditions that abort an analysis run.
#[derive(Debug)]
pub enum RunError {
    /// The run was cancelled before a report could be produced.
    Cancelled,

    /// Two adapters produced the same event with different kinds.
    CorpusConflict(CorpusConflict),

    /// The configuration handed to the run is inconsistent.
    InvalidConfig(ohno::AppError),
}

impl Display for RunError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Cancelled => f.write_str("analysis was cancelled"),
            Self::CorpusConflict(c) => write!(f, "{c}"),
            Self::InvalidConfig(e) => write!(f, "invalid analysis configuration: {e:#}"),
        }
    }
}

impl core::error::Error for RunError {}

impl From<CorpusConflict> for RunError {
    fn from(value: CorpusConflict) -> Self {
        Self::CorpusConflict(value)
    }
}
