use core::fmt::{Display, Formatter};

/// Why a fetch stopped before completing.
#[derive(Debug)]
pub enum SourceError {
    /// The external system could not be reached or asked us to back off. Worth retrying.
    Unavailable(ohno::AppError),

    /// The external system answered with something that can't be normalized. Retrying won't help.
    Parse(ohno::AppError),
}

impl SourceError {
    pub fn unavailable(err: impl Into<ohno::AppError>) -> Self {
        Self::Unavailable(err.into())
    }

    pub fn parse(err: impl Into<ohno::AppError>) -> Self {
        Self::Parse(err.into())
    }

    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable(e) => write!(f, "source unavailable: {e:#}"),
            Self::Parse(e) => write!(f, "unable to parse source response: {e:#}"),
        }
    }
}

impl core::error::Error for SourceError {}
