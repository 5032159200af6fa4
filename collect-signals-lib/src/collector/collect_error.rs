use compact_str::CompactString;
use core::fmt::{Display, Formatter};

/// Why a repository could not be turned into a record.
#[derive(Debug)]
pub enum CollectError {
    /// The repository can never be collected (unsupported by every source, renamed,
    /// deleted, ...). Callers should skip it and carry on with the batch.
    Uncollectable { repo: CompactString, reason: CompactString },

    /// Collection failed; retrying may succeed.
    Failed(ohno::AppError),
}

impl CollectError {
    #[must_use]
    pub fn uncollectable(repo: impl Display, reason: impl Into<CompactString>) -> Self {
        Self::Uncollectable {
            repo: compact_str::format_compact!("{repo}"),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn is_uncollectable(&self) -> bool {
        matches!(self, Self::Uncollectable { .. })
    }
}

impl Display for CollectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Uncollectable { repo, reason } => write!(f, "repository '{repo}' cannot be collected: {reason}"),
            Self::Failed(e) => write!(f, "{e:#}"),
        }
    }
}

impl core::error::Error for CollectError {}

impl From<ohno::AppError> for CollectError {
    fn from(e: ohno::AppError) -> Self {
        Self::Failed(e)
    }
}
