use serde::{Deserialize, Serialize};
use strum::Display;

/// What the collector does when one source fails for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the repository's record.
    #[default]
    FailFast,

    /// Log the failure and use the source's empty template instead.
    Lenient,
}
