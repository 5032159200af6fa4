use compact_str::CompactString;
use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// Separates a namespace from a field name in output column names (`namespace.field`).
pub const NAMESPACE_SEPARATOR: char = '.';

/// Identifying prefix scoping a group of related fields produced by one source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(CompactString);

impl Namespace {
    #[must_use]
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the namespace is structurally usable as a column prefix.
    ///
    /// A valid namespace is non-empty, starts with a lowercase ASCII letter, and
    /// contains only lowercase ASCII letters, digits, and underscores. In particular
    /// it can never contain [`NAMESPACE_SEPARATOR`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let mut chars = self.0.chars();
        chars.next().is_some_and(|c| c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    /// Build the output column name for a field in this namespace.
    #[must_use]
    pub fn column(&self, field: &str) -> String {
        format!("{}{NAMESPACE_SEPARATOR}{field}", self.0)
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Namespace {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
