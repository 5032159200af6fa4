use super::{FieldValue, RepoSpec, SignalSet};

/// Everything collected for one repository: one signal set per registered namespace,
/// in registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    repo: RepoSpec,
    sets: Vec<SignalSet>,
}

impl Record {
    #[must_use]
    pub const fn new(repo: RepoSpec, sets: Vec<SignalSet>) -> Self {
        Self { repo, sets }
    }

    #[must_use]
    pub const fn repo(&self) -> &RepoSpec {
        &self.repo
    }

    #[must_use]
    pub fn sets(&self) -> &[SignalSet] {
        &self.sets
    }

    #[must_use]
    pub fn into_sets(self) -> Vec<SignalSet> {
        self.sets
    }

    #[must_use]
    pub fn set(&self, namespace: &str) -> Option<&SignalSet> {
        self.sets.iter().find(|s| s.namespace().as_str() == namespace)
    }

    /// Look up a value by its `namespace.field` column name.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&FieldValue> {
        let (namespace, field) = column.split_once(super::NAMESPACE_SEPARATOR)?;
        self.set(namespace)?.get(field)
    }
}
