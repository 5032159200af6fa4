use crate::signals::{Namespace, RepoSpec, SignalSet, Source};
use core::fmt::{Display, Formatter};
use std::sync::Arc;

const LOG_TARGET: &str = "  registry";

/// Why a source could not be registered. Callers normally treat this as fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Another registered source already owns this namespace.
    DuplicateNamespace(Namespace),

    /// The namespace is empty or contains characters that cannot appear in a column prefix.
    InvalidNamespace(Namespace),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DuplicateNamespace(ns) => write!(f, "a source for namespace '{ns}' is already registered"),
            Self::InvalidNamespace(ns) => write!(f, "namespace '{ns}' is not a valid namespace"),
        }
    }
}

impl core::error::Error for RegistryError {}

#[derive(Debug, Clone)]
struct Entry {
    namespace: Namespace,
    source: Arc<dyn Source>,
}

/// The set of registered signal sources, in registration order.
///
/// Construct one per process and hand it to the collector; there is no global instance.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source to the registry.
    ///
    /// # Errors
    ///
    /// Fails if the source's namespace is invalid or already taken. The registry is
    /// left unchanged in that case.
    pub fn register(&mut self, source: impl Source + 'static) -> Result<(), RegistryError> {
        self.register_arc(Arc::new(source))
    }

    /// Same as [`Registry::register`] for a source that is already shared.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::register`].
    pub fn register_arc(&mut self, source: Arc<dyn Source>) -> Result<(), RegistryError> {
        let namespace = source.empty_set().namespace().clone();

        if !namespace.is_valid() {
            return Err(RegistryError::InvalidNamespace(namespace));
        }

        if self.entries.iter().any(|e| e.namespace == namespace) {
            return Err(RegistryError::DuplicateNamespace(namespace));
        }

        log::debug!(target: LOG_TARGET, "Registered source for namespace '{namespace}'");
        self.entries.push(Entry { namespace, source });
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn namespaces(&self) -> impl ExactSizeIterator<Item = &Namespace> {
        self.entries.iter().map(|e| &e.namespace)
    }

    /// Every registered source with its namespace, in registration order.
    pub fn sources(&self) -> impl ExactSizeIterator<Item = (&Namespace, &Arc<dyn Source>)> {
        self.entries.iter().map(|e| (&e.namespace, &e.source))
    }

    /// One empty template per registered source, in registration order.
    ///
    /// This is the full output schema and needs no I/O.
    #[must_use]
    pub fn empty_sets(&self) -> Vec<SignalSet> {
        self.entries.iter().map(|e| e.source.empty_set()).collect()
    }

    /// The registered sources that support the repository, in registration order.
    ///
    /// An empty result is not an error here; the collector decides how to report it.
    #[must_use]
    pub fn sources_for(&self, repo: &RepoSpec) -> Vec<&Arc<dyn Source>> {
        self.entries.iter().filter(|e| e.source.supports(repo)).map(|e| &e.source).collect()
    }
}
