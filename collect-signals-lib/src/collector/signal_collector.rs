use super::{CollectError, FailurePolicy, Registry};
use crate::signals::{Record, RepoSpec, SignalSet};
use ohno::{EnrichableExt, app_err};
use std::sync::Arc;

const LOG_TARGET: &str = " collector";

/// Collects one record per repository from every registered source.
#[derive(Debug, Clone)]
pub struct Collector {
    registry: Arc<Registry>,
    policy: FailurePolicy,
}

impl Collector {
    #[must_use]
    pub const fn new(registry: Arc<Registry>, policy: FailurePolicy) -> Self {
        Self { registry, policy }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub const fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// The output schema: one empty template per registered source.
    #[must_use]
    pub fn empty_sets(&self) -> Vec<SignalSet> {
        self.registry.empty_sets()
    }

    /// Collect the record for one repository.
    ///
    /// The record holds exactly one set per registered source, in registration order:
    /// fetched for supporting sources, the empty template otherwise. Every call
    /// fetches afresh.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Uncollectable`] when no source supports the repository
    /// or a source reports it as uncollectable. Under [`FailurePolicy::FailFast`] any
    /// other fetch failure is returned as [`CollectError::Failed`].
    pub async fn collect(&self, repo: &RepoSpec, job_id: &str) -> Result<Record, CollectError> {
        let supported: Vec<bool> = self.registry.sources().map(|(_, source)| source.supports(repo)).collect();
        if !supported.contains(&true) {
            return Err(CollectError::uncollectable(repo, "no registered source supports it"));
        }

        let mut sets = Vec::with_capacity(self.registry.len());
        for ((namespace, source), supported) in self.registry.sources().zip(supported) {
            let template = source.empty_set();
            if !supported {
                log::trace!(target: LOG_TARGET, "Namespace '{namespace}' does not support '{repo}'");
                sets.push(template);
                continue;
            }

            let fetched = match source.fetch(repo, job_id).await {
                Ok(set) if set.same_schema(&template) => Ok(set),
                Ok(set) if set.namespace() != namespace => Err(app_err!(
                    "source for namespace '{namespace}' returned a set for namespace '{}'",
                    set.namespace()
                )),
                Ok(_) => Err(app_err!("source for namespace '{namespace}' returned fields that do not match its schema")),
                Err(e @ CollectError::Uncollectable { .. }) => return Err(e),
                Err(CollectError::Failed(e)) => Err(e),
            };

            match fetched {
                Ok(set) => sets.push(set),
                Err(e) => match self.policy {
                    FailurePolicy::FailFast => {
                        return Err(CollectError::Failed(
                            e.enrich_with(|| format!("collecting '{namespace}' signals for '{repo}'")),
                        ));
                    }
                    FailurePolicy::Lenient => {
                        log::warn!(target: LOG_TARGET, "Could not collect '{namespace}' signals for '{repo}': {e:#}");
                        sets.push(template);
                    }
                },
            }
        }

        Ok(Record::new(repo.clone(), sets))
    }
}
