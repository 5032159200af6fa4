//! Source registration and per-repository collection
//!
//! The [`Registry`] holds every signal [`Source`](crate::signals::Source) for a
//! process, in registration order, and refuses a second source for a namespace that
//! is already taken. Registration order is output column order.
//!
//! The [`Collector`] turns one repository into one [`Record`](crate::signals::Record):
//! it asks the registry which sources support the repository, fetches from each of
//! them in order, and fills every other namespace with its empty template so that the
//! record always has exactly one set per registered namespace.
//!
//! A fetch failure is handled according to the configured [`FailurePolicy`]:
//! fail-fast (the default) aborts the whole repository, while lenient mode
//! substitutes the empty template and logs the failure. A fetched set whose fields
//! differ from its source's template is treated as a fetch failure. Repositories that no source
//! supports, or that a source reports as gone, surface as
//! [`CollectError::Uncollectable`] so callers can skip them instead of aborting.
//!
//! The collector keeps no cache. Deduplication against completed work belongs to
//! the batch work loop.

mod collect_error;
mod failure_policy;
mod registry;
mod signal_collector;

pub use collect_error::CollectError;
pub use failure_policy::FailurePolicy;
pub use registry::{Registry, RegistryError};
pub use signal_collector::Collector;

#[cfg(test)]
pub(crate) use registry::tests::FixtureSource;
