use super::{RepoSpec, SignalSet};
use crate::collector::CollectError;
use core::fmt::Debug;
use futures::future::BoxFuture;

/// A pluggable producer of one namespace's signal set.
///
/// Every set a source returns, whether from [`Source::empty_set`] or from
/// [`Source::fetch`], must report the same namespace, and no two registered sources
/// may share a namespace. The registry checks the latter once at registration.
///
/// Fetching is cancelled by dropping the returned future, so implementations should
/// not spawn detached work that outlives it.
pub trait Source: Debug + Send + Sync {
    /// The schema of this source with every field unset. Must be pure and cheap.
    fn empty_set(&self) -> SignalSet;

    /// Whether this source can say anything about the repository.
    fn supports(&self, repo: &RepoSpec) -> bool;

    /// Collect the populated set for a repository.
    ///
    /// `job_id` identifies the job run and is identical for every retry of the same shard.
    /// Return [`CollectError::Uncollectable`] when the repository itself cannot be
    /// collected (for example it was renamed or deleted upstream).
    fn fetch<'a>(&'a self, repo: &'a RepoSpec, job_id: &'a str) -> BoxFuture<'a, Result<SignalSet, CollectError>>;
}
