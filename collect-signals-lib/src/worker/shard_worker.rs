use super::ShardRequest;
use crate::Result;
use futures::future::BoxFuture;

/// Processes one shard of repositories.
///
/// `process` may be invoked several times for the same shard: after a failure,
/// or after the process died mid-shard. Implementations must leave the outputs in
/// the same final state no matter how often a shard is replayed.
pub trait ShardWorker: Send + Sync {
    fn process<'a>(&'a self, request: &'a ShardRequest) -> BoxFuture<'a, Result<()>>;

    /// Invoked once after each shard completes successfully.
    fn post_process(&self) {}
}
