//! Sharded, checkpointed batch processing
//!
//! The [`WorkLoop`] splits the input into fixed-size shards and hands each shard to a
//! [`ShardWorker`]. Progress lives in a single checkpoint file holding the first
//! shard that has not completed, the attempts already taken on it, and the job time
//! fixed when the job started.
//!
//! # Lifecycle
//!
//! 1. Load the checkpoint, or start a new one at shard 0 with the job time.
//! 2. If the checkpoint points past shard 0, discard that many shards from the input
//!    without processing them. Fewer shards than expected is an integrity error.
//! 3. For each shard, record the attempt before running it, skip the shard when its
//!    output already exists in the primary destination, and otherwise run the worker.
//!    Failed attempts are retried immediately until the attempt budget is spent,
//!    which fails the job.
//! 4. After a shard succeeds, reset the attempt counter, advance, and persist.
//! 5. Once the input is exhausted, write the completion marker to the primary and
//!    raw destinations, then clear the checkpoint.
//!
//! The checkpoint file is guarded by an exclusive file lock for as long as the
//! [`CheckpointStore`] is alive.

mod checkpoint;
mod collect_worker;
mod destination;
mod json_doc;
mod progress;
mod shard_worker;
mod shards;
mod state_lock;
mod work_loop;

pub use checkpoint::{Checkpoint, CheckpointStore};
pub use collect_worker::{CollectWorker, WorkerStats};
pub use destination::{CompletionMetadata, Destination, FsDestination, METADATA_FILE_NAME};
pub use progress::{NoProgress, Progress};
pub use shard_worker::ShardWorker;
pub use shards::{ShardRequest, Shards};
pub use work_loop::{DEFAULT_MAX_ATTEMPTS, JobSummary, LoopState, WorkLoop};
