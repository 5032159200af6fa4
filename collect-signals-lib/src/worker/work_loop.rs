use super::{
    Checkpoint, CheckpointStore, CompletionMetadata, Destination, NoProgress, Progress, ShardRequest, ShardWorker, Shards,
};
use crate::Result;
use crate::signals::RepoSpec;
use chrono::{DateTime, SubsecRound, Utc};
use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicU32, Ordering};
use ohno::{AppError, EnrichableExt, app_err, bail};
use std::sync::Arc;
use strum::Display;
use tokio_util::sync::CancellationToken;

const LOG_TARGET: &str = "      loop";

/// Attempts allowed per shard before the job gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 7;

/// Phases of a job run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LoopState {
    Initializing,
    Restoring,
    ProcessingShard,
    Checkpointing,
    Finalizing,
    Done,
    Failed,
}

/// What a completed job run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSummary {
    pub job_time: DateTime<Utc>,

    /// Total number of shards in the input, including restored ones.
    pub shard_count: u32,

    /// Shards skipped on startup because an earlier run had completed them.
    pub restored_shards: u32,

    /// Shards whose output already existed in the primary destination.
    pub existing_shards: u32,

    /// Attempts that failed and were retried.
    pub failed_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShardOutcome {
    Processed,
    AlreadyPresent,
}

/// Drives the input through a shard worker, one checkpointed shard at a time.
///
/// The checkpoint records the first shard that has not completed and the attempts
/// already taken on it. Attempts are persisted before they run, so a crash is
/// counted as an attempt. The checkpoint is cleared only once completion markers
/// have been written to both destinations.
pub struct WorkLoop {
    worker: Arc<dyn ShardWorker>,
    store: CheckpointStore,
    primary: Arc<dyn Destination>,
    raw: Arc<dyn Destination>,
    shard_size: NonZeroUsize,
    max_attempts: u32,
    job_time: Option<DateTime<Utc>>,
    reset_attempts: bool,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for WorkLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkLoop")
            .field("store", &self.store)
            .field("primary", &self.primary)
            .field("raw", &self.raw)
            .field("shard_size", &self.shard_size)
            .field("max_attempts", &self.max_attempts)
            .field("job_time", &self.job_time)
            .field("reset_attempts", &self.reset_attempts)
            .finish_non_exhaustive()
    }
}

impl WorkLoop {
    #[must_use]
    pub fn new(
        worker: Arc<dyn ShardWorker>,
        store: CheckpointStore,
        primary: Arc<dyn Destination>,
        raw: Arc<dyn Destination>,
        shard_size: NonZeroUsize,
    ) -> Self {
        Self {
            worker,
            store,
            primary,
            raw,
            shard_size,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            job_time: None,
            reset_attempts: false,
            progress: Arc::new(NoProgress),
        }
    }

    /// Attempts per shard; values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Job time used when no checkpoint exists, instead of the current time.
    #[must_use]
    pub const fn with_job_time(mut self, job_time: Option<DateTime<Utc>>) -> Self {
        self.job_time = job_time;
        self
    }

    /// Forget attempts recorded by earlier runs on the resumed shard.
    #[must_use]
    pub const fn with_reset_attempts(mut self, reset_attempts: bool) -> Self {
        self.reset_attempts = reset_attempts;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub const fn checkpoint_store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Process every shard of `input`, resuming from the persisted checkpoint.
    ///
    /// # Errors
    ///
    /// Fails when the checkpoint cannot be read or written, when the input no longer
    /// lines up with the checkpoint, when a shard exhausts its attempts, when the input
    /// cannot be read, or on cancellation. In all these cases the checkpoint is left as
    /// last persisted.
    pub async fn run<I>(&self, input: I, cancel: &CancellationToken) -> Result<JobSummary>
    where
        I: IntoIterator<Item = Result<RepoSpec>>,
    {
        let mut state = LoopState::Initializing;
        let result = self.drive(input, cancel, &mut state).await;
        self.progress.done();

        if let Err(e) = &result {
            log::debug!(target: LOG_TARGET, "Job stopped while {state}: {e:#}");
            enter(&mut state, LoopState::Failed);
        }

        result
    }

    async fn drive<I>(&self, input: I, cancel: &CancellationToken, state: &mut LoopState) -> Result<JobSummary>
    where
        I: IntoIterator<Item = Result<RepoSpec>>,
    {
        let job_time = self.job_time.unwrap_or_else(|| Utc::now().trunc_subsecs(0));
        let mut checkpoint = self.store.load_or_default(job_time)?;

        if checkpoint.job_time != job_time && self.job_time.is_some() {
            log::warn!(
                target: LOG_TARGET,
                "Ignoring requested job time {job_time}: resuming the job started at {}",
                checkpoint.job_time
            );
        }

        if self.reset_attempts && checkpoint.attempt > 0 {
            log::info!(target: LOG_TARGET, "Resetting {} recorded attempts on shard {}", checkpoint.attempt, checkpoint.shard);
            checkpoint.attempt = 0;
        }
        self.store.save(&checkpoint)?;

        let mut shards = Shards::new(input, self.shard_size);
        let mut summary = JobSummary {
            job_time: checkpoint.job_time,
            shard_count: 0,
            restored_shards: 0,
            existing_shards: 0,
            failed_attempts: 0,
        };

        if checkpoint.shard > 0 {
            enter(state, LoopState::Restoring);
            log::info!(target: LOG_TARGET, "Restoring previous position at shard {}", checkpoint.shard);
            self.progress.set_phase("Restoring");

            let skipped = shards
                .skip_shards(checkpoint.shard)
                .map_err(|e| e.enrich("restoring the shard position"))?;
            if skipped != checkpoint.shard {
                bail!(
                    "restore position mismatch: the checkpoint expects {} completed shards but the input only holds {skipped}",
                    checkpoint.shard
                );
            }
            summary.restored_shards = skipped;
        }

        log::info!(target: LOG_TARGET, "Starting work loop for job {}", checkpoint.job_time);
        let current_shard = Arc::new(AtomicU32::new(checkpoint.shard));
        self.progress.set_phase("Collecting");
        self.progress.set_indeterminate(Box::new({
            let current_shard = Arc::clone(&current_shard);
            move || format!("shard {}", current_shard.load(Ordering::Relaxed))
        }));

        for repos in shards {
            let repos = repos.map_err(|e| e.enrich(format!("reading the input for shard {}", checkpoint.shard)))?;
            current_shard.store(checkpoint.shard, Ordering::Relaxed);

            enter(state, LoopState::ProcessingShard);
            let request = ShardRequest {
                shard: checkpoint.shard,
                job_time: checkpoint.job_time,
                repos,
            };
            log::info!(target: LOG_TARGET, "Received shard {} with {} repositories", request.shard, request.repos.len());

            if self.process_shard(&request, &mut checkpoint, &mut summary, cancel).await? == ShardOutcome::AlreadyPresent {
                summary.existing_shards += 1;
            }

            enter(state, LoopState::Checkpointing);
            checkpoint.attempt = 0;
            checkpoint.shard += 1;
            self.store.save(&checkpoint)?;
        }

        if cancel.is_cancelled() {
            return Err(cancelled(checkpoint.shard));
        }

        enter(state, LoopState::Finalizing);
        self.progress.set_phase("Finalizing");
        let metadata = CompletionMetadata {
            shard_count: checkpoint.shard,
            job_time: checkpoint.job_time,
        };
        self.primary
            .write_metadata(&metadata)
            .map_err(|e| e.enrich("writing the completion marker"))?;
        self.raw
            .write_metadata(&metadata)
            .map_err(|e| e.enrich("writing the completion marker to the raw destination"))?;
        self.store.clear()?;

        summary.shard_count = checkpoint.shard;
        enter(state, LoopState::Done);
        log::info!(
            target: LOG_TARGET,
            "Job {} completed with {} shards",
            checkpoint.job_time,
            checkpoint.shard
        );

        Ok(summary)
    }

    /// Run attempts on one shard until one succeeds or the attempt budget is spent.
    async fn process_shard(
        &self,
        request: &ShardRequest,
        checkpoint: &mut Checkpoint,
        summary: &mut JobSummary,
        cancel: &CancellationToken,
    ) -> Result<ShardOutcome> {
        let mut last_error: Option<AppError> = None;

        loop {
            if checkpoint.attempt >= self.max_attempts {
                let message = format!("shard {} did not complete after {} attempts", request.shard, checkpoint.attempt);
                return Err(match last_error {
                    Some(e) => app_err!("{message}: {e:#}"),
                    None => app_err!("{message}"),
                });
            }

            if cancel.is_cancelled() {
                return Err(cancelled(request.shard));
            }

            checkpoint.attempt += 1;
            self.store.save(checkpoint)?;

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(cancelled(request.shard)),
                outcome = self.attempt(request) => outcome,
            };

            match outcome {
                Ok(outcome) => {
                    self.worker.post_process();
                    return Ok(outcome);
                }
                Err(e) => {
                    log::info!(
                        target: LOG_TARGET,
                        "Error processing shard {} (attempt {}): {e:#}",
                        request.shard,
                        checkpoint.attempt
                    );
                    summary.failed_attempts += 1;
                    last_error = Some(e);
                }
            }
        }
    }

    async fn attempt(&self, request: &ShardRequest) -> Result<ShardOutcome> {
        if self
            .primary
            .shard_exists(request.job_time, request.shard)
            .map_err(|e| e.enrich("checking for existing output"))?
        {
            log::info!(target: LOG_TARGET, "Output for shard {} already exists, skipping", request.shard);
            return Ok(ShardOutcome::AlreadyPresent);
        }

        self.worker.process(request).await?;
        Ok(ShardOutcome::Processed)
    }
}

fn enter(state: &mut LoopState, next: LoopState) {
    if *state != next {
        log::trace!(target: LOG_TARGET, "{state} -> {next}");
        *state = next;
    }
}

fn cancelled(shard: u32) -> AppError {
    app_err!("job cancelled while at shard {shard}")
}
