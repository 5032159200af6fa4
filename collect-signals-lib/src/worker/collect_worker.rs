use super::{Destination, ShardRequest, ShardWorker};
use crate::Result;
use crate::collector::{CollectError, Collector};
use crate::output::{ExtraField, RawWriter, SignalWriter};
use crate::scoring::Scorer;
use crate::signals::{Record, RepoSpec};
use compact_str::CompactString;
use core::num::NonZeroUsize;
use core::sync::atomic::{AtomicU64, Ordering};
use futures::future::BoxFuture;
use futures::{StreamExt, TryStreamExt, stream};
use ohno::EnrichableExt;
use std::sync::Arc;

const LOG_TARGET: &str = "    worker";

/// Running totals across the shards a worker completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub shards: u64,
    pub collected: u64,
    pub uncollectable: u64,
}

/// Shard worker that runs every repository through a [`Collector`] and writes the
/// shard's rows to the primary (CSV) and raw (JSON lines) destinations.
///
/// A shard's outputs are only written once every repository reached a terminal
/// state. The raw output is written first, so an existing primary output implies
/// the raw one exists too.
#[derive(Debug)]
pub struct CollectWorker {
    collector: Collector,
    scorer: Option<(Arc<dyn Scorer>, CompactString)>,
    primary: Arc<dyn Destination>,
    raw: Arc<dyn Destination>,
    concurrency: NonZeroUsize,
    shards: AtomicU64,
    collected: AtomicU64,
    uncollectable: AtomicU64,
}

impl CollectWorker {
    #[must_use]
    pub const fn new(collector: Collector, primary: Arc<dyn Destination>, raw: Arc<dyn Destination>) -> Self {
        Self {
            collector,
            scorer: None,
            primary,
            raw,
            concurrency: NonZeroUsize::MIN,
            shards: AtomicU64::new(0),
            collected: AtomicU64::new(0),
            uncollectable: AtomicU64::new(0),
        }
    }

    /// Append a score column named `column` to every primary row.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>, column: impl Into<CompactString>) -> Self {
        self.scorer = Some((scorer, column.into()));
        self
    }

    /// Number of repositories of a shard collected at the same time.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn stats(&self) -> WorkerStats {
        WorkerStats {
            shards: self.shards.load(Ordering::Relaxed),
            collected: self.collected.load(Ordering::Relaxed),
            uncollectable: self.uncollectable.load(Ordering::Relaxed),
        }
    }

    async fn collect_one(&self, repo: &RepoSpec, job_id: &str) -> Result<Option<Record>> {
        match self.collector.collect(repo, job_id).await {
            Ok(record) => Ok(Some(record)),
            Err(e @ CollectError::Uncollectable { .. }) => {
                log::warn!(target: LOG_TARGET, "Skipping: {e}");
                Ok(None)
            }
            Err(CollectError::Failed(e)) => Err(e.enrich(format!("could not collect signals for '{repo}'"))),
        }
    }

    async fn process_shard(&self, request: &ShardRequest) -> Result<()> {
        let job_id = request.job_id();

        let pending: Vec<_> = request.repos.iter().map(|repo| self.collect_one(repo, &job_id)).collect();
        let results: Vec<Option<Record>> = stream::iter(pending)
            .buffered(self.concurrency.get())
            .try_collect()
            .await?;

        let extras: Vec<&str> = self.scorer.iter().map(|(_, column)| column.as_str()).collect();
        let mut signals = SignalWriter::new(Vec::new(), &self.collector.empty_sets(), &extras)?;
        let mut raw = RawWriter::new(Vec::new());

        let mut collected = 0;
        let mut uncollectable = 0;
        for record in &results {
            let Some(record) = record else {
                uncollectable += 1;
                continue;
            };

            let extras: Vec<ExtraField> = self
                .scorer
                .iter()
                .map(|(scorer, column)| ExtraField::new(column.clone(), format!("{:.5}", scorer.score(record))))
                .collect();

            raw.write_record(record)?;
            signals.write_record(record, &extras)?;
            collected += 1;
        }

        self.raw
            .write_shard(request.job_time, request.shard, &raw.into_inner()?)
            .map_err(|e| e.enrich("writing the raw shard"))?;
        self.primary
            .write_shard(request.job_time, request.shard, &signals.into_inner()?)
            .map_err(|e| e.enrich("writing the shard"))?;

        let _ = self.collected.fetch_add(collected, Ordering::Relaxed);
        let _ = self.uncollectable.fetch_add(uncollectable, Ordering::Relaxed);
        log::debug!(
            target: LOG_TARGET,
            "Shard {} wrote {collected} rows, skipped {uncollectable} repositories",
            request.shard
        );

        Ok(())
    }
}

impl ShardWorker for CollectWorker {
    fn process<'a>(&'a self, request: &'a ShardRequest) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.process_shard(request))
    }

    fn post_process(&self) {
        let _ = self.shards.fetch_add(1, Ordering::Relaxed);
    }
}
