use crate::Result;
use crate::signals::RepoSpec;
use chrono::{DateTime, SecondsFormat, Utc};
use core::num::NonZeroUsize;

/// One unit of work handed to a shard worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardRequest {
    pub shard: u32,
    pub job_time: DateTime<Utc>,
    pub repos: Vec<RepoSpec>,
}

impl ShardRequest {
    /// The job identifier handed to every source. Identical across retries of a run.
    #[must_use]
    pub fn job_id(&self) -> String {
        self.job_time.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Groups a fallible item stream into consecutive shards of at most `size` items.
///
/// The first input error ends the stream after being yielded.
#[derive(Debug)]
pub struct Shards<I> {
    inner: I,
    size: NonZeroUsize,
    done: bool,
}

impl<I, T> Shards<I>
where
    I: Iterator<Item = Result<T>>,
{
    pub fn new(inner: impl IntoIterator<IntoIter = I>, size: NonZeroUsize) -> Self {
        Self {
            inner: inner.into_iter(),
            size,
            done: false,
        }
    }

    /// Discard up to `count` shards, returning how many were actually available.
    pub fn skip_shards(&mut self, count: u32) -> Result<u32> {
        let mut skipped = 0;
        while skipped < count {
            match self.next() {
                Some(shard) => {
                    let _ = shard?;
                    skipped += 1;
                }
                None => break,
            }
        }
        Ok(skipped)
    }
}

impl<I, T> Iterator for Shards<I>
where
    I: Iterator<Item = Result<T>>,
{
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut shard = Vec::with_capacity(self.size.get());
        while shard.len() < self.size.get() {
            match self.inner.next() {
                Some(Ok(item)) => shard.push(item),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if shard.is_empty() { None } else { Some(Ok(shard)) }
    }
}
