//! Scoring of collected records
//!
//! A [`Scorer`] condenses a [`Record`] into a single number that is written as an
//! extra output column. [`WeightedScorer`] is the configurable default.

mod weighted;

use crate::signals::Record;
use core::fmt::Debug;

pub use weighted::{ScoringConfig, ScoringInput, WeightedScorer};

/// Computes a score for a record. Scoring is deterministic and performs no I/O.
pub trait Scorer: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, record: &Record) -> f64;
}
