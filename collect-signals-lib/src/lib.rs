#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for collect-signals
//!
//! This library holds all functionality for the collect-signals tool, which walks very
//! large lists of project repositories, gathers per-repository signals from several
//! data providers, and writes one output row per repository. Long batch runs survive
//! crashes and resume exactly where they stopped.
//!
//! # Module Organization
//!
//! - [`signals`]: Namespaced field sets, records, repository identity, and the `Source` contract
//! - [`collector`]: Source registry and the per-repository collector
//! - [`worker`]: Sharded, checkpointed batch work loop and its destinations
//! - [`output`]: CSV and raw JSON-lines row writers
//! - [`scoring`]: Weighted scoring of collected records
//! - [`sources`]: Concrete signal sources backed by the GitHub API
//! - [`commands`]: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod collector;
pub mod commands;
pub mod output;
pub mod scoring;
pub mod signals;
pub mod sources;
pub mod worker;

pub use crate::commands::{Host, run};
