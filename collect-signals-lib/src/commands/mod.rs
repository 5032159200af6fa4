//! Command-line interface and orchestration for collect-signals
//!
//! This module implements the single `collect-signals` command and wires the other
//! modules together: it parses arguments, loads configuration, registers the signal
//! sources, and hands the input to the batch work loop.
//!
//! # Execution Flow
//!
//! 1. Parse arguments and initialize logging
//! 2. Load `collect_signals.toml` (or the embedded defaults) and apply CLI overrides
//! 3. Register the sources and build the collector and optional scorer
//! 4. Open the checkpoint store and the primary and raw destinations
//! 5. Stream the input files through the work loop, shard by shard
//! 6. Print a job summary, or the error that ended the job
//!
//! Output goes through the [`Host`] trait so the whole command can run against
//! in-memory buffers in tests.

mod collect;
mod common;
mod config;
mod host;
mod input;
mod progress_reporter;
mod run;

pub use collect::{CollectArgs, process_collect};
pub use common::{ColorMode, LogLevel};
pub use config::{CONFIG_FILE_NAME, Config, DEFAULT_CONFIG_TOML};
pub use host::Host;
pub use input::{STDIN_PATH, read_input};
pub use progress_reporter::ProgressReporter;
pub use run::run;

