//! Row writers for collected records
//!
//! [`SignalWriter`] produces the primary CSV output, whose columns are fixed from the
//! registered templates before any data is collected. [`RawWriter`] produces the raw
//! JSON-lines mirror.

mod raw_writer;
mod signal_writer;

pub use raw_writer::RawWriter;
pub use signal_writer::{ExtraField, SignalWriter};
