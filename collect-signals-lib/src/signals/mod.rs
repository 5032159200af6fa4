//! Signal model shared by every source and writer
//!
//! A signal is a single named, typed measurement about a repository. Signals are
//! grouped into a [`SignalSet`] scoped by a [`Namespace`]; each registered
//! [`Source`] produces exactly one set per repository. A [`Record`] is the union
//! of one set per registered namespace for a single repository.
//!
//! # Implementation Model
//!
//! Sources declare their schema up front: a namespace and an ordered list of
//! [`FieldDef`] entries. [`SignalSet::empty`] builds the "empty template" for that
//! schema with every field [`FieldValue::Unset`], which costs no I/O. Fetching fills
//! in values through [`SignalSet::set`], which refuses unknown fields and values of
//! the wrong kind. Output writers read the schema directly from the templates
//! instead of introspecting runtime types.
//!
//! "Unset" is a first-class state distinct from zero: a column that is present in a
//! row does not imply the value was collected.

mod field;
mod namespace;
mod record;
mod repo_spec;
mod signal_set;
mod source;

pub use field::{FieldDef, FieldKind, FieldValue};
pub use namespace::{NAMESPACE_SEPARATOR, Namespace};
pub use record::Record;
pub use repo_spec::RepoSpec;
pub use signal_set::{Field, SignalSet};
pub use source::Source;
