use crate::Result;
use crate::signals::{Record, SignalSet};
use compact_str::CompactString;
use ohno::{IntoAppError, bail};
use std::io::Write;

/// A caller-supplied column appended after the signal columns, such as a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraField {
    pub key: CompactString,
    pub value: String,
}

impl ExtraField {
    #[must_use]
    pub fn new(key: impl Into<CompactString>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Writes records as CSV rows with a schema fixed up front.
///
/// The header is `namespace.field` for every field of every template, in template
/// order, followed by the extra column names. Every record written afterwards must
/// match that schema exactly.
#[derive(Debug)]
pub struct SignalWriter<W: Write> {
    writer: csv::Writer<W>,
    templates: Vec<SignalSet>,
    extras: Vec<CompactString>,
}

impl<W: Write> SignalWriter<W> {
    /// Create a writer and emit the header row.
    pub fn new(out: W, templates: &[SignalSet], extras: &[&str]) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(out);

        let header: Vec<String> = templates
            .iter()
            .flat_map(SignalSet::columns)
            .chain(extras.iter().map(ToString::to_string))
            .collect();
        writer.write_record(&header).into_app_err("unable to write CSV header")?;

        Ok(Self {
            writer,
            templates: templates.to_vec(),
            extras: extras.iter().map(|e| CompactString::from(*e)).collect(),
        })
    }

    /// The column names, in output order.
    pub fn header(&self) -> impl Iterator<Item = String> + '_ {
        self.templates
            .iter()
            .flat_map(SignalSet::columns)
            .chain(self.extras.iter().map(ToString::to_string))
    }

    /// Append one row.
    pub fn write_record(&mut self, record: &Record, extras: &[ExtraField]) -> Result<()> {
        if record.sets().len() != self.templates.len() {
            bail!(
                "record for '{}' holds {} signal sets but the output expects {}",
                record.repo(),
                record.sets().len(),
                self.templates.len()
            );
        }

        for (set, template) in record.sets().iter().zip(&self.templates) {
            if !set.same_schema(template) {
                bail!(
                    "record for '{}' has a '{}' set that does not match the '{}' columns",
                    record.repo(),
                    set.namespace(),
                    template.namespace()
                );
            }
        }

        if extras.len() != self.extras.len() || extras.iter().zip(&self.extras).any(|(e, key)| e.key != *key) {
            bail!("extra columns for '{}' do not match the output header", record.repo());
        }

        let row = record
            .sets()
            .iter()
            .flat_map(SignalSet::fields)
            .map(|field| field.value.to_cell())
            .chain(extras.iter().map(|e| e.value.clone()));

        self.writer
            .write_record(row)
            .into_app_err_with(|| format!("unable to write CSV row for '{}'", record.repo()))
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error())
            .into_app_err("unable to flush CSV output")
    }
}
