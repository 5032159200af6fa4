use crate::Result;
use crate::signals::Record;
use ohno::IntoAppError;
use serde_json::{Map, Value, json};
use std::io::Write;

/// Writes records as JSON lines, one object per repository.
///
/// Each line has the shape `{"repo": "<url>", "signals": {"<namespace>": {"<field>": <value>}}}`
/// with unset fields written as `null`.
#[derive(Debug)]
pub struct RawWriter<W: Write> {
    out: W,
}

impl<W: Write> RawWriter<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let mut signals = Map::with_capacity(record.sets().len());
        for set in record.sets() {
            let fields: Map<String, Value> = set
                .fields()
                .map(|field| Ok((field.name().to_string(), serde_json::to_value(&field.value)?)))
                .collect::<Result<_, serde_json::Error>>()
                .into_app_err_with(|| format!("unable to encode '{}' signals for '{}'", set.namespace(), record.repo()))?;
            let _ = signals.insert(set.namespace().to_string(), Value::Object(fields));
        }

        let line = json!({
            "repo": record.repo().as_str(),
            "signals": signals,
        });

        serde_json::to_writer(&mut self.out, &line).into_app_err_with(|| format!("unable to write raw record for '{}'", record.repo()))?;
        self.out.write_all(b"\n").into_app_err("unable to write raw record")
    }

    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush().into_app_err("unable to flush raw output")?;
        Ok(self.out)
    }
}
