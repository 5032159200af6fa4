use chrono::{DateTime, SecondsFormat, Utc};
use compact_str::CompactString;
use serde::Serialize;
use strum::Display;

/// Semantic type of a field, declared by the source that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FieldKind {
    Int,
    Float,
    Text,
    Bool,
    Timestamp,
}

/// One entry in a source's schema: the field name and its semantic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDef {
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// The value of a field. `Unset` means "not collected", which is not the same as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Unset,
    Int(i64),
    Float(f64),
    Text(CompactString),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    #[must_use]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// The kind of the contained value, or `None` when unset.
    #[must_use]
    pub const fn kind(&self) -> Option<FieldKind> {
        match self {
            Self::Unset => None,
            Self::Int(_) => Some(FieldKind::Int),
            Self::Float(_) => Some(FieldKind::Float),
            Self::Text(_) => Some(FieldKind::Text),
            Self::Bool(_) => Some(FieldKind::Bool),
            Self::Timestamp(_) => Some(FieldKind::Timestamp),
        }
    }

    /// Numeric view used for scoring. Text, timestamps, and unset values have none.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "signal counts are far below 2^53")]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Unset | Self::Text(_) | Self::Timestamp(_) => None,
        }
    }

    /// Render the value as a CSV cell. Unset values render as an empty cell.
    #[must_use]
    pub fn to_cell(&self) -> String {
        match self {
            Self::Unset => String::new(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
            Self::Timestamp(v) => v.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::Unset, Self::Int)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.into())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unset_is_not_zero() {
        let unset = FieldValue::Unset;
        let zero = FieldValue::Int(0);
        assert_ne!(unset, zero);
        assert!(unset.is_unset());
        assert_eq!(unset.as_f64(), None);
        assert_eq!(zero.as_f64(), Some(0.0));
    }

    #[test]
    fn test_kind() {
        assert_eq!(FieldValue::Unset.kind(), None);
        assert_eq!(FieldValue::from(3_i64).kind(), Some(FieldKind::Int));
        assert_eq!(FieldValue::from("x").kind(), Some(FieldKind::Text));
        assert_eq!(FieldValue::from(true).kind(), Some(FieldKind::Bool));
    }

    #[test]
    fn test_to_cell() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(FieldValue::Unset.to_cell(), "");
        assert_eq!(FieldValue::Int(42).to_cell(), "42");
        assert_eq!(FieldValue::Float(1.5).to_cell(), "1.5");
        assert_eq!(FieldValue::Bool(false).to_cell(), "false");
        assert_eq!(FieldValue::Timestamp(ts).to_cell(), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn test_from_option() {
        assert!(FieldValue::from(None::<i64>).is_unset());
        assert_eq!(FieldValue::from(Some(7_i64)), FieldValue::Int(7));
    }

    #[test]
    fn test_from_u64_overflow_is_unset() {
        assert!(FieldValue::from(u64::MAX).is_unset());
        assert_eq!(FieldValue::from(5_u64), FieldValue::Int(5));
    }

    #[test]
    fn test_serialize_unset_as_null() {
        let json = serde_json::to_string(&vec![FieldValue::Unset, FieldValue::Int(1), FieldValue::from("a")]).unwrap();
        assert_eq!(json, r#"[null,1,"a"]"#);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(FieldKind::Timestamp.to_string(), "timestamp");
    }
}
