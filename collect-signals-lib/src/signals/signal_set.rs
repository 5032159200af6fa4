use super::{FieldDef, FieldValue, Namespace};
use crate::Result;
use ohno::bail;

/// A field definition paired with its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub def: FieldDef,
    pub value: FieldValue,
}

impl Field {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.def.name
    }
}

/// An ordered collection of fields sharing one namespace.
///
/// A set starts life as an empty template (every field unset) built from the owning
/// source's schema, and becomes populated as a fetch assigns values. The field order
/// is the schema order and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSet {
    namespace: Namespace,
    fields: Vec<Field>,
}

impl SignalSet {
    /// Build the empty template for a schema.
    #[must_use]
    pub fn empty(namespace: impl Into<Namespace>, defs: &[FieldDef]) -> Self {
        Self {
            namespace: namespace.into(),
            fields: defs
                .iter()
                .map(|def| Field {
                    def: *def,
                    value: FieldValue::Unset,
                })
                .collect(),
        }
    }

    #[must_use]
    pub const fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = &Field> {
        self.fields.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when no field has been assigned a value.
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.fields.iter().all(|f| f.value.is_unset())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.def.name == name).map(|f| &f.value)
    }

    /// Assign a value to a declared field.
    ///
    /// # Errors
    ///
    /// Fails if the field is not part of the schema, or if the value's kind does not
    /// match the declared kind. Assigning [`FieldValue::Unset`] is always allowed.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        let value = value.into();
        let Some(field) = self.fields.iter_mut().find(|f| f.def.name == name) else {
            bail!("field '{name}' is not declared in namespace '{}'", self.namespace);
        };

        if let Some(kind) = value.kind()
            && kind != field.def.kind
        {
            bail!(
                "field '{}' expects a {} value, got {kind}",
                self.namespace.column(name),
                field.def.kind
            );
        }

        field.value = value;
        Ok(())
    }

    /// Builder form of [`SignalSet::set`].
    ///
    /// # Errors
    ///
    /// Same as [`SignalSet::set`].
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Output column names for this set, in schema order.
    pub fn columns(&self) -> impl Iterator<Item = String> + '_ {
        self.fields.iter().map(|f| self.namespace.column(f.def.name))
    }

    /// True when both sets have the same namespace and the same field definitions.
    #[must_use]
    pub fn same_schema(&self, other: &Self) -> bool {
        self.namespace == other.namespace
            && self.fields.len() == other.fields.len()
            && self.fields.iter().zip(&other.fields).all(|(a, b)| a.def == b.def)
    }
}
