use crate::defaults::DefaultValues;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};

/// A value typed into an input field, or nothing at all.
///
/// `Unset` resolves to the schema default for that column when a row is built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldInput {
    Set(String),
    #[default]
    Unset,
}

impl FieldInput {
    /// Blank or whitespace-only text counts as unset.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Self::Unset
        } else {
            Self::Set(raw.to_owned())
        }
    }

    pub fn resolve(&self, default: &str) -> String {
        match self {
            Self::Set(value) if !value.trim().is_empty() => value.clone(),
            Self::Set(_) | Self::Unset => default.to_owned(),
        }
    }
}

/// Pending input for one row: a value per feature plus the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDraft {
    pub fields: Vec<FieldInput>,
    pub threshold: FieldInput,
}

impl RowDraft {
    /// A draft with every input unset, i.e. all defaults.
    pub fn unset(schema: &Schema) -> Self {
        Self {
            fields: vec![FieldInput::Unset; schema.feature_count()],
            threshold: FieldInput::Unset,
        }
    }

    /// Builds a draft from raw input strings: features first, threshold last.
    ///
    /// Missing trailing inputs are unset.
    pub fn from_inputs<S: AsRef<str>>(schema: &Schema, inputs: &[S]) -> Self {
        let mut draft = Self::unset(schema);
        for (slot, raw) in draft.fields.iter_mut().zip(inputs) {
            *slot = FieldInput::from_raw(raw.as_ref());
        }
        if let Some(raw) = inputs.get(schema.feature_count()) {
            draft.threshold = FieldInput::from_raw(raw.as_ref());
        }
        draft
    }

    /// Substitutes defaults for unset inputs. Returns `(fields, threshold)`.
    pub fn resolve(&self, defaults: &DefaultValues) -> (Vec<String>, String) {
        let fields = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, input)| input.resolve(defaults.value(i)))
            .collect();
        let threshold = self.threshold.resolve(defaults.value(self.fields.len()));
        (fields, threshold)
    }
}
