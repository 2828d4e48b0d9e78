//! Column schema shared by the row store, the scoring pipeline and the
//! import/export adapter.
//!
//! A schema is an ordered list of feature columns, one threshold column and
//! the two derived output columns. The features followed by the threshold
//! are the *input columns*: they are what a user types in, what defaults
//! cover and what gets repaired.

use serde::{Deserialize, Serialize};

/// One column: a stable key used in files, and a label shown to people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub label: String,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    features: Vec<ColumnSpec>,
    threshold: ColumnSpec,
    output_key: String,
    flag_key: String,
}

impl Schema {
    pub fn new(features: Vec<ColumnSpec>, threshold: ColumnSpec) -> Self {
        Self {
            features,
            threshold,
            output_key: "output".to_owned(),
            flag_key: "output_flag".to_owned(),
        }
    }

    /// Twelve features `a`..`l` (labels `A`..`L`) plus `threshold`.
    pub fn standard() -> Self {
        let features = ('a'..='l')
            .map(|c| ColumnSpec::new(c.to_string(), c.to_ascii_uppercase().to_string()))
            .collect();
        Self::new(features, ColumnSpec::new("threshold", "Threshold"))
    }

    pub fn features(&self) -> &[ColumnSpec] {
        &self.features
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn threshold(&self) -> &ColumnSpec {
        &self.threshold
    }

    /// Number of input columns (features + threshold).
    pub fn input_count(&self) -> usize {
        self.features.len() + 1
    }

    /// Features followed by the threshold column.
    pub fn inputs(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.features.iter().chain(std::iter::once(&self.threshold))
    }

    pub fn input_keys(&self) -> Vec<&str> {
        self.inputs().map(|c| c.key.as_str()).collect()
    }

    pub fn input_labels(&self) -> Vec<String> {
        self.inputs().map(|c| c.label.clone()).collect()
    }

    pub fn output_keys(&self) -> [&str; 2] {
        [self.output_key.as_str(), self.flag_key.as_str()]
    }

    /// Input keys followed by the output keys, in display order.
    pub fn all_keys(&self) -> Vec<&str> {
        let mut keys = self.input_keys();
        keys.extend(self.output_keys());
        keys
    }

    /// Label of the input column at `index`, where `feature_count()` is the threshold.
    pub fn input_label(&self, index: usize) -> Option<&str> {
        self.inputs().nth(index).map(|c| c.label.as_str())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_schema_layout() {
        let schema = Schema::standard();
        assert_eq!(schema.feature_count(), 12);
        assert_eq!(schema.input_count(), 13);
        assert_eq!(schema.features()[0].key, "a");
        assert_eq!(schema.features()[11].label, "L");
        assert_eq!(schema.input_label(12), Some("Threshold"));
        assert_eq!(schema.input_label(13), None);
    }

    #[test]
    fn test_all_keys_order() {
        let schema = Schema::standard();
        let keys = schema.all_keys();
        assert_eq!(keys.len(), 15);
        assert_eq!(keys[12], "threshold");
        assert_eq!(&keys[13..], &["output", "output_flag"]);
    }
}
