//! Default input values: what a blank field falls back to when a row is
//! added, and what `correct` writes over invalid cells.
//!
//! A default set is replaced wholesale, never edited in place. Candidates are
//! validated first; columns holding something other than a non-negative
//! integer are reported by label so the caller can decide whether to go on
//! with those columns blanked.

use crate::error::{Result, ScoretableError};
use crate::io::Table;
use crate::schema::Schema;
use crate::workbench::Confirm;

/// One value per input column (features, then threshold): a non-negative
/// integer string, or `""` for "no default".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValues {
    values: Vec<String>,
}

impl DefaultValues {
    /// Alternating `0`/`1` for the features, `5` for the threshold.
    pub fn fallback(schema: &Schema) -> Self {
        let mut values: Vec<String> = (0..schema.feature_count())
            .map(|i| (i % 2).to_string())
            .collect();
        values.push("5".to_owned());
        Self { values }
    }

    /// # Errors
    ///
    /// `Validation` naming every column whose value is not blank or a
    /// non-negative integer, or a width mismatch.
    pub fn from_values(schema: &Schema, values: Vec<String>) -> Result<Self> {
        if values.len() != schema.input_count() {
            return Err(ScoretableError::Other(format!(
                "expected {} default values, got {}",
                schema.input_count(),
                values.len()
            )));
        }
        let invalid: Vec<String> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_empty() && parse_integer(v).is_none_or(|n| n.to_string() != **v))
            .filter_map(|(i, _)| schema.input_label(i).map(str::to_owned))
            .collect();
        if !invalid.is_empty() {
            return Err(ScoretableError::Validation { columns: invalid });
        }
        Ok(Self { values })
    }

    /// Default for input column `index`, `""` when there is none.
    pub fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Single-row table keyed by input column, as persisted on disk.
    pub fn to_table(&self, schema: &Schema) -> Table {
        let mut table = Table::new(schema.input_keys().into_iter().map(str::to_owned).collect());
        table.push_row(self.values.clone());
        table
    }
}

/// A validated-but-not-yet-applied default set.
///
/// Only built by [`Self::from_inputs`] and [`Self::from_table`], so its
/// values always hold one non-negative integer or blank per input column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultsCandidate {
    values: Vec<String>,
    invalid: Vec<String>,
    warnings: Vec<String>,
}

impl DefaultsCandidate {
    /// Strict parsing of typed inputs: a non-negative integer, or blank.
    ///
    /// Missing trailing inputs are blank.
    pub fn from_inputs<S: AsRef<str>>(schema: &Schema, inputs: &[S]) -> Self {
        let raw = (0..schema.input_count())
            .map(|i| inputs.get(i).map(|s| s.as_ref().trim()).unwrap_or(""));
        Self::collect(schema, raw, parse_integer)
    }

    /// Lenient parsing of a defaults file: the first row only, each value
    /// read as a number and truncated toward zero. Absent columns are blank.
    ///
    /// # Errors
    ///
    /// `Resource` if the table has no data row.
    pub fn from_table(schema: &Schema, table: &Table) -> Result<Self> {
        if table.height() == 0 {
            return Err(ScoretableError::resource(
                "The selected file does not contain any rows",
            ));
        }
        let raw = schema.inputs().map(|c| {
            table
                .headers
                .iter()
                .position(|h| h.trim() == c.key)
                .map(|col| table.cell(0, col).trim())
                .unwrap_or("")
        });
        let mut candidate = Self::collect(schema, raw, parse_truncated);
        if table.height() > 1 {
            tracing::warn!(rows = table.height(), "defaults file has more than one row");
            candidate
                .warnings
                .push("The file contains multiple rows: only the first one was used.".to_owned());
        }
        Ok(candidate)
    }

    fn collect<'a>(
        schema: &Schema,
        raw: impl Iterator<Item = &'a str>,
        parse: fn(&str) -> Option<u64>,
    ) -> Self {
        let mut values = Vec::with_capacity(schema.input_count());
        let mut invalid = Vec::new();
        for (i, value) in raw.enumerate() {
            if value.is_empty() {
                values.push(String::new());
                continue;
            }
            match parse(value) {
                Some(n) => values.push(n.to_string()),
                None => {
                    values.push(String::new());
                    if let Some(label) = schema.input_label(i) {
                        invalid.push(label.to_owned());
                    }
                }
            }
        }
        Self {
            values,
            invalid,
            warnings: Vec::new(),
        }
    }

    /// Candidate values, invalid entries already blanked.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Labels of the columns that were blanked.
    pub fn invalid(&self) -> &[String] {
        &self.invalid
    }

    /// Non-fatal remarks, e.g. extra rows in a defaults file.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_clean(&self) -> bool {
        self.invalid.is_empty()
    }
}

fn parse_integer(value: &str) -> Option<u64> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|n| u64::try_from(n).ok())
}

fn parse_truncated(value: &str) -> Option<u64> {
    let n = value.parse::<f64>().ok().filter(|n| n.is_finite())?.trunc();
    // Truncation can turn a small negative into zero, which is accepted.
    if n < 0.0 || n > u64::MAX as f64 {
        return None;
    }
    Some(n as u64)
}

/// Holds the active default set.
#[derive(Debug, Clone)]
pub struct DefaultsManager {
    active: DefaultValues,
}

impl DefaultsManager {
    pub fn new(schema: &Schema) -> Self {
        Self {
            active: DefaultValues::fallback(schema),
        }
    }

    pub fn active(&self) -> &DefaultValues {
        &self.active
    }

    /// Replaces the active set with `candidate`.
    ///
    /// If the candidate blanked any column, `confirm` is asked first and a
    /// refusal leaves the active set untouched.
    ///
    /// # Errors
    ///
    /// `Aborted` when the confirmation is declined.
    pub fn apply(
        &mut self,
        candidate: DefaultsCandidate,
        confirm: &mut dyn Confirm,
    ) -> Result<&DefaultValues> {
        if !candidate.is_clean() {
            let message = format!(
                "The following fields contain invalid (non-numeric or negative) values:\n\n{}\n\nDo you want to continue and set these to empty?",
                candidate.invalid.join(", ")
            );
            if !confirm.confirm("Invalid Inputs", &message) {
                tracing::info!(invalid = ?candidate.invalid, "new defaults declined");
                return Err(ScoretableError::Aborted);
            }
        }
        self.active = DefaultValues {
            values: candidate.values,
        };
        tracing::info!(defaults = ?self.active.values, "defaults applied");
        Ok(&self.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbench::FixedAnswer;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn test_fallback_defaults() {
        let defaults = DefaultValues::fallback(&Schema::standard());
        assert_eq!(
            defaults.values(),
            &strings(&["0", "1", "0", "1", "0", "1", "0", "1", "0", "1", "0", "1", "5"])[..]
        );
        assert_eq!(defaults.value(12), "5");
        assert_eq!(defaults.value(99), "");
    }

    #[test]
    fn test_from_values_rejects_non_integers() {
        let schema = Schema::standard();
        let mut values = vec![String::new(); 13];
        values[0] = "1.5".to_owned();
        values[12] = "-1".to_owned();
        let err = DefaultValues::from_values(&schema, values).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or missing values in: A, Threshold");
    }

    #[test]
    fn test_candidate_from_inputs_is_strict() {
        let schema = Schema::standard();
        let candidate =
            DefaultsCandidate::from_inputs(&schema, &["3", "", "2.5", "-1", " 007 ", "x"]);
        assert_eq!(candidate.values.len(), 13);
        assert_eq!(&candidate.values[..6], &strings(&["3", "", "", "", "7", ""])[..]);
        assert_eq!(candidate.invalid, strings(&["C", "D", "F"]));
        assert_eq!(candidate.values[12], "");
    }

    #[test]
    fn test_candidate_from_table_truncates() -> Result<()> {
        let schema = Schema::standard();
        let table = Table {
            headers: strings(&["a", "b", "c", "threshold", "unrelated"]),
            rows: vec![
                strings(&["2.9", "-0.5", "-3", "1e1", "zzz"]),
                strings(&["9", "9", "9", "9", "9"]),
            ],
        };
        let candidate = DefaultsCandidate::from_table(&schema, &table)?;
        assert_eq!(&candidate.values[..3], &strings(&["2", "0", ""])[..]);
        assert_eq!(candidate.values[3], "");
        assert_eq!(candidate.values[12], "10");
        assert_eq!(candidate.invalid, strings(&["C"]));
        assert_eq!(candidate.warnings.len(), 1);
        Ok(())
    }

    #[test]
    fn test_candidate_from_empty_table_fails() {
        let schema = Schema::standard();
        let table = Table::new(strings(&["a"]));
        assert!(DefaultsCandidate::from_table(&schema, &table).is_err());
    }

    #[test]
    fn test_apply_requires_confirmation_for_invalid_columns() {
        let schema = Schema::standard();
        let mut manager = DefaultsManager::new(&schema);
        let before = manager.active().clone();
        let candidate = DefaultsCandidate::from_inputs(&schema, &["x"]);

        let err = manager
            .apply(candidate.clone(), &mut FixedAnswer(false))
            .unwrap_err();
        assert!(matches!(err, ScoretableError::Aborted));
        assert_eq!(manager.active(), &before);

        let applied = manager.apply(candidate, &mut FixedAnswer(true)).unwrap();
        assert!(applied.values().iter().all(String::is_empty));
    }

    #[test]
    fn test_apply_clean_candidate_skips_confirmation() {
        let schema = Schema::standard();
        let mut manager = DefaultsManager::new(&schema);
        let mut never = |_: &str, _: &str| -> bool { panic!("should not ask") };
        let inputs: Vec<String> = (0..13).map(|i| i.to_string()).collect();
        let candidate = DefaultsCandidate::from_inputs(&schema, &inputs);

        manager.apply(candidate, &mut never).unwrap();
        assert_eq!(manager.active().value(12), "12");
    }

    #[test]
    fn test_applied_candidates_always_hold_valid_defaults() {
        let schema = Schema::standard();
        let mut manager = DefaultsManager::new(&schema);
        let too_many: Vec<String> = (0..20).map(|i| format!("{i}.5")).collect();
        let noisy = ["abc", "-2", "1e3", "", " 4 ", "NaN", "inf", "18446744073709551616"];

        for candidate in [
            DefaultsCandidate::from_inputs(&schema, &too_many),
            DefaultsCandidate::from_inputs(&schema, &noisy),
        ] {
            assert_eq!(candidate.values().len(), schema.input_count());
            let applied = manager.apply(candidate, &mut FixedAnswer(true)).unwrap().clone();
            let checked = DefaultValues::from_values(&schema, applied.values().to_vec()).unwrap();
            assert_eq!(checked, applied);
        }
        assert_eq!(manager.active().value(4), "4");
    }

    #[test]
    fn test_to_table_is_single_row() {
        let schema = Schema::standard();
        let table = DefaultValues::fallback(&schema).to_table(&schema);
        assert_eq!(table.height(), 1);
        assert_eq!(table.headers[12], "threshold");
    }
}
