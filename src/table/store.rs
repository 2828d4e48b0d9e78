use super::draft::{FieldInput, RowDraft};
use super::repair;
use super::row::{Flag, Row, RowId};
use crate::defaults::DefaultValues;
use crate::error::{Result, ScoretableError};
use crate::schema::Schema;
use std::collections::HashSet;

/// Ordered collection of rows, addressed by [`RowId`].
///
/// Every mutating operation takes the target ids explicitly; the store never
/// tracks a selection of its own. Positions are renumbered `1..=len` after
/// every structural change.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    feature_count: usize,
    rows: Vec<Row>,
}

impl RowStore {
    pub fn new(schema: &Schema) -> Self {
        Self {
            feature_count: schema.feature_count(),
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id() == id)
    }

    pub fn ids(&self) -> Vec<RowId> {
        self.rows.iter().map(Row::id).collect()
    }

    /// Row id currently displayed at a 1-based position.
    pub fn id_at(&self, position: usize) -> Option<RowId> {
        position
            .checked_sub(1)
            .and_then(|idx| self.rows.get(idx))
            .map(Row::id)
    }

    /// Resolves 1-based positions to ids, failing on the first unknown position.
    ///
    /// # Errors
    ///
    /// Returns `Validation` naming the out-of-range positions.
    pub fn ids_at(&self, positions: &[usize]) -> Result<Vec<RowId>> {
        let mut ids = Vec::with_capacity(positions.len());
        let mut unknown = Vec::new();
        for &pos in positions {
            match self.id_at(pos) {
                Some(id) => ids.push(id),
                None => unknown.push(format!("row {pos}")),
            }
        }
        if unknown.is_empty() {
            Ok(ids)
        } else {
            Err(ScoretableError::Validation { columns: unknown })
        }
    }

    /// Appends a row with empty outputs.
    ///
    /// # Errors
    ///
    /// `EmptyInput` if every value, threshold included, is blank.
    pub fn add(&mut self, fields: Vec<String>, threshold: String) -> Result<Row> {
        self.check_width(&fields)?;
        let row = Row::new(self.rows.len() + 1, fields, threshold);
        if row.is_blank() {
            return Err(ScoretableError::EmptyInput);
        }
        tracing::debug!(id = %row.id(), position = row.position(), "row added");
        self.rows.push(row.clone());
        Ok(row)
    }

    /// Appends a row read from a file, outputs included. Blank checks are the
    /// caller's job.
    pub(crate) fn push_imported(
        &mut self,
        fields: Vec<String>,
        threshold: String,
        output: String,
        flag: Flag,
    ) -> Result<RowId> {
        self.check_width(&fields)?;
        let mut row = Row::new(self.rows.len() + 1, fields, threshold);
        row.set_outputs(output, flag);
        let id = row.id();
        self.rows.push(row);
        Ok(id)
    }

    /// Overwrites inputs of the given rows and clears their outputs.
    ///
    /// Ids and positions are preserved. Returns the number of rows edited.
    ///
    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty.
    pub fn edit(&mut self, ids: &[RowId], fields: &[String], threshold: &str) -> Result<usize> {
        let targets = selection(ids)?;
        self.check_width(fields)?;
        let mut edited = 0;
        for row in self.rows.iter_mut().filter(|r| targets.contains(&r.id())) {
            row.set_inputs(fields.to_vec(), threshold.to_owned());
            row.clear_outputs();
            edited += 1;
        }
        Ok(edited)
    }

    /// Removes rows and renumbers the rest. Returns the number removed.
    ///
    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty.
    pub fn delete(&mut self, ids: &[RowId]) -> Result<usize> {
        let targets = selection(ids)?;
        let before = self.rows.len();
        self.rows.retain(|r| !targets.contains(&r.id()));
        self.renumber();
        Ok(before - self.rows.len())
    }

    /// Blanks `output` and `output_flag` on the given rows only.
    ///
    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty.
    pub fn clear_outputs(&mut self, ids: &[RowId]) -> Result<usize> {
        let targets = selection(ids)?;
        let mut cleared = 0;
        for row in self.rows.iter_mut().filter(|r| targets.contains(&r.id())) {
            row.clear_outputs();
            cleared += 1;
        }
        Ok(cleared)
    }

    /// Rounds valid non-negative inputs and blanks the rest. Rows left with
    /// no value at all are deleted; returns how many.
    ///
    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty.
    pub fn clean(&mut self, ids: &[RowId]) -> Result<usize> {
        let targets = selection(ids)?;
        let before = self.rows.len();
        self.rows.retain_mut(|row| {
            if !targets.contains(&row.id()) {
                return true;
            }
            let cleaned: Vec<String> = row.inputs().map(repair::clean_value).collect();
            let keep = cleaned.iter().any(|v| !v.is_empty());
            if keep {
                row.replace_inputs(cleaned);
            }
            keep
        });
        self.renumber();
        let removed = before - self.rows.len();
        if removed > 0 {
            tracing::info!(removed, "rows with no valid input removed by clean");
        }
        Ok(removed)
    }

    /// Rounds valid non-negative inputs and replaces invalid or blank ones
    /// with `defaults`. A row with no valid input at all is deleted instead of
    /// repaired; returns how many were deleted.
    ///
    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty.
    pub fn correct(&mut self, ids: &[RowId], defaults: &DefaultValues) -> Result<usize> {
        let targets = selection(ids)?;
        let before = self.rows.len();
        self.rows.retain_mut(|row| {
            if !targets.contains(&row.id()) {
                return true;
            }
            let salvageable = row
                .inputs()
                .any(|v| repair::round_non_negative(v).is_some());
            if salvageable {
                let corrected = row
                    .inputs()
                    .enumerate()
                    .map(|(i, v)| repair::correct_value(v, defaults.value(i)))
                    .collect();
                row.replace_inputs(corrected);
            }
            salvageable
        });
        self.renumber();
        let removed = before - self.rows.len();
        if removed > 0 {
            tracing::info!(removed, "rows with only invalid input removed by correct");
        }
        Ok(removed)
    }

    /// Input values of a row as a draft; blank values come back unset.
    pub fn copy(&self, id: RowId) -> Option<RowDraft> {
        self.get(id).map(|row| RowDraft {
            fields: row.fields().iter().map(|v| FieldInput::from_raw(v)).collect(),
            threshold: FieldInput::from_raw(row.threshold()),
        })
    }

    /// Stores a scoring result on a row. Returns `false` if the row is gone.
    pub(crate) fn record_outputs(&mut self, id: RowId, output: String, flag: Flag) -> bool {
        match self.rows.iter_mut().find(|r| r.id() == id) {
            Some(row) => {
                row.set_outputs(output, flag);
                true
            }
            None => false,
        }
    }

    fn renumber(&mut self) {
        for (idx, row) in self.rows.iter_mut().enumerate() {
            row.set_position(idx + 1);
        }
    }

    fn check_width(&self, fields: &[String]) -> Result<()> {
        if fields.len() == self.feature_count {
            Ok(())
        } else {
            Err(ScoretableError::Other(format!(
                "expected {} feature values, got {}",
                self.feature_count,
                fields.len()
            )))
        }
    }
}

fn selection(ids: &[RowId]) -> Result<HashSet<RowId>> {
    if ids.is_empty() {
        return Err(ScoretableError::NoSelection);
    }
    Ok(ids.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    fn small_schema() -> Schema {
        use crate::schema::ColumnSpec;
        Schema::new(
            vec![ColumnSpec::new("a", "A"), ColumnSpec::new("b", "B"), ColumnSpec::new("c", "C")],
            ColumnSpec::new("threshold", "Threshold"),
        )
    }

    fn store_with(rows: &[(&[&str], &str)]) -> RowStore {
        let mut store = RowStore::new(&small_schema());
        for (fields, threshold) in rows {
            store.add(strings(fields), (*threshold).to_owned()).unwrap();
        }
        store
    }

    fn positions(store: &RowStore) -> Vec<usize> {
        store.rows().iter().map(Row::position).collect()
    }

    #[test]
    fn test_add_rejects_all_blank() {
        let mut store = RowStore::new(&small_schema());
        let err = store.add(strings(&["", " ", ""]), String::new()).unwrap_err();
        assert!(matches!(err, ScoretableError::EmptyInput));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_accepts_threshold_only() {
        let mut store = RowStore::new(&small_schema());
        let row = store.add(strings(&["", "", ""]), "5".to_owned()).unwrap();
        assert_eq!(row.position(), 1);
        assert_eq!(row.fields().len(), 3);
    }

    #[test]
    fn test_add_rejects_wrong_width() {
        let mut store = RowStore::new(&small_schema());
        assert!(store.add(strings(&["1", "2"]), "5".to_owned()).is_err());
    }

    #[test]
    fn test_edit_clears_outputs_and_keeps_identity() {
        let mut store = store_with(&[(&["1", "2", "3"], "5"), (&["4", "5", "6"], "5")]);
        let id = store.id_at(2).unwrap();
        assert!(store.record_outputs(id, "4".to_owned(), Flag::Ok));

        let edited = store.edit(&[id], &strings(&["7", "8", "9"]), "10").unwrap();
        assert_eq!(edited, 1);

        let row = store.get(id).unwrap();
        assert_eq!(row.position(), 2);
        assert_eq!(row.fields(), &strings(&["7", "8", "9"])[..]);
        assert_eq!(row.threshold(), "10");
        assert_eq!(row.output(), "");
        assert_eq!(row.flag(), Flag::Unset);
    }

    #[test]
    fn test_edit_without_ids_is_selection_error() {
        let mut store = store_with(&[(&["1", "2", "3"], "5")]);
        let err = store.edit(&[], &strings(&["1", "1", "1"]), "1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Selection);
    }

    #[test]
    fn test_delete_renumbers_contiguously() {
        let mut store = store_with(&[
            (&["1", "1", "1"], "1"),
            (&["2", "2", "2"], "2"),
            (&["3", "3", "3"], "3"),
            (&["4", "4", "4"], "4"),
        ]);
        let second = store.id_at(2).unwrap();
        let fourth = store.id_at(4).unwrap();
        let kept: Vec<RowId> = vec![store.id_at(1).unwrap(), store.id_at(3).unwrap()];

        assert_eq!(store.delete(&[second, fourth]).unwrap(), 2);
        assert_eq!(positions(&store), vec![1, 2]);
        assert_eq!(store.ids(), kept);
    }

    #[test]
    fn test_delete_then_add_never_reuses_id() {
        let mut store = store_with(&[(&["1", "1", "1"], "1"), (&["2", "2", "2"], "2")]);
        let last = store.id_at(2).unwrap();
        store.delete(&[last]).unwrap();
        let added = store.add(strings(&["3", "3", "3"]), "3".to_owned()).unwrap();
        assert_ne!(added.id(), last);
        assert_eq!(positions(&store), vec![1, 2]);
    }

    #[test]
    fn test_clear_outputs_only_touches_targets() {
        let mut store = store_with(&[(&["1", "1", "1"], "1"), (&["2", "2", "2"], "2")]);
        let (first, second) = (store.id_at(1).unwrap(), store.id_at(2).unwrap());
        store.record_outputs(first, "3".to_owned(), Flag::High);
        store.record_outputs(second, "1".to_owned(), Flag::Ok);

        store.clear_outputs(&[first]).unwrap();
        assert_eq!(store.get(first).unwrap().flag(), Flag::Unset);
        assert_eq!(store.get(second).unwrap().output(), "1");
    }

    #[test]
    fn test_clean_rounds_blanks_and_deletes_empty_rows() {
        let mut store = store_with(&[
            (&["1.4", "-3", "abc"], "5.5"),
            (&["x", "-1", ""], "y"),
            (&["2", "2", "2"], "2"),
        ]);
        let untouched = store.id_at(3).unwrap();
        let targets = vec![store.id_at(1).unwrap(), store.id_at(2).unwrap()];

        assert_eq!(store.clean(&targets).unwrap(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(positions(&store), vec![1, 2]);

        let cleaned = &store.rows()[0];
        assert_eq!(cleaned.fields(), &strings(&["1", "", ""])[..]);
        assert_eq!(cleaned.threshold(), "6");
        assert_eq!(store.get(untouched).unwrap().position(), 2);
    }

    #[test]
    fn test_clean_keeps_row_with_one_valid_value() {
        let mut store = store_with(&[(&["bad", "0", "bad"], "bad")]);
        let ids = store.ids();
        assert_eq!(store.clean(&ids).unwrap(), 0);
        assert_eq!(store.rows()[0].fields(), &strings(&["", "0", ""])[..]);
    }

    #[test]
    fn test_correct_repairs_with_defaults() {
        let schema = small_schema();
        let defaults = DefaultValues::from_values(&schema, strings(&["7", "8", "9", "5"])).unwrap();
        let mut store = store_with(&[(&["2.6", "", "-4"], "oops")]);
        let ids = store.ids();

        assert_eq!(store.correct(&ids, &defaults).unwrap(), 0);
        let row = &store.rows()[0];
        assert_eq!(row.fields(), &strings(&["3", "8", "9"])[..]);
        assert_eq!(row.threshold(), "5");
    }

    #[test]
    fn test_correct_deletes_rows_without_any_valid_value() {
        let schema = small_schema();
        let defaults = DefaultValues::fallback(&schema);
        let mut store = store_with(&[(&["x", "-1", ""], "?"), (&["x", "1", "x"], "x")]);
        let ids = store.ids();
        let survivor = ids[1];

        assert_eq!(store.correct(&ids, &defaults).unwrap(), 1);
        assert_eq!(store.ids(), vec![survivor]);
        assert_eq!(store.rows()[0].position(), 1);
    }

    #[test]
    fn test_copy_returns_unset_for_blank_values() {
        let store = store_with(&[(&["1", "", "3"], "")]);
        let draft = store.copy(store.id_at(1).unwrap()).unwrap();
        assert_eq!(draft.fields[0], FieldInput::Set("1".to_owned()));
        assert_eq!(draft.fields[1], FieldInput::Unset);
        assert_eq!(draft.threshold, FieldInput::Unset);
    }

    #[test]
    fn test_ids_at_reports_unknown_positions() {
        let store = store_with(&[(&["1", "1", "1"], "1")]);
        assert!(store.ids_at(&[1]).is_ok());
        let err = store.ids_at(&[0, 2]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid or missing values in: row 0, row 2");
    }
}
