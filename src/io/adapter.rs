//! Reconciles the row store with external table files.
//!
//! Import matches file headers against schema keys by exact (trimmed,
//! case-sensitive) name; columns present on only one side are ignored or
//! reported missing, never fatal, as long as one feature column matches.
//! A file row is skipped only when all of its matched input cells, the
//! threshold included, are blank.
//! Export writes schema columns in schema order, without the display
//! position.

use super::tabular::{Table, TableFormat, write_table};
use crate::error::{Result, ScoretableError};
use crate::schema::Schema;
use crate::table::{Flag, Row, RowId, RowStore};
use crate::workbench::Confirm;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Which columns an export carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportColumns {
    /// Input columns followed by `output` and `output_flag`.
    #[default]
    Full,
    /// Features and threshold only.
    InputsOnly,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Rows skipped because every matched input column was blank.
    pub skipped_blank: usize,
    /// Schema feature keys with no matching file column.
    pub missing_features: Vec<String>,
    pub threshold_missing: bool,
    /// Output keys absent from the file; only filled when outputs were imported.
    pub missing_outputs: Vec<String>,
    /// The file had at least one output column, so the caller was asked.
    pub outputs_offered: bool,
    pub outputs_imported: bool,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        if self.imported == 0 {
            return "No valid rows were found with non-empty input fields.".to_owned();
        }
        let mut msg = format!("{} row(s) successfully imported.", self.imported);
        let mut missing_inputs = self.missing_features.clone();
        if self.threshold_missing {
            missing_inputs.push("threshold".to_owned());
        }
        if !missing_inputs.is_empty() || !self.missing_outputs.is_empty() {
            msg.push_str("\n\nSome expected columns were not found:");
            if !missing_inputs.is_empty() {
                msg.push_str(&format!("\n - Missing input columns: {}", missing_inputs.join(", ")));
            }
            if !self.missing_outputs.is_empty() {
                msg.push_str(&format!(
                    "\n - Missing output columns: {}",
                    self.missing_outputs.join(", ")
                ));
            }
        }
        msg
    }
}

/// Appends the rows of `table` to `store`.
///
/// When the file has output columns, `confirm` decides whether they are
/// imported too. Nothing is added to the store unless the whole table was
/// read successfully.
///
/// # Errors
///
/// `NoInputColumns` if no schema feature column is present in the file.
pub fn import_table(
    table: &Table,
    schema: &Schema,
    store: &mut RowStore,
    confirm: &mut dyn Confirm,
) -> Result<ImportSummary> {
    let columns: HashMap<&str, usize> = table
        .headers
        .iter()
        .enumerate()
        .rev() // first occurrence wins
        .map(|(i, h)| (h.trim(), i))
        .collect();

    let feature_cols: Vec<Option<usize>> = schema
        .features()
        .iter()
        .map(|c| columns.get(c.key.as_str()).copied())
        .collect();
    if feature_cols.iter().all(Option::is_none) {
        return Err(ScoretableError::NoInputColumns);
    }
    let threshold_col = columns.get(schema.threshold().key.as_str()).copied();

    let [output_key, flag_key] = schema.output_keys();
    let output_col = columns.get(output_key).copied();
    let flag_col = columns.get(flag_key).copied();

    let mut summary = ImportSummary {
        missing_features: schema
            .features()
            .iter()
            .zip(&feature_cols)
            .filter(|(_, col)| col.is_none())
            .map(|(c, _)| c.key.clone())
            .collect(),
        threshold_missing: threshold_col.is_none(),
        outputs_offered: output_col.is_some() || flag_col.is_some(),
        ..ImportSummary::default()
    };

    if summary.outputs_offered {
        summary.outputs_imported = confirm.confirm(
            "Import outputs?",
            "Output columns found in the file. Import them?",
        );
    }
    if summary.outputs_imported {
        summary.missing_outputs = [(output_key, output_col), (flag_key, flag_col)]
            .iter()
            .filter(|(_, col)| col.is_none())
            .map(|(key, _)| (*key).to_owned())
            .collect();
    }

    let text = |row: usize, col: Option<usize>| -> String {
        col.map(|c| table.cell(row, c).trim().to_owned())
            .unwrap_or_default()
    };

    let mut pending = Vec::new();
    for ri in 0..table.height() {
        let fields: Vec<String> = feature_cols.iter().map(|col| text(ri, *col)).collect();
        let threshold = text(ri, threshold_col);
        if threshold.is_empty() && fields.iter().all(String::is_empty) {
            summary.skipped_blank += 1;
            continue;
        }

        let (output, flag) = if summary.outputs_imported {
            imported_outputs(text(ri, output_col), &text(ri, flag_col), ri)
        } else {
            (String::new(), Flag::Unset)
        };
        pending.push((fields, threshold, output, flag));
    }

    for (fields, threshold, output, flag) in pending {
        store.push_imported(fields, threshold, output, flag)?;
        summary.imported += 1;
    }

    tracing::info!(
        imported = summary.imported,
        skipped = summary.skipped_blank,
        missing = summary.missing_features.len(),
        "table imported"
    );
    Ok(summary)
}

// Output and flag are kept as a pair. An unreadable flag, or an OK/HIGH
// verdict without a prediction, drops both; ERR may stand alone.
fn imported_outputs(output: String, flag: &str, row: usize) -> (String, Flag) {
    match flag.parse::<Flag>() {
        Ok(Flag::Unset) if !output.is_empty() => {
            tracing::warn!(row = row + 1, "imported output has no flag, clearing it");
            (String::new(), Flag::Unset)
        }
        Ok(Flag::Ok | Flag::High) if output.is_empty() => {
            tracing::warn!(row = row + 1, "imported flag has no output, clearing it");
            (String::new(), Flag::Unset)
        }
        Ok(flag) => (output, flag),
        Err(e) => {
            tracing::warn!(row = row + 1, "{e}, clearing imported outputs");
            (String::new(), Flag::Unset)
        }
    }
}

/// Builds the export table for `rows`, in the order given.
pub fn rows_to_table<'a>(
    schema: &Schema,
    rows: impl IntoIterator<Item = &'a Row>,
    columns: ExportColumns,
) -> Table {
    let headers = match columns {
        ExportColumns::Full => schema.all_keys(),
        ExportColumns::InputsOnly => schema.input_keys(),
    };
    let mut table = Table::new(headers.into_iter().map(str::to_owned).collect());

    for row in rows {
        let mut values: Vec<String> = row.inputs().map(str::to_owned).collect();
        if columns == ExportColumns::Full {
            values.push(row.output().to_owned());
            values.push(row.flag().as_str().to_owned());
        }
        table.push_row(values);
    }
    table
}

/// Writes all rows, or the rows named by `ids`, to `path`.
///
/// Selected rows are written in store order. Returns the number of rows
/// written.
///
/// # Errors
///
/// `UnsupportedFormat` for unknown extensions (checked before anything is
/// written), `NoSelection` when there is nothing to export.
pub fn export_rows(
    path: &Path,
    schema: &Schema,
    store: &RowStore,
    ids: Option<&[RowId]>,
    columns: ExportColumns,
) -> Result<usize> {
    TableFormat::from_path(path)?;

    let rows: Vec<&Row> = match ids {
        None => store.rows().iter().collect(),
        Some(ids) => {
            let wanted: HashSet<RowId> = ids.iter().copied().collect();
            store
                .rows()
                .iter()
                .filter(|r| wanted.contains(&r.id()))
                .collect()
        }
    };
    if rows.is_empty() {
        return Err(ScoretableError::NoSelection);
    }

    let table = rows_to_table(schema, rows.iter().copied(), columns);
    write_table(path, &table)?;
    tracing::info!(path = %path.display(), rows = table.height(), "rows exported");
    Ok(table.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbench::FixedAnswer;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|h| (*h).to_owned()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|v| (*v).to_owned()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_partial_columns_import() -> Result<()> {
        let schema = Schema::standard();
        let mut store = RowStore::new(&schema);
        let file = table(&["a", " c ", "f"], &[&["1", "2", "3"], &["4", "5", "6"]]);
        let mut asked = false;
        let mut confirm = |_: &str, _: &str| {
            asked = true;
            true
        };

        let summary = import_table(&file, &schema, &mut store, &mut confirm)?;
        assert!(!asked);
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.missing_features.len(), 9);
        assert!(summary.threshold_missing);
        assert!(!summary.outputs_offered);

        let row = &store.rows()[1];
        assert_eq!(row.fields()[0], "4");
        assert_eq!(row.fields()[1], "");
        assert_eq!(row.fields()[2], "5");
        assert_eq!(row.fields()[5], "6");
        assert_eq!(row.output(), "");
        assert_eq!(row.position(), 2);
        Ok(())
    }

    #[test]
    fn test_no_matching_feature_column_fails() {
        let schema = Schema::standard();
        let mut store = RowStore::new(&schema);
        let file = table(&["A", "threshold", "output"], &[&["1", "5", "3"]]);
        let err = import_table(&file, &schema, &mut store, &mut FixedAnswer(true)).unwrap_err();
        assert!(matches!(err, ScoretableError::NoInputColumns));
        assert!(store.is_empty());
    }

    #[test]
    fn test_blank_rows_are_skipped() -> Result<()> {
        let schema = Schema::standard();
        let mut store = RowStore::new(&schema);
        let file = table(
            &["a", "b", "threshold"],
            &[&["", " ", ""], &["1", "", ""], &["", "", "5"]],
        );
        let summary = import_table(&file, &schema, &mut store, &mut FixedAnswer(true))?;
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.skipped_blank, 1);
        assert_eq!(store.rows()[1].threshold(), "5");
        assert!(store.rows()[1].fields().iter().all(String::is_empty));
        Ok(())
    }

    #[test]
    fn test_outputs_imported_only_when_confirmed() -> Result<()> {
        let schema = Schema::standard();
        let file = table(
            &["a", "output", "output_flag"],
            &[&["1", "4", "OK"], &["2", "9", "bogus"]],
        );

        let mut declined = RowStore::new(&schema);
        let summary = import_table(&file, &schema, &mut declined, &mut FixedAnswer(false))?;
        assert!(summary.outputs_offered);
        assert!(!summary.outputs_imported);
        assert!(summary.missing_outputs.is_empty());
        assert_eq!(declined.rows()[0].output(), "");

        let mut accepted = RowStore::new(&schema);
        let summary = import_table(&file, &schema, &mut accepted, &mut FixedAnswer(true))?;
        assert!(summary.outputs_imported);
        assert_eq!(accepted.rows()[0].output(), "4");
        assert_eq!(accepted.rows()[0].flag(), Flag::Ok);
        assert_eq!(accepted.rows()[1].output(), "");
        assert_eq!(accepted.rows()[1].flag(), Flag::Unset);
        Ok(())
    }

    #[test]
    fn test_verdict_without_output_is_dropped() -> Result<()> {
        let schema = Schema::standard();
        let mut store = RowStore::new(&schema);
        let file = table(
            &["a", "output", "output_flag"],
            &[&["1", "", "OK"], &["2", "", "HIGH"], &["3", "", "ERR"], &["4", "6", "HIGH"]],
        );
        import_table(&file, &schema, &mut store, &mut FixedAnswer(true))?;

        let pairs: Vec<(&str, Flag)> = store.rows().iter().map(|r| (r.output(), r.flag())).collect();
        assert_eq!(
            pairs,
            vec![("", Flag::Unset), ("", Flag::Unset), ("", Flag::Err), ("6", Flag::High)]
        );
        Ok(())
    }

    #[test]
    fn test_missing_outputs_reported_after_import() -> Result<()> {
        let schema = Schema::standard();
        let mut store = RowStore::new(&schema);
        let file = table(&["a", "output_flag"], &[&["1", "ERR"]]);
        let summary = import_table(&file, &schema, &mut store, &mut FixedAnswer(true))?;
        assert_eq!(summary.missing_outputs, vec!["output".to_owned()]);
        assert_eq!(store.rows()[0].flag(), Flag::Err);
        assert!(summary.message().contains("Missing output columns: output"));
        Ok(())
    }

    #[test]
    fn test_rows_to_table_drops_position() -> Result<()> {
        let schema = Schema::standard();
        let mut store = RowStore::new(&schema);
        store.add(vec!["1".to_owned(); 12], "5".to_owned())?;

        let full = rows_to_table(&schema, store.rows(), ExportColumns::Full);
        assert_eq!(full.headers.len(), 15);
        assert_eq!(full.headers[0], "a");
        assert_eq!(full.rows[0][12], "5");

        let inputs = rows_to_table(&schema, store.rows(), ExportColumns::InputsOnly);
        assert_eq!(inputs.headers.last().map(String::as_str), Some("threshold"));
        Ok(())
    }

    #[test]
    fn test_export_rejects_unknown_extension_and_empty_selection() {
        let schema = Schema::standard();
        let store = RowStore::new(&schema);
        let dir = tempfile::tempdir().unwrap();

        let err = export_rows(&dir.path().join("x.txt"), &schema, &store, None, ExportColumns::Full)
            .unwrap_err();
        assert!(matches!(err, ScoretableError::UnsupportedFormat(_)));

        let err = export_rows(&dir.path().join("x.csv"), &schema, &store, None, ExportColumns::Full)
            .unwrap_err();
        assert!(matches!(err, ScoretableError::NoSelection));
    }
}
