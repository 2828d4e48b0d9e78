//! The data-entry session: one row store, the active defaults and the
//! scoring resources, driven by a presentation layer through typed
//! operations or [`Command`]s.
//!
//! ```
//! use scoretable::inference::{ModelArtifact, ModelCache, NormParams, Scorer};
//! use scoretable::schema::Schema;
//! use scoretable::table::{Flag, RowDraft};
//! use scoretable::workbench::Workbench;
//!
//! let schema = Schema::standard();
//! let model = ModelArtifact::LinearRegression { intercept: 4.0, coefficients: vec![0.0; 12] };
//! let scorer = Scorer::with_resources(
//!     NormParams::from_bounds(&[(0.0, 1.0); 12])?,
//!     ModelCache::preloaded(model.into_predictor()?),
//! );
//! let mut bench = Workbench::new(schema.clone(), scorer);
//!
//! // An all-unset draft takes every value from the defaults.
//! let row = bench.add(&RowDraft::unset(&schema))?;
//! let report = bench.calculate(&[row.id()])?;
//! assert_eq!(report.scored, 1);
//! assert_eq!(bench.store().rows()[0].flag(), Flag::Ok);
//! # Ok::<(), scoretable::error::ScoretableError>(())
//! ```

pub mod command;
pub mod confirm;

pub use command::{Command, Outcome};
pub use confirm::{Confirm, FixedAnswer};

use crate::config::AppSettings;
use crate::defaults::{DefaultValues, DefaultsCandidate, DefaultsManager};
use crate::error::{Result, ResultExt as _, ScoretableError};
use crate::inference::Scorer;
use crate::io::{ExportColumns, ImportSummary, Table, export_rows, import_table, read_table, rows_to_table, write_table};
use crate::schema::Schema;
use crate::table::{Row, RowDraft, RowId, RowStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Rows the example file repeats the defaults on.
const EXAMPLE_ROWS: usize = 3;

/// A row that ended a calculation without an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub position: usize,
    /// Labels of the unusable features, or a `ModelError: ...` entry.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationReport {
    pub scored: usize,
    pub failures: Vec<RowFailure>,
}

impl CalculationReport {
    pub fn message(&self) -> String {
        if self.failures.is_empty() {
            return format!("Outputs calculated for {} row(s).", self.scored);
        }
        let mut msg = format!(
            "Calculation could not be performed for {} row(s).\n\nPlease correct the inputs manually or use the 'Correct' function.\n",
            self.failures.len()
        );
        for failure in &self.failures {
            msg.push_str(&format!(
                "\nRow {}: missing or invalid → {}",
                failure.position,
                failure.missing.join(", ")
            ));
        }
        msg
    }
}

/// What a defaults update did besides replacing the active set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultsUpdate {
    pub values: Vec<String>,
    pub warnings: Vec<String>,
    pub saved_to: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Workbench {
    schema: Schema,
    store: RowStore,
    defaults: DefaultsManager,
    scorer: Scorer,
}

impl Workbench {
    pub fn new(schema: Schema, scorer: Scorer) -> Self {
        Self {
            store: RowStore::new(&schema),
            defaults: DefaultsManager::new(&schema),
            schema,
            scorer,
        }
    }

    /// Builds a session from settings, picking up persisted defaults when the
    /// configured file exists.
    ///
    /// # Errors
    ///
    /// Fails if the persisted defaults file exists but cannot be read.
    pub fn from_settings(settings: &AppSettings) -> Result<Self> {
        let scorer = Scorer::new(&settings.norm_params_path, &settings.model_path);
        let mut bench = Self::new(settings.schema.clone(), scorer);

        if let Some(path) = settings.defaults_path.as_deref()
            && path.exists()
        {
            let table = read_table(path).context("Failed to load saved default values")?;
            let candidate = DefaultsCandidate::from_table(&bench.schema, &table)?;
            if !candidate.is_clean() {
                tracing::warn!(invalid = ?candidate.invalid(), "saved defaults have invalid columns, blanking them");
            }
            bench.defaults.apply(candidate, &mut FixedAnswer(true))?;
        }
        Ok(bench)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn defaults(&self) -> &DefaultValues {
        self.defaults.active()
    }

    /// Drops the cached model and normalization bounds; the next
    /// calculation reads the configured files again.
    pub fn reload_resources(&mut self) {
        self.scorer.reload();
        tracing::info!("scoring resources will be reloaded");
    }

    /// # Errors
    ///
    /// `EmptyInput` if every input is blank after defaults are applied.
    pub fn add(&mut self, draft: &RowDraft) -> Result<Row> {
        let (fields, threshold) = draft.resolve(self.defaults.active());
        self.store.add(fields, threshold)
    }

    /// # Errors
    ///
    /// `NoSelection` if the row does not exist.
    pub fn copy(&self, id: RowId) -> Result<RowDraft> {
        self.store.copy(id).ok_or(ScoretableError::NoSelection)
    }

    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty.
    pub fn edit(&mut self, ids: &[RowId], draft: &RowDraft) -> Result<usize> {
        let (fields, threshold) = draft.resolve(self.defaults.active());
        self.store.edit(ids, &fields, &threshold)
    }

    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty.
    pub fn delete(&mut self, ids: &[RowId]) -> Result<usize> {
        self.store.delete(ids)
    }

    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty.
    pub fn clear_outputs(&mut self, ids: &[RowId]) -> Result<usize> {
        self.store.clear_outputs(ids)
    }

    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty.
    pub fn clean(&mut self, ids: &[RowId]) -> Result<usize> {
        self.store.clean(ids)
    }

    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty.
    pub fn correct(&mut self, ids: &[RowId]) -> Result<usize> {
        self.store.correct(ids, self.defaults.active())
    }

    /// Scores the given rows and stores the outputs on them.
    ///
    /// Each row is scored independently; rows left without an output are
    /// listed in the report.
    ///
    /// # Errors
    ///
    /// `NoSelection` if `ids` is empty. `Resource` or `Configuration` if the
    /// normalization bounds cannot be loaded, in which case no row changes.
    pub fn calculate(&mut self, ids: &[RowId]) -> Result<CalculationReport> {
        if ids.is_empty() {
            return Err(ScoretableError::NoSelection);
        }
        let wanted: HashSet<RowId> = ids.iter().copied().collect();
        let targets: Vec<(RowId, usize, Vec<String>, String)> = self
            .store
            .rows()
            .iter()
            .filter(|r| wanted.contains(&r.id()))
            .map(|r| (r.id(), r.position(), r.fields().to_vec(), r.threshold().to_owned()))
            .collect();

        let outcomes = self.scorer.score_batch(
            &self.schema,
            targets.iter().map(|(_, _, fields, threshold)| (fields, threshold.as_str())),
        )?;

        let threshold_label = self.schema.threshold().label.as_str();
        let mut report = CalculationReport::default();
        for ((id, position, _, _), outcome) in targets.into_iter().zip(outcomes) {
            if outcome.is_scored() {
                report.scored += 1;
            } else {
                report.failures.push(RowFailure {
                    position,
                    missing: outcome
                        .missing
                        .iter()
                        .filter(|m| m.as_str() != threshold_label)
                        .cloned()
                        .collect(),
                });
            }
            self.store.record_outputs(id, outcome.output, outcome.flag);
        }

        tracing::info!(
            scored = report.scored,
            failed = report.failures.len(),
            "rows calculated"
        );
        Ok(report)
    }

    /// Replaces the defaults with typed values, optionally saving them.
    ///
    /// # Errors
    ///
    /// `Aborted` if invalid values were found and the caller declined to
    /// blank them.
    pub fn set_defaults_from_input<S: AsRef<str>>(
        &mut self,
        inputs: &[S],
        save_to: Option<&Path>,
        confirm: &mut dyn Confirm,
    ) -> Result<DefaultsUpdate> {
        let candidate = DefaultsCandidate::from_inputs(&self.schema, inputs);
        self.apply_defaults(candidate, save_to, confirm)
    }

    /// Replaces the defaults with the first row of a table file.
    ///
    /// # Errors
    ///
    /// `Resource` if the file cannot be read or is empty, `Aborted` as for
    /// [`Self::set_defaults_from_input`].
    pub fn set_defaults_from_file(
        &mut self,
        path: &Path,
        save_to: Option<&Path>,
        confirm: &mut dyn Confirm,
    ) -> Result<DefaultsUpdate> {
        let table = read_table(path)?;
        let candidate = DefaultsCandidate::from_table(&self.schema, &table)?;
        self.apply_defaults(candidate, save_to, confirm)
    }

    // A failed save does not undo the update; it is reported as a warning.
    fn apply_defaults(
        &mut self,
        candidate: DefaultsCandidate,
        save_to: Option<&Path>,
        confirm: &mut dyn Confirm,
    ) -> Result<DefaultsUpdate> {
        let mut warnings = candidate.warnings().to_vec();
        let values = self.defaults.apply(candidate, confirm)?.values().to_vec();

        let mut saved_to = None;
        if let Some(path) = save_to {
            match write_table(path, &self.defaults.active().to_table(&self.schema)) {
                Ok(()) => saved_to = Some(path.to_path_buf()),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to save default values");
                    warnings.push(format!("Failed to save default values: {e}"));
                }
            }
        }
        Ok(DefaultsUpdate {
            values,
            warnings,
            saved_to,
        })
    }

    /// # Errors
    ///
    /// `UnsupportedFormat`, read failures, or `NoInputColumns`. The store is
    /// unchanged on error.
    pub fn import_file(&mut self, path: &Path, confirm: &mut dyn Confirm) -> Result<ImportSummary> {
        let table = read_table(path)?;
        import_table(&table, &self.schema, &mut self.store, confirm)
    }

    /// Writes all rows (`ids == None`) or the selected ones.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat`, `NoSelection` or write failures.
    pub fn export(
        &self,
        path: &Path,
        ids: Option<&[RowId]>,
        columns: ExportColumns,
    ) -> Result<usize> {
        export_rows(path, &self.schema, &self.store, ids, columns)
    }

    /// Writes a template file: the input columns, with the active defaults
    /// repeated on a few rows.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` or write failures.
    pub fn export_example(&self, path: &Path) -> Result<()> {
        let mut table = Table::new(self.schema.input_keys().into_iter().map(str::to_owned).collect());
        for _ in 0..EXAMPLE_ROWS {
            table.push_row(self.defaults.active().values().to_vec());
        }
        write_table(path, &table)?;
        tracing::info!(path = %path.display(), "example file written");
        Ok(())
    }

    /// Persists the whole table, outputs included. An empty table is written
    /// as headers only.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` or write failures.
    pub fn save_table(&self, path: &Path) -> Result<()> {
        let table = rows_to_table(&self.schema, self.store.rows(), ExportColumns::Full);
        write_table(path, &table)
    }

    /// Replaces the table with the contents of a file written by
    /// [`Self::save_table`]. Returns the number of rows loaded.
    ///
    /// # Errors
    ///
    /// Read failures or `NoInputColumns`; the current table is kept on error.
    pub fn load_table(&mut self, path: &Path) -> Result<usize> {
        let table = read_table(path)?;
        let mut store = RowStore::new(&self.schema);
        let summary = import_table(&table, &self.schema, &mut store, &mut FixedAnswer(true))?;
        self.store = store;
        Ok(summary.imported)
    }
}
