//! Presentation-layer commands and their outcomes.
//!
//! Every button or menu entry of a front end maps onto one [`Command`];
//! [`Workbench::execute`] runs it and returns an [`Outcome`] whose
//! [`Outcome::message`] is ready to show to the user.

use super::{CalculationReport, Confirm, DefaultsUpdate, Workbench};
use crate::error::Result;
use crate::io::{ExportColumns, ImportSummary};
use crate::table::{Row, RowDraft, RowId};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Command {
    Add(RowDraft),
    Copy(RowId),
    Edit { ids: Vec<RowId>, draft: RowDraft },
    Delete(Vec<RowId>),
    ClearOutputs(Vec<RowId>),
    Clean(Vec<RowId>),
    Correct(Vec<RowId>),
    Calculate(Vec<RowId>),
    SetDefaultsFromInput {
        inputs: Vec<String>,
        save_to: Option<PathBuf>,
    },
    SetDefaultsFromFile {
        path: PathBuf,
        save_to: Option<PathBuf>,
    },
    Import(PathBuf),
    ExportAll {
        path: PathBuf,
        columns: ExportColumns,
    },
    ExportSelected {
        path: PathBuf,
        ids: Vec<RowId>,
        columns: ExportColumns,
    },
    ExportExample(PathBuf),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Copy(_) => "copy",
            Self::Edit { .. } => "edit",
            Self::Delete(_) => "delete",
            Self::ClearOutputs(_) => "clear_outputs",
            Self::Clean(_) => "clean",
            Self::Correct(_) => "correct",
            Self::Calculate(_) => "calculate",
            Self::SetDefaultsFromInput { .. } => "set_defaults_from_input",
            Self::SetDefaultsFromFile { .. } => "set_defaults_from_file",
            Self::Import(_) => "import",
            Self::ExportAll { .. } => "export_all",
            Self::ExportSelected { .. } => "export_selected",
            Self::ExportExample(_) => "export_example",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Added(Row),
    Copied(RowDraft),
    Edited(usize),
    Deleted(usize),
    OutputsCleared(usize),
    Cleaned { removed: usize },
    Corrected { removed: usize },
    Calculated(CalculationReport),
    DefaultsApplied(DefaultsUpdate),
    Imported(ImportSummary),
    Exported { path: PathBuf, rows: usize },
    ExampleWritten(PathBuf),
}

impl Outcome {
    pub fn message(&self) -> String {
        match self {
            Self::Added(row) => format!("Row {} added.", row.position()),
            Self::Copied(_) => "Row values copied to the input fields.".to_owned(),
            Self::Edited(n) => format!("{n} row(s) updated."),
            Self::Deleted(n) => format!("{n} row(s) deleted."),
            Self::OutputsCleared(n) => format!("Outputs cleared for {n} row(s)."),
            Self::Cleaned { removed: 0 } => "Clean complete.".to_owned(),
            Self::Cleaned { removed } => format!(
                "{removed} row(s) were removed because they had no valid input values after cleaning."
            ),
            Self::Corrected { removed: 0 } => "Correction complete.".to_owned(),
            Self::Corrected { removed } => format!(
                "{removed} row(s) were removed because they contained only invalid input values."
            ),
            Self::Calculated(report) => report.message(),
            Self::DefaultsApplied(update) => {
                let mut msg = "Default values updated.".to_owned();
                for warning in &update.warnings {
                    msg.push_str(&format!("\n{warning}"));
                }
                if let Some(path) = &update.saved_to {
                    msg.push_str(&format!("\nDefault values were saved to:\n{}", path.display()));
                }
                msg
            }
            Self::Imported(summary) => summary.message(),
            Self::Exported { path, rows } => {
                format!("{rows} row(s) exported to:\n{}", path.display())
            }
            Self::ExampleWritten(path) => format!("File saved as:\n{}", path.display()),
        }
    }
}

impl Workbench {
    /// Runs one command against the session.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation fails with; the session is left as
    /// it was before the command.
    pub fn execute(&mut self, command: Command, confirm: &mut dyn Confirm) -> Result<Outcome> {
        let name = command.name();
        let outcome = match command {
            Command::Add(draft) => Outcome::Added(self.add(&draft)?),
            Command::Copy(id) => Outcome::Copied(self.copy(id)?),
            Command::Edit { ids, draft } => Outcome::Edited(self.edit(&ids, &draft)?),
            Command::Delete(ids) => Outcome::Deleted(self.delete(&ids)?),
            Command::ClearOutputs(ids) => Outcome::OutputsCleared(self.clear_outputs(&ids)?),
            Command::Clean(ids) => Outcome::Cleaned {
                removed: self.clean(&ids)?,
            },
            Command::Correct(ids) => Outcome::Corrected {
                removed: self.correct(&ids)?,
            },
            Command::Calculate(ids) => Outcome::Calculated(self.calculate(&ids)?),
            Command::SetDefaultsFromInput { inputs, save_to } => Outcome::DefaultsApplied(
                self.set_defaults_from_input(&inputs, save_to.as_deref(), confirm)?,
            ),
            Command::SetDefaultsFromFile { path, save_to } => Outcome::DefaultsApplied(
                self.set_defaults_from_file(&path, save_to.as_deref(), confirm)?,
            ),
            Command::Import(path) => Outcome::Imported(self.import_file(&path, confirm)?),
            Command::ExportAll { path, columns } => {
                let rows = self.export(&path, None, columns)?;
                Outcome::Exported { path, rows }
            }
            Command::ExportSelected { path, ids, columns } => {
                let rows = self.export(&path, Some(&ids), columns)?;
                Outcome::Exported { path, rows }
            }
            Command::ExportExample(path) => {
                self.export_example(&path)?;
                Outcome::ExampleWritten(path)
            }
        };
        tracing::info!(command = name, rows = self.store().len(), "command completed");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoretableError;
    use crate::inference::{ModelArtifact, ModelCache, NormParams, Scorer};
    use crate::schema::Schema;
    use crate::workbench::FixedAnswer;

    fn bench() -> Workbench {
        let model = ModelArtifact::LinearRegression {
            intercept: 6.0,
            coefficients: vec![0.0; 12],
        };
        Workbench::new(
            Schema::standard(),
            Scorer::with_resources(
                NormParams::from_bounds(&[(0.0, 1.0); 12]).unwrap(),
                ModelCache::preloaded(model.into_predictor().unwrap()),
            ),
        )
    }

    #[test]
    fn test_command_sequence() -> Result<()> {
        let mut bench = bench();
        let mut yes = FixedAnswer(true);
        let schema = bench.schema().clone();

        let Outcome::Added(first) = bench.execute(Command::Add(RowDraft::unset(&schema)), &mut yes)?
        else {
            panic!("expected a row");
        };
        let second = bench.add(&RowDraft::from_inputs(&schema, &["bad"]))?;

        let outcome = bench.execute(Command::Calculate(vec![first.id()]), &mut yes)?;
        assert_eq!(outcome.message(), "Outputs calculated for 1 row(s).");

        let outcome = bench.execute(Command::Clean(vec![second.id()]), &mut yes)?;
        assert!(matches!(outcome, Outcome::Cleaned { removed: 0 }));
        assert_eq!(bench.store().rows()[1].fields()[0], "");

        let outcome = bench.execute(Command::Delete(vec![first.id()]), &mut yes)?;
        assert_eq!(outcome.message(), "1 row(s) deleted.");
        assert_eq!(bench.store().rows()[0].position(), 1);
        Ok(())
    }

    #[test]
    fn test_copy_returns_row_inputs() -> Result<()> {
        let mut bench = bench();
        let schema = bench.schema().clone();
        let row = bench.add(&RowDraft::from_inputs(&schema, &["3"]))?;
        let Outcome::Copied(draft) = bench.execute(Command::Copy(row.id()), &mut FixedAnswer(true))?
        else {
            panic!("expected a draft");
        };
        assert_eq!(draft.fields[0], crate::table::FieldInput::Set("3".to_owned()));
        Ok(())
    }

    #[test]
    fn test_selection_errors_surface() {
        let mut bench = bench();
        let err = bench
            .execute(Command::Correct(Vec::new()), &mut FixedAnswer(true))
            .unwrap_err();
        assert!(matches!(err, ScoretableError::NoSelection));
        assert_eq!(err.to_string(), "No rows selected");
    }

    #[test]
    fn test_removal_messages() {
        assert_eq!(
            Outcome::Corrected { removed: 2 }.message(),
            "2 row(s) were removed because they contained only invalid input values."
        );
        assert_eq!(Outcome::Cleaned { removed: 0 }.message(), "Clean complete.");
    }

    #[test]
    fn test_defaults_message_lists_warnings_then_save_path() {
        let outcome = Outcome::DefaultsApplied(DefaultsUpdate {
            values: Vec::new(),
            warnings: vec!["The file contains multiple rows: only the first one was used.".to_owned()],
            saved_to: Some(PathBuf::from("defaults.csv")),
        });
        assert_eq!(
            outcome.message(),
            "Default values updated.\nThe file contains multiple rows: only the first one was used.\nDefault values were saved to:\ndefaults.csv"
        );
    }
}
