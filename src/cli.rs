use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use scoretable::config::AppSettings;
use scoretable::io::ExportColumns;
use scoretable::table::{FieldInput, RowDraft, RowId};
use scoretable::workbench::{Command, FixedAnswer, Outcome, Workbench};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "scoretable",
    about = "Enter, repair and score rows of feature data"
)]
pub struct Cli {
    /// Settings file. Defaults to the platform config directory.
    #[arg(long, global = true, env = "SCORETABLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Answer yes to every confirmation (import outputs, blank invalid defaults)
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Working table file, loaded before the command and written back after it.
#[derive(Args)]
pub struct TableArgs {
    /// CSV or XLSX file holding the table. Created if missing.
    #[arg(short, long)]
    table: PathBuf,
}

#[derive(Args)]
pub struct Selection {
    /// 1-based row positions, comma separated
    #[arg(short, long, value_delimiter = ',', conflicts_with = "all")]
    rows: Vec<usize>,

    /// Every row in the table
    #[arg(long)]
    all: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Append a row. Missing or blank values take the current defaults.
    Add {
        #[command(flatten)]
        table: TableArgs,

        /// Features then threshold, comma separated (e.g. `3,,1`)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        values: Vec<String>,
    },
    /// Print a row's inputs in the form `add --values` accepts
    Copy {
        #[command(flatten)]
        table: TableArgs,

        /// 1-based row position
        #[arg(short, long)]
        row: usize,
    },
    /// Overwrite the inputs of rows and clear their outputs
    Edit {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        selection: Selection,

        /// Features then threshold, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        values: Vec<String>,
    },
    /// Delete rows
    Delete {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        selection: Selection,
    },
    /// Blank the output columns of rows
    ClearOutputs {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        selection: Selection,
    },
    /// Round valid inputs, blank invalid ones, drop rows left empty
    Clean {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        selection: Selection,
    },
    /// Round valid inputs, replace invalid ones with defaults
    Correct {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        selection: Selection,
    },
    /// Score rows with the configured model
    Calculate {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        selection: Selection,
    },
    /// Replace the default values
    SetDefaults {
        /// Features then threshold, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with = "file")]
        values: Option<Vec<String>>,

        /// Read the first row of a CSV or XLSX file
        #[arg(long, required_unless_present = "values")]
        file: Option<PathBuf>,

        /// Where to save the new defaults. Defaults to the configured defaults file.
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Append rows from a CSV or XLSX file
    Import {
        #[command(flatten)]
        table: TableArgs,

        /// File to import
        file: PathBuf,
    },
    /// Write rows to a CSV or XLSX file
    Export {
        #[command(flatten)]
        table: TableArgs,

        /// Only these rows; all rows when omitted
        #[arg(short, long, value_delimiter = ',')]
        rows: Vec<usize>,

        /// Leave out the output columns
        #[arg(long)]
        inputs_only: bool,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write a template file filled with the current defaults
    Example {
        /// Output file (`.csv` or `.xlsx`)
        output: PathBuf,
    },
}

pub fn run_command(cli: Cli, settings: &AppSettings) -> Result<()> {
    let mut bench = Workbench::from_settings(settings).context("Failed to start session")?;
    let mut confirm = FixedAnswer(cli.yes);

    let (command, table) = match cli.command {
        Commands::Add { table, values } => {
            load_table(&mut bench, &table.table)?;
            let draft = RowDraft::from_inputs(bench.schema(), &values);
            (Command::Add(draft), Some(table.table))
        }
        Commands::Copy { table, row } => {
            load_table(&mut bench, &table.table)?;
            let id = resolve_rows(&bench, &[row], false)?
                .into_iter()
                .next()
                .context("No row selected")?;
            (Command::Copy(id), None)
        }
        Commands::Edit {
            table,
            selection,
            values,
        } => {
            load_table(&mut bench, &table.table)?;
            let ids = selection.resolve(&bench)?;
            let draft = RowDraft::from_inputs(bench.schema(), &values);
            (Command::Edit { ids, draft }, Some(table.table))
        }
        Commands::Delete { table, selection } => {
            load_table(&mut bench, &table.table)?;
            (Command::Delete(selection.resolve(&bench)?), Some(table.table))
        }
        Commands::ClearOutputs { table, selection } => {
            load_table(&mut bench, &table.table)?;
            (Command::ClearOutputs(selection.resolve(&bench)?), Some(table.table))
        }
        Commands::Clean { table, selection } => {
            load_table(&mut bench, &table.table)?;
            (Command::Clean(selection.resolve(&bench)?), Some(table.table))
        }
        Commands::Correct { table, selection } => {
            load_table(&mut bench, &table.table)?;
            (Command::Correct(selection.resolve(&bench)?), Some(table.table))
        }
        Commands::Calculate { table, selection } => {
            load_table(&mut bench, &table.table)?;
            (Command::Calculate(selection.resolve(&bench)?), Some(table.table))
        }
        Commands::SetDefaults { values, file, save } => {
            let save_to = save.or_else(|| settings.defaults_path.clone());
            let command = match (values, file) {
                (Some(inputs), _) => Command::SetDefaultsFromInput { inputs, save_to },
                (None, Some(path)) => Command::SetDefaultsFromFile { path, save_to },
                (None, None) => anyhow::bail!("Either --values or --file is required"),
            };
            (command, None)
        }
        Commands::Import { table, file } => {
            load_table(&mut bench, &table.table)?;
            (Command::Import(file), Some(table.table))
        }
        Commands::Export {
            table,
            rows,
            inputs_only,
            output,
        } => {
            load_table(&mut bench, &table.table)?;
            let columns = if inputs_only {
                ExportColumns::InputsOnly
            } else {
                ExportColumns::Full
            };
            let command = if rows.is_empty() {
                Command::ExportAll {
                    path: output,
                    columns,
                }
            } else {
                Command::ExportSelected {
                    path: output,
                    ids: resolve_rows(&bench, &rows, false)?,
                    columns,
                }
            };
            (command, None)
        }
        Commands::Example { output } => (Command::ExportExample(output), None),
    };

    let outcome = bench.execute(command, &mut confirm)?;
    if let Some(path) = table {
        bench
            .save_table(&path)
            .with_context(|| format!("Failed to save table {}", path.display()))?;
    }

    match &outcome {
        Outcome::Copied(draft) => println!("{}", draft_values(draft)),
        other => println!("{}", other.message()),
    }
    Ok(())
}

impl Selection {
    fn resolve(&self, bench: &Workbench) -> Result<Vec<RowId>> {
        resolve_rows(bench, &self.rows, self.all)
    }
}

fn resolve_rows(bench: &Workbench, positions: &[usize], all: bool) -> Result<Vec<RowId>> {
    if all {
        return Ok(bench.store().ids());
    }
    Ok(bench.store().ids_at(positions)?)
}

fn load_table(bench: &mut Workbench, path: &Path) -> Result<()> {
    if path.exists() {
        let rows = bench
            .load_table(path)
            .with_context(|| format!("Failed to load table {}", path.display()))?;
        tracing::debug!(rows, path = %path.display(), "working table loaded");
    }
    Ok(())
}

fn draft_values(draft: &RowDraft) -> String {
    draft
        .fields
        .iter()
        .chain(std::iter::once(&draft.threshold))
        .map(|input| match input {
            FieldInput::Set(value) => value.as_str(),
            FieldInput::Unset => "",
        })
        .collect::<Vec<_>>()
        .join(",")
}
