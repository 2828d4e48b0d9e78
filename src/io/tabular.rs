//! String-cell tables read from and written to disk.
//!
//! Two formats, picked by file extension: delimited text (`.csv`, via Polars)
//! and spreadsheet (`.xlsx`, read with calamine, written with
//! `rust_xlsxwriter`). Every cell is kept as text; blanks and nulls become `""`.

use crate::error::{Result, ResultExt as _, ScoretableError};
use crate::table::repair::parse_finite;
use calamine::{Data, Reader as _, open_workbook_auto};
use polars::prelude::*;
use rust_xlsxwriter::Workbook;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    /// # Errors
    ///
    /// `UnsupportedFormat` for anything but `.csv` and `.xlsx`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(ScoretableError::UnsupportedFormat(ext)),
        }
    }
}

/// Header row plus data rows, all text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell text, or `""` for short rows.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }
}

/// # Errors
///
/// `UnsupportedFormat` for unknown extensions; I/O and parse failures otherwise.
pub fn read_table(path: &Path) -> Result<Table> {
    let table = match TableFormat::from_path(path)? {
        TableFormat::Csv => read_csv(path),
        TableFormat::Xlsx => read_xlsx(path),
    }
    .with_context(|| format!("Failed to read {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.height(),
        "table read"
    );
    Ok(table)
}

/// # Errors
///
/// `UnsupportedFormat` for unknown extensions; I/O and encode failures otherwise.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => write_csv(path, table),
        TableFormat::Xlsx => write_xlsx(path, table),
    }
    .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::debug!(path = %path.display(), rows = table.height(), "table written");
    Ok(())
}

fn read_csv(path: &Path) -> Result<Table> {
    // Zero-length schema inference reads every column as text.
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()?;

    dataframe_to_table(&df)
}

fn dataframe_to_table(df: &DataFrame) -> Result<Table> {
    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let columns = df
        .get_columns()
        .iter()
        .map(|c| {
            let s = c.as_materialized_series().cast(&DataType::String)?;
            let values = s
                .str()?
                .into_iter()
                .map(|v| v.unwrap_or_default().to_owned())
                .collect::<Vec<String>>();
            Ok(values)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut table = Table::new(headers);
    for row in 0..df.height() {
        table.push_row(
            columns
                .iter()
                .map(|col| col.get(row).cloned().unwrap_or_default())
                .collect(),
        );
    }
    Ok(table)
}

fn table_to_dataframe(table: &Table) -> Result<DataFrame> {
    let columns = table
        .headers
        .iter()
        .enumerate()
        .map(|(ci, name)| {
            let values: Vec<&str> = (0..table.height()).map(|ri| table.cell(ri, ci)).collect();
            Column::from(Series::new(name.as_str().into(), values))
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let mut df = table_to_dataframe(table)?;
    let file = std::fs::File::create(path)?;
    CsvWriter::new(file).include_header(true).finish(&mut df)?;
    Ok(())
}

fn read_xlsx(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ScoretableError::resource("workbook contains no worksheet"))??;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(cell_text).collect());
    }
    Ok(table)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_owned(),
    }
}

fn write_xlsx(path: &Path, table: &Table) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (ci, header) in table.headers.iter().enumerate() {
        worksheet.write_string(0, column_number(ci)?, header)?;
    }

    for (ri, row) in table.rows.iter().enumerate() {
        let row_number = u32::try_from(ri + 1)
            .map_err(|_| ScoretableError::resource("too many rows for a worksheet"))?;
        for (ci, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let col = column_number(ci)?;
            // Canonical numbers go in as number cells so spreadsheets can compute
            // on them; anything else keeps its exact text.
            match parse_finite(value).filter(|n| n.to_string() == *value) {
                Some(n) => {
                    worksheet.write_number(row_number, col, n)?;
                }
                None => {
                    worksheet.write_string(row_number, col, value)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn column_number(index: usize) -> Result<u16> {
    u16::try_from(index).map_err(|_| ScoretableError::resource("too many columns for a worksheet"))
}
