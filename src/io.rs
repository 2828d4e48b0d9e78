//! Table files: format detection, readers/writers and the import/export
//! adapter that maps them onto the row store.

pub mod adapter;
pub mod tabular;

pub use adapter::{ExportColumns, ImportSummary, export_rows, import_table, rows_to_table};
pub use tabular::{Table, TableFormat, read_table, write_table};
