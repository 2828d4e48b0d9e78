//! Centralized error handling for scoretable.
//!
//! Every fallible operation in the library returns [`Result<T>`], whose error
//! is the [`ScoretableError`] enum. Variants fall into four families, exposed
//! through [`ScoretableError::kind`]:
//!
//! - **Validation**: a field could not be parsed or was out of range. The
//!   offending column labels travel with the error.
//! - **Selection**: an operation was asked to act on no rows, or on a table
//!   with nothing usable in it.
//! - **Resource**: a normalization table, model artifact or data file is
//!   missing or corrupt. The table is left untouched.
//! - **Configuration**: a resource loaded fine but describes something the
//!   pipeline cannot use, e.g. `min == max` bounds.
//!
//! ```
//! use scoretable::error::{ErrorKind, ScoretableError};
//!
//! let err = ScoretableError::NoSelection;
//! assert_eq!(err.kind(), ErrorKind::Selection);
//! assert_eq!(err.to_string(), "No rows selected");
//! ```
//!
//! The `ResultExt` trait adds `.context()` to any result whose error converts
//! into [`ScoretableError`]:
//!
//! ```no_run
//! use scoretable::error::ResultExt as _;
//!
//! fn read_table(path: &str) -> scoretable::error::Result<String> {
//!     std::fs::read_to_string(path).context("Failed to read table")
//! }
//! ```

use std::fmt;

/// Main error type for scoretable operations.
#[derive(Debug)]
pub enum ScoretableError {
    /// One or more fields failed to parse or were out of range.
    Validation { columns: Vec<String> },

    /// Every input field was blank after default substitution.
    EmptyInput,

    /// The operation targeted no rows.
    NoSelection,

    /// An import file shares no input column with the schema.
    NoInputColumns,

    /// File extension is not one of the supported table formats.
    UnsupportedFormat(String),

    /// Missing or corrupt external resource (model, normalization table, data file).
    Resource(String),

    /// A resource was readable but its contents are unusable.
    Configuration(String),

    /// Loading or invoking the scoring model failed.
    Model(String),

    /// I/O errors (file operations).
    Io(std::io::Error),

    /// Table reading/writing errors (Polars, spreadsheet backends).
    DataProcessing(String),

    /// The caller declined a confirmation.
    Aborted,

    /// Generic error with context.
    Other(String),
}

/// The four error families callers are expected to handle differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Selection,
    Resource,
    Configuration,
}

impl ScoretableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::EmptyInput | Self::Aborted => ErrorKind::Validation,
            Self::NoSelection | Self::NoInputColumns => ErrorKind::Selection,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::UnsupportedFormat(_)
            | Self::Resource(_)
            | Self::Model(_)
            | Self::Io(_)
            | Self::DataProcessing(_)
            | Self::Other(_) => ErrorKind::Resource,
        }
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl fmt::Display for ScoretableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { columns } => {
                write!(f, "Invalid or missing values in: {}", columns.join(", "))
            }
            Self::EmptyInput => write!(f, "Please fill in at least one field"),
            Self::NoSelection => write!(f, "No rows selected"),
            Self::NoInputColumns => write!(f, "No valid input columns found in the file"),
            Self::UnsupportedFormat(ext) => {
                write!(f, "Unsupported file format '{ext}': only CSV and Excel files are supported")
            }
            Self::Resource(msg) => write!(f, "Resource error: {msg}"),
            Self::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            Self::Model(msg) => write!(f, "{msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Aborted => write!(f, "Operation aborted by user"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ScoretableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ScoretableError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for ScoretableError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for ScoretableError {
    fn from(err: serde_json::Error) -> Self {
        Self::Resource(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for ScoretableError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<calamine::Error> for ScoretableError {
    fn from(err: calamine::Error) -> Self {
        Self::DataProcessing(format!("spreadsheet read failed: {err}"))
    }
}

impl From<rust_xlsxwriter::XlsxError> for ScoretableError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::DataProcessing(format!("spreadsheet write failed: {err}"))
    }
}

impl From<ScoretableError> for String {
    fn from(err: ScoretableError) -> Self {
        err.to_string()
    }
}

/// Result type alias for scoretable operations.
pub type Result<T> = std::result::Result<T, ScoretableError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ScoretableError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(e.into(), msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

// Keeps the family of the wrapped error so `kind()` still answers correctly.
fn wrap(err: ScoretableError, msg: String) -> ScoretableError {
    match err {
        ScoretableError::Resource(inner) | ScoretableError::Other(inner) => {
            ScoretableError::Resource(format!("{msg}: {inner}"))
        }
        ScoretableError::Configuration(inner) => {
            ScoretableError::Configuration(format!("{msg}: {inner}"))
        }
        ScoretableError::Model(inner) => ScoretableError::Model(format!("{msg}: {inner}")),
        ScoretableError::Io(e) => ScoretableError::Resource(format!("{msg}: {e}")),
        ScoretableError::DataProcessing(inner) => {
            ScoretableError::DataProcessing(format!("{msg}: {inner}"))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScoretableError::Validation {
            columns: vec!["A".to_owned(), "Threshold".to_owned()],
        };
        assert_eq!(err.to_string(), "Invalid or missing values in: A, Threshold");
    }

    #[test]
    fn test_error_conversion_to_string() {
        let err = ScoretableError::Aborted;
        let s: String = err.into();
        assert_eq!(s, "Operation aborted by user");
    }

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(ScoretableError::EmptyInput.kind(), ErrorKind::Validation);
        assert_eq!(ScoretableError::NoInputColumns.kind(), ErrorKind::Selection);
        assert_eq!(
            ScoretableError::UnsupportedFormat("txt".to_owned()).kind(),
            ErrorKind::Resource
        );
        assert_eq!(
            ScoretableError::configuration("min == max").kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file.txt",
        ));

        let err = result.context("Failed to read file").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_context_keeps_configuration_kind() {
        let result: Result<()> = Err(ScoretableError::configuration("bounds for 'a' are equal"));
        let err = result.context("Failed to load normalization params").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
