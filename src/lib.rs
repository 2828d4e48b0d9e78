//! # Scoretable - row entry, repair and threshold scoring
//!
//! Scoretable keeps an ordered table of data-entry rows (a fixed set of
//! numeric feature columns plus a threshold), repairs their contents,
//! scores each row with a pre-trained model and reconciles the table with
//! CSV and Excel files.
//!
//! ## Quick Start
//!
//! ```no_run
//! use scoretable::config::{default_config_path, load_app_config};
//! use scoretable::workbench::{FixedAnswer, Workbench};
//! use std::path::Path;
//!
//! let settings = load_app_config(&default_config_path());
//! let mut bench = Workbench::from_settings(&settings)?;
//!
//! bench.import_file(Path::new("measurements.xlsx"), &mut FixedAnswer(false))?;
//! let ids = bench.store().ids();
//! bench.correct(&ids)?;
//!
//! let report = bench.calculate(&bench.store().ids())?;
//! println!("{}", report.message());
//! # Ok::<(), scoretable::error::ScoretableError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`schema`]: feature, threshold and output columns
//! - [`table`]: rows, the row store and its repair rules
//! - [`defaults`]: default values used to seed and repair rows
//! - [`inference`]: normalization bounds, model artifacts and row scoring
//! - [`io`]: CSV/XLSX tables and the import/export adapter
//! - [`workbench`]: the session object and command dispatch
//! - [`error`]: error types and handling utilities
//! - [`config`], [`logging`]: settings file and log setup
//!
//! ## Key Concepts
//!
//! ### Explicit selection
//!
//! The row store never tracks a "current selection". Every operation takes
//! the ids of the rows it should touch, and positions are display ranks
//! that get renumbered, not identity.
//!
//! ### Unset versus blank
//!
//! A [`table::RowDraft`] separates "left unset" (take the default) from
//! values typed in. Defaults are resolved when the row is built, never
//! inside the store.

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod defaults;
pub mod error;
pub mod inference;
pub mod io;
pub mod logging;
pub mod schema;
pub mod table;
pub mod workbench;
