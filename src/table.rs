//! Row store: the ordered collection of data-entry rows and the bulk repair
//! operations run over a selection of them.
//!
//! ```
//! use scoretable::schema::Schema;
//! use scoretable::table::RowStore;
//!
//! let schema = Schema::standard();
//! let mut store = RowStore::new(&schema);
//! let row = store.add(vec!["1".to_owned(); 12], "5".to_owned())?;
//! assert_eq!(row.position(), 1);
//!
//! store.delete(&[row.id()])?;
//! assert!(store.is_empty());
//! # Ok::<(), scoretable::error::ScoretableError>(())
//! ```

pub mod draft;
pub mod repair;
pub mod row;
pub mod store;

pub use draft::{FieldInput, RowDraft};
pub use row::{Flag, Row, RowId};
pub use store::RowStore;
