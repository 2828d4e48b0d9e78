//! The scoring pipeline: raw row strings are validated, normalized against
//! per-feature bounds and passed to a pre-trained model, whose prediction
//! is compared with the row's threshold.
//!
//! ```
//! use scoretable::inference::{ModelArtifact, ModelCache, NormParams, score};
//! use scoretable::schema::Schema;
//! use scoretable::table::Flag;
//!
//! let schema = Schema::standard();
//! let norm = NormParams::from_bounds(&[(0.0, 1.0); 12])?;
//! let mut model = ModelCache::preloaded(
//!     ModelArtifact::LinearRegression { intercept: 4.0, coefficients: vec![0.0; 12] }
//!         .into_predictor()?,
//! );
//!
//! let features = ["0", "1", "0", "1", "0", "1", "0", "1", "0", "1", "0", "1"];
//! let outcome = score(&features, "5", &schema, &norm, &mut model);
//! assert_eq!(outcome.output, "4");
//! assert_eq!(outcome.flag, Flag::Ok);
//! # Ok::<(), scoretable::error::ScoretableError>(())
//! ```

pub mod model;
pub mod normalize;
pub mod scoring;

pub use model::{ModelArtifact, ModelCache, Predictor, TreeNode, load_artifact};
pub use normalize::NormParams;
pub use scoring::{ScoreOutcome, Scorer, score};
