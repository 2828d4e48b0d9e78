use super::model::ModelCache;
use super::normalize::NormParams;
use crate::error::{Result, ScoretableError};
use crate::schema::Schema;
use crate::table::Flag;
use crate::table::repair::{parse_finite, round_to_integer_string};
use ndarray::Array1;
use std::path::{Path, PathBuf};

/// Result of scoring one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    /// Rounded prediction, `""` when the row could not be scored.
    pub output: String,
    pub flag: Flag,
    /// Labels of unparseable inputs, or a single `ModelError: ...` entry.
    pub missing: Vec<String>,
}

impl ScoreOutcome {
    fn failed(missing: Vec<String>) -> Self {
        Self {
            output: String::new(),
            flag: Flag::Err,
            missing,
        }
    }

    pub fn is_scored(&self) -> bool {
        !self.output.is_empty()
    }
}

/// Scores one row of raw input strings.
///
/// Every feature must parse or nothing is scored. The threshold is optional:
/// without a valid one the row still gets an output, flagged `ERR`. Model
/// failures come back as an outcome, never as an error.
pub fn score<S: AsRef<str>>(
    features: &[S],
    threshold: &str,
    schema: &Schema,
    norm: &NormParams,
    model: &mut ModelCache,
) -> ScoreOutcome {
    if features.is_empty() {
        return ScoreOutcome::failed(schema.input_labels());
    }

    let mut missing = Vec::new();
    let values: Vec<Option<f64>> = schema
        .features()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = features.get(i).and_then(|raw| parse_finite(raw.as_ref()));
            if value.is_none() {
                missing.push(column.label.clone());
            }
            value
        })
        .collect();

    let threshold = parse_finite(threshold);
    if threshold.is_none() {
        missing.push(schema.threshold().label.clone());
    }

    let Some(values) = values.into_iter().collect::<Option<Array1<f64>>>() else {
        return ScoreOutcome::failed(missing);
    };

    let prediction = norm
        .normalize(values.view())
        .and_then(|normalized| model.get()?.predict(normalized.view()));
    let prediction = match prediction {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(error = %e, "row could not be scored");
            return ScoreOutcome::failed(vec![format!("ModelError: {e}")]);
        }
    };

    let flag = match threshold {
        Some(t) if prediction >= t => Flag::High,
        Some(_) => Flag::Ok,
        None => Flag::Err,
    };
    ScoreOutcome {
        output: round_to_integer_string(prediction),
        flag,
        missing,
    }
}

/// Normalization bounds and model for a session, both loaded on first use.
#[derive(Debug)]
pub struct Scorer {
    norm_path: Option<PathBuf>,
    norm: Option<NormParams>,
    model: ModelCache,
}

fn loaded_norm<'s>(
    slot: &'s mut Option<NormParams>,
    path: Option<&Path>,
    schema: &Schema,
) -> Result<&'s NormParams> {
    let norm = match slot.take() {
        Some(norm) => norm,
        None => {
            let path = path
                .ok_or_else(|| ScoretableError::resource("no normalization params configured"))?;
            NormParams::load(path, schema)?
        }
    };
    Ok(&*slot.insert(norm))
}

impl Scorer {
    pub fn new(norm_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            norm_path: Some(norm_path.into()),
            norm: None,
            model: ModelCache::new(model_path),
        }
    }

    /// A scorer over resources already in memory.
    pub fn with_resources(norm: NormParams, model: ModelCache) -> Self {
        Self {
            norm_path: None,
            norm: Some(norm),
            model,
        }
    }

    /// Scores every `(features, threshold)` pair in order.
    ///
    /// # Errors
    ///
    /// Fails before scoring anything if the normalization bounds cannot be
    /// loaded. Per-row failures are reported in the outcomes instead.
    pub fn score_batch<'a, I, F>(&mut self, schema: &Schema, rows: I) -> Result<Vec<ScoreOutcome>>
    where
        I: IntoIterator<Item = (F, &'a str)>,
        F: AsRef<[String]>,
    {
        let norm = loaded_norm(&mut self.norm, self.norm_path.as_deref(), schema)?;
        let model = &mut self.model;
        Ok(rows
            .into_iter()
            .map(|(features, threshold)| score(features.as_ref(), threshold, schema, norm, model))
            .collect())
    }

    /// Forgets the loaded model, and the bounds when they came from a file,
    /// so the next batch reads both again.
    pub fn reload(&mut self) {
        self.model.invalidate();
        if self.norm_path.is_some() {
            self.norm = None;
        }
        tracing::debug!("scoring resources invalidated");
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_loaded()
    }
}
