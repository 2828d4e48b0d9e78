use crate::error::{Result, ResultExt as _, ScoretableError};
use crate::io::read_table;
use crate::schema::Schema;
use crate::table::repair::parse_finite;
use ndarray::{Array1, ArrayView1};
use std::path::Path;

/// Per-feature `(min, max)` bounds, in schema feature order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormParams {
    mins: Array1<f64>,
    spans: Array1<f64>,
}

impl NormParams {
    /// Reads a bounds table: first column is the feature key, plus `min` and
    /// `max` columns. Every schema feature needs a row.
    ///
    /// # Errors
    ///
    /// `Resource` if the file cannot be read, `Configuration` for missing
    /// rows or columns, non-numeric bounds or `min == max`.
    pub fn load(path: &Path, schema: &Schema) -> Result<Self> {
        let table = read_table(path).context("Failed to load normalization params")?;

        let column = |name: &str| {
            table
                .headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| {
                    ScoretableError::configuration(format!(
                        "normalization params have no '{name}' column"
                    ))
                })
        };
        let min_col = column("min")?;
        let max_col = column("max")?;

        let bounds = schema
            .features()
            .iter()
            .map(|feature| {
                let row = (0..table.height())
                    .find(|&r| table.cell(r, 0).trim() == feature.key)
                    .ok_or_else(|| {
                        ScoretableError::configuration(format!(
                            "no normalization bounds for column '{}'",
                            feature.key
                        ))
                    })?;
                let bound = |col: usize| {
                    parse_finite(table.cell(row, col)).ok_or_else(|| {
                        ScoretableError::configuration(format!(
                            "non-numeric normalization bound for column '{}'",
                            feature.key
                        ))
                    })
                };
                Ok((feature.key.clone(), bound(min_col)?, bound(max_col)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let params = Self::from_keyed_bounds(&bounds)?;
        tracing::info!(path = %path.display(), features = bounds.len(), "normalization params loaded");
        Ok(params)
    }

    /// # Errors
    ///
    /// `Configuration` if any pair has `min == max`.
    pub fn from_bounds(bounds: &[(f64, f64)]) -> Result<Self> {
        let keyed: Vec<(String, f64, f64)> = bounds
            .iter()
            .enumerate()
            .map(|(i, &(min, max))| (format!("#{}", i + 1), min, max))
            .collect();
        Self::from_keyed_bounds(&keyed)
    }

    fn from_keyed_bounds(bounds: &[(String, f64, f64)]) -> Result<Self> {
        if let Some((key, _, _)) = bounds.iter().find(|(_, min, max)| min == max) {
            return Err(ScoretableError::configuration(format!(
                "normalization bounds for column '{key}' have min == max"
            )));
        }
        Ok(Self {
            mins: bounds.iter().map(|&(_, min, _)| min).collect(),
            spans: bounds.iter().map(|&(_, min, max)| max - min).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.mins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mins.is_empty()
    }

    /// Rescales `values` to `(v - min) / (max - min)`, clipped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// `Configuration` when `values` does not have one entry per feature.
    pub fn normalize(&self, values: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        if values.len() != self.len() {
            return Err(ScoretableError::configuration(format!(
                "expected {} features to normalize, got {}",
                self.len(),
                values.len()
            )));
        }
        let scaled = (&values - &self.mins) / &self.spans;
        Ok(scaled.mapv(|v| v.clamp(0.0, 1.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_clips_to_unit_range() -> Result<()> {
        let params = NormParams::from_bounds(&[(0.0, 10.0), (-5.0, 5.0), (2.0, 4.0)])?;
        let out = params.normalize(array![5.0, 20.0, -100.0].view())?;
        assert_eq!(out, array![0.5, 1.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_degenerate_bounds_are_configuration_errors() {
        let err = NormParams::from_bounds(&[(0.0, 1.0), (3.0, 3.0)]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn test_normalize_rejects_wrong_width() {
        let params = NormParams::from_bounds(&[(0.0, 1.0)]).unwrap();
        assert!(params.normalize(array![1.0, 2.0].view()).is_err());
    }

    #[test]
    fn test_load_from_csv() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("norm.csv");
        let mut csv = String::from("feature,min,max\n");
        // Rows may come in any order.
        for key in ('a'..='l').rev() {
            csv.push_str(&format!("{key},0,2\n"));
        }
        fs::write(&path, csv)?;

        let params = NormParams::load(&path, &Schema::standard())?;
        assert_eq!(params.len(), 12);
        let out = params.normalize(Array1::from_elem(12, 1.0).view())?;
        assert!(out.iter().all(|&v| (v - 0.5).abs() < 1e-12));
        Ok(())
    }

    #[test]
    fn test_load_reports_missing_feature_row() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("norm.csv");
        fs::write(&path, "key,min,max\na,0,1\nb,0,1\n")?;

        let err = NormParams::load(&path, &Schema::standard()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
        assert!(err.to_string().contains("'c'"));
        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_resource_error() {
        let err = NormParams::load(Path::new("/nonexistent/norm.csv"), &Schema::standard())
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Resource);
    }
}
