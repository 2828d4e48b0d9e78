//! Scoring model artifacts and the load-once model cache.

use crate::error::{Result, ResultExt as _, ScoretableError};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A pre-trained model that maps a normalized feature vector to a number.
pub trait Predictor: Send + Sync {
    /// # Errors
    ///
    /// `Model` when the vector does not fit the model or the prediction is
    /// not a finite number.
    fn predict(&self, features: ArrayView1<'_, f64>) -> Result<f64>;
}

/// On-disk model description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LinearRegression {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    DecisionTree {
        nodes: Vec<TreeNode>,
    },
}

/// A regression tree node. Children are indices into the node list, the
/// root is node 0; samples go left when `x[feature] <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Leaf {
        leaf: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

impl ModelArtifact {
    /// # Errors
    ///
    /// `Model` for an empty model or a tree whose child links point outside
    /// the node list.
    pub fn into_predictor(self) -> Result<Arc<dyn Predictor>> {
        match self {
            Self::LinearRegression {
                intercept,
                coefficients,
            } => {
                if coefficients.is_empty() {
                    return Err(ScoretableError::Model(
                        "linear model has no coefficients".to_owned(),
                    ));
                }
                Ok(Arc::new(LinearModel {
                    intercept,
                    coefficients: Array1::from(coefficients),
                }))
            }
            Self::DecisionTree { nodes } => {
                if nodes.is_empty() {
                    return Err(ScoretableError::Model("decision tree has no nodes".to_owned()));
                }
                for (i, node) in nodes.iter().enumerate() {
                    if let TreeNode::Split { left, right, .. } = node
                        && (*left >= nodes.len() || *right >= nodes.len())
                    {
                        return Err(ScoretableError::Model(format!(
                            "tree node {i} links to a node that does not exist"
                        )));
                    }
                }
                Ok(Arc::new(TreeModel { nodes }))
            }
        }
    }
}

/// Reads a JSON model artifact.
///
/// # Errors
///
/// `Resource` if the file cannot be read or parsed.
pub fn load_artifact(path: &Path) -> Result<ModelArtifact> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model {}", path.display()))?;
    let artifact = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse model {}", path.display()))?;
    Ok(artifact)
}

#[derive(Debug)]
struct LinearModel {
    intercept: f64,
    coefficients: Array1<f64>,
}

impl Predictor for LinearModel {
    fn predict(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(ScoretableError::Model(format!(
                "X has {} features, but the model is expecting {} features as input",
                features.len(),
                self.coefficients.len()
            )));
        }
        finite(self.intercept + features.dot(&self.coefficients))
    }
}

#[derive(Debug)]
struct TreeModel {
    nodes: Vec<TreeNode>,
}

impl Predictor for TreeModel {
    fn predict(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        let mut index = 0;
        // A walk longer than the node count means the links form a cycle.
        for _ in 0..=self.nodes.len() {
            match &self.nodes[index] {
                TreeNode::Leaf { leaf } => return finite(*leaf),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).ok_or_else(|| {
                        ScoretableError::Model(format!(
                            "tree splits on feature {feature}, but only {} were given",
                            features.len()
                        ))
                    })?;
                    index = if value <= threshold { *left } else { *right };
                }
            }
        }
        Err(ScoretableError::Model("decision tree contains a cycle".to_owned()))
    }
}

fn finite(prediction: f64) -> Result<f64> {
    if prediction.is_finite() {
        Ok(prediction)
    } else {
        Err(ScoretableError::Model(format!(
            "model produced a non-finite prediction ({prediction})"
        )))
    }
}

/// Loads the model artifact on first use and keeps it until invalidated.
pub struct ModelCache {
    path: Option<PathBuf>,
    loaded: Option<Arc<dyn Predictor>>,
}

impl ModelCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            loaded: None,
        }
    }

    /// A cache holding an already-built predictor, with no backing file.
    pub fn preloaded(predictor: Arc<dyn Predictor>) -> Self {
        Self {
            path: None,
            loaded: Some(predictor),
        }
    }

    /// # Errors
    ///
    /// Whatever loading the artifact fails with. A failed load is not
    /// cached; the next call tries again.
    pub fn get(&mut self) -> Result<Arc<dyn Predictor>> {
        if let Some(predictor) = &self.loaded {
            return Ok(Arc::clone(predictor));
        }
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| ScoretableError::resource("no model file configured"))?;
        let predictor = load_artifact(path)?.into_predictor()?;
        tracing::info!(path = %path.display(), "model loaded");
        self.loaded = Some(Arc::clone(&predictor));
        Ok(predictor)
    }

    /// Drops the loaded model so the next `get` reads the file again.
    pub fn invalidate(&mut self) {
        if self.path.is_some() {
            self.loaded = None;
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("path", &self.path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
