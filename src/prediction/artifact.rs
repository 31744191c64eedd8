//! Pre-trained regression artifacts loaded from JSON
//!
//! The models are trained elsewhere and exported as data. Two shapes are
//! supported:
//!
//! - `linear`: one weight row plus intercept per output
//! - `forest`: an averaged ensemble of binary regression trees whose leaves
//!   carry one value per output (`x[feature] <= threshold` goes left)
//!
//! Either form may declare `feature_names`, the input column order it was
//! trained on.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::{PredictionError, Predictor};

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Artifact decode error ({}): {}", .0.display(), .1)]
    Decode(PathBuf, #[source] serde_json::Error),

    #[error("Invalid artifact: {0}")]
    Invalid(String),
}

/// Read and decode a JSON artifact.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(|e| ArtifactError::Io(path.to_path_buf(), e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| ArtifactError::Decode(path.to_path_buf(), e))
}

/// A node of an exported regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// A regression tree stored as a flat node array rooted at index 0.
///
/// Children always sit after their parent, which guarantees traversal ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn validate(&self, n_features: usize, n_outputs: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    threshold,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {i}: feature {feature} >= {n_features}"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {i}: non-finite threshold"));
                    }
                    for child in [left, right] {
                        if *child <= i || *child >= self.nodes.len() {
                            return Err(format!("node {i}: child {child} out of order"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_outputs {
                        return Err(format!(
                            "node {i}: leaf has {} outputs, expected {n_outputs}",
                            value.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf.
    ///
    /// Checked on every step so a deserialised tree that never went through
    /// `validate` fails with an error instead of panicking or looping.
    fn leaf(&self, x: &[f64]) -> Result<&[f64], PredictionError> {
        let broken = |i: usize, what: &str| PredictionError::Model(format!("tree node {i}: {what}"));
        let mut i = 0;
        loop {
            match self.nodes.get(i) {
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = x.get(*feature).ok_or_else(|| broken(i, "feature out of range"))?;
                    let next = if *value <= *threshold { *left } else { *right };
                    if next <= i {
                        return Err(broken(i, "child link points backwards"));
                    }
                    i = next;
                }
                Some(TreeNode::Leaf { value }) => return Ok(value),
                None => return Err(broken(i, "missing")),
            }
        }
    }
}

/// Exported regression model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionArtifact {
    Linear {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        /// `coefficients[output][input]`
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    Forest {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        n_features: usize,
        n_outputs: usize,
        trees: Vec<RegressionTree>,
    },
}

impl RegressionArtifact {
    /// Load and validate an artifact file.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact: Self = read_json(path)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Check internal shape consistency.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let names_len = |names: &Option<Vec<String>>| names.as_ref().map(Vec::len);
        match self {
            Self::Linear {
                feature_names,
                coefficients,
                intercepts,
            } => {
                if coefficients.is_empty() {
                    return Err(ArtifactError::Invalid("linear model has no outputs".into()));
                }
                if coefficients.len() != intercepts.len() {
                    return Err(ArtifactError::Invalid(format!(
                        "{} coefficient rows but {} intercepts",
                        coefficients.len(),
                        intercepts.len()
                    )));
                }
                let width = coefficients[0].len();
                if coefficients.iter().any(|row| row.len() != width) {
                    return Err(ArtifactError::Invalid("ragged coefficient rows".into()));
                }
                if let Some(n) = names_len(feature_names) {
                    if n != width {
                        return Err(ArtifactError::Invalid(format!(
                            "{n} feature names for {width} coefficients"
                        )));
                    }
                }
            }
            Self::Forest {
                feature_names,
                n_features,
                n_outputs,
                trees,
            } => {
                if trees.is_empty() {
                    return Err(ArtifactError::Invalid("forest has no trees".into()));
                }
                for (t, tree) in trees.iter().enumerate() {
                    tree.validate(*n_features, *n_outputs)
                        .map_err(|e| ArtifactError::Invalid(format!("tree {t}: {e}")))?;
                }
                if let Some(n) = names_len(feature_names) {
                    if n != *n_features {
                        return Err(ArtifactError::Invalid(format!(
                            "{n} feature names for {n_features} features"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Predictor for RegressionArtifact {
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        let expected = self.input_width().unwrap_or(features.len());
        if features.len() != expected {
            return Err(PredictionError::InputWidth {
                expected,
                actual: features.len(),
            });
        }
        let outputs = match self {
            Self::Linear {
                coefficients,
                intercepts,
                ..
            } => coefficients
                .iter()
                .zip(intercepts)
                .map(|(row, b)| b + row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>())
                .collect(),
            Self::Forest {
                n_outputs, trees, ..
            } => {
                if trees.is_empty() {
                    return Err(PredictionError::Model("forest has no trees".to_string()));
                }
                let mut acc = vec![0.0; *n_outputs];
                for tree in trees {
                    let leaf = tree.leaf(features)?;
                    if leaf.len() != *n_outputs {
                        return Err(PredictionError::OutputWidth {
                            expected: *n_outputs,
                            actual: leaf.len(),
                        });
                    }
                    for (a, v) in acc.iter_mut().zip(leaf) {
                        *a += v;
                    }
                }
                let n = trees.len() as f64;
                acc.iter_mut().for_each(|a| *a /= n);
                acc
            }
        };
        Ok(outputs)
    }

    fn input_width(&self) -> Option<usize> {
        match self {
            Self::Linear { coefficients, .. } => coefficients.first().map(Vec::len),
            Self::Forest { n_features, .. } => Some(*n_features),
        }
    }

    fn output_width(&self) -> Option<usize> {
        match self {
            Self::Linear { intercepts, .. } => Some(intercepts.len()),
            Self::Forest { n_outputs, .. } => Some(*n_outputs),
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        match self {
            Self::Linear { feature_names, .. } | Self::Forest { feature_names, .. } => {
                feature_names.as_deref()
            }
        }
    }
}
