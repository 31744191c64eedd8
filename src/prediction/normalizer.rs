//! Column-wise min-max normalisation fitted offline.
//!
//! Each column is mapped from its training `[data_min, data_max]` onto
//! `feature_range`. Columns with zero training range use a unit scale so
//! constant columns map to the lower end of the range.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::artifact::{read_json, ArtifactError};

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

/// Fitted min-max scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
}

impl MinMaxScaler {
    pub fn new(data_min: Vec<f64>, data_max: Vec<f64>) -> Result<Self, ArtifactError> {
        let scaler = Self {
            data_min,
            data_max,
            feature_range: default_feature_range(),
        };
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.data_min.len() != self.data_max.len() {
            return Err(ArtifactError::Invalid(format!(
                "scaler has {} minima but {} maxima",
                self.data_min.len(),
                self.data_max.len()
            )));
        }
        if self.data_min.is_empty() {
            return Err(ArtifactError::Invalid("scaler has no columns".into()));
        }
        let (lo, hi) = self.feature_range;
        if !lo.is_finite() || !hi.is_finite() || lo >= hi {
            return Err(ArtifactError::Invalid(format!(
                "feature_range ({lo}, {hi}) must be increasing"
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.data_min.len()
    }

    /// Scale a single value with the statistics of column `col`, clipped to
    /// the feature range.
    pub fn scale(&self, col: usize, x: f64) -> f64 {
        let (lo, hi) = self.feature_range;
        let min = self.data_min[col];
        let mut span = self.data_max[col] - min;
        if span == 0.0 {
            span = 1.0;
        }
        ((x - min) / span * (hi - lo) + lo).clamp(lo, hi)
    }

    /// Scale a row column-wise. Returns `None` when the width does not match.
    pub fn transform(&self, row: &[f64]) -> Option<Vec<f64>> {
        if row.len() != self.width() {
            return None;
        }
        Some(row.iter().enumerate().map(|(i, &x)| self.scale(i, x)).collect())
    }
}

/// On-disk scaler: either bare, or bundled with its training column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalerArtifact {
    Bundled {
        scaler: MinMaxScaler,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
    },
    Bare(MinMaxScaler),
}

impl ScalerArtifact {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact: Self = read_json(path)?;
        artifact.scaler().validate()?;
        Ok(artifact)
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        match self {
            Self::Bundled { scaler, .. } | Self::Bare(scaler) => scaler,
        }
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        match self {
            Self::Bundled { feature_names, .. } => feature_names.as_deref(),
            Self::Bare(_) => None,
        }
    }

    pub fn into_parts(self) -> (MinMaxScaler, Option<Vec<String>>) {
        match self {
            Self::Bundled {
                scaler,
                feature_names,
            } => (scaler, feature_names),
            Self::Bare(scaler) => (scaler, None),
        }
    }
}
