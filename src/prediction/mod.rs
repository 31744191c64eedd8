//! Property prediction
//!
//! Turns a blend into predicted blend/coke properties through one of two
//! pipelines behind a single `PredictionOracle`:
//!
//! - `direct`: composed blend vector → multi-output regression model. Used
//!   inside the search loop as the fitness signal.
//! - `staged`: weighted sums → engineered indices → proxy formulas →
//!   normalised feature dictionary → one single-target model per property.
//!   Used to explain a recommended blend.
//!
//! Models are opaque artifacts behind the `Predictor` trait.

pub mod artifact;
mod direct;
pub mod emissions;
pub mod normalizer;
pub mod staged;

pub use artifact::{ArtifactError, RegressionArtifact};
pub use direct::{DirectPipeline, PERCENT_SCALED_OUTPUTS, PREDICTED_OUTPUTS};
pub use emissions::EmissionEstimates;
pub use normalizer::{MinMaxScaler, ScalerArtifact};
pub use staged::{
    BasicityMode, StagedPipeline, StagedPrediction, StagedTarget, COLUMN_SCALER_FILE,
};

use std::fmt;

use crate::types::{MaterialTable, PredictedProperties};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("Model expects {expected} input features, got {actual}")]
    InputWidth { expected: usize, actual: usize },

    #[error("Model produced {actual} outputs, expected at least {expected}")]
    OutputWidth { expected: usize, actual: usize },

    #[error("Model feature '{0}' is not a column of the material table")]
    MissingColumn(String),

    #[error("Material table has {width} columns, cannot drop {dropped} trailing fields")]
    TooFewColumns { width: usize, dropped: usize },

    #[error("Model failure: {0}")]
    Model(String),
}

/// A pre-trained regression model: `predict(vector) -> vector`.
pub trait Predictor: Send + Sync + fmt::Debug {
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError>;

    /// Number of inputs the model was trained on, when known.
    fn input_width(&self) -> Option<usize> {
        None
    }

    fn output_width(&self) -> Option<usize> {
        None
    }

    /// Training column order, when the artifact records it.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }
}

/// Single entry point for both prediction pipelines.
#[derive(Debug)]
pub struct PredictionOracle {
    direct: DirectPipeline,
    staged: Option<StagedPipeline>,
}

impl PredictionOracle {
    pub fn new(direct: DirectPipeline) -> Self {
        Self {
            direct,
            staged: None,
        }
    }

    pub fn with_staged(mut self, staged: StagedPipeline) -> Self {
        self.staged = Some(staged);
        self
    }

    /// Predict the eight properties of a composed blend vector.
    pub fn predict(&self, blend: &[f64]) -> Result<PredictedProperties, PredictionError> {
        self.direct.predict(blend)
    }

    /// Run the staged pipeline for a blend given as `(material index, weight)`
    /// pairs. `None` when no staged pipeline is configured.
    pub fn explain(&self, table: &MaterialTable, blend: &[(usize, f64)]) -> Option<StagedPrediction> {
        self.staged.as_ref().map(|s| s.run(table, blend))
    }

    pub fn direct(&self) -> &DirectPipeline {
        &self.direct
    }

    pub fn staged(&self) -> Option<&StagedPipeline> {
        self.staged.as_ref()
    }
}
