//! Run-level error type

use crate::prediction::{ArtifactError, PredictionError};
use crate::types::{ConstraintError, MaterialError};

/// Why an optimization run could not produce a result.
///
/// Cancellation is not an error; it is reported as
/// `OptimizationOutcome::Aborted`.
#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("Material table is empty")]
    EmptyMaterials,

    #[error("A blend needs 3 distinct materials, table has {0}")]
    TooFewMaterials(usize),

    #[error("Ratio pool is empty for step {0}")]
    EmptyRatioPool(u8),

    #[error("Invalid search configuration: {0}")]
    InvalidSearch(String),

    #[error("Invalid constraints: {0}")]
    Constraints(#[from] ConstraintError),

    #[error("Invalid material table: {0}")]
    Materials(#[from] MaterialError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] PredictionError),

    #[error("No valid solution found during optimization")]
    NoSolution,
}
