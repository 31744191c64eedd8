//! Coal Blend Optimizer
//!
//! Genetic search for the cheapest three-material coal blend whose predicted
//! blend and coke properties stay inside configured ranges.
//!
//! ## Architecture
//!
//! - **Ratio Pool**: every legal three-way percentage split
//! - **Feature Compositor**: ratio-weighted blend feature vectors
//! - **Prediction Oracle**: direct multi-output regression, plus the staged
//!   feature-engineering pipeline for explaining a blend
//! - **Fitness Evaluator**: cost plus weighted constraint penalty, memoised
//! - **Search Engine**: elitist genetic algorithm with stagnation-driven
//!   diversity injection and cooperative cancellation

pub mod compositor;
pub mod config;
pub mod error;
pub mod fitness;
pub mod prediction;
pub mod ratio_pool;
pub mod search;
pub mod types;

pub use config::OptimizerConfig;
pub use error::OptimizerError;
pub use fitness::{Evaluation, FitnessEvaluator};
pub use prediction::{
    BasicityMode, DirectPipeline, PredictionError, PredictionOracle, Predictor,
    RegressionArtifact, StagedPipeline, StagedPrediction,
};
pub use ratio_pool::RatioPool;
pub use search::SearchEngine;

pub use types::{
    BlendComponent, BlendRecommendation, Candidate, CoalCategory, Constraints,
    GenerationStats, Material, MaterialTable, OptimizationOutcome, OptimizationReport,
    PredictedProperties, Property, Ratio,
};
