//! Optimizer configuration: GA parameters, fitness weighting, prediction
//! options and constraint overrides as operator-tunable TOML values.
//!
//! Each section implements `Default` with the built-in values, so a missing
//! file or a partial file behaves exactly like the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::prediction::BasicityMode;
use crate::types::{ConstraintOverrides, Constraints};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for an optimization run.
///
/// Load with `OptimizerConfig::load()` which searches:
/// 1. `$BLEND_CONFIG` env var
/// 2. `./blend_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Genetic search parameters
    #[serde(default)]
    pub search: SearchConfig,

    /// Score weighting
    #[serde(default)]
    pub fitness: FitnessConfig,

    /// Prediction pipeline options
    #[serde(default)]
    pub prediction: PredictionConfig,

    /// Per-property range overrides, merged over the built-in ranges
    #[serde(default)]
    pub constraints: ConstraintOverrides,
}

impl OptimizerConfig {
    /// Load configuration using the standard search order:
    /// 1. `$BLEND_CONFIG` environment variable
    /// 2. `./blend_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded optimizer config from BLEND_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from BLEND_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "BLEND_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded optimizer config from ./blend_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./blend_config.toml, using defaults");
                }
            }
        }

        info!("No blend_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys are logged, not rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;

        let (_, warnings) = super::validation::validate_ranges(&config);
        for w in &warnings {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Optimizer config saved");
        Ok(())
    }

    /// Constraint set for a run: built-in ranges merged with the overrides.
    pub fn constraints(&self) -> Result<Constraints, ConfigError> {
        Constraints::with_overrides(&self.constraints)
            .map_err(|e| ConfigError::Validation(vec![e.to_string()]))
    }

    /// Check every section for impossible values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, _) = super::validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Search
// ============================================================================

/// Genetic search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Probability applied independently to the index and ratio channels
    pub mutation_rate: f64,
    pub elite_size: usize,
    pub tournament_size: usize,
    /// Size of the top-ranked slice tournaments draw from
    pub tournament_pool: usize,
    pub stagnation_threshold: usize,
    pub init_attempts: usize,
    pub ratio_step: u8,
    /// RNG seed; a fresh one is drawn when absent
    pub seed: Option<u64>,
    /// Evaluate uncached candidates of a generation on the rayon pool
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: defaults::POPULATION_SIZE,
            generations: defaults::GENERATIONS,
            mutation_rate: defaults::MUTATION_RATE,
            elite_size: defaults::ELITE_SIZE,
            tournament_size: defaults::TOURNAMENT_SIZE,
            tournament_pool: defaults::TOURNAMENT_POOL,
            stagnation_threshold: defaults::STAGNATION_THRESHOLD,
            init_attempts: defaults::INIT_ATTEMPTS,
            ratio_step: defaults::RATIO_STEP,
            seed: None,
            parallel: true,
        }
    }
}

// ============================================================================
// Fitness
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    /// `score = cost + penalty_weight * penalty`
    pub penalty_weight: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            penalty_weight: defaults::PENALTY_WEIGHT,
        }
    }
}

// ============================================================================
// Prediction
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Basicity index aggregation in the staged pipeline
    pub basicity: BasicityMode,
    /// Trailing table columns hidden from the direct model when the artifact
    /// does not declare its feature names
    pub drop_trailing: usize,
    /// Staged artifact directory; the staged pipeline is skipped when unset
    pub staged_dir: Option<PathBuf>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            basicity: BasicityMode::default(),
            drop_trailing: defaults::DIRECT_DROP_TRAILING,
            staged_dir: None,
        }
    }
}
