//! Built-in default constants.
//!
//! Grouped by subsystem. Every `Default` impl in `optimizer_config` draws
//! from here so the values live in one place.

// ============================================================================
// Search
// ============================================================================

/// Individuals per generation.
pub const POPULATION_SIZE: usize = 100;

/// Generation budget per run.
pub const GENERATIONS: usize = 30;

/// Per-channel mutation probability (index channel and ratio channel).
pub const MUTATION_RATE: f64 = 0.4;

/// Best individuals carried unchanged into the next generation.
pub const ELITE_SIZE: usize = 10;

/// Contestants drawn per tournament.
pub const TOURNAMENT_SIZE: usize = 5;

/// Tournaments draw only from this many top-ranked individuals.
pub const TOURNAMENT_POOL: usize = 50;

/// Generations without improvement tolerated before diversity injection.
/// Injection fires once the counter exceeds this value.
pub const STAGNATION_THRESHOLD: usize = 3;

/// Attempts to draw a not-yet-seen individual before accepting a duplicate.
pub const INIT_ATTEMPTS: usize = 50;

/// Blend proportion granularity (percent).
pub const RATIO_STEP: u8 = crate::ratio_pool::DEFAULT_RATIO_STEP;

// ============================================================================
// Fitness
// ============================================================================

/// Multiplier on the constraint penalty in `score = cost + w * penalty`.
pub const PENALTY_WEIGHT: f64 = 1.0;

// ============================================================================
// Prediction
// ============================================================================

/// Trailing composition fields (N) the direct model was not trained on.
pub const DIRECT_DROP_TRAILING: usize = 1;

// ============================================================================
// Config discovery
// ============================================================================

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "BLEND_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "blend_config.toml";
