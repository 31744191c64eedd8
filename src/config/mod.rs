//! Optimizer Configuration Module
//!
//! Run parameters loaded from TOML, replacing hardcoded GA settings,
//! penalty weighting and constraint ranges with operator-tunable values.
//!
//! ## Loading Order
//!
//! 1. `BLEND_CONFIG` environment variable (path to TOML file)
//! 2. `blend_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Example
//!
//! ```toml
//! [search]
//! generations = 50
//! seed = 42
//!
//! [fitness]
//! penalty_weight = 1000.0
//!
//! [constraints.coke]
//! csr = [62.0, 72.0]
//! ```

pub mod defaults;
mod optimizer_config;
pub mod validation;

pub use optimizer_config::*;
