//! Genetic search over three-material blends
//!
//! - `engine`: the generation loop (init, evaluate, stagnation check,
//!   diversity injection, reproduction, termination)
//! - `operators`: random initialisation, tournament selection, crossover,
//!   mutation
//! - `tracking`: stagnation counter, init-duplicate set, unique-blend trail

mod engine;
pub mod operators;
mod tracking;

pub use engine::SearchEngine;
pub use tracking::{InitUniqueness, StagnationTracker, UniqueBlends};
