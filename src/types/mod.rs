//! Shared data structures for the blend optimizer
//!
//! - `material`: raw material rows and the per-run material table
//! - `candidate`: blend candidates, ratio triples, canonical keys
//! - `constraints`: blend/coke property ranges and the constraint builder
//! - `report`: predicted properties, recommendations, run outcome

mod candidate;
mod constraints;
mod material;
mod report;

pub use candidate::*;
pub use constraints::*;
pub use material::*;
pub use report::*;
