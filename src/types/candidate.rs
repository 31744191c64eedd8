//! Blend candidates: three distinct material indices plus one ratio triple

use serde::{Deserialize, Serialize};

/// Number of materials in every blend.
pub const BLEND_ARITY: usize = 3;

/// A percentage split over the three blend slots.
///
/// Values are positive multiples of the pool step and sum to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ratio(pub [u8; BLEND_ARITY]);

impl Ratio {
    pub fn parts(&self) -> [u8; BLEND_ARITY] {
        self.0
    }

    pub fn sum(&self) -> u32 {
        self.0.iter().map(|&p| u32::from(p)).sum()
    }

    /// Ratio parts as fractions of the whole blend.
    pub fn fractions(&self) -> [f64; BLEND_ARITY] {
        self.0.map(|p| f64::from(p) / 100.0)
    }

    pub fn sorted(&self) -> [u8; BLEND_ARITY] {
        let mut parts = self.0;
        parts.sort_unstable();
        parts
    }
}

/// One individual of the search: which materials, in what ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub indices: [usize; BLEND_ARITY],
    pub ratio: Ratio,
}

impl Candidate {
    pub fn new(indices: [usize; BLEND_ARITY], ratio: Ratio) -> Self {
        Self { indices, ratio }
    }

    /// Positional key used by the fitness and blend-feature caches.
    pub fn key(&self) -> ([usize; BLEND_ARITY], [u8; BLEND_ARITY]) {
        (self.indices, self.ratio.0)
    }

    /// Order-insensitive key: indices and ratio parts each sorted.
    pub fn canonical_key(&self) -> CanonicalKey {
        let mut indices = self.indices;
        indices.sort_unstable();
        CanonicalKey {
            indices,
            ratios: self.ratio.sorted(),
        }
    }

    pub fn has_distinct_indices(&self) -> bool {
        let [a, b, c] = self.indices;
        a != b && a != c && b != c
    }

    /// Check the candidate invariants against a table of `material_count` rows.
    pub fn is_valid(&self, material_count: usize) -> bool {
        self.has_distinct_indices()
            && self.indices.iter().all(|&i| i < material_count)
            && self.ratio.sum() == 100
            && self.ratio.0.iter().all(|&p| p > 0)
    }
}

/// Canonical candidate key (sorted indices, sorted ratios) used for
/// duplicate detection regardless of slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalKey {
    pub indices: [usize; BLEND_ARITY],
    pub ratios: [u8; BLEND_ARITY],
}
