//! Blend feature composition
//!
//! The blend feature vector is the ratio-weighted sum of the member
//! materials' feature vectors: `Σ features[i] * ratio[i] / 100`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{Candidate, MaterialTable, BLEND_ARITY};

/// Cache key: indices and ratios in candidate order.
pub type PositionalKey = ([usize; BLEND_ARITY], [u8; BLEND_ARITY]);

/// Compute the blend vector for a candidate without caching.
///
/// Indices must be valid rows of `table`.
pub fn blend_features(table: &MaterialTable, candidate: &Candidate) -> Vec<f64> {
    let mut blend = vec![0.0; table.width()];
    for (&index, fraction) in candidate.indices.iter().zip(candidate.ratio.fractions()) {
        if let Some(material) = table.get(index) {
            for (acc, &v) in blend.iter_mut().zip(&material.features) {
                *acc += v * fraction;
            }
        }
    }
    blend
}

/// Memoising compositor bound to one material table.
///
/// Results are shared as `Arc<[f64]>` so repeated lookups for the same
/// candidate representation are O(1) and allocation-free.
#[derive(Debug)]
pub struct FeatureCompositor {
    table: Arc<MaterialTable>,
    cache: HashMap<PositionalKey, Arc<[f64]>>,
}

impl FeatureCompositor {
    pub fn new(table: Arc<MaterialTable>) -> Self {
        Self {
            table,
            cache: HashMap::new(),
        }
    }

    pub fn table(&self) -> &MaterialTable {
        &self.table
    }

    pub fn compose(&mut self, candidate: &Candidate) -> Arc<[f64]> {
        let table = &self.table;
        self.cache
            .entry(candidate.key())
            .or_insert_with(|| blend_features(table, candidate).into())
            .clone()
    }

    /// Store a vector computed elsewhere (parallel evaluation path).
    pub fn insert(&mut self, candidate: &Candidate, features: Arc<[f64]>) {
        self.cache.entry(candidate.key()).or_insert(features);
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Material, Ratio};

    fn table() -> Arc<MaterialTable> {
        let m = |name: &str, features: Vec<f64>| Material {
            name: name.into(),
            cost: 1.0,
            features,
            category: None,
        };
        Arc::new(
            MaterialTable::new(
                vec!["Ash".into(), "VM".into()],
                vec![
                    m("A", vec![10.0, 20.0]),
                    m("B", vec![20.0, 30.0]),
                    m("C", vec![30.0, 40.0]),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn weighted_sum_of_member_features() {
        let c = Candidate::new([0, 1, 2], Ratio([50, 30, 20]));
        let blend = blend_features(&table(), &c);
        assert!((blend[0] - (5.0 + 6.0 + 6.0)).abs() < 1e-9);
        assert!((blend[1] - (10.0 + 9.0 + 8.0)).abs() < 1e-9);
    }

    #[test]
    fn caches_per_positional_key() {
        let mut comp = FeatureCompositor::new(table());
        let c = Candidate::new([0, 1, 2], Ratio([50, 30, 20]));
        let first = comp.compose(&c);
        let second = comp.compose(&c);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(comp.cached(), 1);

        comp.compose(&Candidate::new([1, 0, 2], Ratio([30, 50, 20])));
        assert_eq!(comp.cached(), 2);
        comp.clear();
        assert_eq!(comp.cached(), 0);
    }
}
