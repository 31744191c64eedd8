//! Stage 1: weighted sums over a blend
//!
//! Weights are the raw input percentages (30 and 70, not 0.3 and 0.7) and
//! are never renormalised. The total weight is carried alongside so later
//! stages can turn sums back into averages.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::{CoalCategory, MaterialTable};

/// Raw weighted sums of every table column, plus category composition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeightedSums {
    /// `Σ value * weight` per column name.
    pub sums: BTreeMap<String, f64>,
    /// `Σ value` per column name over the blend members, ignoring weights.
    pub plain_sums: BTreeMap<String, f64>,
    /// Raw weight per coal category.
    pub categories: BTreeMap<CoalCategory, f64>,
    /// `Σ weight` over every blend entry, including unknown materials.
    pub total_weight: f64,
}

impl WeightedSums {
    /// Accumulate sums for `(material index, weight)` pairs.
    ///
    /// Entries that do not name a row of `table` still count towards the
    /// total weight but contribute no values.
    pub fn compute(table: &MaterialTable, blend: &[(usize, f64)]) -> Self {
        let mut sums: BTreeMap<String, f64> =
            table.columns().iter().map(|c| (c.clone(), 0.0)).collect();
        let mut plain_sums = sums.clone();
        let mut categories: BTreeMap<CoalCategory, f64> =
            CoalCategory::ALL.iter().map(|c| (*c, 0.0)).collect();
        let mut total_weight = 0.0;

        for &(index, weight) in blend {
            total_weight += weight;
            let Some(material) = table.get(index) else {
                debug!(index, "Blend entry does not name a known material");
                continue;
            };
            if let Some(category) = material.category {
                *categories.entry(category).or_default() += weight;
            }
            for (name, &value) in table.columns().iter().zip(&material.features) {
                if let Some(s) = sums.get_mut(name) {
                    *s += value * weight;
                }
                if let Some(s) = plain_sums.get_mut(name) {
                    *s += value;
                }
            }
        }

        Self {
            sums,
            plain_sums,
            categories,
            total_weight,
        }
    }

    /// Whether the column was present in the material table.
    pub fn has(&self, column: &str) -> bool {
        self.sums.contains_key(column)
    }

    /// Weighted sum of a column; 0 when the column is absent.
    pub fn sum(&self, column: &str) -> f64 {
        self.sums.get(column).copied().unwrap_or(0.0)
    }

    /// Unweighted sum of a column over the blend members.
    pub fn plain_sum(&self, column: &str) -> f64 {
        self.plain_sums.get(column).copied().unwrap_or(0.0)
    }

    /// Weighted average of a column; 0 when the total weight is 0.
    pub fn average(&self, column: &str) -> f64 {
        if self.total_weight != 0.0 {
            self.sum(column) / self.total_weight
        } else {
            0.0
        }
    }

    pub fn category(&self, category: CoalCategory) -> f64 {
        self.categories.get(&category).copied().unwrap_or(0.0)
    }

    /// Combined raw weight of the coking categories (HCC, SHCC, HFCC).
    pub fn coking_weight(&self) -> f64 {
        CoalCategory::ALL
            .iter()
            .filter(|c| c.is_coking())
            .map(|c| self.category(*c))
            .sum()
    }
}
