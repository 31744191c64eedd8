//! Fitness evaluation
//!
//! `score = cost + penalty_weight * penalty`, lower is better. Cost is the
//! ratio-weighted unit cost of the members; penalty is the one-sided
//! quadratic distance of the predicted properties from their ranges.
//!
//! Scores are memoised per positional candidate key for the lifetime of a
//! run. A generation's uncached candidates can be scored on the rayon pool;
//! results are merged into the caches on the calling thread.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::compositor::{blend_features, FeatureCompositor, PositionalKey};
use crate::prediction::{PredictionError, PredictionOracle};
use crate::types::{
    BlendComponent, BlendRecommendation, Candidate, Constraints, MaterialTable,
    PredictedProperties,
};

/// Score breakdown for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub score: f64,
    pub cost: f64,
    pub penalty: f64,
    pub predicted: PredictedProperties,
}

#[derive(Debug)]
pub struct FitnessEvaluator {
    compositor: FeatureCompositor,
    oracle: Arc<PredictionOracle>,
    constraints: Constraints,
    penalty_weight: f64,
    cache: HashMap<PositionalKey, Evaluation>,
    evaluations: usize,
}

impl FitnessEvaluator {
    pub fn new(
        table: Arc<MaterialTable>,
        oracle: Arc<PredictionOracle>,
        constraints: Constraints,
        penalty_weight: f64,
    ) -> Self {
        Self {
            compositor: FeatureCompositor::new(table),
            oracle,
            constraints,
            penalty_weight,
            cache: HashMap::new(),
            evaluations: 0,
        }
    }

    pub fn table(&self) -> &MaterialTable {
        self.compositor.table()
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn penalty_weight(&self) -> f64 {
        self.penalty_weight
    }

    /// Start a new run: install its constraints and drop every cached result.
    pub fn reset(&mut self, constraints: Constraints) {
        self.constraints = constraints;
        self.cache.clear();
        self.compositor.clear();
        self.evaluations = 0;
    }

    /// Number of oracle calls since the last reset.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Ratio-weighted unit cost.
    pub fn cost(&self, candidate: &Candidate) -> f64 {
        let table = self.compositor.table();
        candidate
            .indices
            .iter()
            .zip(candidate.ratio.fractions())
            .filter_map(|(&i, f)| table.get(i).map(|m| m.cost * f))
            .sum()
    }

    fn finish(&self, candidate: &Candidate, predicted: PredictedProperties) -> Evaluation {
        let cost = self.cost(candidate);
        let penalty = self.constraints.penalty(&predicted.to_outputs());
        Evaluation {
            score: cost + self.penalty_weight * penalty,
            cost,
            penalty,
            predicted,
        }
    }

    pub fn evaluate(&mut self, candidate: &Candidate) -> Result<Evaluation, PredictionError> {
        if let Some(hit) = self.cache.get(&candidate.key()) {
            return Ok(*hit);
        }
        let features = self.compositor.compose(candidate);
        let predicted = self.oracle.predict(&features)?;
        self.evaluations += 1;
        let evaluation = self.finish(candidate, predicted);
        self.cache.insert(candidate.key(), evaluation);
        Ok(evaluation)
    }

    /// Score a batch, in input order.
    ///
    /// With `parallel`, distinct uncached candidates are composed and
    /// predicted on the rayon pool first. Either way the result equals
    /// sequential evaluation.
    pub fn evaluate_all(
        &mut self,
        candidates: &[Candidate],
        parallel: bool,
    ) -> Result<Vec<Evaluation>, PredictionError> {
        if parallel {
            let mut seen = HashSet::new();
            let pending: Vec<&Candidate> = candidates
                .iter()
                .filter(|c| !self.cache.contains_key(&c.key()) && seen.insert(c.key()))
                .collect();

            if pending.len() > 1 {
                let table = self.compositor.table();
                let oracle = &self.oracle;
                let computed: Vec<_> = pending
                    .par_iter()
                    .map(|c| {
                        let features: Arc<[f64]> = blend_features(table, c).into();
                        let predicted = oracle.predict(&features);
                        (*c, features, predicted)
                    })
                    .collect();

                for (candidate, features, predicted) in computed {
                    let predicted = predicted?;
                    self.evaluations += 1;
                    self.compositor.insert(candidate, features);
                    let evaluation = self.finish(candidate, predicted);
                    self.cache.insert(candidate.key(), evaluation);
                }
            }
        }

        candidates.iter().map(|c| self.evaluate(c)).collect()
    }

    /// Build the caller-facing record of a candidate.
    pub fn recommendation(
        &mut self,
        candidate: &Candidate,
    ) -> Result<BlendRecommendation, PredictionError> {
        let evaluation = self.evaluate(candidate)?;
        let table = self.compositor.table();
        let components = candidate
            .indices
            .iter()
            .zip(candidate.ratio.parts())
            .map(|(&i, percentage)| BlendComponent {
                index: i,
                name: table.get(i).map(|m| m.name.clone()).unwrap_or_default(),
                percentage,
            })
            .collect();
        Ok(BlendRecommendation {
            components,
            predicted: evaluation.predicted,
            cost: evaluation.cost,
            penalty: evaluation.penalty,
            score: evaluation.score,
        })
    }
}
