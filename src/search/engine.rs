//! Generation loop

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracing::{debug, info};

use super::operators::{crossover, mutate, random_candidate, tournament};
use super::tracking::{InitUniqueness, StagnationTracker, UniqueBlends};
use crate::config::{OptimizerConfig, SearchConfig};
use crate::error::OptimizerError;
use crate::fitness::{Evaluation, FitnessEvaluator};
use crate::prediction::PredictionOracle;
use crate::ratio_pool::RatioPool;
use crate::types::{
    Candidate, Constraints, GenerationStats, MaterialTable, OptimizationOutcome,
    OptimizationReport, BLEND_ARITY,
};

type Ranked = Vec<(Candidate, Evaluation)>;

/// Elitist genetic search over three-material blends.
///
/// One engine can run several times; every run starts from empty caches
/// and an empty init-uniqueness set.
#[derive(Debug)]
pub struct SearchEngine {
    config: SearchConfig,
    pool: RatioPool,
    evaluator: FitnessEvaluator,
    material_count: usize,
}

impl SearchEngine {
    pub fn new(
        table: Arc<MaterialTable>,
        oracle: Arc<PredictionOracle>,
        config: SearchConfig,
        penalty_weight: f64,
    ) -> Result<Self, OptimizerError> {
        if table.is_empty() {
            return Err(OptimizerError::EmptyMaterials);
        }
        if table.len() < BLEND_ARITY {
            return Err(OptimizerError::TooFewMaterials(table.len()));
        }
        if config.population_size == 0 {
            return Err(OptimizerError::InvalidSearch(
                "population_size must be > 0".into(),
            ));
        }
        if config.elite_size > config.population_size {
            return Err(OptimizerError::InvalidSearch(format!(
                "elite_size {} exceeds population_size {}",
                config.elite_size, config.population_size
            )));
        }
        if config.tournament_size == 0 || config.tournament_pool == 0 {
            return Err(OptimizerError::InvalidSearch(format!(
                "tournament_size {} and tournament_pool {} must both be > 0",
                config.tournament_size, config.tournament_pool
            )));
        }
        if !(0.0..=1.0).contains(&config.mutation_rate) {
            return Err(OptimizerError::InvalidSearch(format!(
                "mutation_rate {} is not a probability",
                config.mutation_rate
            )));
        }
        if !penalty_weight.is_finite() {
            return Err(OptimizerError::InvalidSearch(format!(
                "penalty_weight {penalty_weight} is not finite"
            )));
        }

        let pool = RatioPool::new(config.ratio_step);
        if pool.is_empty() {
            return Err(OptimizerError::EmptyRatioPool(config.ratio_step));
        }

        let material_count = table.len();
        let evaluator =
            FitnessEvaluator::new(table, oracle, Constraints::default(), penalty_weight);
        Ok(Self {
            config,
            pool,
            evaluator,
            material_count,
        })
    }

    pub fn from_config(
        table: Arc<MaterialTable>,
        oracle: Arc<PredictionOracle>,
        config: &OptimizerConfig,
    ) -> Result<Self, OptimizerError> {
        Self::new(
            table,
            oracle,
            config.search.clone(),
            config.fitness.penalty_weight,
        )
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn ratio_pool(&self) -> &RatioPool {
        &self.pool
    }

    /// Run the search to its generation limit.
    ///
    /// `cancel` is polled at the top of every generation, before any
    /// evaluation; once it returns true the run ends with `Aborted`.
    pub fn run<F: Fn() -> bool>(
        &mut self,
        constraints: Constraints,
        cancel: F,
    ) -> Result<OptimizationOutcome, OptimizerError> {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        self.evaluator.reset(constraints);

        let mut seen = InitUniqueness::default();
        let mut unique = UniqueBlends::default();
        let mut stagnation = StagnationTracker::new(self.config.stagnation_threshold);
        let mut history = Vec::with_capacity(self.config.generations);
        let mut best: Option<Candidate> = None;

        info!(
            seed,
            population = self.config.population_size,
            generations = self.config.generations,
            materials = self.material_count,
            ratios = self.pool.len(),
            "Starting blend optimization"
        );

        let mut population = self.fresh_individuals(&mut rng, &mut seen, self.config.population_size)?;

        for generation in 1..=self.config.generations {
            if cancel() {
                info!(generation, "Optimization stopped by cancellation request");
                return Ok(OptimizationOutcome::Aborted);
            }

            let mut ranked = self.rank(population)?;
            let Some(&(leader, leader_eval)) = ranked.first() else {
                return Err(OptimizerError::NoSolution);
            };

            if stagnation.observe(leader_eval.score) {
                best = Some(leader);
                info!(generation, score = leader_eval.score, "New best blend");
            }
            let mean_score =
                ranked.iter().map(|(_, e)| e.score).sum::<f64>() / ranked.len() as f64;

            let injected = stagnation.take_injection();
            if injected {
                info!(generation, "Injecting random individuals to increase diversity");
                ranked.truncate(self.config.elite_size);
                let refill = self.config.population_size - ranked.len();
                let fresh = self.fresh_individuals(&mut rng, &mut seen, refill)?;
                let scores = self.evaluator.evaluate_all(&fresh, self.config.parallel)?;
                ranked.extend(fresh.into_iter().zip(scores));
            }

            if let Some(&(head, _)) = ranked.first() {
                unique.record(head);
            }

            let stats = GenerationStats {
                generation,
                best_score: leader_eval.score,
                best_cost: leader_eval.cost,
                best_penalty: leader_eval.penalty,
                mean_score,
                best_ever_score: stagnation.best(),
                unique_blends: unique.len(),
                diversity_injected: injected,
            };
            debug!(
                generation,
                best = stats.best_score,
                penalty = stats.best_penalty,
                mean = stats.mean_score,
                unique = stats.unique_blends,
                "Generation complete"
            );
            history.push(stats);

            population = self.reproduce(&mut rng, &ranked);
        }

        let best = best.ok_or(OptimizerError::NoSolution)?;
        let best_blend = self.evaluator.recommendation(&best)?;
        let all_unique_blends = unique
            .blends()
            .iter()
            .map(|c| self.evaluator.recommendation(c))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            cost = best_blend.cost,
            penalty = best_blend.penalty,
            unique_blends = all_unique_blends.len(),
            evaluations = self.evaluator.evaluations(),
            "Optimization completed"
        );

        Ok(OptimizationOutcome::Completed(Box::new(OptimizationReport {
            best: best_blend,
            all_unique_blends,
            generations_run: history.len(),
            history,
            evaluations: self.evaluator.evaluations(),
            seed,
            generated_at: chrono::Utc::now(),
        })))
    }

    /// Score and stably sort ascending by score.
    fn rank(&mut self, population: Vec<Candidate>) -> Result<Ranked, OptimizerError> {
        let scores = self.evaluator.evaluate_all(&population, self.config.parallel)?;
        let mut ranked: Ranked = population.into_iter().zip(scores).collect();
        ranked.sort_by(|a, b| a.1.score.total_cmp(&b.1.score));
        Ok(ranked)
    }

    /// Draw `count` individuals, retrying draws already issued this run.
    ///
    /// After `init_attempts` duplicate draws the last draw is accepted as is.
    fn fresh_individuals(
        &self,
        rng: &mut StdRng,
        seen: &mut InitUniqueness,
        count: usize,
    ) -> Result<Vec<Candidate>, OptimizerError> {
        let empty = || OptimizerError::EmptyRatioPool(self.pool.step());
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let mut accepted = None;
            for _ in 0..self.config.init_attempts {
                let c = random_candidate(rng, self.material_count, &self.pool).ok_or_else(empty)?;
                if seen.insert(&c) {
                    accepted = Some(c);
                    break;
                }
            }
            let c = match accepted {
                Some(c) => c,
                None => random_candidate(rng, self.material_count, &self.pool).ok_or_else(empty)?,
            };
            out.push(c);
        }
        Ok(out)
    }

    /// Elites carry over; the rest are bred from tournaments over the
    /// top-ranked slice.
    fn reproduce(&self, rng: &mut StdRng, ranked: &[(Candidate, Evaluation)]) -> Vec<Candidate> {
        let size = self.config.population_size;
        let mut next: Vec<Candidate> = ranked
            .iter()
            .take(self.config.elite_size)
            .map(|(c, _)| *c)
            .collect();

        let contenders = &ranked[..self.config.tournament_pool.min(ranked.len())];
        if contenders.is_empty() {
            return next;
        }
        while next.len() < size {
            let p1 = tournament(rng, contenders, self.config.tournament_size);
            let p2 = tournament(rng, contenders, self.config.tournament_size);
            let child = crossover(rng, p1, p2, self.material_count, &self.pool);
            next.push(mutate(
                rng,
                child,
                self.config.mutation_rate,
                self.material_count,
                &self.pool,
            ));
        }
        next
    }
}
