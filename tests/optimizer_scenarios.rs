//! End-to-end optimizer scenarios
//!
//! Small material tables with hand-built predictors whose optimum is known,
//! so the search result can be checked against it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use coal_blend_optimizer::config::SearchConfig;
use coal_blend_optimizer::types::{ConstraintOverrides, Property};
use coal_blend_optimizer::{
    Constraints, DirectPipeline, Material, MaterialTable, OptimizationReport, PredictionError,
    PredictionOracle, Predictor, SearchEngine,
};

/// Blend ash is read from feature 0; every other property is fixed inside
/// its default range. Coke outputs are fractions, as a trained model emits.
#[derive(Debug, Default)]
struct AshModel {
    calls: AtomicUsize,
}

impl Predictor for AshModel {
    fn predict(&self, features: &[f64]) -> Result<Vec<f64>, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![features[0], 25.0, 60.0, 6.0, 0.25, 0.65, 0.10, 0.01])
    }
}

fn table(rows: &[(&str, f64, f64)]) -> Arc<MaterialTable> {
    let materials = rows
        .iter()
        .map(|&(name, cost, ash)| Material {
            name: name.to_string(),
            cost,
            features: vec![ash, 1.2],
            category: None,
        })
        .collect();
    Arc::new(MaterialTable::new(vec!["Ash".into(), "N".into()], materials).unwrap())
}

fn search(seed: u64, generations: usize) -> SearchConfig {
    SearchConfig {
        generations,
        seed: Some(seed),
        ..SearchConfig::default()
    }
}

fn run(
    table: Arc<MaterialTable>,
    model: Arc<AshModel>,
    config: SearchConfig,
    penalty_weight: f64,
    constraints: Constraints,
) -> OptimizationReport {
    let direct = DirectPipeline::new(model, &table, 1).unwrap();
    let oracle = Arc::new(PredictionOracle::new(direct));
    let mut engine = SearchEngine::new(table, oracle, config, penalty_weight).unwrap();
    engine
        .run(constraints, || false)
        .unwrap()
        .into_report()
        .expect("run was not cancelled")
}

fn blend_ash(min: f64, max: f64) -> Constraints {
    let mut overrides = ConstraintOverrides::default();
    overrides.blend.insert("ash".into(), (min, max));
    Constraints::with_overrides(&overrides).unwrap()
}

#[test]
fn unreachable_band_drives_penalty_down_to_its_floor() {
    // Only M4 carries ash; the best reachable blend ash is 90, five short of
    // the band, so the smallest possible penalty is 25.
    let materials = table(&[
        ("M0", 100.0, 0.0),
        ("M1", 100.0, 0.0),
        ("M2", 100.0, 0.0),
        ("M3", 100.0, 0.0),
        ("M4", 100.0, 100.0),
    ]);
    let report = run(
        materials,
        Arc::new(AshModel::default()),
        search(17, 30),
        1.0,
        blend_ash(95.0, 100.0),
    );

    let first = &report.history[0];
    let last = report.history.last().unwrap();
    // Costs are equal, so the best score tracks the best penalty
    for pair in report.history.windows(2) {
        assert!(pair[1].best_score <= pair[0].best_score);
        assert!(pair[1].best_penalty <= pair[0].best_penalty);
    }
    let at_floor = (last.best_penalty - 25.0).abs() < 1e-9;
    assert!(
        last.best_penalty < first.best_penalty || at_floor,
        "penalty went from {} to {}",
        first.best_penalty,
        last.best_penalty
    );
    assert!(report.best.penalty >= 25.0 - 1e-9);
    assert!(report.best.penalty <= 100.0, "penalty {}", report.best.penalty);
    assert!(report
        .best
        .components
        .iter()
        .any(|c| c.name == "M4" && c.percentage >= 85));
}

#[test]
fn indifferent_properties_converge_to_the_cost_minimum() {
    // Cheapest possible blend: 90% M0 plus 5% each of M1 and M2 = 101.5
    let materials = table(&[
        ("M0", 100.0, 9.0),
        ("M1", 110.0, 9.0),
        ("M2", 120.0, 9.0),
        ("M3", 130.0, 9.0),
        ("M4", 140.0, 9.0),
    ]);
    let report = run(
        materials,
        Arc::new(AshModel::default()),
        search(3, 40),
        1.0,
        Constraints::default(),
    );

    assert_eq!(report.best.penalty, 0.0);
    assert!(report.best.cost >= 101.5 - 1e-9);
    assert!(report.best.cost < 104.0, "cost {}", report.best.cost);
}

#[test]
fn single_point_band_is_met_at_the_cost_minimum() {
    // Ash must be exactly 0. Only blends of the ash-free M0..M2 reach it,
    // and the cheapest of those (90% M0, 5% M1, 5% M2 = 101.5) is also the
    // unconstrained cost minimum.
    let materials = table(&[
        ("M0", 100.0, 0.0),
        ("M1", 110.0, 0.0),
        ("M2", 120.0, 0.0),
        ("M3", 130.0, 20.0),
        ("M4", 140.0, 20.0),
    ]);
    let report = run(
        materials,
        Arc::new(AshModel::default()),
        search(3, 60),
        1.0,
        blend_ash(0.0, 0.0),
    );

    assert_eq!(report.best.penalty, 0.0);
    assert_eq!(report.best.predicted.get(Property::BlendAsh), 0.0);
    assert!(report.best.cost >= 101.5 - 1e-9);
    assert!(report.best.cost < 104.0, "cost {}", report.best.cost);
}

#[test]
fn identical_twin_loses_to_the_cheaper_copy() {
    let materials = table(&[
        ("Cheap", 100.0, 9.0),
        ("Twin", 150.0, 9.0),
        ("B", 120.0, 9.0),
        ("C", 130.0, 9.0),
        ("D", 140.0, 9.0),
    ]);
    let report = run(
        materials,
        Arc::new(AshModel::default()),
        search(11, 40),
        1.0,
        Constraints::default(),
    );

    let share = |name: &str| {
        report
            .best
            .components
            .iter()
            .find(|c| c.name == name)
            .map_or(0, |c| c.percentage)
    };
    assert!(share("Cheap") > share("Twin"));
    assert!(share("Cheap") >= 50, "{:?}", report.best.components);
}

#[test]
fn penalty_weight_changes_the_preferred_blend() {
    // Dirty coals are cheap but push blend ash to 17 (penalty 4 at most);
    // clean coals cost four times as much.
    let rows = [
        ("Dirty1", 50.0, 17.0),
        ("Dirty2", 52.0, 17.0),
        ("Dirty3", 54.0, 17.0),
        ("Clean1", 200.0, 10.0),
        ("Clean2", 205.0, 10.0),
        ("Clean3", 210.0, 10.0),
    ];
    let light = run(
        table(&rows),
        Arc::new(AshModel::default()),
        search(5, 30),
        1.0,
        Constraints::default(),
    );
    let heavy = run(
        table(&rows),
        Arc::new(AshModel::default()),
        search(5, 30),
        1000.0,
        Constraints::default(),
    );

    // x1 trades the penalty for cost; x1000 pays to get inside the band
    assert!(light.best.penalty > 0.0);
    assert!(heavy.best.penalty < light.best.penalty);
    assert!(heavy.best.cost > light.best.cost);
    assert!(heavy.best.predicted.get(Property::BlendAsh) < 15.5);
}

#[test]
fn cancellation_before_first_generation_evaluates_nothing() {
    let materials = table(&[
        ("M0", 100.0, 9.0),
        ("M1", 110.0, 9.0),
        ("M2", 120.0, 9.0),
    ]);
    let model = Arc::new(AshModel::default());
    let direct = DirectPipeline::new(model.clone(), &materials, 1).unwrap();
    let oracle = Arc::new(PredictionOracle::new(direct));
    let mut engine = SearchEngine::new(materials, oracle, search(1, 10), 1.0).unwrap();

    let outcome = engine.run(Constraints::default(), || true).unwrap();
    assert!(outcome.is_aborted());
    assert!(outcome.report().is_none());
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn parallel_and_sequential_runs_agree_under_one_seed() {
    let rows = [
        ("M0", 100.0, 20.0),
        ("M1", 110.0, 4.0),
        ("M2", 120.0, 12.0),
        ("M3", 90.0, 30.0),
        ("M4", 140.0, 8.0),
        ("M5", 95.0, 16.0),
    ];
    let par = run(
        table(&rows),
        Arc::new(AshModel::default()),
        SearchConfig {
            parallel: true,
            ..search(23, 15)
        },
        1.0,
        Constraints::default(),
    );
    let seq = run(
        table(&rows),
        Arc::new(AshModel::default()),
        SearchConfig {
            parallel: false,
            ..search(23, 15)
        },
        1.0,
        Constraints::default(),
    );

    assert_eq!(par.best, seq.best);
    assert_eq!(par.history, seq.history);
    assert_eq!(par.all_unique_blends, seq.all_unique_blends);
    assert_eq!(par.evaluations, seq.evaluations);
}

#[test]
fn unique_blends_are_distinct_and_scored() {
    let materials = table(&[
        ("M0", 100.0, 20.0),
        ("M1", 110.0, 4.0),
        ("M2", 120.0, 12.0),
        ("M3", 90.0, 30.0),
        ("M4", 140.0, 8.0),
    ]);
    let report = run(
        materials,
        Arc::new(AshModel::default()),
        search(8, 20),
        1.0,
        Constraints::default(),
    );

    let mut keys: Vec<_> = report
        .all_unique_blends
        .iter()
        .map(|b| {
            let mut parts: Vec<_> = b
                .components
                .iter()
                .map(|c| (c.name.clone(), c.percentage))
                .collect();
            parts.sort();
            parts
        })
        .collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total);
    assert!(report
        .all_unique_blends
        .iter()
        .all(|b| b.components.iter().map(|c| u32::from(c.percentage)).sum::<u32>() == 100));
    assert_eq!(report.history.last().unwrap().unique_blends, total);
}

#[test]
fn duplicate_material_names_keep_their_own_rows() {
    let materials = table(&[
        ("Dup", 100.0, 9.0),
        ("Dup", 105.0, 9.0),
        ("B", 120.0, 9.0),
        ("C", 130.0, 9.0),
        ("D", 140.0, 9.0),
    ]);
    let rows = materials.clone();
    let report = run(
        materials,
        Arc::new(AshModel::default()),
        search(13, 20),
        1.0,
        Constraints::default(),
    );

    for blend in std::iter::once(&report.best).chain(&report.all_unique_blends) {
        let weights = blend.weights();
        let mut indices: Vec<usize> = weights.iter().map(|&(i, _)| i).collect();
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 3, "{:?}", blend.components);
        for c in &blend.components {
            assert_eq!(rows.get(c.index).map(|m| m.name.as_str()), Some(c.name.as_str()));
        }
    }
}
