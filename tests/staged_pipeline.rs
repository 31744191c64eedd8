//! Staged pipeline loaded from an artifact directory on disk

use std::path::Path;
use std::sync::Arc;

use coal_blend_optimizer::prediction::{StagedTarget, COLUMN_SCALER_FILE};
use coal_blend_optimizer::{
    BasicityMode, DirectPipeline, Material, MaterialTable, PredictionOracle, RegressionArtifact,
    StagedPipeline,
};

fn write(dir: &Path, name: &str, json: &str) {
    std::fs::write(dir.join(name), json).unwrap();
}

fn table() -> MaterialTable {
    let row = |name: &str, ash: f64, vm: f64| Material {
        name: name.to_string(),
        cost: 100.0,
        features: vec![ash, vm, 1.5],
        category: None,
    };
    MaterialTable::new(
        vec!["Ash".into(), "VM".into(), "N".into()],
        vec![row("A", 10.0, 30.0), row("B", 8.0, 20.0), row("C", 6.0, 25.0)],
    )
    .unwrap()
}

/// CRI has a working model; CSR lacks a model; VM's model expects two
/// inputs but is given one feature; ASH has no artifacts at all.
fn artifact_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path();
    write(
        p,
        COLUMN_SCALER_FILE,
        r#"{"scaler": {"data_min": [0.0, 0.0], "data_max": [1000.0, 5000.0]},
            "feature_names": ["weighted_Ash", "weighted_V.M."]}"#,
    );
    write(p, "CRI_features.json", r#"["weighted_Ash"]"#);
    write(
        p,
        "CRI_model.json",
        r#"{"kind": "linear", "coefficients": [[10.0]], "intercepts": [1.0]}"#,
    );
    write(p, "CSR_features.json", r#"["weighted_V.M."]"#);
    write(p, "VM_features.json", r#"["weighted_Ash"]"#);
    write(
        p,
        "VM_model.json",
        r#"{"kind": "linear", "coefficients": [[1.0, 1.0]], "intercepts": [0.0]}"#,
    );
    dir
}

const BLEND: [(usize, f64); 3] = [(0, 50.0), (1, 30.0), (2, 20.0)];

#[test]
fn staged_run_uses_raw_weighted_sums_and_the_column_scaler() {
    let dir = artifact_dir();
    let pipeline = StagedPipeline::load(dir.path(), BasicityMode::UnweightedSum).unwrap();
    let out = pipeline.run(&table(), &BLEND);

    assert!((out.weighted.total_weight - 100.0).abs() < 1e-9);
    assert!((out.final_features.get("weighted_Ash").unwrap() - 860.0).abs() < 1e-9);
    assert!((out.scaled_features.get("weighted_Ash").unwrap() - 0.86).abs() < 1e-9);
    assert!((out.scaled_features.get("weighted_V.M.").unwrap() - 0.52).abs() < 1e-9);
    // Raw targets never reach the models
    assert!(!out.scaled_features.contains("CRI"));
    assert!(!out.scaled_features.contains("VM"));
    assert_eq!(out.final_features.len(), 35);
}

#[test]
fn each_target_fails_soft_on_its_own() {
    let dir = artifact_dir();
    let pipeline = StagedPipeline::load(dir.path(), BasicityMode::UnweightedSum).unwrap();
    let out = pipeline.run(&table(), &BLEND);

    assert!((out.predicted[&StagedTarget::Cri] - 9.6).abs() < 1e-9);
    assert_eq!(out.predicted[&StagedTarget::Csr], 0.0);
    assert_eq!(out.predicted[&StagedTarget::Vm], 0.0);
    assert_eq!(out.predicted[&StagedTarget::Ash], 0.0);
}

#[test]
fn missing_column_scaler_passes_features_through() {
    let dir = artifact_dir();
    std::fs::remove_file(dir.path().join(COLUMN_SCALER_FILE)).unwrap();
    let pipeline = StagedPipeline::load(dir.path(), BasicityMode::UnweightedSum).unwrap();
    let out = pipeline.run(&table(), &BLEND);

    assert!((out.scaled_features.get("weighted_Ash").unwrap() - 860.0).abs() < 1e-9);
    assert!((out.predicted[&StagedTarget::Cri] - 8601.0).abs() < 1e-6);
}

#[test]
fn undecodable_model_is_a_load_error() {
    let dir = artifact_dir();
    write(dir.path(), "CSR_model.json", "{ not json");
    assert!(StagedPipeline::load(dir.path(), BasicityMode::UnweightedSum).is_err());
}

#[test]
fn missing_directory_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let gone = dir.path().join("nope");
    assert!(StagedPipeline::load(&gone, BasicityMode::WeightedAverage).is_err());
}

#[test]
fn oracle_explains_a_blend_with_the_staged_pipeline() {
    let dir = artifact_dir();
    write(
        dir.path(),
        "direct.json",
        r#"{"kind": "linear",
            "feature_names": ["Ash", "VM"],
            "coefficients": [[1,0],[0,1],[0,0],[0,0],[0,0],[0,0],[0,0],[0,0]],
            "intercepts": [0, 0, 60, 6, 0.25, 0.65, 0.1, 0.01]}"#,
    );
    let table = table();
    let model = RegressionArtifact::load(&dir.path().join("direct.json")).unwrap();
    let direct = DirectPipeline::new(Arc::new(model), &table, 1).unwrap();
    let staged = StagedPipeline::load(dir.path(), BasicityMode::UnweightedSum).unwrap();
    let oracle = PredictionOracle::new(direct).with_staged(staged);

    let predicted = oracle.predict(&[8.6, 26.0, 1.5]).unwrap();
    assert!((predicted.ash - 8.6).abs() < 1e-9);
    assert!((predicted.csr - 65.0).abs() < 1e-9);

    let explanation = oracle.explain(&table, &BLEND).unwrap();
    assert!((explanation.predicted[&StagedTarget::Cri] - 9.6).abs() < 1e-9);
}
