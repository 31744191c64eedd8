//! Config Validation Tests
//!
//! Typo detection on raw TOML and range validation of the parsed
//! `OptimizerConfig`, exercised independently from the search.

use coal_blend_optimizer::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use coal_blend_optimizer::config::{ConfigError, OptimizerConfig};
use coal_blend_optimizer::types::{Property, PropertyRange};
use coal_blend_optimizer::BasicityMode;

// ============================================================================
// Typo Detection Tests
// ============================================================================

#[test]
fn typo_in_search_key_warns_with_suggestion() {
    let toml_str = r#"
[search]
generatons = 40
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("generatons"));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("search.generations"));
}

#[test]
fn typo_in_constraint_name_warns() {
    let toml_str = r#"
[constraints.coke]
csrr = [60.0, 70.0]
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("constraints.coke.csr"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[search]
population_size = 60
generations = 20
mutation_rate = 0.3
seed = 7

[fitness]
penalty_weight = 1000.0

[prediction]
basicity = "weighted_average"

[constraints.blend]
ash = [6.0, 10.0]

[constraints.coke]
cri = [20.0, 26.0]
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(
        warnings.is_empty(),
        "Valid config should have 0 warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn unknown_section_warns() {
    let warnings = validate_unknown_keys("[telemetry]\nenabled = true\n");
    assert!(warnings.iter().any(|w| w.field == "telemetry"));
}

#[test]
fn empty_toml_produces_zero_warnings() {
    assert!(validate_unknown_keys("").is_empty());
}

#[test]
fn known_keys_cover_every_section() {
    let known = known_config_keys();
    for key in [
        "search.population_size",
        "search.parallel",
        "fitness.penalty_weight",
        "prediction.basicity",
        "prediction.staged_dir",
        "constraints.blend.csn",
        "constraints.coke.vm",
    ] {
        assert!(known.contains(key), "missing known key {key}");
    }
}

#[test]
fn suggest_correction_returns_none_for_garbage() {
    let known = known_config_keys();
    assert_eq!(suggest_correction("zzzzzzzzzzzzzzzzzz", &known), None);
}

// ============================================================================
// Range Validation Tests
// ============================================================================

#[test]
fn elite_larger_than_population_is_error() {
    let mut config = OptimizerConfig::default();
    config.search.population_size = 8;
    config.search.elite_size = 9;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("elite_size")));
}

#[test]
fn ratio_step_that_leaves_no_ratios_is_error() {
    let mut config = OptimizerConfig::default();
    config.search.ratio_step = 40;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("ratio_step")));
}

#[test]
fn mutation_rate_above_one_is_error() {
    let mut config = OptimizerConfig::default();
    config.search.mutation_rate = 1.5;
    assert!(config.validate().is_err());
}

#[test]
fn negative_penalty_weight_is_error() {
    let mut config = OptimizerConfig::default();
    config.fitness.penalty_weight = -1.0;
    assert!(config.validate().is_err());
}

#[test]
fn oversized_tournament_is_only_a_warning() {
    let mut config = OptimizerConfig::default();
    config.search.tournament_size = 80;
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty(), "{errors:?}");
    assert!(warnings.iter().any(|w| w.field == "search.tournament_size"));
}

#[test]
fn all_defaults_pass_validation() {
    let config = OptimizerConfig::default();
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty(), "Default config should have 0 range errors: {errors:?}");
    assert!(
        warnings.is_empty(),
        "Default config should have 0 range warnings: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
    assert!(config.validate().is_ok());
}

// ============================================================================
// Constraint Overrides
// ============================================================================

#[test]
fn unknown_constraint_name_is_rejected() {
    let toml_str = r#"
[constraints.blend]
moisture = [1.0, 2.0]
"#;
    let err = OptimizerConfig::from_toml_str(toml_str).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)), "{err}");
}

#[test]
fn inverted_constraint_range_is_rejected() {
    let toml_str = r#"
[constraints.coke]
csr = [75.0, 60.0]
"#;
    assert!(OptimizerConfig::from_toml_str(toml_str).is_err());
}

#[test]
fn blend_and_coke_ash_overrides_stay_separate() {
    let toml_str = r#"
[constraints.blend]
ash = [6.0, 9.0]
"#;
    let config = OptimizerConfig::from_toml_str(toml_str).unwrap();
    let constraints = config.constraints().unwrap();
    assert_eq!(constraints.get(Property::BlendAsh), Some(&PropertyRange::new(6.0, 9.0)));
    assert_eq!(constraints.get(Property::CokeAsh), Some(&PropertyRange::new(8.0, 12.0)));
}

// ============================================================================
// Config Roundtrip Tests
// ============================================================================

#[test]
fn config_roundtrip_preserves_values() {
    let mut original = OptimizerConfig::default();
    original.search.seed = Some(99);
    original.search.population_size = 64;
    original.fitness.penalty_weight = 1000.0;
    original.prediction.basicity = BasicityMode::WeightedAverage;
    original
        .constraints
        .coke
        .insert("cri".to_string(), (21.0, 27.0));

    let toml_str = original.to_toml().expect("Serialization should work");
    let roundtripped =
        OptimizerConfig::from_toml_str(&toml_str).expect("Deserialization should work");
    assert_eq!(roundtripped, original);
}

#[test]
fn save_and_load_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blend_config.toml");
    let mut config = OptimizerConfig::default();
    config.search.generations = 12;
    config.save_to_file(&path).unwrap();

    let loaded = OptimizerConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded.search.generations, 12);
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[search\npopulation_size = ").unwrap();

    let err = OptimizerConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(ref p, _) if p == &path), "{err}");
}
