//! Config validation: unknown-key detection with Levenshtein suggestions
//! and parameter range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::OptimizerConfig;
use crate::types::Constraints;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `OptimizerConfig`.
///
/// Kept by hand in step with the structs in `optimizer_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [search]
        "search",
        "search.population_size",
        "search.generations",
        "search.mutation_rate",
        "search.elite_size",
        "search.tournament_size",
        "search.tournament_pool",
        "search.stagnation_threshold",
        "search.init_attempts",
        "search.ratio_step",
        "search.seed",
        "search.parallel",
        // [fitness]
        "fitness",
        "fitness.penalty_weight",
        // [prediction]
        "prediction",
        "prediction.basicity",
        "prediction.drop_trailing",
        "prediction.staged_dir",
        // [constraints]
        "constraints",
        "constraints.blend",
        "constraints.blend.ash",
        "constraints.blend.vm",
        "constraints.blend.fc",
        "constraints.blend.csn",
        "constraints.coke",
        "constraints.coke.cri",
        "constraints.coke.csr",
        "constraints.coke.ash",
        "constraints.coke.vm",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// A table `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest known key within edit distance 3, ties broken alphabetically.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(d, _)| *d <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Warn about every key of `raw_toml` that the config does not define.
///
/// Never fails; parse errors are left to serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Returns (errors, warnings). Errors are values the optimizer cannot run
/// with; warnings are legal but probably unintended.
pub fn validate_ranges(config: &OptimizerConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let s = &config.search;

    if s.population_size == 0 {
        errors.push("search.population_size must be > 0".to_string());
    }
    if s.generations == 0 {
        errors.push("search.generations must be > 0".to_string());
    }
    if !(0.0..=1.0).contains(&s.mutation_rate) {
        errors.push(format!(
            "search.mutation_rate = {} must be a probability in [0, 1]",
            s.mutation_rate
        ));
    }
    if s.elite_size > s.population_size {
        errors.push(format!(
            "search.elite_size ({}) cannot exceed search.population_size ({})",
            s.elite_size, s.population_size
        ));
    }
    if s.tournament_size == 0 {
        errors.push("search.tournament_size must be > 0".to_string());
    }
    if s.tournament_pool == 0 {
        errors.push("search.tournament_pool must be > 0".to_string());
    }
    let step = s.ratio_step;
    if step == 0 || 100 % step != 0 || u32::from(step) * 3 > 100 {
        errors.push(format!(
            "search.ratio_step = {step} must divide 100 and leave room for three positive parts"
        ));
    }

    let w = config.fitness.penalty_weight;
    if !w.is_finite() || w < 0.0 {
        errors.push(format!("fitness.penalty_weight = {w} must be finite and >= 0"));
    }

    if let Err(e) = Constraints::with_overrides(&config.constraints) {
        errors.push(format!("constraints: {e}"));
    }

    if s.elite_size == s.population_size && s.population_size > 0 {
        warnings.push(ValidationWarning {
            field: "search.elite_size".to_string(),
            message: "search.elite_size equals population_size; no offspring will be bred"
                .to_string(),
            suggestion: None,
        });
    }
    if s.tournament_size > s.tournament_pool.min(s.population_size) {
        warnings.push(ValidationWarning {
            field: "search.tournament_size".to_string(),
            message: format!(
                "search.tournament_size ({}) exceeds the selection pool; tournaments will use the whole pool",
                s.tournament_size
            ),
            suggestion: None,
        });
    }
    if s.init_attempts == 0 {
        warnings.push(ValidationWarning {
            field: "search.init_attempts".to_string(),
            message: "search.init_attempts = 0 disables duplicate avoidance".to_string(),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("ratio_step", "ratio_step"), 0);
        assert_eq!(levenshtein("generatons", "generations"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [constraints.coke]
            cri = [20.0, 28.0]
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"constraints".to_string()));
        assert!(keys.contains(&"constraints.coke".to_string()));
        assert!(keys.contains(&"constraints.coke.cri".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys(
            r#"
[search]
mutaton_rate = 0.3
"#,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "search.mutaton_rate");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("search.mutation_rate"));
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let warnings = validate_unknown_keys(
            r#"
[search]
population_size = 60
seed = 1

[fitness]
penalty_weight = 1000.0

[constraints.blend]
ash = [6.0, 12.0]
"#,
        );
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key", &known).is_none());
    }

    #[test]
    fn test_defaults_clean() {
        let (errors, warnings) = validate_ranges(&OptimizerConfig::default());
        assert!(errors.is_empty(), "{errors:?}");
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_ratio_step_must_divide_hundred() {
        let mut config = OptimizerConfig::default();
        config.search.ratio_step = 7;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("ratio_step")));

        config.search.ratio_step = 50;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("ratio_step")));
    }

    #[test]
    fn test_elite_larger_than_population() {
        let mut config = OptimizerConfig::default();
        config.search.elite_size = 150;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("elite_size")));
    }

    #[test]
    fn test_inverted_constraint_is_an_error() {
        let mut config = OptimizerConfig::default();
        config.constraints.coke.insert("cri".into(), (30.0, 20.0));
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.starts_with("constraints")));
    }

    #[test]
    fn test_oversized_tournament_warns() {
        let mut config = OptimizerConfig::default();
        config.search.population_size = 4;
        config.search.elite_size = 1;
        let (errors, warnings) = validate_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.field == "search.tournament_size"));
    }
}
