//! Optimization outputs: recommended blends, generation history, run outcome

use serde::{Deserialize, Serialize};

use super::constraints::{Constraints, Property};

/// The eight predicted properties of a blend, percent-scaled where the
/// model emits fractions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictedProperties {
    pub ash: f64,
    pub vm: f64,
    pub fc: f64,
    pub csn: f64,
    pub cri: f64,
    pub csr: f64,
    pub ash_final: f64,
    pub vm_final: f64,
}

impl PredictedProperties {
    /// Build from a vector in model output order. Missing trailing entries are 0.
    pub fn from_outputs(outputs: &[f64]) -> Self {
        let at = |p: Property| outputs.get(p.output_index()).copied().unwrap_or(0.0);
        Self {
            ash: at(Property::BlendAsh),
            vm: at(Property::BlendVm),
            fc: at(Property::BlendFc),
            csn: at(Property::BlendCsn),
            cri: at(Property::CokeCri),
            csr: at(Property::CokeCsr),
            ash_final: at(Property::CokeAsh),
            vm_final: at(Property::CokeVm),
        }
    }

    pub fn get(&self, property: Property) -> f64 {
        match property {
            Property::BlendAsh => self.ash,
            Property::BlendVm => self.vm,
            Property::BlendFc => self.fc,
            Property::BlendCsn => self.csn,
            Property::CokeCri => self.cri,
            Property::CokeCsr => self.csr,
            Property::CokeAsh => self.ash_final,
            Property::CokeVm => self.vm_final,
        }
    }

    pub fn to_outputs(&self) -> [f64; 8] {
        Property::ALL.map(|p| self.get(p))
    }

    /// Properties that fall outside their allowed range.
    pub fn violations(&self, constraints: &Constraints) -> Vec<Property> {
        constraints
            .iter()
            .filter(|(p, range)| !range.contains(self.get(*p)))
            .map(|(p, _)| p)
            .collect()
    }
}

/// One material's share of a recommended blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendComponent {
    /// Row in the material table the run was given
    pub index: usize,
    pub name: String,
    pub percentage: u8,
}

/// A fully evaluated blend as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendRecommendation {
    pub components: Vec<BlendComponent>,
    pub predicted: PredictedProperties,
    pub cost: f64,
    pub penalty: f64,
    pub score: f64,
}

impl BlendRecommendation {
    /// (table row, percentage) pairs, as the staged pipeline takes them.
    pub fn weights(&self) -> Vec<(usize, f64)> {
        self.components
            .iter()
            .map(|c| (c.index, f64::from(c.percentage)))
            .collect()
    }
}

/// Per-generation search statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// 1-based generation number
    pub generation: usize,
    /// Best score in this generation's sorted population
    pub best_score: f64,
    pub best_cost: f64,
    pub best_penalty: f64,
    pub mean_score: f64,
    /// Best score seen across the run so far
    pub best_ever_score: f64,
    pub unique_blends: usize,
    pub diversity_injected: bool,
}

/// Result of a run that reached its generation limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub best: BlendRecommendation,
    /// Every distinct best-of-generation blend, in order of discovery.
    pub all_unique_blends: Vec<BlendRecommendation>,
    pub history: Vec<GenerationStats>,
    pub generations_run: usize,
    pub evaluations: usize,
    pub seed: u64,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

impl OptimizationReport {
    pub fn total_cost(&self) -> f64 {
        self.best.cost
    }
}

/// Either a finished report or the cancellation sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OptimizationOutcome {
    Completed(Box<OptimizationReport>),
    Aborted,
}

impl OptimizationOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    pub fn report(&self) -> Option<&OptimizationReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Aborted => None,
        }
    }

    pub fn into_report(self) -> Option<OptimizationReport> {
        match self {
            Self::Completed(report) => Some(*report),
            Self::Aborted => None,
        }
    }
}
