//! Stage 2: engineered coal indices
//!
//! Basicity index (BI), modified basicity index (MBI), vitrinite
//! reflectance ratios (VR7..VR19), composition balance index (CBI) and log
//! max fluidity. BI, MBI, CBI and log max fluidity are reported ×100.

use serde::{Deserialize, Serialize};

use super::weighting::WeightedSums;
use crate::types::columns;

const BASIC_OXIDES: [&str; 5] = [
    columns::FE2O3,
    columns::CAO,
    columns::MGO,
    columns::NA2O,
    columns::K2O,
];
const ACIDIC_OXIDES: [&str; 3] = [columns::SIO2, columns::AL2O3, columns::TIO2];

/// How the basicity index aggregates oxide values across the blend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicityMode {
    /// Plain sums over the blend members, ignoring percentages.
    #[default]
    UnweightedSum,
    /// Weighted averages of each oxide.
    WeightedAverage,
}

/// Engineered indices for one blend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineeredFeatures {
    pub basicity_index: f64,
    pub modified_basicity_index: f64,
    pub composition_balance_index: f64,
    pub log_max_fluidity: f64,
    /// `(VRk, avg(Vk) / divisor)` for k in 7..=19.
    pub reflectance_ratios: Vec<(String, f64)>,
}

impl EngineeredFeatures {
    pub fn compute(w: &WeightedSums, mode: BasicityMode) -> Self {
        let bi = basicity_index(w, mode);

        let ash = w.average(columns::ASH);
        let vm = w.average(columns::VM);
        let denom = 100.0 - vm;
        let mbi = if denom != 0.0 {
            (ash * 100.0) / denom * bi
        } else {
            0.0
        };

        let reflectance_ratios: Vec<(String, f64)> = columns::REFLECTANCE_BANDS
            .iter()
            .map(|(band, divisor)| (format!("VR{}", &band[1..]), w.average(band) / divisor))
            .collect();
        let vr_total: f64 = reflectance_ratios.iter().map(|(_, v)| v).sum();

        let cbi = if w.coking_weight() > 0.0
            && vr_total != 0.0
            && w.has(columns::INERTINITE)
            && w.has(columns::MINERALS)
        {
            (w.average(columns::INERTINITE) + w.average(columns::MINERALS)) / vr_total
        } else {
            0.0
        };

        Self {
            basicity_index: bi * 100.0,
            modified_basicity_index: mbi * 100.0,
            composition_balance_index: cbi * 100.0,
            log_max_fluidity: log_max_fluidity(w) * 100.0,
            reflectance_ratios,
        }
    }
}

fn basicity_index(w: &WeightedSums, mode: BasicityMode) -> f64 {
    let total = |names: &[&str]| -> f64 {
        names
            .iter()
            .map(|c| match mode {
                BasicityMode::UnweightedSum => w.plain_sum(c),
                BasicityMode::WeightedAverage => w.average(c),
            })
            .sum()
    };
    let den = total(&ACIDIC_OXIDES);
    if den != 0.0 {
        total(&BASIC_OXIDES) / den
    } else {
        0.0
    }
}

/// Average of the recorded log fluidity, else the log of average max
/// fluidity, else 0.
fn log_max_fluidity(w: &WeightedSums) -> f64 {
    let lmf_sum = w.sum(columns::LOG_MAX_FLUIDITY);
    if lmf_sum != 0.0 && w.total_weight > 0.0 {
        return lmf_sum / w.total_weight;
    }
    let mf = w.average(columns::MAX_FLUIDITY);
    if mf > 0.0 {
        mf.ln()
    } else {
        0.0
    }
}
