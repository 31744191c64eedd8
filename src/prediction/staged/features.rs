//! Stages 3-5: proxy formulas, the fixed feature dictionary, and
//! column-wise normalisation.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{error, warn};

use super::engineering::EngineeredFeatures;
use super::weighting::WeightedSums;
use crate::prediction::normalizer::MinMaxScaler;
use crate::types::{columns, CoalCategory};

/// Feature dictionary keys in the order the staged models were trained on.
pub const FINAL_FEATURE_ORDER: [&str; 35] = [
    "HCC",
    "SHCC",
    "HFCC",
    "PCI",
    "WC",
    "CRI",
    "CSR",
    "ASH",
    "VM",
    "weighted_Ash",
    "weighted_V.M.",
    "weighted_F.C",
    "weighted_Total Sulphur",
    "weighted_Phosphorus",
    "weighted_HGI (ASTM)",
    "weighted_Rank",
    "weighted_Vitrinite %",
    "weighted_Liptinite",
    "weighted_Semi-Fusinite",
    "weighted_CSN/FSI",
    "weighted_Initial Softening Temp.",
    "weighted_CRI",
    "weighted_CSR",
    "weighted_C",
    "weighted_H",
    "weighted_N",
    "weighted_O",
    "weighted_S",
    "weighted_BI",
    "weighted_MBI",
    "weighted_CBI",
    "weighted_Log_Max_Fluidity",
    "CRI_direct",
    "CSR_from_CRI",
    "CSR_direct",
];

/// Raw target entries removed before normalisation.
pub const TARGET_COLUMNS: [&str; 4] = ["CRI", "CSR", "ASH", "VM"];

/// Dictionary keys backed directly by a weighted column sum.
const WEIGHTED_ALIASES: [(&str, &str); 23] = [
    ("CRI", columns::CRI),
    ("CSR", columns::CSR),
    ("ASH", columns::ASH),
    ("VM", columns::VM),
    ("weighted_Ash", columns::ASH),
    ("weighted_V.M.", columns::VM),
    ("weighted_F.C", columns::FC),
    ("weighted_Total Sulphur", columns::S),
    ("weighted_Phosphorus", columns::P),
    ("weighted_HGI (ASTM)", columns::HGI),
    ("weighted_Rank", columns::RANK),
    ("weighted_Vitrinite %", columns::VITRINITE),
    ("weighted_Liptinite", columns::LIPTINITE),
    ("weighted_Semi-Fusinite", columns::SEMI_FUSINITE),
    ("weighted_CSN/FSI", columns::CSN_FSI),
    ("weighted_Initial Softening Temp.", columns::INITIAL_SOFTENING_TEMP),
    ("weighted_CRI", columns::CRI),
    ("weighted_CSR", columns::CSR),
    ("weighted_C", columns::C),
    ("weighted_H", columns::H),
    ("weighted_N", columns::N),
    ("weighted_O", columns::O),
    ("weighted_S", columns::S),
];

/// Insertion-ordered `name -> value` map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMap(Vec<(String, f64)>);

impl FeatureMap {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(k, _)| k == name)
    }

    /// Insert or overwrite, keeping the original position on overwrite.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for FeatureMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Empirical CRI/CSR proxies.
///
/// Inputs are the weighted VM sum and the engineered (×100) log max
/// fluidity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProxyFormulas {
    pub cri_direct: f64,
    pub csr_from_cri: f64,
    pub csr_direct: f64,
}

impl ProxyFormulas {
    pub fn compute(vm: f64, lmf: f64) -> Self {
        let cri_direct = -16.48 + 8.16 * vm - 21.68 * lmf;
        Self {
            cri_direct,
            csr_from_cri: 94.19 - 1.15 * cri_direct,
            csr_direct: 95.76 - 2.50 * vm + 11.00 * lmf,
        }
    }
}

/// Assemble the dictionary in `FINAL_FEATURE_ORDER`.
///
/// The engineered log max fluidity replaces the raw weighted sum of the
/// recorded column.
pub fn build_final_features(
    weighted: &WeightedSums,
    engineered: &EngineeredFeatures,
    proxies: &ProxyFormulas,
) -> FeatureMap {
    let mut map = FeatureMap::default();
    for key in FINAL_FEATURE_ORDER {
        let value = if let Some(category) = CoalCategory::parse(key) {
            weighted.category(category)
        } else if let Some((_, column)) = WEIGHTED_ALIASES.iter().find(|(k, _)| *k == key) {
            weighted.sum(column)
        } else {
            match key {
                "weighted_BI" => engineered.basicity_index,
                "weighted_MBI" => engineered.modified_basicity_index,
                "weighted_CBI" => engineered.composition_balance_index,
                "weighted_Log_Max_Fluidity" => engineered.log_max_fluidity,
                "CRI_direct" => proxies.cri_direct,
                "CSR_from_CRI" => proxies.csr_from_cri,
                "CSR_direct" => proxies.csr_direct,
                _ => 0.0,
            }
        };
        map.insert(key, value);
    }
    map
}

/// Column-wise normaliser with its optional training column order.
#[derive(Debug, Clone)]
pub struct ColumnScaler {
    pub scaler: MinMaxScaler,
    pub feature_names: Option<Vec<String>>,
}

/// Drop the raw targets and min-max scale the rest.
///
/// Columns are taken in the scaler's training order when known, otherwise in
/// dictionary order. Columns the dictionary lacks are filled with the
/// training minimum. Keys outside the scaler's order are kept unscaled. With
/// no scaler, or a scaler that fits neither the row nor single values, the
/// features pass through unscaled.
pub fn normalize(features: &FeatureMap, scaler: Option<&ColumnScaler>) -> FeatureMap {
    let mut input = FeatureMap::default();
    for (k, v) in features.iter() {
        if !TARGET_COLUMNS.contains(&k) {
            input.insert(k, v);
        }
    }

    let Some(ColumnScaler {
        scaler,
        feature_names,
    }) = scaler
    else {
        warn!("Column-wise scaler not loaded; features left unscaled");
        return input;
    };

    let order: Vec<&str> = match feature_names {
        Some(names) => names
            .iter()
            .map(String::as_str)
            .filter(|n| !TARGET_COLUMNS.contains(n))
            .collect(),
        None => input.keys().collect(),
    };

    let row: Vec<f64> = order
        .iter()
        .enumerate()
        .map(|(i, name)| {
            input.get(name).unwrap_or_else(|| {
                if scaler.width() == order.len() {
                    scaler.data_min[i]
                } else {
                    0.0
                }
            })
        })
        .collect();

    let scaled_row = match scaler.transform(&row) {
        Some(scaled) => scaled,
        None if scaler.width() == 1 => {
            warn!(
                columns = order.len(),
                "Column-wise scaler expects 1 feature; scaling element-wise"
            );
            row.iter().map(|&x| scaler.scale(0, x)).collect()
        }
        None => {
            error!(
                expected = scaler.width(),
                actual = order.len(),
                "Column-wise scaling failed; features left unscaled"
            );
            return input;
        }
    };

    let mut scaled = FeatureMap::default();
    for (name, value) in order.iter().zip(scaled_row) {
        scaled.insert(*name, value);
    }
    for (k, v) in input.iter() {
        if !scaled.contains(k) {
            scaled.insert(k, v);
        }
    }
    scaled
}
