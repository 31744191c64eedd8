//! Staged prediction pipeline
//!
//! ```text
//! blend ─► weighted sums ─► engineered indices ─► proxy formulas
//!       ─► feature dictionary ─► column-wise min-max ─► per-target models
//! ```
//!
//! Artifacts live in one directory:
//!
//! - `scaler_colwise.json`: column-wise normaliser (optional)
//! - `<TARGET>_features.json`: ordered feature names for the target
//! - `<TARGET>_model.json`: single-target regression artifact
//! - `<TARGET>_scaler.json`: per-target scaler (optional)
//!
//! A target with missing assets, or whose model fails, predicts 0.0. Only
//! undecodable artifact files are hard errors.

mod engineering;
mod features;
mod weighting;

pub use engineering::{BasicityMode, EngineeredFeatures};
pub use features::{
    build_final_features, normalize, ColumnScaler, FeatureMap, ProxyFormulas,
    FINAL_FEATURE_ORDER, TARGET_COLUMNS,
};
pub use weighting::WeightedSums;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::artifact::{read_json, ArtifactError, RegressionArtifact};
use super::emissions::EmissionEstimates;
use super::normalizer::{MinMaxScaler, ScalerArtifact};
use super::Predictor;
use crate::types::{columns, MaterialTable};

/// Column-wise normaliser file name inside the artifact directory.
pub const COLUMN_SCALER_FILE: &str = "scaler_colwise.json";

/// Properties predicted by the staged pipeline, in prediction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StagedTarget {
    Cri,
    Csr,
    Vm,
    Ash,
}

impl StagedTarget {
    pub const ALL: [Self; 4] = [Self::Cri, Self::Csr, Self::Vm, Self::Ash];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cri => "CRI",
            Self::Csr => "CSR",
            Self::Vm => "VM",
            Self::Ash => "ASH",
        }
    }
}

impl fmt::Display for StagedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assets for one target. Any of them may be absent.
#[derive(Debug, Clone, Default)]
pub struct TargetAssets {
    pub features: Option<Vec<String>>,
    pub model: Option<Arc<dyn Predictor>>,
    pub scaler: Option<MinMaxScaler>,
}

/// Everything the staged pipeline computed for one blend.
#[derive(Debug, Clone, Serialize)]
pub struct StagedPrediction {
    pub weighted: WeightedSums,
    pub engineered: EngineeredFeatures,
    pub proxies: ProxyFormulas,
    pub final_features: FeatureMap,
    pub scaled_features: FeatureMap,
    pub predicted: BTreeMap<StagedTarget, f64>,
    pub emissions: EmissionEstimates,
}

#[derive(Debug, Clone, Default)]
pub struct StagedPipeline {
    column_scaler: Option<ColumnScaler>,
    targets: BTreeMap<StagedTarget, TargetAssets>,
    basicity: BasicityMode,
}

impl StagedPipeline {
    pub fn new(basicity: BasicityMode) -> Self {
        Self {
            basicity,
            ..Self::default()
        }
    }

    pub fn with_column_scaler(mut self, scaler: ColumnScaler) -> Self {
        self.column_scaler = Some(scaler);
        self
    }

    pub fn with_target(mut self, target: StagedTarget, assets: TargetAssets) -> Self {
        self.targets.insert(target, assets);
        self
    }

    pub fn basicity(&self) -> BasicityMode {
        self.basicity
    }

    pub fn target(&self, target: StagedTarget) -> Option<&TargetAssets> {
        self.targets.get(&target)
    }

    /// Load every artifact present in `dir`.
    pub fn load(dir: &Path, basicity: BasicityMode) -> Result<Self, ArtifactError> {
        if !dir.is_dir() {
            return Err(ArtifactError::Invalid(format!(
                "staged artifact directory not found: {}",
                dir.display()
            )));
        }
        info!(dir = %dir.display(), "Loading staged prediction artifacts");

        let mut pipeline = Self::new(basicity);

        let scaler_path = dir.join(COLUMN_SCALER_FILE);
        if scaler_path.exists() {
            let (scaler, feature_names) = ScalerArtifact::load(&scaler_path)?.into_parts();
            info!(columns = scaler.width(), "Column-wise scaler loaded");
            pipeline.column_scaler = Some(ColumnScaler {
                scaler,
                feature_names,
            });
        } else {
            warn!(
                dir = %dir.display(),
                "{COLUMN_SCALER_FILE} not found; column-wise normalisation will be skipped"
            );
        }

        for target in StagedTarget::ALL {
            let mut assets = TargetAssets::default();

            let features_path = dir.join(format!("{target}_features.json"));
            if features_path.exists() {
                let names: Vec<String> = read_json(&features_path)?;
                info!(%target, columns = names.len(), "Target feature list loaded");
                assets.features = Some(names);
            } else {
                warn!(%target, "{target}_features.json missing");
            }

            let scaler_path = dir.join(format!("{target}_scaler.json"));
            if scaler_path.exists() {
                let (scaler, _) = ScalerArtifact::load(&scaler_path)?.into_parts();
                info!(%target, "Target scaler loaded");
                assets.scaler = Some(scaler);
            }

            let model_path = dir.join(format!("{target}_model.json"));
            if model_path.exists() {
                let model = RegressionArtifact::load(&model_path)?;
                info!(%target, "Target model loaded");
                assets.model = Some(Arc::new(model));
            } else {
                warn!(%target, "{target}_model.json missing");
            }

            pipeline.targets.insert(target, assets);
        }

        Ok(pipeline)
    }

    /// Run every stage for `(material index, weight)` pairs.
    pub fn run(&self, table: &MaterialTable, blend: &[(usize, f64)]) -> StagedPrediction {
        let weighted = WeightedSums::compute(table, blend);
        let engineered = EngineeredFeatures::compute(&weighted, self.basicity);
        let proxies =
            ProxyFormulas::compute(weighted.sum(columns::VM), engineered.log_max_fluidity);
        let final_features = build_final_features(&weighted, &engineered, &proxies);
        let scaled_features = normalize(&final_features, self.column_scaler.as_ref());

        let predicted: BTreeMap<StagedTarget, f64> = StagedTarget::ALL
            .into_iter()
            .map(|t| (t, self.predict_target(t, &scaled_features)))
            .collect();
        let emissions = EmissionEstimates::from_weighted(&weighted);

        debug!(?predicted, "Staged prediction complete");
        StagedPrediction {
            weighted,
            engineered,
            proxies,
            final_features,
            scaled_features,
            predicted,
            emissions,
        }
    }

    /// Predict one target from the scaled dictionary; 0.0 on any failure.
    pub fn predict_target(&self, target: StagedTarget, scaled: &FeatureMap) -> f64 {
        let Some(TargetAssets {
            features: Some(features),
            model: Some(model),
            scaler,
        }) = self.targets.get(&target)
        else {
            warn!(%target, "Missing model or feature list; predicting 0.0");
            return 0.0;
        };

        let mut x: Vec<f64> = features
            .iter()
            .map(|name| scaled.get(name).unwrap_or(0.0))
            .collect();

        if let Some(scaler) = scaler {
            match scaler.transform(&x) {
                Some(scaled_x) => x = scaled_x,
                None => warn!(
                    %target,
                    expected = scaler.width(),
                    actual = x.len(),
                    "Target scaler does not fit; using unscaled features"
                ),
            }
        }

        match model.predict(&x) {
            Ok(y) => match y.first() {
                Some(v) => *v,
                None => {
                    error!(%target, "Model returned no output");
                    0.0
                }
            },
            Err(e) => {
                error!(%target, error = %e, "Model prediction failed");
                0.0
            }
        }
    }
}
