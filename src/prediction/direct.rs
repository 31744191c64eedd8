//! Direct pipeline: composed blend vector → multi-output model

use std::ops::Range;
use std::sync::Arc;

use super::{PredictionError, Predictor};
use crate::types::{MaterialTable, PredictedProperties};

/// Number of properties the direct model predicts.
pub const PREDICTED_OUTPUTS: usize = 8;

/// Outputs the model emits as fractions; they are reported in percent.
pub const PERCENT_SCALED_OUTPUTS: Range<usize> = 4..8;

/// Selects the model's input columns from the blend vector and applies the
/// fixed post-processing.
#[derive(Debug, Clone)]
pub struct DirectPipeline {
    model: Arc<dyn Predictor>,
    input_columns: Vec<usize>,
}

impl DirectPipeline {
    /// Bind a model to a material table.
    ///
    /// When the model declares its training feature names, those columns are
    /// picked from the table by name. Otherwise every column except the last
    /// `drop_trailing` composition fields is used, in table order.
    pub fn new(
        model: Arc<dyn Predictor>,
        table: &MaterialTable,
        drop_trailing: usize,
    ) -> Result<Self, PredictionError> {
        let input_columns = match model.feature_names() {
            Some(names) => names
                .iter()
                .map(|name| {
                    table
                        .column(name)
                        .ok_or_else(|| PredictionError::MissingColumn(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => {
                let width = table.width();
                if drop_trailing >= width {
                    return Err(PredictionError::TooFewColumns {
                        width,
                        dropped: drop_trailing,
                    });
                }
                (0..width - drop_trailing).collect()
            }
        };

        if let Some(expected) = model.input_width() {
            if expected != input_columns.len() {
                return Err(PredictionError::InputWidth {
                    expected,
                    actual: input_columns.len(),
                });
            }
        }
        if let Some(outputs) = model.output_width() {
            if outputs < PREDICTED_OUTPUTS {
                return Err(PredictionError::OutputWidth {
                    expected: PREDICTED_OUTPUTS,
                    actual: outputs,
                });
            }
        }

        Ok(Self {
            model,
            input_columns,
        })
    }

    pub fn input_columns(&self) -> &[usize] {
        &self.input_columns
    }

    /// Raw model outputs with the fraction-to-percent rescale applied.
    pub fn predict_raw(&self, blend: &[f64]) -> Result<Vec<f64>, PredictionError> {
        let x = self
            .input_columns
            .iter()
            .map(|&c| {
                blend.get(c).copied().ok_or(PredictionError::InputWidth {
                    expected: c + 1,
                    actual: blend.len(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut outputs = self.model.predict(&x)?;
        if outputs.len() < PREDICTED_OUTPUTS {
            return Err(PredictionError::OutputWidth {
                expected: PREDICTED_OUTPUTS,
                actual: outputs.len(),
            });
        }
        for v in &mut outputs[PERCENT_SCALED_OUTPUTS] {
            *v *= 100.0;
        }
        Ok(outputs)
    }

    pub fn predict(&self, blend: &[f64]) -> Result<PredictedProperties, PredictionError> {
        self.predict_raw(blend)
            .map(|outputs| PredictedProperties::from_outputs(&outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::RegressionArtifact;
    use crate::types::Material;

    fn table(columns: &[&str]) -> MaterialTable {
        MaterialTable::new(
            columns.iter().map(|c| (*c).to_string()).collect(),
            vec![Material {
                name: "A".into(),
                cost: 1.0,
                features: (0..columns.len()).map(|i| i as f64).collect(),
                category: None,
            }],
        )
        .unwrap()
    }

    /// Eight outputs; output k = input 0 + k.
    fn model(width: usize, names: Option<Vec<String>>) -> Arc<dyn Predictor> {
        let coefficients = (0..8)
            .map(|_| {
                let mut row = vec![0.0; width];
                row[0] = 1.0;
                row
            })
            .collect();
        Arc::new(RegressionArtifact::Linear {
            feature_names: names,
            coefficients,
            intercepts: (0..8).map(f64::from).collect(),
        })
    }

    #[test]
    fn drops_trailing_field_and_rescales_coke_outputs() {
        let t = table(&["Ash", "VM", "N"]);
        let pipeline = DirectPipeline::new(model(2, None), &t, 1).unwrap();
        assert_eq!(pipeline.input_columns(), &[0, 1]);

        let out = pipeline.predict_raw(&[2.0, 3.0, 99.0]).unwrap();
        assert_eq!(&out[..4], &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(&out[4..], &[600.0, 700.0, 800.0, 900.0]);
    }

    #[test]
    fn selects_columns_by_declared_feature_names() {
        let t = table(&["N", "VM", "Ash"]);
        let names = vec!["Ash".to_string(), "VM".to_string()];
        let pipeline = DirectPipeline::new(model(2, Some(names)), &t, 1).unwrap();
        assert_eq!(pipeline.input_columns(), &[2, 1]);
    }

    #[test]
    fn missing_declared_column_is_a_configuration_error() {
        let t = table(&["Ash", "N"]);
        let names = vec!["Ash".to_string(), "FC".to_string()];
        let err = DirectPipeline::new(model(2, Some(names)), &t, 1).unwrap_err();
        assert_eq!(err, PredictionError::MissingColumn("FC".into()));
    }

    #[test]
    fn width_mismatch_is_caught_at_construction() {
        let t = table(&["Ash", "VM", "FC", "N"]);
        let err = DirectPipeline::new(model(2, None), &t, 1).unwrap_err();
        assert!(matches!(err, PredictionError::InputWidth { expected: 2, actual: 3 }));
    }
}
