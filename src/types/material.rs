//! Raw material (coal) records and the per-run material table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Assay column names used by the prediction pipelines.
///
/// The names follow the coal property records the table is loaded from.
/// A table does not need to carry every column; pipelines look columns up
/// by name and treat absent ones as missing.
pub mod columns {
    pub const ASH: &str = "Ash";
    pub const VM: &str = "VM";
    pub const FC: &str = "FC";
    pub const S: &str = "S";
    pub const P: &str = "P";
    pub const SIO2: &str = "SiO2";
    pub const AL2O3: &str = "Al2O3";
    pub const FE2O3: &str = "Fe2O3";
    pub const CAO: &str = "CaO";
    pub const MGO: &str = "MgO";
    pub const NA2O: &str = "Na2O";
    pub const K2O: &str = "K2O";
    pub const TIO2: &str = "TiO2";
    pub const CRI: &str = "CRI";
    pub const CSR: &str = "CSR";
    pub const N: &str = "N";
    pub const HGI: &str = "HGI";
    pub const RANK: &str = "Rank";
    pub const VITRINITE: &str = "Vitrinite";
    pub const LIPTINITE: &str = "Liptinite";
    pub const SEMI_FUSINITE: &str = "Semi_Fusinite";
    pub const CSN_FSI: &str = "CSN_FSI";
    pub const INITIAL_SOFTENING_TEMP: &str = "Initial_Softening_Temp";
    pub const LOG_MAX_FLUIDITY: &str = "Log_Max_Fluidity";
    pub const C: &str = "C";
    pub const H: &str = "H";
    pub const O: &str = "O";
    pub const INERTINITE: &str = "Inertinite";
    pub const MINERALS: &str = "Minerals";
    pub const MAX_FLUIDITY: &str = "MaxFluidity";

    /// Vitrinite reflectance bands V7..V19 with their VR divisors.
    pub const REFLECTANCE_BANDS: [(&str, f64); 13] = [
        ("V7", 3.0),
        ("V8", 2.7),
        ("V9", 2.5),
        ("V10", 2.4),
        ("V11", 2.5),
        ("V12", 3.0),
        ("V13", 3.7),
        ("V14", 5.0),
        ("V15", 7.0),
        ("V16", 9.6),
        ("V17", 12.0),
        ("V18", 15.0),
        ("V19", 18.0),
    ];
}

/// Coal category flag carried by a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoalCategory {
    /// Hard coking coal
    Hcc,
    /// Semi-hard coking coal
    Shcc,
    /// High-fluidity coking coal
    Hfcc,
    /// Pulverised coal injection
    Pci,
    /// Weak coking coal
    Wc,
}

impl CoalCategory {
    pub const ALL: [Self; 5] = [Self::Hcc, Self::Shcc, Self::Hfcc, Self::Pci, Self::Wc];

    /// Categories that count as coking coal for the caking index.
    pub fn is_coking(self) -> bool {
        matches!(self, Self::Hcc | Self::Shcc | Self::Hfcc)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hcc => "HCC",
            Self::Shcc => "SHCC",
            Self::Hfcc => "HFCC",
            Self::Pci => "PCI",
            Self::Wc => "WC",
        }
    }

    /// Case-insensitive parse of a category label.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for CoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw material row: identity, unit cost, and an assay vector in the
/// table's column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub cost: f64,
    pub features: Vec<f64>,
    #[serde(default)]
    pub category: Option<CoalCategory>,
}

/// Errors raised while assembling a material table.
#[derive(Debug, thiserror::Error)]
pub enum MaterialError {
    #[error("Material table is empty")]
    Empty,

    #[error("Material '{name}' has {actual} features, table declares {expected} columns")]
    WidthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Material '{name}' has a non-finite {field}")]
    NonFinite { name: String, field: String },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

/// Serialized form of a material table (`--materials` JSON file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialTableFile {
    pub columns: Vec<String>,
    pub materials: Vec<Material>,
}

/// In-memory table of candidate raw materials for one optimization run.
///
/// Rows are immutable once loaded; candidates refer to them by index.
#[derive(Debug, Clone)]
pub struct MaterialTable {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    materials: Vec<Material>,
}

impl MaterialTable {
    /// Build a table, checking that every row matches the declared columns.
    pub fn new(columns: Vec<String>, materials: Vec<Material>) -> Result<Self, MaterialError> {
        if materials.is_empty() {
            return Err(MaterialError::Empty);
        }

        let mut column_index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if column_index.insert(name.clone(), i).is_some() {
                return Err(MaterialError::DuplicateColumn(name.clone()));
            }
        }

        for m in &materials {
            if m.features.len() != columns.len() {
                return Err(MaterialError::WidthMismatch {
                    name: m.name.clone(),
                    expected: columns.len(),
                    actual: m.features.len(),
                });
            }
            if !m.cost.is_finite() {
                return Err(MaterialError::NonFinite {
                    name: m.name.clone(),
                    field: "cost".to_string(),
                });
            }
            if let Some(i) = m.features.iter().position(|v| !v.is_finite()) {
                return Err(MaterialError::NonFinite {
                    name: m.name.clone(),
                    field: columns[i].clone(),
                });
            }
        }

        Ok(Self {
            columns,
            column_index,
            materials,
        })
    }

    pub fn from_file(file: MaterialTableFile) -> Result<Self, MaterialError> {
        Self::new(file.columns, file.materials)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Feature width shared by every row.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    pub fn get(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Value of a named column for one material, if the column exists.
    pub fn value(&self, index: usize, column: &str) -> Option<f64> {
        let col = self.column(column)?;
        self.materials.get(index).map(|m| m.features[col])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(name: &str, features: Vec<f64>) -> Material {
        Material {
            name: name.to_string(),
            cost: 100.0,
            features,
            category: None,
        }
    }

    #[test]
    fn rejects_empty_table() {
        let err = MaterialTable::new(vec!["Ash".into()], vec![]).unwrap_err();
        assert!(matches!(err, MaterialError::Empty));
    }

    #[test]
    fn rejects_width_mismatch() {
        let err = MaterialTable::new(
            vec!["Ash".into(), "VM".into()],
            vec![material("A", vec![1.0])],
        )
        .unwrap_err();
        assert!(matches!(err, MaterialError::WidthMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn rejects_non_finite_values() {
        let err = MaterialTable::new(vec!["Ash".into()], vec![material("A", vec![f64::NAN])])
            .unwrap_err();
        assert!(matches!(err, MaterialError::NonFinite { .. }));
    }

    #[test]
    fn looks_up_values_by_column_name() {
        let table = MaterialTable::new(
            vec!["Ash".into(), "VM".into()],
            vec![material("A", vec![9.5, 24.0]), material("B", vec![8.0, 30.0])],
        )
        .unwrap();
        assert_eq!(table.value(1, "VM"), Some(30.0));
        assert_eq!(table.value(0, "FC"), None);
    }

    #[test]
    fn parses_category_labels() {
        assert_eq!(CoalCategory::parse("shcc"), Some(CoalCategory::Shcc));
        assert_eq!(CoalCategory::parse(" PCI "), Some(CoalCategory::Pci));
        assert_eq!(CoalCategory::parse("anthracite"), None);
        assert!(CoalCategory::Hfcc.is_coking());
        assert!(!CoalCategory::Wc.is_coking());
    }
}
