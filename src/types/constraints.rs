//! Property constraints for blend (feedstock) and coke (product) properties
//!
//! A `Constraints` value is built once per run from the built-in defaults
//! plus any caller overrides, then stays immutable. Defaults are never
//! mutated; each run starts from a fresh builder.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Whether a property describes the blend itself or the coke produced from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyGroup {
    Blend,
    Coke,
}

impl PropertyGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blend => "blend",
            Self::Coke => "coke",
        }
    }
}

/// The eight predicted properties, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    BlendAsh,
    BlendVm,
    BlendFc,
    BlendCsn,
    CokeCri,
    CokeCsr,
    CokeAsh,
    CokeVm,
}

impl Property {
    pub const ALL: [Self; 8] = [
        Self::BlendAsh,
        Self::BlendVm,
        Self::BlendFc,
        Self::BlendCsn,
        Self::CokeCri,
        Self::CokeCsr,
        Self::CokeAsh,
        Self::CokeVm,
    ];

    /// Position of this property in the direct model's output vector.
    pub fn output_index(self) -> usize {
        self as usize
    }

    pub fn group(self) -> PropertyGroup {
        match self {
            Self::BlendAsh | Self::BlendVm | Self::BlendFc | Self::BlendCsn => PropertyGroup::Blend,
            _ => PropertyGroup::Coke,
        }
    }

    /// Short name within its group, as used in constraint overrides.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::BlendAsh | Self::CokeAsh => "ash",
            Self::BlendVm | Self::CokeVm => "vm",
            Self::BlendFc => "fc",
            Self::BlendCsn => "csn",
            Self::CokeCri => "cri",
            Self::CokeCsr => "csr",
        }
    }

    pub fn lookup(group: PropertyGroup, name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.group() == group && p.short_name() == name)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group().as_str(), self.short_name())
    }
}

/// Inclusive allowed range for one property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyRange {
    pub min: f64,
    pub max: f64,
}

impl PropertyRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// One-sided quadratic barrier: zero inside the band.
    pub fn penalty(&self, value: f64) -> f64 {
        if value < self.min {
            (self.min - value).powi(2)
        } else if value > self.max {
            (value - self.max).powi(2)
        } else {
            0.0
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstraintError {
    #[error("Unknown {group} property '{name}'")]
    UnknownProperty { group: &'static str, name: String },

    #[error("{property}: min ({min}) must be <= max ({max})")]
    Inverted { property: Property, min: f64, max: f64 },

    #[error("{property}: bounds must be finite (got min={min}, max={max})")]
    NonFinite { property: Property, min: f64, max: f64 },
}

/// Caller-supplied overrides keyed by short property name, partitioned by group.
///
/// Deserializes from `[constraints.blend]` / `[constraints.coke]` TOML tables
/// whose values are `[min, max]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintOverrides {
    #[serde(default)]
    pub blend: BTreeMap<String, (f64, f64)>,
    #[serde(default)]
    pub coke: BTreeMap<String, (f64, f64)>,
}

impl ConstraintOverrides {
    pub fn is_empty(&self) -> bool {
        self.blend.is_empty() && self.coke.is_empty()
    }
}

/// Immutable constraint set for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    ranges: BTreeMap<Property, PropertyRange>,
}

impl Default for Constraints {
    fn default() -> Self {
        let ranges = Property::ALL
            .into_iter()
            .map(|p| (p, default_range(p)))
            .collect();
        Self { ranges }
    }
}

/// Built-in range for each property.
pub fn default_range(property: Property) -> PropertyRange {
    match property {
        Property::BlendAsh => PropertyRange::new(5.0, 15.0),
        Property::BlendVm => PropertyRange::new(15.0, 35.0),
        Property::BlendFc => PropertyRange::new(50.0, 75.0),
        Property::BlendCsn => PropertyRange::new(4.0, 8.0),
        Property::CokeCri => PropertyRange::new(20.0, 30.0),
        Property::CokeCsr => PropertyRange::new(60.0, 75.0),
        Property::CokeAsh => PropertyRange::new(8.0, 12.0),
        Property::CokeVm => PropertyRange::new(0.5, 2.0),
    }
}

impl Constraints {
    pub fn builder() -> ConstraintsBuilder {
        ConstraintsBuilder::default()
    }

    /// Defaults merged with `overrides`.
    pub fn with_overrides(overrides: &ConstraintOverrides) -> Result<Self, ConstraintError> {
        Self::builder().overrides(overrides)?.build()
    }

    pub fn get(&self, property: Property) -> Option<&PropertyRange> {
        self.ranges.get(&property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, &PropertyRange)> {
        self.ranges.iter().map(|(p, r)| (*p, r))
    }

    /// Total penalty of a predicted property vector in model output order.
    pub fn penalty(&self, predicted: &[f64]) -> f64 {
        self.ranges
            .iter()
            .filter_map(|(p, range)| predicted.get(p.output_index()).map(|&v| range.penalty(v)))
            .sum()
    }
}

/// Builder that starts from the defaults; later settings replace earlier ones.
#[derive(Debug, Clone)]
pub struct ConstraintsBuilder {
    ranges: BTreeMap<Property, PropertyRange>,
}

impl Default for ConstraintsBuilder {
    fn default() -> Self {
        Self {
            ranges: Constraints::default().ranges,
        }
    }
}

impl ConstraintsBuilder {
    pub fn range(mut self, property: Property, min: f64, max: f64) -> Self {
        self.ranges.insert(property, PropertyRange::new(min, max));
        self
    }

    pub fn named(
        self,
        group: PropertyGroup,
        name: &str,
        min: f64,
        max: f64,
    ) -> Result<Self, ConstraintError> {
        let property =
            Property::lookup(group, name).ok_or_else(|| ConstraintError::UnknownProperty {
                group: group.as_str(),
                name: name.to_string(),
            })?;
        Ok(self.range(property, min, max))
    }

    pub fn overrides(mut self, overrides: &ConstraintOverrides) -> Result<Self, ConstraintError> {
        for (name, &(min, max)) in &overrides.blend {
            self = self.named(PropertyGroup::Blend, name, min, max)?;
        }
        for (name, &(min, max)) in &overrides.coke {
            self = self.named(PropertyGroup::Coke, name, min, max)?;
        }
        Ok(self)
    }

    pub fn build(self) -> Result<Constraints, ConstraintError> {
        for (&property, range) in &self.ranges {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(ConstraintError::NonFinite {
                    property,
                    min: range.min,
                    max: range.max,
                });
            }
            if range.min > range.max {
                return Err(ConstraintError::Inverted {
                    property,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(Constraints {
            ranges: self.ranges,
        })
    }
}
