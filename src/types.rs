//! Core data types for lattice definitions and their persisted configuration.
//!
//! This module defines the configuration model edited in the settings panel:
//! scalar parameters, unit-cell sites, the lattice basis, the visible window,
//! and the top-level settings object stored under a preset name. Field names
//! follow the on-disk preset JSON format.

use serde::{Deserialize, Serialize};

use crate::constants::FORTRAN_MASK_FN_TEMPLATE;

/// A 2D vector stored as an `(x, y)` pair, serialized as a two-element JSON array.
pub type Vec2 = (f64, f64);

/// An RGB colour, serialized as a three-element JSON array.
pub type Rgb = (u8, u8, u8);

/// A named scalar constant exposed to the mask code.
///
/// The value is kept as the text the user typed; it is parsed into a typed
/// literal only when source code is generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScalarParameter {
    /// Identifier of the constant in the generated module
    pub name: String,
    /// Literal text of the value, e.g. `1.5`, `3`, `True` or `1+2j`
    pub value: String,
}

impl ScalarParameter {
    /// Creates a parameter from a name and literal text.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns true when both name and value are blank. Blank rows are skipped.
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.value.trim().is_empty()
    }

    /// Returns true when both name and value are filled in.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.value.trim().is_empty()
    }
}

/// A site of the unit cell, replicated at every lattice index pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UnitCellSite {
    /// Display name of the site (also its preset name)
    pub name: String,
    /// Offset of the site inside the unit cell
    pub value: Vec2,
    /// Sphere radius used when rendering points of this site
    pub size: f64,
    /// Sphere colour used when rendering points of this site
    pub color: Rgb,
}

impl Default for UnitCellSite {
    fn default() -> Self {
        Self {
            name: "v".to_string(),
            value: (0.0, 0.0),
            size: 1.0,
            color: (255, 255, 255),
        }
    }
}

impl UnitCellSite {
    /// Creates a white site of unit size at the given offset.
    pub fn new(name: impl Into<String>, value: Vec2) -> Self {
        Self {
            name: name.into(),
            value,
            ..Default::default()
        }
    }

    /// Builder-style setter for the display size.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    /// Builder-style setter for the display colour.
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }
}

/// Two basis vectors plus the unit-cell sites.
///
/// The basis is not checked for linear independence; degenerate lattices are
/// accepted and simply produce overlapping points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LatticeDefinition {
    /// First basis vector
    pub v1: Vec2,
    /// Second basis vector
    pub v2: Vec2,
    /// Unit-cell sites in insertion order
    pub sites: Vec<UnitCellSite>,
}

impl Default for LatticeDefinition {
    fn default() -> Self {
        Self {
            v1: (0.0, 1.0),
            v2: (1.0, 0.0),
            sites: vec![UnitCellSite::default()],
        }
    }
}

impl LatticeDefinition {
    /// Returns the lattice point `i * v1 + j * v2`.
    pub fn position(&self, i: i64, j: i64) -> Vec2 {
        let (i, j) = (i as f64, j as f64);
        (
            i * self.v1.0 + j * self.v2.0,
            i * self.v1.1 + j * self.v2.1,
        )
    }
}

/// Rectangle restricting which lattice points are materialized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowBounds {
    /// Minimum corner `(x, y)`
    #[serde(rename = "vMin")]
    pub v_min: Vec2,
    /// Maximum corner `(x, y)`
    #[serde(rename = "vMax")]
    pub v_max: Vec2,
}

impl Default for WindowBounds {
    fn default() -> Self {
        Self {
            v_min: (0.0, 0.0),
            v_max: (1.0, 1.0),
        }
    }
}

impl WindowBounds {
    /// Creates a window from its two corners.
    pub fn new(v_min: Vec2, v_max: Vec2) -> Self {
        Self { v_min, v_max }
    }

    /// Inclusive membership test on all four edges.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if x < self.v_min.0 || x > self.v_max.0 {
            return false;
        }
        if y < self.v_min.1 || y > self.v_max.1 {
            return false;
        }
        true
    }

    /// The four corners, min-min first and counter-clockwise.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.v_min,
            (self.v_max.0, self.v_min.1),
            self.v_max,
            (self.v_min.0, self.v_max.1),
        ]
    }
}

/// The complete configuration stored under a top-level preset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LatticeSettings {
    /// Scalar constants, including blank rows the user has not filled in yet
    pub parameters: Vec<ScalarParameter>,
    /// Basis vectors and unit cell
    pub lattice: LatticeDefinition,
    /// Fortran source of the mask subroutine
    pub code: String,
    /// Visible window
    pub dimensions: WindowBounds,
}

impl Default for LatticeSettings {
    fn default() -> Self {
        Self {
            parameters: vec![ScalarParameter::default()],
            lattice: LatticeDefinition::default(),
            code: FORTRAN_MASK_FN_TEMPLATE.to_string(),
            dimensions: WindowBounds::default(),
        }
    }
}

impl LatticeSettings {
    /// Serialize the settings to a pretty JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A lattice point that survived the window and mask tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatticePoint {
    /// Absolute position `(x, y, z)`; `z` is always zero for 2D lattices
    pub position: (f64, f64, f64),
    /// Index of the owning site in [`LatticeDefinition::sites`]
    pub site: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_parameter_empty_and_valid() {
        assert!(ScalarParameter::new("", "").is_empty());
        assert!(ScalarParameter::new("  ", " ").is_empty());
        assert!(!ScalarParameter::new("a", "").is_empty());
        assert!(ScalarParameter::new("a", "1").is_valid());
        assert!(!ScalarParameter::new("", "1").is_valid());
        assert!(!ScalarParameter::new("a", " ").is_valid());
    }

    #[test]
    fn test_lattice_position() {
        let lattice = LatticeDefinition {
            v1: (1.0, 0.0),
            v2: (0.5, 2.0),
            sites: vec![],
        };
        assert_eq!(lattice.position(0, 0), (0.0, 0.0));
        assert_eq!(lattice.position(2, 1), (2.5, 2.0));
        assert_eq!(lattice.position(-1, -1), (-1.5, -2.0));
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let window = WindowBounds::new((0.0, 0.0), (2.0, 1.0));
        assert!(window.contains(0.0, 0.0));
        assert!(window.contains(2.0, 1.0));
        assert!(window.contains(1.0, 0.5));
        assert!(!window.contains(-0.001, 0.5));
        assert!(!window.contains(1.0, 1.001));
    }

    #[test]
    fn test_site_json_shape() {
        let site = UnitCellSite::new("A", (0.5, 0.25))
            .with_size(0.3)
            .with_color((255, 0, 0));
        let value = serde_json::to_value(&site).unwrap();
        assert_eq!(
            value,
            json!({"name": "A", "value": [0.5, 0.25], "size": 0.3, "color": [255, 0, 0]})
        );
    }

    #[test]
    fn test_settings_json_shape_uses_camel_case_dimensions() {
        let settings = LatticeSettings::default();
        let value = serde_json::to_value(&settings).unwrap();
        assert!(value.get("parameters").is_some());
        assert!(value.get("lattice").is_some());
        assert!(value.get("code").is_some());
        assert_eq!(value["dimensions"]["vMin"], json!([0.0, 0.0]));
        assert_eq!(value["dimensions"]["vMax"], json!([1.0, 1.0]));
    }

    #[test]
    fn test_settings_missing_fields_fall_back_to_defaults() {
        let settings = LatticeSettings::from_json(r#"{"code": "! custom"}"#).unwrap();
        assert_eq!(settings.code, "! custom");
        assert_eq!(settings.lattice, LatticeDefinition::default());
        assert_eq!(settings.dimensions, WindowBounds::default());
    }

    #[test]
    fn test_settings_roundtrip() {
        let mut settings = LatticeSettings::default();
        settings.parameters = vec![ScalarParameter::new("r", "2.5")];
        settings.lattice.sites.push(UnitCellSite::new("B", (0.5, 0.5)));
        settings.dimensions = WindowBounds::new((-3.0, -2.0), (3.0, 2.0));

        let json = settings.to_json().unwrap();
        let restored = LatticeSettings::from_json(&json).unwrap();
        assert_eq!(restored, settings);
    }
}
