//! Tunables for the clipper.
//!
//! Both structs deserialize from YAML with every field optional, so a
//! build recipe only has to name what it changes:
//!
//! ```yaml
//! ignore_landmass: true
//! slivers:
//!   min_angle_degrees: 8.0
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// When a contour counts as a sliver.
///
/// A contour is a sliver if it is both thin and small
/// (`min_angle < min_angle_degrees` and `area < max_thin_area`), or if it
/// is simply tiny (`area < max_tiny_area`). Areas are in squared degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliverThresholds {
    pub min_angle_degrees: f64,
    pub max_thin_area: f64,
    pub max_tiny_area: f64,
}

impl Default for SliverThresholds {
    fn default() -> Self {
        Self {
            min_angle_degrees: 10.0,
            max_thin_area: 8e-8,
            max_tiny_area: 8e-9,
        }
    }
}

impl SliverThresholds {
    /// Classify a contour from its smallest angle (radians) and area.
    #[inline]
    pub fn is_sliver(&self, min_angle: f64, area: f64) -> bool {
        (min_angle < self.min_angle_degrees.to_radians() && area < self.max_thin_area)
            || area < self.max_tiny_area
    }
}

/// Clipper configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipperConfig {
    /// Sliver classification.
    pub slivers: SliverThresholds,
    /// Skip clipping areas to the landmass polygons.
    pub ignore_landmass: bool,
}

impl ClipperConfig {
    pub fn with_slivers(mut self, slivers: SliverThresholds) -> Self {
        self.slivers = slivers;
        self
    }

    pub fn with_ignore_landmass(mut self, ignore: bool) -> Self {
        self.ignore_landmass = ignore;
        self
    }

    /// Parse a YAML document; missing fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
