//! Engine configuration.
//!
//! One parameter object replaces every per-view constant: density bands,
//! spacing multipliers, padding, truncation budgets and the species
//! abbreviation table. All structs deserialize from partial camelCase JS
//! objects; missing fields take the defaults below.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Layout mode for a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Leaves on a full circle, radius proportional to depth.
    #[default]
    Radial,
    /// Root on the left, leaves aligned in one column on the right.
    Rectangular,
}

impl FromStr for LayoutMode {
    type Err = Error;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "radial" => Ok(Self::Radial),
            "rectangular" => Ok(Self::Rectangular),
            other => Err(Error::InvalidConfig {
                message: format!("unknown layout mode {other:?}"),
            }),
        }
    }
}

/// Drawing surface size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Clamp range for count-scaled node circles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusRange {
    pub min: f64,
    pub max: f64,
}

/// Parameters that apply once a tree has at least `min_leaves` leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityBand {
    /// Inclusive leaf-count threshold.
    pub min_leaves: usize,
    /// Separation multiplier between adjacent leaves.
    pub separation: f64,
    /// Minimum vertical pixels between adjacent leaves in rectangular mode.
    pub leaf_spacing: f64,
    pub node_radius: RadiusRange,
    /// Character budget for leaf labels.
    pub label_chars: usize,
}

impl DensityBand {
    fn new(min_leaves: usize, separation: f64, leaf_spacing: f64, radius: (f64, f64), label_chars: usize) -> Self {
        Self {
            min_leaves,
            separation,
            leaf_spacing,
            node_radius: RadiusRange {
                min: radius.0,
                max: radius.1,
            },
            label_chars,
        }
    }
}

/// Leaf-count lookup table. Denser trees get tighter spacing, smaller
/// circles and shorter labels.
pub fn default_density_bands() -> Vec<DensityBand> {
    vec![
        DensityBand::new(151, 1.0, 12.0, (2.0, 6.0), 14),
        DensityBand::new(101, 1.2, 14.0, (2.5, 8.0), 18),
        DensityBand::new(51, 1.5, 16.0, (3.0, 10.0), 22),
        DensityBand::new(26, 1.8, 20.0, (3.5, 12.0), 28),
        DensityBand::new(0, 2.2, 24.0, (4.0, 14.0), 36),
    ]
}

/// Horizontal placement policy for rectangular mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalMode {
    /// Internal nodes by cumulative branch length, every leaf pinned to the
    /// rightmost column.
    #[default]
    Dendrogram,
    /// Every node, leaves included, by cumulative branch length.
    Phylogram,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadialConfig {
    /// Pixels per depth level. `None` derives one unit from the viewport.
    pub branch_unit: Option<f64>,
    /// Space kept free around the outermost ring for labels.
    pub label_margin: f64,
    /// Angular delta (radians) under which a link is drawn as a straight line.
    pub link_epsilon: f64,
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self {
            branch_unit: None,
            label_margin: 120.0,
            link_epsilon: 1e-3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RectangularConfig {
    pub horizontal_mode: HorizontalMode,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub padding_left: f64,
    /// Space kept free right of the leaf column for labels.
    pub label_margin: f64,
    /// Padding around every subtree's vertical range during overlap checks.
    pub subtree_padding: f64,
    /// Extra gap added on top of a measured overlap.
    pub overlap_buffer: f64,
}

impl Default for RectangularConfig {
    fn default() -> Self {
        Self {
            horizontal_mode: HorizontalMode::Dendrogram,
            padding_top: 20.0,
            padding_bottom: 20.0,
            padding_left: 20.0,
            label_margin: 180.0,
            subtree_padding: 4.0,
            overlap_buffer: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatcherConfig {
    /// Names this short (after normalisation) only ever match exactly.
    pub exact_only_max_len: usize,
    /// Substring containment applies once either name is longer than this.
    pub containment_min_len: usize,
    /// Genus tokens must be longer than this for the genus heuristic.
    pub genus_min_len: usize,
    /// Leading epithet characters that must agree under the genus heuristic.
    pub epithet_prefix_len: usize,
    /// Abbreviation code to full species name, e.g. `"BnA" -> "Brassica napus"`.
    pub abbreviations: HashMap<String, String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            exact_only_max_len: 3,
            containment_min_len: 5,
            genus_min_len: 3,
            epithet_prefix_len: 3,
            abbreviations: HashMap::new(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub density_bands: Vec<DensityBand>,
    pub radial: RadialConfig,
    pub rectangular: RectangularConfig,
    pub matcher: MatcherConfig,
    /// Circle radius for nodes that carry no count.
    pub base_node_radius: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            density_bands: default_density_bands(),
            radial: RadialConfig::default(),
            rectangular: RectangularConfig::default(),
            matcher: MatcherConfig::default(),
            base_node_radius: 2.0,
        }
    }
}

impl EngineConfig {
    /// Band for a tree with `leaf_count` leaves: the one with the highest
    /// threshold not above the count. Falls back to the loosest default band
    /// when the table is empty or every threshold is above the count.
    pub fn density_band(&self, leaf_count: usize) -> DensityBand {
        self.density_bands
            .iter()
            .filter(|band| band.min_leaves <= leaf_count)
            .max_by_key(|band| band.min_leaves)
            .cloned()
            .or_else(|| {
                self.density_bands
                    .iter()
                    .min_by_key(|band| band.min_leaves)
                    .cloned()
            })
            .unwrap_or_else(|| DensityBand::new(0, 2.2, 24.0, (4.0, 14.0), 36))
    }
}
