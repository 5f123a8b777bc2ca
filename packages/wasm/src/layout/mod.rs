//! Layout algorithms for species trees.
//!
//! A layout pass annotates every node with a position and reports the
//! drawing extent. Radial mode spreads leaves around a circle; rectangular
//! mode runs the tidy tree pass followed by the overlap resolver.

pub mod overlap;
pub mod radial;
pub mod rectangular;
pub mod tidy_tree;

use std::collections::HashMap;

use serde::Serialize;

use crate::config::{DensityBand, EngineConfig, LayoutMode, Viewport};
use crate::log::log_debug;
use crate::tree::{NodeIndex, PhyloTree};

pub use overlap::{ResolverSettings, resolve};
pub use tidy_tree::{TidyTreeConfig, TidyTreeLayout};

/// Summary of one layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub mode: LayoutMode,
    /// Drawing extent in pixels. Rectangular height may exceed the viewport.
    pub width: f64,
    pub height: f64,
    pub leaf_count: usize,
    /// Density band chosen for this tree.
    pub band: DensityBand,
}

/// Cumulative branch length from the root for every node.
///
/// Missing and negative lengths count as zero; the root's own length is
/// ignored. A tree without any branch length uses depth instead.
pub fn cumulative_distances(tree: &PhyloTree) -> HashMap<NodeIndex, f64> {
    let root = tree.root();
    let has_lengths = tree
        .preorder()
        .into_iter()
        .any(|index| index != root && tree.node(index).branch_length.is_some());

    let mut distances = HashMap::with_capacity(tree.node_count());
    for index in tree.preorder() {
        let node = tree.node(index);
        let distance = match tree.parent(index) {
            None => 0.0,
            Some(_) if !has_lengths => f64::from(node.depth),
            Some(parent) => {
                let step = node.branch_length.unwrap_or(0.0).max(0.0);
                distances.get(&parent).copied().unwrap_or(0.0) + step
            }
        };
        distances.insert(index, distance);
    }
    distances
}

/// Lay out `tree` in `mode`, replacing any previous layout annotation.
pub fn layout(
    tree: &mut PhyloTree,
    mode: LayoutMode,
    viewport: Viewport,
    config: &EngineConfig,
) -> LayoutResult {
    tree.clear_layout();
    let leaf_count = tree.leaf_count();
    let band = config.density_band(leaf_count);
    let distances = cumulative_distances(tree);

    let (width, height) = match mode {
        LayoutMode::Radial => {
            radial::layout_radial(tree, viewport, &band, &config.radial, &distances);
            (viewport.width, viewport.height)
        }
        LayoutMode::Rectangular => {
            let extent = rectangular::layout_rectangular(
                tree,
                viewport,
                &band,
                &config.rectangular,
                &distances,
            );
            (extent.width, extent.height)
        }
    };

    log_debug!(
        "{:?} layout of {} leaves in {:.0}x{:.0}",
        mode,
        leaf_count,
        width,
        height
    );

    LayoutResult {
        mode,
        width,
        height,
        leaf_count,
        band,
    }
}
