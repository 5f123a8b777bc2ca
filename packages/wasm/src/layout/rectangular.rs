//! Rectangular layout: root on the left, leaves in one column on the right.
//!
//! Vertical positions start from the tidy tree pass (Newick leaf order,
//! band-scaled separation) and are then corrected by the overlap resolver.
//! Horizontal positions scale cumulative branch length; in dendrogram mode
//! every leaf is pinned to the rightmost column.

use std::collections::HashMap;

use crate::config::{DensityBand, HorizontalMode, RectangularConfig, Viewport};
use crate::tree::{NodeIndex, NodeLayout, PhyloTree};

use super::overlap::{ResolverSettings, resolve};
use super::tidy_tree::{TidyTreeConfig, TidyTreeLayout};

/// Narrowest horizontal span, in pixels, kept for branches.
const MIN_BRANCH_SPAN: f64 = 100.0;

/// Drawing extent of a rectangular pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangularExtent {
    pub width: f64,
    pub height: f64,
}

/// Vertical gap between adjacent leaves: the band's spacing, raised when
/// needed so padded sibling ranges stay disjoint after equal spacing.
pub fn leaf_gap(band: &DensityBand, config: &RectangularConfig) -> f64 {
    band.leaf_spacing
        .max(2.0 * config.subtree_padding + config.overlap_buffer)
        .max(0.0)
}

/// Annotate every node with vertical (`x`) and horizontal (`y`) pixels.
pub fn layout_rectangular(
    tree: &mut PhyloTree,
    viewport: Viewport,
    band: &DensityBand,
    config: &RectangularConfig,
    distances: &HashMap<NodeIndex, f64>,
) -> RectangularExtent {
    let leaf_count = tree.leaf_count();
    let gap = leaf_gap(band, config);
    let needed = config.padding_top
        + config.padding_bottom
        + leaf_count.saturating_sub(1) as f64 * gap;
    let height = viewport.height.max(needed);

    let separation = if band.separation.is_finite() && band.separation > 0.0 {
        band.separation
    } else {
        1.0
    };
    let raw = TidyTreeLayout::new(TidyTreeConfig {
        sibling_separation: separation,
        subtree_separation: 2.0 * separation,
    })
    .compute(tree);

    let left = config.padding_left;
    let right = (viewport.width - config.label_margin).max(left + MIN_BRANCH_SPAN);
    let max_distance = distances.values().copied().fold(0.0, f64::max);

    for index in tree.preorder() {
        let distance = distances.get(&index).copied().unwrap_or(0.0);
        let vertical = config.padding_top + raw.get(&index).copied().unwrap_or(0.0) * gap / separation;
        let pinned = config.horizontal_mode == HorizontalMode::Dendrogram && tree.is_leaf(index);
        let horizontal = if pinned {
            right
        } else if max_distance > 0.0 {
            left + distance / max_distance * (right - left)
        } else {
            left
        };
        tree.node_mut(index).layout = Some(NodeLayout {
            x: vertical,
            y: horizontal,
            distance,
            polar: None,
        });
    }

    resolve(
        tree,
        &ResolverSettings {
            padding: config.subtree_padding,
            buffer: config.overlap_buffer,
            top: config.padding_top,
            bottom: height - config.padding_bottom,
        },
    );

    RectangularExtent {
        width: viewport.width.max(right + config.label_margin),
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::layout::cumulative_distances;
    use crate::layout::overlap::subtree_range;
    use crate::tree::parse;

    fn run(newick: &str, config: &RectangularConfig, viewport: Viewport) -> (PhyloTree, RectangularExtent) {
        let mut tree = parse(newick).unwrap();
        let band = EngineConfig::default().density_band(tree.leaf_count());
        let distances = cumulative_distances(&tree);
        let extent = layout_rectangular(&mut tree, viewport, &band, config, &distances);
        (tree, extent)
    }

    fn at(tree: &PhyloTree, id: &str) -> NodeLayout {
        tree.node(tree.find(id).unwrap()).layout.unwrap()
    }

    #[test]
    fn test_dendrogram_pins_leaves() {
        let config = RectangularConfig::default();
        let (tree, _) = run("((A:0.1,B:0.2):0.3,C:0.4);", &config, Viewport::new(800.0, 600.0));

        let right = 800.0 - config.label_margin;
        for id in ["A", "B", "C"] {
            assert_eq!(at(&tree, id).y, right, "{id} is not in the leaf column");
        }
        assert_eq!(at(&tree, "root").y, config.padding_left);

        // root_0 at 0.3 of the 0.5 maximum distance
        let expected = config.padding_left + 0.3 / 0.5 * (right - config.padding_left);
        assert!((at(&tree, "root_0").y - expected).abs() < 1e-9);
    }

    #[test]
    fn test_phylogram_places_leaves_by_distance() {
        let config = RectangularConfig {
            horizontal_mode: HorizontalMode::Phylogram,
            ..Default::default()
        };
        let (tree, _) = run("((A:0.1,B:0.2):0.3,C:0.4);", &config, Viewport::new(800.0, 600.0));
        let right = 800.0 - config.label_margin;
        assert_eq!(at(&tree, "B").y, right);
        assert!(at(&tree, "A").y < at(&tree, "B").y);
        assert!((at(&tree, "A").y - at(&tree, "C").y).abs() < 1e-9);
    }

    #[test]
    fn test_leaves_keep_newick_order_and_equal_gaps() {
        let config = RectangularConfig::default();
        let (tree, extent) = run(
            "(((A,B),(C,D,E)),((F,(G,H)),I),J);",
            &config,
            Viewport::new(800.0, 600.0),
        );
        let xs: Vec<f64> = tree.leaves().iter().map(|&i| tree.node(i).layout.unwrap().x).collect();
        assert_eq!(xs.first().copied(), Some(config.padding_top));
        assert!((xs[xs.len() - 1] - (extent.height - config.padding_bottom)).abs() < 1e-9);

        let gap = xs[1] - xs[0];
        for pair in xs.windows(2) {
            assert!(
                ((pair[1] - pair[0]) - gap).abs() < 1e-9,
                "uneven leaf gap {} vs {gap}",
                pair[1] - pair[0]
            );
        }
    }

    #[test]
    fn test_mixed_depth_leaves_end_in_newick_order() {
        // The tidy pass alone puts H left of G here; resolving restores order
        let config = RectangularConfig::default();
        let (tree, _) = run("(((A,B),C),(D,(E,F,G)),H);", &config, Viewport::new(800.0, 600.0));
        let xs: Vec<f64> = tree.leaves().iter().map(|&i| tree.node(i).layout.unwrap().x).collect();
        for pair in xs.windows(2) {
            assert!(pair[0] < pair[1], "leaves out of order: {xs:?}");
        }
    }

    #[test]
    fn test_sibling_ranges_do_not_overlap() {
        let config = RectangularConfig::default();
        let newicks = [
            "((A,B),(C,D));",
            "(((((A,B),C),D),E),F);",
            "(A,(B,(C,(D,(E,F)))));",
            "((A,(B,C,D,E,F,G)),((H,I),(J,(K,L))),M);",
            "((A),((B)),(((C))));",
        ];
        for newick in newicks {
            let (tree, _) = run(newick, &config, Viewport::new(800.0, 200.0));
            for parent in tree.preorder() {
                let mut ranges: Vec<(f64, f64)> = tree
                    .children(parent)
                    .into_iter()
                    .map(|child| subtree_range(&tree, child))
                    .collect();
                ranges.sort_by(|a, b| a.0.total_cmp(&b.0));
                for pair in ranges.windows(2) {
                    assert!(
                        pair[0].1 + config.subtree_padding < pair[1].0 - config.subtree_padding,
                        "{newick}: padded ranges {:?} and {:?} intersect",
                        pair[0],
                        pair[1]
                    );
                }
            }
        }
    }

    #[test]
    fn test_height_grows_with_leaf_count() {
        let config = RectangularConfig::default();
        let leaves: Vec<String> = (0..60).map(|i| format!("L{i}")).collect();
        let newick = format!("({});", leaves.join(","));
        let (tree, extent) = run(&newick, &config, Viewport::new(800.0, 300.0));

        let band = EngineConfig::default().density_band(60);
        let expected = config.padding_top + config.padding_bottom + 59.0 * leaf_gap(&band, &config);
        assert!((extent.height - expected).abs() < 1e-9);
        assert!(extent.height > 300.0);
        assert_eq!(tree.leaf_count(), 60);
    }

    #[test]
    fn test_single_leaf_is_centred() {
        let config = RectangularConfig::default();
        let (tree, extent) = run("A;", &config, Viewport::new(400.0, 300.0));
        let a = at(&tree, "A");
        assert_eq!(extent.height, 300.0);
        assert!((a.x - 150.0).abs() < 1e-9);
        assert!(a.y.is_finite());
    }
}
