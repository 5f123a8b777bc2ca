//! Radial cluster layout.
//!
//! Leaves are spread around the full circle in Newick order, so the angle
//! depends only on leaf order. Adjacent siblings sit one unit apart and
//! adjacent leaves with different parents sit `separation` units apart (the
//! last-to-first wrap included); the units are then scaled to fill 2π. With a
//! separation of 1 every gap is 2π/N. Internal nodes take the mean angle of
//! their children. The radius is `depth * branch_unit` for every node; branch
//! lengths do not move nodes outward.

use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::config::{DensityBand, RadialConfig, Viewport};
use crate::tree::{NodeIndex, NodeLayout, PhyloTree, Polar};

/// Smallest ring budget, in pixels, before the label margin is ignored.
const MIN_RING_SPAN: f64 = 50.0;

/// Pixels per depth level: the configured unit, or the free radius divided
/// by the deepest level.
pub fn branch_unit(tree: &PhyloTree, viewport: Viewport, config: &RadialConfig) -> f64 {
    if let Some(unit) = config.branch_unit.filter(|unit| unit.is_finite() && *unit > 0.0) {
        return unit;
    }
    let available = (viewport.width.min(viewport.height) / 2.0 - config.label_margin).max(MIN_RING_SPAN);
    available / f64::from(tree.max_depth().max(1))
}

/// Annotate every node with angle (`x`), radius (`y`) and a polar snapshot.
pub fn layout_radial(
    tree: &mut PhyloTree,
    viewport: Viewport,
    band: &DensityBand,
    config: &RadialConfig,
    distances: &HashMap<NodeIndex, f64>,
) {
    let unit = branch_unit(tree, viewport, config);
    let angles = cluster_angles(tree, band.separation);

    for index in tree.preorder() {
        let angle = angles.get(&index).copied().unwrap_or(0.0);
        let node = tree.node_mut(index);
        let radius = f64::from(node.depth) * unit;
        node.layout = Some(NodeLayout {
            x: angle,
            y: radius,
            distance: distances.get(&index).copied().unwrap_or(0.0),
            polar: Some(Polar { angle, radius }),
        });
    }
}

/// Leaf angles by cumulative separation, internal angles by child mean.
fn cluster_angles(tree: &PhyloTree, separation: f64) -> HashMap<NodeIndex, f64> {
    let leaves = tree.leaves();
    let separation = if separation.is_finite() && separation > 0.0 {
        separation
    } else {
        1.0
    };
    let gap = |a: NodeIndex, b: NodeIndex| {
        if tree.parent(a) == tree.parent(b) {
            1.0
        } else {
            separation
        }
    };

    // Offset of each leaf in gap units, then the closing gap back to the first
    let mut offsets = Vec::with_capacity(leaves.len());
    let mut offset = 0.0;
    for (i, &leaf) in leaves.iter().enumerate() {
        if i > 0 {
            offset += gap(leaves[i - 1], leaf);
        }
        offsets.push(offset);
    }
    let span = match (leaves.first(), leaves.last()) {
        (Some(&first), Some(&last)) if leaves.len() > 1 => offset + gap(last, first),
        _ => 1.0,
    };

    let mut angles = HashMap::with_capacity(tree.node_count());
    for (&leaf, offset) in leaves.iter().zip(offsets) {
        angles.insert(leaf, TAU * offset / span);
    }

    for index in tree.postorder() {
        let children = tree.children(index);
        if children.is_empty() {
            continue;
        }
        let sum: f64 = children
            .iter()
            .map(|child| angles.get(child).copied().unwrap_or(0.0))
            .sum();
        angles.insert(index, sum / children.len() as f64);
    }
    angles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::tree::parse;

    fn run(newick: &str, viewport: Viewport) -> PhyloTree {
        let mut tree = parse(newick).unwrap();
        let config = EngineConfig::default();
        let band = config.density_band(tree.leaf_count());
        let distances = HashMap::new();
        layout_radial(&mut tree, viewport, &band, &config.radial, &distances);
        tree
    }

    fn polar(tree: &PhyloTree, id: &str) -> Polar {
        tree.node(tree.find(id).unwrap()).layout.unwrap().polar.unwrap()
    }

    fn angle_gaps(tree: &PhyloTree) -> Vec<f64> {
        let angles: Vec<f64> = tree
            .leaves()
            .into_iter()
            .map(|leaf| tree.node(leaf).layout.unwrap().x)
            .collect();
        let mut gaps: Vec<f64> = angles.windows(2).map(|pair| pair[1] - pair[0]).collect();
        gaps.push(angles[0] + TAU - angles[angles.len() - 1]);
        gaps
    }

    #[test]
    fn test_siblings_are_equally_spaced() {
        let tree = run("(A,B,C,D,E,F);", Viewport::new(800.0, 800.0));
        let expected = TAU / 6.0;
        for gap in angle_gaps(&tree) {
            assert!((gap - expected).abs() < 1e-9, "gap {gap} differs from {expected}");
        }
    }

    #[test]
    fn test_unit_separation_spaces_every_leaf_equally() {
        let mut tree = parse("((A,B),(C,(D,E)),F);").unwrap();
        let config = EngineConfig::default();
        let band = DensityBand {
            separation: 1.0,
            ..config.density_band(6)
        };
        layout_radial(&mut tree, Viewport::default(), &band, &config.radial, &HashMap::new());

        let expected = TAU / 6.0;
        for gap in angle_gaps(&tree) {
            assert!((gap - expected).abs() < 1e-9, "gap {gap} differs from {expected}");
        }
    }

    #[test]
    fn test_separation_widens_gaps_between_clades() {
        // Leaves A B | C D | E, wrap E -> A crosses clades too
        let tree = run("((A,B),(C,D),E);", Viewport::default());
        let separation = EngineConfig::default().density_band(5).separation;
        assert!(separation > 1.0);

        let gaps = angle_gaps(&tree);
        let unit = TAU / (2.0 + 3.0 * separation);
        let expected = [unit, unit * separation, unit, unit * separation, unit * separation];
        for (gap, want) in gaps.iter().zip(expected) {
            assert!((gap - want).abs() < 1e-9, "gaps {gaps:?}, expected {expected:?}");
        }
        let total: f64 = gaps.iter().sum();
        assert!((total - TAU).abs() < 1e-9);
    }

    #[test]
    fn test_denser_band_packs_clades_tighter() {
        let newick = "((A,B),(C,D));";
        let config = EngineConfig::default();
        let sparse = config.density_band(4);
        let dense = config.density_band(500);
        assert!(dense.separation < sparse.separation);

        let cross_gap = |band: &DensityBand| {
            let mut tree = parse(newick).unwrap();
            layout_radial(&mut tree, Viewport::default(), band, &config.radial, &HashMap::new());
            angle_gaps(&tree)[1]
        };
        assert!(cross_gap(&dense) < cross_gap(&sparse));
    }

    #[test]
    fn test_radius_follows_depth_not_branch_length() {
        let tree = run("((A:0.001,B:5.0):0.3,C:0.4);", Viewport::new(600.0, 600.0));
        let unit = polar(&tree, "root_0").radius;
        assert!(unit > 0.0);
        assert_eq!(polar(&tree, "root").radius, 0.0);
        assert!((polar(&tree, "A").radius - 2.0 * unit).abs() < 1e-9);
        assert!((polar(&tree, "B").radius - 2.0 * unit).abs() < 1e-9);
        assert!((polar(&tree, "C").radius - unit).abs() < 1e-9);
    }

    #[test]
    fn test_internal_angle_is_child_mean() {
        let tree = run("((A,B),C,D);", Viewport::default());
        let a = polar(&tree, "A").angle;
        let b = polar(&tree, "B").angle;
        assert!((polar(&tree, "root_0").angle - (a + b) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_configured_branch_unit() {
        let mut tree = parse("((A,B),C);").unwrap();
        let config = RadialConfig {
            branch_unit: Some(40.0),
            ..Default::default()
        };
        assert_eq!(branch_unit(&tree, Viewport::default(), &config), 40.0);

        let band = EngineConfig::default().density_band(3);
        layout_radial(&mut tree, Viewport::default(), &band, &config, &HashMap::new());
        assert_eq!(polar(&tree, "A").radius, 80.0);
    }

    #[test]
    fn test_derived_branch_unit_fits_viewport() {
        let tree = parse("(((A,B),C),D);").unwrap();
        let config = RadialConfig::default();
        let unit = branch_unit(&tree, Viewport::new(800.0, 600.0), &config);
        // (300 - 120) / 3 levels
        assert!((unit - 60.0).abs() < 1e-9, "unit was {unit}");

        // A tiny viewport still yields a positive unit
        let unit = branch_unit(&tree, Viewport::new(10.0, 10.0), &config);
        assert!(unit > 0.0);
    }

    #[test]
    fn test_single_node_tree() {
        let tree = run("A;", Viewport::default());
        let p = polar(&tree, "A");
        assert_eq!(p.angle, 0.0);
        assert_eq!(p.radius, 0.0);
    }
}
