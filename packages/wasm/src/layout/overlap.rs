//! Overlap resolver for rectangular layouts.
//!
//! Works on the vertical axis (`layout.x`). Post-order, each internal node's
//! child subtrees are sorted by centre and pushed down until their padded
//! vertical ranges are disjoint; a push cascades to every later sibling. The
//! parent is then centred on its first and last child.
//!
//! A final pass redistributes all leaves at one uniform gap over the
//! available extent and re-centres every internal node on its children.

use crate::tree::{NodeIndex, PhyloTree};

/// Padding and extent for one resolver run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverSettings {
    /// Added on both sides of a subtree's range before overlap checks.
    pub padding: f64,
    /// Extra push on top of a measured overlap.
    pub buffer: f64,
    /// Topmost leaf position.
    pub top: f64,
    /// Bottommost leaf position.
    pub bottom: f64,
}

/// Run overlap correction, then the equal-leaf-spacing pass.
pub fn resolve(tree: &mut PhyloTree, settings: &ResolverSettings) {
    resolve_overlaps(tree, settings.padding, settings.buffer);
    equalize_leaf_spacing(tree, settings.top, settings.bottom);
}

/// Vertical position of a laid-out node.
fn vertical(tree: &PhyloTree, index: NodeIndex) -> f64 {
    tree.node(index).layout.map(|layout| layout.x).unwrap_or(0.0)
}

fn set_vertical(tree: &mut PhyloTree, index: NodeIndex, x: f64) {
    if let Some(layout) = tree.node_mut(index).layout.as_mut() {
        layout.x = x;
    }
}

/// `[min, max]` of the vertical positions in the subtree at `index`.
pub fn subtree_range(tree: &PhyloTree, index: NodeIndex) -> (f64, f64) {
    tree.subtree(index)
        .into_iter()
        .map(|node| vertical(tree, node))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        })
}

fn shift_subtree(tree: &mut PhyloTree, index: NodeIndex, delta: f64) {
    for node in tree.subtree(index) {
        if let Some(layout) = tree.node_mut(node).layout.as_mut() {
            layout.x += delta;
        }
    }
}

/// Children sorted by their current vertical position.
fn sorted_children(tree: &PhyloTree, index: NodeIndex) -> Vec<NodeIndex> {
    let mut children = tree.children(index);
    children.sort_by(|&a, &b| vertical(tree, a).total_cmp(&vertical(tree, b)));
    children
}

/// Separate sibling subtrees bottom-up so no two padded ranges intersect.
pub fn resolve_overlaps(tree: &mut PhyloTree, padding: f64, buffer: f64) {
    for index in tree.postorder() {
        let children = sorted_children(tree, index);
        let (Some(&first), Some(&last)) = (children.first(), children.last()) else {
            continue;
        };

        let mut cumulative = 0.0;
        let mut previous_bottom: Option<f64> = None;
        for &child in &children {
            let (lo, hi) = subtree_range(tree, child);
            let top = lo - padding + cumulative;
            if let Some(previous_bottom) = previous_bottom {
                let overlap = previous_bottom - top;
                if overlap >= 0.0 {
                    cumulative += overlap + buffer;
                }
            }
            if cumulative != 0.0 {
                shift_subtree(tree, child, cumulative);
            }
            previous_bottom = Some(hi + padding + cumulative);
        }

        let midpoint = (vertical(tree, first) + vertical(tree, last)) / 2.0;
        set_vertical(tree, index, midpoint);
    }
}

/// Place leaves at a uniform gap between `top` and `bottom`, keeping their
/// current vertical order, then centre every internal node on its children.
pub fn equalize_leaf_spacing(tree: &mut PhyloTree, top: f64, bottom: f64) {
    let mut leaves = tree.leaves();
    leaves.sort_by(|&a, &b| vertical(tree, a).total_cmp(&vertical(tree, b)));

    let span = (bottom - top).max(0.0);
    match leaves.len() {
        0 => return,
        1 => set_vertical(tree, leaves[0], top + span / 2.0),
        n => {
            let gap = span / (n - 1) as f64;
            for (i, &leaf) in leaves.iter().enumerate() {
                set_vertical(tree, leaf, top + gap * i as f64);
            }
        }
    }

    for index in tree.postorder() {
        let children = sorted_children(tree, index);
        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            let midpoint = (vertical(tree, first) + vertical(tree, last)) / 2.0;
            set_vertical(tree, index, midpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeLayout, parse};

    fn place(tree: &mut PhyloTree, positions: &[(&str, f64)]) {
        for index in tree.preorder() {
            tree.node_mut(index).layout = Some(NodeLayout {
                x: 0.0,
                y: 0.0,
                distance: 0.0,
                polar: None,
            });
        }
        for &(id, x) in positions {
            let index = tree.find(id).unwrap();
            set_vertical(tree, index, x);
        }
    }

    fn x(tree: &PhyloTree, id: &str) -> f64 {
        vertical(tree, tree.find(id).unwrap())
    }

    #[test]
    fn test_overlapping_subtrees_are_pushed_apart() {
        let mut tree = parse("((A,B),(C,D));").unwrap();
        place(&mut tree, &[("A", 0.0), ("B", 10.0), ("C", 5.0), ("D", 15.0)]);

        resolve_overlaps(&mut tree, 2.0, 1.0);

        let left = tree.find("root_0").unwrap();
        let right = tree.find("root_1").unwrap();
        let (_, left_hi) = subtree_range(&tree, left);
        let (right_lo, _) = subtree_range(&tree, right);
        assert!(
            left_hi + 2.0 < right_lo - 2.0,
            "padded ranges still intersect: {left_hi} vs {right_lo}"
        );
        assert!(x(&tree, "A") < x(&tree, "B"));
        assert!(x(&tree, "B") < x(&tree, "C"));
        assert!(x(&tree, "C") < x(&tree, "D"));

        // Parent sits between its first and last child
        let root_x = x(&tree, "root");
        let expected = (x(&tree, "root_0") + x(&tree, "root_1")) / 2.0;
        assert!((root_x - expected).abs() < 1e-9);
    }

    #[test]
    fn test_shift_cascades_to_later_siblings() {
        let mut tree = parse("(A,B,C);").unwrap();
        place(&mut tree, &[("A", 0.0), ("B", 1.0), ("C", 30.0)]);

        resolve_overlaps(&mut tree, 5.0, 0.5);

        // Padded ranges [-5, 5] and [-4, 6] overlap by 9; B moves 9.5 and C follows
        assert!((x(&tree, "B") - 10.5).abs() < 1e-9, "B at {}", x(&tree, "B"));
        assert!((x(&tree, "C") - 39.5).abs() < 1e-9, "C at {}", x(&tree, "C"));
        assert!((x(&tree, "root") - 19.75).abs() < 1e-9);
    }

    #[test]
    fn test_equal_spacing_pass() {
        let mut tree = parse("((A,(B,C)),D);").unwrap();
        place(&mut tree, &[("A", 3.0), ("B", 4.0), ("C", 20.0), ("D", 21.0)]);

        equalize_leaf_spacing(&mut tree, 10.0, 70.0);

        assert_eq!(x(&tree, "A"), 10.0);
        assert_eq!(x(&tree, "B"), 30.0);
        assert_eq!(x(&tree, "C"), 50.0);
        assert_eq!(x(&tree, "D"), 70.0);
        assert_eq!(x(&tree, "root_0_1"), 40.0);
        assert_eq!(x(&tree, "root_0"), 25.0);
        assert_eq!(x(&tree, "root"), 47.5);
    }

    #[test]
    fn test_single_leaf_is_centred() {
        let mut tree = parse("A;").unwrap();
        place(&mut tree, &[("A", 123.0)]);
        resolve(
            &mut tree,
            &ResolverSettings {
                padding: 4.0,
                buffer: 2.0,
                top: 20.0,
                bottom: 80.0,
            },
        );
        assert_eq!(x(&tree, "A"), 50.0);
    }

    #[test]
    fn test_unary_chain_follows_its_child() {
        let mut tree = parse("((A));").unwrap();
        place(&mut tree, &[("A", 7.0)]);
        resolve_overlaps(&mut tree, 4.0, 2.0);
        assert_eq!(x(&tree, "root_0"), 7.0);
        assert_eq!(x(&tree, "root"), 7.0);
    }
}
