//! Buchheim-Junger-Leipert tidy tree layout algorithm.
//!
//! Implements the O(n) algorithm from "Improving Walker's Algorithm to Run in
//! Linear Time" (Buchheim, Junger, Leipert, 2002) for laying out arbitrary
//! m-ary trees with compact, aesthetically pleasing positioning.
//!
//! Only the breadth coordinate is computed here. Children keep their Newick
//! order, so leaves come out in the same order the tree lists them. The
//! rectangular layout uses these values as its raw vertical positions before
//! overlap correction.
//!
//! # Algorithm Overview
//!
//! 1. **First walk (bottom-up):** Recursively assign preliminary coordinates
//!    to each node by merging subtree contours. Uses threads for O(1) amortized
//!    contour traversal.
//! 2. **Second walk (top-down):** Apply accumulated modifiers to convert
//!    preliminary coordinates to final positions.

use std::collections::HashMap;

use crate::tree::{NodeIndex, PhyloTree};

/// Configuration for the tidy tree layout.
#[derive(Debug, Clone)]
pub struct TidyTreeConfig {
    /// Separation between adjacent nodes that share a parent.
    pub sibling_separation: f64,
    /// Separation between adjacent nodes of different parents.
    pub subtree_separation: f64,
}

impl Default for TidyTreeConfig {
    fn default() -> Self {
        Self {
            sibling_separation: 1.0,
            subtree_separation: 2.0,
        }
    }
}

/// Internal node data used during the Buchheim algorithm.
#[derive(Debug)]
struct LayoutNode {
    /// Index of the node in the tree.
    tree_index: NodeIndex,
    /// Parent layout index (None for root).
    parent: Option<usize>,
    /// Children, in Newick order.
    children: Vec<usize>,
    /// Preliminary coordinate (from first walk).
    prelim: f64,
    /// Modifier for subtree shift (accumulated in first walk, applied in second).
    modifier: f64,
    /// Contour thread for nodes without children.
    thread: Option<usize>,
    /// Ancestor pointer (for the "default ancestor" in apportion).
    ancestor: usize,
    /// Shift value for even spacing of intermediate children.
    shift: f64,
    /// Change value for even spacing of intermediate children.
    change: f64,
    /// Left-to-right index among siblings.
    number: usize,
}

/// The tidy tree layout engine.
pub struct TidyTreeLayout {
    config: TidyTreeConfig,
}

impl TidyTreeLayout {
    /// Create a new tidy tree layout with the given configuration.
    pub fn new(config: TidyTreeConfig) -> Self {
        Self { config }
    }

    /// Compute breadth coordinates for every node, shifted so the smallest
    /// is 0.
    pub fn compute(&self, tree: &PhyloTree) -> HashMap<NodeIndex, f64> {
        let mut nodes = Self::build_layout_tree(tree);

        self.first_walk(0, &mut nodes);

        let mut final_x = vec![0.0; nodes.len()];
        Self::second_walk(0, 0.0, &nodes, &mut final_x);

        let min_x = final_x.iter().copied().fold(f64::INFINITY, f64::min);
        let offset = if min_x.is_finite() { min_x } else { 0.0 };

        nodes
            .iter()
            .zip(final_x)
            .map(|(node, x)| (node.tree_index, x - offset))
            .collect()
    }

    /// Flatten the tree in pre-order so the root sits at layout index 0.
    fn build_layout_tree(tree: &PhyloTree) -> Vec<LayoutNode> {
        let order = tree.preorder();
        let slot_of: HashMap<NodeIndex, usize> = order
            .iter()
            .enumerate()
            .map(|(slot, &index)| (index, slot))
            .collect();

        order
            .iter()
            .enumerate()
            .map(|(slot, &index)| {
                let children: Vec<usize> = tree
                    .children(index)
                    .iter()
                    .filter_map(|child| slot_of.get(child).copied())
                    .collect();
                let parent = tree.parent(index).and_then(|p| slot_of.get(&p).copied());
                let number = parent
                    .map(|_| tree.node(index).sibling_index)
                    .unwrap_or(0);
                LayoutNode {
                    tree_index: index,
                    parent,
                    children,
                    prelim: 0.0,
                    modifier: 0.0,
                    thread: None,
                    ancestor: slot,
                    shift: 0.0,
                    change: 0.0,
                    number,
                }
            })
            .collect()
    }

    /// Separation wanted between two neighbouring nodes on one level.
    fn distance(&self, a: usize, b: usize, nodes: &[LayoutNode]) -> f64 {
        if nodes[a].parent.is_some() && nodes[a].parent == nodes[b].parent {
            self.config.sibling_separation
        } else {
            self.config.subtree_separation
        }
    }

    fn left_sibling(v: usize, nodes: &[LayoutNode]) -> Option<usize> {
        let parent = nodes[v].parent?;
        let number = nodes[v].number;
        if number == 0 {
            None
        } else {
            nodes[parent].children.get(number - 1).copied()
        }
    }

    fn leftmost_sibling(v: usize, nodes: &[LayoutNode]) -> usize {
        nodes[v]
            .parent
            .and_then(|parent| nodes[parent].children.first().copied())
            .unwrap_or(v)
    }

    /// Next node on the left contour of a subtree.
    fn next_left(v: usize, nodes: &[LayoutNode]) -> Option<usize> {
        nodes[v].children.first().copied().or(nodes[v].thread)
    }

    /// Next node on the right contour of a subtree.
    fn next_right(v: usize, nodes: &[LayoutNode]) -> Option<usize> {
        nodes[v].children.last().copied().or(nodes[v].thread)
    }

    /// Buchheim first walk: bottom-up assignment of preliminary coordinates.
    fn first_walk(&self, v: usize, nodes: &mut [LayoutNode]) {
        let children = nodes[v].children.clone();
        let left_sibling = Self::left_sibling(v, nodes);

        if children.is_empty() {
            nodes[v].prelim = match left_sibling {
                Some(w) => nodes[w].prelim + self.distance(w, v, nodes),
                None => 0.0,
            };
            return;
        }

        let mut default_ancestor = children[0];
        for &child in &children {
            self.first_walk(child, nodes);
            default_ancestor = self.apportion(child, default_ancestor, nodes);
        }

        Self::execute_shifts(v, nodes);

        let midpoint = (nodes[children[0]].prelim + nodes[children[children.len() - 1]].prelim) / 2.0;
        match left_sibling {
            Some(w) => {
                nodes[v].prelim = nodes[w].prelim + self.distance(w, v, nodes);
                nodes[v].modifier = nodes[v].prelim - midpoint;
            }
            None => nodes[v].prelim = midpoint,
        }
    }

    /// Apportion: push `v`'s subtree right until it clears every subtree to
    /// its left, spreading the shift over the siblings in between.
    fn apportion(&self, v: usize, mut default_ancestor: usize, nodes: &mut [LayoutNode]) -> usize {
        let Some(w) = Self::left_sibling(v, nodes) else {
            return default_ancestor;
        };

        // inner/outer contours on the right (v's side) and left (w's side)
        let mut v_inner_right = v;
        let mut v_outer_right = v;
        let mut v_inner_left = w;
        let mut v_outer_left = Self::leftmost_sibling(v, nodes);

        let mut s_inner_right = nodes[v_inner_right].modifier;
        let mut s_outer_right = nodes[v_outer_right].modifier;
        let mut s_inner_left = nodes[v_inner_left].modifier;
        let mut s_outer_left = nodes[v_outer_left].modifier;

        loop {
            let (Some(next_il), Some(next_ir)) = (
                Self::next_right(v_inner_left, nodes),
                Self::next_left(v_inner_right, nodes),
            ) else {
                break;
            };
            v_inner_left = next_il;
            v_inner_right = next_ir;
            if let Some(next) = Self::next_left(v_outer_left, nodes) {
                v_outer_left = next;
            }
            if let Some(next) = Self::next_right(v_outer_right, nodes) {
                v_outer_right = next;
            }
            nodes[v_outer_right].ancestor = v;

            let shift = (nodes[v_inner_left].prelim + s_inner_left)
                - (nodes[v_inner_right].prelim + s_inner_right)
                + self.distance(v_inner_left, v_inner_right, nodes);
            if shift > 0.0 {
                let ancestor = self.ancestor(v_inner_left, v, default_ancestor, nodes);
                Self::move_subtree(ancestor, v, shift, nodes);
                s_inner_right += shift;
                s_outer_right += shift;
            }

            s_inner_left += nodes[v_inner_left].modifier;
            s_inner_right += nodes[v_inner_right].modifier;
            s_outer_left += nodes[v_outer_left].modifier;
            s_outer_right += nodes[v_outer_right].modifier;
        }

        // Set threads
        if let Some(next) = Self::next_right(v_inner_left, nodes) {
            if Self::next_right(v_outer_right, nodes).is_none() {
                nodes[v_outer_right].thread = Some(next);
                nodes[v_outer_right].modifier += s_inner_left - s_outer_right;
            }
        }
        if let Some(next) = Self::next_left(v_inner_right, nodes) {
            if Self::next_left(v_outer_left, nodes).is_none() {
                nodes[v_outer_left].thread = Some(next);
                nodes[v_outer_left].modifier += s_inner_right - s_outer_left;
                default_ancestor = v;
            }
        }

        default_ancestor
    }

    /// The greatest distinct ancestor of `v_inner_left` among `v`'s siblings,
    /// or the default ancestor.
    fn ancestor(&self, v_inner_left: usize, v: usize, default_ancestor: usize, nodes: &[LayoutNode]) -> usize {
        let candidate = nodes[v_inner_left].ancestor;
        if candidate != v && nodes[candidate].parent.is_some() && nodes[candidate].parent == nodes[v].parent {
            candidate
        } else {
            default_ancestor
        }
    }

    /// Move subtree: shift `wr` right and record how the shift spreads over
    /// the siblings between `wl` and `wr`.
    fn move_subtree(wl: usize, wr: usize, shift: f64, nodes: &mut [LayoutNode]) {
        let subtrees = (nodes[wr].number as f64 - nodes[wl].number as f64).max(1.0);
        let per_subtree = shift / subtrees;

        nodes[wr].change -= per_subtree;
        nodes[wr].shift += shift;
        nodes[wl].change += per_subtree;
        nodes[wr].prelim += shift;
        nodes[wr].modifier += shift;
    }

    /// Execute accumulated shifts for children of node v.
    fn execute_shifts(v: usize, nodes: &mut [LayoutNode]) {
        let children = nodes[v].children.clone();
        let mut shift = 0.0;
        let mut change = 0.0;

        for &child in children.iter().rev() {
            nodes[child].prelim += shift;
            nodes[child].modifier += shift;
            change += nodes[child].change;
            shift += nodes[child].shift + change;
        }
    }

    /// Second walk: apply accumulated modifiers to get final coordinates.
    fn second_walk(v: usize, modifier_sum: f64, nodes: &[LayoutNode], final_x: &mut [f64]) {
        final_x[v] = nodes[v].prelim + modifier_sum;

        for &child in &nodes[v].children {
            Self::second_walk(child, modifier_sum + nodes[v].modifier, nodes, final_x);
        }
    }
}
