//! Tree node type and its layout annotations.
//!
//! Each node has:
//! - A stable string id (label, or a path-based id for unlabeled nodes)
//! - The raw Newick label and optional branch length
//! - An optional occurrence count, set by count aggregation
//! - Layout fields, attached by the layout engine

use serde::Serialize;

/// One node of a parsed species tree.
///
/// `id`, `name` and `branch_length` are fixed by the parser; later stages
/// only write `count` and `layout`.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: String,
    pub name: String,
    pub branch_length: Option<f64>,
    /// Occurrence count. Never `Some(0)`.
    pub count: Option<u64>,
    /// Edges from the root.
    pub depth: u32,
    /// Layout annotation from the last layout pass.
    pub layout: Option<NodeLayout>,
    /// Position among the parent's children, in Newick order.
    pub(crate) sibling_index: usize,
}

impl TreeNode {
    pub(crate) fn new(id: String, name: String, branch_length: Option<f64>, depth: u32) -> Self {
        Self {
            id,
            name,
            branch_length,
            count: None,
            depth,
            layout: None,
            sibling_index: 0,
        }
    }
}

/// Polar coordinates: angle in radians clockwise from 12 o'clock, radius in
/// pixels from the tree centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Polar {
    pub angle: f64,
    pub radius: f64,
}

impl Polar {
    /// Cartesian offset from the centre, y pointing down.
    #[inline]
    pub fn to_cartesian(self) -> (f64, f64) {
        (self.radius * self.angle.sin(), -self.radius * self.angle.cos())
    }
}

/// Positional fields written by a layout pass.
///
/// `x` is the breadth axis (angle in radial mode, vertical pixels in
/// rectangular mode) and `y` is the depth axis (radius, or horizontal pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeLayout {
    pub x: f64,
    pub y: f64,
    /// Cumulative branch length from the root.
    pub distance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polar: Option<Polar>,
}

/// Nested, serializable view of a decorated hierarchy for the drawing layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyView {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    pub depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polar: Option<Polar>,
    pub children: Vec<HierarchyView>,
}
