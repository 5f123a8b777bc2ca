//! Render projector: laid-out nodes to drawable primitives.
//!
//! Produces screen positions, count-scaled circle radii, truncated leaf
//! labels and link path strings. The drawing layer only has to emit them.

mod label;
mod link;

use std::collections::HashSet;

use serde::Serialize;

use crate::config::{EngineConfig, LayoutMode, RadiusRange};
use crate::layout::LayoutResult;
use crate::tree::{NodeLayout, PhyloTree};

pub use label::{LabelPrimitive, TextAnchor, truncate_label};
pub use link::{elbow_path, radial_path};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePrimitive {
    pub id: String,
    pub name: String,
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    pub is_leaf: bool,
    pub highlighted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelPrimitive>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPrimitive {
    pub source: String,
    pub target: String,
    pub path: String,
    pub highlighted: bool,
}

/// Everything the drawing layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPrimitives {
    pub mode: LayoutMode,
    pub width: f64,
    pub height: f64,
    /// Pre-order.
    pub nodes: Vec<NodePrimitive>,
    /// One per non-root node, pre-order by target.
    pub links: Vec<LinkPrimitive>,
}

/// Circle radius: linear in `count` over `[0, max_count]`, clamped to
/// `range`. Nodes without a count get `base`.
pub fn node_radius(count: Option<u64>, max_count: u64, range: RadiusRange, base: f64) -> f64 {
    let Some(count) = count else {
        return base;
    };
    if max_count == 0 {
        return range.min;
    }
    let t = count as f64 / max_count as f64;
    (range.min + t * (range.max - range.min)).clamp(range.min.min(range.max), range.max.max(range.min))
}

/// Screen position of a laid-out node.
pub fn screen_position(layout: &NodeLayout, mode: LayoutMode, center: (f64, f64)) -> (f64, f64) {
    match (mode, layout.polar) {
        (LayoutMode::Radial, Some(polar)) => {
            let (dx, dy) = polar.to_cartesian();
            (center.0 + dx, center.1 + dy)
        }
        // Rectangular: depth axis runs left to right
        _ => (layout.y, layout.x),
    }
}

/// Project a laid-out tree into drawable primitives.
pub fn project(
    tree: &PhyloTree,
    layout: &LayoutResult,
    highlights: &HashSet<String>,
    config: &EngineConfig,
) -> RenderPrimitives {
    let center = (layout.width / 2.0, layout.height / 2.0);
    let band = &layout.band;
    let max_leaf_count = tree
        .leaves()
        .into_iter()
        .filter_map(|leaf| tree.node(leaf).count)
        .max()
        .unwrap_or(0);

    let order = tree.preorder();
    let mut nodes = Vec::with_capacity(order.len());
    let mut links = Vec::with_capacity(order.len().saturating_sub(1));

    for &index in &order {
        let node = tree.node(index);
        let Some(node_layout) = node.layout else {
            continue;
        };
        let (cx, cy) = screen_position(&node_layout, layout.mode, center);
        let radius = node_radius(node.count, max_leaf_count, band.node_radius, config.base_node_radius);
        let is_leaf = tree.is_leaf(index);
        let highlighted = highlights.contains(&node.id);

        let label = is_leaf.then(|| {
            let text = truncate_label(&node.name, band.label_chars);
            match (layout.mode, node_layout.polar) {
                (LayoutMode::Radial, Some(polar)) => label::radial_label(text, center, polar, radius),
                _ => label::rectangular_label(text, cx, cy, radius),
            }
        });

        let parent = tree
            .parent(index)
            .and_then(|parent| tree.node(parent).layout.map(|layout| (parent, layout)));
        if let Some((parent, parent_layout)) = parent {
            let path = match (layout.mode, parent_layout.polar, node_layout.polar) {
                (LayoutMode::Radial, Some(from), Some(to)) => {
                    radial_path(center, from, to, config.radial.link_epsilon)
                }
                _ => elbow_path(
                    screen_position(&parent_layout, layout.mode, center),
                    (cx, cy),
                ),
            };
            let source = tree.node(parent).id.clone();
            links.push(LinkPrimitive {
                highlighted: highlighted && highlights.contains(&source),
                source,
                target: node.id.clone(),
                path,
            });
        }

        nodes.push(NodePrimitive {
            id: node.id.clone(),
            name: node.name.clone(),
            cx,
            cy,
            radius,
            count: node.count,
            is_leaf,
            highlighted,
            label,
        });
    }

    RenderPrimitives {
        mode: layout.mode,
        width: layout.width,
        height: layout.height,
        nodes,
        links,
    }
}
