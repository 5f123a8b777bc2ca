//! R-tree based hit testing using the rstar crate.
//!
//! Points are projected node centres in screen pixels, so a pointer event can
//! be mapped straight to a node id.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::render::NodePrimitive;

/// A projected node centre.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl NodePoint {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self { id: id.into(), x, y }
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        (self.x - point[0]).abs() < f64::EPSILON && (self.y - point[1]).abs() < f64::EPSILON
    }
}

/// Spatial index over the nodes of the current frame.
pub struct SpatialIndex {
    tree: RTree<NodePoint>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Index every node centre of a projected frame.
    pub fn from_primitives(nodes: &[NodePrimitive]) -> Self {
        let mut index = Self::new();
        index.rebuild(
            nodes
                .iter()
                .map(|node| NodePoint::new(node.id.clone(), node.cx, node.cy))
                .collect(),
        );
        index
    }

    /// Replace the contents in one bulk load.
    pub fn rebuild(&mut self, points: Vec<NodePoint>) {
        self.tree = RTree::bulk_load(points);
    }

    /// Id of the nearest node no further than `max_distance` from `(x, y)`.
    pub fn node_at(&self, x: f64, y: f64, max_distance: f64) -> Option<&str> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|point| point.distance_2(&[x, y]) <= max_distance_sq)
            .map(|point| point.id.as_str())
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SpatialIndex {
        let mut index = SpatialIndex::new();
        index.rebuild(vec![
            NodePoint::new("root", 0.0, 0.0),
            NodePoint::new("A", 10.0, 10.0),
            NodePoint::new("B", 5.0, 5.0),
        ]);
        index
    }

    #[test]
    fn test_node_at() {
        let index = sample();
        assert_eq!(index.node_at(0.5, 0.0, 2.0), Some("root"));
        assert_eq!(index.node_at(6.0, 6.0, 2.0), Some("B"));
        assert_eq!(index.node_at(11.0, 11.0, 2.0), Some("A"));
    }

    #[test]
    fn test_node_at_respects_max_distance() {
        let index = sample();
        // Background click
        assert_eq!(index.node_at(2.5, 0.0, 1.0), None);
        // B is ~2.83 from (3, 3)
        assert_eq!(index.node_at(3.0, 3.0, 2.5), None);
        assert_eq!(index.node_at(3.0, 3.0, 3.0), Some("B"));
    }

    #[test]
    fn test_rebuild_and_clear() {
        let mut index = sample();
        assert_eq!(index.len(), 3);

        index.rebuild(vec![NodePoint::new("C", 100.0, 100.0)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.node_at(0.0, 0.0, 10.0), None);

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.node_at(100.0, 100.0, 10.0), None);
    }
}
