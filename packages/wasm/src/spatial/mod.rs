//! Spatial indexing for O(log n) hit testing of projected nodes.

mod rtree;

pub use rtree::{NodePoint, SpatialIndex};
