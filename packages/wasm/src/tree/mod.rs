//! Species tree data structures and the Newick parser.
//!
//! A parse call builds a fresh [`PhyloTree`]; later stages decorate its
//! nodes in place with counts and layout fields.

mod hierarchy;
pub mod newick;
mod node;

pub use hierarchy::PhyloTree;
pub use newick::parse;
pub use node::{HierarchyView, NodeLayout, Polar, TreeNode};
pub use petgraph::stable_graph::NodeIndex;
