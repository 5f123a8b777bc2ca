//! PhyloTree - the node hierarchy shared by every pipeline stage.
//!
//! Topology lives in petgraph's StableGraph with one parent→child edge per
//! non-root node. Child order is the Newick order, kept on each node as its
//! sibling index, so traversals never depend on petgraph's edge ordering.

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::{Directed, Direction};
use std::collections::HashMap;

use super::node::{HierarchyView, TreeNode};

/// A rooted, ordered tree.
///
/// This struct manages:
/// - Graph topology via petgraph
/// - The id → index map for lookups by node id
/// - The root index
#[derive(Debug, Clone)]
pub struct PhyloTree {
    /// Nodes store the full TreeNode, edges carry no weight.
    graph: StableGraph<TreeNode, (), Directed>,

    /// Map from node id to petgraph NodeIndex
    ids: HashMap<String, NodeIndex>,

    root: NodeIndex,
}

impl PhyloTree {
    /// Create a tree holding only `root`.
    pub(crate) fn with_root(root: TreeNode) -> Self {
        let mut graph = StableGraph::new();
        let mut ids = HashMap::new();
        let id = root.id.clone();
        let index = graph.add_node(root);
        ids.insert(id, index);
        Self { graph, ids, root: index }
    }

    /// Append `node` as the last child of `parent`.
    pub(crate) fn add_child(&mut self, parent: NodeIndex, mut node: TreeNode) -> NodeIndex {
        node.sibling_index = self
            .graph
            .neighbors_directed(parent, Direction::Outgoing)
            .count();
        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.graph.add_edge(parent, index, ());
        self.ids.insert(id, index);
        index
    }

    /// An id that is not yet taken: the label, then the path id, then the
    /// path id with a numeric suffix.
    pub(crate) fn unique_id(&self, label: &str, path_id: &str) -> String {
        if !label.is_empty() && !self.ids.contains_key(label) {
            return label.to_string();
        }
        if !self.ids.contains_key(path_id) {
            return path_id.to_string();
        }
        (1..)
            .map(|n| format!("{path_id}#{n}"))
            .find(|candidate| !self.ids.contains_key(candidate))
            .unwrap_or_else(|| path_id.to_string())
    }

    // =========================================================================
    // Node Access
    // =========================================================================

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, index: NodeIndex) -> &TreeNode {
        &self.graph[index]
    }

    pub fn node_mut(&mut self, index: NodeIndex) -> &mut TreeNode {
        &mut self.graph[index]
    }

    /// Look up a node by id.
    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn leaf_count(&self) -> usize {
        self.graph
            .node_indices()
            .filter(|&index| self.is_leaf(index))
            .count()
    }

    pub fn is_leaf(&self, index: NodeIndex) -> bool {
        self.graph
            .neighbors_directed(index, Direction::Outgoing)
            .next()
            .is_none()
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .next()
    }

    /// Children in Newick order.
    pub fn children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .collect();
        children.sort_by_key(|&child| self.graph[child].sibling_index);
        children
    }

    /// Greatest depth of any node.
    pub fn max_depth(&self) -> u32 {
        self.graph
            .node_weights()
            .map(|node| node.depth)
            .max()
            .unwrap_or(0)
    }

    // =========================================================================
    // Traversals
    // =========================================================================

    /// Pre-order from the root, children in Newick order.
    pub fn preorder(&self) -> Vec<NodeIndex> {
        self.subtree(self.root)
    }

    /// Pre-order of the subtree rooted at `index`, including `index`.
    pub fn subtree(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut order = Vec::new();
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            order.push(current);
            let children = self.children(current);
            stack.extend(children.into_iter().rev());
        }
        order
    }

    /// Post-order from the root: every child before its parent, siblings in
    /// Newick order.
    pub fn postorder(&self) -> Vec<NodeIndex> {
        let mut order = Vec::with_capacity(self.node_count());
        let mut stack = vec![(self.root, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
                continue;
            }
            stack.push((current, true));
            let children = self.children(current);
            stack.extend(children.into_iter().rev().map(|child| (child, false)));
        }
        order
    }

    /// Leaves in Newick order.
    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.preorder()
            .into_iter()
            .filter(|&index| self.is_leaf(index))
            .collect()
    }

    /// `index` followed by each ancestor up to and including the root.
    pub fn ancestors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = vec![index];
        let mut current = index;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    // =========================================================================
    // Layout Utilities
    // =========================================================================

    /// Drop every layout annotation.
    pub fn clear_layout(&mut self) {
        for node in self.graph.node_weights_mut() {
            node.layout = None;
        }
    }

    /// Bounding box of laid-out `(x, y)` values as (min_x, min_y, max_x, max_y).
    pub fn layout_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for layout in self.graph.node_weights().filter_map(|node| node.layout) {
            bounds = Some(match bounds {
                None => (layout.x, layout.y, layout.x, layout.y),
                Some((min_x, min_y, max_x, max_y)) => (
                    min_x.min(layout.x),
                    min_y.min(layout.y),
                    max_x.max(layout.x),
                    max_y.max(layout.y),
                ),
            });
        }
        bounds
    }

    /// Nested view of the whole tree for serialization.
    pub fn to_view(&self) -> HierarchyView {
        self.view_of(self.root)
    }

    fn view_of(&self, index: NodeIndex) -> HierarchyView {
        let node = &self.graph[index];
        HierarchyView {
            id: node.id.clone(),
            name: node.name.clone(),
            branch_length: node.branch_length,
            count: node.count,
            depth: node.depth,
            x: node.layout.map(|layout| layout.x),
            y: node.layout.map(|layout| layout.y),
            distance: node.layout.map(|layout| layout.distance),
            polar: node.layout.and_then(|layout| layout.polar),
            children: self
                .children(index)
                .into_iter()
                .map(|child| self.view_of(child))
                .collect(),
        }
    }
}
