//! Selection tracking.
//!
//! Selection is a two-state value owned by the caller. Everything here is a
//! pure function of the current tree and that value.

use std::collections::HashSet;

use crate::counts::SpeciesMatcher;
use crate::log::log_warn;
use crate::tree::{NodeIndex, PhyloTree};

/// Which node, if any, is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(String),
}

impl SelectionState {
    /// Selecting the selected node deselects it; any other node replaces the
    /// current selection.
    #[must_use]
    pub fn toggle(&self, node_id: &str) -> Self {
        match self {
            Self::Selected(current) if current == node_id => Self::Unselected,
            _ => Self::Selected(node_id.to_string()),
        }
    }

    #[must_use]
    pub fn clear(&self) -> Self {
        Self::Unselected
    }

    pub fn selected_id(&self) -> Option<&str> {
        match self {
            Self::Unselected => None,
            Self::Selected(id) => Some(id),
        }
    }
}

/// Node ids from the root down to `node_id`. Empty for `None` or an id the
/// tree does not contain.
pub fn path_to_root(tree: &PhyloTree, node_id: Option<&str>) -> Vec<String> {
    let Some(index) = node_id.and_then(|id| tree.find(id)) else {
        return Vec::new();
    };
    let mut path: Vec<String> = tree
        .ancestors(index)
        .into_iter()
        .map(|ancestor| tree.node(ancestor).id.clone())
        .collect();
    path.reverse();
    path
}

/// Ids on the selected path, for highlight styling.
pub fn highlight_set(tree: &PhyloTree, selection: &SelectionState) -> HashSet<String> {
    path_to_root(tree, selection.selected_id()).into_iter().collect()
}

/// Node for an externally selected species name: an exact match over all
/// nodes first, then the fuzzy policy. Leaves are preferred within a pass.
pub fn find_node_for_species(
    tree: &PhyloTree,
    species_name: &str,
    matcher: &SpeciesMatcher,
) -> Option<NodeIndex> {
    let mut candidates = tree.leaves();
    candidates.extend(tree.preorder().into_iter().filter(|&index| !tree.is_leaf(index)));

    let found = candidates
        .iter()
        .copied()
        .find(|&index| matcher.matches_exactly(&tree.node(index).name, species_name))
        .or_else(|| {
            candidates
                .iter()
                .copied()
                .find(|&index| matcher.matches(&tree.node(index).name, species_name))
        });

    if found.is_none() {
        log_warn!("no tree node matches species {species_name:?}; selection cleared");
    }
    found
}

/// Selection state for an external species selection (`None` clears).
pub fn select_species(
    tree: &PhyloTree,
    species_name: Option<&str>,
    matcher: &SpeciesMatcher,
) -> SelectionState {
    species_name
        .and_then(|name| find_node_for_species(tree, name, matcher))
        .map(|index| SelectionState::Selected(tree.node(index).id.clone()))
        .unwrap_or_default()
}
