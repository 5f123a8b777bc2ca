//! TreeEngine - the stateful side of the engine.
//!
//! Holds the current inputs (tree, counts, mode, viewport, selection) and
//! the outputs of the last pass. Any input change re-runs count attachment,
//! layout and projection wholesale; nothing is patched incrementally.

use crate::config::{EngineConfig, LayoutMode, Viewport};
use crate::counts::{SpeciesCount, SpeciesMatcher, attach_counts};
use crate::error::Result;
use crate::layout::{LayoutResult, layout};
use crate::log::log_debug;
use crate::pipeline::parse_tree;
use crate::render::{RenderPrimitives, project};
use crate::selection::{SelectionState, highlight_set, path_to_root, select_species};
use crate::spatial::SpatialIndex;
use crate::tree::{HierarchyView, PhyloTree};

/// Smallest pointer distance, in pixels, that still hits a node.
const MIN_HIT_RADIUS: f64 = 6.0;

/// The core tree engine.
///
/// This struct manages:
/// - The parsed hierarchy and the inputs it is decorated with
/// - The caller-visible selection state
/// - The last layout and its drawable primitives
/// - Spatial index for hit testing
pub struct TreeEngine {
    config: EngineConfig,
    matcher: SpeciesMatcher,

    tree: Option<PhyloTree>,
    counts: Vec<SpeciesCount>,
    mode: LayoutMode,
    viewport: Viewport,
    selection: SelectionState,

    layout: Option<LayoutResult>,
    primitives: Option<RenderPrimitives>,
    spatial: SpatialIndex,
}

impl TreeEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            matcher: SpeciesMatcher::new(config.matcher.clone()),
            config,
            tree: None,
            counts: Vec::new(),
            mode: LayoutMode::default(),
            viewport: Viewport::default(),
            selection: SelectionState::default(),
            layout: None,
            primitives: None,
            spatial: SpatialIndex::new(),
        }
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Replace the tree. On a parse error the previous tree and its outputs
    /// are dropped, so no stale frame outlives bad input.
    pub fn set_tree(&mut self, newick: &str) -> Result<()> {
        match parse_tree(newick) {
            Ok(tree) => {
                let still_present = self
                    .selection
                    .selected_id()
                    .is_none_or(|id| tree.find(id).is_some());
                if !still_present {
                    self.selection = SelectionState::Unselected;
                }
                self.tree = Some(tree);
                self.refresh();
                Ok(())
            }
            Err(err) => {
                self.tree = None;
                self.selection = SelectionState::Unselected;
                self.refresh();
                Err(err)
            }
        }
    }

    pub fn set_species_counts(&mut self, counts: Vec<SpeciesCount>) {
        self.counts = counts;
        self.refresh();
    }

    pub fn set_layout(&mut self, mode: LayoutMode, viewport: Viewport) {
        self.mode = mode;
        self.viewport = viewport;
        self.refresh();
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// User interaction with a node: toggles it. Ids not in the tree are
    /// ignored.
    pub fn toggle_node(&mut self, node_id: &str) -> &SelectionState {
        if self.tree.as_ref().is_some_and(|tree| tree.find(node_id).is_some()) {
            self.selection = self.selection.toggle(node_id);
            self.refresh();
        }
        &self.selection
    }

    /// External selection by species name. A name with no matching node
    /// clears the selection.
    pub fn select_species(&mut self, species_name: Option<&str>) -> &SelectionState {
        self.selection = match self.tree.as_ref() {
            Some(tree) => select_species(tree, species_name, &self.matcher),
            None => SelectionState::Unselected,
        };
        self.refresh();
        &self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection = self.selection.clear();
        self.refresh();
    }

    /// Pointer click in drawing coordinates: toggles the node under the
    /// pointer, or clears the selection on a background click.
    pub fn click_at(&mut self, x: f64, y: f64) -> &SelectionState {
        let tolerance = self
            .layout
            .as_ref()
            .map_or(MIN_HIT_RADIUS, |layout| layout.band.node_radius.max.max(MIN_HIT_RADIUS));
        let hit = self.spatial.node_at(x, y, tolerance).map(str::to_string);
        match hit {
            Some(id) => self.toggle_node(&id),
            None => {
                self.clear_selection();
                &self.selection
            }
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Species name of the selected node: its label, or its id when the
    /// node is unlabeled.
    pub fn selected_species_name(&self) -> Option<String> {
        let tree = self.tree.as_ref()?;
        let index = tree.find(self.selection.selected_id()?)?;
        let node = tree.node(index);
        Some(if node.name.is_empty() {
            node.id.clone()
        } else {
            node.name.clone()
        })
    }

    pub fn path_to_root(&self, node_id: Option<&str>) -> Vec<String> {
        self.tree
            .as_ref()
            .map(|tree| path_to_root(tree, node_id))
            .unwrap_or_default()
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tree(&self) -> Option<&PhyloTree> {
        self.tree.as_ref()
    }

    pub fn layout(&self) -> Option<&LayoutResult> {
        self.layout.as_ref()
    }

    pub fn primitives(&self) -> Option<&RenderPrimitives> {
        self.primitives.as_ref()
    }

    pub fn hierarchy(&self) -> Option<HierarchyView> {
        self.tree.as_ref().map(PhyloTree::to_view)
    }

    pub fn leaf_count(&self) -> usize {
        self.tree.as_ref().map_or(0, PhyloTree::leaf_count)
    }

    /// Whether the last pass produced a frame.
    pub fn is_ready(&self) -> bool {
        self.primitives.is_some()
    }

    /// Re-run stages 2 through 6 over the current inputs.
    fn refresh(&mut self) {
        let Some(tree) = self.tree.as_mut() else {
            self.layout = None;
            self.primitives = None;
            self.spatial.clear();
            return;
        };

        attach_counts(tree, &self.counts, &self.matcher);
        let result = layout(tree, self.mode, self.viewport, &self.config);
        let highlights = highlight_set(tree, &self.selection);
        let primitives = project(tree, &result, &highlights, &self.config);

        self.spatial = SpatialIndex::from_primitives(&primitives.nodes);
        log_debug!(
            "frame ready: {} nodes, {} highlighted",
            primitives.nodes.len(),
            highlights.len()
        );
        self.layout = Some(result);
        self.primitives = Some(primitives);
    }
}

impl Default for TreeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
