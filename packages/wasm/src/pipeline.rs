//! One render pass, stages 1 through 6, from raw input.
//!
//! Nothing is cached between calls: every pass parses, decorates, lays out
//! and projects from scratch, so equal inputs always give equal output.

use std::collections::HashSet;

use crate::config::{EngineConfig, LayoutMode, Viewport};
use crate::counts::{AttachSummary, SpeciesCount, SpeciesMatcher, attach_counts};
use crate::error::Result;
use crate::layout::{LayoutResult, layout};
use crate::log::{log_info, log_warn};
use crate::render::{RenderPrimitives, project};
use crate::selection::path_to_root;
use crate::tree::{PhyloTree, parse};

/// Output of [`render_pass`].
#[derive(Debug, Clone)]
pub struct RenderPass {
    /// Decorated, laid-out hierarchy.
    pub tree: PhyloTree,
    pub counts: AttachSummary,
    pub layout: LayoutResult,
    /// Root-to-node ids of the selected node; empty without a selection.
    pub selected_path: Vec<String>,
    pub primitives: RenderPrimitives,
}

/// Parse, logging the outcome.
pub(crate) fn parse_tree(newick: &str) -> Result<PhyloTree> {
    match parse(newick) {
        Ok(tree) => {
            log_info!(
                "parsed tree with {} nodes, {} leaves",
                tree.node_count(),
                tree.leaf_count()
            );
            Ok(tree)
        }
        Err(err) => {
            log_warn!("{err}");
            Err(err.into())
        }
    }
}

/// Run every stage for one frame.
pub fn render_pass(
    newick: &str,
    counts: &[SpeciesCount],
    mode: LayoutMode,
    viewport: Viewport,
    selected_node_id: Option<&str>,
    config: &EngineConfig,
) -> Result<RenderPass> {
    let mut tree = parse_tree(newick)?;
    let matcher = SpeciesMatcher::new(config.matcher.clone());
    let counts = attach_counts(&mut tree, counts, &matcher);
    let layout = layout(&mut tree, mode, viewport, config);
    let selected_path = path_to_root(&tree, selected_node_id);
    let highlights: HashSet<String> = selected_path.iter().cloned().collect();
    let primitives = project(&tree, &layout, &highlights, config);

    Ok(RenderPass {
        tree,
        counts,
        layout,
        selected_path,
        primitives,
    })
}
