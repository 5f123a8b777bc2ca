//! OrthoTree - WASM Module
//!
//! Species tree layout and geometry for orthogroup search results. Parses a
//! Newick tree, decorates it with per-species occurrence counts, lays it out
//! radially or rectangularly and projects it into drawable primitives. It is
//! compiled to WebAssembly and exposes a JavaScript-friendly API via
//! wasm-bindgen.
//!
//! # Architecture
//!
//! - `tree`: Node hierarchy on petgraph's StableGraph, Newick parser
//! - `counts`: Species count records, name matching, aggregation
//! - `layout`: Radial cluster, rectangular tidy tree, overlap resolver
//! - `selection`: Selection state and path-to-root highlighting
//! - `render`: Circles, labels and link paths for the drawing layer
//! - `spatial`: R-tree spatial indexing for O(log n) hit testing
//! - `pipeline` / `engine`: one-shot and stateful drivers over all stages

use js_sys::{Array, Function};
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod counts;
pub mod engine;
pub mod error;
pub mod layout;
mod log;
pub mod pipeline;
pub mod render;
pub mod selection;
pub mod spatial;
pub mod tree;

use config::{EngineConfig, LayoutMode, Viewport};
use counts::{SpeciesCount, SpeciesMatcher};
use engine::TreeEngine;
use error::Error;
use log::log_warn;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js_error(err: Error) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Plain JS objects (no `Map`s) for anything serializable.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn is_absent(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

/// Main entry point for the tree engine.
///
/// This struct wraps the internal TreeEngine and provides the public API
/// exposed to JavaScript. Every input change re-runs the pipeline and fires
/// `onLayoutReady`.
#[wasm_bindgen]
pub struct OrthoTreeWasm {
    engine: TreeEngine,
    on_node_selected: Option<Function>,
    on_layout_ready: Option<Function>,
}

#[wasm_bindgen]
impl OrthoTreeWasm {
    /// Create an engine. `config` is an optional, possibly partial,
    /// camelCase `EngineConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<OrthoTreeWasm, JsValue> {
        let config = if is_absent(&config) {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|err| to_js_error(Error::InvalidConfig { message: err.to_string() }))?
        };
        Ok(Self {
            engine: TreeEngine::new(config),
            on_node_selected: None,
            on_layout_ready: None,
        })
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Replace the tree. Throws on malformed Newick; the previous tree is
    /// dropped either way.
    #[wasm_bindgen(js_name = setTree)]
    pub fn set_tree(&mut self, newick: &str) -> Result<(), JsValue> {
        let result = self.engine.set_tree(newick);
        self.notify_layout_ready();
        result.map_err(to_js_error)
    }

    /// Replace the species count list (`{speciesId?, speciesName, count}[]`).
    #[wasm_bindgen(js_name = setSpeciesCounts)]
    pub fn set_species_counts(&mut self, counts: JsValue) -> Result<(), JsValue> {
        let counts: Vec<SpeciesCount> = if is_absent(&counts) {
            Vec::new()
        } else {
            serde_wasm_bindgen::from_value(counts)
                .map_err(|err| to_js_error(Error::InvalidInput { message: err.to_string() }))?
        };
        self.engine.set_species_counts(counts);
        self.notify_layout_ready();
        Ok(())
    }

    /// Set the layout mode (`"radial"` or `"rectangular"`) and viewport.
    #[wasm_bindgen(js_name = setLayout)]
    pub fn set_layout(&mut self, mode: &str, width: f64, height: f64) -> Result<(), JsValue> {
        let mode = mode.parse::<LayoutMode>().map_err(to_js_error)?;
        self.engine.set_layout(mode, Viewport::new(width, height));
        self.notify_layout_ready();
        Ok(())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// User interaction with a node: toggles its selection and fires
    /// `onNodeSelected`. Returns the selected node id afterwards.
    #[wasm_bindgen(js_name = selectNode)]
    pub fn select_node(&mut self, node_id: &str) -> Option<String> {
        let before = self.engine.selection().clone();
        self.engine.toggle_node(node_id);
        self.after_interaction(&before)
    }

    /// External selection by species name, `null` to clear. Does not fire
    /// `onNodeSelected`. Returns the resolved node id.
    #[wasm_bindgen(js_name = selectSpecies)]
    pub fn select_species(&mut self, species_name: Option<String>) -> Option<String> {
        self.engine.select_species(species_name.as_deref());
        self.notify_layout_ready();
        self.selected_node_id()
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) {
        let before = self.engine.selection().clone();
        self.engine.clear_selection();
        self.after_interaction(&before);
    }

    /// Pointer click in drawing coordinates. A hit toggles that node, a
    /// background click clears the selection.
    #[wasm_bindgen(js_name = clickAt)]
    pub fn click_at(&mut self, x: f64, y: f64) -> Option<String> {
        let before = self.engine.selection().clone();
        self.engine.click_at(x, y);
        self.after_interaction(&before)
    }

    #[wasm_bindgen(js_name = selectedNodeId)]
    pub fn selected_node_id(&self) -> Option<String> {
        self.engine.selection().selected_id().map(str::to_string)
    }

    /// Node ids from the root down to `node_id`; empty for `null` or an
    /// unknown id.
    #[wasm_bindgen(js_name = pathToRoot)]
    pub fn path_to_root(&self, node_id: Option<String>) -> Array {
        self.engine
            .path_to_root(node_id.as_deref())
            .iter()
            .map(|id| JsValue::from_str(id))
            .collect()
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    /// The decorated, laid-out hierarchy as a nested object, or `null`.
    pub fn hierarchy(&self) -> Result<JsValue, JsValue> {
        match self.engine.hierarchy() {
            Some(view) => to_js(&view),
            None => Ok(JsValue::NULL),
        }
    }

    /// Drawable primitives of the current frame, or `null`.
    pub fn primitives(&self) -> Result<JsValue, JsValue> {
        match self.engine.primitives() {
            Some(primitives) => to_js(primitives),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = leafCount)]
    pub fn leaf_count(&self) -> usize {
        self.engine.leaf_count()
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// `callback(speciesName: string | null)` after a user selection change.
    #[wasm_bindgen(js_name = onNodeSelected)]
    pub fn on_node_selected(&mut self, callback: Function) {
        self.on_node_selected = Some(callback);
    }

    /// `callback(ready: boolean)` after every pipeline run.
    #[wasm_bindgen(js_name = onLayoutReady)]
    pub fn on_layout_ready(&mut self, callback: Function) {
        self.on_layout_ready = Some(callback);
    }
}

impl OrthoTreeWasm {
    fn after_interaction(&self, before: &selection::SelectionState) -> Option<String> {
        self.notify_layout_ready();
        if self.engine.selection() != before {
            let name = self
                .engine
                .selected_species_name()
                .map_or(JsValue::NULL, |name| JsValue::from_str(&name));
            call(self.on_node_selected.as_ref(), &name);
        }
        self.selected_node_id()
    }

    fn notify_layout_ready(&self) {
        call(self.on_layout_ready.as_ref(), &JsValue::from_bool(self.engine.is_ready()));
    }
}

fn call(callback: Option<&Function>, arg: &JsValue) {
    let Some(callback) = callback else {
        return;
    };
    if let Err(err) = callback.call1(&JsValue::NULL, arg) {
        log_warn!("callback threw: {err:?}");
    }
}

/// Parse a Newick string into a nested hierarchy object. Throws on
/// malformed input.
#[wasm_bindgen(js_name = parseNewick)]
pub fn parse_newick(newick: &str) -> Result<JsValue, JsValue> {
    let tree = pipeline::parse_tree(newick).map_err(to_js_error)?;
    to_js(&tree.to_view())
}

/// The species name matching policy with default thresholds.
#[wasm_bindgen(js_name = speciesMatches)]
pub fn species_matches(a: &str, b: &str) -> bool {
    SpeciesMatcher::with_defaults().matches(a, b)
}
