//! Mind Map - WASM Module
//!
//! This module provides the core of an interactive hierarchical graph
//! ("mind map") visualizer. It is compiled to WebAssembly and exposes a
//! JavaScript-friendly API via wasm-bindgen; everything below the facade is
//! plain Rust and runs natively in tests.
//!
//! # Architecture
//!
//! - `graph`: Graph Store (petgraph StableGraph) and Visibility Resolver
//! - `layout`: Label footprints, contour tidy tree, mind-map layout
//! - `transition`: Layout diffing and staged animation, render frames
//! - `spatial`: R-tree hit testing for node bodies and toggle controls
//! - `interaction`: Viewport and pointer gesture routing
//! - `cache`: Per-document graph cache over key/value storage
//! - `query`: Query emission bus
//! - `session`: Orchestration and the fetch lifecycle

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod layout;
pub mod query;
pub mod session;
pub mod spatial;
pub mod transition;

pub use config::MindMapConfig;
pub use error::{MindMapError, Result};
pub use session::{FetchResolution, FetchTicket, MindMapSession, OpenOutcome, ToggleOutcome};

use cache::{BrowserStorage, KeyValueStore, MemoryStore};
use graph::GraphPayload;
use interaction::Viewport;
use query::QueryBus;

/// Initialize the WASM module: panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("logger already initialised");
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> std::result::Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|err| MindMapError::from(err).into())
}

/// Main entry point for the mind map.
///
/// Wraps a [`MindMapSession`] backed by `localStorage` (or memory when the
/// page has no storage) and a query bus the host can subscribe to.
#[wasm_bindgen]
pub struct MindMapWasm {
    session: MindMapSession<Box<dyn KeyValueStore>>,
    bus: QueryBus,
}

#[wasm_bindgen]
impl MindMapWasm {
    /// Create a visualizer. `config` is an optional partial
    /// [`MindMapConfig`] object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> std::result::Result<MindMapWasm, JsError> {
        let config: MindMapConfig = if config.is_undefined() || config.is_null() {
            MindMapConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(MindMapError::from)?
        };

        let storage: Box<dyn KeyValueStore> = match BrowserStorage::local() {
            Some(storage) => Box::new(storage),
            None => {
                log::warn!("localStorage unavailable; graph cache kept in memory");
                Box::new(MemoryStore::new())
            }
        };

        let bus = QueryBus::new();
        Ok(Self {
            session: MindMapSession::new(config, storage, bus.sender()),
            bus,
        })
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// Open a document.
    ///
    /// Returns `{status: "cached"}`, `{status: "alreadyLoading"}` or
    /// `{status: "fetch", id, documentId}`; in the last case the host fetches
    /// the graph and answers with `completeFetch(id, payload)` or
    /// `failFetch(id, message)`.
    #[wasm_bindgen(js_name = openDocument)]
    pub fn open_document(
        &mut self,
        document_id: &str,
        display_name: &str,
    ) -> std::result::Result<JsValue, JsError> {
        to_js(&self.session.open_document(document_id, display_name))
    }

    /// Force a re-fetch of the active document. Returns the ticket id, or
    /// undefined when a fetch is already running.
    pub fn refresh(&mut self) -> Option<u32> {
        self.session.refresh().map(|ticket| ticket.id)
    }

    /// Deliver a fetched `{nodes, edges}` payload.
    ///
    /// A payload that does not decode counts as a failed fetch.
    #[wasm_bindgen(js_name = completeFetch)]
    pub fn complete_fetch(
        &mut self,
        ticket: u32,
        payload: JsValue,
    ) -> std::result::Result<JsValue, JsError> {
        let result = serde_wasm_bindgen::from_value::<GraphPayload>(payload)
            .map_err(|err| MindMapError::from(err).to_string());
        to_js(&self.session.complete_fetch(ticket, result))
    }

    /// Report a failed fetch; the fallback graph is shown.
    #[wasm_bindgen(js_name = failFetch)]
    pub fn fail_fetch(
        &mut self,
        ticket: u32,
        message: String,
    ) -> std::result::Result<JsValue, JsError> {
        to_js(&self.session.complete_fetch(ticket, Err(message)))
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    #[wasm_bindgen(js_name = documentId)]
    pub fn document_id(&self) -> Option<String> {
        self.session.document_id().map(str::to_string)
    }

    // =========================================================================
    // Graph state
    // =========================================================================

    /// Toggle a node. Returns "expanded", "collapsing", "collapsed" or
    /// "ignored".
    #[wasm_bindgen(js_name = toggleNode)]
    pub fn toggle_node(&mut self, id: &str) -> std::result::Result<JsValue, JsError> {
        to_js(&self.session.toggle(id))
    }

    /// Node records `{id, label, parentId, level, collapsed, hasChildren}`.
    pub fn snapshot(&self) -> std::result::Result<JsValue, JsError> {
        to_js(&self.session.snapshot())
    }

    /// Ids of the currently visible nodes.
    #[wasm_bindgen(js_name = visibleIds)]
    pub fn visible_ids(&self) -> Vec<String> {
        self.session.visible().ids().to_vec()
    }

    // =========================================================================
    // Animation
    // =========================================================================

    /// Advance animations by `dt_ms`. Returns true while more ticks are needed.
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        self.session.advance(dt_ms)
    }

    /// The render model: `{nodes, edges, transform, animating}`.
    pub fn frame(&self) -> std::result::Result<JsValue, JsError> {
        to_js(&self.session.frame())
    }

    // =========================================================================
    // Viewport and Input
    // =========================================================================

    #[wasm_bindgen(js_name = setScreenSize)]
    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.session.set_screen_size(width, height);
    }

    #[wasm_bindgen(js_name = fitView)]
    pub fn fit_view(&mut self) {
        self.session.fit_view();
    }

    /// Current transform `{x, y, k}`.
    pub fn viewport(&self) -> std::result::Result<JsValue, JsError> {
        to_js(&self.session.viewport())
    }

    /// Restore a transform previously read with `viewport()`.
    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(&mut self, viewport: JsValue) -> std::result::Result<(), JsError> {
        let viewport: Viewport =
            serde_wasm_bindgen::from_value(viewport).map_err(MindMapError::from)?;
        self.session.set_viewport(viewport);
        Ok(())
    }

    /// `pointer_id` is the DOM `PointerEvent.pointerId`; two active
    /// pointers pinch-zoom.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, pointer_id: u32, x: f32, y: f32) {
        self.session.pointer_down(pointer_id, x, y);
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, pointer_id: u32, x: f32, y: f32) {
        self.session.pointer_move(pointer_id, x, y);
    }

    /// Release a pointer. Returns `{type: "toggle" | "query" | "none", id?}`.
    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, pointer_id: u32) -> std::result::Result<JsValue, JsError> {
        to_js(&self.session.pointer_up(pointer_id))
    }

    #[wasm_bindgen(js_name = pointerCancel)]
    pub fn pointer_cancel(&mut self) {
        self.session.pointer_cancel();
    }

    pub fn wheel(&mut self, x: f32, y: f32, delta_y: f32) {
        self.session.wheel(x, y, delta_y);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Register a callback receiving `{query, documentId}` for every node
    /// body click.
    #[wasm_bindgen(js_name = onQuery)]
    pub fn on_query(&self, callback: js_sys::Function) {
        self.bus.subscribe(move |request| {
            let value = match serde_wasm_bindgen::to_value(request) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("could not encode query: {err}");
                    return;
                }
            };
            if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                log::warn!("query handler threw: {err:?}");
            }
        });
    }

    /// Take the last query emitted for a document, if nobody consumed it.
    #[wasm_bindgen(js_name = takePendingQuery)]
    pub fn take_pending_query(&self, document_id: &str) -> std::result::Result<JsValue, JsError> {
        match self.bus.take_pending(document_id) {
            Some(request) => to_js(&request),
            None => Ok(JsValue::NULL),
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::graph::{RawEdge, RawNode, visible_edges, visible_nodes};
    use crate::interaction::PointerAction;
    use crate::layout::Orientation;
    use crate::query::QueryRequest;

    fn scenario_payload() -> GraphPayload {
        GraphPayload::new(
            vec![
                RawNode::new("root", "Doc"),
                RawNode::new("a", "Topic A"),
                RawNode::new("b", "Topic B"),
            ],
            vec![RawEdge::new("root", "a"), RawEdge::new("root", "b")],
        )
    }

    /// Root with `fanout` children per node down to `depth`, labels of
    /// varying length.
    fn deep_payload(fanout: usize, depth: usize) -> GraphPayload {
        let mut nodes = vec![RawNode::new("n", "Quarterly report")];
        let mut edges = Vec::new();
        let mut frontier = vec!["n".to_string()];
        for level in 1..=depth {
            let mut next = Vec::new();
            for parent in &frontier {
                for i in 0..fanout {
                    let id = format!("{parent}.{i}");
                    let label = "word ".repeat(1 + (i * 7 + level * 3) % 9);
                    nodes.push(RawNode::new(id.clone(), label.trim_end()));
                    edges.push(RawEdge::new(parent.clone(), id.clone()).with_relation("contains"));
                    next.push(id);
                }
            }
            frontier = next;
        }
        GraphPayload::new(nodes, edges)
    }

    fn open(
        config: MindMapConfig,
        payload: GraphPayload,
    ) -> (MindMapSession<MemoryStore>, QueryBus) {
        let bus = QueryBus::new();
        let mut session = MindMapSession::new(config, MemoryStore::new(), bus.sender());
        let OpenOutcome::Fetch(ticket) = session.open_document("doc1", "doc1.pdf") else {
            panic!("fresh session must fetch");
        };
        assert_eq!(session.complete_fetch(ticket.id, Ok(payload)), FetchResolution::Applied);
        session.advance(0.0);
        (session, bus)
    }

    /// The three-node scenario: collapsed root shows only itself, expanding
    /// it shows both topics and both edges.
    #[test]
    fn test_scenario_expand_root() {
        let (mut session, _) = open(MindMapConfig::immediate(), scenario_payload());

        // Roots start expanded; collapse first to reach the compact state.
        assert_eq!(session.toggle("root"), ToggleOutcome::Collapsed);
        session.advance(0.0);
        assert_eq!(session.visible().ids(), ["root"]);
        assert_eq!(session.frame().nodes.len(), 1);

        assert_eq!(session.toggle("root"), ToggleOutcome::Expanded);
        session.advance(0.0);
        let visible = visible_nodes(session.store());
        assert_eq!(visible.ids(), ["root", "a", "b"]);
        assert_eq!(visible_edges(session.store(), &visible).len(), 2);

        let frame = session.frame();
        assert_eq!(frame.nodes.len(), 3);
        assert_eq!(frame.edges.len(), 2);
        assert!(!frame.animating);
    }

    /// Cache round-trip through the session: reopening restores the same
    /// graph without a fetch, with collapse state reset.
    #[test]
    fn test_reopen_uses_cache() {
        let payload = deep_payload(3, 2);
        let (mut session, _) = open(MindMapConfig::immediate(), payload.clone());
        session.toggle("n.0");
        session.advance(0.0);

        assert!(matches!(session.open_document("doc2", "other"), OpenOutcome::Fetch(_)));
        assert_eq!(session.open_document("doc1", "doc1.pdf"), OpenOutcome::Cached);
        assert_eq!(session.cache().get("doc1"), Some(payload));
        assert!(session.store().is_collapsed("n.0"));
        assert_eq!(session.visible().len(), 4);
    }

    /// Expand everything and check that no two boxes overlap in either
    /// orientation.
    #[test]
    fn test_fully_expanded_tree_has_no_overlaps() {
        for orientation in [Orientation::LeftToRight, Orientation::TopToBottom] {
            let mut config = MindMapConfig::immediate();
            config.layout.orientation = orientation;
            let (mut session, _) = open(config, deep_payload(3, 3));

            let ids: Vec<String> = session.store().nodes().iter().map(|n| n.id.clone()).collect();
            for id in &ids {
                if session.store().is_collapsed(id) {
                    session.toggle(id);
                }
            }
            session.advance(0.0);
            assert_eq!(session.layout().len(), 40);

            let boxes: Vec<_> = session.layout().iter().collect();
            for (i, (id_a, a)) in boxes.iter().enumerate() {
                for (id_b, b) in &boxes[i + 1..] {
                    let overlap = (a.x - b.x).abs() < (a.width + b.width) / 2.0
                        && (a.y - b.y).abs() < (a.height + b.height) / 2.0;
                    assert!(!overlap, "{id_a} overlaps {id_b} ({orientation:?})");
                }
            }
        }
    }

    /// Mid-animation, edges follow the interpolated endpoints rather than
    /// the final layout.
    #[test]
    fn test_edges_track_animating_endpoints() {
        let config = MindMapConfig {
            transition: transition::TransitionConfig {
                stagger_ms: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let (mut session, _) = open(config, deep_payload(2, 2));
        session.advance(10_000.0);

        session.toggle("n.0");
        session.advance(100.0);
        let frame = session.frame();
        assert!(frame.animating);

        let child = frame.nodes.iter().find(|n| n.id == "n.0.0").unwrap();
        let target = session.layout().get("n.0.0").unwrap();
        assert!((child.x - target.x).abs() > 1.0, "child should still be travelling");

        let edge = frame
            .edges
            .iter()
            .find(|e| e.source == "n.0" && e.target == "n.0.0")
            .unwrap();
        assert!((edge.end[0] - (child.x - child.width / 2.0)).abs() < 1e-3);
        assert!((edge.end[1] - child.y).abs() < 1e-3);
        assert!(edge.opacity < 1.0);
    }

    /// Pointer input end to end: pan, zoom, toggle and query, with the
    /// viewport surviving every relayout.
    #[test]
    fn test_pointer_session() {
        let (mut session, bus) = open(MindMapConfig::immediate(), scenario_payload());
        session.set_screen_size(1024.0, 768.0);

        session.pointer_down(1, 2.0, 2.0);
        session.pointer_move(1, 40.0, 30.0);
        assert_eq!(session.pointer_up(1), PointerAction::None);
        session.wheel(512.0, 384.0, 120.0);
        let viewport = session.viewport();

        // Click the root body, in screen space
        let root = session.layout().get("root").unwrap().clone();
        let (sx, sy) = viewport.world_to_screen(root.x - root.width / 4.0, root.y);
        session.pointer_down(1, sx, sy);
        assert_eq!(session.pointer_up(1), PointerAction::Query("root".into()));
        assert_eq!(bus.take_pending("doc1"), Some(QueryRequest::new("Doc", "doc1")));

        // Then its toggle control
        let (sx, sy) = viewport.world_to_screen(root.x + root.width / 2.0, root.y);
        session.pointer_down(1, sx, sy);
        assert_eq!(session.pointer_up(1), PointerAction::Toggle("root".into()));
        session.advance(0.0);
        assert_eq!(session.visible().ids(), ["root"]);
        assert!(bus.take_pending("doc1").is_none());
        assert_eq!(session.viewport(), viewport);
    }

    /// A payload mixing every malformation still renders what is reachable.
    #[test]
    fn test_malformed_payload_degrades() {
        let payload = GraphPayload::new(
            vec![
                RawNode::new("root", "Doc"),
                RawNode::new("a", "A"),
                RawNode::new("x", "Cycle X"),
                RawNode::new("y", "Cycle Y"),
                RawNode::new("a", "Duplicate"),
            ],
            vec![
                RawEdge::new("root", "a"),
                RawEdge::new("root", "ghost"),
                RawEdge::new("x", "y"),
                RawEdge::new("y", "x"),
                RawEdge::new("a", "a"),
            ],
        );
        let (session, _) = open(MindMapConfig::immediate(), payload);
        assert_eq!(session.visible().ids(), ["root", "a"]);
        assert_eq!(session.store().node("x").unwrap().level, -1);
        assert_eq!(session.frame().nodes.len(), 2);
    }
}
